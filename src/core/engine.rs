use crate::core::{LaunchReport, Result, Submission};
use crate::utils::error::LaunchError;
use crate::utils::monitor::SystemMonitor;

pub struct LaunchEngine<S: Submission> {
    submission: S,
    monitor: SystemMonitor,
}

impl<S: Submission> LaunchEngine<S> {
    pub fn new(submission: S) -> Self {
        Self {
            submission,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(submission: S, monitor_enabled: bool) -> Self {
        Self {
            submission,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<LaunchReport> {
        println!("Starting experiment launch...");

        // Plan
        println!("Planning jobs...");
        let plan = self.submission.plan().await?;
        println!("Planned {} job(s)", plan.jobs.len());
        self.monitor.log_stats("plan");

        // Stage
        println!("Staging wrapper scripts...");
        let staged = self.submission.stage(&plan).await?;
        println!("Staged {} wrapper script(s)", staged.len());
        self.monitor.log_stats("stage");

        // Submit
        println!("Submitting to cluster scheduler...");
        self.monitor.log_waiting(plan.jobs.len());
        let report = self.submission.submit(&plan, &staged).await?;
        self.monitor.log_final_stats();

        for outcome in &report.outcomes {
            tracing::info!(
                "{} {} exit_code={:?}",
                if outcome.success { "✅" } else { "❌" },
                outcome.kind.label(),
                outcome.exit_code
            );
        }

        // 先回報第一個失敗的任務；完整結果已寫進日誌
        if let Some(failure) = report.first_failure() {
            return Err(LaunchError::JobFailedError {
                job: failure.kind.label().to_string(),
                code: failure.exit_code,
            });
        }

        Ok(report)
    }
}
