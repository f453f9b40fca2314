use crate::core::{
    srun, wrapper, ConfigProvider, JobKind, JobOutcome, JobRequest, LaunchPlan, LaunchReport,
    Result, Submission, Workspace,
};
use crate::utils::error::LaunchError;
use std::path::PathBuf;

/// 把一個實驗提交到 SLURM：渲染包裝腳本、寫進工作目錄、呼叫排程器
pub struct SlurmSubmission<W: Workspace, C: ConfigProvider> {
    workspace: W,
    config: C,
}

impl<W: Workspace, C: ConfigProvider> SlurmSubmission<W, C> {
    pub fn new(workspace: W, config: C) -> Self {
        Self { workspace, config }
    }

    /// 排程器子行程繼承的 PYTHONPATH：模組路徑接在現有值前面
    fn extended_pythonpath(&self) -> Option<String> {
        let existing = std::env::var("PYTHONPATH").ok().filter(|v| !v.is_empty());
        match (self.config.module_search_path(), existing) {
            (Some(module), Some(existing)) => Some(format!("{}:{}", module, existing)),
            (Some(module), None) => Some(module.to_string()),
            (None, Some(existing)) => Some(existing),
            (None, None) => None,
        }
    }
}

#[async_trait::async_trait]
impl<W: Workspace, C: ConfigProvider> Submission for SlurmSubmission<W, C> {
    async fn plan(&self) -> Result<LaunchPlan> {
        tracing::debug!("Planning launch for experiment '{}'", self.config.job_name());

        let wrappers = vec![
            wrapper::render_wrapper(JobKind::TrainPolicy, &self.config),
            wrapper::render_wrapper(JobKind::Rollout, &self.config),
        ];

        // trainer 一定排在 rollout 前面
        let jobs = vec![
            JobRequest {
                kind: JobKind::TrainPolicy,
                resources: self.config.trainer_resources(),
                script_file: JobKind::TrainPolicy.script_file_name().to_string(),
            },
            JobRequest {
                kind: JobKind::Rollout,
                resources: self.config.rollout_resources(),
                script_file: JobKind::Rollout.script_file_name().to_string(),
            },
        ];

        Ok(LaunchPlan { wrappers, jobs })
    }

    async fn stage(&self, plan: &LaunchPlan) -> Result<Vec<PathBuf>> {
        let mut staged = Vec::new();

        for wrapper in &plan.wrappers {
            let path = self
                .workspace
                .write_script(&wrapper.file_name, &wrapper.content)
                .await?;
            tracing::debug!("Staged {} at {}", wrapper.kind.label(), path.display());
            staged.push(path);
        }

        Ok(staged)
    }

    async fn submit(&self, plan: &LaunchPlan, staged: &[PathBuf]) -> Result<LaunchReport> {
        let submitted_at = chrono::Utc::now();

        let script_path = |kind: JobKind| -> String {
            plan.jobs
                .iter()
                .zip(staged)
                .find(|(job, _)| job.kind == kind)
                .map(|(_, path)| path.to_string_lossy().into_owned())
                .unwrap_or_else(|| kind.script_file_name().to_string())
        };
        let policy_script = script_path(JobKind::TrainPolicy);
        let rollout_script = script_path(JobKind::Rollout);

        let mut children = Vec::new();
        for (request, script) in plan.jobs.iter().zip(staged) {
            let command = srun::launch_command(
                self.config.launcher(),
                self.config.job_name(),
                request,
                &script.to_string_lossy(),
            );

            tracing::info!("🚀 Launching {}: {}", request.kind.label(), command.display());

            let mut process = tokio::process::Command::new(&command.program);
            process
                .args(&command.args)
                .current_dir(self.config.working_dir())
                .env("WORKING_DIR", self.config.working_dir())
                .env("START_POLICY_SCRIPT", &policy_script)
                .env("START_ROLLOUT_SCRIPT", &rollout_script);

            if let Some(pythonpath) = self.extended_pythonpath() {
                process.env("PYTHONPATH", pythonpath);
            }

            let child = process.spawn().map_err(|e| LaunchError::SchedulerError {
                command: command.program.clone(),
                message: e.to_string(),
            })?;

            children.push((request.kind, child));
        }

        // trainer 已經在背景跑；這裡依序等兩個排程請求結束
        let mut outcomes = Vec::new();
        for (kind, mut child) in children {
            let status = child.wait().await?;

            if status.success() {
                tracing::info!("✅ {} request finished", kind.label());
            } else {
                tracing::warn!("❌ {} request exited with {:?}", kind.label(), status.code());
            }

            outcomes.push(JobOutcome {
                kind,
                exit_code: status.code(),
                success: status.success(),
            });
        }

        Ok(LaunchReport {
            submitted_at,
            outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::JobResources;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockWorkspace {
        base: PathBuf,
        files: Arc<Mutex<HashMap<String, String>>>,
    }

    impl MockWorkspace {
        fn new(base: PathBuf) -> Self {
            Self {
                base,
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, name: &str) -> Option<String> {
            let files = self.files.lock().await;
            files.get(name).cloned()
        }
    }

    impl Workspace for MockWorkspace {
        async fn write_script(&self, file_name: &str, content: &str) -> Result<PathBuf> {
            let mut files = self.files.lock().await;
            files.insert(file_name.to_string(), content.to_string());
            Ok(self.base.join(file_name))
        }

        async fn read_script(&self, file_name: &str) -> Result<String> {
            let files = self.files.lock().await;
            files.get(file_name).cloned().ok_or_else(|| {
                LaunchError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", file_name),
                ))
            })
        }
    }

    struct MockConfig {
        launcher: String,
        working_dir: String,
    }

    impl MockConfig {
        fn new(launcher: &str) -> Self {
            Self {
                launcher: launcher.to_string(),
                working_dir: std::env::temp_dir().to_string_lossy().into_owned(),
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn job_name(&self) -> &str {
            "qed_test"
        }

        fn working_dir(&self) -> &str {
            &self.working_dir
        }

        fn run_config(&self) -> &str {
            "config/qed.yaml"
        }

        fn launcher(&self) -> &str {
            &self.launcher
        }

        fn account(&self) -> &str {
            "rlmolecule"
        }

        fn partition(&self) -> &str {
            "standard"
        }

        fn time_limit(&self) -> &str {
            "04:00:00"
        }

        fn nodes(&self) -> u32 {
            2
        }

        fn program_command(&self) -> String {
            "python -u optimize_qed.py".to_string()
        }

        fn setup_commands(&self) -> &[String] {
            &[]
        }

        fn module_search_path(&self) -> Option<&str> {
            None
        }

        fn extra_environment(&self) -> Vec<(String, String)> {
            vec![]
        }

        fn trainer_resources(&self) -> JobResources {
            JobResources {
                tasks: 1,
                cpus_per_task: 4,
                gpus: 1,
            }
        }

        fn rollout_resources(&self) -> JobResources {
            JobResources {
                tasks: 4,
                cpus_per_task: 4,
                gpus: 0,
            }
        }
    }

    #[tokio::test]
    async fn test_plan_orders_trainer_first() {
        let workspace = MockWorkspace::new(PathBuf::from("/scratch/qed"));
        let submission = SlurmSubmission::new(workspace, MockConfig::new("srun"));

        let plan = submission.plan().await.unwrap();

        assert_eq!(plan.jobs.len(), 2);
        assert_eq!(plan.jobs[0].kind, JobKind::TrainPolicy);
        assert_eq!(plan.jobs[1].kind, JobKind::Rollout);
        assert!(plan.wrapper_for(JobKind::TrainPolicy).is_some());
        assert!(plan.wrapper_for(JobKind::Rollout).is_some());
    }

    #[tokio::test]
    async fn test_stage_writes_both_wrappers() {
        let workspace = MockWorkspace::new(PathBuf::from("/scratch/qed"));
        let submission = SlurmSubmission::new(workspace.clone(), MockConfig::new("srun"));

        let plan = submission.plan().await.unwrap();
        let staged = submission.stage(&plan).await.unwrap();

        assert_eq!(staged.len(), 2);
        assert_eq!(staged[0], PathBuf::from("/scratch/qed/start-policy.sh"));

        let policy = workspace.get_file("start-policy.sh").await.unwrap();
        assert!(policy.contains("--train-policy"));
        let rollout = workspace.get_file("start-rollout.sh").await.unwrap();
        assert!(rollout.contains("--rollout"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_submit_reports_success_for_clean_exits() {
        let workspace = MockWorkspace::new(std::env::temp_dir());
        let submission = SlurmSubmission::new(workspace, MockConfig::new("true"));

        let plan = submission.plan().await.unwrap();
        let staged = submission.stage(&plan).await.unwrap();
        let report = submission.submit(&plan, &staged).await.unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert!(report.all_successful());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_submit_records_failing_job() {
        let workspace = MockWorkspace::new(std::env::temp_dir());
        let submission = SlurmSubmission::new(workspace, MockConfig::new("false"));

        let plan = submission.plan().await.unwrap();
        let staged = submission.stage(&plan).await.unwrap();
        let report = submission.submit(&plan, &staged).await.unwrap();

        assert!(!report.all_successful());
        let failure = report.first_failure().unwrap();
        assert_eq!(failure.kind, JobKind::TrainPolicy);
        assert_eq!(failure.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_submit_missing_launcher_is_a_scheduler_error() {
        let workspace = MockWorkspace::new(std::env::temp_dir());
        let submission = SlurmSubmission::new(
            workspace,
            MockConfig::new("/nonexistent/path/to/srun"),
        );

        let plan = submission.plan().await.unwrap();
        let staged = submission.stage(&plan).await.unwrap();
        let err = submission.submit(&plan, &staged).await.unwrap_err();

        assert!(matches!(err, LaunchError::SchedulerError { .. }));
    }
}
