use crate::core::{ConfigProvider, JobKind, JobRequest};
use crate::core::wrapper::shell_quote;
use serde::Serialize;

/// 一次排程器呼叫的完整參數
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchCommand {
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// 組出單一任務的排程器 argv：固定的資源旗標加上包裝腳本路徑
pub fn launch_command(
    launcher: &str,
    experiment_name: &str,
    request: &JobRequest,
    script_path: &str,
) -> LaunchCommand {
    let mut args = vec![
        format!("--job-name={}-{}", experiment_name, request.kind.job_suffix()),
        format!("--ntasks={}", request.resources.tasks),
        format!("--cpus-per-task={}", request.resources.cpus_per_task),
    ];

    if request.resources.gpus > 0 {
        args.push(format!("--gres=gpu:{}", request.resources.gpus));
    }

    args.push(script_path.to_string());

    LaunchCommand {
        program: launcher.to_string(),
        args,
    }
}

/// 渲染可以直接丟給 sbatch 的批次提交檔：
/// 排程指示詞、環境變數、背景 trainer、前景 rollout、wait
pub fn render_batch_script<C: ConfigProvider>(config: &C) -> String {
    let mut lines = vec![
        "#!/bin/bash".to_string(),
        format!("#SBATCH --account={}", config.account()),
        format!("#SBATCH --partition={}", config.partition()),
        format!("#SBATCH --time={}", config.time_limit()),
        format!("#SBATCH --job-name={}", config.job_name()),
        format!("#SBATCH --nodes={}", config.nodes()),
        String::new(),
        format!(
            "# generated by rl-launch at {}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
        ),
        String::new(),
        format!("export WORKING_DIR={}", shell_quote(config.working_dir())),
        format!(
            "export START_POLICY_SCRIPT=\"$WORKING_DIR/{}\"",
            JobKind::TrainPolicy.script_file_name()
        ),
        format!(
            "export START_ROLLOUT_SCRIPT=\"$WORKING_DIR/{}\"",
            JobKind::Rollout.script_file_name()
        ),
    ];

    if let Some(module_path) = config.module_search_path() {
        lines.push(format!(
            "export PYTHONPATH={}:\"$PYTHONPATH\"",
            shell_quote(module_path)
        ));
    }

    let trainer = JobRequest {
        kind: JobKind::TrainPolicy,
        resources: config.trainer_resources(),
        script_file: JobKind::TrainPolicy.script_file_name().to_string(),
    };
    let rollout = JobRequest {
        kind: JobKind::Rollout,
        resources: config.rollout_resources(),
        script_file: JobKind::Rollout.script_file_name().to_string(),
    };

    let trainer_cmd = launch_command(
        config.launcher(),
        config.job_name(),
        &trainer,
        "\"$START_POLICY_SCRIPT\"",
    );
    let rollout_cmd = launch_command(
        config.launcher(),
        config.job_name(),
        &rollout,
        "\"$START_ROLLOUT_SCRIPT\"",
    );

    lines.push(String::new());
    // trainer 丟到背景，rollout 在前景跑，最後等兩者收尾
    lines.push(format!("{} &", trainer_cmd.display()));
    lines.push(rollout_cmd.display());
    lines.push(String::new());
    lines.push("wait".to_string());
    lines.push(String::new());

    lines.join("\n")
}
