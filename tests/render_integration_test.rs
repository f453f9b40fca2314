#![cfg(unix)]

use rl_launch::core::{srun, JobKind, Submission};
use rl_launch::{LaunchConfig, LocalWorkspace, SlurmSubmission};
use std::os::unix::fs::PermissionsExt;
use tempfile::TempDir;

fn config_for(working_dir: &str) -> LaunchConfig {
    let toml_content = format!(
        r#"
[experiment]
name = "qed_render_test"
working_dir = "{}"
run_config = "config/qed.yaml"

[program]
entrypoint = "optimize_qed.py"
module_search_path = "/opt/rlmolecule"
setup_commands = ["source /etc/profile"]

[scheduler]
account = "rlmolecule"
partition = "standard"
time_limit = "04:00:00"

[trainer]
cpus_per_task = 4
gpus = 1

[rollout]
tasks = 4
cpus_per_task = 18
"#,
        working_dir
    );
    LaunchConfig::from_toml_str(&toml_content).unwrap()
}

#[tokio::test]
async fn test_staged_wrappers_contain_expected_invocations() {
    let temp_dir = TempDir::new().unwrap();
    let working_dir = temp_dir.path().to_str().unwrap().to_string();

    let config = config_for(&working_dir);
    let workspace = LocalWorkspace::new(working_dir.clone());
    let submission = SlurmSubmission::new(workspace, config);

    let plan = submission.plan().await.unwrap();
    let staged = submission.stage(&plan).await.unwrap();
    assert_eq!(staged.len(), 2);

    let policy_path = temp_dir.path().join("start-policy.sh");
    let rollout_path = temp_dir.path().join("start-rollout.sh");
    assert!(policy_path.exists());
    assert!(rollout_path.exists());

    let policy = std::fs::read_to_string(&policy_path).unwrap();
    assert!(policy.starts_with("#!/bin/bash"));
    assert!(policy.contains("source /etc/profile"));
    assert!(policy.contains("export PYTHONPATH=/opt/rlmolecule:\"$PYTHONPATH\""));
    assert!(policy.contains("python -u optimize_qed.py --train-policy --config=config/qed.yaml"));

    let rollout = std::fs::read_to_string(&rollout_path).unwrap();
    assert!(rollout.contains("export CUDA_VISIBLE_DEVICES=-1"));
    assert!(rollout.contains("python -u optimize_qed.py --rollout --config=config/qed.yaml"));
}

#[tokio::test]
async fn test_staged_wrappers_are_executable() {
    let temp_dir = TempDir::new().unwrap();
    let working_dir = temp_dir.path().to_str().unwrap().to_string();

    let config = config_for(&working_dir);
    let workspace = LocalWorkspace::new(working_dir.clone());
    let submission = SlurmSubmission::new(workspace, config);

    let plan = submission.plan().await.unwrap();
    let staged = submission.stage(&plan).await.unwrap();

    for path in staged {
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111, "{} should be executable", path.display());
    }
}

#[test]
fn test_batch_script_carries_scheduler_directives() {
    let config = config_for("/scratch/qed");
    let batch = srun::render_batch_script(&config);

    assert!(batch.starts_with("#!/bin/bash"));
    assert!(batch.contains("#SBATCH --account=rlmolecule"));
    assert!(batch.contains("#SBATCH --partition=standard"));
    assert!(batch.contains("#SBATCH --time=04:00:00"));
    assert!(batch.contains("#SBATCH --job-name=qed_render_test"));
    assert!(batch.contains("#SBATCH --nodes=2"));

    assert!(batch.contains("export WORKING_DIR=/scratch/qed"));
    assert!(batch.contains("export START_POLICY_SCRIPT=\"$WORKING_DIR/start-policy.sh\""));
    assert!(batch.contains("export START_ROLLOUT_SCRIPT=\"$WORKING_DIR/start-rollout.sh\""));

    // trainer 在背景、rollout 在前景，最後 wait
    assert!(batch.contains("--gres=gpu:1 \"$START_POLICY_SCRIPT\" &"));
    assert!(batch.contains("--ntasks=4 --cpus-per-task=18 \"$START_ROLLOUT_SCRIPT\""));
    let rollout_line = batch
        .lines()
        .find(|l| l.contains("$START_ROLLOUT_SCRIPT"))
        .unwrap();
    assert!(!rollout_line.trim_end().ends_with('&'));
    assert!(batch.lines().any(|l| l.trim() == "wait"));
}

#[test]
fn test_batch_script_jobs_share_the_experiment_name() {
    let config = config_for("/scratch/qed");
    let batch = srun::render_batch_script(&config);

    assert!(batch.contains("--job-name=qed_render_test-policy"));
    assert!(batch.contains("--job-name=qed_render_test-rollout"));
}

#[tokio::test]
async fn test_plan_respects_wrapper_file_names() {
    let config = config_for("/scratch/qed");
    let workspace = LocalWorkspace::new("/scratch/qed".to_string());
    let submission = SlurmSubmission::new(workspace, config);

    let plan = submission.plan().await.unwrap();
    assert_eq!(
        plan.wrapper_for(JobKind::TrainPolicy).unwrap().file_name,
        "start-policy.sh"
    );
    assert_eq!(
        plan.wrapper_for(JobKind::Rollout).unwrap().file_name,
        "start-rollout.sh"
    );
}
