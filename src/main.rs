use clap::Parser;
use rl_launch::core::{srun, ConfigProvider, Submission};
use rl_launch::utils::{logger, validation::Validate};
use rl_launch::{LaunchConfig, LaunchEngine, LocalWorkspace, SlurmSubmission};
use std::path::Path;

#[derive(Parser)]
#[command(name = "rl-launch")]
#[command(about = "Submit a distributed RL training experiment to a SLURM cluster")]
struct Args {
    /// Path to TOML launch configuration file
    #[arg(short, long, default_value = "launch.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the scheduler launcher binary from config
    #[arg(long)]
    launcher: Option<String>,

    /// Dry run - show what would be submitted without executing
    #[arg(long)]
    dry_run: bool,

    /// Print the launch plan as JSON during a dry run
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting rl-launch");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let mut config = match LaunchConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(launcher) = args.launcher.clone() {
        tracing::info!("🔧 Scheduler launcher overridden to: {}", launcher);
        config.scheduler.launcher = Some(launcher);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 顯示配置摘要
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - Nothing will be written or submitted");
        perform_dry_run(&config, args.json).await?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or(false);
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 建立工作區與提交流程
    let workspace = LocalWorkspace::new(config.experiment.working_dir.clone());
    let submission = SlurmSubmission::new(workspace, config);

    let engine = LaunchEngine::new_with_monitoring(submission, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Experiment submitted and completed successfully!");
            println!("✅ Experiment submitted and completed successfully!");
            println!("📋 {} job(s) finished cleanly", report.outcomes.len());
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Launch failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                rl_launch::utils::error::ErrorSeverity::Low => 0,
                rl_launch::utils::error::ErrorSeverity::Medium => 2,
                rl_launch::utils::error::ErrorSeverity::High => 1,
                rl_launch::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &LaunchConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Experiment: {}", config.experiment.name);
    println!("  Working dir: {}", config.experiment.working_dir);
    println!("  Run config: {}", config.experiment.run_config);
    println!("  Program: {}", config.program_command());
    println!(
        "  Scheduler: {} (account={}, partition={}, time={}, nodes={})",
        config.launcher(),
        config.scheduler.account,
        config.scheduler.partition,
        config.scheduler.time_limit,
        config.nodes()
    );

    let trainer = config.trainer_resources();
    println!(
        "  Trainer: {} task(s), {} cpu(s)/task, {} gpu(s)",
        trainer.tasks, trainer.cpus_per_task, trainer.gpus
    );
    let rollout = config.rollout_resources();
    println!(
        "  Rollout: {} task(s), {} cpu(s)/task, {} gpu(s)",
        rollout.tasks, rollout.cpus_per_task, rollout.gpus
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(
    config: &LaunchConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // plan 不碰檔案系統，借一個不會用到的工作區即可
    let workspace = LocalWorkspace::new(config.experiment.working_dir.clone());
    let submission = SlurmSubmission::new(workspace, config.clone());
    let plan = submission.plan().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📝 Wrapper scripts that would be staged:");
    for wrapper in &plan.wrappers {
        let path = Path::new(&config.experiment.working_dir).join(&wrapper.file_name);
        println!("--- {} ---", path.display());
        println!("{}", wrapper.content);
    }

    println!("🚀 Scheduler invocations that would run:");
    for job in &plan.jobs {
        let script = Path::new(&config.experiment.working_dir).join(&job.script_file);
        let command = srun::launch_command(
            config.launcher(),
            &config.experiment.name,
            job,
            &script.to_string_lossy(),
        );
        let background = if job.kind == rl_launch::core::JobKind::TrainPolicy {
            " &"
        } else {
            ""
        };
        println!("  {}{}", command.display(), background);
    }

    println!();
    println!("✅ Dry run analysis complete. Drop --dry-run to submit for real.");

    Ok(())
}
