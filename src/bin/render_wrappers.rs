use clap::Parser;
use rl_launch::core::{srun, Submission, Workspace};
use rl_launch::utils::{logger, validation::Validate};
use rl_launch::{LaunchConfig, LocalWorkspace, SlurmSubmission};

/// 只渲染不提交：把包裝腳本和 sbatch 批次檔寫進工作目錄，
/// 之後可以人工用 sbatch 提交
#[derive(Parser)]
#[command(name = "render-wrappers")]
#[command(about = "Stage wrapper scripts and a batch submission file without submitting")]
struct Args {
    /// Path to TOML launch configuration file
    #[arg(short, long, default_value = "launch.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// File name of the emitted batch submission script
    #[arg(long, default_value = "submit.sbatch")]
    batch_file: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting render-wrappers");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match LaunchConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let workspace = LocalWorkspace::new(config.experiment.working_dir.clone());
    let submission = SlurmSubmission::new(workspace.clone(), config.clone());

    // 渲染並寫入兩個包裝腳本
    let plan = submission.plan().await?;
    let staged = submission.stage(&plan).await?;

    for path in &staged {
        println!("📝 Staged {}", path.display());
    }

    // 批次提交檔走原本 sbatch 的路
    let batch_script = srun::render_batch_script(&config);
    let batch_path = workspace.write_script(&args.batch_file, &batch_script).await?;
    println!("📝 Staged {}", batch_path.display());

    println!();
    println!("✅ Nothing was submitted. To submit the experiment run:");
    println!("   sbatch {}", batch_path.display());

    Ok(())
}
