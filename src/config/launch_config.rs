use crate::domain::model::JobResources;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LaunchError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub experiment: ExperimentConfig,
    pub program: ProgramConfig,
    pub scheduler: SchedulerConfig,
    pub trainer: Option<TrainerConfig>,
    pub rollout: Option<RolloutConfig>,
    pub environment: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub name: String,
    pub working_dir: String,
    /// 以 --config= 傳給外部訓練程式的執行設定檔
    pub run_config: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramConfig {
    pub entrypoint: String,
    pub interpreter: Option<String>,
    pub module_search_path: Option<String>,
    pub setup_commands: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub launcher: Option<String>,
    pub account: String,
    pub partition: String,
    pub time_limit: String,
    pub nodes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub tasks: Option<u32>,
    pub cpus_per_task: Option<u32>,
    pub gpus: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloutConfig {
    pub tasks: Option<u32>,
    pub cpus_per_task: Option<u32>,
    pub gpus: Option<u32>,
}

impl LaunchConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LaunchError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LaunchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SCRATCH})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_job_name("experiment.name", &self.experiment.name)?;
        validation::validate_path("experiment.working_dir", &self.experiment.working_dir)?;
        validation::validate_path("experiment.run_config", &self.experiment.run_config)?;

        validation::validate_non_empty_string("program.entrypoint", &self.program.entrypoint)?;
        validation::validate_non_empty_string("scheduler.launcher", self.launcher())?;
        validation::validate_non_empty_string("scheduler.account", &self.scheduler.account)?;
        validation::validate_non_empty_string("scheduler.partition", &self.scheduler.partition)?;
        validation::validate_time_limit("scheduler.time_limit", &self.scheduler.time_limit)?;
        validation::validate_positive_number("scheduler.nodes", self.nodes(), 1)?;

        let trainer = self.trainer_resources();
        validation::validate_positive_number("trainer.tasks", trainer.tasks, 1)?;
        validation::validate_positive_number("trainer.cpus_per_task", trainer.cpus_per_task, 1)?;

        let rollout = self.rollout_resources();
        validation::validate_positive_number("rollout.tasks", rollout.tasks, 1)?;
        validation::validate_positive_number("rollout.cpus_per_task", rollout.cpus_per_task, 1)?;

        Ok(())
    }

    /// 取得排程器啟動指令
    pub fn launcher(&self) -> &str {
        self.scheduler.launcher.as_deref().unwrap_or("srun")
    }

    pub fn interpreter(&self) -> &str {
        self.program.interpreter.as_deref().unwrap_or("python")
    }

    pub fn nodes(&self) -> u32 {
        self.scheduler.nodes.unwrap_or(2)
    }

    pub fn setup_commands(&self) -> &[String] {
        self.program.setup_commands.as_deref().unwrap_or(&[])
    }
}

impl ConfigProvider for LaunchConfig {
    fn job_name(&self) -> &str {
        &self.experiment.name
    }

    fn working_dir(&self) -> &str {
        &self.experiment.working_dir
    }

    fn run_config(&self) -> &str {
        &self.experiment.run_config
    }

    fn launcher(&self) -> &str {
        self.launcher()
    }

    fn account(&self) -> &str {
        &self.scheduler.account
    }

    fn partition(&self) -> &str {
        &self.scheduler.partition
    }

    fn time_limit(&self) -> &str {
        &self.scheduler.time_limit
    }

    fn nodes(&self) -> u32 {
        self.nodes()
    }

    fn program_command(&self) -> String {
        // -u 讓訓練程式的輸出在排程器底下不被緩衝
        format!("{} -u {}", self.interpreter(), self.program.entrypoint)
    }

    fn setup_commands(&self) -> &[String] {
        self.setup_commands()
    }

    fn module_search_path(&self) -> Option<&str> {
        self.program.module_search_path.as_deref()
    }

    fn extra_environment(&self) -> Vec<(String, String)> {
        let mut vars: Vec<(String, String)> = self
            .environment
            .as_ref()
            .map(|env| env.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        vars.sort();
        vars
    }

    fn trainer_resources(&self) -> JobResources {
        let trainer = self.trainer.as_ref();
        JobResources {
            tasks: trainer.and_then(|t| t.tasks).unwrap_or(1),
            cpus_per_task: trainer.and_then(|t| t.cpus_per_task).unwrap_or(4),
            gpus: trainer.and_then(|t| t.gpus).unwrap_or(1),
        }
    }

    fn rollout_resources(&self) -> JobResources {
        let rollout = self.rollout.as_ref();
        JobResources {
            tasks: rollout.and_then(|r| r.tasks).unwrap_or(4),
            cpus_per_task: rollout.and_then(|r| r.cpus_per_task).unwrap_or(4),
            gpus: rollout.and_then(|r| r.gpus).unwrap_or(0),
        }
    }
}

impl Validate for LaunchConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
