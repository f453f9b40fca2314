use crate::domain::model::{JobResources, LaunchPlan, LaunchReport};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

pub trait Workspace: Send + Sync {
    fn write_script(
        &self,
        file_name: &str,
        content: &str,
    ) -> impl std::future::Future<Output = Result<PathBuf>> + Send;
    fn read_script(
        &self,
        file_name: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn job_name(&self) -> &str;
    fn working_dir(&self) -> &str;
    fn run_config(&self) -> &str;
    fn launcher(&self) -> &str;
    fn account(&self) -> &str;
    fn partition(&self) -> &str;
    fn time_limit(&self) -> &str;
    fn nodes(&self) -> u32;
    /// 外部訓練程式的啟動指令，例如 "python -u optimize_qed.py"
    fn program_command(&self) -> String;
    fn setup_commands(&self) -> &[String];
    fn module_search_path(&self) -> Option<&str>;
    /// 包裝腳本中額外匯出的環境變數（已排序，輸出才有確定性）
    fn extra_environment(&self) -> Vec<(String, String)>;
    fn trainer_resources(&self) -> JobResources;
    fn rollout_resources(&self) -> JobResources;
}

#[async_trait]
pub trait Submission: Send + Sync {
    async fn plan(&self) -> Result<LaunchPlan>;
    async fn stage(&self, plan: &LaunchPlan) -> Result<Vec<PathBuf>>;
    async fn submit(&self, plan: &LaunchPlan, staged: &[PathBuf]) -> Result<LaunchReport>;
}
