use serde::{Deserialize, Serialize};

/// 任務種類：policy 訓練或 rollout 模擬
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    TrainPolicy,
    Rollout,
}

impl JobKind {
    /// 傳給外部訓練程式的模式旗標
    pub fn mode_flag(&self) -> &'static str {
        match self {
            JobKind::TrainPolicy => "--train-policy",
            JobKind::Rollout => "--rollout",
        }
    }

    /// 產生的包裝腳本檔名
    pub fn script_file_name(&self) -> &'static str {
        match self {
            JobKind::TrainPolicy => "start-policy.sh",
            JobKind::Rollout => "start-rollout.sh",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobKind::TrainPolicy => "policy-trainer",
            JobKind::Rollout => "rollout-workers",
        }
    }

    /// 接在實驗名稱後面組成排程器的 --job-name
    pub fn job_suffix(&self) -> &'static str {
        match self {
            JobKind::TrainPolicy => "policy",
            JobKind::Rollout => "rollout",
        }
    }
}

/// 單一排程請求的資源需求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResources {
    pub tasks: u32,
    pub cpus_per_task: u32,
    pub gpus: u32,
}

/// 渲染完成、尚未寫入磁碟的包裝腳本
#[derive(Debug, Clone, Serialize)]
pub struct WrapperScript {
    pub kind: JobKind,
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRequest {
    pub kind: JobKind,
    pub resources: JobResources,
    pub script_file: String,
}

/// 完整的提交計畫：兩個包裝腳本加上依序的排程請求（trainer 在前）
#[derive(Debug, Clone, Serialize)]
pub struct LaunchPlan {
    pub wrappers: Vec<WrapperScript>,
    pub jobs: Vec<JobRequest>,
}

impl LaunchPlan {
    pub fn wrapper_for(&self, kind: JobKind) -> Option<&WrapperScript> {
        self.wrappers.iter().find(|w| w.kind == kind)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub kind: JobKind,
    pub exit_code: Option<i32>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LaunchReport {
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub outcomes: Vec<JobOutcome>,
}

impl LaunchReport {
    pub fn all_successful(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }

    pub fn first_failure(&self) -> Option<&JobOutcome> {
        self.outcomes.iter().find(|o| !o.success)
    }
}
