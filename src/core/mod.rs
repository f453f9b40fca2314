pub mod engine;
pub mod srun;
pub mod submission;
pub mod wrapper;

pub use crate::domain::model::{
    JobKind, JobOutcome, JobRequest, JobResources, LaunchPlan, LaunchReport, WrapperScript,
};
pub use crate::domain::ports::{ConfigProvider, Submission, Workspace};
pub use crate::utils::error::Result;
