pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::LocalWorkspace;

pub use config::launch_config::LaunchConfig;
pub use core::{engine::LaunchEngine, submission::SlurmSubmission};
pub use utils::error::{LaunchError, Result};
