use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required config field: {field}")]
    MissingConfigError { field: String },

    #[error("Scheduler command failed to start: {command}: {message}")]
    SchedulerError { command: String, message: String },

    #[error("Job '{job}' exited with code {code:?}")]
    JobFailedError { job: String, code: Option<i32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Io,
    Scheduler,
    Job,
}

/// 嚴重程度對應 CLI 的退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LaunchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LaunchError::ConfigValidationError { .. }
            | LaunchError::InvalidConfigValueError { .. }
            | LaunchError::MissingConfigError { .. } => ErrorCategory::Config,
            LaunchError::IoError(_) | LaunchError::SerializationError(_) => ErrorCategory::Io,
            LaunchError::SchedulerError { .. } => ErrorCategory::Scheduler,
            LaunchError::JobFailedError { .. } => ErrorCategory::Job,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LaunchError::ConfigValidationError { .. }
            | LaunchError::InvalidConfigValueError { .. }
            | LaunchError::MissingConfigError { .. } => ErrorSeverity::High,
            LaunchError::SerializationError(_) => ErrorSeverity::High,
            LaunchError::IoError(_) | LaunchError::SchedulerError { .. } => ErrorSeverity::Critical,
            // 任務失敗通常重新提交即可
            LaunchError::JobFailedError { .. } => ErrorSeverity::Medium,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            LaunchError::ConfigValidationError { field, .. }
            | LaunchError::InvalidConfigValueError { field, .. }
            | LaunchError::MissingConfigError { field } => {
                format!("Check the '{}' entry in your launch config", field)
            }
            LaunchError::IoError(_) => {
                "Check that the working directory exists and is writable".to_string()
            }
            LaunchError::SerializationError(_) => {
                "Re-run with --verbose to see the offending data".to_string()
            }
            LaunchError::SchedulerError { command, .. } => format!(
                "Check that '{}' is on PATH and you are inside a cluster allocation",
                command
            ),
            LaunchError::JobFailedError { job, .. } => format!(
                "Inspect the {} logs in the working directory, then resubmit",
                job
            ),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LaunchError::ConfigValidationError { field, message } => {
                format!("Configuration problem ({}): {}", field, message)
            }
            LaunchError::InvalidConfigValueError { field, value, .. } => {
                format!("'{}' is not a usable value for {}", value, field)
            }
            LaunchError::MissingConfigError { field } => {
                format!("The launch config is missing '{}'", field)
            }
            LaunchError::IoError(e) => format!("Could not read or write launch files: {}", e),
            LaunchError::SerializationError(e) => format!("Could not encode launch data: {}", e),
            LaunchError::SchedulerError { command, message } => {
                format!("The cluster launcher '{}' could not be started: {}", command, message)
            }
            LaunchError::JobFailedError { job, code } => match code {
                Some(code) => format!("The {} job finished with exit code {}", job, code),
                None => format!("The {} job was terminated by a signal", job),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, LaunchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = LaunchError::MissingConfigError {
            field: "experiment.name".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Config);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.recovery_suggestion().contains("experiment.name"));
    }

    #[test]
    fn test_job_failure_is_retryable() {
        let err = LaunchError::JobFailedError {
            job: "rollout-workers".to_string(),
            code: Some(1),
        };
        assert_eq!(err.category(), ErrorCategory::Job);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.user_friendly_message().contains("exit code 1"));
    }

    #[test]
    fn test_signal_termination_message() {
        let err = LaunchError::JobFailedError {
            job: "policy-trainer".to_string(),
            code: None,
        };
        assert!(err.user_friendly_message().contains("signal"));
    }
}
