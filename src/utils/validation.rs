use crate::utils::error::{LaunchError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 任務名稱會成為排程器的 --job-name，限制在安全字元內
pub fn validate_job_name(field_name: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LaunchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: "Job name cannot be empty".to_string(),
        });
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(LaunchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: "Only letters, digits, '-', '_' and '.' are allowed".to_string(),
        });
    }

    Ok(())
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LaunchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LaunchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u32, min_value: u32) -> Result<()> {
    if value < min_value {
        return Err(LaunchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LaunchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 排程器時限格式：HH:MM:SS，或帶天數的 D-HH:MM:SS
pub fn validate_time_limit(field_name: &str, value: &str) -> Result<()> {
    let invalid = |reason: String| LaunchError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason,
    };

    let clock = match value.split_once('-') {
        Some((days, rest)) => {
            if days.is_empty() || !days.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid(format!("Invalid day count: '{}'", days)));
            }
            rest
        }
        None => value,
    };

    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() != 3 {
        return Err(invalid(
            "Expected HH:MM:SS or D-HH:MM:SS (e.g. 04:00:00)".to_string(),
        ));
    }

    for (i, part) in parts.iter().enumerate() {
        let n: u32 = part
            .parse()
            .map_err(|_| invalid(format!("'{}' is not a number", part)))?;
        // 時數不設上限，分秒必須小於 60
        if i > 0 && n >= 60 {
            return Err(invalid(format!("'{}' must be below 60", part)));
        }
    }

    Ok(())
}
