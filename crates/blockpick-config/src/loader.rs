//! Configuration loading and validation.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::ExecutionConfig;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load and validate an execution configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<ExecutionConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ExecutionConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &ExecutionConfig) -> Result<(), ConfigError> {
    if config.version == 0 {
        return Err(ConfigError::Invalid(
            "version must be greater than 0".to_string(),
        ));
    }

    if config.robot.host.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "robot.host must not be empty".to_string(),
        ));
    }
    if config.robot.port == 0 {
        return Err(ConfigError::Invalid("robot.port must be > 0".to_string()));
    }

    let calibration = &config.calibration;
    if calibration.pix_mm_ratio <= 0.0 {
        return Err(ConfigError::Invalid(
            "calibration.pix_mm_ratio must be > 0".to_string(),
        ));
    }
    if calibration.camera_offset_mm <= 0.0 {
        return Err(ConfigError::Invalid(
            "calibration.camera_offset_mm must be > 0".to_string(),
        ));
    }
    if calibration.frame_width == 0 || calibration.frame_height == 0 {
        return Err(ConfigError::Invalid(
            "calibration frame dimensions must be > 0".to_string(),
        ));
    }
    calibration.ring()?;

    if config.matcher.area_tolerance <= 0.0 {
        return Err(ConfigError::Invalid(
            "matcher.area_tolerance must be > 0".to_string(),
        ));
    }
    if config.matcher.shape_tolerance <= 0.0 {
        return Err(ConfigError::Invalid(
            "matcher.shape_tolerance must be > 0".to_string(),
        ));
    }

    if config.gripper.open_width_mm <= 0.0 {
        return Err(ConfigError::Invalid(
            "gripper.open_width_mm must be > 0".to_string(),
        ));
    }
    if config.gripper.force_scale <= 0.0 {
        return Err(ConfigError::Invalid(
            "gripper.force_scale must be > 0".to_string(),
        ));
    }

    Ok(())
}
