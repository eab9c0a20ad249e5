//! # Blockpick Config
//!
//! One YAML document configures an execution: controller endpoint, workcell
//! calibration, matcher tuning, and gripper parameters. Serde defaults equal
//! the calibrated workcell constants, so an empty document is a valid,
//! complete configuration.

mod loader;

pub use loader::{load_config, validate_config, ConfigError};

use std::time::Duration;

use serde::{Deserialize, Serialize};

use blockpick_core::{Calibration, Pose};
use blockpick_driver::Endpoint;
use blockpick_vision::MatcherConfig;

/// Controller endpoint and timeouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub host: String,
    pub port: u16,
    /// Camera service address, when distinct from the controller.
    pub camera_host: Option<String>,
    /// Controller command timeout, seconds.
    pub timeout_secs: u64,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            host: "192.168.0.1".to_string(),
            port: 5007,
            camera_host: None,
            timeout_secs: 14_400,
        }
    }
}

impl RobotConfig {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(
            self.host.clone(),
            self.port,
            Duration::from_secs(self.timeout_secs),
        )
    }
}

/// Workcell calibration: camera geometry plus the fixed scan poses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Pixels per millimetre at the calibration height.
    pub pix_mm_ratio: f64,
    /// Camera-to-gripper axis distance, mm.
    pub camera_offset_mm: f64,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Camera working height; the gripper returns here after a pick.
    pub calibration_height_mm: f64,
    /// The six scan poses tiling the workspace. The first is the home pose.
    pub quadrants: Vec<Pose>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            pix_mm_ratio: 9.222,
            camera_offset_mm: 52.385_709_259_836_08,
            frame_width: 1920,
            frame_height: 1080,
            calibration_height_mm: 254.998_151_727_705_93,
            quadrants: default_quadrants(),
        }
    }
}

impl CalibrationConfig {
    /// The geometry slice of the calibration, for the conversion functions.
    pub fn geometry(&self) -> Calibration {
        Calibration {
            pix_mm_ratio: self.pix_mm_ratio,
            camera_offset_mm: self.camera_offset_mm,
            frame_width: self.frame_width,
            frame_height: self.frame_height,
        }
    }

    /// The fixed search ring. Errors when the document does not carry
    /// exactly six poses.
    pub fn ring(&self) -> Result<[Pose; 6], ConfigError> {
        <[Pose; 6]>::try_from(self.quadrants.clone()).map_err(|quadrants| {
            ConfigError::Invalid(format!(
                "calibration.quadrants must hold exactly 6 poses, got {}",
                quadrants.len()
            ))
        })
    }

    /// Home pose: the first ring pose.
    pub fn home_pose(&self) -> Option<&Pose> {
        self.quadrants.first()
    }
}

/// The taught scan poses of the calibrated workcell.
fn default_quadrants() -> Vec<Pose> {
    vec![
        Pose::new(
            177.483268825558,
            -44.478627592948996,
            254.99815172770593,
            -179.98842099994923,
            0.0,
            179.99584205147127,
            261.0,
        ),
        Pose::new(
            124.8479084757812,
            96.71132432510223,
            254.93505849932905,
            179.98326477675423,
            -0.021660598353600596,
            179.9971873030206,
            261.0,
        ),
        Pose::new(
            201.62729889242553,
            96.71465770886049,
            254.9352502844515,
            179.98348831787996,
            -0.021534861588810798,
            179.99838567272027,
            261.0,
        ),
        Pose::new(
            222.45008156262494,
            -28.895388040937206,
            254.9197279214668,
            179.9806000045344,
            -0.029053337503689936,
            179.98516581416754,
            261.0,
        ),
        Pose::new(
            217.31049652044388,
            -130.24508774032034,
            254.89685566528902,
            179.9716479887839,
            -0.03128951339508686,
            179.98066547808395,
            261.0,
        ),
        Pose::new(
            133.63413919141982,
            -131.393237172843,
            254.87885013312,
            179.9599341526348,
            -0.027773416827480392,
            179.97129867455095,
            261.0,
        ),
    ]
}

/// Gripper actuation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GripperConfig {
    /// Release aperture, mm.
    pub open_width_mm: f64,
    /// Release speed.
    pub open_speed: f64,
    /// Multiplier applied to an object's grip force before closing.
    pub force_scale: f64,
}

impl Default for GripperConfig {
    fn default() -> Self {
        Self {
            open_width_mm: 30.0,
            open_speed: 25.0,
            force_scale: 6.0,
        }
    }
}

/// Full execution configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub version: u32,
    pub robot: RobotConfig,
    pub calibration: CalibrationConfig,
    pub matcher: MatcherConfig,
    pub gripper: GripperConfig,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            version: 1,
            robot: RobotConfig::default(),
            calibration: CalibrationConfig::default(),
            matcher: MatcherConfig::default(),
            gripper: GripperConfig::default(),
        }
    }
}
