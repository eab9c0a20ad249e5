//! Motion primitives shared by the driver, search, and interpreter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Cartesian pose in the robot base frame.
///
/// Positions are millimetres, orientations degrees. `fig` is the controller's
/// arm-configuration code and travels with the pose unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
    #[serde(default)]
    pub fig: f64,
}

impl Pose {
    #[allow(clippy::too_many_arguments)]
    pub fn new(x: f64, y: f64, z: f64, rx: f64, ry: f64, rz: f64, fig: f64) -> Self {
        Self {
            x,
            y,
            z,
            rx,
            ry,
            rz,
            fig,
        }
    }

    /// Copy with the X/Y components replaced, everything else preserved.
    pub fn with_xy(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Copy with the Z component replaced, everything else preserved.
    pub fn with_z(mut self, z: f64) -> Self {
        self.z = z;
        self
    }
}

impl fmt::Display for Pose {
    /// Controller position literal, `P(x, y, z, rx, ry, rz, fig)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P({}, {}, {}, {}, {}, {}, {})",
            self.x, self.y, self.z, self.rx, self.ry, self.rz, self.fig
        )
    }
}

/// Joint-space coordinates in degrees, J1..J6.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointAngles(pub [f64; 6]);

impl JointAngles {
    pub fn new(values: [f64; 6]) -> Self {
        Self(values)
    }

    /// Base (J1) angle.
    pub fn base(&self) -> f64 {
        self.0[0]
    }

    /// Wrist yaw (J6) angle.
    pub fn yaw(&self) -> f64 {
        self.0[5]
    }

    /// Copy with the wrist yaw (J6) replaced.
    pub fn with_yaw(mut self, yaw: f64) -> Self {
        self.0[5] = yaw;
        self
    }
}

impl fmt::Display for JointAngles {
    /// Controller joint literal, `J(j1, j2, j3, j4, j5, j6)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "J({}, {}, {}, {}, {}, {})",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

/// Motion speed classes understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speed {
    /// SPEED=100. Quadrant moves, action playback, and placement.
    Full,
    /// SPEED=50. Descend-to-object and lift-to-calibration-height moves.
    Half,
}

impl Speed {
    /// Controller speed option string.
    pub fn as_command(&self) -> &'static str {
        match self {
            Speed::Full => "SPEED=100",
            Speed::Half => "SPEED=50",
        }
    }
}
