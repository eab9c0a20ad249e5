//! Control channel traits.
//!
//! These traits model the two vendor control surfaces at the operation
//! level. Keeping them as separate types means gripper commands cannot be
//! issued through the motion surface at all: the session only ever hands the
//! secondary channel to the bundled gripper unit.

use async_trait::async_trait;
use std::time::Duration;

use blockpick_core::{JointAngles, Pose, Speed};

use crate::error::DriverError;
use crate::probe;

/// Controller network endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Controller command timeout (the handshake default is open-ended in
    /// practice: four hours).
    pub timeout: Duration,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Vendor move interpolation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Joint-interpolated move to an absolute pose.
    PointToPoint,
    /// Linear move, used for single-axis updates of the current pose.
    Linear,
}

/// Primary protocol: motion commands and telemetry.
#[async_trait]
pub trait PrimaryChannel: Send {
    async fn start_service(&mut self) -> Result<(), DriverError>;

    async fn stop_service(&mut self) -> Result<(), DriverError>;

    async fn connect_controller(&mut self) -> Result<(), DriverError>;

    async fn disconnect_controller(&mut self) -> Result<(), DriverError>;

    async fn take_arm(&mut self) -> Result<(), DriverError>;

    async fn give_arm(&mut self) -> Result<(), DriverError>;

    async fn set_motor(&mut self, on: bool) -> Result<(), DriverError>;

    async fn move_pose(
        &mut self,
        interpolation: Interpolation,
        pose: &Pose,
        speed: Speed,
    ) -> Result<(), DriverError>;

    /// Joint move at the controller's default speed.
    async fn move_joints(&mut self, joints: &JointAngles) -> Result<(), DriverError>;

    async fn current_pose(&mut self) -> Result<Pose, DriverError>;

    async fn current_joints(&mut self) -> Result<JointAngles, DriverError>;

    /// Current hand aperture, millimetres.
    async fn hand_position(&mut self) -> Result<f64, DriverError>;
}

/// Secondary protocol: gripper and orientation I/O.
#[async_trait]
pub trait SecondaryChannel: Send {
    async fn take_arm(&mut self) -> Result<(), DriverError>;

    async fn give_arm(&mut self) -> Result<(), DriverError>;

    async fn set_motor(&mut self, on: bool) -> Result<(), DriverError>;

    /// Open the hand to an aperture in millimetres at the given speed.
    async fn open_hand(&mut self, width_mm: f64, speed: f64) -> Result<(), DriverError>;

    /// Close the hand with the given force until it grips.
    async fn close_hand(&mut self, force: f64) -> Result<(), DriverError>;
}

/// Factory opening both control surfaces for one endpoint.
#[async_trait]
pub trait ChannelProvider: Send + Sync {
    type Primary: PrimaryChannel;
    type Secondary: SecondaryChannel;

    /// Reachability precheck. Network-backed implementations keep the
    /// default short TCP probe so execution fails fast without attempting
    /// the handshake; in-process implementations override it.
    async fn probe(&self, endpoint: &Endpoint) -> Result<(), DriverError> {
        probe::probe_endpoint(endpoint).await
    }

    async fn open(
        &self,
        endpoint: &Endpoint,
    ) -> Result<(Self::Primary, Self::Secondary), DriverError>;
}
