//! Simulated controller channels.
//!
//! In-memory implementation of both control surfaces over a shared scripted
//! world, for tests and the simulation backend. The world enforces the same
//! handshake discipline as the real controller: commands fail unless the
//! issuing surface holds the arm and the motor is on.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blockpick_core::{JointAngles, Pose, Speed};

use crate::channel::{ChannelProvider, Endpoint, Interpolation, PrimaryChannel, SecondaryChannel};
use crate::error::DriverError;

/// Which surface holds the arm in the simulated world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSide {
    Primary,
    Secondary,
}

/// Observable state of the simulated controller.
#[derive(Debug, Clone, Default)]
pub struct SimState {
    pub service_running: bool,
    pub controller_connected: bool,
    pub motor_on: bool,
    pub arm_owner: Option<ChannelSide>,
    pub pose: Pose,
    pub joints: JointAngles,
    pub hand_width: f64,
    pub last_close_force: Option<f64>,
    pub connects: u32,
    pub disconnects: u32,
    /// Audit log of motion and hand commands, in issue order.
    pub commands: Vec<String>,
}

/// Shared handle on the simulated controller state.
#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    state: Arc<Mutex<SimState>>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SimState {
        self.state.lock().expect("sim state poisoned").clone()
    }

    /// Motion/hand commands issued so far.
    pub fn commands(&self) -> Vec<String> {
        self.snapshot().commands
    }

    fn with<T>(&self, f: impl FnOnce(&mut SimState) -> T) -> T {
        f(&mut self.state.lock().expect("sim state poisoned"))
    }
}

/// Provider opening simulated channel pairs over one shared world.
#[derive(Debug, Default)]
pub struct SimProvider {
    world: SimWorld,
    unreachable: bool,
    opened: AtomicU32,
}

impl SimProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the probe fail, as against a powered-off controller.
    pub fn with_unreachable_endpoint(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    /// How many channel pairs have been opened.
    pub fn opened(&self) -> u32 {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelProvider for SimProvider {
    type Primary = SimPrimary;
    type Secondary = SimSecondary;

    async fn probe(&self, endpoint: &Endpoint) -> Result<(), DriverError> {
        if self.unreachable {
            Err(DriverError::ConnectionFailed {
                host: endpoint.host.clone(),
                port: endpoint.port,
            })
        } else {
            Ok(())
        }
    }

    async fn open(
        &self,
        _endpoint: &Endpoint,
    ) -> Result<(Self::Primary, Self::Secondary), DriverError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok((
            SimPrimary {
                world: self.world.clone(),
            },
            SimSecondary {
                world: self.world.clone(),
            },
        ))
    }
}

/// Simulated primary (motion/telemetry) surface.
#[derive(Debug, Clone)]
pub struct SimPrimary {
    world: SimWorld,
}

/// Simulated secondary (gripper I/O) surface.
#[derive(Debug, Clone)]
pub struct SimSecondary {
    world: SimWorld,
}

fn require(condition: bool, message: &str) -> Result<(), DriverError> {
    if condition {
        Ok(())
    } else {
        Err(DriverError::Protocol(message.to_string()))
    }
}

fn require_motion_ready(state: &SimState, side: ChannelSide) -> Result<(), DriverError> {
    require(state.service_running, "service not running")?;
    require(state.controller_connected, "controller not connected")?;
    require(state.arm_owner == Some(side), "arm not held by this surface")?;
    require(state.motor_on, "motor off")
}

#[async_trait]
impl PrimaryChannel for SimPrimary {
    async fn start_service(&mut self) -> Result<(), DriverError> {
        self.world.with(|state| state.service_running = true);
        Ok(())
    }

    async fn stop_service(&mut self) -> Result<(), DriverError> {
        self.world.with(|state| state.service_running = false);
        Ok(())
    }

    async fn connect_controller(&mut self) -> Result<(), DriverError> {
        self.world.with(|state| {
            if !state.service_running {
                return Err(DriverError::Handshake("service not running".into()));
            }
            state.controller_connected = true;
            state.connects += 1;
            Ok(())
        })
    }

    async fn disconnect_controller(&mut self) -> Result<(), DriverError> {
        self.world.with(|state| {
            state.controller_connected = false;
            state.disconnects += 1;
        });
        Ok(())
    }

    async fn take_arm(&mut self) -> Result<(), DriverError> {
        self.world.with(|state| {
            require(state.arm_owner.is_none(), "arm already held")?;
            state.arm_owner = Some(ChannelSide::Primary);
            Ok(())
        })
    }

    async fn give_arm(&mut self) -> Result<(), DriverError> {
        self.world.with(|state| {
            require(
                state.arm_owner == Some(ChannelSide::Primary),
                "arm not held by primary",
            )?;
            state.arm_owner = None;
            Ok(())
        })
    }

    async fn set_motor(&mut self, on: bool) -> Result<(), DriverError> {
        self.world.with(|state| {
            require(
                state.arm_owner == Some(ChannelSide::Primary),
                "arm not held by primary",
            )?;
            state.motor_on = on;
            Ok(())
        })
    }

    async fn move_pose(
        &mut self,
        interpolation: Interpolation,
        pose: &Pose,
        speed: Speed,
    ) -> Result<(), DriverError> {
        self.world.with(|state| {
            require_motion_ready(state, ChannelSide::Primary)?;
            state.pose = *pose;
            let mode = match interpolation {
                Interpolation::PointToPoint => "ptp",
                Interpolation::Linear => "lin",
            };
            state
                .commands
                .push(format!("move {} {} {}", mode, pose, speed.as_command()));
            Ok(())
        })
    }

    async fn move_joints(&mut self, joints: &JointAngles) -> Result<(), DriverError> {
        self.world.with(|state| {
            require_motion_ready(state, ChannelSide::Primary)?;
            state.joints = *joints;
            state.commands.push(format!("move joints {}", joints));
            Ok(())
        })
    }

    async fn current_pose(&mut self) -> Result<Pose, DriverError> {
        Ok(self.world.snapshot().pose)
    }

    async fn current_joints(&mut self) -> Result<JointAngles, DriverError> {
        Ok(self.world.snapshot().joints)
    }

    async fn hand_position(&mut self) -> Result<f64, DriverError> {
        Ok(self.world.snapshot().hand_width)
    }
}

#[async_trait]
impl SecondaryChannel for SimSecondary {
    async fn take_arm(&mut self) -> Result<(), DriverError> {
        self.world.with(|state| {
            require(state.arm_owner.is_none(), "arm already held")?;
            state.arm_owner = Some(ChannelSide::Secondary);
            Ok(())
        })
    }

    async fn give_arm(&mut self) -> Result<(), DriverError> {
        self.world.with(|state| {
            require(
                state.arm_owner == Some(ChannelSide::Secondary),
                "arm not held by secondary",
            )?;
            state.arm_owner = None;
            Ok(())
        })
    }

    async fn set_motor(&mut self, on: bool) -> Result<(), DriverError> {
        self.world.with(|state| {
            require(
                state.arm_owner == Some(ChannelSide::Secondary),
                "arm not held by secondary",
            )?;
            state.motor_on = on;
            Ok(())
        })
    }

    async fn open_hand(&mut self, width_mm: f64, speed: f64) -> Result<(), DriverError> {
        self.world.with(|state| {
            require_motion_ready(state, ChannelSide::Secondary)?;
            state.hand_width = width_mm;
            state
                .commands
                .push(format!("open_hand {} {}", width_mm, speed));
            Ok(())
        })
    }

    async fn close_hand(&mut self, force: f64) -> Result<(), DriverError> {
        self.world.with(|state| {
            require_motion_ready(state, ChannelSide::Secondary)?;
            state.hand_width = 0.0;
            state.last_close_force = Some(force);
            state.commands.push(format!("close_hand {}", force));
            Ok(())
        })
    }
}
