//! # Blockpick Driver
//!
//! Session management for the robot controller.
//!
//! The controller exposes two mutually exclusive control surfaces: the
//! primary protocol carries motion and telemetry, the secondary protocol
//! carries gripper and orientation I/O. Only one of them may hold the arm at
//! a time, and switching between them requires a give-arm / take-arm / motor
//! sequence. [`session::RobotSession`] owns that state machine; the wire
//! codecs behind each surface are collaborators implementing the
//! [`channel`] traits.

pub mod channel;
pub mod error;
pub mod probe;
pub mod session;
pub mod sim;

pub use channel::{ChannelProvider, Endpoint, Interpolation, PrimaryChannel, SecondaryChannel};
pub use error::DriverError;
pub use probe::probe_endpoint;
pub use session::RobotSession;
