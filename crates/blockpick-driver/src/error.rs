//! Driver errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    /// Reachability probe failed; no handshake was attempted.
    #[error("robot not reachable at {host}:{port}")]
    ConnectionFailed { host: String, port: u16 },

    /// Service/controller/arm handshake failed.
    #[error("handshake failure: {0}")]
    Handshake(String),

    /// A command was issued through the wrong control surface or session
    /// state.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Fault reported by a channel implementation.
    #[error("channel fault: {0}")]
    Channel(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
