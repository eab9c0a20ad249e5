//! Runtime errors.

use thiserror::Error;

/// Unexpected lower-level faults surfacing during execution.
///
/// These are not part of the result taxonomy: the request boundary catches
/// them and reports a generic failure. Hardware-adjacent faults still run
/// the disconnect handshake before this propagates.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("driver fault: {0}")]
    Driver(#[from] blockpick_driver::DriverError),

    #[error("vision fault: {0}")]
    Vision(#[from] blockpick_vision::VisionError),

    #[error("library fault: {0}")]
    Library(#[from] blockpick_core::LibraryError),

    #[error("config fault: {0}")]
    Config(#[from] blockpick_config::ConfigError),
}
