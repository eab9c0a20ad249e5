//! Error types shared across the workspace.

use thiserror::Error;

use crate::library::LibraryKind;

/// Why a program tree was rejected before execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("{kind} reference '{name}' is unresolved")]
    UnresolvedReference { kind: LibraryKind, name: String },

    #[error("sequence chain must start with a pick step")]
    ChainRootNotPick,

    #[error("pick step must continue with a processing or place step")]
    PickWithoutContinuation,

    #[error("processing step must continue with a place step")]
    ProcessingWithoutPlace,
}

/// Library lookup errors.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("{kind} record not found: {name}")]
    NotFound { kind: LibraryKind, name: String },

    #[error("invalid {kind} record '{name}': {reason}")]
    Invalid {
        kind: LibraryKind,
        name: String,
        reason: String,
    },

    #[error("library io error: {0}")]
    Io(String),
}
