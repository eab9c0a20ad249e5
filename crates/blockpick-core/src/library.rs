//! Library lookup seam.
//!
//! The library of objects, actions, and locations is owned by the management
//! collaborator. The execution core resolves references through this
//! read-only trait; implementations live outside this crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LibraryError;
use crate::types::{ActionSpec, LibraryRef, LocationSpec, ObjectSpec};

/// The three record kinds a program can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryKind {
    Object,
    Action,
    Location,
}

impl fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LibraryKind::Object => "object",
            LibraryKind::Action => "action",
            LibraryKind::Location => "location",
        };
        f.write_str(label)
    }
}

/// Read-only resolution of library references to their record payloads.
#[async_trait]
pub trait LibraryLookup: Send + Sync {
    async fn object(&self, reference: &LibraryRef) -> Result<ObjectSpec, LibraryError>;

    async fn action(&self, reference: &LibraryRef) -> Result<ActionSpec, LibraryError>;

    async fn location(&self, reference: &LibraryRef) -> Result<LocationSpec, LibraryError>;
}
