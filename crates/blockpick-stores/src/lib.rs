//! # Blockpick Stores
//!
//! In-memory implementation of the library lookup seam, for development,
//! tests, and the simulated backend. The real library lives behind the
//! management collaborator; records here are registered programmatically or
//! loaded from a JSON fixture file.

mod library;

pub use library::{InMemoryLibrary, LibraryFile};
