//! # Blockpick Runtime
//!
//! The program execution engine: walks a validated block-program tree and
//! drives the motion driver and the vision-guided object search against one
//! robot session.
//!
//! Execution is strictly sequential. Every step is a blocking await, in the
//! order physical causality demands: the next motion depends on the outcome
//! of the previous vision match. One session per request, disconnected on
//! every exit path.

pub mod error;
pub mod executor;
pub mod interpreter;
pub mod search;

pub use error::ExecError;
pub use executor::{ExecutionRequest, ProgramExecutor};
pub use interpreter::{resolve_program, ResolveError, ResolvedChain, ResolvedCondition, ResolvedNode};
pub use search::{search_object, SearchContext, SearchCursor, SearchOutcome};
