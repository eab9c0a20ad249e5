//! Type definitions for programs, library records, and motion primitives.

mod library;
mod pose;
mod program;

pub use library::{ActionSpec, LibraryRef, LocationSpec, MotionPattern, ObjectSpec};
pub use pose::{JointAngles, Pose, Speed};
pub use program::{Condition, Program, ProgramNode, SequenceStep};
