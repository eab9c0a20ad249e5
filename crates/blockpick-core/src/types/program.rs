//! Block-program tree model.
//!
//! Programs are authored by the excluded builder collaborator and arrive
//! here as finalized, immutable trees. The node kind set is closed, so
//! dispatch is plain pattern matching rather than open-ended polymorphism.

use serde::{Deserialize, Serialize};

use crate::error::MalformedReason;
use crate::library::LibraryKind;

use super::LibraryRef;

/// Condition evaluated by `When` / `WhenOtherwise` nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Out-of-band sensor signal, supplied as a boolean by the caller.
    Sensor,
    /// Out-of-band human acknowledgment, supplied as a boolean by the caller.
    Human,
    /// Presence test: run an independent workspace search for the object.
    Find { object: LibraryRef },
}

/// One step in a Pick → [Processing] → Place chain.
///
/// Steps form a singly linked list. The chain invariants: a pick's `next`
/// must be a processing or place step, a processing's `next` must be a place
/// step, and every executable chain terminates in a place step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SequenceStep {
    Pick {
        object: LibraryRef,
        #[serde(default)]
        next: Option<Box<SequenceStep>>,
    },
    Processing {
        action: LibraryRef,
        #[serde(default)]
        next: Option<Box<SequenceStep>>,
    },
    Place {
        location: LibraryRef,
    },
}

impl SequenceStep {
    /// Enforce the chain invariants starting from this step as chain root.
    pub fn validate_chain(&self) -> Result<(), MalformedReason> {
        let SequenceStep::Pick { object, next } = self else {
            return Err(MalformedReason::ChainRootNotPick);
        };
        require_resolved(object, LibraryKind::Object)?;

        let mut step = match next.as_deref() {
            Some(step) => step,
            None => return Err(MalformedReason::PickWithoutContinuation),
        };

        if let SequenceStep::Processing { action, next } = step {
            require_resolved(action, LibraryKind::Action)?;
            step = match next.as_deref() {
                Some(step) => step,
                None => return Err(MalformedReason::ProcessingWithoutPlace),
            };
        }

        match step {
            SequenceStep::Place { location } => require_resolved(location, LibraryKind::Location),
            SequenceStep::Pick { .. } => Err(MalformedReason::PickWithoutContinuation),
            SequenceStep::Processing { .. } => Err(MalformedReason::ProcessingWithoutPlace),
        }
    }
}

fn require_resolved(reference: &LibraryRef, kind: LibraryKind) -> Result<(), MalformedReason> {
    if reference.is_resolved() {
        Ok(())
    } else {
        Err(MalformedReason::UnresolvedReference {
            kind,
            name: reference.name.clone(),
        })
    }
}

/// One node of the program tree. The variant set is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgramNode {
    /// A bare Pick → [Processing] → Place chain, executed once.
    Sequence { chain: SequenceStep },
    /// Execute the chain a fixed number of times.
    Repeat { times: u32, body: SequenceStep },
    /// Execute the chain until an object search fails.
    Loop { body: SequenceStep },
    /// Execute the chain once if the condition holds.
    When {
        condition: Condition,
        body: SequenceStep,
    },
    /// Execute the chain once if the condition holds, otherwise execute the
    /// fallback chain instead.
    WhenOtherwise {
        condition: Condition,
        body: SequenceStep,
        otherwise: SequenceStep,
    },
}

impl ProgramNode {
    /// Validate the node and every chain it owns.
    ///
    /// Must succeed before any hardware interaction; a malformed tree aborts
    /// the whole execution with `MalformedProgram`.
    pub fn validate(&self) -> Result<(), MalformedReason> {
        match self {
            ProgramNode::Sequence { chain } => chain.validate_chain(),
            ProgramNode::Repeat { body, .. } | ProgramNode::Loop { body } => body.validate_chain(),
            ProgramNode::When { condition, body } => {
                validate_condition(condition)?;
                body.validate_chain()
            }
            ProgramNode::WhenOtherwise {
                condition,
                body,
                otherwise,
            } => {
                validate_condition(condition)?;
                body.validate_chain()?;
                otherwise.validate_chain()
            }
        }
    }
}

fn validate_condition(condition: &Condition) -> Result<(), MalformedReason> {
    match condition {
        Condition::Sensor | Condition::Human => Ok(()),
        Condition::Find { object } => require_resolved(object, LibraryKind::Object),
    }
}

/// A finalized program: one tree per task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Task identifier assigned by the program source.
    #[serde(default)]
    pub task_id: String,
    pub root: ProgramNode,
}

impl Program {
    pub fn new(task_id: impl Into<String>, root: ProgramNode) -> Self {
        Self {
            task_id: task_id.into(),
            root,
        }
    }

    /// Validate the whole tree. See [`ProgramNode::validate`].
    pub fn validate(&self) -> Result<(), MalformedReason> {
        self.root.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick_place(object: LibraryRef, location: LibraryRef) -> SequenceStep {
        SequenceStep::Pick {
            object,
            next: Some(Box::new(SequenceStep::Place { location })),
        }
    }

    #[test]
    fn full_chain_validates() {
        let chain = SequenceStep::Pick {
            object: LibraryRef::resolved(1, "cube"),
            next: Some(Box::new(SequenceStep::Processing {
                action: LibraryRef::resolved(2, "shake"),
                next: Some(Box::new(SequenceStep::Place {
                    location: LibraryRef::resolved(3, "bin"),
                })),
            })),
        };
        assert!(chain.validate_chain().is_ok());
    }

    #[test]
    fn pick_without_place_is_malformed() {
        let chain = SequenceStep::Pick {
            object: LibraryRef::resolved(1, "cube"),
            next: None,
        };
        assert_eq!(
            chain.validate_chain(),
            Err(MalformedReason::PickWithoutContinuation)
        );
    }

    #[test]
    fn processing_without_place_is_malformed() {
        let chain = SequenceStep::Pick {
            object: LibraryRef::resolved(1, "cube"),
            next: Some(Box::new(SequenceStep::Processing {
                action: LibraryRef::resolved(2, "shake"),
                next: None,
            })),
        };
        assert_eq!(
            chain.validate_chain(),
            Err(MalformedReason::ProcessingWithoutPlace)
        );
    }

    #[test]
    fn chain_rooted_at_place_is_malformed() {
        let chain = SequenceStep::Place {
            location: LibraryRef::resolved(3, "bin"),
        };
        assert_eq!(chain.validate_chain(), Err(MalformedReason::ChainRootNotPick));
    }

    #[test]
    fn unresolved_object_is_malformed() {
        let chain = pick_place(
            LibraryRef::unresolved("ghost"),
            LibraryRef::resolved(3, "bin"),
        );
        let program = Program::new(
            "t1",
            ProgramNode::Repeat {
                times: 2,
                body: chain,
            },
        );
        assert!(matches!(
            program.validate(),
            Err(MalformedReason::UnresolvedReference {
                kind: LibraryKind::Object,
                ..
            })
        ));
    }

    #[test]
    fn find_condition_requires_resolved_object() {
        let node = ProgramNode::When {
            condition: Condition::Find {
                object: LibraryRef::unresolved("ghost"),
            },
            body: pick_place(
                LibraryRef::resolved(1, "cube"),
                LibraryRef::resolved(3, "bin"),
            ),
        };
        assert!(node.validate().is_err());
    }

    #[test]
    fn program_tree_round_trips_through_json() {
        let program = Program::new(
            "t42",
            ProgramNode::WhenOtherwise {
                condition: Condition::Sensor,
                body: pick_place(
                    LibraryRef::resolved(1, "cube"),
                    LibraryRef::resolved(3, "bin"),
                ),
                otherwise: pick_place(
                    LibraryRef::resolved(4, "cylinder"),
                    LibraryRef::resolved(3, "bin"),
                ),
            },
        );
        let json = serde_json::to_string(&program).unwrap();
        let back: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(back, program);
    }
}
