//! Program interpreter.
//!
//! Dispatches over the closed node kind set of a resolved program tree.
//! Every control node shares the same prologue — move to the home pose,
//! open the gripper — and drives Pick → [Processing] → Place cycles, each
//! with its own object search.

use blockpick_core::{
    ActionSpec, Condition, LibraryError, LibraryLookup, LocationSpec, MalformedReason, ObjectSpec,
    Pose, Program, ProgramNode, SequenceStep, Speed,
};
use blockpick_driver::{PrimaryChannel, RobotSession, SecondaryChannel};
use blockpick_vision::{FrameSource, MatcherConfig};
use thiserror::Error;

use blockpick_config::{CalibrationConfig, GripperConfig};

use crate::error::ExecError;
use crate::search::{search_object, SearchContext, SearchCursor, RING_SIZE};

/// Why reference resolution rejected a program. Both cases surface as
/// `MalformedProgram`: the tree cannot be executed as written.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Malformed(#[from] MalformedReason),

    #[error(transparent)]
    Library(#[from] LibraryError),
}

/// A chain with every library reference resolved to its record payload.
#[derive(Debug, Clone)]
pub struct ResolvedChain {
    pub object: ObjectSpec,
    pub action: Option<ActionSpec>,
    pub location: LocationSpec,
}

/// A condition with its Find object resolved.
#[derive(Debug, Clone)]
pub enum ResolvedCondition {
    Sensor,
    Human,
    Find(ObjectSpec),
}

/// A program node ready for dispatch.
#[derive(Debug, Clone)]
pub enum ResolvedNode {
    Sequence {
        chain: ResolvedChain,
    },
    Repeat {
        times: u32,
        chain: ResolvedChain,
    },
    Loop {
        chain: ResolvedChain,
    },
    When {
        condition: ResolvedCondition,
        chain: ResolvedChain,
    },
    WhenOtherwise {
        condition: ResolvedCondition,
        chain: ResolvedChain,
        otherwise: ResolvedChain,
    },
}

/// Resolve every library reference in a program against the library.
///
/// Runs after structural validation and before any hardware interaction.
pub async fn resolve_program(
    library: &dyn LibraryLookup,
    program: &Program,
) -> Result<ResolvedNode, ResolveError> {
    match &program.root {
        ProgramNode::Sequence { chain } => Ok(ResolvedNode::Sequence {
            chain: resolve_chain(library, chain).await?,
        }),
        ProgramNode::Repeat { times, body } => Ok(ResolvedNode::Repeat {
            times: *times,
            chain: resolve_chain(library, body).await?,
        }),
        ProgramNode::Loop { body } => Ok(ResolvedNode::Loop {
            chain: resolve_chain(library, body).await?,
        }),
        ProgramNode::When { condition, body } => Ok(ResolvedNode::When {
            condition: resolve_condition(library, condition).await?,
            chain: resolve_chain(library, body).await?,
        }),
        ProgramNode::WhenOtherwise {
            condition,
            body,
            otherwise,
        } => Ok(ResolvedNode::WhenOtherwise {
            condition: resolve_condition(library, condition).await?,
            chain: resolve_chain(library, body).await?,
            otherwise: resolve_chain(library, otherwise).await?,
        }),
    }
}

async fn resolve_chain(
    library: &dyn LibraryLookup,
    chain: &SequenceStep,
) -> Result<ResolvedChain, ResolveError> {
    chain.validate_chain()?;

    let SequenceStep::Pick { object, next } = chain else {
        return Err(MalformedReason::ChainRootNotPick.into());
    };
    let object = library.object(object).await?;

    let mut step = next
        .as_deref()
        .ok_or(MalformedReason::PickWithoutContinuation)?;

    let mut action = None;
    if let SequenceStep::Processing {
        action: reference,
        next,
    } = step
    {
        action = Some(library.action(reference).await?);
        step = next
            .as_deref()
            .ok_or(MalformedReason::ProcessingWithoutPlace)?;
    }

    let SequenceStep::Place { location } = step else {
        return Err(MalformedReason::ProcessingWithoutPlace.into());
    };
    let location = library.location(location).await?;

    Ok(ResolvedChain {
        object,
        action,
        location,
    })
}

async fn resolve_condition(
    library: &dyn LibraryLookup,
    condition: &Condition,
) -> Result<ResolvedCondition, ResolveError> {
    match condition {
        Condition::Sensor => Ok(ResolvedCondition::Sensor),
        Condition::Human => Ok(ResolvedCondition::Human),
        Condition::Find { object } => Ok(ResolvedCondition::Find(library.object(object).await?)),
    }
}

/// Terminal result of one node dispatch, before mapping to the outcome
/// taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeOutcome {
    Completed,
    ObjectNotFound,
    ConditionNotMet,
}

/// One dispatch over one live session.
pub(crate) struct Interpreter<'a, P, S, F>
where
    P: PrimaryChannel,
    S: SecondaryChannel,
    F: FrameSource + ?Sized,
{
    pub session: &'a mut RobotSession<P, S>,
    pub frames: &'a mut F,
    pub calibration: &'a CalibrationConfig,
    pub ring: [Pose; RING_SIZE],
    pub matcher: &'a MatcherConfig,
    pub gripper: &'a GripperConfig,
    /// Externally supplied flag standing in for Sensor/Human conditions.
    pub acknowledge: bool,
    pub searches: u32,
    pub placements: u32,
}

impl<P, S, F> Interpreter<'_, P, S, F>
where
    P: PrimaryChannel,
    S: SecondaryChannel,
    F: FrameSource + ?Sized,
{
    pub async fn run(&mut self, node: &ResolvedNode) -> Result<NodeOutcome, ExecError> {
        // Shared prologue: home pose, gripper released.
        self.session.move_pose(&self.ring[0], Speed::Full).await?;
        self.open_gripper().await?;

        match node {
            ResolvedNode::Sequence { chain } => self.run_bounded(chain, 1).await,
            ResolvedNode::Repeat { times, chain } => self.run_bounded(chain, *times).await,
            ResolvedNode::Loop { chain } => {
                // Open-ended by design: only a failed search ends the loop.
                let mut cursor = SearchCursor::default();
                loop {
                    let (found, next) = self.run_cycle(chain, cursor).await?;
                    if !found {
                        return Ok(NodeOutcome::ObjectNotFound);
                    }
                    cursor = next;
                }
            }
            ResolvedNode::When { condition, chain } => {
                if !self.eval_condition(condition).await? {
                    tracing::info!("condition not met, no otherwise branch");
                    return Ok(NodeOutcome::ConditionNotMet);
                }
                self.run_bounded(chain, 1).await
            }
            ResolvedNode::WhenOtherwise {
                condition,
                chain,
                otherwise,
            } => {
                if self.eval_condition(condition).await? {
                    self.run_bounded(chain, 1).await
                } else {
                    tracing::info!("condition not met, running otherwise branch");
                    self.run_bounded(otherwise, 1).await
                }
            }
        }
    }

    /// Execute the chain `times` times, aborting on the first failed
    /// search. Placements from completed iterations stand.
    async fn run_bounded(
        &mut self,
        chain: &ResolvedChain,
        times: u32,
    ) -> Result<NodeOutcome, ExecError> {
        let mut cursor = SearchCursor::default();
        for iteration in 0..times {
            let (found, next) = self.run_cycle(chain, cursor).await?;
            if !found {
                tracing::info!(iteration, "search failed, aborting repetition");
                return Ok(NodeOutcome::ObjectNotFound);
            }
            cursor = next;
        }
        Ok(NodeOutcome::Completed)
    }

    /// One full Pick → [Processing] → Place cycle.
    async fn run_cycle(
        &mut self,
        chain: &ResolvedChain,
        cursor: SearchCursor,
    ) -> Result<(bool, SearchCursor), ExecError> {
        let outcome = self.search(&chain.object, cursor).await?;
        if !outcome.found {
            return Ok((false, cursor));
        }

        // Lift the gripped object back to the camera working height before
        // traveling.
        self.session
            .update_z(self.calibration.calibration_height_mm, Speed::Half)
            .await?;

        if let Some(action) = &chain.action {
            for point in action.playback_points() {
                self.session.move_pose(point, Speed::Full).await?;
            }
        }

        self.session
            .move_pose(&chain.location.pose, Speed::Full)
            .await?;
        self.open_gripper().await?;
        self.placements += 1;
        tracing::info!(location = %chain.location.reference.name, "object placed");

        Ok((true, outcome.cursor))
    }

    async fn eval_condition(&mut self, condition: &ResolvedCondition) -> Result<bool, ExecError> {
        match condition {
            ResolvedCondition::Sensor | ResolvedCondition::Human => Ok(self.acknowledge),
            ResolvedCondition::Find(object) => {
                // Independent presence check; the body's own pick search
                // runs separately even for the same object.
                let outcome = self.search(object, SearchCursor::default()).await?;
                Ok(outcome.found)
            }
        }
    }

    async fn search(
        &mut self,
        object: &ObjectSpec,
        cursor: SearchCursor,
    ) -> Result<crate::search::SearchOutcome, ExecError> {
        self.searches += 1;
        let geometry = self.calibration.geometry();
        let ctx = SearchContext {
            calibration: &geometry,
            ring: &self.ring,
            matcher: self.matcher,
            gripper: self.gripper,
        };
        search_object(&mut *self.session, &mut *self.frames, &ctx, object, cursor).await
    }

    async fn open_gripper(&mut self) -> Result<(), ExecError> {
        self.session
            .open_gripper(self.gripper.open_width_mm, self.gripper.open_speed)
            .await?;
        Ok(())
    }
}
