//! Request boundary.
//!
//! One [`ProgramExecutor::execute`] call is one execution request: validate
//! the tree, resolve its references, connect one session, dispatch, and
//! always disconnect. Taxonomy outcomes come back as a [`RunReport`];
//! unexpected lower-level faults propagate as [`ExecError`] for the caller
//! to map to a generic failure.

use chrono::Utc;

use blockpick_config::ExecutionConfig;
use blockpick_core::{LibraryLookup, Program, RunOutcome, RunReport};
use blockpick_driver::{ChannelProvider, RobotSession};
use blockpick_vision::FrameSource;

use crate::error::ExecError;
use crate::interpreter::{resolve_program, Interpreter, NodeOutcome};

/// One execution request.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub program: Program,
    /// Out-of-band boolean standing in for Sensor/Human conditions.
    pub acknowledge: bool,
}

impl ExecutionRequest {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            acknowledge: false,
        }
    }

    pub fn with_acknowledge(mut self, acknowledge: bool) -> Self {
        self.acknowledge = acknowledge;
        self
    }
}

/// Executes programs against one robot. Requests are served strictly one at
/// a time: a controller handle cannot be shared between sessions.
pub struct ProgramExecutor<C, F, L> {
    provider: C,
    frames: F,
    library: L,
    config: ExecutionConfig,
}

impl<C, F, L> ProgramExecutor<C, F, L>
where
    C: ChannelProvider,
    F: FrameSource,
    L: LibraryLookup,
{
    pub fn new(provider: C, frames: F, library: L, config: ExecutionConfig) -> Self {
        Self {
            provider,
            frames,
            library,
            config,
        }
    }

    pub fn provider(&self) -> &C {
        &self.provider
    }

    pub fn frames(&self) -> &F {
        &self.frames
    }

    /// Execute one request to completion.
    pub async fn execute(&mut self, request: &ExecutionRequest) -> Result<RunReport, ExecError> {
        let started = Utc::now();
        let task_id = request.program.task_id.clone();
        tracing::info!(task_id = %task_id, "execution started");

        // Malformed trees abort before any hardware interaction.
        if let Err(reason) = request.program.validate() {
            tracing::warn!(task_id = %task_id, %reason, "program rejected");
            return Ok(RunReport::new(task_id, RunOutcome::MalformedProgram, started)
                .with_detail(reason.to_string()));
        }
        let node = match resolve_program(&self.library, &request.program).await {
            Ok(node) => node,
            Err(err) => {
                tracing::warn!(task_id = %task_id, error = %err, "reference resolution failed");
                return Ok(RunReport::new(task_id, RunOutcome::MalformedProgram, started)
                    .with_detail(err.to_string()));
            }
        };

        let ring = self.config.calibration.ring()?;
        let endpoint = self.config.robot.endpoint();
        let mut session = match RobotSession::connect(&self.provider, &endpoint).await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(task_id = %task_id, error = %err, "connect failed");
                return Ok(RunReport::new(task_id, RunOutcome::ConnectionFailed, started)
                    .with_detail(err.to_string()));
            }
        };

        let mut interpreter = Interpreter {
            session: &mut session,
            frames: &mut self.frames,
            calibration: &self.config.calibration,
            ring,
            matcher: &self.config.matcher,
            gripper: &self.config.gripper,
            acknowledge: request.acknowledge,
            searches: 0,
            placements: 0,
        };
        let dispatched = interpreter.run(&node).await;
        let searches = interpreter.searches;
        let placements = interpreter.placements;

        // Resource safety outranks fast failure: the arm is released before
        // any error propagates.
        let closed = session.disconnect().await;
        let outcome = dispatched?;
        closed?;

        let outcome = match outcome {
            NodeOutcome::Completed => RunOutcome::Success,
            NodeOutcome::ObjectNotFound => RunOutcome::ObjectNotFound,
            NodeOutcome::ConditionNotMet => RunOutcome::ConditionNotMet,
        };
        tracing::info!(task_id = %task_id, ?outcome, searches, placements, "execution finished");
        Ok(RunReport::new(task_id, outcome, started).with_counts(searches, placements))
    }
}
