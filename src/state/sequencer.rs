use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// Progression of the competition through the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompetitionPhase {
    /// Setup: rosters can be edited, no game is open.
    NotStarted,
    /// The game at the given catalog index is being played.
    Running(usize),
    /// Every game has been completed. Terminal until reset.
    Finished,
}

impl CompetitionPhase {
    /// Index of the game being played, if any.
    pub fn game_index(&self) -> Option<usize> {
        match self {
            CompetitionPhase::Running(index) => Some(*index),
            _ => None,
        }
    }
}

/// Operator actions driving the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerEvent {
    /// Rules confirmed; open the first game.
    Start,
    /// Move past a fully completed game.
    Advance,
    /// Return to setup, discarding progress.
    Reset,
}

/// Facts about the competition the guards of a transition depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionContext {
    /// Number of games in the catalog.
    pub total_games: usize,
    /// Team and marshal rosters are both non-empty.
    pub rosters_ready: bool,
    /// Completed and total team counts of the current game session.
    pub current_progress: Option<(usize, usize)>,
}

/// Why a transition guard refused the event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Event not valid from the current phase.
    #[error("{event:?} cannot be applied while {from:?}")]
    InvalidTransition {
        /// Phase when the event was received.
        from: CompetitionPhase,
        /// Rejected event.
        event: SequencerEvent,
    },
    /// Start requires at least one team and one marshal.
    #[error("at least one team and one marshal are required")]
    RosterIncomplete,
    /// Advance requires every team to have completed the current game.
    #[error("game is not complete ({completed}/{total} teams)")]
    GameIncomplete {
        /// Teams finalized so far.
        completed: usize,
        /// Teams in the session.
        total: usize,
    },
}

/// Errors that can occur when planning a sequencer transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    #[error("a transition is already pending")]
    AlreadyPending,
    /// A guard refused the event.
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// No transition is currently pending.
    #[error("no transition is pending")]
    NoPending,
    /// Plan ID does not match the pending plan.
    #[error("plan {got} does not match pending plan {expected}")]
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// Phase changed since the plan was created.
    #[error("phase changed from {expected:?} to {actual:?}")]
    PhaseMismatch {
        /// Phase when plan was created.
        expected: CompetitionPhase,
        /// Current phase.
        actual: CompetitionPhase,
    },
    /// Version changed since the plan was created.
    #[error("version changed (expected {expected}, found {actual})")]
    VersionMismatch {
        /// Version the plan was built against, plus one.
        expected: usize,
        /// Current version plus one.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortError {
    /// No transition is currently pending.
    #[error("no transition is pending")]
    NoPending,
    /// Plan ID does not match the pending plan.
    #[error("plan {got} does not match pending plan {expected}")]
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned transition.
pub type PlanId = Uuid;

/// A validated transition that has not been applied yet.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the sequencer is currently in.
    pub from: CompetitionPhase,
    /// Phase the sequencer will move to.
    pub to: CompetitionPhase,
    /// Event that triggered this transition.
    pub event: SequencerEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// When the plan was created.
    pub pending_since: Instant,
}

/// Point-in-time view of the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: CompetitionPhase,
    /// Incremented on every applied transition.
    pub version: usize,
    /// Target phase of the pending plan, if any.
    pub pending: Option<CompetitionPhase>,
}

/// Drives the competition `NotStarted -> Running(0..n) -> Finished`.
///
/// Games are never skipped or reordered: `Running(i)` only ever moves to
/// `Running(i + 1)` or, from the last game, to `Finished`.
#[derive(Debug, Clone)]
pub struct Sequencer {
    phase: CompetitionPhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self {
            phase: CompetitionPhase::NotStarted,
            version: 0,
            pending: None,
        }
    }
}

impl Sequencer {
    /// Create a sequencer in the setup phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a sequencer at a persisted phase.
    pub fn restored(phase: CompetitionPhase) -> Self {
        Self {
            phase,
            ..Self::default()
        }
    }

    /// Current phase.
    pub fn phase(&self) -> CompetitionPhase {
        self.phase
    }

    /// Current version.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Create a snapshot of the sequencer.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Validate an event against the current phase and guards.
    /// Returns a plan that must later be applied or aborted.
    pub fn plan(
        &mut self,
        event: SequencerEvent,
        ctx: TransitionContext,
    ) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self.compute_transition(event, ctx)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition and return the new phase.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<CompetitionPhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;

        Ok(self.phase)
    }

    /// Drop a pending plan without changing the phase.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    fn compute_transition(
        &self,
        event: SequencerEvent,
        ctx: TransitionContext,
    ) -> Result<CompetitionPhase, Rejection> {
        let next = match (self.phase, event) {
            (CompetitionPhase::NotStarted, SequencerEvent::Start) => {
                if !ctx.rosters_ready || ctx.total_games == 0 {
                    return Err(Rejection::RosterIncomplete);
                }
                CompetitionPhase::Running(0)
            }
            (CompetitionPhase::Running(index), SequencerEvent::Advance) => {
                let (completed, total) = ctx.current_progress.unwrap_or((0, 0));
                if ctx.current_progress.is_none() || completed < total {
                    return Err(Rejection::GameIncomplete { completed, total });
                }
                if index + 1 >= ctx.total_games {
                    CompetitionPhase::Finished
                } else {
                    CompetitionPhase::Running(index + 1)
                }
            }
            (CompetitionPhase::Running(_) | CompetitionPhase::Finished, SequencerEvent::Reset) => {
                CompetitionPhase::NotStarted
            }
            (from, event) => return Err(Rejection::InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
