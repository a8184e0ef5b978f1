use serde::Serialize;
use utoipa::ToSchema;

use crate::state::sequencer::{CompetitionPhase, Snapshot};

/// Competition phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// Setup: rosters are editable.
    NotStarted,
    /// A game is being played.
    Running,
    /// Every game is complete.
    Finished,
}

impl From<CompetitionPhase> for VisiblePhase {
    fn from(value: CompetitionPhase) -> Self {
        match value {
            CompetitionPhase::NotStarted => VisiblePhase::NotStarted,
            CompetitionPhase::Running(_) => VisiblePhase::Running,
            CompetitionPhase::Finished => VisiblePhase::Finished,
        }
    }
}

/// Sequencer position returned by the competition endpoints.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSnapshot {
    pub phase: VisiblePhase,
    /// Catalog index of the running game.
    pub game_index: Option<usize>,
    /// Number of applied transitions since start-up.
    pub version: usize,
}

impl From<Snapshot> for PhaseSnapshot {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            phase: snapshot.phase.into(),
            game_index: snapshot.phase.game_index(),
            version: snapshot.version,
        }
    }
}
