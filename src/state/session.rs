//! Working state of the game currently being played.

use std::time::SystemTime;

use indexmap::IndexMap;
use thiserror::Error;

use crate::state::{
    catalog::GameDefinition,
    records::{FinalizedTeamResult, GameRecord},
    scoring::{RawInputPatch, RawTeamInput, ScoringError, compute_elapsed_seconds},
};

/// Rejections raised by session operations. None of them alter the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The team is not part of the roster.
    #[error("team `{0}` is not registered")]
    UnknownTeam(String),
    /// The team is finalized; its inputs are frozen.
    #[error("team `{0}` has already completed this game")]
    TeamCompleted(String),
    /// The raw input cannot be scored yet.
    #[error("cannot finalize team `{team}`: {source}")]
    Invalid {
        /// Team whose input was rejected.
        team: String,
        /// Why the input cannot be scored.
        #[source]
        source: ScoringError,
    },
}

/// Outcome of finalizing a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finalization {
    /// A new result was written to the game record.
    Recorded(FinalizedTeamResult),
    /// The team was already finalized; the stored result is returned unchanged.
    AlreadyCompleted(FinalizedTeamResult),
}

impl Finalization {
    /// Result stored for the team in either case.
    pub fn result(&self) -> &FinalizedTeamResult {
        match self {
            Finalization::Recorded(result) | Finalization::AlreadyCompleted(result) => result,
        }
    }
}

/// Raw inputs of every team for one game, in registration order.
#[derive(Debug, Clone)]
pub struct GameSession {
    game_index: usize,
    definition: &'static GameDefinition,
    inputs: IndexMap<String, RawTeamInput>,
}

impl GameSession {
    /// Open a session with fresh, unset inputs for every team.
    pub fn new(game_index: usize, definition: &'static GameDefinition, teams: &[String]) -> Self {
        let inputs = teams
            .iter()
            .map(|team| (team.clone(), RawTeamInput::default()))
            .collect();
        Self {
            game_index,
            definition,
            inputs,
        }
    }

    /// Reopen a session after a restart: teams already present in the record
    /// are marked completed, every other input starts fresh.
    pub fn resume(
        game_index: usize,
        definition: &'static GameDefinition,
        teams: &[String],
        record: Option<&GameRecord>,
    ) -> Self {
        let mut session = Self::new(game_index, definition, teams);
        if let Some(record) = record {
            for (team, input) in session.inputs.iter_mut() {
                input.completed = record.result_for(team).is_some();
            }
        }
        session
    }

    /// Catalog index of the game.
    pub fn game_index(&self) -> usize {
        self.game_index
    }

    /// Definition of the game.
    pub fn definition(&self) -> &'static GameDefinition {
        self.definition
    }

    /// Raw inputs keyed by team name.
    pub fn inputs(&self) -> &IndexMap<String, RawTeamInput> {
        &self.inputs
    }

    /// Update the raw input of a team that has not completed yet.
    pub fn update(
        &mut self,
        team: &str,
        patch: RawInputPatch,
    ) -> Result<&RawTeamInput, SessionError> {
        let input = self
            .inputs
            .get_mut(team)
            .ok_or_else(|| SessionError::UnknownTeam(team.to_string()))?;
        if input.completed {
            return Err(SessionError::TeamCompleted(team.to_string()));
        }
        input.apply(patch);
        Ok(input)
    }

    /// Elapsed time the current input would produce, `None` while it is invalid.
    pub fn preview(&self, team: &str) -> Option<u32> {
        let input = self.inputs.get(team)?;
        compute_elapsed_seconds(self.definition, input).ok()
    }

    /// Validate and score a team, writing the result into `record`.
    ///
    /// Finalizing a completed team is a no-op returning the stored result.
    pub fn finalize(
        &mut self,
        team: &str,
        record: &mut GameRecord,
        now: SystemTime,
    ) -> Result<Finalization, SessionError> {
        debug_assert_eq!(record.game_id, self.definition.id);

        let input = self
            .inputs
            .get_mut(team)
            .ok_or_else(|| SessionError::UnknownTeam(team.to_string()))?;

        if input.completed {
            if let Some(existing) = record.result_for(team) {
                return Ok(Finalization::AlreadyCompleted(existing.clone()));
            }
        }

        let elapsed_seconds =
            compute_elapsed_seconds(self.definition, input).map_err(|source| {
                SessionError::Invalid {
                    team: team.to_string(),
                    source,
                }
            })?;

        let stored = record
            .insert_once(FinalizedTeamResult {
                team_name: team.to_string(),
                elapsed_seconds,
                completed_at: Some(now),
            })
            .clone();
        input.completed = true;

        Ok(Finalization::Recorded(stored))
    }

    /// Number of finalized teams.
    pub fn completed_count(&self) -> usize {
        self.inputs.values().filter(|input| input.completed).count()
    }

    /// Number of teams in the session.
    pub fn team_count(&self) -> usize {
        self.inputs.len()
    }

    /// Whether every team has been finalized.
    pub fn is_fully_complete(&self) -> bool {
        self.completed_count() == self.team_count()
    }
}
