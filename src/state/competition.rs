//! Single source of truth for one competition: roster, progression, results
//! recorded so far and the session of the game being played.

use std::time::SystemTime;

use thiserror::Error;
use tracing::warn;

use crate::state::{
    catalog::{self, GameDefinition},
    records::GameRecord,
    roster::{Roster, RosterError, RosterKind},
    scoring::{RawInputPatch, RawTeamInput},
    sequencer::{
        AbortError, ApplyError, CompetitionPhase, Plan, PlanError, PlanId, Sequencer,
        SequencerEvent, Snapshot, TransitionContext,
    },
    session::{Finalization, GameSession, SessionError},
};

/// Rejections raised by competition operations. The state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompetitionError {
    /// Roster edit rejected.
    #[error(transparent)]
    Roster(#[from] RosterError),
    /// Rosters are frozen once the competition has started.
    #[error("rosters cannot change once the competition has started")]
    RosterLocked,
    /// Session operation rejected.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// No game is being played.
    #[error("no game is currently running")]
    NotRunning,
    /// Transition could not be planned.
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// Planned transition could not be applied.
    #[error("failed to apply transition: {0}")]
    Apply(#[from] ApplyError),
    /// Planned transition could not be aborted.
    #[error("failed to abort transition: {0}")]
    Abort(#[from] AbortError),
}

/// A game that just became fully complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameCompletion {
    /// Catalog index of the game.
    pub game_index: usize,
    /// Stable id of the game.
    pub game_id: &'static str,
    /// Display name of the game.
    pub game_name: &'static str,
    /// Number of games in the competition.
    pub total_games: usize,
}

/// What a finalize call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeOutcome {
    /// Result stored for the team.
    pub finalization: Finalization,
    /// Record of the current game after the call.
    pub record: GameRecord,
    /// Set when this call completed the last outstanding team.
    pub completion: Option<GameCompletion>,
}

/// Roster, sequencer, recorded games and current session.
#[derive(Debug, Clone, Default)]
pub struct CompetitionState {
    roster: Roster,
    sequencer: Sequencer,
    records: Vec<GameRecord>,
    session: Option<GameSession>,
}

impl CompetitionState {
    /// Fresh competition in the setup phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the state from persisted parts.
    ///
    /// Results for unregistered teams are dropped and an out-of-range game
    /// index is treated as a finished competition, so the restored state
    /// always satisfies the record invariants.
    pub fn restore(roster: Roster, phase: CompetitionPhase, mut records: Vec<GameRecord>) -> Self {
        for record in records.iter_mut() {
            record.results.retain(|team, _| {
                let known = roster.team_position(team).is_some();
                if !known {
                    warn!(
                        game_id = %record.game_id,
                        team = %team,
                        "dropping stored result of unregistered team"
                    );
                }
                known
            });
        }

        let phase = match phase {
            CompetitionPhase::Running(index) if index >= catalog::total_games() => {
                warn!(index, "stored game index is out of range; marking competition finished");
                CompetitionPhase::Finished
            }
            other => other,
        };

        let session = match phase {
            CompetitionPhase::Running(index) => catalog::game_at(index).map(|definition| {
                let record = records.iter().find(|record| record.game_id == definition.id);
                GameSession::resume(index, definition, roster.teams(), record)
            }),
            _ => None,
        };

        Self {
            roster,
            sequencer: Sequencer::restored(phase),
            records,
            session,
        }
    }

    /// Registered teams and marshals.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Current competition phase.
    pub fn phase(&self) -> CompetitionPhase {
        self.sequencer.phase()
    }

    /// Sequencer snapshot including any pending plan.
    pub fn snapshot(&self) -> Snapshot {
        self.sequencer.snapshot()
    }

    /// Game records in the order they were produced.
    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    /// Record of a game by id.
    pub fn record(&self, game_id: &str) -> Option<&GameRecord> {
        self.records.iter().find(|record| record.game_id == game_id)
    }

    /// Session of the game being played.
    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Definition of the game being played.
    pub fn current_game(&self) -> Option<&'static GameDefinition> {
        self.session.as_ref().map(GameSession::definition)
    }

    /// Replace both rosters during setup.
    pub fn replace_roster(&mut self, roster: Roster) -> Result<(), CompetitionError> {
        self.ensure_setup()?;
        self.roster = roster;
        Ok(())
    }

    /// Register a team or marshal during setup. Returns the trimmed name.
    pub fn add_to_roster(
        &mut self,
        kind: RosterKind,
        name: &str,
    ) -> Result<String, CompetitionError> {
        self.ensure_setup()?;
        Ok(self.roster.add(kind, name)?)
    }

    /// Unregister a team or marshal during setup.
    pub fn remove_from_roster(
        &mut self,
        kind: RosterKind,
        name: &str,
    ) -> Result<(), CompetitionError> {
        self.ensure_setup()?;
        Ok(self.roster.remove(kind, name)?)
    }

    /// Update the raw input of a team in the current game.
    pub fn update_input(
        &mut self,
        team: &str,
        patch: RawInputPatch,
    ) -> Result<RawTeamInput, CompetitionError> {
        let session = self.session.as_mut().ok_or(CompetitionError::NotRunning)?;
        Ok(session.update(team, patch)?.clone())
    }

    /// Finalize a team in the current game.
    ///
    /// The game record is created on the first completion of the game and
    /// extended afterwards.
    pub fn finalize(
        &mut self,
        team: &str,
        now: SystemTime,
    ) -> Result<FinalizeOutcome, CompetitionError> {
        let session = self.session.as_mut().ok_or(CompetitionError::NotRunning)?;
        let definition = session.definition();

        let position = self
            .records
            .iter()
            .position(|record| record.game_id == definition.id);
        let mut record = match position {
            Some(index) => self.records[index].clone(),
            None => GameRecord::new(definition),
        };

        let was_complete = session.is_fully_complete();
        let finalization = session.finalize(team, &mut record, now)?;

        match position {
            Some(index) => self.records[index] = record.clone(),
            None => self.records.push(record.clone()),
        }

        let completion = (!was_complete && session.is_fully_complete()).then(|| GameCompletion {
            game_index: session.game_index(),
            game_id: definition.id,
            game_name: definition.name,
            total_games: catalog::total_games(),
        });

        Ok(FinalizeOutcome {
            finalization,
            record,
            completion,
        })
    }

    /// Guard inputs for the next transition.
    pub fn transition_context(&self) -> TransitionContext {
        TransitionContext {
            total_games: catalog::total_games(),
            rosters_ready: self.roster.is_ready(),
            current_progress: self
                .session
                .as_ref()
                .map(|session| (session.completed_count(), session.team_count())),
        }
    }

    /// Plan a sequencer transition against the current state.
    pub fn plan(&mut self, event: SequencerEvent) -> Result<Plan, CompetitionError> {
        let ctx = self.transition_context();
        Ok(self.sequencer.plan(event, ctx)?)
    }

    /// Apply a planned transition and open or close the game session accordingly.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<CompetitionPhase, CompetitionError> {
        let previous = self.sequencer.phase();
        let next = self.sequencer.apply(plan_id)?;

        match next {
            CompetitionPhase::NotStarted => {
                self.records.clear();
                self.session = None;
            }
            CompetitionPhase::Running(index) => {
                if previous == CompetitionPhase::NotStarted {
                    self.records.clear();
                }
                self.session = catalog::game_at(index)
                    .map(|definition| GameSession::new(index, definition, self.roster.teams()));
            }
            CompetitionPhase::Finished => {
                self.session = None;
            }
        }

        Ok(next)
    }

    /// Drop a planned transition.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), CompetitionError> {
        Ok(self.sequencer.abort(plan_id)?)
    }

    /// Plan and apply a transition in one step.
    pub fn transition(
        &mut self,
        event: SequencerEvent,
    ) -> Result<CompetitionPhase, CompetitionError> {
        let plan = self.plan(event)?;
        self.apply(plan.id)
    }

    fn ensure_setup(&self) -> Result<(), CompetitionError> {
        if self.sequencer.phase() == CompetitionPhase::NotStarted {
            Ok(())
        } else {
            Err(CompetitionError::RosterLocked)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{records::FinalizedTeamResult, sequencer::Rejection};

    fn ready_state() -> CompetitionState {
        let roster = Roster::from_names(
            ["Alpha", "Beta", "Gamma"].map(String::from),
            ["Sam"].map(String::from),
        )
        .unwrap();
        let mut state = CompetitionState::new();
        state.replace_roster(roster).unwrap();
        state
    }

    fn place(state: &mut CompetitionState, team: &str, position: u8) {
        state
            .update_input(
                team,
                RawInputPatch {
                    position: Some(Some(position)),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    fn time(state: &mut CompetitionState, team: &str, minutes: u32, seconds: u32) {
        state
            .update_input(
                team,
                RawInputPatch {
                    minutes: Some(minutes),
                    seconds: Some(seconds),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    fn complete_current_game(state: &mut CompetitionState) {
        let teams = state.roster().teams().to_vec();
        let position_based = state
            .current_game()
            .unwrap()
            .scoring
            .ranked_places()
            .is_some();
        for (index, team) in teams.iter().enumerate() {
            if position_based {
                place(state, team, (index % 3) as u8 + 1);
            } else {
                time(state, team, 1, index as u32);
            }
            state.finalize(team, SystemTime::UNIX_EPOCH).unwrap();
        }
    }

    #[test]
    fn start_opens_first_game_with_fresh_inputs() {
        let mut state = ready_state();
        assert_eq!(
            state.transition(SequencerEvent::Start),
            Ok(CompetitionPhase::Running(0))
        );
        let session = state.session().unwrap();
        assert_eq!(session.definition().id, "house-of-cards");
        assert_eq!(session.completed_count(), 0);
        assert!(state.records().is_empty());
    }

    #[test]
    fn roster_is_locked_after_start() {
        let mut state = ready_state();
        state.transition(SequencerEvent::Start).unwrap();
        assert_eq!(
            state.add_to_roster(RosterKind::Teams, "Delta"),
            Err(CompetitionError::RosterLocked)
        );
        assert_eq!(
            state.remove_from_roster(RosterKind::Marshals, "Sam"),
            Err(CompetitionError::RosterLocked)
        );
    }

    #[test]
    fn start_requires_teams_and_marshals() {
        let mut state = CompetitionState::new();
        state.add_to_roster(RosterKind::Teams, "Alpha").unwrap();
        assert_eq!(
            state.transition(SequencerEvent::Start),
            Err(CompetitionError::Plan(PlanError::Rejected(
                Rejection::RosterIncomplete
            )))
        );
    }

    #[test]
    fn record_is_created_on_first_completion_and_extended() {
        let mut state = ready_state();
        state.transition(SequencerEvent::Start).unwrap();

        place(&mut state, "Alpha", 1);
        state.finalize("Alpha", SystemTime::UNIX_EPOCH).unwrap();
        assert_eq!(state.records().len(), 1);

        place(&mut state, "Beta", 2);
        let outcome = state.finalize("Beta", SystemTime::UNIX_EPOCH).unwrap();
        assert_eq!(state.records().len(), 1);
        assert_eq!(outcome.record.results.len(), 2);
        assert!(outcome.completion.is_none());
    }

    #[test]
    fn completion_is_reported_once() {
        let mut state = ready_state();
        state.transition(SequencerEvent::Start).unwrap();
        place(&mut state, "Alpha", 1);
        place(&mut state, "Beta", 2);
        place(&mut state, "Gamma", 3);
        state.finalize("Alpha", SystemTime::UNIX_EPOCH).unwrap();
        state.finalize("Beta", SystemTime::UNIX_EPOCH).unwrap();

        let last = state.finalize("Gamma", SystemTime::UNIX_EPOCH).unwrap();
        assert_eq!(
            last.completion,
            Some(GameCompletion {
                game_index: 0,
                game_id: "house-of-cards",
                game_name: "House of Cards",
                total_games: 5,
            })
        );

        let again = state.finalize("Gamma", SystemTime::UNIX_EPOCH).unwrap();
        assert!(matches!(again.finalization, Finalization::AlreadyCompleted(_)));
        assert!(again.completion.is_none());
    }

    #[test]
    fn advance_rejected_on_partial_completion() {
        let mut state = ready_state();
        state.transition(SequencerEvent::Start).unwrap();
        place(&mut state, "Alpha", 1);
        state.finalize("Alpha", SystemTime::UNIX_EPOCH).unwrap();

        assert_eq!(
            state.transition(SequencerEvent::Advance),
            Err(CompetitionError::Plan(PlanError::Rejected(
                Rejection::GameIncomplete {
                    completed: 1,
                    total: 3
                }
            )))
        );
        assert_eq!(state.phase(), CompetitionPhase::Running(0));
    }

    #[test]
    fn advance_resets_raw_inputs_for_next_game() {
        let mut state = ready_state();
        state.transition(SequencerEvent::Start).unwrap();
        complete_current_game(&mut state);

        assert_eq!(
            state.transition(SequencerEvent::Advance),
            Ok(CompetitionPhase::Running(1))
        );
        let session = state.session().unwrap();
        assert_eq!(session.definition().id, "office-chair-race");
        assert!(
            session
                .inputs()
                .values()
                .all(|input| *input == RawTeamInput::default())
        );
    }

    #[test]
    fn full_run_finishes_after_last_game() {
        let mut state = ready_state();
        state.transition(SequencerEvent::Start).unwrap();
        for _ in 0..catalog::total_games() {
            complete_current_game(&mut state);
            state.transition(SequencerEvent::Advance).unwrap();
        }
        assert_eq!(state.phase(), CompetitionPhase::Finished);
        assert!(state.session().is_none());
        assert_eq!(state.records().len(), 5);
        assert!(matches!(
            state.update_input("Alpha", RawInputPatch::default()),
            Err(CompetitionError::NotRunning)
        ));
    }

    #[test]
    fn reset_clears_records_and_unlocks_roster() {
        let mut state = ready_state();
        state.transition(SequencerEvent::Start).unwrap();
        complete_current_game(&mut state);

        assert_eq!(
            state.transition(SequencerEvent::Reset),
            Ok(CompetitionPhase::NotStarted)
        );
        assert!(state.records().is_empty());
        assert!(state.session().is_none());
        assert!(state.add_to_roster(RosterKind::Teams, "Delta").is_ok());
    }

    #[test]
    fn restore_resumes_session_and_drops_unknown_teams() {
        let roster = Roster::from_names(
            ["Alpha", "Beta"].map(String::from),
            ["Sam"].map(String::from),
        )
        .unwrap();
        let mut record = GameRecord::new(&catalog::CATALOG[0]);
        for (team, seconds) in [("Alpha", 60), ("Ghost", 75)] {
            record.insert_once(FinalizedTeamResult {
                team_name: team.into(),
                elapsed_seconds: seconds,
                completed_at: None,
            });
        }

        let state = CompetitionState::restore(roster, CompetitionPhase::Running(0), vec![record]);
        assert_eq!(state.records()[0].results.len(), 1);
        let session = state.session().unwrap();
        assert_eq!(session.completed_count(), 1);
        assert!(session.inputs()["Alpha"].completed);
    }

    #[test]
    fn restore_clamps_out_of_range_index() {
        let state = CompetitionState::restore(
            Roster::default(),
            CompetitionPhase::Running(42),
            Vec::new(),
        );
        assert_eq!(state.phase(), CompetitionPhase::Finished);
        assert!(state.session().is_none());
    }
}
