//! Business logic powering the admin REST routes. These helpers coordinate
//! storage persistence, in-memory state updates and sequencer transitions
//! while honouring the single-writer requirement.

use std::time::SystemTime;

use tracing::{debug, info};

use crate::{
    dao::repository::CompletionMarker,
    dto::{
        admin::{RosterRequest, RosterResponse, StartCompetitionRequest, TeamInputPatch},
        competition::{FinalizeResponse, SessionSnapshot, TeamInputView},
        phase::PhaseSnapshot,
        timestamp_ms,
    },
    error::ServiceError,
    state::{
        SharedState, catalog,
        competition::{CompetitionError, FinalizeOutcome},
        events::CompetitionNotification,
        roster::{Roster, RosterKind},
        sequencer::SequencerEvent,
        session::Finalization,
        transitions::run_transition_with_broadcast,
    },
};

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// Current rosters.
pub async fn get_roster(state: &SharedState) -> RosterResponse {
    state
        .read_competition(|competition| RosterResponse::from(competition.roster()))
        .await
}

/// Replace both rosters while the competition has not started.
pub async fn replace_roster(
    state: &SharedState,
    request: RosterRequest,
) -> Result<RosterResponse, ServiceError> {
    let roster = Roster::from_names(request.teams, request.marshals)
        .map_err(CompetitionError::from)?;
    let repository = state.require_repository().await?;

    let saved = state
        .update_competition(
            move |competition| {
                competition.replace_roster(roster)?;
                Ok(competition.roster().clone())
            },
            |_, roster| async move {
                repository.save_roster(&roster).await.map_err(ServiceError::from)
            },
        )
        .await?;

    info!(
        teams = saved.teams().len(),
        marshals = saved.marshals().len(),
        "rosters replaced"
    );
    Ok(RosterResponse::from(&saved))
}

/// Register a team or marshal.
pub async fn add_member(
    state: &SharedState,
    kind: RosterKind,
    name: &str,
) -> Result<RosterResponse, ServiceError> {
    let repository = state.require_repository().await?;

    let (stored, roster) = state
        .update_competition(
            |competition| {
                let stored = competition.add_to_roster(kind, name)?;
                Ok((stored, competition.roster().clone()))
            },
            |_, (_, roster)| async move {
                repository.save_roster(&roster).await.map_err(ServiceError::from)
            },
        )
        .await?;

    info!(%kind, name = %stored, "roster entry added");
    Ok(RosterResponse::from(&roster))
}

/// Unregister a team or marshal.
pub async fn remove_member(
    state: &SharedState,
    kind: RosterKind,
    name: &str,
) -> Result<RosterResponse, ServiceError> {
    let repository = state.require_repository().await?;

    let roster = state
        .update_competition(
            |competition| {
                competition.remove_from_roster(kind, name)?;
                Ok(competition.roster().clone())
            },
            |_, roster| async move {
                repository.save_roster(&roster).await.map_err(ServiceError::from)
            },
        )
        .await?;

    info!(%kind, name, "roster entry removed");
    Ok(RosterResponse::from(&roster))
}

// ---------------------------------------------------------------------------
// Sequencing
// ---------------------------------------------------------------------------

/// Current sequencer position.
pub async fn phase_snapshot(state: &SharedState) -> PhaseSnapshot {
    state.snapshot().await.into()
}

/// Confirm the rules and open the first game. Previous results are discarded.
pub async fn start_competition(
    state: &SharedState,
    request: StartCompetitionRequest,
) -> Result<PhaseSnapshot, ServiceError> {
    if !request.rules_accepted {
        return Err(ServiceError::InvalidInput(
            "the competition rules must be accepted before starting".into(),
        ));
    }
    let repository = state.require_repository().await?;

    let (_, next) = run_transition_with_broadcast(state, SequencerEvent::Start, |projected| async move {
        repository
            .save_progress(projected.records(), CompletionMarker::Clear, projected.phase())
            .await
            .map_err(ServiceError::from)
    })
    .await?;

    info!(phase = ?next, "competition started");
    Ok(phase_snapshot(state).await)
}

/// Move past the current game once every team has completed it.
pub async fn advance_competition(state: &SharedState) -> Result<PhaseSnapshot, ServiceError> {
    let repository = state.require_repository().await?;

    let (_, next) =
        run_transition_with_broadcast(state, SequencerEvent::Advance, |projected| async move {
            repository
                .save_phase(projected.phase())
                .await
                .map_err(ServiceError::from)
        })
        .await?;

    info!(phase = ?next, "competition advanced");
    Ok(phase_snapshot(state).await)
}

/// Return to setup, clearing every recorded result. Rosters are kept.
pub async fn reset_competition(state: &SharedState) -> Result<PhaseSnapshot, ServiceError> {
    let repository = state.require_repository().await?;

    let (_, next) =
        run_transition_with_broadcast(state, SequencerEvent::Reset, |projected| async move {
            repository
                .save_progress(projected.records(), CompletionMarker::Clear, projected.phase())
                .await
                .map_err(ServiceError::from)
        })
        .await?;

    info!(phase = ?next, "competition reset");
    Ok(phase_snapshot(state).await)
}

// ---------------------------------------------------------------------------
// Game operation
// ---------------------------------------------------------------------------

/// Working inputs of the game being played.
pub async fn session_snapshot(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    state
        .read_competition(|competition| {
            competition
                .session()
                .map(|session| SessionSnapshot::new(session, catalog::total_games()))
        })
        .await
        .ok_or_else(|| ServiceError::from(CompetitionError::NotRunning))
}

/// Apply a partial update to a team's raw input. Inputs live in memory only.
pub async fn update_team_input(
    state: &SharedState,
    team: &str,
    patch: TeamInputPatch,
) -> Result<TeamInputView, ServiceError> {
    let (input, preview) = state
        .update_competition(
            |competition| {
                let input = competition.update_input(team, patch.into())?;
                let preview = competition
                    .session()
                    .and_then(|session| session.preview(team));
                Ok((input, preview))
            },
            |_, _| async { Ok(()) },
        )
        .await?;

    debug!(team, preview = ?preview, "team input updated");
    Ok(TeamInputView::new(team, &input, preview))
}

/// Finalize a team in the current game.
///
/// The game record is persisted before it becomes visible. A repeated call
/// returns the stored result without writing or notifying.
pub async fn finalize_team(
    state: &SharedState,
    team: &str,
) -> Result<FinalizeResponse, ServiceError> {
    let repository = state.repository().await;
    let now = SystemTime::now();

    let (outcome, completed_count, game_complete) = state
        .update_competition(
            |competition| {
                let outcome = competition.finalize(team, now)?;
                let (completed, complete) = competition
                    .session()
                    .map(|session| (session.completed_count(), session.is_fully_complete()))
                    .unwrap_or_default();
                Ok((outcome, completed, complete))
            },
            |draft, (outcome, _, _)| async move {
                if matches!(outcome.finalization, Finalization::AlreadyCompleted(_)) {
                    return Ok(());
                }
                let repository = repository.ok_or(ServiceError::Degraded)?;
                let marker = match &outcome.completion {
                    Some(completion) => CompletionMarker::Set {
                        completion,
                        timestamp_ms: timestamp_ms(now),
                    },
                    None => CompletionMarker::Keep,
                };
                repository
                    .save_progress(draft.records(), marker, draft.phase())
                    .await
                    .map_err(ServiceError::from)
            },
        )
        .await?;

    publish_finalization(state, &outcome);
    Ok(FinalizeResponse::new(&outcome, completed_count, game_complete))
}

fn publish_finalization(state: &SharedState, outcome: &FinalizeOutcome) {
    let Finalization::Recorded(result) = &outcome.finalization else {
        debug!("team already finalized; nothing to publish");
        return;
    };

    info!(
        team = %result.team_name,
        game_id = %outcome.record.game_id,
        elapsed_seconds = result.elapsed_seconds,
        "team finalized"
    );

    let game_index = catalog::find_game(&outcome.record.game_id)
        .map(|(index, _)| index)
        .unwrap_or_default();
    state.publish(&CompetitionNotification::GameUpdate {
        game_index,
        record: outcome.record.clone(),
    });

    if let Some(completion) = &outcome.completion {
        info!(game_id = completion.game_id, "game completed by every team");
        state.publish(&CompetitionNotification::GameCompleted(completion.clone()));
    }
}
