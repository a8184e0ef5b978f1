//! Views of the catalog and of the game being played.

use indexmap::IndexMap;
use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::{
    dto::format_system_time,
    state::{
        catalog::{GameDefinition, ScoringKind},
        competition::FinalizeOutcome,
        records::GameRecord,
        scoring::RawTeamInput,
        session::{Finalization, GameSession},
    },
};

/// Catalog entry as shown to operators and observers.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameDefinitionDto {
    pub id: String,
    pub name: String,
    pub description: String,
    /// `position-based` or `manual-time`.
    pub scoring: String,
    /// Advisory limit, never enforced.
    pub max_minutes: u32,
    /// Seconds for 1st, 2nd and 3rd place.
    pub position_times: Option<Vec<u32>>,
    pub bonus_seconds: Option<u32>,
    /// Seconds added per infraction.
    pub penalty_seconds: Option<u32>,
}

impl From<&GameDefinition> for GameDefinitionDto {
    fn from(game: &GameDefinition) -> Self {
        let (position_times, bonus_seconds, penalty_seconds) = match game.scoring {
            ScoringKind::PositionBased {
                table,
                bonus_seconds,
            } => (Some(table.times().to_vec()), Some(bonus_seconds), None),
            ScoringKind::ManualTime { penalty_seconds } => (None, None, penalty_seconds),
        };
        Self {
            id: game.id.to_string(),
            name: game.name.to_string(),
            description: game.description.to_string(),
            scoring: game.scoring.label().to_string(),
            max_minutes: game.max_minutes,
            position_times,
            bonus_seconds,
            penalty_seconds,
        }
    }
}

/// Raw input of one team with the time it would currently score.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamInputView {
    pub team: String,
    pub minutes: u32,
    pub seconds: u32,
    pub penalties: u32,
    pub bonus: bool,
    pub position: Option<u8>,
    pub confirmed_zero: bool,
    pub completed: bool,
    /// `null` while the input cannot be scored.
    pub preview_seconds: Option<u32>,
}

impl TeamInputView {
    pub fn new(team: &str, input: &RawTeamInput, preview_seconds: Option<u32>) -> Self {
        Self {
            team: team.to_string(),
            minutes: input.minutes,
            seconds: input.seconds,
            penalties: input.penalties,
            bonus: input.bonus,
            position: input.position,
            confirmed_zero: input.confirmed_zero,
            completed: input.completed,
            preview_seconds,
        }
    }
}

/// The game being played and every team's working input.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// 0-based catalog index.
    pub game_index: usize,
    pub total_games: usize,
    pub game: GameDefinitionDto,
    pub teams: Vec<TeamInputView>,
    pub completed_count: usize,
    pub fully_complete: bool,
}

impl SessionSnapshot {
    pub fn new(session: &GameSession, total_games: usize) -> Self {
        let teams = session
            .inputs()
            .iter()
            .map(|(team, input)| TeamInputView::new(team, input, session.preview(team)))
            .collect();
        Self {
            game_index: session.game_index(),
            total_games,
            game: session.definition().into(),
            teams,
            completed_count: session.completed_count(),
            fully_complete: session.is_fully_complete(),
        }
    }
}

/// Outcome of finalizing a team.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResponse {
    pub team: String,
    pub elapsed_seconds: u32,
    /// RFC 3339 time of the first finalization, when known.
    pub completed_at: Option<String>,
    /// The team had already been finalized; nothing changed.
    pub already_completed: bool,
    pub completed_count: usize,
    pub game_complete: bool,
}

impl FinalizeResponse {
    pub fn new(outcome: &FinalizeOutcome, completed_count: usize, game_complete: bool) -> Self {
        let result = outcome.finalization.result();
        Self {
            team: result.team_name.clone(),
            elapsed_seconds: result.elapsed_seconds,
            completed_at: result.completed_at.map(format_system_time),
            already_completed: matches!(
                outcome.finalization,
                Finalization::AlreadyCompleted(_)
            ),
            completed_count,
            game_complete,
        }
    }
}

/// Per-team entry of a game record, in the shared storage shape.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamResultDto {
    pub time: u32,
    pub completed: bool,
}

/// Game record in the shared storage shape.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameRecordDto {
    pub id: String,
    pub name: String,
    pub teams: IndexMap<String, TeamResultDto>,
}

impl From<&GameRecord> for GameRecordDto {
    fn from(record: &GameRecord) -> Self {
        Self {
            id: record.game_id.clone(),
            name: record.game_name.clone(),
            teams: record
                .results
                .values()
                .map(|result| {
                    (
                        result.team_name.clone(),
                        TeamResultDto {
                            time: result.elapsed_seconds,
                            completed: true,
                        },
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::catalog::CATALOG;

    #[test]
    fn catalog_entry_exposes_scoring_parameters() {
        let house = serde_json::to_value(GameDefinitionDto::from(&CATALOG[0])).unwrap();
        assert_eq!(house["scoring"], "position-based");
        assert_eq!(house["positionTimes"], serde_json::json!([60, 75, 90]));
        assert_eq!(house["bonusSeconds"], 15);
        assert!(house.get("penaltySeconds").is_none());

        let race = serde_json::to_value(GameDefinitionDto::from(&CATALOG[1])).unwrap();
        assert_eq!(race["penaltySeconds"], 5);
        assert_eq!(race["maxMinutes"], 10);
    }

    #[test]
    fn session_preview_is_null_while_invalid() {
        let teams = vec!["Alpha".to_string()];
        let session = GameSession::new(0, &CATALOG[0], &teams);
        let json = serde_json::to_value(SessionSnapshot::new(&session, 5)).unwrap();
        assert_eq!(json["teams"][0]["team"], "Alpha");
        assert!(json["teams"][0]["previewSeconds"].is_null());
        assert_eq!(json["completedCount"], 0);
    }
}
