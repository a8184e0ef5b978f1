//! Persisted shapes of the blob-store keys.
//!
//! Field names follow the key-value schema shared with the browser UI and
//! must not change.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::state::{
    competition::GameCompletion,
    records::{FinalizedTeamResult, GameRecord},
    sequencer::CompetitionPhase,
};

/// Ordered team names.
pub const TEAMS_KEY: &str = "teams";
/// Ordered marshal names.
pub const MARSHALS_KEY: &str = "marshals";
/// Game records in the order they were produced.
pub const GAME_DATA_KEY: &str = "gameData";
/// Last game-completed notification.
pub const GAME_COMPLETED_KEY: &str = "gameCompleted";
/// Opaque session token, stored as a raw string.
pub const AUTH_TOKEN_KEY: &str = "auth-token";
/// Role of the session, stored as a raw string.
pub const USER_ROLE_KEY: &str = "user-role";
/// Sequencer position.
pub const COMPETITION_KEY: &str = "competition";

/// Result of one team inside a persisted game record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamResultEntity {
    /// Elapsed seconds.
    pub time: u32,
    /// Always `true` for written entries.
    pub completed: bool,
}

/// Persisted game record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameRecordEntity {
    /// Catalog id of the game.
    pub id: String,
    /// Display name of the game.
    pub name: String,
    /// Results keyed by team name, in completion order.
    pub teams: IndexMap<String, TeamResultEntity>,
}

impl From<&GameRecord> for GameRecordEntity {
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
                        TeamResultEntity {
                            time: result.elapsed_seconds,
                            completed: true,
                        },
                    )
                })
                .collect(),
        }
    }
}

impl From<GameRecordEntity> for GameRecord {
    /// Entries not flagged as completed are treated as absent.
    fn from(entity: GameRecordEntity) -> Self {
        Self {
            game_id: entity.id,
            game_name: entity.name,
            results: entity
                .teams
                .into_iter()
                .filter(|(_, result)| result.completed)
                .map(|(team_name, result)| {
                    (
                        team_name.clone(),
                        FinalizedTeamResult {
                            team_name,
                            elapsed_seconds: result.time,
                            completed_at: None,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Last completed game, overwritten on each completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameCompletedEntity {
    /// Catalog id of the completed game.
    pub game_id: String,
    /// Display name of the completed game.
    pub game_name: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl GameCompletedEntity {
    /// Marker for `completion`, stamped with `timestamp` milliseconds.
    pub fn new(completion: &GameCompletion, timestamp: u64) -> Self {
        Self {
            game_id: completion.game_id.to_string(),
            game_name: completion.game_name.to_string(),
            timestamp,
        }
    }
}

/// Persisted sequencer status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionStatusEntity {
    /// Setup phase.
    NotStarted,
    /// A game is being played.
    Running,
    /// Every game is complete.
    Finished,
}

/// Persisted sequencer position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionEntity {
    /// Sequencer status.
    pub status: CompetitionStatusEntity,
    /// Current game while running, otherwise 0.
    #[serde(default)]
    pub game_index: usize,
}

impl From<CompetitionPhase> for CompetitionEntity {
    fn from(phase: CompetitionPhase) -> Self {
        match phase {
            CompetitionPhase::NotStarted => Self {
                status: CompetitionStatusEntity::NotStarted,
                game_index: 0,
            },
            CompetitionPhase::Running(game_index) => Self {
                status: CompetitionStatusEntity::Running,
                game_index,
            },
            CompetitionPhase::Finished => Self {
                status: CompetitionStatusEntity::Finished,
                game_index: 0,
            },
        }
    }
}

impl From<CompetitionEntity> for CompetitionPhase {
    fn from(entity: CompetitionEntity) -> Self {
        match entity.status {
            CompetitionStatusEntity::NotStarted => CompetitionPhase::NotStarted,
            CompetitionStatusEntity::Running => CompetitionPhase::Running(entity.game_index),
            CompetitionStatusEntity::Finished => CompetitionPhase::Finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::catalog::CATALOG;

    #[test]
    fn game_record_uses_shared_schema() {
        let mut record = GameRecord::new(&CATALOG[1]);
        record.insert_once(FinalizedTeamResult {
            team_name: "Alpha".into(),
            elapsed_seconds: 70,
            completed_at: None,
        });

        let json = serde_json::to_value(GameRecordEntity::from(&record)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "office-chair-race",
                "name": "Office Chair Race",
                "teams": {"Alpha": {"time": 70, "completed": true}}
            })
        );
    }

    #[test]
    fn incomplete_entries_are_skipped_on_load() {
        let entity: GameRecordEntity = serde_json::from_value(serde_json::json!({
            "id": "around-the-clock",
            "name": "Around the Clock",
            "teams": {
                "Alpha": {"time": 90, "completed": true},
                "Beta": {"time": 0, "completed": false}
            }
        }))
        .unwrap();
        let record = GameRecord::from(entity);
        assert_eq!(record.results.len(), 1);
        assert_eq!(record.result_for("Alpha").unwrap().elapsed_seconds, 90);
    }

    #[test]
    fn competition_status_shape() {
        let json = serde_json::to_value(CompetitionEntity::from(CompetitionPhase::Running(2))).unwrap();
        assert_eq!(json, serde_json::json!({"status": "running", "gameIndex": 2}));

        let phase: CompetitionPhase = serde_json::from_str::<CompetitionEntity>(
            r#"{"status":"not_started"}"#,
        )
        .unwrap()
        .into();
        assert_eq!(phase, CompetitionPhase::NotStarted);
    }

    #[test]
    fn game_completed_shape() {
        let completion = GameCompletion {
            game_index: 0,
            game_id: "house-of-cards",
            game_name: "House of Cards",
            total_games: 5,
        };
        let json = serde_json::to_value(GameCompletedEntity::new(&completion, 1_700_000_000_000)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "gameId": "house-of-cards",
                "gameName": "House of Cards",
                "timestamp": 1_700_000_000_000u64
            })
        );
    }
}
