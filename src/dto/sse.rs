use std::time::SystemTime;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::{competition::GameRecordDto, timestamp_ms},
    state::events::CompetitionNotification,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Wrap a competition notification in the `{type, data, timestamp}` envelope,
    /// named after its type.
    pub fn notification(notification: &CompetitionNotification) -> serde_json::Result<Self> {
        let kind = notification.kind();
        let data = match notification {
            CompetitionNotification::CompetitionStarted { teams, total_games } => {
                serde_json::to_value(CompetitionStartedEvent {
                    teams: teams.clone(),
                    total_games: *total_games,
                })?
            }
            CompetitionNotification::GameUpdate { game_index, record } => {
                serde_json::to_value(GameUpdateEvent {
                    game_index: game_index + 1,
                    record: record.into(),
                })?
            }
            CompetitionNotification::GameCompleted(completion) => {
                serde_json::to_value(GameCompletedEvent {
                    game_id: completion.game_id.to_string(),
                    game_name: completion.game_name.to_string(),
                    game_index: completion.game_index + 1,
                    total_games: completion.total_games,
                })?
            }
            CompetitionNotification::CompetitionFinished { total_games } => {
                serde_json::to_value(CompetitionFinishedEvent {
                    total_games: *total_games,
                })?
            }
        };

        let envelope = NotificationEnvelope {
            kind: kind.to_string(),
            data,
            timestamp: timestamp_ms(SystemTime::now()),
        };
        Self::json(Some(kind.to_string()), &envelope)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Wire envelope shared by every competition notification.
pub struct NotificationEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Data of `COMPETITION_STARTED`.
pub struct CompetitionStartedEvent {
    pub teams: Vec<String>,
    pub total_games: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Data of `GAME_UPDATE`: the record of the game after a finalization.
pub struct GameUpdateEvent {
    /// 1-based position of the game in play order.
    pub game_index: usize,
    #[serde(flatten)]
    pub record: GameRecordDto,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Data of `GAME_COMPLETED`.
pub struct GameCompletedEvent {
    pub game_id: String,
    pub game_name: String,
    /// 1-based position of the game in play order.
    pub game_index: usize,
    pub total_games: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Data of `COMPETITION_FINISHED`.
pub struct CompetitionFinishedEvent {
    pub total_games: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{catalog::CATALOG, records::GameRecord};

    #[test]
    fn game_update_flattens_record() {
        let record = GameRecord::new(&CATALOG[0]);
        let event = ServerEvent::notification(&CompetitionNotification::GameUpdate {
            game_index: 0,
            record,
        })
        .unwrap();
        let body: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(body["type"], "GAME_UPDATE");
        assert_eq!(body["data"]["gameIndex"], 1);
        assert_eq!(body["data"]["id"], "house-of-cards");
        assert!(body["data"]["teams"].is_object());
    }

    #[test]
    fn started_lists_teams() {
        let event = ServerEvent::notification(&CompetitionNotification::CompetitionStarted {
            teams: vec!["Alpha".into(), "Beta".into()],
            total_games: 5,
        })
        .unwrap();
        assert_eq!(event.event.as_deref(), Some("COMPETITION_STARTED"));
        let body: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(body["data"]["teams"], serde_json::json!(["Alpha", "Beta"]));
        assert_eq!(body["data"]["totalGames"], 5);
    }
}
