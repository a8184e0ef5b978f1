//! Competition lifecycle notifications and the broadcast hub that fans them
//! out to observers.

use tokio::sync::broadcast;
use tracing::warn;

use crate::{
    dto::sse::ServerEvent,
    state::{competition::GameCompletion, records::GameRecord},
};

/// Lifecycle notification published to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompetitionNotification {
    /// Rules were accepted and the first game opened.
    CompetitionStarted {
        /// Registered teams.
        teams: Vec<String>,
        /// Number of games to play.
        total_games: usize,
    },
    /// A team was finalized; carries the updated record of the game.
    GameUpdate {
        /// Catalog index of the game.
        game_index: usize,
        /// Record after the finalization.
        record: GameRecord,
    },
    /// Every team finished the game.
    GameCompleted(GameCompletion),
    /// The last game was completed and the competition closed.
    CompetitionFinished {
        /// Number of games played.
        total_games: usize,
    },
}

impl CompetitionNotification {
    /// Wire name of the notification type.
    pub fn kind(&self) -> &'static str {
        match self {
            CompetitionNotification::CompetitionStarted { .. } => "COMPETITION_STARTED",
            CompetitionNotification::GameUpdate { .. } => "GAME_UPDATE",
            CompetitionNotification::GameCompleted(_) => "GAME_COMPLETED",
            CompetitionNotification::CompetitionFinished { .. } => "COMPETITION_FINISHED",
        }
    }
}

/// Best-effort sink for notifications. Delivery is never acknowledged.
pub trait EventPublisher: Send + Sync {
    /// Publish a notification to every current subscriber.
    fn publish(&self, notification: &CompetitionNotification);
}

/// Broadcast hub backing the SSE stream.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

impl EventPublisher for SseHub {
    fn publish(&self, notification: &CompetitionNotification) {
        match ServerEvent::notification(notification) {
            Ok(event) => self.broadcast(event),
            Err(err) => warn!(
                kind = notification.kind(),
                error = %err,
                "failed to serialize notification"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::catalog::CATALOG;

    #[test]
    fn publish_without_subscribers_is_silent() {
        let hub = SseHub::new(4);
        hub.publish(&CompetitionNotification::CompetitionFinished { total_games: 5 });
    }

    #[test]
    fn subscribers_receive_named_events() {
        let hub = SseHub::new(4);
        let mut receiver = hub.subscribe();

        hub.publish(&CompetitionNotification::GameCompleted(GameCompletion {
            game_index: 1,
            game_id: CATALOG[1].id,
            game_name: CATALOG[1].name,
            total_games: 5,
        }));

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some("GAME_COMPLETED"));
        let body: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(body["type"], "GAME_COMPLETED");
        assert_eq!(body["data"]["gameId"], "office-chair-race");
        assert_eq!(body["data"]["gameIndex"], 2);
        assert_eq!(body["data"]["totalGames"], 5);
        assert!(body["timestamp"].as_u64().is_some());
    }
}
