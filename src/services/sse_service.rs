use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent, SystemStatus},
    state::SharedState,
};

const EVENT_HANDSHAKE: &str = "handshake";
const EVENT_SYSTEM_STATUS: &str = "system_status";

/// Subscribe to the notification stream and build the greeting sent to the
/// new client only.
pub async fn subscribe(state: &SharedState) -> (broadcast::Receiver<ServerEvent>, Option<ServerEvent>) {
    let receiver = state.events().subscribe();
    let handshake = Handshake {
        message: "notification stream connected".into(),
        degraded: state.is_degraded().await,
    };
    let greeting = match ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &handshake) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "failed to serialize SSE handshake");
            None
        }
    };
    (receiver, greeting)
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    greeting: Option<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if let Some(payload) = greeting {
            if tx.send(Ok(to_event(payload))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "SSE subscriber lagging; skipping messages");
                            continue;
                        }
                    }
                }
            }
        }

        info!("SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Forward degraded mode changes to every subscriber until the state is dropped.
pub fn spawn_status_broadcaster(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    tokio::spawn(async move {
        while watcher.changed().await.is_ok() {
            let degraded = *watcher.borrow_and_update();
            match ServerEvent::json(
                Some(EVENT_SYSTEM_STATUS.to_string()),
                &SystemStatus { degraded },
            ) {
                Ok(event) => state.events().broadcast(event),
                Err(err) => warn!(error = %err, "failed to serialize system status"),
            }
        }
    });
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::AppConfig, dao::blob_store::MemoryBlobStore, state::AppState};

    #[tokio::test]
    async fn greeting_reports_degraded_mode() {
        let state = AppState::new(&AppConfig::default());
        let (_receiver, greeting) = subscribe(&state).await;
        let greeting = greeting.unwrap();
        assert_eq!(greeting.event.as_deref(), Some("handshake"));
        let body: serde_json::Value = serde_json::from_str(&greeting.data).unwrap();
        assert_eq!(body["degraded"], true);
    }

    #[tokio::test]
    async fn status_changes_are_broadcast() {
        let state = AppState::new(&AppConfig::default());
        let mut receiver = state.events().subscribe();
        spawn_status_broadcaster(state.clone());

        state.install_store(Arc::new(MemoryBlobStore::new())).await;
        let event = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.event.as_deref(), Some("system_status"));
        assert_eq!(event.data, r#"{"degraded":false}"#);
    }
}
