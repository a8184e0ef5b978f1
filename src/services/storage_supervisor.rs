use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{blob_store::BlobStore, repository::CompetitionRepository, storage::StorageError},
    error::ServiceError,
    services::auth_service,
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the storage backend, restore the persisted competition once, then
/// keep the shared state in degraded mode whenever the backend is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn BlobStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;
    let mut restored = false;

    loop {
        match connect().await {
            Ok(store) => {
                if !restored {
                    match restore(&state, store.clone()).await {
                        Ok(()) => restored = true,
                        Err(err) => {
                            warn!(error = %err, "failed to restore persisted competition; retrying");
                            sleep(delay).await;
                            delay = (delay * 2).min(MAX_DELAY);
                            continue;
                        }
                    }
                }

                state.install_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                watch_health(&state, store).await;

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Load the persisted competition and session marker into memory.
pub async fn restore(state: &SharedState, store: Arc<dyn BlobStore>) -> Result<(), ServiceError> {
    let repository = CompetitionRepository::new(store);
    let competition = repository.load_state().await?;
    info!(
        teams = competition.roster().teams().len(),
        games_recorded = competition.records().len(),
        phase = ?competition.phase(),
        "restored competition from storage"
    );
    state.replace_competition(competition).await;
    auth_service::restore_session(state, &repository).await
}

/// Poll the backend until it fails and cannot be reconnected in place.
async fn watch_health(state: &SharedState, store: Arc<dyn BlobStore>) {
    loop {
        if let Err(err) = store.health_check().await {
            warn!(error = %err, "storage health check failed; entering degraded mode");
            state.clear_store().await;

            let mut reconnect_delay = INITIAL_DELAY;
            let mut reconnected = false;
            for attempt in 0..MAX_RECONNECT_ATTEMPTS {
                match store.try_reconnect().await {
                    Ok(()) => {
                        info!(attempt, "storage reconnection succeeded");
                        reconnected = true;
                        break;
                    }
                    Err(reconnect_err) => {
                        warn!(attempt, error = %reconnect_err, "storage reconnect attempt failed");
                        sleep(reconnect_delay).await;
                        reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
                    }
                }
            }

            if !reconnected {
                warn!("exhausted storage reconnect attempts; staying in degraded mode");
                return;
            }
            state.install_store(store.clone()).await;
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::blob_store::MemoryBlobStore,
        state::{AppState, sequencer::CompetitionPhase},
    };

    #[tokio::test]
    async fn restore_loads_competition_and_session() {
        let store = MemoryBlobStore::new();
        store.set("teams", r#"["Alpha","Beta"]"#.into()).await.unwrap();
        store.set("marshals", r#"["Sam"]"#.into()).await.unwrap();
        store
            .set("competition", r#"{"status":"running","gameIndex":1}"#.into())
            .await
            .unwrap();
        store
            .set(
                "gameData",
                r#"[{"id":"house-of-cards","name":"House of Cards","teams":{"Alpha":{"time":60,"completed":true},"Beta":{"time":75,"completed":true}}}]"#
                    .into(),
            )
            .await
            .unwrap();
        store.set("auth-token", "tok".into()).await.unwrap();
        store.set("user-role", "admin".into()).await.unwrap();

        let state = AppState::new(&AppConfig::default());
        restore(&state, Arc::new(store)).await.unwrap();

        assert_eq!(state.phase().await, CompetitionPhase::Running(1));
        let (teams, recorded) = state
            .read_competition(|c| (c.roster().teams().to_vec(), c.records().len()))
            .await;
        assert_eq!(teams, vec!["Alpha", "Beta"]);
        assert_eq!(recorded, 1);
        assert!(auth_service::role_for(&state, "tok").is_some());
    }

    #[tokio::test]
    async fn malformed_blobs_restore_as_defaults() {
        let store = MemoryBlobStore::new();
        store.set("teams", "not json".into()).await.unwrap();
        store.set("gameData", "{".into()).await.unwrap();

        let state = AppState::new(&AppConfig::default());
        restore(&state, Arc::new(store)).await.unwrap();
        assert_eq!(state.phase().await, CompetitionPhase::NotStarted);
        assert!(state.read_competition(|c| c.roster().teams().is_empty()).await);
    }
}
