use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report storage availability, pinging the backend when one is installed.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.blob_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
                return HealthResponse::from(true);
            }
        }
        None => warn!("storage unavailable (degraded mode)"),
    }

    HealthResponse::from(state.is_degraded().await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::blob_store::MemoryBlobStore,
        dto::health::HealthStatus,
        state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_until_store_installed() {
        let state = AppState::new(&AppConfig::default());
        assert_eq!(health_status(&state).await.status, HealthStatus::Degraded);

        state.install_store(Arc::new(MemoryBlobStore::new())).await;
        assert_eq!(health_status(&state).await.status, HealthStatus::Ok);
    }
}
