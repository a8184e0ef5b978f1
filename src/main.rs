//! Office Olympics backend entrypoint wiring REST, SSE and the storage supervisor.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use office_olympics_back::{
    config::AppConfig,
    dao::{blob_store::BlobStore, blob_store::MemoryBlobStore, storage::StorageError},
    routes,
    services::{sse_service, storage_supervisor},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(&config);
    sse_service::spawn_status_broadcaster(app_state.clone());

    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "memory".into());
    spawn_storage(app_state.clone(), backend.trim())?;

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start the storage supervisor for the selected backend.
fn spawn_storage(state: SharedState, backend: &str) -> anyhow::Result<()> {
    info!(backend, "selecting storage backend");
    match backend {
        "memory" => {
            let store: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
            tokio::spawn(storage_supervisor::run(state, move || {
                let store = store.clone();
                async move { Ok::<_, StorageError>(store) }
            }));
        }
        #[cfg(feature = "couch-store")]
        "couchdb" => {
            use office_olympics_back::dao::blob_store::couchdb::{CouchBlobStore, CouchConfig};

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = CouchConfig::from_env()?;
                let store = CouchBlobStore::connect(config).await?;
                Ok::<Arc<dyn BlobStore>, StorageError>(Arc::new(store))
            }));
        }
        #[cfg(feature = "mongo-store")]
        "mongodb" => {
            use office_olympics_back::dao::blob_store::mongodb::{MongoBlobStore, MongoConfig};

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await?;
                let store = MongoBlobStore::connect(config).await?;
                Ok::<Arc<dyn BlobStore>, StorageError>(Arc::new(store))
            }));
        }
        other => bail!("unsupported STORAGE_BACKEND `{other}`"),
    }
    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
