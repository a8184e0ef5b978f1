use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{Client, Collection, Database, bson::doc};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoBlobDocument, key_filter},
};
use crate::dao::{blob_store::BlobStore, storage::StorageResult};

const BLOB_COLLECTION_NAME: &str = "blobs";

/// Blob store keeping one MongoDB document per key.
#[derive(Clone)]
pub struct MongoBlobStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoBlobStore {
    /// Establish a connection to MongoDB.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        Ok(Self { inner })
    }

    async fn collection(&self) -> Collection<MongoBlobDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoBlobDocument>(BLOB_COLLECTION_NAME)
    }

    async fn load(&self, key: String) -> MongoResult<Option<String>> {
        let document = self
            .collection()
            .await
            .find_one(key_filter(&key))
            .await
            .map_err(|source| MongoDaoError::LoadBlob { key, source })?;
        Ok(document.map(|document| document.value))
    }

    async fn save(&self, key: String, value: String) -> MongoResult<()> {
        let document = MongoBlobDocument {
            key: key.clone(),
            value,
        };
        self.collection()
            .await
            .replace_one(key_filter(&key), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveBlob { key, source })?;
        Ok(())
    }

    async fn delete(&self, key: String) -> MongoResult<()> {
        self.collection()
            .await
            .delete_one(key_filter(&key))
            .await
            .map_err(|source| MongoDaoError::RemoveBlob { key, source })?;
        Ok(())
    }
}

impl BlobStore for MongoBlobStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        let key = key.to_string();
        Box::pin(async move { store.load(key).await.map_err(Into::into) })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = key.to_string();
        Box::pin(async move { store.save(key, value).await.map_err(Into::into) })
    }

    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = key.to_string();
        Box::pin(async move { store.delete(key).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.reconnect().await.map_err(Into::into) })
    }
}
