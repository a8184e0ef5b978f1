use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{BoxFuture, ready};

use crate::dao::{blob_store::BlobStore, storage::StorageResult};

/// Process-local store; contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let value = self.entries.get(key).map(|entry| entry.value().clone());
        Box::pin(ready(Ok(value)))
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        self.entries.insert(key.to_string(), value);
        Box::pin(ready(Ok(())))
    }

    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        self.entries.remove(key);
        Box::pin(ready(Ok(())))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(ready(Ok(())))
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(ready(Ok(())))
    }
}

/// Memory store whose writes to selected keys fail, for exercising partial
/// write failures.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct FailingBlobStore {
    inner: MemoryBlobStore,
    failing: Arc<dashmap::DashSet<String>>,
}

#[cfg(test)]
impl FailingBlobStore {
    pub fn new(inner: MemoryBlobStore) -> Self {
        Self {
            inner,
            failing: Arc::default(),
        }
    }

    /// Make every later `set` or `remove` of `key` fail.
    pub fn fail_writes_to(&self, key: &str) {
        self.failing.insert(key.to_string());
    }

    fn refuse(&self, key: &str) -> Option<BoxFuture<'static, StorageResult<()>>> {
        self.failing.contains(key).then(|| {
            let err = crate::dao::storage::StorageError::unavailable(
                format!("write to `{key}` refused"),
                std::io::Error::other("injected failure"),
            );
            Box::pin(ready(Err(err))) as BoxFuture<'static, StorageResult<()>>
        })
    }
}

#[cfg(test)]
impl BlobStore for FailingBlobStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        self.refuse(key).unwrap_or_else(|| self.inner.set(key, value))
    }

    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        self.refuse(key).unwrap_or_else(|| self.inner.remove(key))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.health_check()
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.try_reconnect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove() {
        let store = MemoryBlobStore::new();
        assert_eq!(store.get("teams").await.unwrap(), None);

        store.set("teams", "[\"Alpha\"]".into()).await.unwrap();
        assert_eq!(
            store.get("teams").await.unwrap().as_deref(),
            Some("[\"Alpha\"]")
        );

        store.remove("teams").await.unwrap();
        assert_eq!(store.get("teams").await.unwrap(), None);
    }
}
