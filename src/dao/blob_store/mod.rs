#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::storage::StorageResult;

pub use memory::MemoryBlobStore;
#[cfg(test)]
pub use memory::FailingBlobStore;

/// Key-value persistence collaborator holding raw string blobs.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>>;
    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
