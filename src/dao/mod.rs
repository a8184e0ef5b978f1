/// Key-value blob stores backing persistence.
pub mod blob_store;
/// Persisted shapes of the blob-store keys.
pub mod models;
/// Typed access to competition state in the blob store.
pub mod repository;
/// Backend-agnostic storage errors.
pub mod storage;
