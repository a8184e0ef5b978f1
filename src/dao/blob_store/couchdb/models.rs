use serde::{Deserialize, Serialize};

const BLOB_PREFIX: &str = "blob::";

/// One key of the blob store, stored as its own document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchBlobDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub value: String,
}

/// Minimal view of a document used to look up its revision.
#[derive(Debug, Deserialize)]
pub struct CouchRevision {
    #[serde(rename = "_rev")]
    pub rev: String,
}

pub fn blob_doc_id(key: &str) -> String {
    format!("{BLOB_PREFIX}{key}")
}
