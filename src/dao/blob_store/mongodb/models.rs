use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};

/// One key of the blob store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoBlobDocument {
    #[serde(rename = "_id")]
    pub key: String,
    pub value: String,
}

pub fn key_filter(key: &str) -> Document {
    doc! { "_id": key }
}
