//! Errors of the CouchDB blob store.
//!
//! Each blob key lives in its own `blob::<key>` document of the configured
//! database, so per-key failures name that document id.

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias for the CouchDB blob store.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures talking to CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// `COUCH_BASE_URL` or another required variable is not set.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The database holding the blob documents could not be reached.
    #[error("failed to query CouchDB database `{database}`")]
    DatabaseQuery {
        database: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to create CouchDB database `{database}`")]
    DatabaseCreate {
        database: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("CouchDB database `{database}` answered with status {status}")]
    DatabaseStatus {
        database: String,
        status: StatusCode,
    },
    /// A read, write or delete of a blob document could not be sent.
    #[error("failed to reach blob document `{document}`")]
    RequestSend {
        document: String,
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB refused a blob document operation, e.g. a revision conflict.
    #[error("blob document `{document}` answered with status {status}")]
    RequestStatus { document: String, status: StatusCode },
    /// The blob document body is not the expected `{_id, _rev, value}` shape.
    #[error("failed to decode blob document `{document}`")]
    DecodeResponse {
        document: String,
        #[source]
        source: reqwest::Error,
    },
}
