use super::error::{CouchDaoError, CouchResult};

/// Database used when `COUCH_DB` is not set.
const DEFAULT_DATABASE: &str = "office_olympics";

/// Where the CouchDB blob store keeps its `blob::<key>` documents.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    pub base_url: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CouchConfig {
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            username: None,
            password: None,
        }
    }

    /// Use basic auth for every request.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Read `COUCH_BASE_URL` plus the optional `COUCH_DB`, `COUCH_USERNAME`
    /// and `COUCH_PASSWORD`. Credentials are only used when both are set.
    pub fn from_env() -> CouchResult<Self> {
        let base_url =
            std::env::var("COUCH_BASE_URL").map_err(|_| CouchDaoError::MissingEnvVar {
                var: "COUCH_BASE_URL",
            })?;
        let database = std::env::var("COUCH_DB")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let config = Self::new(base_url, database);
        Ok(
            match (std::env::var("COUCH_USERNAME"), std::env::var("COUCH_PASSWORD")) {
                (Ok(username), Ok(password)) => config.with_credentials(username, password),
                _ => config,
            },
        )
    }
}
