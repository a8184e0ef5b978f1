//! Application-level configuration loading: login accounts and event channel sizing.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{Account, Role};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "OFFICE_OLYMPICS_CONFIG_PATH";
/// Capacity of the notification broadcast channel when not configured.
const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    accounts: Vec<Account>,
    event_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        accounts = app_config.accounts.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document. Missing fields take their default values.
    pub fn parse(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Accounts accepted by the login endpoint.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Capacity of the notification broadcast channel.
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            accounts: default_accounts(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    accounts: Option<Vec<Account>>,
    #[serde(default)]
    event_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let accounts = match value.accounts {
            Some(accounts) if !accounts.is_empty() => accounts,
            _ => default_accounts(),
        };
        Self {
            accounts,
            event_capacity: value
                .event_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(DEFAULT_EVENT_CAPACITY),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Single admin login used when no account is configured.
fn default_accounts() -> Vec<Account> {
    warn!("no accounts configured; enabling the built-in admin login");
    vec![Account {
        username: "admin".into(),
        password: "olympics".into(),
        role: Role::Admin,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_accounts_and_capacity() {
        let config = AppConfig::parse(
            r#"{
                "accounts": [
                    {"username": "gm", "password": "pw", "role": "admin"},
                    {"username": "sam", "password": "pw2", "role": "marshal"}
                ],
                "event_capacity": 8
            }"#,
        )
        .unwrap();
        assert_eq!(config.accounts().len(), 2);
        assert_eq!(config.accounts()[1].role, Role::Marshal);
        assert_eq!(config.event_capacity(), 8);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = AppConfig::parse("{}").unwrap();
        assert_eq!(config.accounts().len(), 1);
        assert_eq!(config.accounts()[0].role, Role::Admin);
        assert_eq!(config.event_capacity(), DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn unknown_role_is_a_parse_error() {
        assert!(
            AppConfig::parse(r#"{"accounts":[{"username":"a","password":"b","role":"root"}]}"#)
                .is_err()
        );
    }
}
