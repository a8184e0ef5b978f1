//! Identity check collaborator: maps a credential pair to a role.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role granted to an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Runs the competition.
    Admin,
    /// Observes progress only.
    Marshal,
}

impl Role {
    /// Raw string persisted under the `user-role` key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Marshal => "marshal",
        }
    }

    /// Parse a persisted role string.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "admin" => Some(Role::Admin),
            "marshal" => Some(Role::Marshal),
            _ => None,
        }
    }
}

/// One statically configured login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    /// Login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
    /// Role granted on success.
    pub role: Role,
}

/// Anything able to check a username/password pair.
pub trait Authenticator: Send + Sync {
    /// Role of the matching account, `None` when the pair is rejected.
    fn authenticate(&self, username: &str, password: &str) -> Option<Role>;
}

/// Fixed account list loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticAccounts {
    accounts: Vec<Account>,
}

impl StaticAccounts {
    /// Wrap a list of accounts.
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }
}

impl Authenticator for StaticAccounts {
    fn authenticate(&self, username: &str, password: &str) -> Option<Role> {
        self.accounts
            .iter()
            .find(|account| account.username == username.trim() && account.password == password)
            .map(|account| account.role)
    }
}
