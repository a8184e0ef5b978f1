//! Session tokens: login, logout and lookup of the role behind a token.
//!
//! Tokens live in memory. The most recent login is also written to the
//! `auth-token` / `user-role` keys so it survives a restart.

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::Role,
    dao::repository::CompetitionRepository,
    dto::auth::{LoginRequest, LoginResponse},
    error::ServiceError,
    state::SharedState,
};

/// Check credentials and issue a new session token.
pub async fn login(state: &SharedState, request: LoginRequest) -> Result<LoginResponse, ServiceError> {
    let Some(role) = state
        .authenticator()
        .authenticate(&request.username, &request.password)
    else {
        warn!(username = %request.username.trim(), "rejected login attempt");
        return Err(ServiceError::Unauthorized("invalid username or password".into()));
    };

    let token = Uuid::new_v4().simple().to_string();
    state.sessions().insert(token.clone(), role);

    match state.repository().await {
        Some(repository) => {
            if let Err(err) = repository.save_auth_marker(&token, role).await {
                warn!(error = %err, "failed to persist session marker");
            }
        }
        None => warn!("storage unavailable; session will not survive a restart"),
    }

    info!(username = %request.username.trim(), role = role.as_str(), "user logged in");
    Ok(LoginResponse { token, role })
}

/// Revoke a session token.
pub async fn logout(state: &SharedState, token: &str) -> Result<(), ServiceError> {
    if state.sessions().remove(token).is_none() {
        return Err(ServiceError::Unauthorized("unknown session token".into()));
    }

    if let Some(repository) = state.repository().await {
        if let Err(err) = clear_marker_if_current(&repository, token).await {
            warn!(error = %err, "failed to clear session marker");
        }
    }

    info!("session revoked");
    Ok(())
}

/// Role granted to a token, if it is active.
pub fn role_for(state: &SharedState, token: &str) -> Option<Role> {
    state.sessions().get(token).map(|entry| *entry.value())
}

/// Re-activate the session persisted by the last login.
pub async fn restore_session(
    state: &SharedState,
    repository: &CompetitionRepository,
) -> Result<(), ServiceError> {
    if let Some((token, role)) = repository.load_auth_marker().await? {
        info!(role = role.as_str(), "restored persisted session");
        state.sessions().insert(token, role);
    }
    Ok(())
}

async fn clear_marker_if_current(
    repository: &CompetitionRepository,
    token: &str,
) -> Result<(), ServiceError> {
    let current = repository.load_auth_marker().await?;
    if current.is_some_and(|(stored, _)| stored == token) {
        repository.clear_auth_marker().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::blob_store::{BlobStore, MemoryBlobStore},
        state::AppState,
    };

    fn credentials(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    fn config() -> AppConfig {
        AppConfig::parse(
            r#"{"accounts": [
                {"username": "admin", "password": "secret", "role": "admin"},
                {"username": "sam", "password": "watch", "role": "marshal"}
            ]}"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn login_issues_token_and_persists_marker() {
        let state = AppState::new(&config());
        let store = MemoryBlobStore::new();
        state.install_store(Arc::new(store.clone())).await;

        let response = login(&state, credentials("admin", "secret")).await.unwrap();
        assert_eq!(response.role, Role::Admin);
        assert_eq!(response.token.len(), 32);
        assert_eq!(role_for(&state, &response.token), Some(Role::Admin));

        assert_eq!(
            store.get("auth-token").await.unwrap().as_deref(),
            Some(response.token.as_str())
        );
        assert_eq!(store.get("user-role").await.unwrap().as_deref(), Some("admin"));

        logout(&state, &response.token).await.unwrap();
        assert_eq!(role_for(&state, &response.token), None);
        assert!(store.get("auth-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected() {
        let state = AppState::new(&config());
        let err = login(&state, credentials("admin", "nope")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        assert!(matches!(
            logout(&state, "missing").await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn persisted_session_is_restored() {
        let store = MemoryBlobStore::new();
        let repository = CompetitionRepository::new(Arc::new(store.clone()));
        repository.save_auth_marker("abc123", Role::Marshal).await.unwrap();

        let state = AppState::new(&config());
        restore_session(&state, &repository).await.unwrap();
        assert_eq!(role_for(&state, "abc123"), Some(Role::Marshal));
    }
}
