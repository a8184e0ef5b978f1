//! Typed access to the blob-store keys.
//!
//! Reads are lenient: a blob that cannot be decoded is logged and replaced by
//! its default value, so a corrupt store degrades to "nothing recorded yet".
//! Backend failures are still reported as errors.

use std::{future::Future, sync::Arc, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use tokio::time::timeout;
use tracing::warn;

use crate::{
    auth::Role,
    dao::{
        blob_store::BlobStore,
        models::{
            AUTH_TOKEN_KEY, COMPETITION_KEY, CompetitionEntity, GAME_COMPLETED_KEY,
            GAME_DATA_KEY, GameCompletedEntity, GameRecordEntity, MARSHALS_KEY, TEAMS_KEY,
            USER_ROLE_KEY,
        },
        storage::{StorageError, StorageResult},
    },
    state::{
        competition::{CompetitionState, GameCompletion},
        records::GameRecord,
        roster::{Roster, RosterKind},
        sequencer::CompetitionPhase,
    },
};

/// Upper bound for one store call inside a multi-key write.
const STORE_CALL_TIMEOUT: Duration = Duration::from_millis(500);

/// Maps competition state onto the blob-store keys.
#[derive(Clone)]
pub struct CompetitionRepository {
    store: Arc<dyn BlobStore>,
}

impl CompetitionRepository {
    /// Wrap a blob store.
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Rebuild the whole competition from storage.
    pub async fn load_state(&self) -> StorageResult<CompetitionState> {
        let roster = self.load_roster().await?;
        let phase = self.load_phase().await?;
        let records = self.load_records().await?;
        Ok(CompetitionState::restore(roster, phase, records))
    }

    /// Teams and marshals. Blank or repeated names are skipped.
    pub async fn load_roster(&self) -> StorageResult<Roster> {
        let teams: Vec<String> = self.read_json(TEAMS_KEY).await?.unwrap_or_default();
        let marshals: Vec<String> = self.read_json(MARSHALS_KEY).await?.unwrap_or_default();

        let mut roster = Roster::default();
        for (kind, names) in [(RosterKind::Teams, teams), (RosterKind::Marshals, marshals)] {
            for name in names {
                if let Err(err) = roster.add(kind, &name) {
                    warn!(error = %err, "skipping stored roster entry");
                }
            }
        }
        Ok(roster)
    }

    /// Game records in production order.
    pub async fn load_records(&self) -> StorageResult<Vec<GameRecord>> {
        let entities: Vec<GameRecordEntity> =
            self.read_json(GAME_DATA_KEY).await?.unwrap_or_default();
        Ok(entities.into_iter().map(GameRecord::from).collect())
    }

    /// Sequencer position; `NotStarted` when absent.
    pub async fn load_phase(&self) -> StorageResult<CompetitionPhase> {
        let entity: Option<CompetitionEntity> = self.read_json(COMPETITION_KEY).await?;
        Ok(entity.map_or(CompetitionPhase::NotStarted, Into::into))
    }

    /// Persisted session token and role, when both are present and valid.
    pub async fn load_auth_marker(&self) -> StorageResult<Option<(String, Role)>> {
        let token = self.store.get(AUTH_TOKEN_KEY).await?;
        let role = self.store.get(USER_ROLE_KEY).await?;
        match (token, role) {
            (Some(token), Some(role)) if !token.trim().is_empty() => match Role::parse(&role) {
                Some(role) => Ok(Some((token, role))),
                None => {
                    warn!(role = %role, "ignoring stored session with unknown role");
                    Ok(None)
                }
            },
            _ => Ok(None),
        }
    }

    /// Write both rosters.
    pub async fn save_roster(&self, roster: &Roster) -> StorageResult<()> {
        self.write_all(vec![
            (TEAMS_KEY, Some(encode(TEAMS_KEY, &roster.teams())?)),
            (MARSHALS_KEY, Some(encode(MARSHALS_KEY, &roster.marshals())?)),
        ])
        .await
    }

    /// Write the sequencer position.
    pub async fn save_phase(&self, phase: CompetitionPhase) -> StorageResult<()> {
        self.write_json(COMPETITION_KEY, &CompetitionEntity::from(phase))
            .await
    }

    /// Write the game records, the completion marker and the sequencer
    /// position as one unit.
    ///
    /// When a write fails, the keys touched so far are put back to the values
    /// they held before the call, so a reload still matches memory.
    pub async fn save_progress(
        &self,
        records: &[GameRecord],
        marker: CompletionMarker<'_>,
        phase: CompetitionPhase,
    ) -> StorageResult<()> {
        let entities: Vec<GameRecordEntity> = records.iter().map(GameRecordEntity::from).collect();
        let mut writes = vec![(GAME_DATA_KEY, Some(encode(GAME_DATA_KEY, &entities)?))];
        match marker {
            CompletionMarker::Keep => {}
            CompletionMarker::Set {
                completion,
                timestamp_ms,
            } => writes.push((
                GAME_COMPLETED_KEY,
                Some(encode(
                    GAME_COMPLETED_KEY,
                    &GameCompletedEntity::new(completion, timestamp_ms),
                )?),
            )),
            CompletionMarker::Clear => writes.push((GAME_COMPLETED_KEY, None)),
        }
        writes.push((
            COMPETITION_KEY,
            Some(encode(COMPETITION_KEY, &CompetitionEntity::from(phase))?),
        ));
        self.write_all(writes).await
    }

    /// Persist the session marker as raw strings.
    pub async fn save_auth_marker(&self, token: &str, role: Role) -> StorageResult<()> {
        self.write_all(vec![
            (AUTH_TOKEN_KEY, Some(token.to_string())),
            (USER_ROLE_KEY, Some(role.as_str().to_string())),
        ])
        .await
    }

    /// Remove the session marker.
    pub async fn clear_auth_marker(&self) -> StorageResult<()> {
        self.write_all(vec![(AUTH_TOKEN_KEY, None), (USER_ROLE_KEY, None)])
            .await
    }

    async fn read_json<T>(&self, key: &'static str) -> StorageResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, error = %err, "malformed stored value; using default");
                Ok(None)
            }
        }
    }

    async fn write_json<T>(&self, key: &'static str, value: &T) -> StorageResult<()>
    where
        T: ?Sized + Serialize,
    {
        self.put(key, Some(encode(key, value)?)).await
    }

    /// Apply `writes` in order, restoring earlier keys if one of them fails.
    async fn write_all(&self, writes: Vec<(&'static str, Option<String>)>) -> StorageResult<()> {
        let mut previous = Vec::with_capacity(writes.len());
        for (key, _) in &writes {
            let current = bounded(*key, self.store.get(key)).await?;
            previous.push((*key, current));
        }

        for (index, (key, value)) in writes.into_iter().enumerate() {
            if let Err(err) = self.put(key, value).await {
                warn!(key, error = %err, "storage write failed; restoring previous values");
                self.restore_keys(&previous[..=index]).await;
                return Err(err);
            }
        }
        Ok(())
    }

    async fn restore_keys(&self, previous: &[(&'static str, Option<String>)]) {
        for (key, value) in previous.iter().rev() {
            if let Err(err) = self.put(*key, value.clone()).await {
                warn!(key, error = %err, "failed to restore key after partial write");
            }
        }
    }

    async fn put(&self, key: &'static str, value: Option<String>) -> StorageResult<()> {
        match value {
            Some(raw) => bounded(key, self.store.set(key, raw)).await,
            None => bounded(key, self.store.remove(key)).await,
        }
    }
}

/// Change to the `gameCompleted` marker written by [`CompetitionRepository::save_progress`].
#[derive(Debug, Clone, Copy)]
pub enum CompletionMarker<'a> {
    /// Leave the marker as it is.
    Keep,
    /// Overwrite the marker with a newly completed game.
    Set {
        completion: &'a GameCompletion,
        timestamp_ms: u64,
    },
    /// Drop the marker.
    Clear,
}

fn encode<T>(key: &'static str, value: &T) -> StorageResult<String>
where
    T: ?Sized + Serialize,
{
    serde_json::to_string(value).map_err(|source| StorageError::Encode { key, source })
}

/// Bound a single store call so a batch of writes, including its restore
/// pass, finishes within the transition timeout.
async fn bounded<T>(
    key: &'static str,
    call: impl Future<Output = StorageResult<T>>,
) -> StorageResult<T> {
    timeout(STORE_CALL_TIMEOUT, call)
        .await
        .unwrap_or(Err(StorageError::TimedOut { key }))
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::{
        dao::blob_store::{FailingBlobStore, MemoryBlobStore},
        state::{scoring::RawInputPatch, sequencer::SequencerEvent},
    };

    fn repository() -> (MemoryBlobStore, CompetitionRepository) {
        let store = MemoryBlobStore::new();
        let repository = CompetitionRepository::new(Arc::new(store.clone()));
        (store, repository)
    }

    #[tokio::test]
    async fn empty_store_loads_defaults() {
        let (_, repository) = repository();
        let state = repository.load_state().await.unwrap();
        assert!(state.roster().teams().is_empty());
        assert!(state.records().is_empty());
        assert_eq!(state.phase(), CompetitionPhase::NotStarted);
    }

    #[tokio::test]
    async fn malformed_blobs_fall_back_to_empty() {
        let (store, repository) = repository();
        store.set(TEAMS_KEY, "not json".into()).await.unwrap();
        store.set(GAME_DATA_KEY, "{\"oops\":1}".into()).await.unwrap();
        store.set(COMPETITION_KEY, "[]".into()).await.unwrap();

        let state = repository.load_state().await.unwrap();
        assert!(state.roster().teams().is_empty());
        assert!(state.records().is_empty());
        assert_eq!(state.phase(), CompetitionPhase::NotStarted);
    }

    #[tokio::test]
    async fn stored_roster_skips_blank_and_duplicate_names() {
        let (store, repository) = repository();
        store
            .set(TEAMS_KEY, r#"["Alpha", " ", "Alpha", "Beta"]"#.into())
            .await
            .unwrap();
        let roster = repository.load_roster().await.unwrap();
        assert_eq!(roster.teams(), ["Alpha", "Beta"]);
    }

    #[tokio::test]
    async fn state_survives_a_round_trip() {
        let (_, repository) = repository();
        let mut state = CompetitionState::new();
        state
            .replace_roster(
                Roster::from_names(
                    ["Alpha", "Beta"].map(String::from),
                    ["Sam"].map(String::from),
                )
                .unwrap(),
            )
            .unwrap();
        state.transition(SequencerEvent::Start).unwrap();
        state
            .update_input(
                "Beta",
                RawInputPatch {
                    position: Some(Some(2)),
                    ..Default::default()
                },
            )
            .unwrap();
        state.finalize("Beta", SystemTime::now()).unwrap();

        repository.save_roster(state.roster()).await.unwrap();
        repository
            .save_progress(state.records(), CompletionMarker::Keep, state.phase())
            .await
            .unwrap();
        let restored = repository.load_state().await.unwrap();

        assert_eq!(restored.phase(), CompetitionPhase::Running(0));
        assert_eq!(restored.roster(), state.roster());
        assert_eq!(
            restored.records()[0].result_for("Beta").unwrap().elapsed_seconds,
            75
        );
        assert_eq!(restored.session().unwrap().completed_count(), 1);
    }

    fn completion(game_index: usize) -> GameCompletion {
        let game = crate::state::catalog::game_at(game_index).unwrap();
        GameCompletion {
            game_index,
            game_id: game.id,
            game_name: game.name,
            total_games: 5,
        }
    }

    fn stored_marker(raw: Option<String>) -> Option<GameCompletedEntity> {
        raw.map(|raw| serde_json::from_str(&raw).unwrap())
    }

    #[tokio::test]
    async fn game_completed_marker_is_overwritten_then_cleared() {
        let (store, repository) = repository();
        for (index, timestamp_ms) in [(0, 1_000), (1, 2_000)] {
            let completion = completion(index);
            repository
                .save_progress(
                    &[],
                    CompletionMarker::Set {
                        completion: &completion,
                        timestamp_ms,
                    },
                    CompetitionPhase::Running(index),
                )
                .await
                .unwrap();
        }

        let raw = store.get(GAME_COMPLETED_KEY).await.unwrap();
        assert!(raw.as_deref().unwrap().contains("\"gameId\":\"office-chair-race\""));
        let marker = stored_marker(raw).unwrap();
        assert_eq!(marker.game_name, "Office Chair Race");
        assert_eq!(marker.timestamp, 2_000);

        repository
            .save_progress(&[], CompletionMarker::Clear, CompetitionPhase::NotStarted)
            .await
            .unwrap();
        assert!(store.get(GAME_COMPLETED_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_progress_write_restores_earlier_keys() {
        let inner = MemoryBlobStore::new();
        let store = FailingBlobStore::new(inner.clone());
        let repository = CompetitionRepository::new(Arc::new(store.clone()));
        let first = completion(0);
        repository
            .save_progress(
                &[],
                CompletionMarker::Set {
                    completion: &first,
                    timestamp_ms: 1_000,
                },
                CompetitionPhase::Running(1),
            )
            .await
            .unwrap();
        let before: Vec<_> = [GAME_DATA_KEY, GAME_COMPLETED_KEY, COMPETITION_KEY]
            .iter()
            .map(|key| inner.get(key))
            .collect();
        let before = futures::future::join_all(before).await;

        store.fail_writes_to(COMPETITION_KEY);
        let err = repository
            .save_progress(&[], CompletionMarker::Clear, CompetitionPhase::NotStarted)
            .await;
        assert!(matches!(err, Err(StorageError::Unavailable { .. })));

        let after: Vec<_> = [GAME_DATA_KEY, GAME_COMPLETED_KEY, COMPETITION_KEY]
            .iter()
            .map(|key| inner.get(key))
            .collect();
        let after = futures::future::join_all(after).await;
        let unwrap = |values: Vec<StorageResult<Option<String>>>| -> Vec<Option<String>> {
            values.into_iter().map(Result::unwrap).collect()
        };
        assert_eq!(unwrap(after), unwrap(before));
    }

    #[tokio::test]
    async fn auth_marker_is_stored_as_raw_strings() {
        let (store, repository) = repository();
        repository
            .save_auth_marker("abc123", Role::Admin)
            .await
            .unwrap();
        assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap().as_deref(), Some("abc123"));
        assert_eq!(store.get(USER_ROLE_KEY).await.unwrap().as_deref(), Some("admin"));
        assert_eq!(
            repository.load_auth_marker().await.unwrap(),
            Some(("abc123".to_string(), Role::Admin))
        );

        repository.clear_auth_marker().await.unwrap();
        assert_eq!(repository.load_auth_marker().await.unwrap(), None);
    }
}
