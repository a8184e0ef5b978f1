pub mod catalog;
pub mod competition;
pub mod events;
pub mod records;
pub mod results;
pub mod roster;
pub mod scoring;
pub mod sequencer;
pub mod session;
pub mod transitions;

use std::{future::Future, sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;

use crate::{
    auth::{Authenticator, Role, StaticAccounts},
    config::AppConfig,
    dao::{blob_store::BlobStore, repository::CompetitionRepository},
    error::ServiceError,
    state::{
        competition::CompetitionState,
        events::{CompetitionNotification, EventPublisher},
        sequencer::{CompetitionPhase, Plan, SequencerEvent},
    },
};

pub use self::events::SseHub;
pub use self::sequencer::{AbortError, ApplyError, PlanError, PlanId, Snapshot};

/// Handle to the application state shared by every handler.
pub type SharedState = Arc<AppState>;
/// Upper bound for the storage work of one transition or update.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Central application state: the competition, its storage handle and the
/// notification hub.
pub struct AppState {
    store: RwLock<Option<Arc<dyn BlobStore>>>,
    competition: RwLock<CompetitionState>,
    sessions: DashMap<String, Role>,
    authenticator: Arc<dyn Authenticator>,
    events: SseHub,
    degraded: watch::Sender<bool>,
    write_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: &AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            competition: RwLock::new(CompetitionState::new()),
            sessions: DashMap::new(),
            authenticator: Arc::new(StaticAccounts::new(config.accounts().to_vec())),
            events: SseHub::new(config.event_capacity()),
            degraded: degraded_tx,
            write_gate: Mutex::new(()),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Repository over the installed store, if any.
    pub async fn repository(&self) -> Option<CompetitionRepository> {
        let guard = self.store.read().await;
        guard.as_ref().cloned().map(CompetitionRepository::new)
    }

    /// Repository over the installed store, failing in degraded mode.
    pub async fn require_repository(&self) -> Result<CompetitionRepository, ServiceError> {
        self.repository().await.ok_or(ServiceError::Degraded)
    }

    /// Current blob store, if one is installed.
    pub async fn blob_store(&self) -> Option<Arc<dyn BlobStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a new blob store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn BlobStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current blob store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub used for the notification stream.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    /// Publish a notification to observers, best effort.
    pub fn publish(&self, notification: &CompetitionNotification) {
        self.events.publish(notification);
    }

    /// Active session tokens and their roles.
    pub fn sessions(&self) -> &DashMap<String, Role> {
        &self.sessions
    }

    /// Credential checker for the login endpoint.
    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// Run `f` against the current competition state.
    pub async fn read_competition<R>(&self, f: impl FnOnce(&CompetitionState) -> R) -> R {
        let guard = self.competition.read().await;
        f(&guard)
    }

    /// Replace the in-memory competition, used when restoring from storage.
    pub async fn replace_competition(&self, competition: CompetitionState) {
        let _gate = self.write_gate.lock().await;
        *self.competition.write().await = competition;
    }

    /// Current competition phase.
    pub async fn phase(&self) -> CompetitionPhase {
        self.competition.read().await.phase()
    }

    /// Snapshot of the sequencer.
    pub async fn snapshot(&self) -> Snapshot {
        self.competition.read().await.snapshot()
    }

    /// Update and broadcast the degraded flag when the value changes.
    fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Apply `mutate` to a draft of the competition, persist the draft, then
    /// commit it. Nothing changes in memory when either step fails.
    pub async fn update_competition<T, F, W, Fut>(
        &self,
        mutate: F,
        persist: W,
    ) -> Result<T, ServiceError>
    where
        T: Clone,
        F: FnOnce(&mut CompetitionState) -> Result<T, ServiceError>,
        W: FnOnce(CompetitionState, T) -> Fut,
        Fut: Future<Output = Result<(), ServiceError>>,
    {
        let _gate = self.write_gate.lock().await;
        let mut draft = self.competition.read().await.clone();
        let value = mutate(&mut draft)?;

        self.with_timeout(persist(draft.clone(), value.clone()))
            .await?;

        *self.competition.write().await = draft;
        Ok(value)
    }

    /// Plan a sequencer transition, run `work` against the projected state and
    /// apply the plan only when the work succeeds.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: SequencerEvent,
        work: F,
    ) -> Result<(T, CompetitionPhase), ServiceError>
    where
        F: FnOnce(CompetitionState) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.write_gate.lock().await;

        let (plan_id, projected) = {
            let mut live = self.competition.write().await;
            let Plan { id: plan_id, .. } = live.plan(event)?;
            let mut projected = live.clone();
            if let Err(err) = projected.apply(plan_id) {
                self.abort_logged(&mut live, event, plan_id, "projection");
                return Err(err.into());
            }
            (plan_id, projected)
        };

        let outcome = self.with_timeout(work(projected)).await;

        let mut live = self.competition.write().await;
        match outcome {
            Ok(value) => {
                let next = live.apply(plan_id)?;
                drop(live);
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                self.abort_logged(&mut live, event, plan_id, "work error");
                drop(live);
                drop(gate);
                Err(err)
            }
        }
    }

    async fn with_timeout<T>(
        &self,
        work: impl Future<Output = Result<T, ServiceError>>,
    ) -> Result<T, ServiceError> {
        match self.transition_timeout {
            Some(limit) => timeout(limit, work)
                .await
                .unwrap_or(Err(ServiceError::Timeout)),
            None => work.await,
        }
    }

    fn abort_logged(
        &self,
        live: &mut CompetitionState,
        event: SequencerEvent,
        plan_id: PlanId,
        cause: &'static str,
    ) {
        if let Err(abort_err) = live.abort(plan_id) {
            warn!(
                event = ?event,
                plan_id = %plan_id,
                cause,
                error = ?abort_err,
                "failed to abort transition"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dao::blob_store::MemoryBlobStore, state::roster::RosterKind};

    async fn ready_state() -> SharedState {
        let state = AppState::new(&AppConfig::default());
        state.install_store(Arc::new(MemoryBlobStore::new())).await;
        state
            .update_competition(
                |competition| {
                    competition.add_to_roster(RosterKind::Teams, "Alpha")?;
                    competition.add_to_roster(RosterKind::Marshals, "Sam")?;
                    Ok(())
                },
                |_, _| async { Ok(()) },
            )
            .await
            .unwrap();
        state
    }

    #[tokio::test]
    async fn starts_degraded_until_store_installed() {
        let state = AppState::new(&AppConfig::default());
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_repository().await,
            Err(ServiceError::Degraded)
        ));
        state.install_store(Arc::new(MemoryBlobStore::new())).await;
        assert!(!state.is_degraded().await);
        assert!(!*state.degraded_watcher().borrow());
    }

    #[tokio::test]
    async fn failed_persist_leaves_state_untouched() {
        let state = ready_state().await;
        let result = state
            .update_competition(
                |competition| Ok(competition.add_to_roster(RosterKind::Teams, "Beta")?),
                |_, _| async { Err(ServiceError::Degraded) },
            )
            .await;
        assert!(result.is_err());
        let teams = state
            .read_competition(|competition| competition.roster().teams().to_vec())
            .await;
        assert_eq!(teams, vec!["Alpha".to_string()]);
    }

    #[tokio::test]
    async fn transition_applies_after_work() {
        let state = ready_state().await;
        let (seen, next) = state
            .run_transition(SequencerEvent::Start, |projected| async move {
                Ok(projected.phase())
            })
            .await
            .unwrap();
        assert_eq!(seen, CompetitionPhase::Running(0));
        assert_eq!(next, CompetitionPhase::Running(0));
        assert_eq!(state.phase().await, CompetitionPhase::Running(0));
        assert_eq!(state.snapshot().await.version, 1);
    }

    #[tokio::test]
    async fn transition_aborts_when_work_fails() {
        let state = ready_state().await;
        let result = state
            .run_transition(SequencerEvent::Start, |_| async {
                Err::<(), _>(ServiceError::Degraded)
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Degraded)));
        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.phase, CompetitionPhase::NotStarted);
        assert_eq!(snapshot.pending, None);
    }

    #[tokio::test]
    async fn rejected_transition_is_reported() {
        let state = AppState::new(&AppConfig::default());
        let result = state
            .run_transition(SequencerEvent::Advance, |_| async { Ok(()) })
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidState(_))));
    }
}
