//! services/client/src/app/state.rs
//!
//! Defines the application state shared by every flow.

use crate::adapters::storage::GAMIFICATION_KEY;
use crate::adapters::{FileStorage, HttpGateway};
use crate::config::Config;
use crate::error::ClientError;
use orbit_core::domain::{GamificationState, Session};
use orbit_core::ports::{Backend, PortError, PortResult, StorageService};
use orbit_core::store::AppStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// How long a finishing command waits for background reports to go out.
pub const BACKGROUND_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

//=========================================================================================
// AppState
//=========================================================================================

/// Created once at startup. Flows borrow it; background tasks clone the `Arc`s they need.
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub storage: Arc<dyn StorageService>,
    pub store: AppStore,
    pub config: Arc<Config>,
    /// Set once the login streak has been claimed for this mount.
    streak_claimed: AtomicBool,
    /// Fire-and-forget requests still in flight.
    background: TaskTracker,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn Backend>,
        storage: Arc<dyn StorageService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            backend,
            storage,
            store: AppStore::new(),
            config,
            streak_claimed: AtomicBool::new(false),
            background: TaskTracker::new(),
        }
    }

    /// Wires the HTTP gateway and the file storage described by `config`.
    pub fn from_config(config: Config) -> Result<Self, ClientError> {
        let backend = HttpGateway::new(&config)?;
        let storage = FileStorage::new(config.data_dir.clone());
        Ok(Self::new(
            Arc::new(backend),
            Arc::new(storage),
            Arc::new(config),
        ))
    }

    /// The current session, or `NotLoggedIn` before anything is sent.
    pub fn require_session(&self) -> PortResult<Session> {
        self.store.session().ok_or(PortError::NotLoggedIn)
    }

    /// The id used for per-user endpoints.
    pub fn require_user_id(&self) -> PortResult<String> {
        self.store
            .read(|s| s.resolved_user_id())
            .ok_or(PortError::NotLoggedIn)
    }

    /// Returns true the first time it is called in this mount.
    pub(crate) fn claim_streak(&self) -> bool {
        !self.streak_claimed.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn release_streak(&self) {
        self.streak_claimed.store(false, Ordering::SeqCst);
    }

    pub(crate) fn background(&self) -> &TaskTracker {
        &self.background
    }

    /// Waits up to `limit` for background reports to finish.
    ///
    /// Returns false if some were still pending when the time ran out.
    pub async fn flush_background(&self, limit: Duration) -> bool {
        self.background.close();
        let pending = self.background.len();
        let flushed = tokio::time::timeout(limit, self.background.wait())
            .await
            .is_ok();
        self.background.reopen();
        if flushed {
            if pending > 0 {
                debug!("Flushed {} background request(s)", pending);
            }
        } else {
            warn!(
                "Gave up on {} background request(s) after {:?}",
                self.background.len(),
                limit
            );
        }
        flushed
    }
}

//=========================================================================================
// Mount
//=========================================================================================

/// Brings a freshly started client up to date: session, profile, streak, gamification.
///
/// Only local storage failures are returned. Network failures are logged so the
/// app stays usable offline.
pub async fn mount(app: &AppState) -> PortResult<()> {
    let Some(session) = super::session::restore(app).await? else {
        debug!("No stored session; starting logged out");
        return Ok(());
    };
    info!("Restored session for {}", session.email);

    if let Err(e) = super::profile::rehydrate(app).await {
        warn!("Could not load profile: {}", e);
    }
    load_cached_gamification(app).await;

    super::gamification::update_streak(app).await;
    if let Err(e) = super::gamification::refresh(app).await {
        warn!("Could not refresh gamification state: {}", e);
    }
    Ok(())
}

/// Shows the last known gamification state until a fresh one arrives.
async fn load_cached_gamification(app: &AppState) {
    if app.store.read(|s| s.gamification.is_some()) {
        return;
    }
    match app.storage.get(GAMIFICATION_KEY).await {
        Ok(Some(raw)) => match serde_json::from_str::<GamificationState>(&raw) {
            Ok(state) => app.store.set_gamification(state),
            Err(e) => debug!("Ignoring unreadable cached gamification state: {}", e),
        },
        Ok(None) => {}
        Err(e) => debug!("Could not read cached gamification state: {}", e),
    }
}
