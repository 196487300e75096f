//! services/client/src/app/gamification.rs
//!
//! Gamification is read-only on the client: state comes from the backend and
//! actions are reported to it. Nothing is scored locally.

use super::AppState;
use crate::adapters::storage::GAMIFICATION_KEY;
use orbit_core::domain::{GamificationState, Leaderboard, StreakUpdate, TrackedAction};
use orbit_core::ports::PortResult;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_LEADERBOARD_SIZE: u32 = 10;

/// Fetches the current state and publishes it.
pub async fn refresh(app: &AppState) -> PortResult<GamificationState> {
    let session = app.require_session()?;
    let user_id = app.require_user_id()?;
    let state = app.backend.gamification_state(&session, &user_id).await?;
    app.store.set_gamification(state.clone());

    match serde_json::to_string(&state) {
        Ok(json) => {
            if let Err(e) = app.storage.set(GAMIFICATION_KEY, &json).await {
                debug!("Could not cache gamification state: {}", e);
            }
        }
        Err(e) => debug!("Could not serialize gamification state: {}", e),
    }
    Ok(state)
}

pub async fn leaderboard(app: &AppState, top: u32) -> PortResult<Leaderboard> {
    let session = app.require_session()?;
    let user_id = app.require_user_id()?;
    let board = app.backend.leaderboard(&session, &user_id, top).await?;
    app.store.set_leaderboard(board.clone());
    Ok(board)
}

/// Reports an action in the background. Failures are logged and never retried.
///
/// The task is registered with the app's background tracker, so
/// `AppState::flush_background` can wait for it before the process exits.
pub fn track(app: &AppState, action: TrackedAction, metadata: Value) -> Option<JoinHandle<()>> {
    let (Some(session), Some(user_id)) = (
        app.store.session(),
        app.store.read(|s| s.resolved_user_id()),
    ) else {
        debug!("Skipping tracking of {}: not logged in", action.as_str());
        return None;
    };
    let backend = app.backend.clone();
    Some(app.background().spawn(async move {
        match backend
            .track_action(&session, &user_id, action, metadata)
            .await
        {
            Ok(outcome) => {
                debug!(
                    "Tracked {}: +{} points (total {})",
                    action.as_str(),
                    outcome.points_awarded,
                    outcome.new_total
                );
                if outcome.leveled_up {
                    info!("Level up! Total points: {}", outcome.new_total);
                }
            }
            Err(e) => warn!("Failed to track {}: {}", action.as_str(), e),
        }
    }))
}

/// Claims the daily login streak. Runs at most once per mount.
pub async fn update_streak(app: &AppState) -> Option<StreakUpdate> {
    let (Ok(session), Ok(user_id)) = (app.require_session(), app.require_user_id()) else {
        debug!("Skipping streak update: not logged in");
        return None;
    };
    if !app.claim_streak() {
        debug!("Streak already updated in this session");
        return None;
    }
    match app.backend.update_streak(&session, &user_id).await {
        Ok(update) => {
            if update.points_awarded > 0 {
                info!(
                    "Login streak: {} day(s), +{} points",
                    update.login_streak, update.points_awarded
                );
            }
            Some(update)
        }
        Err(e) => {
            warn!("Failed to update login streak: {}", e);
            None
        }
    }
}
