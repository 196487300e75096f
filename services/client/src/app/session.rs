//! services/client/src/app/session.rs
//!
//! Login, registration, logout and session restore.

use super::AppState;
use crate::adapters::storage::SESSION_KEY;
use orbit_core::domain::Session;
use orbit_core::ports::{PortError, PortResult};
use orbit_core::validation::{validate_login, validate_registration};
use tracing::{info, warn};

pub async fn login(app: &AppState, email: &str, password: &str) -> PortResult<Session> {
    validate_login(email, password)?;
    let session = app.backend.login(email.trim(), password).await?;
    establish(app, session).await
}

pub async fn register(
    app: &AppState,
    email: &str,
    password: &str,
    name: &str,
) -> PortResult<Session> {
    validate_registration(email, password, name)?;
    let session = app
        .backend
        .register(email.trim(), password, name.trim())
        .await?;
    establish(app, session).await
}

/// Persists the session as one document, then publishes it.
/// Nothing is published if the write fails.
async fn establish(app: &AppState, session: Session) -> PortResult<Session> {
    let json = serde_json::to_string(&session).map_err(|e| PortError::Storage(e.to_string()))?;
    app.storage.set(SESSION_KEY, &json).await?;
    app.store.set_session(session.clone());
    info!("Logged in as {} ({})", session.email, session.user_id);
    Ok(session)
}

/// Ends the session locally no matter what the server says.
pub async fn logout(app: &AppState) -> PortResult<()> {
    if let Some(session) = app.store.session() {
        if let Err(e) = app.backend.logout(&session).await {
            warn!("Server logout failed, clearing local session anyway: {}", e);
        }
    }
    app.store.clear();
    app.release_streak();
    app.storage.clear().await?;
    info!("Logged out");
    Ok(())
}

/// Loads the stored session into the store, unless one is already there.
/// A corrupt session file is discarded.
pub async fn restore(app: &AppState) -> PortResult<Option<Session>> {
    if let Some(session) = app.store.session() {
        return Ok(Some(session));
    }
    let Some(raw) = app.storage.get(SESSION_KEY).await? else {
        return Ok(None);
    };
    match serde_json::from_str::<Session>(&raw) {
        Ok(session) => {
            app.store.set_session(session.clone());
            Ok(Some(session))
        }
        Err(e) => {
            warn!("Discarding unreadable stored session: {}", e);
            app.storage.remove(SESSION_KEY).await?;
            Ok(None)
        }
    }
}
