//! services/client/src/app/profile.rs
//!
//! The profile lifecycle: create (from a resume or by hand), edit, refresh, and
//! restore from the local cache.

use super::{gamification, AppState};
use crate::adapters::storage::PROFILE_KEY;
use bytes::Bytes;
use orbit_core::domain::{ParsedResume, Profile, ProfileData, ProfileOrigin, TrackedAction};
use orbit_core::ports::{PortError, PortResult};
use orbit_core::validation::{validate_profile, validate_resume};
use serde_json::json;
use tracing::{debug, info, warn};

/// Creates the profile from a PDF resume.
pub async fn upload_resume(
    app: &AppState,
    file_name: &str,
    contents: Bytes,
) -> PortResult<ParsedResume> {
    validate_resume(file_name, &contents)?;
    let session = app.require_session()?;
    ensure_not_created(app)?;

    info!("Uploading resume '{}' ({} bytes)", file_name, contents.len());
    let parsed = app
        .backend
        .parse_resume(&session, file_name, contents)
        .await?;

    persist(app, &parsed.profile).await;
    app.store.update(|s| {
        s.profile = Some(parsed.profile.clone());
        s.profile_origin = Some(ProfileOrigin::Resume);
        s.resume_evaluation = parsed.evaluation.clone();
        s.search_suggestions = parsed.suggestions.clone();
    });
    gamification::track(
        app,
        TrackedAction::ResumeUpload,
        json!({ "profile_id": parsed.profile.profile_id }),
    );
    Ok(parsed)
}

/// Creates the profile from a filled-in form.
pub async fn create_manual(app: &AppState, data: ProfileData) -> PortResult<Profile> {
    validate_profile(&data)?;
    let session = app.require_session()?;
    ensure_not_created(app)?;

    let profile = app.backend.create_profile(&session, &data).await?;
    info!("Created profile {}", profile.profile_id);

    persist(app, &profile).await;
    app.store.set_profile(profile.clone(), ProfileOrigin::Manual);
    gamification::track(
        app,
        TrackedAction::ProfileUpdate,
        json!({ "profile_id": profile.profile_id, "created": true }),
    );
    Ok(profile)
}

/// A copy of the current profile for the edit form.
pub fn edit_draft(app: &AppState) -> PortResult<ProfileData> {
    app.store
        .read(|s| s.profile.as_ref().map(|p| p.data.clone()))
        .ok_or_else(no_profile)
}

/// Replaces the current profile with `data`.
pub async fn update(app: &AppState, data: ProfileData) -> PortResult<Profile> {
    validate_profile(&data)?;
    let session = app.require_session()?;
    let (current, origin) = app.store.read(|s| (s.profile.clone(), s.profile_origin));
    let current = current.ok_or_else(no_profile)?;

    let profile = app
        .backend
        .update_profile(&session, &current.profile_id, &data)
        .await?;
    info!("Updated profile {}", profile.profile_id);

    persist(app, &profile).await;
    app.store
        .set_profile(profile.clone(), origin.unwrap_or(ProfileOrigin::Restored));
    gamification::track(
        app,
        TrackedAction::ProfileUpdate,
        json!({ "profile_id": profile.profile_id }),
    );
    Ok(profile)
}

/// Fetches a profile from the backend and makes it current.
pub async fn fetch(app: &AppState, profile_id: &str) -> PortResult<Profile> {
    let session = app.require_session()?;
    let profile = app.backend.get_profile(&session, profile_id).await?;
    persist(app, &profile).await;

    let origin = app.store.read(|s| match (&s.profile, s.profile_origin) {
        (Some(p), Some(origin)) if p.profile_id == profile.profile_id => origin,
        _ => ProfileOrigin::Restored,
    });
    app.store.set_profile(profile.clone(), origin);
    Ok(profile)
}

/// Loads the cached profile when none is in memory. Falls back to the profile
/// linked to the session.
pub async fn rehydrate(app: &AppState) -> PortResult<Option<Profile>> {
    if let Some(profile) = app.store.profile() {
        return Ok(Some(profile));
    }
    if let Some(raw) = app.storage.get(PROFILE_KEY).await? {
        match serde_json::from_str::<Profile>(&raw) {
            Ok(profile) => {
                debug!("Loaded cached profile {}", profile.profile_id);
                app.store.set_profile(profile.clone(), ProfileOrigin::Restored);
                return Ok(Some(profile));
            }
            Err(e) => warn!("Ignoring unreadable cached profile: {}", e),
        }
    }
    let linked = app.store.session().and_then(|s| s.profile_id);
    match linked {
        Some(profile_id) => fetch(app, &profile_id).await.map(Some),
        None => Ok(None),
    }
}

/// One profile per account: once one is loaded, from any source, it can only be edited.
fn ensure_not_created(app: &AppState) -> PortResult<()> {
    match app.store.read(|s| s.profile.as_ref().map(|_| s.profile_origin)) {
        Some(Some(ProfileOrigin::Resume | ProfileOrigin::Manual)) => Err(PortError::Validation(
            "A profile was already created in this session. Edit it instead.".to_string(),
        )),
        Some(_) => Err(PortError::Validation(
            "You already have a profile. Edit it instead.".to_string(),
        )),
        None => Ok(()),
    }
}

fn no_profile() -> PortError {
    PortError::Validation("Create your profile first.".to_string())
}

/// The backend already holds the profile, so a failed cache write is only logged.
async fn persist(app: &AppState, profile: &Profile) {
    let json = match serde_json::to_string(profile) {
        Ok(json) => json,
        Err(e) => {
            warn!("Could not serialize profile {}: {}", profile.profile_id, e);
            return;
        }
    };
    if let Err(e) = app.storage.set(PROFILE_KEY, &json).await {
        warn!("Could not cache profile {}: {}", profile.profile_id, e);
    }
}
