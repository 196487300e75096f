//! services/client/src/app/tracker.rs
//!
//! The application tracker: opportunities the student saved or applied to.

use super::{gamification, AppState};
use orbit_core::domain::{
    Application, ApplicationStatus, EligibilityAnalysis, NewApplication, Opportunity, Priority,
    TrackedAction,
};
use orbit_core::ports::{PortError, PortResult};
use serde_json::json;
use tracing::info;

/// Saves an opportunity to the tracker.
///
/// `eligibility_score` is taken from `analysis` and left empty when the
/// opportunity was never analyzed.
pub async fn save_to_tracker(
    app: &AppState,
    opportunity: &Opportunity,
    analysis: Option<&EligibilityAnalysis>,
) -> PortResult<Application> {
    let user_id = app.require_user_id()?;
    let session = app.store.session();

    let new_application = NewApplication {
        user_id,
        opportunity_id: opportunity.opportunity_id.clone(),
        opportunity_title: opportunity.title.clone(),
        opportunity_link: opportunity.link.clone(),
        deadline: opportunity.deadline.clone(),
        status: ApplicationStatus::Saved,
        priority: Priority::Medium,
        notes: String::new(),
        eligibility_score: analysis.map(|a| a.confidence_score),
    };
    let application = app
        .backend
        .create_application(session.as_ref(), &new_application)
        .await?;
    info!(
        "Saved '{}' to tracker as {}",
        application.opportunity_title, application.id
    );

    gamification::track(
        app,
        TrackedAction::SaveToTracker,
        json!({ "opportunity_id": opportunity.opportunity_id }),
    );
    Ok(application)
}

/// Saves an opportunity from the current result list, with its analysis if any.
pub async fn save_listed(app: &AppState, opportunity_id: &str) -> PortResult<Application> {
    let (opportunity, analysis) = app.store.read(|s| {
        (
            s.opportunity(opportunity_id).cloned(),
            s.analyses.get(opportunity_id).cloned(),
        )
    });
    let opportunity = opportunity
        .ok_or_else(|| PortError::NotFound(format!("opportunity {}", opportunity_id)))?;
    save_to_tracker(app, &opportunity, analysis.as_ref()).await
}

pub async fn list(app: &AppState) -> PortResult<Vec<Application>> {
    let session = app.require_session()?;
    let user_id = app.require_user_id()?;
    app.backend.list_applications(&session, &user_id).await
}

pub async fn update_status(
    app: &AppState,
    application_id: &str,
    status: ApplicationStatus,
    notes: Option<&str>,
) -> PortResult<()> {
    let session = app.require_session()?;
    app.backend
        .update_application_status(&session, application_id, status, notes)
        .await?;
    info!("Application {} is now {}", application_id, status.as_str());

    let action = if status == ApplicationStatus::Applied {
        TrackedAction::ApplySubmitted
    } else {
        TrackedAction::StatusUpdate
    };
    gamification::track(
        app,
        action,
        json!({ "application_id": application_id, "status": status.as_str() }),
    );
    Ok(())
}

pub async fn remove(app: &AppState, application_id: &str) -> PortResult<()> {
    let session = app.require_session()?;
    app.backend
        .delete_application(&session, application_id)
        .await?;
    info!("Removed application {}", application_id);
    Ok(())
}
