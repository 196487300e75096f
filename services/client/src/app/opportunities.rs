//! services/client/src/app/opportunities.rs
//!
//! Opportunity search and eligibility analysis.
//!
//! Every call here runs under a `ViewScope`. A cancelled scope returns
//! `PortError::Cancelled` and leaves the store as it was.

use super::{gamification, AppState};
use orbit_core::domain::{
    BatchItem, EligibilityAnalysis, Opportunity, OpportunityType, TrackedAction,
};
use orbit_core::ports::{PortError, PortResult};
use orbit_core::scope::ViewScope;
use orbit_core::validation::validate_search_query;
use serde_json::json;
use tracing::info;

pub const DEFAULT_CACHED_LIMIT: u32 = 20;

/// Runs a search and replaces the result list with its results.
pub async fn search(
    app: &AppState,
    scope: &ViewScope,
    query: &str,
    opportunity_type: Option<OpportunityType>,
) -> PortResult<Vec<Opportunity>> {
    validate_search_query(query)?;
    let session = app.require_session()?;
    let query = query.trim();

    let found = scope
        .run(app.backend.search(&session, query, opportunity_type.clone()))
        .await?;
    info!("Search '{}' returned {} opportunities", query, found.len());
    app.store.replace_opportunities(found.clone());

    gamification::track(
        app,
        TrackedAction::SearchOpportunity,
        json!({
            "query": query,
            "type": opportunity_type.as_ref().map(|t| t.as_str()),
            "results": found.len(),
        }),
    );
    Ok(found)
}

/// Browses recently discovered opportunities. Replaces the result list.
pub async fn cached(
    app: &AppState,
    scope: &ViewScope,
    limit: u32,
    opportunity_type: Option<OpportunityType>,
) -> PortResult<Vec<Opportunity>> {
    let session = app.require_session()?;
    let found = scope
        .run(app.backend.cached_opportunities(&session, limit, opportunity_type))
        .await?;
    app.store.replace_opportunities(found.clone());
    Ok(found)
}

/// Makes one opportunity part of the result list, fetching it if it is not there.
pub async fn load(
    app: &AppState,
    scope: &ViewScope,
    opportunity_id: &str,
) -> PortResult<Opportunity> {
    if let Some(listed) = app.store.read(|s| s.opportunity(opportunity_id).cloned()) {
        return Ok(listed);
    }
    let session = app.require_session()?;
    let opportunity = scope
        .run(app.backend.get_opportunity(&session, opportunity_id))
        .await?;
    app.store.update(|s| {
        if s.opportunity(&opportunity.opportunity_id).is_none() {
            s.opportunities.push(opportunity.clone());
        }
    });
    Ok(opportunity)
}

/// Search ideas tailored to the current profile.
pub async fn suggestions(app: &AppState, scope: &ViewScope) -> PortResult<Vec<String>> {
    let session = app.require_session()?;
    let profile_id = require_profile_id(app)?;
    let suggestions = scope
        .run(app.backend.suggestions(&session, &profile_id))
        .await?;
    app.store
        .update(|s| s.search_suggestions = suggestions.clone());
    Ok(suggestions)
}

/// Analyzes eligibility for one opportunity.
///
/// The result is stored under `opportunity_id` as requested, so concurrent
/// analyses cannot land on each other's cards. A result whose opportunity has
/// left the list in the meantime is returned but not stored.
pub async fn analyze(
    app: &AppState,
    scope: &ViewScope,
    opportunity_id: &str,
) -> PortResult<EligibilityAnalysis> {
    let session = app.require_session()?;
    let profile_id = require_profile_id(app)?;

    let analysis = scope
        .run(app.backend.analyze(&session, &profile_id, opportunity_id))
        .await?;
    info!(
        "Analysis for {}: {} ({}%)",
        opportunity_id,
        analysis.status.label(),
        analysis.confidence_score
    );
    if app.store.insert_analysis(analysis.clone()) {
        gamification::track(
            app,
            TrackedAction::CheckEligibility,
            json!({
                "opportunity_id": opportunity_id,
                "status": analysis.status,
                "score": analysis.confidence_score,
            }),
        );
    }
    Ok(analysis)
}

/// Analyzes several opportunities in one request. Failures are per item.
pub async fn analyze_batch(
    app: &AppState,
    scope: &ViewScope,
    opportunity_ids: &[String],
) -> PortResult<Vec<BatchItem>> {
    if opportunity_ids.is_empty() {
        return Ok(Vec::new());
    }
    let session = app.require_session()?;
    let profile_id = require_profile_id(app)?;

    let items = scope
        .run(app.backend.analyze_batch(&session, &profile_id, opportunity_ids))
        .await?;
    let mut stored = 0;
    for item in &items {
        if let Ok(analysis) = &item.outcome {
            if app.store.insert_analysis(analysis.clone()) {
                stored += 1;
            }
        }
    }
    info!(
        "Batch analysis: {} of {} stored",
        stored,
        opportunity_ids.len()
    );
    if stored > 0 {
        gamification::track(
            app,
            TrackedAction::CheckEligibility,
            json!({ "batch": true, "count": stored }),
        );
    }
    Ok(items)
}

/// Reopens a stored analysis by its reasoning id and puts it on its card.
///
/// The opportunity is loaded into the list first if needed. Nothing is tracked,
/// since no new eligibility check ran.
pub async fn fetch_result(
    app: &AppState,
    scope: &ViewScope,
    reasoning_id: &str,
) -> PortResult<EligibilityAnalysis> {
    if reasoning_id.trim().is_empty() {
        return Err(PortError::Validation("Reasoning id is required.".to_string()));
    }
    let session = app.require_session()?;
    let analysis = scope
        .run(app.backend.reasoning_result(&session, reasoning_id.trim()))
        .await?;
    load(app, scope, &analysis.opportunity_id).await?;
    app.store.insert_analysis(analysis.clone());
    Ok(analysis)
}

fn require_profile_id(app: &AppState) -> PortResult<String> {
    app.store
        .read(|s| {
            s.profile
                .as_ref()
                .map(|p| p.profile_id.clone())
                .or_else(|| s.session.as_ref().and_then(|s| s.profile_id.clone()))
        })
        .ok_or_else(|| {
            PortError::Validation("Create your profile before checking eligibility.".to_string())
        })
}
