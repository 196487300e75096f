//! services/client/src/app/insights.rs
//!
//! Analytics, success stories and peer comparisons.

use super::AppState;
use orbit_core::domain::{AnalyticsReport, PeerInsights, SuccessStory};
use orbit_core::ports::PortResult;
use tracing::warn;

pub const DEFAULT_STORY_LIMIT: u32 = 5;

/// Fetches the three analytics parts concurrently. Only the summary is required.
pub async fn analytics(app: &AppState) -> PortResult<AnalyticsReport> {
    let session = app.require_session()?;
    let user_id = app.require_user_id()?;

    let (summary, rank, insights) = futures::join!(
        app.backend.analytics(&session, &user_id),
        app.backend.rank_stats(&session, &user_id),
        app.backend.insights(&session, &user_id),
    );

    let rank = rank
        .map_err(|e| warn!("Rank statistics unavailable: {}", e))
        .ok();
    let insights = insights
        .map_err(|e| warn!("Insights unavailable: {}", e))
        .ok();
    Ok(AnalyticsReport {
        summary: summary?,
        rank,
        insights,
    })
}

pub async fn success_stories(app: &AppState, limit: u32) -> PortResult<Vec<SuccessStory>> {
    let session = app.require_session()?;
    let user_id = app.require_user_id()?;
    app.backend.success_stories(&session, &user_id, limit).await
}

pub async fn peer_insights(app: &AppState) -> PortResult<PeerInsights> {
    let session = app.require_session()?;
    let user_id = app.require_user_id()?;
    app.backend.peer_insights(&session, &user_id).await
}

/// Backend liveness. Needs no session.
pub async fn health(app: &AppState) -> PortResult<String> {
    app.backend.health().await
}
