//! crates/orbit_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the client's core logic.
//! The backend is reached only through these traits, so the flows can run
//! against the real HTTP gateway or any other implementation.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::domain::{
    ActionOutcome, AnalyticsSummary, Application, ApplicationStatus, BatchItem,
    EligibilityAnalysis, GamificationState, Insight, Leaderboard, NewApplication, Opportunity,
    OpportunityType, ParsedResume, PeerInsights, Profile, ProfileData, RankStats, Session,
    StreakUpdate, SuccessStory, TrackedAction,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// Fallback shown when the server fails without saying why.
pub const GENERIC_SERVER_MESSAGE: &str = "Something went wrong on our side. Please try again.";

/// A generic error type for all port operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// Input rejected before any request was made.
    #[error("Validation error: {0}")]
    Validation(String),
    /// No session (or no user id) is available for a call that needs one.
    #[error("Not logged in")]
    NotLoggedIn,
    /// The server refused the credentials or the token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The server answered with an error status. `message` is empty when the body had none.
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
    /// No response at all.
    #[error("Server unreachable: {0}")]
    Unreachable(String),
    #[error("Request timed out")]
    Timeout,
    /// The response did not match the expected schema.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Local storage error: {0}")]
    Storage(String),
    /// The view that issued the request went away before it finished.
    #[error("Request cancelled")]
    Cancelled,
}

impl PortError {
    /// The message a user should see for this error.
    pub fn user_message(&self) -> String {
        match self {
            PortError::Validation(msg) => msg.clone(),
            PortError::NotLoggedIn => "You are not logged in. Please log in first.".to_string(),
            PortError::Unauthorized(msg) if !msg.is_empty() => msg.clone(),
            PortError::Unauthorized(_) => "Invalid email or password.".to_string(),
            PortError::NotFound(what) => format!("Not found: {}", what),
            PortError::Server { message, .. } if !message.is_empty() => message.clone(),
            PortError::Server { .. } => GENERIC_SERVER_MESSAGE.to_string(),
            PortError::Unreachable(_) => {
                "Unable to reach server. Please check your connection.".to_string()
            }
            PortError::Timeout => {
                "The server took too long to respond. Please try again.".to_string()
            }
            PortError::InvalidResponse(_) => {
                "The server sent a response we could not understand.".to_string()
            }
            PortError::Storage(_) => "Could not access local storage.".to_string(),
            PortError::Cancelled => "Request cancelled.".to_string(),
        }
    }

    /// Errors raised before anything was sent over the network.
    pub fn is_client_side(&self) -> bool {
        matches!(self, PortError::Validation(_) | PortError::NotLoggedIn)
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> PortResult<Session>;

    async fn register(&self, email: &str, password: &str, name: &str) -> PortResult<Session>;

    /// Invalidates the token server-side.
    async fn logout(&self, session: &Session) -> PortResult<()>;
}

#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn parse_resume(
        &self,
        session: &Session,
        file_name: &str,
        contents: Bytes,
    ) -> PortResult<ParsedResume>;

    async fn create_profile(&self, session: &Session, data: &ProfileData) -> PortResult<Profile>;

    async fn get_profile(&self, session: &Session, profile_id: &str) -> PortResult<Profile>;

    /// Full replacement of an existing profile.
    async fn update_profile(
        &self,
        session: &Session,
        profile_id: &str,
        data: &ProfileData,
    ) -> PortResult<Profile>;
}

#[async_trait]
pub trait OpportunityService: Send + Sync {
    async fn search(
        &self,
        session: &Session,
        query: &str,
        opportunity_type: Option<OpportunityType>,
    ) -> PortResult<Vec<Opportunity>>;

    async fn cached_opportunities(
        &self,
        session: &Session,
        limit: u32,
        opportunity_type: Option<OpportunityType>,
    ) -> PortResult<Vec<Opportunity>>;

    async fn get_opportunity(&self, session: &Session, opportunity_id: &str)
        -> PortResult<Opportunity>;

    async fn suggestions(&self, session: &Session, profile_id: &str) -> PortResult<Vec<String>>;
}

#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn analyze(
        &self,
        session: &Session,
        profile_id: &str,
        opportunity_id: &str,
    ) -> PortResult<EligibilityAnalysis>;

    async fn analyze_batch(
        &self,
        session: &Session,
        profile_id: &str,
        opportunity_ids: &[String],
    ) -> PortResult<Vec<BatchItem>>;

    /// A stored analysis, looked up by the reasoning id it was saved under.
    async fn reasoning_result(
        &self,
        session: &Session,
        reasoning_id: &str,
    ) -> PortResult<EligibilityAnalysis>;
}

#[async_trait]
pub trait GamificationService: Send + Sync {
    async fn gamification_state(&self, session: &Session, user_id: &str)
        -> PortResult<GamificationState>;

    async fn track_action(
        &self,
        session: &Session,
        user_id: &str,
        action: TrackedAction,
        metadata: Value,
    ) -> PortResult<ActionOutcome>;

    async fn update_streak(&self, session: &Session, user_id: &str) -> PortResult<StreakUpdate>;

    async fn leaderboard(&self, session: &Session, user_id: &str, top: u32)
        -> PortResult<Leaderboard>;
}

#[async_trait]
pub trait TrackerService: Send + Sync {
    async fn create_application(
        &self,
        session: Option<&Session>,
        application: &NewApplication,
    ) -> PortResult<Application>;

    async fn list_applications(&self, session: &Session, user_id: &str)
        -> PortResult<Vec<Application>>;

    async fn update_application_status(
        &self,
        session: &Session,
        application_id: &str,
        status: ApplicationStatus,
        notes: Option<&str>,
    ) -> PortResult<()>;

    async fn delete_application(&self, session: &Session, application_id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait InsightsService: Send + Sync {
    async fn analytics(&self, session: &Session, user_id: &str) -> PortResult<AnalyticsSummary>;

    async fn rank_stats(&self, session: &Session, user_id: &str) -> PortResult<RankStats>;

    async fn insights(&self, session: &Session, user_id: &str) -> PortResult<Vec<Insight>>;

    async fn success_stories(&self, session: &Session, user_id: &str, limit: u32)
        -> PortResult<Vec<SuccessStory>>;

    async fn peer_insights(&self, session: &Session, user_id: &str) -> PortResult<PeerInsights>;

    /// Liveness of the backend; returns the reported status string.
    async fn health(&self) -> PortResult<String>;
}

/// Everything the backend offers. Implemented automatically for any type that
/// implements all the individual ports.
pub trait Backend:
    AuthService
    + ProfileService
    + OpportunityService
    + ReasoningService
    + GamificationService
    + TrackerService
    + InsightsService
{
}

impl<T> Backend for T where
    T: AuthService
        + ProfileService
        + OpportunityService
        + ReasoningService
        + GamificationService
        + TrackerService
        + InsightsService
{
}

/// Durable client-side key/value storage. Values are JSON documents.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Replaces the value atomically: readers see the old or the new value, never a mix.
    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;

    /// Removes every key this storage owns.
    async fn clear(&self) -> PortResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_falls_back_to_generic_message() {
        let err = PortError::Server {
            status: 500,
            message: String::new(),
        };
        assert_eq!(err.user_message(), GENERIC_SERVER_MESSAGE);

        let err = PortError::Server {
            status: 400,
            message: "Query required".into(),
        };
        assert_eq!(err.user_message(), "Query required");
    }

    #[test]
    fn unreachable_and_server_errors_read_differently() {
        let unreachable = PortError::Unreachable("connection refused".into()).user_message();
        let server = PortError::Server {
            status: 503,
            message: String::new(),
        }
        .user_message();
        let invalid = PortError::Unauthorized(String::new()).user_message();
        assert_ne!(unreachable, server);
        assert_ne!(unreachable, invalid);
        assert!(unreachable.contains("reach server"));
    }

    #[test]
    fn only_validation_and_login_are_client_side() {
        assert!(PortError::Validation("x".into()).is_client_side());
        assert!(PortError::NotLoggedIn.is_client_side());
        assert!(!PortError::Timeout.is_client_side());
    }
}
