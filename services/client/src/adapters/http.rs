//! services/client/src/adapters/http.rs
//!
//! The single gateway through which every backend call flows.
//!
//! It attaches the bearer token and a request id, applies the timeout and the
//! retry policy, and turns transport failures and error statuses into `PortError`.

use async_trait::async_trait;
use bytes::Bytes;
use orbit_core::domain::{
    ActionOutcome, AnalyticsSummary, Application, ApplicationStatus, BatchItem,
    EligibilityAnalysis, GamificationState, Insight, Leaderboard, NewApplication, Opportunity,
    OpportunityType, ParsedResume, PeerInsights, Profile, ProfileData, RankStats, Session,
    StreakUpdate, SuccessStory, TrackedAction,
};
use orbit_core::ports::{
    AuthService, GamificationService, InsightsService, OpportunityService, PortError, PortResult,
    ProfileService, ReasoningService, TrackerService,
};
use reqwest::{multipart, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::wire::{
    ActionOutcomeRecord, AnalysisEnvelope, AnalyticsRecord, ApplicationListRecord,
    ApplicationRecord, AuthRecord, BatchRecord, BatchRequest, AnalyzeRequest, ErrorBody,
    GamificationRecord, HealthRecord, InsightListRecord, LeaderboardRecord, LoginRequest,
    NewApplicationRecord, OpportunityListRecord, OpportunityRecord, ParsedResumeRecord,
    PeerInsightsRecord, ProfileDataRecord, ProfileRecord, RankRecord, RegisterRequest,
    SearchRequest, StatusUpdateRequest, StreakRecord, SuccessStoriesRecord, SuggestionsRecord,
    TrackActionRequest,
};
use crate::config::{Config, ConfigError};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Exponential backoff applied to transient failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// A failed connect never reached the server, so any method may be resent.
    /// Anything that may have been delivered is only resent for idempotent methods.
    fn should_retry(&self, method: &Method, failure: &Failure, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        if failure.connect {
            return true;
        }
        let idempotent = matches!(*method, Method::GET | Method::PUT | Method::DELETE);
        match &failure.error {
            PortError::Unreachable(_) | PortError::Timeout => idempotent,
            PortError::Server { status, .. } => idempotent && matches!(status, 502..=504),
            _ => false,
        }
    }
}

/// One failed attempt.
#[derive(Debug)]
struct Failure {
    error: PortError,
    /// The connection was never established.
    connect: bool,
}

impl From<PortError> for Failure {
    fn from(error: PortError) -> Self {
        Self {
            error,
            connect: false,
        }
    }
}

impl From<reqwest::Error> for Failure {
    fn from(err: reqwest::Error) -> Self {
        Self {
            connect: err.is_connect(),
            error: map_transport_error(err),
        }
    }
}

impl From<Failure> for PortError {
    fn from(failure: Failure) -> Self {
        failure.error
    }
}

pub struct HttpGateway {
    client: Client,
    base_url: String,
    health_timeout: Duration,
    retry: RetryPolicy,
}

impl HttpGateway {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            health_timeout: config.health_timeout,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff: config.retry_backoff,
            },
        })
    }

    fn request(&self, method: Method, path: &str, session: Option<&Session>) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        match session {
            Some(session) => builder.bearer_auth(&session.token),
            None => builder,
        }
    }

    /// Sends the request, retrying transient failures when the body can be replayed.
    async fn send(
        &self,
        method: &Method,
        path: &str,
        builder: RequestBuilder,
    ) -> PortResult<Response> {
        let mut attempt = 0;
        loop {
            let Some(replay) = builder.try_clone() else {
                // Streaming bodies (multipart uploads) go out exactly once.
                return Ok(self.send_once(path, builder).await?);
            };
            match self.send_once(path, replay).await {
                Ok(response) => return Ok(response),
                Err(failure) if self.retry.should_retry(method, &failure, attempt) => {
                    let delay = self.retry.delay(attempt);
                    warn!(
                        "{} {} failed ({}); retrying in {:?} (attempt {}/{})",
                        method,
                        path,
                        failure.error,
                        delay,
                        attempt + 1,
                        self.retry.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.into()),
            }
        }
    }

    async fn send_once(&self, path: &str, builder: RequestBuilder) -> Result<Response, Failure> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_default();
        if status.is_server_error() {
            error!("{} returned {}: {}", path, status, body);
        } else {
            debug!("{} returned {}: {}", path, status, message);
        }
        Err(map_status(status, path, message).into())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
    ) -> PortResult<T> {
        let builder = self.request(method.clone(), path, session);
        let response = self.send(&method, path, builder).await?;
        decode(response).await
    }

    /// The body is serialized into the builder up front, so it stays replayable.
    async fn call_json<B, T>(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
        body: &B,
    ) -> PortResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method.clone(), path, session).json(body);
        let response = self.send(&method, path, builder).await?;
        decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, session: &Session) -> PortResult<T> {
        self.call(Method::GET, path, Some(session)).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> PortResult<T> {
    let bytes = response.bytes().await.map_err(map_transport_error)?;
    // An empty body (e.g. 204) reads as `null`.
    let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &bytes
    };
    serde_json::from_slice(bytes).map_err(|e| PortError::InvalidResponse(e.to_string()))
}

fn map_transport_error(err: reqwest::Error) -> PortError {
    if err.is_timeout() {
        PortError::Timeout
    } else if err.is_decode() {
        PortError::InvalidResponse(err.to_string())
    } else {
        PortError::Unreachable(err.to_string())
    }
}

fn map_status(status: StatusCode, path: &str, message: String) -> PortError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized(message),
        StatusCode::NOT_FOUND if message.is_empty() => PortError::NotFound(path.to_string()),
        StatusCode::NOT_FOUND => PortError::NotFound(message),
        _ => PortError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

//=========================================================================================
// Port implementations
//=========================================================================================

#[async_trait]
impl AuthService for HttpGateway {
    async fn login(&self, email: &str, password: &str) -> PortResult<Session> {
        let body = LoginRequest { email, password };
        let record: AuthRecord = self
            .call_json(Method::POST, "/auth/login", None, &body)
            .await?;
        record.to_domain(email)
    }

    async fn register(&self, email: &str, password: &str, name: &str) -> PortResult<Session> {
        let body = RegisterRequest {
            email,
            password,
            name,
        };
        let record: AuthRecord = self
            .call_json(Method::POST, "/auth/register", None, &body)
            .await?;
        record.to_domain(email)
    }

    async fn logout(&self, session: &Session) -> PortResult<()> {
        let _: Value = self
            .call(Method::POST, "/auth/logout", Some(session))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileService for HttpGateway {
    async fn parse_resume(
        &self,
        session: &Session,
        file_name: &str,
        contents: Bytes,
    ) -> PortResult<ParsedResume> {
        let path = "/profile/parse_resume";
        let part = multipart::Part::bytes(contents.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| PortError::Validation(e.to_string()))?;
        let form = multipart::Form::new().part("resume", part);
        let builder = self
            .request(Method::POST, path, Some(session))
            .multipart(form);
        let response = self.send(&Method::POST, path, builder).await?;
        let record: ParsedResumeRecord = decode(response).await?;
        record.to_domain()
    }

    async fn create_profile(&self, session: &Session, data: &ProfileData) -> PortResult<Profile> {
        let body = ProfileDataRecord::from(data);
        let record: ProfileRecord = self
            .call_json(Method::POST, "/profile/create", Some(session), &body)
            .await?;
        record.to_domain()
    }

    async fn get_profile(&self, session: &Session, profile_id: &str) -> PortResult<Profile> {
        let record: ProfileRecord = self
            .get(&format!("/profile/{}", profile_id), session)
            .await?;
        record.to_domain()
    }

    async fn update_profile(
        &self,
        session: &Session,
        profile_id: &str,
        data: &ProfileData,
    ) -> PortResult<Profile> {
        let body = ProfileDataRecord::from(data);
        let record: ProfileRecord = self
            .call_json(
                Method::PUT,
                &format!("/profile/{}", profile_id),
                Some(session),
                &body,
            )
            .await?;
        record.to_domain()
    }
}

#[async_trait]
impl OpportunityService for HttpGateway {
    async fn search(
        &self,
        session: &Session,
        query: &str,
        opportunity_type: Option<OpportunityType>,
    ) -> PortResult<Vec<Opportunity>> {
        let body = SearchRequest {
            query,
            opportunity_type: opportunity_type.as_ref().map(|t| t.as_str()),
            user_id: &session.user_id,
        };
        let record: OpportunityListRecord = self
            .call_json(Method::POST, "/opportunities/search", Some(session), &body)
            .await?;
        record.to_domain()
    }

    async fn cached_opportunities(
        &self,
        session: &Session,
        limit: u32,
        opportunity_type: Option<OpportunityType>,
    ) -> PortResult<Vec<Opportunity>> {
        let path = "/opportunities/cached";
        let mut builder = self
            .request(Method::GET, path, Some(session))
            .query(&[("limit", limit.to_string())]);
        if let Some(kind) = opportunity_type {
            builder = builder.query(&[("type", kind.as_str())]);
        }
        let response = self.send(&Method::GET, path, builder).await?;
        let record: OpportunityListRecord = decode(response).await?;
        record.to_domain()
    }

    async fn get_opportunity(
        &self,
        session: &Session,
        opportunity_id: &str,
    ) -> PortResult<Opportunity> {
        let record: OpportunityRecord = self
            .get(&format!("/opportunities/{}", opportunity_id), session)
            .await?;
        record.to_domain()
    }

    async fn suggestions(&self, session: &Session, profile_id: &str) -> PortResult<Vec<String>> {
        let record: SuggestionsRecord = self
            .get(&format!("/opportunities/suggestions/{}", profile_id), session)
            .await?;
        Ok(record.suggestions)
    }
}

#[async_trait]
impl ReasoningService for HttpGateway {
    async fn analyze(
        &self,
        session: &Session,
        profile_id: &str,
        opportunity_id: &str,
    ) -> PortResult<EligibilityAnalysis> {
        let body = AnalyzeRequest {
            profile_id,
            opportunity_id,
        };
        let envelope: AnalysisEnvelope = self
            .call_json(Method::POST, "/reasoning/analyze", Some(session), &body)
            .await?;
        envelope.to_domain(opportunity_id)
    }

    async fn analyze_batch(
        &self,
        session: &Session,
        profile_id: &str,
        opportunity_ids: &[String],
    ) -> PortResult<Vec<BatchItem>> {
        let body = BatchRequest {
            profile_id,
            opportunity_ids,
        };
        let record: BatchRecord = self
            .call_json(Method::POST, "/reasoning/batch", Some(session), &body)
            .await?;
        Ok(record.to_domain())
    }

    async fn reasoning_result(
        &self,
        session: &Session,
        reasoning_id: &str,
    ) -> PortResult<EligibilityAnalysis> {
        let envelope: AnalysisEnvelope = self
            .get(&format!("/reasoning/results/{}", reasoning_id), session)
            .await?;
        envelope.into_stored()
    }
}

#[async_trait]
impl GamificationService for HttpGateway {
    async fn gamification_state(
        &self,
        session: &Session,
        user_id: &str,
    ) -> PortResult<GamificationState> {
        let record: GamificationRecord = self
            .get(&format!("/gamification/{}", user_id), session)
            .await?;
        record.to_domain()
    }

    async fn track_action(
        &self,
        session: &Session,
        user_id: &str,
        action: TrackedAction,
        metadata: Value,
    ) -> PortResult<ActionOutcome> {
        let body = TrackActionRequest {
            user_id,
            action: action.as_str(),
            metadata: &metadata,
        };
        let record: ActionOutcomeRecord = self
            .call_json(Method::POST, "/gamification/action", Some(session), &body)
            .await?;
        record.to_domain()
    }

    async fn update_streak(&self, session: &Session, user_id: &str) -> PortResult<StreakUpdate> {
        let record: StreakRecord = self
            .call(
                Method::POST,
                &format!("/gamification/streak/{}", user_id),
                Some(session),
            )
            .await?;
        record.to_domain()
    }

    async fn leaderboard(
        &self,
        session: &Session,
        user_id: &str,
        top: u32,
    ) -> PortResult<Leaderboard> {
        let path = "/gamification/leaderboard";
        let builder = self
            .request(Method::GET, path, Some(session))
            .query(&[("user_id", user_id.to_string()), ("top", top.to_string())]);
        let response = self.send(&Method::GET, path, builder).await?;
        let record: LeaderboardRecord = decode(response).await?;
        Ok(record.to_domain())
    }
}

#[async_trait]
impl TrackerService for HttpGateway {
    async fn create_application(
        &self,
        session: Option<&Session>,
        application: &NewApplication,
    ) -> PortResult<Application> {
        let body = NewApplicationRecord::from(application);
        let record: ApplicationRecord = self
            .call_json(Method::POST, "/applications", session, &body)
            .await?;
        record.to_domain()
    }

    async fn list_applications(
        &self,
        session: &Session,
        user_id: &str,
    ) -> PortResult<Vec<Application>> {
        let record: ApplicationListRecord = self
            .get(&format!("/applications/{}", user_id), session)
            .await?;
        record.to_domain()
    }

    async fn update_application_status(
        &self,
        session: &Session,
        application_id: &str,
        status: ApplicationStatus,
        notes: Option<&str>,
    ) -> PortResult<()> {
        let body = StatusUpdateRequest {
            status: status.as_str(),
            notes,
        };
        let _: Value = self
            .call_json(
                Method::PUT,
                &format!("/applications/{}/status", application_id),
                Some(session),
                &body,
            )
            .await?;
        Ok(())
    }

    async fn delete_application(&self, session: &Session, application_id: &str) -> PortResult<()> {
        let _: Value = self
            .call(
                Method::DELETE,
                &format!("/applications/{}", application_id),
                Some(session),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl InsightsService for HttpGateway {
    async fn analytics(&self, session: &Session, user_id: &str) -> PortResult<AnalyticsSummary> {
        let record: AnalyticsRecord = self
            .get(&format!("/analytics/{}", user_id), session)
            .await?;
        record.to_domain()
    }

    async fn rank_stats(&self, session: &Session, user_id: &str) -> PortResult<RankStats> {
        let record: RankRecord = self
            .get(&format!("/analytics/leaderboard/{}", user_id), session)
            .await?;
        Ok(record.to_domain())
    }

    async fn insights(&self, session: &Session, user_id: &str) -> PortResult<Vec<Insight>> {
        let record: InsightListRecord = self
            .get(&format!("/analytics/insights/{}", user_id), session)
            .await?;
        Ok(record.to_domain())
    }

    async fn success_stories(
        &self,
        session: &Session,
        user_id: &str,
        limit: u32,
    ) -> PortResult<Vec<SuccessStory>> {
        let path = "/success-stories";
        let builder = self
            .request(Method::GET, path, Some(session))
            .query(&[("user_id", user_id.to_string()), ("limit", limit.to_string())]);
        let response = self.send(&Method::GET, path, builder).await?;
        let record: SuccessStoriesRecord = decode(response).await?;
        record.to_domain()
    }

    async fn peer_insights(&self, session: &Session, user_id: &str) -> PortResult<PeerInsights> {
        let path = "/peer-insights";
        let builder = self
            .request(Method::GET, path, Some(session))
            .query(&[("user_id", user_id)]);
        let response = self.send(&Method::GET, path, builder).await?;
        let record: PeerInsightsRecord = decode(response).await?;
        record.to_domain()
    }

    async fn health(&self) -> PortResult<String> {
        let path = "/health";
        let builder = self
            .request(Method::GET, path, None)
            .timeout(self.health_timeout);
        let response = self.send_once(path, builder).await?;
        let record: HealthRecord = decode(response).await?;
        Ok(record.status.unwrap_or_else(|| "unknown".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
    }

    #[test]
    fn only_transient_failures_are_retried() {
        let policy = RetryPolicy {
            max_retries: 2,
            backoff: Duration::from_millis(1),
        };
        let gateway_error = Failure::from(PortError::Server {
            status: 503,
            message: String::new(),
        });
        assert!(policy.should_retry(&Method::GET, &gateway_error, 0));
        assert!(!policy.should_retry(&Method::POST, &gateway_error, 0));
        assert!(!policy.should_retry(&Method::GET, &PortError::Timeout.into(), 2));
        assert!(!policy.should_retry(&Method::GET, &PortError::Unauthorized(String::new()).into(), 0));
    }

    #[test]
    fn delivered_requests_are_only_resent_when_idempotent() {
        let policy = RetryPolicy {
            max_retries: 2,
            backoff: Duration::from_millis(1),
        };
        let refused = Failure {
            error: PortError::Unreachable("connection refused".into()),
            connect: true,
        };
        let reset = Failure::from(PortError::Unreachable("connection reset".into()));
        assert!(policy.should_retry(&Method::POST, &refused, 1));
        assert!(!policy.should_retry(&Method::POST, &reset, 0));
        assert!(policy.should_retry(&Method::PUT, &reset, 0));
    }

    fn gateway(api_url: String, max_retries: u32) -> HttpGateway {
        let config = Config {
            api_url,
            request_timeout: Duration::from_secs(2),
            max_retries,
            retry_backoff: Duration::from_millis(1),
            ..Config::default()
        };
        HttpGateway::new(&config).unwrap()
    }

    /// Accepts connections, reads the request, then hangs up without answering.
    async fn hang_up_server() -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                drop(socket);
            }
        });
        (url, accepted)
    }

    #[tokio::test]
    async fn refused_connection_is_flagged_as_connect_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let gateway = gateway(url, 0);
        let builder = gateway.request(Method::POST, "/applications", None);
        let failure = gateway.send_once("/applications", builder).await.unwrap_err();
        assert!(failure.connect);
        assert!(matches!(failure.error, PortError::Unreachable(_)));
    }

    #[tokio::test]
    async fn post_is_not_resent_after_the_server_hangs_up() {
        let (url, accepted) = hang_up_server().await;
        let gateway = gateway(url, 2);

        let result: PortResult<Value> = gateway
            .call_json(Method::POST, "/applications", None, &serde_json::json!({}))
            .await;
        assert!(result.is_err());
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn get_is_resent_after_the_server_hangs_up() {
        let (url, accepted) = hang_up_server().await;
        let gateway = gateway(url, 2);

        let result: PortResult<Value> = gateway.call(Method::GET, "/health", None).await;
        assert!(result.is_err());
        assert_eq!(accepted.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn client_build_failures_are_configuration_errors() {
        let err = crate::error::ClientError::from(ConfigError::HttpClient("no TLS backend".into()));
        assert!(matches!(err, crate::error::ClientError::Config(_)));
        assert!(!err.to_string().contains(&PortError::Unreachable(String::new()).user_message()));
    }

    #[test]
    fn statuses_map_to_port_errors() {
        assert_eq!(
            map_status(StatusCode::UNAUTHORIZED, "/auth/login", "Invalid credentials".into()),
            PortError::Unauthorized("Invalid credentials".into())
        );
        assert_eq!(
            map_status(StatusCode::NOT_FOUND, "/profile/p9", String::new()),
            PortError::NotFound("/profile/p9".into())
        );
        assert_eq!(
            map_status(StatusCode::INTERNAL_SERVER_ERROR, "/x", String::new()),
            PortError::Server {
                status: 500,
                message: String::new()
            }
        );
    }
}
