//! An in-process fake of the Orbit backend, plus fixtures that point a real
//! client (HTTP gateway + file storage) at it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use client_lib::app::AppState;
use client_lib::config::Config;
use serde_json::{json, Value};
use tempfile::TempDir;

pub const EMAIL: &str = "asha@campus.edu";
pub const PASSWORD: &str = "correct-horse";
pub const TOKEN: &str = "tok-asha";
pub const USER_ID: &str = "user-1";

/// What the fake has seen and how it should misbehave.
#[derive(Default)]
pub struct Recorded {
    /// (path, Authorization header) for every request.
    pub requests: Vec<(String, Option<String>)>,
    pub tracked: Vec<String>,
    pub streak_calls: u32,
    pub profiles: HashMap<String, Value>,
    pub next_profile: u32,
    pub applications: Vec<Value>,
    pub cached_calls: u32,
    /// Stored reasoning documents by reasoning id, in the nested form.
    pub reasoning: HashMap<String, Value>,
}

#[derive(Default)]
pub struct Behavior {
    pub fail_track: bool,
    pub fail_insights: bool,
    /// Fail the first N cached-opportunity calls with 503.
    pub cached_unavailable: u32,
    pub search_delay: Duration,
    pub analyze_delays: HashMap<String, Duration>,
    /// Search results by lowercased query. Unknown queries return nothing.
    pub results: HashMap<String, Vec<Value>>,
}

#[derive(Default)]
pub struct FakeBackend {
    pub recorded: Mutex<Recorded>,
    pub behavior: Mutex<Behavior>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        let fake = Self::default();
        {
            let mut b = fake.behavior.lock().unwrap();
            b.results.insert(
                "ai hackathon".to_string(),
                vec![
                    opportunity("x123", "Global AI Hackathon", "hackathon"),
                    opportunity("y456", "ML Research Internship", "internship"),
                ],
            );
            b.results.insert(
                "pair".to_string(),
                vec![
                    opportunity("A", "Alpha Fellowship", "fellowship"),
                    opportunity("B", "Beta Scholarship", "scholarship"),
                ],
            );
            b.results.insert(
                "other".to_string(),
                vec![opportunity("C", "Gamma Competition", "competition")],
            );
        }
        Arc::new(fake)
    }

    pub fn requests_to(&self, path: &str) -> Vec<Option<String>> {
        self.recorded
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, auth)| auth.clone())
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.recorded.lock().unwrap().requests.len()
    }

    fn record(&self, path: &str, headers: &HeaderMap) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.recorded
            .lock()
            .unwrap()
            .requests
            .push((path.to_string(), auth));
    }
}

pub fn opportunity(id: &str, title: &str, kind: &str) -> Value {
    json!({
        "opportunity_id": id,
        "title": title,
        "organizer": "Campus Labs",
        "type": kind,
        "deadline": "2026-12-01",
        "snippet": format!("{} for students", title),
        "link": format!("https://example.com/{}", id),
    })
}

fn analysis_for(id: &str) -> Value {
    match id {
        "x123" => json!({
            "eligibility_status": "partially_eligible",
            "confidence_score": 62,
            "explanation_simple": "You have the basics but no ML project yet.",
            "reasons_met": ["Knows Python"],
            "reasons_not_met": ["No ML project"],
            "missing_skills": ["PyTorch"],
            "missing_experience": ["Team hackathon"],
            "next_steps": [
                {"action": "Build a small image classifier", "reason": "Shows ML basics", "time_estimate": "2 weeks"}
            ],
            "cached": false
        }),
        "A" => json!({
            "eligibility_status": "Eligible",
            "eligibility_score": 91,
            "explanation_simple": "Strong match."
        }),
        "B" => json!({
            "eligibility_status": "Not Yet Eligible",
            "confidence_score": 35,
            "explanation_simple": "Needs more experience."
        }),
        _ => json!({
            "eligibility_status": "partially_eligible",
            "confidence_score": 50
        }),
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

type Fake = State<Arc<FakeBackend>>;

//=========================================================================================
// Handlers
//=========================================================================================

async fn login(State(fake): Fake, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    fake.record("/auth/login", &headers);
    if body["email"] == EMAIL && body["password"] == PASSWORD {
        Json(json!({
            "user_id": USER_ID,
            "email": EMAIL,
            "name": "Asha",
            "session_token": TOKEN
        }))
        .into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "Invalid credentials")
    }
}

async fn register(State(fake): Fake, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    fake.record("/auth/register", &headers);
    Json(json!({
        "user_id": USER_ID,
        "email": body["email"],
        "name": body["name"],
        "session_token": TOKEN
    }))
    .into_response()
}

async fn logout(State(fake): Fake, headers: HeaderMap) -> Response {
    fake.record("/auth/logout", &headers);
    Json(json!({ "message": "Logged out" })).into_response()
}

async fn create_profile(
    State(fake): Fake,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.record("/profile/create", &headers);
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Login required");
    }
    let mut recorded = fake.recorded.lock().unwrap();
    recorded.next_profile += 1;
    let id = format!("profile-{}", recorded.next_profile);
    recorded.profiles.insert(id.clone(), body.clone());
    Json(json!({ "profile_id": id, "profile_data": body })).into_response()
}

async fn parse_resume(State(fake): Fake, headers: HeaderMap, mut multipart: Multipart) -> Response {
    fake.record("/profile/parse_resume", &headers);
    let mut saw_resume = false;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("resume") {
            saw_resume = field.bytes().await.map(|b| b.starts_with(b"%PDF")).unwrap_or(false);
        }
    }
    if !saw_resume {
        return error(StatusCode::BAD_REQUEST, "No resume uploaded");
    }
    Json(json!({
        "profile_id": "profile-resume",
        "profile_data": {
            "education": {"degree": "B.Tech", "major": "CS", "institution": "IIT", "year": 3},
            "skills": {"programming_languages": ["Python"]}
        },
        "resume_grade": "B+",
        "resume_summary": "Solid fundamentals.",
        "strengths": ["Python"],
        "improvements": ["Add projects"],
        "search_suggestions": ["AI hackathon"]
    }))
    .into_response()
}

async fn get_profile(State(fake): Fake, headers: HeaderMap, UrlPath(id): UrlPath<String>) -> Response {
    fake.record("/profile/{id}", &headers);
    let recorded = fake.recorded.lock().unwrap();
    match recorded.profiles.get(&id) {
        Some(data) => Json(json!({ "profile_id": id, "profile_data": data })).into_response(),
        None => error(StatusCode::NOT_FOUND, "Profile not found"),
    }
}

async fn update_profile(
    State(fake): Fake,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
    Json(body): Json<Value>,
) -> Response {
    fake.record("/profile/{id}", &headers);
    let mut recorded = fake.recorded.lock().unwrap();
    if !recorded.profiles.contains_key(&id) {
        return error(StatusCode::NOT_FOUND, "Profile not found");
    }
    recorded.profiles.insert(id.clone(), body.clone());
    Json(json!({ "profile_id": id, "profile_data": body })).into_response()
}

async fn search(State(fake): Fake, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    fake.record("/opportunities/search", &headers);
    let query = body["query"].as_str().unwrap_or_default().to_lowercase();
    if query == "boom" {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Search provider down");
    }
    let (delay, results) = {
        let b = fake.behavior.lock().unwrap();
        (b.search_delay, b.results.get(&query).cloned().unwrap_or_default())
    };
    tokio::time::sleep(delay).await;
    Json(json!({ "opportunities": results, "count": results.len() })).into_response()
}

async fn cached(State(fake): Fake, headers: HeaderMap) -> Response {
    fake.record("/opportunities/cached", &headers);
    let unavailable = {
        let mut recorded = fake.recorded.lock().unwrap();
        recorded.cached_calls += 1;
        recorded.cached_calls <= fake.behavior.lock().unwrap().cached_unavailable
    };
    if unavailable {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Warming up");
    }
    Json(json!({ "opportunities": [opportunity("C", "Gamma Competition", "competition")] }))
        .into_response()
}

async fn get_opportunity(
    State(fake): Fake,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
) -> Response {
    fake.record("/opportunities/{id}", &headers);
    Json(opportunity(&id, &format!("Opportunity {}", id), "program")).into_response()
}

/// Answers the way the real service does: a fresh analysis comes back flat,
/// a repeat of the same (profile, opportunity) pair comes back as the stored
/// document with the analysis nested, and "F" hits the no-storage fallback.
async fn analyze(State(fake): Fake, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    fake.record("/reasoning/analyze", &headers);
    let id = body["opportunity_id"].as_str().unwrap_or_default().to_string();
    let profile_id = body["profile_id"].as_str().unwrap_or_default().to_string();
    let delay = fake
        .behavior
        .lock()
        .unwrap()
        .analyze_delays
        .get(&id)
        .copied()
        .unwrap_or_default();
    tokio::time::sleep(delay).await;

    if id == "F" {
        return Json(json!({
            "reasoning_id": "fallback",
            "analysis": {
                "eligibility_status": "Partially Eligible",
                "confidence_score": 50,
                "explanation_simple": "We could not complete a full analysis."
            },
            "analyzed_at": null
        }))
        .into_response();
    }

    let mut recorded = fake.recorded.lock().unwrap();
    let stored = recorded
        .reasoning
        .iter()
        .find(|(_, doc)| doc["profile_id"] == profile_id.as_str() && doc["opportunity_id"] == id.as_str())
        .map(|(reasoning_id, doc)| (reasoning_id.clone(), doc.clone()));
    if let Some((reasoning_id, mut doc)) = stored {
        doc["reasoning_id"] = json!(reasoning_id);
        doc["cached"] = json!(true);
        return Json(doc).into_response();
    }

    let reasoning_id = format!("r-{}", recorded.reasoning.len() + 1);
    let analysis = analysis_for(&id);
    recorded.reasoning.insert(
        reasoning_id.clone(),
        json!({
            "profile_id": profile_id,
            "opportunity_id": id,
            "analysis": analysis,
            "analyzed_at": "2026-10-19T09:30:00.000123"
        }),
    );
    let mut fresh = analysis;
    fresh["reasoning_id"] = json!(reasoning_id);
    fresh["cached"] = json!(false);
    Json(fresh).into_response()
}

async fn reasoning_result(
    State(fake): Fake,
    headers: HeaderMap,
    UrlPath(reasoning_id): UrlPath<String>,
) -> Response {
    fake.record("/reasoning/results/{id}", &headers);
    match fake.recorded.lock().unwrap().reasoning.get(&reasoning_id) {
        Some(doc) => Json(doc.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Result not found"),
    }
}

async fn batch(State(fake): Fake, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    fake.record("/reasoning/batch", &headers);
    let results: Vec<Value> = body["opportunity_ids"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|id| {
            let id = id.as_str().unwrap_or_default().to_string();
            if id == "missing" {
                json!({ "opportunity_id": id, "error": "Opportunity not found" })
            } else {
                json!({ "opportunity_id": id, "analysis": analysis_for(&id), "cached": true })
            }
        })
        .collect();
    Json(json!({ "results": results })).into_response()
}

async fn gamification_state(
    State(fake): Fake,
    headers: HeaderMap,
    UrlPath(user_id): UrlPath<String>,
) -> Response {
    fake.record("/gamification/{user_id}", &headers);
    Json(json!({
        "user_id": user_id,
        "level": 2,
        "level_name": "Explorer",
        "level_icon": "🧭",
        "total_points": 140,
        "progress_to_next": 40.0,
        "login_streak": 3,
        "daily_tasks": [
            {"id": "daily_search", "title": "Search 3 Opportunities", "description": "", "points": 15, "target": 3, "progress": 1, "completed": false}
        ],
        "weekly_tasks": [],
        "achievements": [
            {"id": "first_search", "name": "Curious Mind", "description": "First search", "icon": "🔍", "points": 10, "rarity": "common"}
        ]
    }))
    .into_response()
}

async fn track_action(State(fake): Fake, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    fake.record("/gamification/action", &headers);
    fake.recorded
        .lock()
        .unwrap()
        .tracked
        .push(body["action"].as_str().unwrap_or_default().to_string());
    if fake.behavior.lock().unwrap().fail_track {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Tracking broke");
    }
    Json(json!({ "success": true, "points_awarded": 5, "new_total": 145, "leveled_up": false }))
        .into_response()
}

async fn streak(State(fake): Fake, headers: HeaderMap, UrlPath(_user): UrlPath<String>) -> Response {
    fake.record("/gamification/streak/{user_id}", &headers);
    let mut recorded = fake.recorded.lock().unwrap();
    recorded.streak_calls += 1;
    if recorded.streak_calls > 1 {
        return Json(json!({ "success": true, "message": "Already logged in today" }))
            .into_response();
    }
    Json(json!({ "success": true, "streak": 4, "points_awarded": 5 })).into_response()
}

async fn leaderboard(State(fake): Fake, headers: HeaderMap) -> Response {
    fake.record("/gamification/leaderboard", &headers);
    Json(json!({
        "leaderboard": [
            {"rank": 1, "user_id": "user-9", "name": "Ravi", "points": 900, "level": 5, "level_name": "Trailblazer", "level_icon": "🚀", "achievements_count": 8, "login_streak": 12},
            {"rank": 7, "user_id": USER_ID, "name": "Asha", "points": 140, "level": 2, "level_name": "Explorer", "level_icon": "🧭", "achievements_count": 1, "login_streak": 3}
        ],
        "user_rank": 7,
        "total_users": 20,
        "show_separator": true
    }))
    .into_response()
}

async fn create_application(
    State(fake): Fake,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.record("/applications", &headers);
    let mut recorded = fake.recorded.lock().unwrap();
    let mut record = body.clone();
    record["id"] = json!(format!("app-{}", recorded.applications.len() + 1));
    record["created_at"] = json!("2026-10-19T09:15:00.000123");
    record["updated_at"] = json!("2026-10-19T09:15:00.000123");
    recorded.applications.push(record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn list_applications(
    State(fake): Fake,
    headers: HeaderMap,
    UrlPath(_user): UrlPath<String>,
) -> Response {
    fake.record("/applications/{id}", &headers);
    let applications = fake.recorded.lock().unwrap().applications.clone();
    Json(json!({ "applications": applications })).into_response()
}

async fn delete_application(
    State(fake): Fake,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
) -> Response {
    fake.record("/applications/{id}", &headers);
    let mut recorded = fake.recorded.lock().unwrap();
    let before = recorded.applications.len();
    recorded.applications.retain(|a| a["id"] != id.as_str());
    if recorded.applications.len() == before {
        return error(StatusCode::NOT_FOUND, "Application not found");
    }
    Json(json!({ "success": true })).into_response()
}

async fn update_status(
    State(fake): Fake,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
    Json(body): Json<Value>,
) -> Response {
    fake.record("/applications/{id}/status", &headers);
    let mut recorded = fake.recorded.lock().unwrap();
    match recorded.applications.iter_mut().find(|a| a["id"] == id.as_str()) {
        Some(app) => {
            app["status"] = body["status"].clone();
            Json(json!({ "success": true })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Application not found"),
    }
}

async fn analytics(State(fake): Fake, headers: HeaderMap, UrlPath(_u): UrlPath<String>) -> Response {
    fake.record("/analytics/{user_id}", &headers);
    Json(json!({
        "statistics": {
            "total_applications": 4, "pending": 2, "under_review": 1, "accepted": 1,
            "rejected": 0, "avg_eligibility_score": 71.5, "acceptance_rate": 25.0
        },
        "generated_at": "2026-10-19T09:00:00"
    }))
    .into_response()
}

async fn rank(State(fake): Fake, headers: HeaderMap, UrlPath(_u): UrlPath<String>) -> Response {
    fake.record("/analytics/leaderboard/{user_id}", &headers);
    Json(json!({ "user_rank": 7, "total_users": 20, "percentile": 65.0 })).into_response()
}

async fn insights(State(fake): Fake, headers: HeaderMap, UrlPath(_u): UrlPath<String>) -> Response {
    fake.record("/analytics/insights/{user_id}", &headers);
    if fake.behavior.lock().unwrap().fail_insights {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "");
    }
    Json(json!({ "insights": [
        {"type": "tip", "icon": "💡", "message": "Apply earlier", "priority": "low"},
        {"type": "success", "icon": "🎉", "message": "First acceptance!", "priority": "high"}
    ]}))
    .into_response()
}

async fn health(State(fake): Fake, headers: HeaderMap) -> Response {
    fake.record("/health", &headers);
    Json(json!({ "status": "healthy" })).into_response()
}

//=========================================================================================
// Fixtures
//=========================================================================================

pub fn router(fake: Arc<FakeBackend>) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/profile/create", post(create_profile))
        .route("/profile/parse_resume", post(parse_resume))
        .route("/profile/{id}", get(get_profile).put(update_profile))
        .route("/opportunities/search", post(search))
        .route("/opportunities/cached", get(cached))
        .route("/opportunities/{id}", get(get_opportunity))
        .route("/reasoning/analyze", post(analyze))
        .route("/reasoning/batch", post(batch))
        .route("/reasoning/results/{id}", get(reasoning_result))
        .route("/gamification/leaderboard", get(leaderboard))
        .route("/gamification/action", post(track_action))
        .route("/gamification/streak/{user_id}", post(streak))
        .route("/gamification/{user_id}", get(gamification_state))
        .route("/applications", post(create_application))
        .route(
            "/applications/{id}",
            get(list_applications).delete(delete_application),
        )
        .route("/applications/{id}/status", put(update_status))
        .route("/analytics/leaderboard/{user_id}", get(rank))
        .route("/analytics/insights/{user_id}", get(insights))
        .route("/analytics/{user_id}", get(analytics))
        .route("/health", get(health))
        .with_state(fake)
}

/// Serves the fake on a random local port and returns its base URL.
pub async fn spawn_backend(fake: Arc<FakeBackend>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get addr");
    let app = router(fake);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing listens on.
pub fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get addr");
    drop(listener);
    format!("http://{}", addr)
}

pub fn test_config(api_url: &str, data_dir: &Path) -> Config {
    Config {
        api_url: api_url.to_string(),
        data_dir: data_dir.to_path_buf(),
        request_timeout: Duration::from_secs(5),
        health_timeout: Duration::from_secs(1),
        max_retries: 0,
        retry_backoff: Duration::from_millis(10),
        ..Config::default()
    }
}

pub fn client(api_url: &str, data_dir: &Path) -> AppState {
    AppState::from_config(test_config(api_url, data_dir)).expect("Failed to build client")
}

/// A running fake plus a client with its own storage directory.
pub struct TestFixture {
    pub fake: Arc<FakeBackend>,
    pub base_url: String,
    pub app: AppState,
    pub dir: TempDir,
}

impl TestFixture {
    pub async fn new() -> Self {
        let fake = FakeBackend::new();
        let base_url = spawn_backend(fake.clone()).await;
        let dir = TempDir::new().expect("Failed to create temp dir");
        let app = client(&base_url, dir.path());
        Self {
            fake,
            base_url,
            app,
            dir,
        }
    }

    /// Another client process sharing this fixture's storage.
    pub fn restart(&self) -> AppState {
        client(&self.base_url, self.dir.path())
    }

    pub async fn login(&self) {
        client_lib::app::session::login(&self.app, EMAIL, PASSWORD)
            .await
            .expect("login failed");
    }
}

pub fn sample_profile() -> orbit_core::domain::ProfileData {
    let mut data = orbit_core::domain::ProfileData::default();
    data.education.degree = "B.Tech".to_string();
    data.education.major = "Computer Science".to_string();
    data.education.institution = "State University".to_string();
    data.education.year = "3".to_string();
    data.skills.programming_languages = vec!["Python".to_string(), "Rust".to_string()];
    data.interests = vec!["AI".to_string()];
    data
}
