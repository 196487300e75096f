//! services/client/src/adapters/wire.rs
//!
//! Wire-format records for the backend's JSON contract.
//!
//! Every response is parsed into one of these records first and then converted
//! with `to_domain()`, which checks the values the rest of the client relies on.
//! A response that does not fit fails here with `PortError::InvalidResponse`
//! instead of leaking half-filled structs into the views.

use chrono::{DateTime, NaiveDateTime, Utc};
use orbit_core::domain::{
    Achievement, ActionOutcome, AnalyticsSummary, Application, ApplicationStatistics,
    ApplicationStatus, BatchItem, Education, EligibilityAnalysis, EligibilityStatus, Experience,
    GamificationState, Insight, InsightPriority, Leaderboard, LeaderboardEntry, NewApplication,
    NextStep, Opportunity, OpportunityType, ParsedResume, PeerInsights, PeerStats, Priority,
    Profile, ProfileData, RankStats, Rarity, ResumeEvaluation, Session, Skills, StreakUpdate,
    SuccessStory, Task,
};
use orbit_core::ports::{PortError, PortResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

fn invalid(what: impl Into<String>) -> PortError {
    PortError::InvalidResponse(what.into())
}

/// Accepts strings, numbers and null for free-text fields the backend is loose about.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

/// Accepts RFC 3339 or the naive ISO form the backend writes (assumed UTC).
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc()),
        Err(e) => {
            debug!("Ignoring unparsable timestamp '{}': {}", raw, e);
            None
        }
    }
}

fn percent(raw: f64, field: &str) -> PortResult<u8> {
    if !raw.is_finite() || !(0.0..=100.0).contains(&raw) {
        return Err(invalid(format!("{} out of range: {}", field, raw)));
    }
    Ok(raw.round() as u8)
}

//=========================================================================================
// Errors
//=========================================================================================

/// Body of a 4xx/5xx response.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default, alias = "message")]
    pub error: Option<String>,
}

//=========================================================================================
// Auth
//=========================================================================================

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AuthRecord {
    #[serde(default)]
    session_token: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    profile_id: Option<String>,
}

impl AuthRecord {
    /// `fallback_email` is what the user typed; used when the server omits it.
    pub fn to_domain(self, fallback_email: &str) -> PortResult<Session> {
        let token = self
            .session_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid("auth response without session_token"))?;
        let user_id = self
            .user_id
            .filter(|u| !u.is_empty())
            .ok_or_else(|| invalid("auth response without user_id"))?;
        let email = self
            .email
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| fallback_email.trim().to_string());
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
        Ok(Session {
            token,
            user_id,
            email,
            name,
            profile_id: self.profile_id.filter(|p| !p.is_empty()),
        })
    }
}

//=========================================================================================
// Profile
//=========================================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EducationRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    degree: String,
    #[serde(default, deserialize_with = "lenient_string")]
    major: String,
    #[serde(default, deserialize_with = "lenient_string")]
    institution: String,
    #[serde(default, deserialize_with = "lenient_string")]
    year: String,
    #[serde(default, deserialize_with = "lenient_string")]
    cgpa_or_percentage: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SkillsRecord {
    #[serde(default)]
    programming_languages: Vec<String>,
    #[serde(default)]
    frameworks: Vec<String>,
    #[serde(default)]
    tools: Vec<String>,
    #[serde(default)]
    domains: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExperienceRecord {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    kind: String,
    #[serde(default, deserialize_with = "lenient_string")]
    title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    organization: String,
    #[serde(default, deserialize_with = "lenient_string")]
    duration: String,
    #[serde(default, deserialize_with = "lenient_string")]
    description: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProfileDataRecord {
    #[serde(default)]
    education: EducationRecord,
    #[serde(default)]
    skills: SkillsRecord,
    #[serde(default)]
    experience: Vec<ExperienceRecord>,
    #[serde(default)]
    achievements: Vec<String>,
    #[serde(default)]
    interests: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    self_description: String,
}

impl From<&ProfileData> for ProfileDataRecord {
    fn from(data: &ProfileData) -> Self {
        let e = &data.education;
        let s = &data.skills;
        Self {
            education: EducationRecord {
                degree: e.degree.clone(),
                major: e.major.clone(),
                institution: e.institution.clone(),
                year: e.year.clone(),
                cgpa_or_percentage: e.cgpa_or_percentage.clone(),
            },
            skills: SkillsRecord {
                programming_languages: s.programming_languages.clone(),
                frameworks: s.frameworks.clone(),
                tools: s.tools.clone(),
                domains: s.domains.clone(),
            },
            experience: data
                .experience
                .iter()
                .map(|x| ExperienceRecord {
                    kind: x.kind.clone(),
                    title: x.title.clone(),
                    organization: x.organization.clone(),
                    duration: x.duration.clone(),
                    description: x.description.clone(),
                })
                .collect(),
            achievements: data.achievements.clone(),
            interests: data.interests.clone(),
            self_description: data.self_description.clone(),
        }
    }
}

impl ProfileDataRecord {
    fn to_domain(self) -> ProfileData {
        ProfileData {
            education: Education {
                degree: self.education.degree,
                major: self.education.major,
                institution: self.education.institution,
                year: self.education.year,
                cgpa_or_percentage: self.education.cgpa_or_percentage,
            },
            skills: Skills {
                programming_languages: self.skills.programming_languages,
                frameworks: self.skills.frameworks,
                tools: self.skills.tools,
                domains: self.skills.domains,
            },
            experience: self
                .experience
                .into_iter()
                .map(|x| Experience {
                    kind: x.kind,
                    title: x.title,
                    organization: x.organization,
                    duration: x.duration,
                    description: x.description,
                })
                .collect(),
            achievements: self.achievements,
            interests: self.interests,
            self_description: self.self_description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    profile_id: Option<String>,
    #[serde(alias = "profile", default)]
    profile_data: Option<ProfileDataRecord>,
}

impl ProfileRecord {
    pub fn to_domain(self) -> PortResult<Profile> {
        let profile_id = self
            .profile_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| invalid("profile response without profile_id"))?;
        let data = self
            .profile_data
            .ok_or_else(|| invalid("profile response without profile_data"))?;
        Ok(Profile {
            profile_id,
            data: data.to_domain(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ParsedResumeRecord {
    #[serde(flatten)]
    profile: ProfileRecord,
    #[serde(default)]
    resume_grade: Option<String>,
    #[serde(default)]
    resume_summary: Option<String>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
    #[serde(default, alias = "search_suggestions")]
    suggestions: Vec<String>,
}

impl ParsedResumeRecord {
    pub fn to_domain(self) -> PortResult<ParsedResume> {
        let profile = self.profile.to_domain()?;
        let evaluation = if self.resume_grade.is_some() || self.resume_summary.is_some() {
            Some(ResumeEvaluation {
                grade: self.resume_grade.unwrap_or_default(),
                summary: self.resume_summary.unwrap_or_default(),
                strengths: self.strengths,
                improvements: self.improvements,
            })
        } else {
            None
        };
        Ok(ParsedResume {
            profile,
            evaluation,
            suggestions: self.suggestions,
        })
    }
}

//=========================================================================================
// Opportunities
//=========================================================================================

#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub opportunity_type: Option<&'a str>,
    pub user_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct OpportunityRecord {
    #[serde(default, alias = "id")]
    opportunity_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    organizer: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    deadline: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    snippet: String,
    #[serde(default, deserialize_with = "lenient_string")]
    link: String,
}

impl OpportunityRecord {
    pub fn to_domain(self) -> PortResult<Opportunity> {
        let opportunity_id = self
            .opportunity_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| invalid("opportunity without opportunity_id"))?;
        let title = self
            .title
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid(format!("opportunity {} without title", opportunity_id)))?;
        let opportunity_type = self
            .kind
            .as_deref()
            .map(|k| k.parse::<OpportunityType>().unwrap_or(OpportunityType::Other))
            .unwrap_or(OpportunityType::Other);
        Ok(Opportunity {
            opportunity_id,
            title,
            organizer: self.organizer,
            opportunity_type,
            deadline: self.deadline.filter(|d| !d.is_empty()),
            snippet: self.snippet,
            link: self.link,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct OpportunityListRecord {
    #[serde(default)]
    opportunities: Vec<OpportunityRecord>,
}

impl OpportunityListRecord {
    pub fn to_domain(self) -> PortResult<Vec<Opportunity>> {
        self.opportunities
            .into_iter()
            .map(OpportunityRecord::to_domain)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsRecord {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

//=========================================================================================
// Reasoning
//=========================================================================================

#[derive(Debug, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub profile_id: &'a str,
    pub opportunity_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct BatchRequest<'a> {
    pub profile_id: &'a str,
    pub opportunity_ids: &'a [String],
}

#[derive(Debug, Deserialize)]
pub struct NextStepRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    action: String,
    #[serde(default, deserialize_with = "lenient_string")]
    reason: String,
    #[serde(default, deserialize_with = "lenient_string")]
    time_estimate: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRecord {
    #[serde(default)]
    eligibility_status: Option<String>,
    #[serde(default, alias = "eligibility_score")]
    confidence_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    explanation_simple: String,
    #[serde(default)]
    reasons_met: Vec<String>,
    #[serde(default)]
    reasons_not_met: Vec<String>,
    #[serde(default)]
    missing_skills: Vec<String>,
    #[serde(default)]
    missing_experience: Vec<String>,
    #[serde(default)]
    next_steps: Vec<NextStepRecord>,
    #[serde(default)]
    cached: bool,
}

impl AnalysisRecord {
    /// The analysis is keyed by the id that was asked for, not by anything in the body.
    pub fn to_domain(self, opportunity_id: &str) -> PortResult<EligibilityAnalysis> {
        let raw_status = self
            .eligibility_status
            .ok_or_else(|| invalid("analysis without eligibility_status"))?;
        let status = raw_status
            .parse::<EligibilityStatus>()
            .map_err(|e| invalid(e.to_string()))?;
        let confidence_score = percent(
            self.confidence_score
                .ok_or_else(|| invalid("analysis without confidence_score"))?,
            "confidence_score",
        )?;
        Ok(EligibilityAnalysis {
            opportunity_id: opportunity_id.to_string(),
            status,
            confidence_score,
            explanation_simple: self.explanation_simple,
            reasons_met: self.reasons_met,
            reasons_not_met: self.reasons_not_met,
            missing_skills: self.missing_skills,
            missing_experience: self.missing_experience,
            next_steps: self
                .next_steps
                .into_iter()
                .map(|s| NextStep {
                    action: s.action,
                    reason: s.reason,
                    time_estimate: s.time_estimate,
                })
                .collect(),
            cached: self.cached,
            reasoning_id: None,
        })
    }
}

/// Reasoning ids the backend hands out when nothing was stored.
const UNSTORED_REASONING_IDS: [&str; 3] = ["fallback", "error", "unsaved"];

/// A reasoning response in either shape the backend produces.
///
/// A fresh analysis has its fields at the top level. A cached or fallback
/// result is the stored document, with the fields nested under `analysis`.
#[derive(Debug, Deserialize)]
pub struct AnalysisEnvelope {
    #[serde(default)]
    reasoning_id: Option<String>,
    #[serde(default)]
    opportunity_id: Option<String>,
    #[serde(default)]
    analysis: Option<AnalysisRecord>,
    #[serde(default)]
    cached: Option<bool>,
    #[serde(flatten)]
    flat: AnalysisRecord,
}

impl AnalysisEnvelope {
    /// Keyed by the requested id, like `AnalysisRecord::to_domain`.
    pub fn to_domain(self, opportunity_id: &str) -> PortResult<EligibilityAnalysis> {
        let mut record = self.analysis.unwrap_or(self.flat);
        if let Some(cached) = self.cached {
            record.cached = cached;
        }
        let mut analysis = record.to_domain(opportunity_id)?;
        analysis.reasoning_id = self
            .reasoning_id
            .filter(|id| !id.is_empty() && !UNSTORED_REASONING_IDS.contains(&id.as_str()));
        Ok(analysis)
    }

    /// A document fetched by reasoning id names its own opportunity.
    pub fn into_stored(self) -> PortResult<EligibilityAnalysis> {
        let opportunity_id = self
            .opportunity_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| invalid("reasoning result without opportunity_id"))?;
        self.to_domain(&opportunity_id)
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchItemRecord {
    opportunity_id: String,
    #[serde(default)]
    analysis: Option<AnalysisEnvelope>,
    #[serde(default)]
    cached: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRecord {
    #[serde(default)]
    results: Vec<BatchItemRecord>,
}

impl BatchRecord {
    pub fn to_domain(self) -> Vec<BatchItem> {
        self.results
            .into_iter()
            .map(|item| {
                let outcome = match (item.analysis, item.error) {
                    (Some(mut envelope), _) => {
                        if item.cached.is_some() {
                            envelope.cached = item.cached;
                        }
                        envelope
                            .to_domain(&item.opportunity_id)
                            .map_err(|e| e.to_string())
                    }
                    (None, Some(error)) => Err(error),
                    (None, None) => Err("no analysis returned".to_string()),
                };
                BatchItem {
                    opportunity_id: item.opportunity_id,
                    outcome,
                }
            })
            .collect()
    }
}

//=========================================================================================
// Gamification
//=========================================================================================

#[derive(Debug, Deserialize)]
pub struct TaskRecord {
    id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    description: String,
    #[serde(default)]
    points: u32,
    #[serde(default)]
    target: u32,
    #[serde(default)]
    progress: u32,
    #[serde(default)]
    completed: bool,
}

impl TaskRecord {
    fn to_domain(self) -> Task {
        Task {
            id: self.id,
            title: self.title,
            description: self.description,
            points: self.points,
            target: self.target,
            progress: self.progress,
            completed: self.completed,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AchievementRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    icon: String,
    #[serde(default)]
    points: u32,
    #[serde(default)]
    rarity: Option<Rarity>,
}

#[derive(Debug, Deserialize)]
pub struct GamificationRecord {
    level: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    level_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    level_icon: String,
    total_points: Option<u64>,
    #[serde(default)]
    progress_to_next: f64,
    #[serde(default)]
    login_streak: u32,
    #[serde(default)]
    daily_tasks: Vec<TaskRecord>,
    #[serde(default)]
    weekly_tasks: Vec<TaskRecord>,
    #[serde(default)]
    achievements: Vec<AchievementRecord>,
}

impl GamificationRecord {
    pub fn to_domain(self) -> PortResult<GamificationState> {
        let level = self
            .level
            .filter(|l| *l >= 1)
            .ok_or_else(|| invalid("gamification state without a level"))?;
        let total_points = self
            .total_points
            .ok_or_else(|| invalid("gamification state without total_points"))?;
        Ok(GamificationState {
            level,
            level_name: self.level_name,
            level_icon: self.level_icon,
            total_points,
            progress_to_next: self.progress_to_next.clamp(0.0, 100.0),
            login_streak: self.login_streak,
            daily_tasks: self.daily_tasks.into_iter().map(TaskRecord::to_domain).collect(),
            weekly_tasks: self.weekly_tasks.into_iter().map(TaskRecord::to_domain).collect(),
            achievements: self
                .achievements
                .into_iter()
                .map(|a| Achievement {
                    id: a.id,
                    name: a.name,
                    description: a.description,
                    icon: a.icon,
                    points: a.points,
                    rarity: a.rarity.unwrap_or(Rarity::Common),
                })
                .collect(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TrackActionRequest<'a> {
    pub user_id: &'a str,
    pub action: &'a str,
    pub metadata: &'a Value,
}

#[derive(Debug, Deserialize)]
pub struct ActionOutcomeRecord {
    #[serde(default = "default_true")]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    points_awarded: u32,
    #[serde(default)]
    new_total: u64,
    #[serde(default)]
    leveled_up: bool,
    #[serde(default)]
    task_completed: bool,
}

fn default_true() -> bool {
    true
}

impl ActionOutcomeRecord {
    pub fn to_domain(self) -> PortResult<ActionOutcome> {
        if !self.success {
            return Err(PortError::Server {
                status: 200,
                message: self.error.unwrap_or_default(),
            });
        }
        Ok(ActionOutcome {
            points_awarded: self.points_awarded,
            new_total: self.new_total,
            leveled_up: self.leveled_up,
            task_completed: self.task_completed,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StreakRecord {
    #[serde(default = "default_true")]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, alias = "streak")]
    login_streak: u32,
    #[serde(default)]
    points_awarded: u32,
}

impl StreakRecord {
    pub fn to_domain(self) -> PortResult<StreakUpdate> {
        if !self.success {
            return Err(PortError::Server {
                status: 200,
                message: self.error.unwrap_or_default(),
            });
        }
        Ok(StreakUpdate {
            login_streak: self.login_streak,
            points_awarded: self.points_awarded,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardEntryRecord {
    rank: u32,
    #[serde(default, deserialize_with = "lenient_string")]
    user_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
    #[serde(default)]
    points: u64,
    #[serde(default)]
    level: u32,
    #[serde(default, deserialize_with = "lenient_string")]
    level_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    level_icon: String,
    #[serde(default)]
    achievements_count: u32,
    #[serde(default)]
    login_streak: u32,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardRecord {
    #[serde(default)]
    leaderboard: Vec<LeaderboardEntryRecord>,
    #[serde(default)]
    user_rank: Option<u32>,
    #[serde(default)]
    total_users: u32,
    #[serde(default)]
    show_separator: Option<bool>,
}

impl LeaderboardRecord {
    pub fn to_domain(self) -> Leaderboard {
        Leaderboard {
            entries: self
                .leaderboard
                .into_iter()
                .map(|e| LeaderboardEntry {
                    rank: e.rank,
                    user_id: e.user_id,
                    name: e.name,
                    points: e.points,
                    level: e.level,
                    level_name: e.level_name,
                    level_icon: e.level_icon,
                    achievements_count: e.achievements_count,
                    login_streak: e.login_streak,
                })
                .collect(),
            user_rank: self.user_rank,
            total_users: self.total_users,
            show_separator: self.show_separator.unwrap_or(false),
        }
    }
}

//=========================================================================================
// Application tracker
//=========================================================================================

#[derive(Debug, Serialize)]
pub struct NewApplicationRecord<'a> {
    user_id: &'a str,
    opportunity_id: &'a str,
    opportunity_title: &'a str,
    opportunity_link: &'a str,
    deadline: Option<&'a str>,
    status: &'a str,
    priority: Priority,
    notes: &'a str,
    eligibility_score: Option<u8>,
}

impl<'a> From<&'a NewApplication> for NewApplicationRecord<'a> {
    fn from(app: &'a NewApplication) -> Self {
        Self {
            user_id: &app.user_id,
            opportunity_id: &app.opportunity_id,
            opportunity_title: &app.opportunity_title,
            opportunity_link: &app.opportunity_link,
            deadline: app.deadline.as_deref(),
            status: app.status.as_str(),
            priority: app.priority,
            notes: &app.notes,
            eligibility_score: app.eligibility_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusUpdateRequest<'a> {
    pub status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationRecord {
    id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    user_id: String,
    #[serde(default)]
    opportunity_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    opportunity_title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    opportunity_link: String,
    #[serde(default)]
    deadline: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default, deserialize_with = "lenient_string")]
    notes: String,
    #[serde(default)]
    eligibility_score: Option<f64>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl ApplicationRecord {
    pub fn to_domain(self) -> PortResult<Application> {
        let status = match self.status.as_deref() {
            None | Some("") => ApplicationStatus::Saved,
            Some(raw) => raw.parse::<ApplicationStatus>().map_err(invalid)?,
        };
        let eligibility_score = self
            .eligibility_score
            .map(|s| percent(s, "eligibility_score"))
            .transpose()?;
        Ok(Application {
            created_at: parse_timestamp(self.created_at.as_deref()),
            updated_at: parse_timestamp(self.updated_at.as_deref()),
            id: self.id,
            user_id: self.user_id,
            opportunity_id: self.opportunity_id,
            opportunity_title: self.opportunity_title,
            opportunity_link: self.opportunity_link,
            deadline: self.deadline,
            status,
            priority: self.priority.unwrap_or_default(),
            notes: self.notes,
            eligibility_score,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplicationListRecord {
    #[serde(default)]
    applications: Vec<ApplicationRecord>,
}

impl ApplicationListRecord {
    pub fn to_domain(self) -> PortResult<Vec<Application>> {
        self.applications
            .into_iter()
            .map(ApplicationRecord::to_domain)
            .collect()
    }
}

//=========================================================================================
// Analytics and peer content
//=========================================================================================

#[derive(Debug, Deserialize)]
pub struct StatisticsRecord {
    #[serde(default)]
    total_applications: u32,
    #[serde(default)]
    pending: u32,
    #[serde(default)]
    under_review: u32,
    #[serde(default)]
    accepted: u32,
    #[serde(default)]
    rejected: u32,
    #[serde(default)]
    avg_eligibility_score: f64,
    #[serde(default)]
    acceptance_rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsRecord {
    statistics: Option<StatisticsRecord>,
    #[serde(default)]
    generated_at: Option<String>,
}

impl AnalyticsRecord {
    pub fn to_domain(self) -> PortResult<AnalyticsSummary> {
        let s = self
            .statistics
            .ok_or_else(|| invalid("analytics without statistics"))?;
        Ok(AnalyticsSummary {
            statistics: ApplicationStatistics {
                total_applications: s.total_applications,
                pending: s.pending,
                under_review: s.under_review,
                accepted: s.accepted,
                rejected: s.rejected,
                avg_eligibility_score: s.avg_eligibility_score,
                acceptance_rate: s.acceptance_rate,
            },
            generated_at: parse_timestamp(self.generated_at.as_deref()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RankRecord {
    #[serde(default)]
    user_rank: Option<u32>,
    #[serde(default)]
    total_users: u32,
    #[serde(default)]
    percentile: f64,
}

impl RankRecord {
    pub fn to_domain(self) -> RankStats {
        RankStats {
            user_rank: self.user_rank,
            total_users: self.total_users,
            percentile: self.percentile,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InsightRecord {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    kind: String,
    #[serde(default, deserialize_with = "lenient_string")]
    icon: String,
    #[serde(default, deserialize_with = "lenient_string")]
    message: String,
    #[serde(default)]
    priority: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InsightListRecord {
    #[serde(default)]
    insights: Vec<InsightRecord>,
}

impl InsightListRecord {
    /// Highest priority first.
    pub fn to_domain(self) -> Vec<Insight> {
        let mut insights: Vec<Insight> = self
            .insights
            .into_iter()
            .map(|i| Insight {
                kind: i.kind,
                icon: i.icon,
                message: i.message,
                priority: match i.priority.as_deref() {
                    Some("high") => InsightPriority::High,
                    Some("medium") => InsightPriority::Medium,
                    _ => InsightPriority::Low,
                },
            })
            .collect();
        insights.sort_by(|a, b| b.priority.cmp(&a.priority));
        insights
    }
}

#[derive(Debug, Deserialize)]
pub struct SuccessStoryRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    college: String,
    #[serde(default, deserialize_with = "lenient_string")]
    initial_state: String,
    #[serde(default)]
    skills_learned: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    time_period: String,
    #[serde(default, deserialize_with = "lenient_string")]
    achievement: String,
    #[serde(default)]
    points_earned: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    key_action: String,
    #[serde(default)]
    is_real: bool,
}

#[derive(Debug, Deserialize)]
pub struct SuccessStoriesRecord {
    #[serde(default = "default_true")]
    success: bool,
    #[serde(default)]
    stories: Vec<SuccessStoryRecord>,
}

impl SuccessStoriesRecord {
    pub fn to_domain(self) -> PortResult<Vec<SuccessStory>> {
        if !self.success {
            return Err(invalid("success stories request reported failure"));
        }
        Ok(self
            .stories
            .into_iter()
            .map(|s| SuccessStory {
                id: s.id,
                name: s.name,
                college: s.college,
                initial_state: s.initial_state,
                skills_learned: s.skills_learned,
                time_period: s.time_period,
                achievement: s.achievement,
                points_earned: s.points_earned,
                key_action: s.key_action,
                is_real: s.is_real,
            })
            .collect())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PeerStatsRecord {
    #[serde(default)]
    points: f64,
    #[serde(default)]
    streak: f64,
    #[serde(default)]
    achievements: f64,
}

impl PeerStatsRecord {
    fn to_domain(&self) -> PeerStats {
        PeerStats {
            points: self.points.max(0.0).round() as u64,
            streak: self.streak.max(0.0).round() as u32,
            achievements: self.achievements.max(0.0).round() as u32,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PeerAveragesRecord {
    #[serde(default)]
    same_college: PeerStatsRecord,
    #[serde(default)]
    all_peers: PeerStatsRecord,
    #[serde(default)]
    total_peers: u32,
    #[serde(default)]
    college_peers: u32,
}

#[derive(Debug, Deserialize)]
pub struct PeerInsightsBody {
    #[serde(default)]
    your_stats: PeerStatsRecord,
    #[serde(default)]
    peer_averages: PeerAveragesRecord,
    #[serde(default)]
    insights: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PeerInsightsRecord {
    #[serde(default = "default_true")]
    success: bool,
    insights: Option<PeerInsightsBody>,
}

impl PeerInsightsRecord {
    pub fn to_domain(self) -> PortResult<PeerInsights> {
        let body = match (self.success, self.insights) {
            (true, Some(body)) => body,
            _ => return Err(invalid("peer insights request reported failure")),
        };
        Ok(PeerInsights {
            your_stats: body.your_stats.to_domain(),
            same_college: body.peer_averages.same_college.to_domain(),
            all_peers: body.peer_averages.all_peers.to_domain(),
            total_peers: body.peer_averages.total_peers,
            college_peers: body.peer_averages.college_peers,
            insights: body.insights,
            recommendations: body.recommendations,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct HealthRecord {
    #[serde(default)]
    pub status: Option<String>,
}
