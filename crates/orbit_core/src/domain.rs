//! crates/orbit_core/src/domain.rs
//!
//! Defines the core data structures for the client.
//! Wire formats live in the HTTP adapter; these types are what the rest of the
//! application sees once a response has been validated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Session
//=========================================================================================

/// An authenticated login. Persisted as one document so it is written all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub name: String,
    /// Profile linked to the account on the backend, if any.
    pub profile_id: Option<String>,
}

//=========================================================================================
// Profile
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub major: String,
    pub institution: String,
    pub year: String,
    pub cgpa_or_percentage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    pub programming_languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub tools: Vec<String>,
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    /// internship, project, job, ...
    pub kind: String,
    pub title: String,
    pub organization: String,
    pub duration: String,
    pub description: String,
}

/// Everything the user describes about themselves. This is the body of a create or
/// full-replacement update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    pub education: Education,
    pub skills: Skills,
    pub experience: Vec<Experience>,
    pub achievements: Vec<String>,
    pub interests: Vec<String>,
    pub self_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub profile_id: String,
    pub data: ProfileData,
}

/// How the profile in the current session came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOrigin {
    Resume,
    Manual,
    /// Loaded from the local cache or fetched; not created in this session.
    Restored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeEvaluation {
    pub grade: String,
    pub summary: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

/// Result of uploading a resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResume {
    pub profile: Profile,
    pub evaluation: Option<ResumeEvaluation>,
    pub suggestions: Vec<String>,
}

//=========================================================================================
// Opportunities
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityType {
    Hackathon,
    Internship,
    Fellowship,
    Scholarship,
    Competition,
    Program,
    Other,
}

impl OpportunityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityType::Hackathon => "hackathon",
            OpportunityType::Internship => "internship",
            OpportunityType::Fellowship => "fellowship",
            OpportunityType::Scholarship => "scholarship",
            OpportunityType::Competition => "competition",
            OpportunityType::Program => "program",
            OpportunityType::Other => "other",
        }
    }
}

impl fmt::Display for OpportunityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpportunityType {
    type Err = std::convert::Infallible;

    /// Unknown kinds are kept as `Other` rather than rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "hackathon" => OpportunityType::Hackathon,
            "internship" => OpportunityType::Internship,
            "fellowship" => OpportunityType::Fellowship,
            "scholarship" => OpportunityType::Scholarship,
            "competition" => OpportunityType::Competition,
            "program" => OpportunityType::Program,
            _ => OpportunityType::Other,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub opportunity_id: String,
    pub title: String,
    pub organizer: String,
    pub opportunity_type: OpportunityType,
    pub deadline: Option<String>,
    pub snippet: String,
    pub link: String,
}

//=========================================================================================
// Eligibility
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityStatus {
    Eligible,
    PartiallyEligible,
    NotEligible,
}

impl EligibilityStatus {
    /// The label shown to students. Never a bare "not eligible".
    pub fn label(&self) -> &'static str {
        match self {
            EligibilityStatus::Eligible => "Eligible",
            EligibilityStatus::PartiallyEligible => "Partially Eligible",
            EligibilityStatus::NotEligible => "Not Yet Eligible",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown eligibility status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for EligibilityStatus {
    type Err = UnknownStatus;

    /// Accepts both the label convention ("Partially Eligible") and the
    /// snake_case convention ("partially_eligible").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_lowercase() })
            .collect();
        match normalized.as_str() {
            "eligible" => Ok(EligibilityStatus::Eligible),
            "partially_eligible" => Ok(EligibilityStatus::PartiallyEligible),
            "not_eligible" | "not_yet_eligible" => Ok(EligibilityStatus::NotEligible),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextStep {
    pub action: String,
    pub reason: String,
    pub time_estimate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityAnalysis {
    pub opportunity_id: String,
    pub status: EligibilityStatus,
    /// 0..=100
    pub confidence_score: u8,
    pub explanation_simple: String,
    pub reasons_met: Vec<String>,
    pub reasons_not_met: Vec<String>,
    pub missing_skills: Vec<String>,
    pub missing_experience: Vec<String>,
    pub next_steps: Vec<NextStep>,
    /// Whether the backend served this from its own reasoning cache.
    pub cached: bool,
    /// Id of the stored reasoning document, when the backend kept one.
    #[serde(default)]
    pub reasoning_id: Option<String>,
}

/// One item of a batch analysis. Failures are reported per opportunity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub opportunity_id: String,
    pub outcome: Result<EligibilityAnalysis, String>,
}

//=========================================================================================
// Gamification
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub points: u32,
    pub target: u32,
    pub progress: u32,
    pub completed: bool,
}

impl Task {
    pub fn percentage(&self) -> u32 {
        if self.target == 0 {
            return 100;
        }
        (self.progress.saturating_mul(100) / self.target).min(100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub points: u32,
    pub rarity: Rarity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamificationState {
    pub level: u32,
    pub level_name: String,
    pub level_icon: String,
    pub total_points: u64,
    /// Percentage towards the next level, 0.0..=100.0.
    pub progress_to_next: f64,
    pub login_streak: u32,
    pub daily_tasks: Vec<Task>,
    pub weekly_tasks: Vec<Task>,
    pub achievements: Vec<Achievement>,
}

/// Actions the backend awards points for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedAction {
    SearchOpportunity,
    CheckEligibility,
    SaveToTracker,
    ApplySubmitted,
    StatusUpdate,
    ProfileUpdate,
    ResumeUpload,
}

impl TrackedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedAction::SearchOpportunity => "search_opportunity",
            TrackedAction::CheckEligibility => "check_eligibility",
            TrackedAction::SaveToTracker => "save_to_tracker",
            TrackedAction::ApplySubmitted => "apply_submitted",
            TrackedAction::StatusUpdate => "status_update",
            TrackedAction::ProfileUpdate => "profile_update",
            TrackedAction::ResumeUpload => "resume_upload",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub points_awarded: u32,
    pub new_total: u64,
    pub leveled_up: bool,
    pub task_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakUpdate {
    pub login_streak: u32,
    pub points_awarded: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub name: String,
    pub points: u64,
    pub level: u32,
    pub level_name: String,
    pub level_icon: String,
    pub achievements_count: u32,
    pub login_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    pub user_rank: Option<u32>,
    pub total_users: u32,
    /// The caller sits outside the top entries and is appended after a separator.
    pub show_separator: bool,
}

//=========================================================================================
// Application tracker
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Saved,
    Applied,
    UnderReview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Saved => "saved",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(' ', "_").as_str() {
            "saved" | "pending" => Ok(ApplicationStatus::Saved),
            "applied" => Ok(ApplicationStatus::Applied),
            "under_review" => Ok(ApplicationStatus::UnderReview),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("unknown application status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// The body of a tracker save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub user_id: String,
    pub opportunity_id: String,
    pub opportunity_title: String,
    pub opportunity_link: String,
    pub deadline: Option<String>,
    pub status: ApplicationStatus,
    pub priority: Priority,
    pub notes: String,
    pub eligibility_score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: String,
    pub user_id: String,
    pub opportunity_id: Option<String>,
    pub opportunity_title: String,
    pub opportunity_link: String,
    pub deadline: Option<String>,
    pub status: ApplicationStatus,
    pub priority: Priority,
    pub notes: String,
    pub eligibility_score: Option<u8>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

//=========================================================================================
// Analytics and peer content
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationStatistics {
    pub total_applications: u32,
    pub pending: u32,
    pub under_review: u32,
    pub accepted: u32,
    pub rejected: u32,
    pub avg_eligibility_score: f64,
    pub acceptance_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSummary {
    pub statistics: ApplicationStatistics,
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankStats {
    pub user_rank: Option<u32>,
    pub total_users: u32,
    pub percentile: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InsightPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insight {
    /// success, warning, tip, achievement
    pub kind: String,
    pub icon: String,
    pub message: String,
    pub priority: InsightPriority,
}

/// Everything the analytics view shows. Parts other than the summary are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsReport {
    pub summary: AnalyticsSummary,
    pub rank: Option<RankStats>,
    pub insights: Option<Vec<Insight>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessStory {
    pub id: String,
    pub name: String,
    pub college: String,
    pub initial_state: String,
    pub skills_learned: Vec<String>,
    pub time_period: String,
    pub achievement: String,
    pub points_earned: u64,
    pub key_action: String,
    pub is_real: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeerStats {
    pub points: u64,
    pub streak: u32,
    pub achievements: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInsights {
    pub your_stats: PeerStats,
    pub same_college: PeerStats,
    pub all_peers: PeerStats,
    pub total_peers: u32,
    pub college_peers: u32,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_both_conventions() {
        assert_eq!("Eligible".parse(), Ok(EligibilityStatus::Eligible));
        assert_eq!("eligible".parse(), Ok(EligibilityStatus::Eligible));
        assert_eq!(
            "Partially Eligible".parse(),
            Ok(EligibilityStatus::PartiallyEligible)
        );
        assert_eq!(
            "partially_eligible".parse(),
            Ok(EligibilityStatus::PartiallyEligible)
        );
        assert_eq!("Not Yet Eligible".parse(), Ok(EligibilityStatus::NotEligible));
        assert_eq!("not_eligible".parse(), Ok(EligibilityStatus::NotEligible));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "maybe".parse::<EligibilityStatus>().unwrap_err();
        assert_eq!(err, UnknownStatus("maybe".to_string()));
    }

    #[test]
    fn not_eligible_is_never_shown_bare() {
        assert_eq!(EligibilityStatus::NotEligible.label(), "Not Yet Eligible");
        assert_eq!(EligibilityStatus::PartiallyEligible.label(), "Partially Eligible");
    }

    #[test]
    fn unknown_opportunity_type_becomes_other() {
        assert_eq!("Hackathon".parse(), Ok(OpportunityType::Hackathon));
        assert_eq!("meetup".parse(), Ok(OpportunityType::Other));
    }

    #[test]
    fn task_percentage_is_capped() {
        let task = Task {
            id: "daily_search".into(),
            title: "Search 3 Opportunities".into(),
            description: String::new(),
            points: 15,
            target: 3,
            progress: 5,
            completed: true,
        };
        assert_eq!(task.percentage(), 100);
        let half = Task { progress: 1, target: 2, ..task };
        assert_eq!(half.percentage(), 50);
    }

    #[test]
    fn application_status_accepts_labels() {
        assert_eq!("Under Review".parse(), Ok(ApplicationStatus::UnderReview));
        assert_eq!("pending".parse(), Ok(ApplicationStatus::Saved));
        assert!("lost".parse::<ApplicationStatus>().is_err());
    }
}
