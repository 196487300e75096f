//! services/client/src/view.rs
//!
//! Plain-text rendering of the client state. Renderers are pure: they read a
//! `ClientState` snapshot and a `ViewState` and return lines of text.

use orbit_core::domain::{
    Achievement, AnalyticsReport, Application, EligibilityAnalysis, EligibilityStatus,
    GamificationState, Leaderboard, Opportunity, PeerInsights, PeerStats, Profile,
    ResumeEvaluation, SuccessStory, Task,
};
use orbit_core::store::ClientState;
use orbit_core::view::{Modal, ViewState};

const RULE: &str = "────────────────────────────────────────";

pub fn confidence_band(score: u8) -> &'static str {
    match score {
        80..=100 => "high confidence",
        50..=79 => "medium confidence",
        _ => "low confidence",
    }
}

fn status_marker(status: EligibilityStatus) -> &'static str {
    match status {
        EligibilityStatus::Eligible => "[✓]",
        EligibilityStatus::PartiallyEligible => "[~]",
        EligibilityStatus::NotEligible => "[…]",
    }
}

fn bullet_list(out: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push(format!("    {}:", heading));
    out.extend(items.iter().map(|item| format!("      • {}", item)));
}

//=========================================================================================
// Opportunities
//=========================================================================================

/// One opportunity card. The analysis detail only appears when the card is expanded.
pub fn render_opportunity_card(
    opportunity: &Opportunity,
    analysis: Option<&EligibilityAnalysis>,
    view: &ViewState,
) -> String {
    let mut out = vec![format!(
        "{} [{}] {}",
        opportunity.title, opportunity.opportunity_type, opportunity.opportunity_id
    )];
    if !opportunity.organizer.is_empty() {
        out.push(format!("  by {}", opportunity.organizer));
    }
    if let Some(deadline) = &opportunity.deadline {
        out.push(format!("  Deadline: {}", deadline));
    }
    if !opportunity.snippet.is_empty() {
        out.push(format!("  {}", opportunity.snippet));
    }
    if !opportunity.link.is_empty() {
        out.push(format!("  {}", opportunity.link));
    }

    match analysis {
        Some(analysis) => {
            out.push(format!(
                "  {} {} · {}% ({})",
                status_marker(analysis.status),
                analysis.status.label(),
                analysis.confidence_score,
                confidence_band(analysis.confidence_score)
            ));
            if !analysis.explanation_simple.is_empty() {
                out.push(format!("  {}", analysis.explanation_simple));
            }
            if view.is_expanded(&opportunity.opportunity_id) {
                out.extend(render_analysis_details(analysis));
            }
        }
        None if view.is_analyzing(&opportunity.opportunity_id) => {
            out.push("  Checking eligibility...".to_string());
        }
        None => {}
    }
    out.join("\n")
}

fn render_analysis_details(analysis: &EligibilityAnalysis) -> Vec<String> {
    let mut out = Vec::new();
    bullet_list(&mut out, "What you already have", &analysis.reasons_met);
    bullet_list(&mut out, "What is still missing", &analysis.reasons_not_met);
    bullet_list(&mut out, "Skills to learn", &analysis.missing_skills);
    bullet_list(&mut out, "Experience to gain", &analysis.missing_experience);
    if !analysis.next_steps.is_empty() {
        out.push("    Your roadmap:".to_string());
        for (i, step) in analysis.next_steps.iter().enumerate() {
            let estimate = if step.time_estimate.is_empty() {
                String::new()
            } else {
                format!(" ({})", step.time_estimate)
            };
            out.push(format!("      {}. {}{}", i + 1, step.action, estimate));
            if !step.reason.is_empty() {
                out.push(format!("         {}", step.reason));
            }
        }
    }
    if let Some(id) = &analysis.reasoning_id {
        out.push(format!("    Reference: {} (reopen with `orbit result {}`)", id, id));
    }
    out
}

pub fn render_opportunity_list(state: &ClientState, view: &ViewState) -> String {
    if state.opportunities.is_empty() {
        return "No opportunities yet. Try a search.".to_string();
    }
    state
        .opportunities
        .iter()
        .map(|o| render_opportunity_card(o, state.analyses.get(&o.opportunity_id), view))
        .collect::<Vec<_>>()
        .join(&format!("\n{}\n", RULE))
}

//=========================================================================================
// Profile
//=========================================================================================

pub fn render_profile(profile: &Profile) -> String {
    let data = &profile.data;
    let e = &data.education;
    let mut out = vec![
        format!("Profile {}", profile.profile_id),
        format!("  {} in {}, {} (year {})", e.degree, e.major, e.institution, e.year),
    ];
    if !e.cgpa_or_percentage.is_empty() {
        out.push(format!("  Grade: {}", e.cgpa_or_percentage));
    }
    let skills: Vec<&str> = data
        .skills
        .programming_languages
        .iter()
        .chain(&data.skills.frameworks)
        .chain(&data.skills.tools)
        .map(String::as_str)
        .collect();
    if !skills.is_empty() {
        out.push(format!("  Skills: {}", skills.join(", ")));
    }
    if !data.skills.domains.is_empty() {
        out.push(format!("  Domains: {}", data.skills.domains.join(", ")));
    }
    for x in &data.experience {
        out.push(format!("  - {} at {} [{}] {}", x.title, x.organization, x.kind, x.duration));
    }
    if !data.interests.is_empty() {
        out.push(format!("  Interests: {}", data.interests.join(", ")));
    }
    if !data.self_description.is_empty() {
        out.push(format!("  \"{}\"", data.self_description));
    }
    out.join("\n")
}

pub fn render_resume_evaluation(evaluation: &ResumeEvaluation) -> String {
    let mut out = vec![format!("Resume grade: {}", evaluation.grade)];
    if !evaluation.summary.is_empty() {
        out.push(format!("  {}", evaluation.summary));
    }
    bullet_list(&mut out, "Strengths", &evaluation.strengths);
    bullet_list(&mut out, "Improvements", &evaluation.improvements);
    out.join("\n")
}

//=========================================================================================
// Gamification
//=========================================================================================

fn progress_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 10.0).round()) as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(10 - filled))
}

fn render_task(task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    format!(
        "  [{}] {} {}/{} (+{} pts)",
        mark, task.title, task.progress, task.target, task.points
    )
}

fn render_achievement(achievement: &Achievement) -> String {
    format!(
        "  {} {} (+{} pts, {:?}): {}",
        achievement.icon,
        achievement.name,
        achievement.points,
        achievement.rarity,
        achievement.description
    )
}

pub fn render_gamification(state: &GamificationState) -> String {
    vec![
        format!(
            "{} Level {} · {} · {} pts",
            state.level_icon, state.level, state.level_name, state.total_points
        ),
        format!(
            "  {} {:.0}% to next level",
            progress_bar(state.progress_to_next),
            state.progress_to_next
        ),
        format!("  Login streak: {} day(s)", state.login_streak),
    ]
    .join("\n")
}

pub fn render_tasks(state: &GamificationState) -> String {
    let mut out = vec!["Daily tasks".to_string()];
    out.extend(state.daily_tasks.iter().map(render_task));
    out.push("Weekly tasks".to_string());
    out.extend(state.weekly_tasks.iter().map(render_task));
    out.join("\n")
}

pub fn render_achievements(state: &GamificationState) -> String {
    if state.achievements.is_empty() {
        return "No achievements yet.".to_string();
    }
    let mut out = vec![format!("Achievements ({})", state.achievements.len())];
    out.extend(state.achievements.iter().map(render_achievement));
    out.join("\n")
}

/// Rows for the top entries; the caller's own row follows a separator when it sits outside them.
pub fn render_leaderboard(board: &Leaderboard, user_id: Option<&str>) -> String {
    let mut out = vec![format!("Leaderboard ({} students)", board.total_users)];
    for (i, entry) in board.entries.iter().enumerate() {
        let last = i + 1 == board.entries.len();
        if board.show_separator && last && board.entries.len() > 1 {
            out.push("   ...".to_string());
        }
        let me = if user_id == Some(entry.user_id.as_str()) {
            " (you)"
        } else {
            ""
        };
        out.push(format!(
            "  #{:<3} {}{}  {} pts  {} {}  🔥{}",
            entry.rank,
            entry.name,
            me,
            entry.points,
            entry.level_icon,
            entry.level_name,
            entry.login_streak
        ));
    }
    if let Some(rank) = board.user_rank {
        out.push(format!("Your rank: #{}", rank));
    }
    out.join("\n")
}

pub fn render_dashboard(state: &ClientState, view: &ViewState) -> String {
    let mut out = Vec::new();
    match &state.session {
        Some(session) => out.push(format!("Welcome back, {}!", session.name)),
        None => out.push("Not logged in.".to_string()),
    }
    match &state.gamification {
        Some(g) => {
            out.push(render_gamification(g));
            let done = g.daily_tasks.iter().filter(|t| t.completed).count();
            out.push(format!(
                "  Daily tasks: {}/{} done · Achievements: {}",
                done,
                g.daily_tasks.len(),
                g.achievements.len()
            ));
        }
        None => out.push("Progress not loaded yet.".to_string()),
    }
    if state.profile.is_none() {
        out.push("Create your profile to unlock eligibility checks.".to_string());
    }
    if let Some(modal) = view.modal {
        out.push(RULE.to_string());
        out.push(render_modal(state, modal));
    }
    out.join("\n")
}

pub fn render_modal(state: &ClientState, modal: Modal) -> String {
    match modal {
        Modal::Tasks => state
            .gamification
            .as_ref()
            .map(render_tasks)
            .unwrap_or_else(|| "Progress not loaded yet.".to_string()),
        Modal::Achievements => state
            .gamification
            .as_ref()
            .map(render_achievements)
            .unwrap_or_else(|| "Progress not loaded yet.".to_string()),
        Modal::Leaderboard => state
            .leaderboard
            .as_ref()
            .map(|b| render_leaderboard(b, state.session.as_ref().map(|s| s.user_id.as_str())))
            .unwrap_or_else(|| "Leaderboard not loaded yet.".to_string()),
        Modal::ResumeEvaluation => state
            .resume_evaluation
            .as_ref()
            .map(render_resume_evaluation)
            .unwrap_or_else(|| "No resume evaluation available.".to_string()),
    }
}

//=========================================================================================
// Tracker, analytics, stories
//=========================================================================================

pub fn render_applications(applications: &[Application]) -> String {
    if applications.is_empty() {
        return "Your tracker is empty.".to_string();
    }
    applications
        .iter()
        .map(|a| {
            let score = a
                .eligibility_score
                .map(|s| format!(" · {}%", s))
                .unwrap_or_default();
            let deadline = a
                .deadline
                .as_deref()
                .map(|d| format!(" · due {}", d))
                .unwrap_or_default();
            let updated = a
                .updated_at
                .map(|t| format!(" · updated {}", t.format("%Y-%m-%d")))
                .unwrap_or_default();
            format!(
                "{}  {} [{} / {:?}]{}{}{}",
                a.id,
                a.opportunity_title,
                a.status.as_str(),
                a.priority,
                score,
                deadline,
                updated
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_analytics(report: &AnalyticsReport) -> String {
    let s = &report.summary.statistics;
    let mut out = vec![
        format!("Applications: {}", s.total_applications),
        format!(
            "  saved {} · under review {} · accepted {} · rejected {}",
            s.pending, s.under_review, s.accepted, s.rejected
        ),
        format!(
            "  Avg eligibility {:.0}% · acceptance rate {:.0}%",
            s.avg_eligibility_score, s.acceptance_rate
        ),
    ];
    if let Some(rank) = &report.rank {
        match rank.user_rank {
            Some(r) => out.push(format!(
                "  Rank #{} of {} (top {:.0}%)",
                r,
                rank.total_users,
                (100.0 - rank.percentile).max(0.0)
            )),
            None => out.push(format!("  {} students ranked", rank.total_users)),
        }
    }
    if let Some(insights) = &report.insights {
        out.extend(insights.iter().map(|i| format!("  {} {}", i.icon, i.message)));
    }
    out.join("\n")
}

pub fn render_stories(stories: &[SuccessStory]) -> String {
    if stories.is_empty() {
        return "No stories yet.".to_string();
    }
    stories
        .iter()
        .map(|s| {
            let mut out = vec![
                format!("{} ({}) · {}", s.name, s.college, s.achievement),
                format!("  Started: {}", s.initial_state),
                format!("  In {}: learned {}", s.time_period, s.skills_learned.join(", ")),
            ];
            if !s.key_action.is_empty() {
                out.push(format!("  Key step: {}", s.key_action));
            }
            out.join("\n")
        })
        .collect::<Vec<_>>()
        .join(&format!("\n{}\n", RULE))
}

fn peer_row(label: &str, stats: &PeerStats) -> String {
    format!(
        "  {:<14} {:>6} pts  {:>3} day streak  {:>3} achievements",
        label, stats.points, stats.streak, stats.achievements
    )
}

pub fn render_peer_insights(peers: &PeerInsights) -> String {
    let mut out = vec![
        "How you compare".to_string(),
        peer_row("You", &peers.your_stats),
        peer_row(
            &format!("College ({})", peers.college_peers),
            &peers.same_college,
        ),
        peer_row(&format!("All ({})", peers.total_peers), &peers.all_peers),
    ];
    out.extend(peers.insights.iter().map(|i| format!("  • {}", i)));
    if !peers.recommendations.is_empty() {
        out.push("Try next:".to_string());
        out.extend(peers.recommendations.iter().map(|r| format!("  • {}", r)));
    }
    out.join("\n")
}
