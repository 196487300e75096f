//! crates/orbit_core/src/store.rs
//!
//! The single owned store for client state. Every flow reads and writes through
//! an `AppStore` handle; views subscribe to changes instead of polling globals.

use std::collections::HashMap;

use tokio::sync::watch;
use tracing::debug;

use crate::domain::{
    EligibilityAnalysis, GamificationState, Leaderboard, Opportunity, Profile, ProfileOrigin,
    ResumeEvaluation, Session,
};

/// A snapshot of everything the client knows.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    pub session: Option<Session>,
    pub profile: Option<Profile>,
    pub profile_origin: Option<ProfileOrigin>,
    pub resume_evaluation: Option<ResumeEvaluation>,
    pub search_suggestions: Vec<String>,
    pub opportunities: Vec<Opportunity>,
    /// Keyed by opportunity id, only for ids in `opportunities`.
    pub analyses: HashMap<String, EligibilityAnalysis>,
    pub gamification: Option<GamificationState>,
    pub leaderboard: Option<Leaderboard>,
}

impl ClientState {
    /// The id used for per-user calls: the session's user, else the profile.
    pub fn resolved_user_id(&self) -> Option<String> {
        self.session
            .as_ref()
            .map(|s| s.user_id.clone())
            .or_else(|| self.profile.as_ref().map(|p| p.profile_id.clone()))
    }

    pub fn opportunity(&self, opportunity_id: &str) -> Option<&Opportunity> {
        self.opportunities
            .iter()
            .find(|o| o.opportunity_id == opportunity_id)
    }
}

/// Cheaply cloneable handle to the shared client state.
#[derive(Clone)]
pub struct AppStore {
    tx: watch::Sender<ClientState>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ClientState::default());
        Self { tx }
    }

    /// A receiver that is notified after every update.
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.tx.subscribe()
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> ClientState {
        self.tx.borrow().clone()
    }

    /// Reads a projection of the state without cloning all of it.
    pub fn read<R>(&self, f: impl FnOnce(&ClientState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Applies `f` and notifies subscribers.
    pub fn update(&self, f: impl FnOnce(&mut ClientState)) {
        self.tx.send_modify(f);
    }

    pub fn session(&self) -> Option<Session> {
        self.read(|s| s.session.clone())
    }

    pub fn profile(&self) -> Option<Profile> {
        self.read(|s| s.profile.clone())
    }

    pub fn set_session(&self, session: Session) {
        self.update(|s| s.session = Some(session));
    }

    pub fn set_profile(&self, profile: Profile, origin: ProfileOrigin) {
        self.update(|s| {
            s.profile = Some(profile);
            s.profile_origin = Some(origin);
        });
    }

    /// Replaces the result list. Analyses for opportunities not in the new list are dropped.
    pub fn replace_opportunities(&self, opportunities: Vec<Opportunity>) {
        self.update(|s| {
            s.analyses.retain(|id, _| {
                opportunities.iter().any(|o| &o.opportunity_id == id)
            });
            s.opportunities = opportunities;
        });
    }

    /// Stores an analysis under its opportunity id. Returns false when the
    /// opportunity is no longer part of the current list.
    pub fn insert_analysis(&self, analysis: EligibilityAnalysis) -> bool {
        let mut stored = false;
        self.update(|s| {
            if s.opportunity(&analysis.opportunity_id).is_some() {
                s.analyses
                    .insert(analysis.opportunity_id.clone(), analysis);
                stored = true;
            } else {
                debug!(
                    "Discarding analysis for {}: not in the current result list",
                    analysis.opportunity_id
                );
            }
        });
        stored
    }

    pub fn set_gamification(&self, state: GamificationState) {
        self.update(|s| s.gamification = Some(state));
    }

    pub fn set_leaderboard(&self, leaderboard: Leaderboard) {
        self.update(|s| s.leaderboard = Some(leaderboard));
    }

    /// Drops everything. Used on logout.
    pub fn clear(&self) {
        self.update(|s| *s = ClientState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EligibilityStatus, OpportunityType, ProfileData};

    fn opportunity(id: &str) -> Opportunity {
        Opportunity {
            opportunity_id: id.to_string(),
            title: format!("Opportunity {}", id),
            organizer: "Org".to_string(),
            opportunity_type: OpportunityType::Hackathon,
            deadline: None,
            snippet: String::new(),
            link: format!("https://example.com/{}", id),
        }
    }

    fn analysis(id: &str, score: u8) -> EligibilityAnalysis {
        EligibilityAnalysis {
            opportunity_id: id.to_string(),
            status: EligibilityStatus::Eligible,
            confidence_score: score,
            explanation_simple: String::new(),
            reasons_met: vec![],
            reasons_not_met: vec![],
            missing_skills: vec![],
            missing_experience: vec![],
            next_steps: vec![],
            cached: false,
            reasoning_id: None,
        }
    }

    fn session() -> Session {
        Session {
            token: "tok".into(),
            user_id: "user-1".into(),
            email: "a@b.c".into(),
            name: "A".into(),
            profile_id: None,
        }
    }

    #[test]
    fn new_search_drops_analyses_for_missing_opportunities() {
        let store = AppStore::new();
        store.replace_opportunities(vec![opportunity("a"), opportunity("b")]);
        assert!(store.insert_analysis(analysis("a", 10)));
        assert!(store.insert_analysis(analysis("b", 20)));

        store.replace_opportunities(vec![opportunity("b"), opportunity("c")]);

        let state = store.snapshot();
        assert!(!state.analyses.contains_key("a"));
        assert_eq!(state.analyses["b"].confidence_score, 20);
        assert_eq!(state.opportunities.len(), 2);
    }

    #[test]
    fn analysis_for_unknown_opportunity_is_discarded() {
        let store = AppStore::new();
        store.replace_opportunities(vec![opportunity("a")]);
        assert!(!store.insert_analysis(analysis("zzz", 50)));
        assert!(store.snapshot().analyses.is_empty());
    }

    #[test]
    fn analyses_are_keyed_independently() {
        let store = AppStore::new();
        store.replace_opportunities(vec![opportunity("a"), opportunity("b")]);
        store.insert_analysis(analysis("b", 80));
        store.insert_analysis(analysis("a", 30));
        let state = store.snapshot();
        assert_eq!(state.analyses["a"].confidence_score, 30);
        assert_eq!(state.analyses["b"].confidence_score, 80);
    }

    #[test]
    fn resolved_user_id_falls_back_to_profile() {
        let store = AppStore::new();
        assert_eq!(store.snapshot().resolved_user_id(), None);

        store.set_profile(
            Profile {
                profile_id: "profile-9".into(),
                data: ProfileData::default(),
            },
            ProfileOrigin::Manual,
        );
        assert_eq!(store.snapshot().resolved_user_id().as_deref(), Some("profile-9"));

        store.set_session(session());
        assert_eq!(store.snapshot().resolved_user_id().as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let store = AppStore::new();
        let mut rx = store.subscribe();
        store.set_session(session());
        rx.changed().await.unwrap();
        assert!(rx.borrow().session.is_some());
    }

    #[test]
    fn clear_resets_everything() {
        let store = AppStore::new();
        store.set_session(session());
        store.replace_opportunities(vec![opportunity("a")]);
        store.clear();
        let state = store.snapshot();
        assert!(state.session.is_none());
        assert!(state.opportunities.is_empty());
    }
}
