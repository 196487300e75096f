//! crates/orbit_core/src/view.rs
//!
//! Ephemeral view state: which tab is active, which card is expanded, which
//! modal is open. Owned by the presentation layer and never persisted.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Dashboard,
    Profile,
    Opportunities,
    Tracker,
    Analytics,
    Stories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    Tasks,
    Achievements,
    Leaderboard,
    ResumeEvaluation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub active_tab: Tab,
    /// At most one opportunity card shows its detailed analysis.
    pub expanded: Option<String>,
    pub modal: Option<Modal>,
    analyzing: HashSet<String>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
        self.modal = None;
    }

    /// Expands `opportunity_id`, or collapses it if it is already expanded.
    pub fn toggle_expanded(&mut self, opportunity_id: &str) {
        if self.is_expanded(opportunity_id) {
            self.expanded = None;
        } else {
            self.expanded = Some(opportunity_id.to_string());
        }
    }

    pub fn is_expanded(&self, opportunity_id: &str) -> bool {
        self.expanded.as_deref() == Some(opportunity_id)
    }

    pub fn open_modal(&mut self, modal: Modal) {
        self.modal = Some(modal);
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    pub fn start_analyzing(&mut self, opportunity_id: &str) {
        self.analyzing.insert(opportunity_id.to_string());
    }

    pub fn finish_analyzing(&mut self, opportunity_id: &str) {
        self.analyzing.remove(opportunity_id);
    }

    pub fn is_analyzing(&self, opportunity_id: &str) -> bool {
        self.analyzing.contains(opportunity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_card_is_expanded() {
        let mut view = ViewState::new();
        view.toggle_expanded("a");
        view.toggle_expanded("b");
        assert!(!view.is_expanded("a"));
        assert!(view.is_expanded("b"));
        view.toggle_expanded("b");
        assert_eq!(view.expanded, None);
    }

    #[test]
    fn switching_tabs_closes_modals() {
        let mut view = ViewState::new();
        view.open_modal(Modal::Leaderboard);
        view.select_tab(Tab::Tracker);
        assert_eq!(view.modal, None);
        assert_eq!(view.active_tab, Tab::Tracker);
    }

    #[test]
    fn analyzing_flags_are_per_opportunity() {
        let mut view = ViewState::new();
        view.start_analyzing("a");
        view.start_analyzing("b");
        view.finish_analyzing("a");
        assert!(!view.is_analyzing("a"));
        assert!(view.is_analyzing("b"));
    }
}
