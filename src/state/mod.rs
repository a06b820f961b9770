//! Competition state store
//!
//! Owns the live (operator-facing) result set and the public view. The
//! public view changes only through [`CompetitionState::publish`],
//! [`CompetitionState::display_message`] and
//! [`CompetitionState::switch_display_mode`]; loading or refreshing
//! results never touches what the audience sees.
//!
//! All mutations run synchronously under one lock, with no suspension
//! points while it is held, so every operation is atomic with respect to
//! the other writers (request handlers and the change watcher).

use std::sync::Mutex;

use crate::models::{DisplayMode, PublicView, ResultSet};

#[derive(Debug, Default)]
struct Inner {
    live: ResultSet,
    public: PublicView,
    background_url: Option<String>,
}

/// Lock-protected live + public competition state
#[derive(Debug, Default)]
pub struct CompetitionState {
    inner: Mutex<Inner>,
}

impl CompetitionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("competition state lock poisoned")
    }

    /// Replace the live set wholesale; completion is always cleared
    pub fn load(&self, mut results: ResultSet) -> ResultSet {
        results.category_complete = false;
        let mut inner = self.lock();
        inner.live = results;
        inner.live.clone()
    }

    /// Set the live completion flag
    pub fn mark_complete(&self, complete: bool) -> ResultSet {
        let mut inner = self.lock();
        inner.live.category_complete = complete;
        inner.live.clone()
    }

    /// Copy the live set into the public view, optionally truncated
    ///
    /// Order is preserved; the message is cleared and the display switched
    /// back to results.
    pub fn publish(&self, limit: Option<usize>) -> PublicView {
        let mut inner = self.lock();
        let competitors = match limit {
            Some(n) => inner.live.competitors.iter().take(n).cloned().collect(),
            None => inner.live.competitors.clone(),
        };
        inner.public = PublicView {
            discipline: inner.live.discipline.clone(),
            category: inner.live.category.clone(),
            competitors,
            category_complete: inner.live.category_complete,
            message: String::new(),
            display_mode: DisplayMode::Results,
        };
        inner.public.clone()
    }

    /// Put a free-text message on the public display
    ///
    /// The previously published competitors stay in place; switching the
    /// mode back to results makes them visible again without republishing.
    pub fn display_message(&self, message: impl Into<String>) -> PublicView {
        let mut inner = self.lock();
        inner.public.message = message.into();
        inner.public.display_mode = DisplayMode::Message;
        inner.public.clone()
    }

    /// Switch what the public display shows
    pub fn switch_display_mode(&self, mode: DisplayMode) -> PublicView {
        let mut inner = self.lock();
        inner.public.display_mode = mode;
        inner.public.clone()
    }

    /// Record the background reference pushed to displays
    pub fn set_background(&self, url: impl Into<String>) -> String {
        let mut inner = self.lock();
        let url = url.into();
        inner.background_url = Some(url.clone());
        url
    }

    /// Snapshot of the live set
    pub fn live(&self) -> ResultSet {
        self.lock().live.clone()
    }

    /// Snapshot of the public view
    pub fn public(&self) -> PublicView {
        self.lock().public.clone()
    }

    /// Current background reference, if one was set
    pub fn background(&self) -> Option<String> {
        self.lock().background_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Competitor;

    fn competitors(n: usize) -> Vec<Competitor> {
        (1..=n)
            .map(|i| Competitor {
                rank: i as u32,
                name: format!("Skater {i}"),
                ..Default::default()
            })
            .collect()
    }

    fn loaded_state(n: usize) -> CompetitionState {
        let state = CompetitionState::new();
        state.load(ResultSet::new(
            Some("Speed".into()),
            Some("Senior Men".into()),
            competitors(n),
        ));
        state
    }

    #[test]
    fn test_load_replaces_and_clears_completion() {
        let state = loaded_state(3);
        state.mark_complete(true);
        assert!(state.live().category_complete);

        state.load(ResultSet::new(None, Some("Junior".into()), competitors(2)));
        let live = state.live();
        assert!(!live.category_complete);
        assert_eq!(live.competitors.len(), 2);
        assert_eq!(live.category.as_deref(), Some("Junior"));
    }

    #[test]
    fn test_load_never_touches_public() {
        let state = loaded_state(5);
        state.publish(None);
        let before = state.public();

        state.load(ResultSet::new(None, None, competitors(1)));
        assert_eq!(state.public(), before);
    }

    #[test]
    fn test_publish_truncates_preserving_order() {
        let state = loaded_state(10);
        let public = state.publish(Some(3));

        assert_eq!(public.competitors.len(), 3);
        let names: Vec<&str> = public.competitors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Skater 1", "Skater 2", "Skater 3"]);
        assert_eq!(public.discipline.as_deref(), Some("Speed"));
        assert_eq!(public.category.as_deref(), Some("Senior Men"));
    }

    #[test]
    fn test_publish_without_limit_copies_all() {
        let state = loaded_state(10);
        let public = state.publish(None);
        assert_eq!(public.competitors.len(), 10);
    }

    #[test]
    fn test_publish_resets_message_and_mode() {
        let state = loaded_state(4);
        state.display_message("Intermission");

        let public = state.publish(None);
        assert_eq!(public.message, "");
        assert_eq!(public.display_mode, DisplayMode::Results);
    }

    #[test]
    fn test_publish_carries_completion_flag() {
        let state = loaded_state(2);
        state.mark_complete(true);
        assert!(state.publish(None).category_complete);
    }

    #[test]
    fn test_message_keeps_competitors_in_place() {
        let state = loaded_state(5);
        state.publish(Some(3));

        let view = state.display_message("Intermission");
        assert_eq!(view.message, "Intermission");
        assert_eq!(view.display_mode, DisplayMode::Message);
        assert_eq!(view.competitors.len(), 3);

        // Switching back shows the same competitors without republishing
        let view = state.switch_display_mode(DisplayMode::Results);
        assert_eq!(view.display_mode, DisplayMode::Results);
        assert_eq!(view.competitors.len(), 3);
        assert_eq!(view.message, "Intermission");
    }

    #[test]
    fn test_background_round_trip() {
        let state = CompetitionState::new();
        assert_eq!(state.background(), None);

        state.set_background("/backgrounds/rink.png");
        assert_eq!(state.background().as_deref(), Some("/backgrounds/rink.png"));
    }
}
