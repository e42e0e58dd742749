//! Client-side mirror of a context object.
//!
//! The service reports context state only through signals, so a client that
//! wants to know whether its keyboard is on screen keeps a [`ContextState`]
//! and feeds it every signal the context emits. The same state decides which
//! requests are worth sending at all.

use eekboard_core::{ContextSignal, KeyboardId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextState {
    enabled: bool,
    visible: bool,
    fullscreen: bool,
    group: i32,
    keyboard: Option<KeyboardId>,
    destroyed: bool,
}

impl ContextState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the mirror from a received signal.
    ///
    /// Key presses carry no context state and are ignored.
    pub fn apply(&mut self, signal: &ContextSignal) {
        match signal {
            ContextSignal::Enabled => self.enabled = true,
            ContextSignal::Disabled => self.enabled = false,
            ContextSignal::Destroyed => {
                self.enabled = false;
                self.visible = false;
                self.destroyed = true;
            }
            ContextSignal::VisibilityChanged(visible) => self.visible = *visible,
            ContextSignal::KeyboardChanged(id) => self.keyboard = Some(*id),
            ContextSignal::GroupChanged(group) => self.group = *group,
            ContextSignal::KeyPressed { .. } => {}
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The keyboard is on screen only while the context is enabled.
    pub fn is_visible(&self) -> bool {
        self.enabled && self.visible
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn group(&self) -> i32 {
        self.group
    }

    pub fn keyboard(&self) -> Option<KeyboardId> {
        self.keyboard
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ── Request filters ───────────────────────────────────────────────────────

    pub fn should_send_set_group(&self, group: i32) -> bool {
        !self.destroyed && self.group != group
    }

    pub fn should_send_set_fullscreen(&self, fullscreen: bool) -> bool {
        !self.destroyed && self.fullscreen != fullscreen
    }

    /// Show, hide and key requests only reach an enabled context.
    pub fn should_send_to_enabled(&self) -> bool {
        self.enabled && !self.destroyed
    }

    /// Records a fullscreen change the service accepted.
    ///
    /// The service has no signal for it, so the client tracks it itself.
    pub fn note_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use eekboard_core::Symbol;

    #[test]
    fn test_new_state_is_disabled_and_hidden() {
        let state = ContextState::new();
        assert!(!state.is_enabled());
        assert!(!state.is_visible());
        assert_eq!(state.keyboard(), None);
    }

    #[test]
    fn test_visible_requires_enabled() {
        // Arrange
        let mut state = ContextState::new();

        // Act
        state.apply(&ContextSignal::VisibilityChanged(true));

        // Assert
        assert!(!state.is_visible(), "hidden while disabled");
        state.apply(&ContextSignal::Enabled);
        assert!(state.is_visible());
        state.apply(&ContextSignal::Disabled);
        assert!(!state.is_visible());
    }

    #[test]
    fn test_keyboard_and_group_follow_signals() {
        let mut state = ContextState::new();

        state.apply(&ContextSignal::KeyboardChanged(KeyboardId(3)));
        state.apply(&ContextSignal::GroupChanged(2));

        assert_eq!(state.keyboard(), Some(KeyboardId(3)));
        assert_eq!(state.group(), 2);
    }

    #[test]
    fn test_key_pressed_leaves_state_untouched() {
        let mut state = ContextState::new();
        state.apply(&ContextSignal::Enabled);
        let before = state.clone();

        state.apply(&ContextSignal::KeyPressed {
            keyname: "AC01".into(),
            symbol: Symbol::from_keysym_name("a"),
            modifiers: 0,
        });

        assert_eq!(state, before);
    }

    #[test]
    fn test_destroyed_blocks_every_request() {
        let mut state = ContextState::new();
        state.apply(&ContextSignal::Enabled);

        state.apply(&ContextSignal::Destroyed);

        assert!(state.is_destroyed());
        assert!(!state.should_send_to_enabled());
        assert!(!state.should_send_set_group(1));
        assert!(!state.should_send_set_fullscreen(true));
    }

    // ── Request filters ───────────────────────────────────────────────────────

    #[test]
    fn test_set_group_skipped_when_unchanged() {
        let mut state = ContextState::new();
        assert!(!state.should_send_set_group(0));
        assert!(state.should_send_set_group(1));

        state.apply(&ContextSignal::GroupChanged(1));

        assert!(!state.should_send_set_group(1));
    }

    #[test]
    fn test_set_fullscreen_skipped_after_noted() {
        let mut state = ContextState::new();
        assert!(state.should_send_set_fullscreen(true));

        state.note_fullscreen(true);

        assert!(state.is_fullscreen());
        assert!(!state.should_send_set_fullscreen(true));
        assert!(state.should_send_set_fullscreen(false));
    }

    #[test]
    fn test_show_and_hide_only_sent_while_enabled() {
        let mut state = ContextState::new();
        assert!(!state.should_send_to_enabled());

        state.apply(&ContextSignal::Enabled);

        assert!(state.should_send_to_enabled());
    }
}
