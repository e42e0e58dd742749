//! Context: one client's input session.
//!
//! A context holds the keyboards a client registered, which one is active,
//! whether it is shown (and fullscreen), and whether it is the enabled
//! (foreground) context. It is the only component that drives its
//! [`KeyboardView`], and it owns its key-repeat machine.
//!
//! Every observable change is queued on the caller's [`Outbox`]. Lifecycle
//! signals (`Enabled`, `Disabled`, `Destroyed`) always go out; all others are
//! only emitted while the context is enabled, the state change itself is
//! applied regardless.
//!
//! # Key events
//!
//! There are two sources of key presses:
//!
//! - **Synthetic** presses from the owning client (`PressKeycode`,
//!   `ReleaseKeycode`). They update the key model only: the client already
//!   knows what it pressed, so no `KeyPressed` goes back and no repeat is
//!   armed.
//! - **User** presses reported by the view. They drive the repeat machine,
//!   which is what reports them to the client (see [`super::repeat`]).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use eekboard_core::{
    ClientIdentity, ContextId, ContextSignal, KeyboardDescription, KeyboardError, KeyboardId,
    ModifierBehavior, Outbox,
};
use thiserror::Error;
use tracing::debug;

use super::ports::{KeyAction, KeyboardView, LayoutLoader};
use super::repeat::{KeyRepeat, RepeatSettings, RepeatState};

/// Errors returned by per-context calls.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    /// The call needs an active keyboard and none is set.
    #[error("keyboard is not set")]
    KeyboardNotSet,

    /// The active keyboard has no key with this keycode.
    #[error("key for {0} is not found")]
    KeyNotFound(u32),

    /// No keyboard with this id was added to the context.
    #[error("no such keyboard {0}")]
    KeyboardNotFound(KeyboardId),

    /// The layout collaborator could not build a keyboard.
    #[error("can't create a keyboard: {0}")]
    InvalidDescription(String),
}

impl From<KeyboardError> for ContextError {
    fn from(e: KeyboardError) -> Self {
        match e {
            KeyboardError::KeyNotFound(code) => ContextError::KeyNotFound(code),
            other => ContextError::InvalidDescription(other.to_string()),
        }
    }
}

/// A per-context method call, as routed from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextCall {
    AddKeyboard(String),
    RemoveKeyboard(KeyboardId),
    SetKeyboard(KeyboardId),
    SetFullscreen(bool),
    ShowKeyboard,
    HideKeyboard,
    SetGroup(i32),
    PressKeycode(u32),
    ReleaseKeycode(u32),
}

/// Successful result of a [`ContextCall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallReply {
    Done,
    KeyboardAdded(KeyboardId),
}

pub struct Context {
    id: ContextId,
    owner: ClientIdentity,
    client_name: Option<String>,

    enabled: bool,
    visible: bool,
    /// Visibility to restore on the next enable.
    visible_when_enabled: bool,
    fullscreen: bool,

    keyboards: HashMap<KeyboardId, KeyboardDescription>,
    active_keyboard: Option<KeyboardId>,
    /// `None` once the id space is exhausted.
    next_keyboard_id: Option<KeyboardId>,

    repeat: KeyRepeat,
    loader: Arc<dyn LayoutLoader>,
    view: Arc<dyn KeyboardView>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("enabled", &self.enabled)
            .field("visible", &self.visible)
            .field("active_keyboard", &self.active_keyboard)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(
        id: ContextId,
        owner: ClientIdentity,
        client_name: Option<String>,
        loader: Arc<dyn LayoutLoader>,
        view: Arc<dyn KeyboardView>,
        repeat: RepeatSettings,
    ) -> Self {
        Self {
            id,
            owner,
            client_name,
            enabled: false,
            visible: false,
            visible_when_enabled: false,
            fullscreen: false,
            keyboards: HashMap::new(),
            active_keyboard: None,
            next_keyboard_id: Some(KeyboardId::FIRST),
            repeat: KeyRepeat::new(repeat),
            loader,
            view,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn owner(&self) -> &ClientIdentity {
        &self.owner
    }

    pub fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn active_keyboard(&self) -> Option<KeyboardId> {
        self.active_keyboard
    }

    pub fn keyboard(&self, id: KeyboardId) -> Option<&KeyboardDescription> {
        self.keyboards.get(&id)
    }

    pub fn keyboard_count(&self) -> usize {
        self.keyboards.len()
    }

    pub fn repeat_state(&self) -> RepeatState {
        self.repeat.state()
    }

    pub fn repeat_deadline(&self) -> Option<Instant> {
        self.repeat.deadline()
    }

    // ── Routed calls ──────────────────────────────────────────────────────────

    /// Dispatches one wire call.
    ///
    /// Any call first drops a running key repeat without reporting it.
    pub fn call(&mut self, call: ContextCall, outbox: &mut Outbox) -> Result<CallReply, ContextError> {
        self.repeat.cancel();
        match call {
            ContextCall::AddKeyboard(spec) => self.add_keyboard(&spec).map(CallReply::KeyboardAdded),
            ContextCall::RemoveKeyboard(id) => {
                self.remove_keyboard(id, outbox);
                Ok(CallReply::Done)
            }
            ContextCall::SetKeyboard(id) => self.set_keyboard(id, outbox).map(|_| CallReply::Done),
            ContextCall::SetFullscreen(flag) => {
                self.set_fullscreen(flag).map(|_| CallReply::Done)
            }
            ContextCall::ShowKeyboard => self.show(outbox).map(|_| CallReply::Done),
            ContextCall::HideKeyboard => {
                self.hide(outbox);
                Ok(CallReply::Done)
            }
            ContextCall::SetGroup(group) => self.set_group(group, outbox).map(|_| CallReply::Done),
            ContextCall::PressKeycode(code) => self.press_key(code).map(|_| CallReply::Done),
            ContextCall::ReleaseKeycode(code) => self.release_key(code).map(|_| CallReply::Done),
        }
    }

    /// Loads a layout and stores it under a fresh id.
    pub fn add_keyboard(&mut self, spec: &str) -> Result<KeyboardId, ContextError> {
        let mut keyboard = self
            .loader
            .load(spec)
            .map_err(|e| ContextError::InvalidDescription(e.to_string()))?;
        keyboard.set_modifier_behavior(ModifierBehavior::Latch);

        let id = self
            .next_keyboard_id
            .ok_or_else(|| ContextError::InvalidDescription("keyboard ids exhausted".into()))?;
        self.next_keyboard_id = id.next();
        self.keyboards.insert(id, keyboard);
        debug!(context = %self.id, keyboard = %id, spec, "keyboard added");
        Ok(id)
    }

    /// Drops a keyboard. Unknown ids are ignored.
    ///
    /// Removing the active keyboard detaches it from the view and hides it,
    /// since a context without an active keyboard cannot be shown.
    pub fn remove_keyboard(&mut self, id: KeyboardId, outbox: &mut Outbox) {
        if self.active_keyboard == Some(id) {
            self.repeat.cancel();
            self.hide(outbox);
            self.visible_when_enabled = false;
            self.view.detach();
            self.active_keyboard = None;
        }
        if self.keyboards.remove(&id).is_some() {
            debug!(context = %self.id, keyboard = %id, "keyboard removed");
        }
    }

    pub fn set_keyboard(&mut self, id: KeyboardId, outbox: &mut Outbox) -> Result<(), ContextError> {
        let keyboard = self
            .keyboards
            .get(&id)
            .ok_or(ContextError::KeyboardNotFound(id))?;
        if self.active_keyboard == Some(id) {
            return Ok(());
        }

        self.repeat.cancel();
        let group = keyboard.group();
        self.view.attach(keyboard);
        self.active_keyboard = Some(id);

        self.emit(outbox, ContextSignal::KeyboardChanged(id));
        self.emit(outbox, ContextSignal::GroupChanged(group));
        Ok(())
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), ContextError> {
        self.require_keyboard()?;
        if self.fullscreen == fullscreen {
            return Ok(());
        }
        self.fullscreen = fullscreen;
        if self.visible {
            self.view.show(fullscreen);
        }
        Ok(())
    }

    pub fn set_group(&mut self, group: i32, outbox: &mut Outbox) -> Result<(), ContextError> {
        let id = self.require_keyboard()?;
        let keyboard = self
            .keyboards
            .get_mut(&id)
            .ok_or(ContextError::KeyboardNotSet)?;
        if keyboard.group() == group {
            return Ok(());
        }
        keyboard.set_group(group);
        self.emit(outbox, ContextSignal::GroupChanged(group));
        Ok(())
    }

    /// Shows the active keyboard.
    ///
    /// On a disabled context the request is remembered and honoured on the
    /// next enable.
    pub fn show(&mut self, outbox: &mut Outbox) -> Result<(), ContextError> {
        self.require_keyboard()?;
        if !self.enabled {
            self.visible_when_enabled = true;
            return Ok(());
        }
        if !self.visible {
            self.view.show(self.fullscreen);
            self.visible = true;
            self.emit(outbox, ContextSignal::VisibilityChanged(true));
        }
        Ok(())
    }

    pub fn hide(&mut self, outbox: &mut Outbox) {
        if !self.enabled {
            self.visible_when_enabled = false;
        }
        if self.visible {
            self.view.hide();
            self.visible = false;
            self.emit(outbox, ContextSignal::VisibilityChanged(false));
        }
    }

    /// Synthetic press from the client: updates the key model only.
    pub fn press_key(&mut self, keycode: u32) -> Result<(), ContextError> {
        let keyboard = self.active_keyboard_mut()?;
        keyboard.press(keycode)?;
        Ok(())
    }

    /// Synthetic release from the client: updates the key model only.
    pub fn release_key(&mut self, keycode: u32) -> Result<(), ContextError> {
        let keyboard = self.active_keyboard_mut()?;
        keyboard.release(keycode)?;
        Ok(())
    }

    // ── User key events and repeat ────────────────────────────────────────────

    /// A key press or release reported by the view.
    pub fn handle_key_action(
        &mut self,
        action: KeyAction,
        now: Instant,
        outbox: &mut Outbox,
    ) -> Result<(), ContextError> {
        match action {
            KeyAction::Pressed(keycode) => {
                self.active_keyboard_mut()?.press(keycode)?;
                self.repeat.press(keycode, now);
            }
            KeyAction::Released(keycode) => {
                // The terminal report must carry the state the key was
                // pressed under, so describe it before the release clears
                // latched modifiers.
                let keyboard = self.active_keyboard_mut()?;
                keyboard.describe(keycode)?;
                if let Some(repeat_key) = self.repeat.release() {
                    self.emit_key_pressed(repeat_key, outbox);
                }
                self.active_keyboard_mut()?.release(keycode)?;
            }
        }
        Ok(())
    }

    /// Processes due repeat deadlines.
    pub fn fire_repeat(&mut self, now: Instant, outbox: &mut Outbox) {
        for tick in self.repeat.fire(now) {
            self.emit_key_pressed(tick.keycode, outbox);
            if tick.initial {
                // Clear modifiers for the rest of the repeat so a latched
                // shift/level modifier does not stick to every repetition.
                if let Ok(keyboard) = self.active_keyboard_mut() {
                    keyboard.set_modifiers(0);
                }
            }
        }
    }

    pub fn cancel_repeat(&mut self) {
        self.repeat.cancel();
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    pub fn enable(&mut self, outbox: &mut Outbox) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.emit(outbox, ContextSignal::Enabled);

        if std::mem::take(&mut self.visible_when_enabled) && self.active_keyboard.is_some() {
            // Infallible here: a keyboard is set.
            let _ = self.show(outbox);
        }
    }

    pub fn disable(&mut self, outbox: &mut Outbox) {
        if !self.enabled {
            return;
        }
        self.repeat.cancel();
        self.enabled = false;
        self.emit(outbox, ContextSignal::Disabled);

        self.visible_when_enabled = self.visible;
        if self.visible {
            self.view.hide();
            self.visible = false;
        }
    }

    /// Cancels the repeat, disables, reports `Destroyed` and releases the
    /// view's resources.
    pub fn teardown(&mut self, outbox: &mut Outbox) {
        self.repeat.cancel();
        self.disable(outbox);
        self.emit(outbox, ContextSignal::Destroyed);
        if self.visible {
            self.view.hide();
            self.visible = false;
        }
        if self.active_keyboard.take().is_some() {
            self.view.detach();
        }
        self.keyboards.clear();
        debug!(context = %self.id, owner = %self.owner, "context torn down");
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn require_keyboard(&self) -> Result<KeyboardId, ContextError> {
        self.active_keyboard.ok_or(ContextError::KeyboardNotSet)
    }

    fn active_keyboard_mut(&mut self) -> Result<&mut KeyboardDescription, ContextError> {
        let id = self.require_keyboard()?;
        self.keyboards
            .get_mut(&id)
            .ok_or(ContextError::KeyboardNotSet)
    }

    fn emit_key_pressed(&self, keycode: u32, outbox: &mut Outbox) {
        let Some(keyboard) = self.active_keyboard.and_then(|id| self.keyboards.get(&id)) else {
            return;
        };
        if let Ok(event) = keyboard.describe(keycode) {
            self.emit(
                outbox,
                ContextSignal::KeyPressed {
                    keyname: event.keyname,
                    symbol: event.symbol,
                    modifiers: event.modifiers,
                },
            );
        }
    }

    fn emit(&self, outbox: &mut Outbox, signal: ContextSignal) {
        if signal.is_lifecycle() || self.enabled {
            outbox.context(self.id, signal);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{RecordingView, StaticLoader, ViewCall};
    use eekboard_core::{ModifierMask, Notification};
    use std::time::Duration;

    const DELAY: Duration = Duration::from_millis(500);
    const INTERVAL: Duration = Duration::from_millis(50);

    fn make_context(repeat_enabled: bool) -> (Context, Arc<RecordingView>) {
        let view = Arc::new(RecordingView::default());
        let ctx = Context::new(
            ContextId(1),
            ClientIdentity::from(":1.1"),
            Some("test-client".to_string()),
            Arc::new(StaticLoader),
            view.clone(),
            RepeatSettings::new(repeat_enabled, DELAY, INTERVAL),
        );
        (ctx, view)
    }

    fn signals(outbox: &mut Outbox) -> Vec<ContextSignal> {
        outbox
            .drain()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Context { signal, .. } => Some(signal),
                Notification::Service(_) => None,
            })
            .collect()
    }

    fn key_presses(outbox: &mut Outbox) -> usize {
        signals(outbox)
            .iter()
            .filter(|s| matches!(s, ContextSignal::KeyPressed { .. }))
            .count()
    }

    /// Enabled context with keyboard "us" active.
    fn ready_context(repeat_enabled: bool) -> (Context, Arc<RecordingView>, Outbox) {
        let (mut ctx, view) = make_context(repeat_enabled);
        let mut outbox = Outbox::new();
        ctx.enable(&mut outbox);
        let id = ctx.add_keyboard("us").unwrap();
        ctx.set_keyboard(id, &mut outbox).unwrap();
        outbox.drain();
        (ctx, view, outbox)
    }

    // ── Keyboards ─────────────────────────────────────────────────────────────

    #[test]
    fn test_add_keyboard_allocates_increasing_ids() {
        let (mut ctx, _view) = make_context(true);
        let a = ctx.add_keyboard("us").unwrap();
        let b = ctx.add_keyboard("de").unwrap();
        assert_eq!(a, KeyboardId(1));
        assert_eq!(b, KeyboardId(2));
        assert_eq!(ctx.keyboard_count(), 2);
    }

    #[test]
    fn test_add_keyboard_sets_latch_behavior() {
        let (mut ctx, _view) = make_context(true);
        let id = ctx.add_keyboard("us").unwrap();
        assert_eq!(
            ctx.keyboard(id).unwrap().modifier_behavior(),
            ModifierBehavior::Latch
        );
    }

    #[test]
    fn test_add_keyboard_loader_failure_is_invalid_description() {
        let (mut ctx, _view) = make_context(true);
        let err = ctx.add_keyboard("broken").unwrap_err();
        assert!(matches!(err, ContextError::InvalidDescription(_)));
        assert_eq!(ctx.keyboard_count(), 0);
    }

    #[test]
    fn test_keyboard_ids_are_not_reused_after_remove() {
        let (mut ctx, _view) = make_context(true);
        let mut outbox = Outbox::new();
        let first = ctx.add_keyboard("us").unwrap();
        ctx.remove_keyboard(first, &mut outbox);
        let second = ctx.add_keyboard("us").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_remove_unknown_keyboard_is_noop() {
        let (mut ctx, view, mut outbox) = ready_context(true);
        ctx.remove_keyboard(KeyboardId(99), &mut outbox);
        assert_eq!(ctx.active_keyboard(), Some(KeyboardId(1)));
        assert!(outbox.is_empty());
        assert!(!view.calls().contains(&ViewCall::Detach));
    }

    #[test]
    fn test_set_keyboard_unknown_id_fails() {
        let (mut ctx, _view) = make_context(true);
        let mut outbox = Outbox::new();
        assert_eq!(
            ctx.set_keyboard(KeyboardId(7), &mut outbox),
            Err(ContextError::KeyboardNotFound(KeyboardId(7)))
        );
    }

    #[test]
    fn test_set_keyboard_emits_keyboard_then_group_changed() {
        let (mut ctx, view) = make_context(true);
        let mut outbox = Outbox::new();
        ctx.enable(&mut outbox);
        outbox.drain();
        let id = ctx.add_keyboard("us").unwrap();

        ctx.set_keyboard(id, &mut outbox).unwrap();

        assert_eq!(
            signals(&mut outbox),
            vec![
                ContextSignal::KeyboardChanged(id),
                ContextSignal::GroupChanged(0)
            ]
        );
        assert_eq!(view.calls(), vec![ViewCall::Attach("us".to_string())]);
    }

    #[test]
    fn test_set_keyboard_same_id_is_silent() {
        let (mut ctx, view, mut outbox) = ready_context(true);
        let before = view.calls().len();

        ctx.set_keyboard(KeyboardId(1), &mut outbox).unwrap();

        assert!(outbox.is_empty());
        assert_eq!(view.calls().len(), before);
    }

    #[test]
    fn test_remove_active_keyboard_unsets_it_and_blocks_show() {
        let (mut ctx, view, mut outbox) = ready_context(true);
        ctx.show(&mut outbox).unwrap();
        outbox.drain();

        ctx.remove_keyboard(KeyboardId(1), &mut outbox);

        assert_eq!(ctx.active_keyboard(), None);
        assert!(!ctx.is_visible());
        assert_eq!(
            signals(&mut outbox),
            vec![ContextSignal::VisibilityChanged(false)]
        );
        assert!(view.calls().ends_with(&[ViewCall::Hide, ViewCall::Detach]));
        assert_eq!(ctx.show(&mut outbox), Err(ContextError::KeyboardNotSet));
    }

    // ── Preconditions ─────────────────────────────────────────────────────────

    #[test]
    fn test_calls_without_keyboard_fail_keyboard_not_set() {
        let (mut ctx, _view) = make_context(true);
        let mut outbox = Outbox::new();
        assert_eq!(ctx.show(&mut outbox), Err(ContextError::KeyboardNotSet));
        assert_eq!(ctx.set_group(1, &mut outbox), Err(ContextError::KeyboardNotSet));
        assert_eq!(ctx.set_fullscreen(true), Err(ContextError::KeyboardNotSet));
        assert_eq!(ctx.press_key(38), Err(ContextError::KeyboardNotSet));
        assert_eq!(ctx.release_key(38), Err(ContextError::KeyboardNotSet));
    }

    #[test]
    fn test_press_unknown_keycode_fails_key_not_found() {
        let (mut ctx, _view, _outbox) = ready_context(true);
        assert_eq!(ctx.press_key(999), Err(ContextError::KeyNotFound(999)));
        assert_eq!(ctx.release_key(999), Err(ContextError::KeyNotFound(999)));
    }

    #[test]
    fn test_hide_without_keyboard_succeeds() {
        let (mut ctx, _view) = make_context(true);
        let mut outbox = Outbox::new();
        ctx.hide(&mut outbox);
        assert!(outbox.is_empty());
    }

    // ── Group / fullscreen ────────────────────────────────────────────────────

    #[test]
    fn test_set_group_emits_once_per_change() {
        let (mut ctx, _view, mut outbox) = ready_context(true);

        ctx.set_group(1, &mut outbox).unwrap();
        ctx.set_group(1, &mut outbox).unwrap();

        assert_eq!(signals(&mut outbox), vec![ContextSignal::GroupChanged(1)]);
        assert_eq!(ctx.keyboard(KeyboardId(1)).unwrap().group(), 1);
    }

    #[test]
    fn test_set_fullscreen_reshows_visible_keyboard() {
        let (mut ctx, view, mut outbox) = ready_context(true);
        ctx.show(&mut outbox).unwrap();

        ctx.set_fullscreen(true).unwrap();
        ctx.set_fullscreen(true).unwrap();

        assert!(ctx.is_fullscreen());
        assert!(view.calls().ends_with(&[ViewCall::Show(false), ViewCall::Show(true)]));
    }

    // ── Visibility and enable/disable ─────────────────────────────────────────

    #[test]
    fn test_show_and_hide_emit_visibility_changes() {
        let (mut ctx, _view, mut outbox) = ready_context(true);

        ctx.show(&mut outbox).unwrap();
        ctx.show(&mut outbox).unwrap();
        ctx.hide(&mut outbox);

        assert_eq!(
            signals(&mut outbox),
            vec![
                ContextSignal::VisibilityChanged(true),
                ContextSignal::VisibilityChanged(false)
            ]
        );
    }

    #[test]
    fn test_enable_and_disable_are_idempotent() {
        let (mut ctx, _view) = make_context(true);
        let mut outbox = Outbox::new();

        ctx.enable(&mut outbox);
        ctx.enable(&mut outbox);
        ctx.disable(&mut outbox);
        ctx.disable(&mut outbox);

        assert_eq!(
            signals(&mut outbox),
            vec![ContextSignal::Enabled, ContextSignal::Disabled]
        );
    }

    #[test]
    fn test_disable_hides_and_enable_reshows() {
        let (mut ctx, view, mut outbox) = ready_context(true);
        ctx.show(&mut outbox).unwrap();
        outbox.drain();

        ctx.disable(&mut outbox);
        assert!(!ctx.is_visible());
        assert_eq!(view.calls().last(), Some(&ViewCall::Hide));

        ctx.enable(&mut outbox);
        assert!(ctx.is_visible());
        assert_eq!(view.calls().last(), Some(&ViewCall::Show(false)));
        assert_eq!(
            signals(&mut outbox),
            vec![
                ContextSignal::Disabled,
                ContextSignal::Enabled,
                ContextSignal::VisibilityChanged(true)
            ]
        );
    }

    #[test]
    fn test_enable_does_not_show_keyboard_that_was_hidden() {
        let (mut ctx, _view, mut outbox) = ready_context(true);
        ctx.disable(&mut outbox);
        ctx.enable(&mut outbox);
        assert!(!ctx.is_visible());
    }

    #[test]
    fn test_disabled_context_signals_are_gated() {
        let (mut ctx, _view) = make_context(true);
        let mut outbox = Outbox::new();
        let id = ctx.add_keyboard("us").unwrap();

        ctx.set_keyboard(id, &mut outbox).unwrap();
        ctx.set_group(1, &mut outbox).unwrap();

        assert!(outbox.is_empty(), "disabled context must stay silent");
        assert_eq!(ctx.keyboard(id).unwrap().group(), 1, "state still changes");
    }

    #[test]
    fn test_show_on_disabled_context_is_deferred_until_enable() {
        let (mut ctx, view) = make_context(true);
        let mut outbox = Outbox::new();
        let id = ctx.add_keyboard("us").unwrap();
        ctx.set_keyboard(id, &mut outbox).unwrap();

        ctx.show(&mut outbox).unwrap();
        assert!(!ctx.is_visible());
        assert!(!view.calls().contains(&ViewCall::Show(false)));

        ctx.enable(&mut outbox);
        assert!(ctx.is_visible());
    }

    #[test]
    fn test_teardown_disables_then_reports_destroyed() {
        let (mut ctx, view, mut outbox) = ready_context(true);
        ctx.show(&mut outbox).unwrap();
        outbox.drain();

        ctx.teardown(&mut outbox);

        assert_eq!(
            signals(&mut outbox),
            vec![ContextSignal::Disabled, ContextSignal::Destroyed]
        );
        assert!(!ctx.is_enabled());
        assert_eq!(ctx.keyboard_count(), 0);
        assert_eq!(view.calls().last(), Some(&ViewCall::Detach));
    }

    // ── Synthetic key events ──────────────────────────────────────────────────

    #[test]
    fn test_synthetic_press_updates_model_without_signal_or_repeat() {
        let (mut ctx, _view, mut outbox) = ready_context(true);

        ctx.press_key(50).unwrap();

        assert!(outbox.is_empty());
        assert_eq!(ctx.repeat_state(), RepeatState::Idle);
        assert_eq!(
            ctx.keyboard(KeyboardId(1)).unwrap().modifiers(),
            ModifierMask::SHIFT
        );
    }

    // ── Key repeat ────────────────────────────────────────────────────────────

    #[test]
    fn test_tap_reports_one_key_press_on_release() {
        let (mut ctx, _view, mut outbox) = ready_context(true);
        let now = Instant::now();

        ctx.handle_key_action(KeyAction::Pressed(38), now, &mut outbox)
            .unwrap();
        assert!(outbox.is_empty(), "press alone reports nothing");

        ctx.handle_key_action(KeyAction::Released(38), now + Duration::from_millis(80), &mut outbox)
            .unwrap();
        assert_eq!(key_presses(&mut outbox), 1);
    }

    #[test]
    fn test_hold_with_repeat_disabled_reports_once() {
        let (mut ctx, _view, mut outbox) = ready_context(false);
        let now = Instant::now();

        ctx.handle_key_action(KeyAction::Pressed(38), now, &mut outbox)
            .unwrap();
        ctx.fire_repeat(now + DELAY * 3, &mut outbox);
        ctx.handle_key_action(KeyAction::Released(38), now + DELAY * 4, &mut outbox)
            .unwrap();

        assert_eq!(key_presses(&mut outbox), 1);
    }

    #[test]
    fn test_hold_with_repeat_enabled_reports_per_interval_plus_terminal() {
        let (mut ctx, _view, mut outbox) = ready_context(true);
        let now = Instant::now();

        ctx.handle_key_action(KeyAction::Pressed(38), now, &mut outbox)
            .unwrap();
        ctx.fire_repeat(now + DELAY + INTERVAL * 2, &mut outbox);
        assert_eq!(key_presses(&mut outbox), 3);

        ctx.handle_key_action(
            KeyAction::Released(38),
            now + DELAY + INTERVAL * 2 + Duration::from_millis(10),
            &mut outbox,
        )
        .unwrap();
        assert_eq!(key_presses(&mut outbox), 1);
    }

    #[test]
    fn test_first_repeat_clears_latched_modifiers() {
        let (mut ctx, _view, mut outbox) = ready_context(true);
        let now = Instant::now();
        ctx.handle_key_action(KeyAction::Pressed(50), now, &mut outbox)
            .unwrap();
        ctx.handle_key_action(KeyAction::Released(50), now, &mut outbox)
            .unwrap();
        outbox.drain();

        ctx.handle_key_action(KeyAction::Pressed(38), now, &mut outbox)
            .unwrap();
        ctx.fire_repeat(now + DELAY + INTERVAL, &mut outbox);

        let presses: Vec<_> = signals(&mut outbox)
            .into_iter()
            .filter_map(|s| match s {
                ContextSignal::KeyPressed { symbol, modifiers, .. } => Some((symbol.name, modifiers)),
                _ => None,
            })
            .collect();
        assert_eq!(
            presses,
            vec![
                ("A".to_string(), ModifierMask::SHIFT),
                ("a".to_string(), 0)
            ]
        );
    }

    #[test]
    fn test_any_call_cancels_repeat_silently() {
        let (mut ctx, _view, mut outbox) = ready_context(true);
        let now = Instant::now();
        ctx.handle_key_action(KeyAction::Pressed(38), now, &mut outbox)
            .unwrap();

        ctx.call(ContextCall::SetFullscreen(true), &mut outbox).unwrap();
        ctx.handle_key_action(KeyAction::Released(38), now + DELAY, &mut outbox)
            .unwrap();

        assert_eq!(key_presses(&mut outbox), 0);
        assert_eq!(ctx.repeat_state(), RepeatState::Idle);
    }

    #[test]
    fn test_disable_cancels_repeat() {
        let (mut ctx, _view, mut outbox) = ready_context(true);
        let now = Instant::now();
        ctx.handle_key_action(KeyAction::Pressed(38), now, &mut outbox)
            .unwrap();

        ctx.disable(&mut outbox);

        assert_eq!(ctx.repeat_deadline(), None);
    }

    #[test]
    fn test_key_action_without_keyboard_fails() {
        let (mut ctx, _view) = make_context(true);
        let mut outbox = Outbox::new();
        assert_eq!(
            ctx.handle_key_action(KeyAction::Pressed(38), Instant::now(), &mut outbox),
            Err(ContextError::KeyboardNotSet)
        );
    }

    #[test]
    fn test_call_add_keyboard_returns_id() {
        let (mut ctx, _view) = make_context(true);
        let mut outbox = Outbox::new();
        assert_eq!(
            ctx.call(ContextCall::AddKeyboard("us".into()), &mut outbox),
            Ok(CallReply::KeyboardAdded(KeyboardId(1)))
        );
    }
}
