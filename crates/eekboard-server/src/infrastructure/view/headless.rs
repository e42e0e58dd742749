//! A view that renders nothing.
//!
//! Pixel rendering lives outside the service; this view records what would
//! be on screen, logs every change, and lets a caller inject user key
//! presses as if they came from the on-screen widget.

use std::sync::{Mutex, PoisonError};

use eekboard_core::{ContextId, KeyboardDescription};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::application::{KeyAction, KeyboardView, ViewEvent};

/// What the view would currently display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub visible: bool,
    pub fullscreen: bool,
    /// Name of the attached keyboard.
    pub keyboard: Option<String>,
}

#[derive(Debug)]
pub struct HeadlessView {
    context: ContextId,
    client_name: String,
    state: Mutex<ViewSnapshot>,
    events: UnboundedSender<ViewEvent>,
}

impl HeadlessView {
    pub fn new(
        context: ContextId,
        client_name: impl Into<String>,
        events: UnboundedSender<ViewEvent>,
    ) -> Self {
        Self {
            context,
            client_name: client_name.into(),
            state: Mutex::new(ViewSnapshot::default()),
            events,
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reports a user press of `keycode`.
    ///
    /// Returns `false` if the event loop is gone.
    pub fn press(&self, keycode: u32) -> bool {
        self.send(KeyAction::Pressed(keycode))
    }

    /// Reports a user release of `keycode`.
    pub fn release(&self, keycode: u32) -> bool {
        self.send(KeyAction::Released(keycode))
    }

    fn send(&self, action: KeyAction) -> bool {
        self.events
            .send(ViewEvent {
                context: self.context,
                action,
            })
            .is_ok()
    }

    fn update(&self, f: impl FnOnce(&mut ViewSnapshot)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }
}

impl KeyboardView for HeadlessView {
    fn attach(&self, keyboard: &KeyboardDescription) {
        debug!(
            context = %self.context,
            keyboard = keyboard.name(),
            keys = keyboard.key_count(),
            "view attached keyboard"
        );
        self.update(|s| s.keyboard = Some(keyboard.name().to_string()));
    }

    fn detach(&self) {
        debug!(context = %self.context, "view detached keyboard");
        self.update(|s| s.keyboard = None);
    }

    fn show(&self, fullscreen: bool) {
        info!(
            context = %self.context,
            client = %self.client_name,
            fullscreen,
            "keyboard shown"
        );
        self.update(|s| {
            s.visible = true;
            s.fullscreen = fullscreen;
        });
    }

    fn hide(&self) {
        info!(context = %self.context, client = %self.client_name, "keyboard hidden");
        self.update(|s| s.visible = false);
    }
}
