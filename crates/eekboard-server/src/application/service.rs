//! Service: the orchestrator behind the top-level bus object.
//!
//! Owns the [`ContextRegistry`] and [`ContextStack`], translates their
//! results into [`ServiceError`]s, watches the presence of every client that
//! created a context, and keeps the service-wide "keyboard shown" preference.
//!
//! # Lifecycle
//!
//! ```text
//! Unregistered ──► Registered ──► Destroyed
//! ```
//!
//! `Destroyed` is terminal: every context is torn down and every further
//! call fails with [`ServiceError::Destroyed`].
//!
//! The service performs no I/O. Notifications accumulate in an internal
//! [`Outbox`] and the bus adapter drains them with
//! [`Service::drain_notifications`] after each step.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;

use eekboard_core::{
    ClientIdentity, ContextId, KeyboardId, Notification, Outbox, ServiceSignal,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::context::{CallReply, Context, ContextCall, ContextError};
use super::ports::{ContextFactory, KeyAction, PresenceWatcher};
use super::registry::ContextRegistry;
use super::stack::{ContextStack, StackError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Built, bus name not yet acquired.
    Unregistered,
    Registered,
    Destroyed,
}

/// Every failure a service call can report to its caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("context not found: {0}")]
    NotFound(String),

    #[error("the context is not owned by the caller")]
    NotOwner,

    #[error("keyboard is not set")]
    KeyboardNotSet,

    #[error("key for {0} is not found")]
    KeyNotFound(u32),

    #[error("no such keyboard {0}")]
    KeyboardNotFound(KeyboardId),

    #[error("can't create a keyboard: {0}")]
    InvalidDescription(String),

    #[error("can't create a context: {0}")]
    ContextCreationFailed(String),

    #[error("context {0} is already on the stack")]
    AlreadyOnStack(ContextId),

    #[error("the service has been destroyed")]
    Destroyed,
}

impl From<ContextError> for ServiceError {
    fn from(e: ContextError) -> Self {
        match e {
            ContextError::KeyboardNotSet => ServiceError::KeyboardNotSet,
            ContextError::KeyNotFound(code) => ServiceError::KeyNotFound(code),
            ContextError::KeyboardNotFound(id) => ServiceError::KeyboardNotFound(id),
            ContextError::InvalidDescription(msg) => ServiceError::InvalidDescription(msg),
        }
    }
}

impl From<StackError> for ServiceError {
    fn from(e: StackError) -> Self {
        match e {
            StackError::NotFound(id) => ServiceError::NotFound(id.to_string()),
            StackError::NotOwner { .. } => ServiceError::NotOwner,
            StackError::AlreadyOnStack(id) => ServiceError::AlreadyOnStack(id),
        }
    }
}

pub struct Service {
    state: ServiceState,
    registry: ContextRegistry,
    stack: ContextStack,
    factory: Arc<dyn ContextFactory>,
    watcher: Arc<dyn PresenceWatcher>,
    /// Clients already handed to the watcher.
    watched: HashSet<ClientIdentity>,
    /// Whether the keyboard should be shown; applies to the head context.
    visible: bool,
    outbox: Outbox,
}

impl Service {
    pub fn new(factory: Arc<dyn ContextFactory>, watcher: Arc<dyn PresenceWatcher>) -> Self {
        Self {
            state: ServiceState::Unregistered,
            registry: ContextRegistry::new(),
            stack: ContextStack::new(),
            factory,
            watcher,
            watched: HashSet::new(),
            visible: false,
            outbox: Outbox::new(),
        }
    }

    // ── State ─────────────────────────────────────────────────────────────────

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Records that the bus name was acquired.
    pub fn mark_registered(&mut self) {
        if self.state == ServiceState::Unregistered {
            self.state = ServiceState::Registered;
            info!("service registered");
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == ServiceState::Destroyed
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn head(&self) -> Option<ContextId> {
        self.stack.head()
    }

    /// Stacked context ids, head first.
    pub fn stack_ids(&self) -> Vec<ContextId> {
        self.stack.iter().collect()
    }

    pub fn context(&self, id: ContextId) -> Option<&Context> {
        self.registry.lookup(id)
    }

    pub fn context_ids(&self) -> Vec<ContextId> {
        self.registry.ids()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.outbox.drain()
    }

    // ── Service methods ───────────────────────────────────────────────────────

    /// Builds a context owned by `sender`.
    ///
    /// The first context a client creates also starts watching that client
    /// for disconnection.
    pub fn create_context(
        &mut self,
        sender: &ClientIdentity,
        client_name: &str,
    ) -> Result<ContextId, ServiceError> {
        self.ensure_alive()?;
        let id = self
            .registry
            .create(self.factory.as_ref(), sender.clone(), client_name)
            .map_err(|e| ServiceError::ContextCreationFailed(e.to_string()))?;

        if self.watched.insert(sender.clone()) {
            debug!(client = %sender, "watching client presence");
            self.watcher.watch(sender.clone());
        }
        Ok(id)
    }

    /// Pushes `id` onto the stack and shows it if the keyboard should be
    /// visible.
    pub fn push_context(&mut self, id: ContextId) -> Result<(), ServiceError> {
        self.ensure_alive()?;
        self.stack.push(id, &mut self.registry, &mut self.outbox)?;

        if self.visible {
            if let Some(context) = self.registry.lookup_mut(id) {
                if context.active_keyboard().is_some() {
                    context.show(&mut self.outbox)?;
                }
            }
        }
        info!(context = %id, depth = self.stack.len(), "context pushed");
        Ok(())
    }

    /// Pops the head context, which `sender` must own.
    pub fn pop_context(&mut self, sender: &ClientIdentity) -> Result<Option<ContextId>, ServiceError> {
        self.ensure_alive()?;
        let popped = self
            .stack
            .pop(sender, &mut self.registry, &mut self.outbox)?;
        if let Some(id) = popped {
            info!(context = %id, client = %sender, "context popped");
        }
        Ok(popped)
    }

    /// Tears down a context owned by `sender`, wherever it sits.
    pub fn destroy_context(
        &mut self,
        sender: &ClientIdentity,
        id: ContextId,
    ) -> Result<(), ServiceError> {
        self.ensure_alive()?;
        let owner = self
            .registry
            .owner_of(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        if owner != sender {
            return Err(ServiceError::NotOwner);
        }

        self.registry.remove(id, &mut self.outbox);
        self.stack.remove(id, &mut self.registry, &mut self.outbox);
        info!(context = %id, client = %sender, "context destroyed");
        Ok(())
    }

    /// Shows the head context's keyboard, or remembers the request when
    /// the stack is empty.
    pub fn show_keyboard(&mut self) -> Result<(), ServiceError> {
        self.ensure_alive()?;
        if let Some(head) = self.stack.head() {
            self.context_call(head, ContextCall::ShowKeyboard)?;
        }
        self.visible = true;
        Ok(())
    }

    pub fn hide_keyboard(&mut self) -> Result<(), ServiceError> {
        self.ensure_alive()?;
        if let Some(head) = self.stack.head() {
            self.context_call(head, ContextCall::HideKeyboard)?;
        }
        self.visible = false;
        Ok(())
    }

    /// Routes a per-context call.
    ///
    /// Ownership is not checked: any peer that knows a context's path may
    /// drive it.
    pub fn context_call(
        &mut self,
        id: ContextId,
        call: ContextCall,
    ) -> Result<CallReply, ServiceError> {
        self.ensure_alive()?;
        let context = self
            .registry
            .lookup_mut(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        let was_visible = context.is_visible();
        let reply = context.call(call, &mut self.outbox)?;
        let now_visible = context.is_visible();

        if self.stack.head() == Some(id) && was_visible != now_visible {
            self.visible = now_visible;
        }
        Ok(reply)
    }

    // ── Presence ──────────────────────────────────────────────────────────────

    /// Purges every context `client` owned and enables whatever context is
    /// left on top.
    pub fn client_vanished(&mut self, client: &ClientIdentity) -> BTreeSet<ContextId> {
        if self.is_destroyed() {
            return BTreeSet::new();
        }
        self.watched.remove(client);

        let purged = self.registry.purge_owned_by(client, &mut self.outbox);
        if !purged.is_empty() {
            self.stack.retain(|id| !purged.contains(&id));
            self.stack.enable_head(&mut self.registry, &mut self.outbox);
            info!(client = %client, purged = purged.len(), head = ?self.stack.head(), "client vanished");
        }
        purged
    }

    /// Forgets that `client` is watched, so its next context retries the
    /// watch.
    pub fn watch_failed(&mut self, client: &ClientIdentity) {
        if self.watched.remove(client) {
            warn!(client = %client, "client presence is not watched");
        }
    }

    // ── View events and timers ────────────────────────────────────────────────

    /// Handles a key press or release reported by a context's view.
    pub fn view_key_event(
        &mut self,
        id: ContextId,
        action: KeyAction,
        now: Instant,
    ) -> Result<(), ServiceError> {
        self.ensure_alive()?;
        let context = self
            .registry
            .lookup_mut(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        context.handle_key_action(action, now, &mut self.outbox)?;
        Ok(())
    }

    /// Earliest pending key-repeat deadline across all contexts.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.registry.iter().filter_map(Context::repeat_deadline).min()
    }

    /// Fires every repeat deadline due at `now`.
    pub fn fire_timers(&mut self, now: Instant) {
        for context in self.registry.iter_mut() {
            if context.repeat_deadline().is_some_and(|d| d <= now) {
                context.fire_repeat(now, &mut self.outbox);
            }
        }
    }

    // ── Shutdown ──────────────────────────────────────────────────────────────

    /// Emits the service `Destroyed` signal and tears down every context,
    /// the enabled one first. Idempotent.
    pub fn destroy(&mut self) {
        if self.is_destroyed() {
            return;
        }
        self.outbox.push(Notification::Service(ServiceSignal::Destroyed));

        if let Some(head) = self.stack.head() {
            self.registry.remove(head, &mut self.outbox);
        }
        self.registry.drain_all(&mut self.outbox);
        self.stack.clear();
        self.watched.clear();
        self.visible = false;
        self.state = ServiceState::Destroyed;
        info!("service destroyed");
    }

    fn ensure_alive(&self) -> Result<(), ServiceError> {
        if self.is_destroyed() {
            Err(ServiceError::Destroyed)
        } else {
            Ok(())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
