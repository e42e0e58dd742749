//! Outbound notifications.
//!
//! Every state change that observers must hear about is expressed as a
//! [`Notification`] value and queued, in order, on an [`Outbox`]. The bus
//! adapter drains the outbox after each processed message and turns each
//! entry into a signal on the matching object path. Keeping notifications as
//! plain data means the whole lifecycle can be tested without a bus.

use std::collections::VecDeque;

use crate::domain::ids::{ContextId, KeyboardId};
use crate::domain::keyboard::Symbol;

/// A signal raised by a context object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSignal {
    Enabled,
    Disabled,
    Destroyed,
    KeyPressed {
        keyname: String,
        symbol: Symbol,
        modifiers: u32,
    },
    VisibilityChanged(bool),
    KeyboardChanged(KeyboardId),
    GroupChanged(i32),
}

impl ContextSignal {
    /// Lifecycle signals are emitted whether or not the context is enabled;
    /// everything else is only heard from the enabled context.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            ContextSignal::Enabled | ContextSignal::Disabled | ContextSignal::Destroyed
        )
    }
}

/// A signal raised by the service object itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSignal {
    Destroyed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Service(ServiceSignal),
    Context { id: ContextId, signal: ContextSignal },
}

/// Ordered queue of pending notifications.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: VecDeque<Notification>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification) {
        self.queue.push_back(notification);
    }

    pub fn context(&mut self, id: ContextId, signal: ContextSignal) {
        self.push(Notification::Context { id, signal });
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Removes and returns everything queued so far, oldest first.
    pub fn drain(&mut self) -> Vec<Notification> {
        self.queue.drain(..).collect()
    }
}
