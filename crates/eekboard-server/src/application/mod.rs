//! Application layer of the keyboard service.
//!
//! Everything in here is synchronous and free of I/O. Collaborators (view,
//! layout loader, presence watcher) are reached through the traits in
//! [`ports`]; observable changes are queued as notifications and drained by
//! the bus adapter.
//!
//! # Sub-modules
//!
//! - **`ports`**    – Collaborator traits and the production context factory.
//! - **`repeat`**   – The per-context key-repeat state machine.
//! - **`context`**  – One client's input session: keyboards, visibility,
//!   enable/disable, key events.
//! - **`registry`** – Owns every context, keyed by a never-reused id.
//! - **`stack`**    – The LIFO stack whose head is the enabled context.
//! - **`service`**  – The orchestrator behind the top-level bus object.

pub mod context;
pub mod ports;
pub mod registry;
pub mod repeat;
pub mod service;
pub mod stack;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{CallReply, Context, ContextCall, ContextError};
pub use ports::{
    ContextFactory, FactoryError, KeyAction, KeyboardView, LayoutLoadError, LayoutLoader,
    PresenceWatcher, StandardContextFactory, ViewEvent, ViewFactory,
};
pub use repeat::{KeyRepeat, RepeatSettings, RepeatState};
pub use service::{Service, ServiceError, ServiceState};
