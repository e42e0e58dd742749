//! D-Bus adapter.
//!
//! - **`service_object`** / **`context_object`** – the exported interfaces.
//!   They hold only a [`Commands`] handle and forward every call. Calls
//!   are dispatched inline, not on spawned tasks, so commands reach the
//!   loop in the order they arrived on the wire.
//! - **`commands`** – the request/reply messages to the service loop.
//! - **`runtime`** – the loop owning the service; emits signals and manages
//!   context object registration.
//! - **`presence`** – client disconnect detection via `NameOwnerChanged`.
//! - **`errors`** – the `org.fedorahosted.Eekboard.Error.*` replies.

pub mod commands;
pub mod context_object;
pub mod errors;
pub mod presence;
pub mod runtime;
pub mod service_object;

pub use commands::{Command, Commands};
pub use errors::EekboardError;
pub use presence::{BusPresenceWatcher, PresenceEvent};
pub use runtime::{RuntimeError, ServiceRuntime};
