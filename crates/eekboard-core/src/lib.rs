//! # eekboard-core
//!
//! Shared library for the eekboard on-screen keyboard service containing the
//! keyboard model, the keysym table, identifiers and the wire vocabulary.
//!
//! This crate is used by both the server and the client library.
//! It has no dependency on the bus, the file system or any UI toolkit.
//!
//! # Architecture overview
//!
//! eekboard is a virtual keyboard exposed over D-Bus. Each client
//! application creates an *input context*, registers keyboard layouts in it
//! and pushes it onto the service's context stack; the context on top of the
//! stack is the enabled one and is the only one whose keyboard is shown.
//!
//! This crate defines:
//!
//! - **`domain`** – Context/keyboard/client identifiers and the keyboard
//!   model (keys, symbol matrices, groups, modifier state).
//!
//! - **`keymap`** – The X11 keysym name table and modifier masks.
//!
//! - **`protocol`** – Bus names and object paths, plus the ordered
//!   notification queue the service fills and the bus adapter drains.

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `eekboard_core::ContextId` instead of `eekboard_core::domain::ids::ContextId`.
pub use domain::ids::{ClientIdentity, ContextId, KeyboardId};
pub use domain::keyboard::{Key, KeyEvent, KeyboardDescription, KeyboardError, Symbol, WireSymbol};
pub use keymap::{ModifierBehavior, ModifierMask, SymbolCategory};
pub use protocol::notification::{ContextSignal, Notification, Outbox, ServiceSignal};
