//! eekboard-client library entry point.
//!
//! Applications use this crate to ask the eekboard service for an on-screen
//! keyboard:
//!
//! 1. Connect with [`EekboardClient::connect`] and create a context.
//! 2. Register layouts with `add_keyboard` and pick one with `set_keyboard`.
//! 3. Push the context when the application's text entry gains focus; the
//!    context on top of the service's stack is the enabled one.
//! 4. Call `show_keyboard` / `hide_keyboard`, and listen for `KeyPressed`
//!    through [`KeyboardContext::take_events`].
//!
//! The service reports context state only through signals, so every
//! [`KeyboardContext`] mirrors it in a [`ContextState`].

/// Application layer: the context state mirror.
pub mod application;

/// Infrastructure layer: bus proxies and session handles.
pub mod infrastructure;

pub use application::ContextState;
pub use infrastructure::{ClientError, ContextProxy, EekboardClient, EekboardProxy, KeyboardContext};
