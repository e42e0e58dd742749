//! Application layer of the client library.
//!
//! - **`context_state`** – Mirrors a context object's state from the
//!   signals it emits and filters out requests that would change nothing.

pub mod context_state;

pub use context_state::ContextState;
