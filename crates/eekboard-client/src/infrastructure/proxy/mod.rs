//! Typed proxies for the service and context interfaces.
//!
//! Each `#[proxy]` lives in its own module: both interfaces declare a
//! `Destroyed` signal, and the generated signal types are named after it.

pub mod context;
pub mod service;

pub use context::ContextProxy;
pub use service::EekboardProxy;
