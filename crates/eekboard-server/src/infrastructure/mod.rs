//! Infrastructure layer of the keyboard service.
//!
//! Contains the adapters behind the application ports: the D-Bus objects
//! and service loop, layout loading, the headless view, and configuration
//! storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `eekboard_core`, but MUST NOT be imported by the `application` layer.

pub mod dbus;
pub mod layouts;
pub mod storage;
pub mod view;
