//! Identifiers used across the service, its contexts and their keyboards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an input context.
///
/// Allocated monotonically by the context registry and never reused within a
/// process lifetime, so a stale client cannot reach a context created after
/// its own was destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(pub u64);

impl ContextId {
    /// Returns the id that follows `self`, or `None` on exhaustion.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(ContextId)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a keyboard registered inside one context.
///
/// Scoped to its context: two contexts may both hand out keyboard `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyboardId(pub u32);

impl KeyboardId {
    /// The first id a context hands out.
    pub const FIRST: KeyboardId = KeyboardId(1);

    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(KeyboardId)
    }
}

impl fmt::Display for KeyboardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a remote peer, i.e. its unique bus name (`:1.42`).
///
/// Used both to authorise `PopContext`/`DestroyContext` and to find the
/// contexts to purge when the peer disconnects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientIdentity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
