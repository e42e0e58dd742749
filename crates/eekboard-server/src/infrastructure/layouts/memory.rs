//! In-memory layout source for tests and embedding.
//!
//! Layouts are registered as TOML text under a name and parsed on every
//! load, so each `AddKeyboard` gets fresh keyboard state.

use std::collections::HashMap;
use std::sync::RwLock;

use eekboard_core::KeyboardDescription;

use super::toml_loader::parse_layout;
use crate::application::{LayoutLoadError, LayoutLoader};

/// The US QWERTY layout shipped with the server.
pub const BUILTIN_US: &str = include_str!("../../../layouts/us.toml");

#[derive(Debug, Default)]
pub struct InMemoryLayoutLoader {
    sources: RwLock<HashMap<String, String>>,
}

impl InMemoryLayoutLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader that knows the bundled `"us"` layout.
    pub fn with_builtin() -> Self {
        let loader = Self::new();
        loader.insert("us", BUILTIN_US);
        loader
    }

    pub fn insert(&self, name: impl Into<String>, source: impl Into<String>) {
        if let Ok(mut sources) = self.sources.write() {
            sources.insert(name.into(), source.into());
        }
    }
}

impl LayoutLoader for InMemoryLayoutLoader {
    fn load(&self, spec: &str) -> Result<KeyboardDescription, LayoutLoadError> {
        let sources = self
            .sources
            .read()
            .map_err(|_| LayoutLoadError::NotFound(spec.to_string()))?;
        let source = sources
            .get(spec)
            .ok_or_else(|| LayoutLoadError::NotFound(spec.to_string()))?;
        parse_layout(spec, source)
    }
}
