//! Collaborator seams of the application layer.
//!
//! The context lifecycle only ever talks to the outside world through the
//! traits in this module. Infrastructure implementations (headless view,
//! TOML layout loader, bus presence watcher) are injected at construction
//! time; tests inject recording doubles instead.

use std::path::PathBuf;
use std::sync::Arc;

use eekboard_core::{ClientIdentity, ContextId, KeyboardDescription, KeyboardError};
use thiserror::Error;

use super::context::Context;
use super::repeat::RepeatSettings;

/// Renders one context's keyboard.
///
/// A view is created per context and only ever driven by that context.
pub trait KeyboardView: Send + Sync {
    /// A keyboard became the active one; render it.
    fn attach(&self, keyboard: &KeyboardDescription);

    /// The active keyboard went away; drop whatever was rendered for it.
    fn detach(&self);

    fn show(&self, fullscreen: bool);

    fn hide(&self);
}

/// Errors raised while turning a layout name or path into a keyboard.
#[derive(Debug, Error)]
pub enum LayoutLoadError {
    /// Neither a file nor a known layout name.
    #[error("layout not found: {0}")]
    NotFound(String),

    #[error("I/O error reading layout {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse layout {name}: {message}")]
    Parse { name: String, message: String },

    /// The file parsed but does not describe a usable keyboard.
    #[error("invalid layout {name}: {source}")]
    Invalid {
        name: String,
        #[source]
        source: KeyboardError,
    },
}

/// Turns a layout name or file path into a keyboard.
pub trait LayoutLoader: Send + Sync {
    fn load(&self, spec: &str) -> Result<KeyboardDescription, LayoutLoadError>;
}

/// Failure of a [`ContextFactory`] or [`ViewFactory`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct FactoryError(pub String);

/// Builds the view for a new context.
pub trait ViewFactory: Send + Sync {
    fn create_view(
        &self,
        id: ContextId,
        client_name: &str,
    ) -> Result<Arc<dyn KeyboardView>, FactoryError>;
}

/// Builds a fully wired [`Context`] for a new client session.
pub trait ContextFactory: Send + Sync {
    fn create_context(
        &self,
        id: ContextId,
        owner: ClientIdentity,
        client_name: &str,
    ) -> Result<Context, FactoryError>;
}

/// Subscribes to client disconnection.
///
/// After `watch(client)` the implementation must report the client's
/// disappearance exactly once, however it learns about it.
#[cfg_attr(test, mockall::automock)]
pub trait PresenceWatcher: Send + Sync {
    fn watch(&self, client: ClientIdentity);
}

/// A user key action reported by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Pressed(u32),
    Released(u32),
}

/// A key action tagged with the context whose view produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewEvent {
    pub context: ContextId,
    pub action: KeyAction,
}

/// The factory used in production: one view per context, keyboards from the
/// injected loader, repeat timing from configuration.
pub struct StandardContextFactory {
    loader: Arc<dyn LayoutLoader>,
    views: Arc<dyn ViewFactory>,
    repeat: RepeatSettings,
}

impl StandardContextFactory {
    pub fn new(
        loader: Arc<dyn LayoutLoader>,
        views: Arc<dyn ViewFactory>,
        repeat: RepeatSettings,
    ) -> Self {
        Self {
            loader,
            views,
            repeat,
        }
    }
}

impl ContextFactory for StandardContextFactory {
    fn create_context(
        &self,
        id: ContextId,
        owner: ClientIdentity,
        client_name: &str,
    ) -> Result<Context, FactoryError> {
        let view = self.views.create_view(id, client_name)?;
        let display_name = (!client_name.is_empty()).then(|| client_name.to_string());
        Ok(Context::new(
            id,
            owner,
            display_name,
            Arc::clone(&self.loader),
            view,
            self.repeat,
        ))
    }
}
