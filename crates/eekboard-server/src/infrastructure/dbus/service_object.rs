//! The `org.fedorahosted.Eekboard` object.

use eekboard_core::protocol::names::{context_path, parse_context_path};
use eekboard_core::ClientIdentity;
use zbus::message::Header;
use zbus::object_server::SignalEmitter;
use zbus::interface;

use super::commands::Commands;
use super::errors::EekboardError;

pub struct ServiceObject {
    commands: Commands,
}

impl ServiceObject {
    pub fn new(commands: Commands) -> Self {
        Self { commands }
    }
}

/// Unique bus name of the caller.
pub(super) fn caller(header: &Header<'_>) -> ClientIdentity {
    header
        .sender()
        .map(|s| ClientIdentity::new(s.as_str()))
        .unwrap_or_else(|| ClientIdentity::new(""))
}

fn context_id(path: &str) -> Result<eekboard_core::ContextId, EekboardError> {
    parse_context_path(path).ok_or_else(|| EekboardError::NotFound(format!("context not found: {path}")))
}

#[interface(name = "org.fedorahosted.Eekboard", spawn = false)]
impl ServiceObject {
    /// Returns the object path of the new context.
    async fn create_context(
        &self,
        #[zbus(header)] header: Header<'_>,
        client_name: &str,
    ) -> Result<String, EekboardError> {
        let id = self
            .commands
            .create_context(caller(&header), client_name.to_string())
            .await?;
        Ok(context_path(id))
    }

    async fn push_context(&self, object_path: &str) -> Result<(), EekboardError> {
        self.commands.push_context(context_id(object_path)?).await
    }

    async fn pop_context(&self, #[zbus(header)] header: Header<'_>) -> Result<(), EekboardError> {
        self.commands.pop_context(caller(&header)).await.map(|_| ())
    }

    async fn destroy_context(
        &self,
        #[zbus(header)] header: Header<'_>,
        object_path: &str,
    ) -> Result<(), EekboardError> {
        let id = context_id(object_path)?;
        self.commands.destroy_context(caller(&header), id).await
    }

    async fn show_keyboard(&self) -> Result<(), EekboardError> {
        self.commands.show_keyboard().await
    }

    async fn hide_keyboard(&self) -> Result<(), EekboardError> {
        self.commands.hide_keyboard().await
    }

    async fn destroy(&self) -> Result<(), EekboardError> {
        self.commands.destroy().await
    }

    #[zbus(signal)]
    pub async fn destroyed(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;
}
