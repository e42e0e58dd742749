//! The `org.fedorahosted.Eekboard.Context` objects, one per context.

use eekboard_core::{ContextId, KeyboardId, WireSymbol};
use zbus::interface;
use zbus::object_server::SignalEmitter;

use super::commands::Commands;
use super::errors::EekboardError;
use crate::application::{CallReply, ContextCall};

pub struct ContextObject {
    id: ContextId,
    commands: Commands,
}

impl ContextObject {
    pub fn new(id: ContextId, commands: Commands) -> Self {
        Self { id, commands }
    }

    async fn call(&self, call: ContextCall) -> Result<CallReply, EekboardError> {
        self.commands.context_call(self.id, call).await
    }

    async fn call_unit(&self, call: ContextCall) -> Result<(), EekboardError> {
        self.call(call).await.map(|_| ())
    }
}

#[interface(name = "org.fedorahosted.Eekboard.Context", spawn = false)]
impl ContextObject {
    /// Loads a layout and returns its keyboard id.
    async fn add_keyboard(&self, keyboard: &str) -> Result<u32, EekboardError> {
        match self.call(ContextCall::AddKeyboard(keyboard.to_string())).await? {
            CallReply::KeyboardAdded(id) => Ok(id.0),
            CallReply::Done => Err(EekboardError::InvalidDescription(
                "no keyboard id returned".into(),
            )),
        }
    }

    async fn remove_keyboard(&self, keyboard_id: u32) -> Result<(), EekboardError> {
        self.call_unit(ContextCall::RemoveKeyboard(KeyboardId(keyboard_id)))
            .await
    }

    async fn set_keyboard(&self, keyboard_id: u32) -> Result<(), EekboardError> {
        self.call_unit(ContextCall::SetKeyboard(KeyboardId(keyboard_id)))
            .await
    }

    async fn set_fullscreen(&self, fullscreen: bool) -> Result<(), EekboardError> {
        self.call_unit(ContextCall::SetFullscreen(fullscreen)).await
    }

    async fn show_keyboard(&self) -> Result<(), EekboardError> {
        self.call_unit(ContextCall::ShowKeyboard).await
    }

    async fn hide_keyboard(&self) -> Result<(), EekboardError> {
        self.call_unit(ContextCall::HideKeyboard).await
    }

    async fn set_group(&self, group: i32) -> Result<(), EekboardError> {
        self.call_unit(ContextCall::SetGroup(group)).await
    }

    async fn press_keycode(&self, keycode: u32) -> Result<(), EekboardError> {
        self.call_unit(ContextCall::PressKeycode(keycode)).await
    }

    async fn release_keycode(&self, keycode: u32) -> Result<(), EekboardError> {
        self.call_unit(ContextCall::ReleaseKeycode(keycode)).await
    }

    #[zbus(signal)]
    pub async fn enabled(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn disabled(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn destroyed(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn key_pressed(
        emitter: &SignalEmitter<'_>,
        keyname: &str,
        symbol: WireSymbol,
        modifiers: u32,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn visibility_changed(emitter: &SignalEmitter<'_>, visible: bool) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn keyboard_changed(emitter: &SignalEmitter<'_>, keyboard_id: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    pub async fn group_changed(emitter: &SignalEmitter<'_>, group: i32) -> zbus::Result<()>;
}
