//! Proxy for `org.fedorahosted.Eekboard.Context` objects.

use eekboard_core::WireSymbol;
use zbus::proxy;

#[proxy(
    interface = "org.fedorahosted.Eekboard.Context",
    default_service = "org.fedorahosted.Eekboard",
    gen_blocking = false
)]
pub trait Context {
    fn add_keyboard(&self, keyboard: &str) -> zbus::Result<u32>;

    fn remove_keyboard(&self, keyboard_id: u32) -> zbus::Result<()>;

    fn set_keyboard(&self, keyboard_id: u32) -> zbus::Result<()>;

    fn set_fullscreen(&self, fullscreen: bool) -> zbus::Result<()>;

    fn show_keyboard(&self) -> zbus::Result<()>;

    fn hide_keyboard(&self) -> zbus::Result<()>;

    fn set_group(&self, group: i32) -> zbus::Result<()>;

    fn press_keycode(&self, keycode: u32) -> zbus::Result<()>;

    fn release_keycode(&self, keycode: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    fn enabled(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn disabled(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn destroyed(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn key_pressed(&self, keyname: &str, symbol: WireSymbol, modifiers: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    fn visibility_changed(&self, visible: bool) -> zbus::Result<()>;

    #[zbus(signal)]
    fn keyboard_changed(&self, keyboard_id: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    fn group_changed(&self, group: i32) -> zbus::Result<()>;
}
