//! Proxy for the `org.fedorahosted.Eekboard` service object.

use zbus::proxy;

#[proxy(
    interface = "org.fedorahosted.Eekboard",
    default_service = "org.fedorahosted.Eekboard",
    default_path = "/org/fedorahosted/Eekboard",
    gen_blocking = false
)]
pub trait Eekboard {
    /// Creates a context and returns its object path.
    fn create_context(&self, client_name: &str) -> zbus::Result<String>;

    fn push_context(&self, object_path: &str) -> zbus::Result<()>;

    fn pop_context(&self) -> zbus::Result<()>;

    fn destroy_context(&self, object_path: &str) -> zbus::Result<()>;

    fn show_keyboard(&self) -> zbus::Result<()>;

    fn hide_keyboard(&self) -> zbus::Result<()>;

    fn destroy(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn destroyed(&self) -> zbus::Result<()>;
}
