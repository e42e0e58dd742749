//! Infrastructure layer of the client library: the bus.
//!
//! - **`proxy`** – zbus proxies generated for both interfaces.
//! - **`session`** – `EekboardClient` and `KeyboardContext`, which wrap the
//!   proxies and keep a context's mirrored state current.

pub mod proxy;
pub mod session;

pub use proxy::{ContextProxy, EekboardProxy};
pub use session::{ClientError, EekboardClient, KeyboardContext};
