//! Wire-facing vocabulary shared by the service and its clients.
//!
//! - **`names`** – bus name, object paths, interface names.
//! - **`notification`** – the ordered signal queue produced by the service.

pub mod names;
pub mod notification;
