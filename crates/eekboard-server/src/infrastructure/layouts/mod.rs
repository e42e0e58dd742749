//! Layout loaders: turn an `AddKeyboard` argument into a keyboard.
//!
//! - **`toml_loader`** – reads TOML layout files by path or by name from the
//!   configured layout directory.
//! - **`memory`** – serves layouts registered in memory; used by tests and
//!   carries the bundled US layout.

pub mod memory;
pub mod toml_loader;

pub use memory::{InMemoryLayoutLoader, BUILTIN_US};
pub use toml_loader::{parse_layout, TomlLayoutLoader};
