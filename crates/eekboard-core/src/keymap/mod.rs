//! Keysym names and modifier masks.
//!
//! Layout files refer to symbols by X11 keysym name; [`keysym::lookup`]
//! resolves a name to its value, label, category and modifier.

pub mod keysym;
pub mod modifiers;

pub use keysym::{KeysymEntry, SymbolCategory};
pub use modifiers::{ModifierBehavior, ModifierMask};
