//! Domain entities for the eekboard service.
//!
//! Pure data and rules with no bus, file-system or UI dependency, so both the
//! server and client crates can use them and they can be tested anywhere.

/// Context, keyboard and client identifiers.
pub mod ids;
/// Keyboard layouts and their runtime modifier state.
///
/// See [`keyboard::KeyboardDescription`] for the main type.
pub mod keyboard;
