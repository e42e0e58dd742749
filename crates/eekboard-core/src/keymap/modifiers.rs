//! Modifier bit masks carried in `KeyPressed` notifications.
//!
//! The values follow the X11/GDK modifier layout so a client can hand the
//! mask straight to its toolkit.

use serde::{Deserialize, Serialize};

/// A set of modifier bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ModifierMask(pub u32);

impl ModifierMask {
    pub const NONE: u32 = 0;
    pub const SHIFT: u32 = 1 << 0;
    pub const LOCK: u32 = 1 << 1;
    pub const CONTROL: u32 = 1 << 2;
    pub const MOD1: u32 = 1 << 3;
    pub const MOD2: u32 = 1 << 4;
    pub const MOD3: u32 = 1 << 5;
    pub const MOD4: u32 = 1 << 6;
    /// ISO level 3 shift (AltGr).
    pub const MOD5: u32 = 1 << 7;
    pub const SUPER: u32 = 1 << 26;
    pub const HYPER: u32 = 1 << 27;
    pub const META: u32 = 1 << 28;

    pub fn empty() -> Self {
        Self(Self::NONE)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == Self::NONE
    }

    pub fn contains(self, bits: u32) -> bool {
        bits != 0 && self.0 & bits == bits
    }

    pub fn insert(&mut self, bits: u32) {
        self.0 |= bits;
    }

    pub fn remove(&mut self, bits: u32) {
        self.0 &= !bits;
    }

    pub fn toggle(&mut self, bits: u32) {
        self.0 ^= bits;
    }

    /// Symbol matrix level selected by this modifier state.
    ///
    /// Shift selects level 1, level-3 shift selects level 2, both select 3.
    pub fn level(self) -> usize {
        let shift = self.0 & (Self::SHIFT | Self::LOCK) != 0;
        let level3 = self.0 & Self::MOD5 != 0;
        match (shift, level3) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }
}

/// How pressing a modifier key changes the keyboard's modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModifierBehavior {
    /// Modifiers are held while the key is down and cleared on release.
    #[default]
    None,
    /// Each press toggles the modifier.
    Lock,
    /// The modifier stays set until the next non-modifier key is released.
    Latch,
}
