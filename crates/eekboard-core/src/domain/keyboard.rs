//! Keyboard model: keys, their symbol matrices and the live modifier state.
//!
//! A [`KeyboardDescription`] is produced by a layout loader and then owned by
//! exactly one context. The description itself never changes shape after
//! construction; only its runtime state (current group, modifiers, pressed
//! keys) does.
//!
//! # Symbol matrix
//!
//! Every key holds a `groups × levels` matrix of [`Symbol`]s. The group is a
//! keyboard-wide setting (the active layout, e.g. "us" vs. "ru"), the level
//! is derived from the modifiers (see [`ModifierMask::level`]).
//!
//! ```text
//!             level 0   level 1   level 2   level 3
//!  group 0      a         A         æ         Æ
//!  group 1      ф         Ф
//! ```
//!
//! Lookups fall back to level 0 of the same group, then to group 0 level 0.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keymap::keysym::{self, SymbolCategory};
use crate::keymap::modifiers::{ModifierBehavior, ModifierMask};

/// Errors raised while building or driving a keyboard.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyboardError {
    /// The description contains no keys at all.
    #[error("keyboard has no keys")]
    Empty,

    /// A key has an empty symbol matrix (or an empty group row).
    #[error("key {keycode} has no symbols")]
    EmptyKey { keycode: u32 },

    /// Two keys share one keycode.
    #[error("duplicate keycode {0}")]
    DuplicateKeycode(u32),

    /// No key carries the requested keycode.
    #[error("key for {0} is not found")]
    KeyNotFound(u32),
}

/// Wire form of a symbol: `(name, label, category, modifier_mask)`.
pub type WireSymbol = (String, String, u32, u32);

/// A single symbol a key can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// X11 keysym name, e.g. `"a"` or `"Shift_L"`.
    pub name: String,
    /// Text to draw on the key cap.
    pub label: String,
    pub category: SymbolCategory,
    /// Modifier bits this symbol drives when its key is pressed.
    pub modifier_mask: u32,
}

impl Symbol {
    /// Builds a symbol from a keysym name.
    ///
    /// Names missing from the keysym table are kept verbatim with
    /// [`SymbolCategory::Unknown`] so that custom layouts still load.
    pub fn from_keysym_name(name: &str) -> Self {
        match keysym::lookup(name) {
            Some(e) => Self {
                name: name.to_string(),
                label: e.label.to_string(),
                category: e.category,
                modifier_mask: e.modifier,
            },
            None => Self {
                name: name.to_string(),
                label: name.to_string(),
                category: SymbolCategory::Unknown,
                modifier_mask: ModifierMask::NONE,
            },
        }
    }

    pub fn is_modifier(&self) -> bool {
        self.modifier_mask != ModifierMask::NONE
    }

    pub fn to_wire(&self) -> WireSymbol {
        (
            self.name.clone(),
            self.label.clone(),
            self.category.as_u32(),
            self.modifier_mask,
        )
    }

    pub fn from_wire(wire: WireSymbol) -> Self {
        let (name, label, category, modifier_mask) = wire;
        Self {
            name,
            label,
            category: SymbolCategory::from_u32(category),
            modifier_mask,
        }
    }
}

/// One key of a keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub keycode: u32,
    /// Key name as used by XKB, e.g. `"AC01"`.
    pub name: String,
    /// `symbols[group][level]`.
    pub symbols: Vec<Vec<Symbol>>,
}

impl Key {
    pub fn new(keycode: u32, name: impl Into<String>, symbols: Vec<Vec<Symbol>>) -> Self {
        Self {
            keycode,
            name: name.into(),
            symbols,
        }
    }

    /// Convenience constructor from keysym names laid out as `[group][level]`.
    pub fn from_keysym_names(keycode: u32, name: impl Into<String>, names: &[&[&str]]) -> Self {
        let symbols = names
            .iter()
            .map(|group| group.iter().map(|n| Symbol::from_keysym_name(n)).collect())
            .collect();
        Self::new(keycode, name, symbols)
    }

    /// Symbol at `(group, level)` with fallback to level 0, then to group 0.
    pub fn symbol(&self, group: usize, level: usize) -> Option<&Symbol> {
        if let Some(row) = self.symbols.get(group) {
            if let Some(sym) = row.get(level).or_else(|| row.first()) {
                return Some(sym);
            }
        }
        self.symbols.first().and_then(|row| row.first())
    }

    /// Modifier bits driven by this key, taken from its base symbol.
    pub fn modifier_mask(&self) -> u32 {
        self.symbol(0, 0)
            .map(|s| s.modifier_mask)
            .unwrap_or(ModifierMask::NONE)
    }
}

/// The payload a key event produces for observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub keycode: u32,
    pub keyname: String,
    pub symbol: Symbol,
    pub modifiers: u32,
}

/// A loaded keyboard layout plus its runtime state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardDescription {
    name: String,
    keys: BTreeMap<u32, Key>,
    num_groups: usize,
    group: i32,
    modifiers: ModifierMask,
    behavior: ModifierBehavior,
    pressed: BTreeSet<u32>,
}

impl KeyboardDescription {
    /// Validates `keys` and builds a keyboard in group 0 with no modifiers.
    ///
    /// # Errors
    ///
    /// - [`KeyboardError::Empty`] if `keys` is empty.
    /// - [`KeyboardError::EmptyKey`] if a key has no symbols in some group.
    /// - [`KeyboardError::DuplicateKeycode`] if two keys share a keycode.
    pub fn new(name: impl Into<String>, keys: Vec<Key>) -> Result<Self, KeyboardError> {
        if keys.is_empty() {
            return Err(KeyboardError::Empty);
        }

        let mut by_code = BTreeMap::new();
        let mut num_groups = 1;
        for key in keys {
            if key.symbols.is_empty() || key.symbols.iter().any(Vec::is_empty) {
                return Err(KeyboardError::EmptyKey {
                    keycode: key.keycode,
                });
            }
            num_groups = num_groups.max(key.symbols.len());
            let keycode = key.keycode;
            if by_code.insert(keycode, key).is_some() {
                return Err(KeyboardError::DuplicateKeycode(keycode));
            }
        }

        Ok(Self {
            name: name.into(),
            keys: by_code,
            num_groups,
            group: 0,
            modifiers: ModifierMask::empty(),
            behavior: ModifierBehavior::None,
            pressed: BTreeSet::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.keys.values()
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    pub fn find_key(&self, keycode: u32) -> Option<&Key> {
        self.keys.get(&keycode)
    }

    /// The group last set, exactly as requested by the client.
    pub fn group(&self) -> i32 {
        self.group
    }

    pub fn set_group(&mut self, group: i32) {
        self.group = group;
    }

    /// Group index actually used for lookups, wrapped into range.
    pub fn effective_group(&self) -> usize {
        // num_groups is at least 1, so the cast and rem_euclid are safe.
        self.group.rem_euclid(self.num_groups as i32) as usize
    }

    pub fn modifiers(&self) -> u32 {
        self.modifiers.bits()
    }

    pub fn set_modifiers(&mut self, modifiers: u32) {
        self.modifiers = ModifierMask(modifiers);
    }

    pub fn modifier_behavior(&self) -> ModifierBehavior {
        self.behavior
    }

    pub fn set_modifier_behavior(&mut self, behavior: ModifierBehavior) {
        self.behavior = behavior;
    }

    pub fn is_pressed(&self, keycode: u32) -> bool {
        self.pressed.contains(&keycode)
    }

    /// Symbol the key currently produces given group and modifiers.
    pub fn current_symbol(&self, keycode: u32) -> Option<&Symbol> {
        self.find_key(keycode)?
            .symbol(self.effective_group(), self.modifiers.level())
    }

    /// Describes what a key would report right now, without changing state.
    pub fn describe(&self, keycode: u32) -> Result<KeyEvent, KeyboardError> {
        let key = self
            .find_key(keycode)
            .ok_or(KeyboardError::KeyNotFound(keycode))?;
        let symbol = key
            .symbol(self.effective_group(), self.modifiers.level())
            .cloned()
            .ok_or(KeyboardError::EmptyKey { keycode })?;
        Ok(KeyEvent {
            keycode,
            keyname: key.name.clone(),
            symbol,
            modifiers: self.modifiers.bits(),
        })
    }

    /// Presses a key, updating the modifier state if it is a modifier key.
    ///
    /// The returned event reflects the state before the press took effect.
    pub fn press(&mut self, keycode: u32) -> Result<KeyEvent, KeyboardError> {
        let event = self.describe(keycode)?;
        let mask = event.symbol.modifier_mask;
        if mask != ModifierMask::NONE {
            match self.behavior {
                ModifierBehavior::None | ModifierBehavior::Latch => self.modifiers.insert(mask),
                ModifierBehavior::Lock => self.modifiers.toggle(mask),
            }
        }
        self.pressed.insert(keycode);
        Ok(event)
    }

    /// Releases a key.
    ///
    /// Under [`ModifierBehavior::None`] a modifier is dropped when its key is
    /// released; under [`ModifierBehavior::Latch`] releasing any ordinary key
    /// clears every latched modifier. The returned event reflects the state
    /// before the release took effect.
    pub fn release(&mut self, keycode: u32) -> Result<KeyEvent, KeyboardError> {
        let event = self.describe(keycode)?;
        let mask = event.symbol.modifier_mask;
        match (self.behavior, mask != ModifierMask::NONE) {
            (ModifierBehavior::None, true) => self.modifiers.remove(mask),
            (ModifierBehavior::Latch, false) => self.modifiers = ModifierMask::empty(),
            _ => {}
        }
        self.pressed.remove(&keycode);
        Ok(event)
    }
}
