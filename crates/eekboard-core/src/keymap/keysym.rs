//! X11 keysym name table.
//!
//! Layout files name their symbols with X11 keysym names (`a`, `Shift_L`,
//! `BackSpace`, ...). This table resolves such a name into the keysym value,
//! a display label, a category and the modifier the key drives, if any.
//!
//! Values are defined in X11/keysymdef.h.
//!
//! # Single-character names
//!
//! Printable Latin-1 characters are encoded 1:1 as their code point, so a
//! one-character name such as `a`, `Z` or `7` resolves without a table entry.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::modifiers::ModifierMask;

/// Broad classification of a symbol, used by renderers to pick a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum SymbolCategory {
    /// A printable character.
    Letter = 0,
    /// A key with an action (Return, Tab, arrows...).
    Function = 1,
    /// A modifier or a key only meaningful by its name.
    Keyname = 2,
    /// Not found in the table.
    Unknown = 8,
}

impl SymbolCategory {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => SymbolCategory::Letter,
            1 => SymbolCategory::Function,
            2 => SymbolCategory::Keyname,
            _ => SymbolCategory::Unknown,
        }
    }
}

/// A resolved keysym.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeysymEntry {
    pub value: u32,
    pub label: &'static str,
    pub category: SymbolCategory,
    pub modifier: u32,
}

const fn entry(value: u32, label: &'static str, category: SymbolCategory) -> KeysymEntry {
    KeysymEntry {
        value,
        label,
        category,
        modifier: ModifierMask::NONE,
    }
}

const fn modifier(value: u32, label: &'static str, mask: u32) -> KeysymEntry {
    KeysymEntry {
        value,
        label,
        category: SymbolCategory::Keyname,
        modifier: mask,
    }
}

/// Looks up a keysym by its X11 name.
///
/// Returns `None` for names not in the table.
pub fn lookup(name: &str) -> Option<KeysymEntry> {
    if let Some(found) = single_char(name) {
        return Some(found);
    }
    if let Some(found) = function_key(name) {
        return Some(found);
    }
    let found = named(name);
    if found.is_none() {
        trace!(name, "keysym not in table");
    }
    found
}

/// Modifier mask a keysym drives, `0` if none.
pub fn modifier_of(name: &str) -> u32 {
    lookup(name).map(|e| e.modifier).unwrap_or(ModifierMask::NONE)
}

fn single_char(name: &str) -> Option<KeysymEntry> {
    let mut chars = name.chars();
    let c = chars.next()?;
    if chars.next().is_some() || !c.is_ascii_graphic() {
        return None;
    }
    // One-character names are their own label; the label has to be 'static,
    // so index into a static table of printable ASCII.
    let idx = (c as usize) - 0x21;
    let label = PRINTABLE_ASCII.get(idx..idx + 1)?;
    Some(entry(c as u32, label, SymbolCategory::Letter))
}

const PRINTABLE_ASCII: &str =
    "!\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

fn function_key(name: &str) -> Option<KeysymEntry> {
    const LABELS: [&str; 12] = [
        "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
    ];
    let n: usize = name.strip_prefix('F')?.parse().ok()?;
    if !(1..=12).contains(&n) {
        return None;
    }
    // XK_F1 = 0xFFBE, consecutive through XK_F12.
    Some(entry(
        0xFFBE + (n as u32 - 1),
        LABELS[n - 1],
        SymbolCategory::Function,
    ))
}

fn named(name: &str) -> Option<KeysymEntry> {
    use SymbolCategory::{Function, Keyname, Letter};

    let e = match name {
        // Punctuation spelled out (XK_space .. XK_asciitilde)
        "space" => entry(0x0020, " ", Letter),
        "exclam" => entry(0x0021, "!", Letter),
        "quotedbl" => entry(0x0022, "\"", Letter),
        "numbersign" => entry(0x0023, "#", Letter),
        "dollar" => entry(0x0024, "$", Letter),
        "percent" => entry(0x0025, "%", Letter),
        "ampersand" => entry(0x0026, "&", Letter),
        "apostrophe" => entry(0x0027, "'", Letter),
        "parenleft" => entry(0x0028, "(", Letter),
        "parenright" => entry(0x0029, ")", Letter),
        "asterisk" => entry(0x002A, "*", Letter),
        "plus" => entry(0x002B, "+", Letter),
        "comma" => entry(0x002C, ",", Letter),
        "minus" => entry(0x002D, "-", Letter),
        "period" => entry(0x002E, ".", Letter),
        "slash" => entry(0x002F, "/", Letter),
        "colon" => entry(0x003A, ":", Letter),
        "semicolon" => entry(0x003B, ";", Letter),
        "less" => entry(0x003C, "<", Letter),
        "equal" => entry(0x003D, "=", Letter),
        "greater" => entry(0x003E, ">", Letter),
        "question" => entry(0x003F, "?", Letter),
        "at" => entry(0x0040, "@", Letter),
        "bracketleft" => entry(0x005B, "[", Letter),
        "backslash" => entry(0x005C, "\\", Letter),
        "bracketright" => entry(0x005D, "]", Letter),
        "asciicircum" => entry(0x005E, "^", Letter),
        "underscore" => entry(0x005F, "_", Letter),
        "grave" => entry(0x0060, "`", Letter),
        "braceleft" => entry(0x007B, "{", Letter),
        "bar" => entry(0x007C, "|", Letter),
        "braceright" => entry(0x007D, "}", Letter),
        "asciitilde" => entry(0x007E, "~", Letter),

        // Latin-1 supplement commonly found in level-3 positions
        "sterling" => entry(0x00A3, "£", Letter),
        "section" => entry(0x00A7, "§", Letter),
        "degree" => entry(0x00B0, "°", Letter),
        "mu" => entry(0x00B5, "µ", Letter),
        "ssharp" => entry(0x00DF, "ß", Letter),
        "adiaeresis" => entry(0x00E4, "ä", Letter),
        "odiaeresis" => entry(0x00F6, "ö", Letter),
        "udiaeresis" => entry(0x00FC, "ü", Letter),
        "Adiaeresis" => entry(0x00C4, "Ä", Letter),
        "Odiaeresis" => entry(0x00D6, "Ö", Letter),
        "Udiaeresis" => entry(0x00DC, "Ü", Letter),
        "EuroSign" => entry(0x20AC, "€", Letter),

        // TTY function keys
        "BackSpace" => entry(0xFF08, "⌫", Function),
        "Tab" => entry(0xFF09, "↹", Function),
        "ISO_Left_Tab" => entry(0xFE20, "↹", Function),
        "Return" => entry(0xFF0D, "⏎", Function),
        "Pause" => entry(0xFF13, "Pause", Function),
        "Scroll_Lock" => entry(0xFF14, "ScrLk", Function),
        "Escape" => entry(0xFF1B, "Esc", Function),
        "Delete" => entry(0xFFFF, "Del", Function),

        // Cursor control
        "Home" => entry(0xFF50, "Home", Function),
        "Left" => entry(0xFF51, "←", Function),
        "Up" => entry(0xFF52, "↑", Function),
        "Right" => entry(0xFF53, "→", Function),
        "Down" => entry(0xFF54, "↓", Function),
        "Page_Up" => entry(0xFF55, "PgUp", Function),
        "Page_Down" => entry(0xFF56, "PgDn", Function),
        "End" => entry(0xFF57, "End", Function),
        "Insert" => entry(0xFF63, "Ins", Function),
        "Print" => entry(0xFF61, "PrtSc", Function),
        "Menu" => entry(0xFF67, "Menu", Function),
        "Num_Lock" => entry(0xFF7F, "NumLk", Function),

        // Keypad
        "KP_Enter" => entry(0xFF8D, "⏎", Function),
        "KP_Multiply" => entry(0xFFAA, "*", Letter),
        "KP_Add" => entry(0xFFAB, "+", Letter),
        "KP_Subtract" => entry(0xFFAD, "-", Letter),
        "KP_Decimal" => entry(0xFFAE, ".", Letter),
        "KP_Divide" => entry(0xFFAF, "/", Letter),
        "KP_0" => entry(0xFFB0, "0", Letter),
        "KP_1" => entry(0xFFB1, "1", Letter),
        "KP_2" => entry(0xFFB2, "2", Letter),
        "KP_3" => entry(0xFFB3, "3", Letter),
        "KP_4" => entry(0xFFB4, "4", Letter),
        "KP_5" => entry(0xFFB5, "5", Letter),
        "KP_6" => entry(0xFFB6, "6", Letter),
        "KP_7" => entry(0xFFB7, "7", Letter),
        "KP_8" => entry(0xFFB8, "8", Letter),
        "KP_9" => entry(0xFFB9, "9", Letter),

        // Modifiers
        "Shift_L" => modifier(0xFFE1, "Shift", ModifierMask::SHIFT),
        "Shift_R" => modifier(0xFFE2, "Shift", ModifierMask::SHIFT),
        "Control_L" => modifier(0xFFE3, "Ctrl", ModifierMask::CONTROL),
        "Control_R" => modifier(0xFFE4, "Ctrl", ModifierMask::CONTROL),
        "Caps_Lock" => modifier(0xFFE5, "Caps", ModifierMask::SHIFT),
        "Shift_Lock" => modifier(0xFFE6, "Shift", ModifierMask::SHIFT),
        "Meta_L" => modifier(0xFFE7, "Meta", ModifierMask::META),
        "Meta_R" => modifier(0xFFE8, "Meta", ModifierMask::META),
        "Alt_L" => modifier(0xFFE9, "Alt", ModifierMask::MOD1),
        "Alt_R" => modifier(0xFFEA, "Alt", ModifierMask::MOD1),
        "Super_L" => modifier(0xFFEB, "Super", ModifierMask::SUPER),
        "Super_R" => modifier(0xFFEC, "Super", ModifierMask::SUPER),
        "Hyper_L" => modifier(0xFFED, "Hyper", ModifierMask::HYPER),
        "Hyper_R" => modifier(0xFFEE, "Hyper", ModifierMask::HYPER),
        "ISO_Level3_Shift" => modifier(0xFE03, "AltGr", ModifierMask::MOD5),
        // Mode_switch selects a group, not a level; it drives no mask here.
        "Mode_switch" => entry(0xFF7E, "Mode", Keyname),

        _ => return None,
    };
    Some(e)
}
