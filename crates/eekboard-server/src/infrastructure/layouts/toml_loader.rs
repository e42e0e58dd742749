//! Layout files in TOML.
//!
//! ```toml
//! name = "us"
//!
//! [[keys]]
//! keycode = 38
//! name = "AC01"
//! symbols = [["a", "A"]]   # groups × levels, X keysym names
//! ```

use std::path::{Path, PathBuf};

use eekboard_core::{Key, KeyboardDescription, Symbol};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::application::{LayoutLoadError, LayoutLoader};

#[derive(Debug, Deserialize)]
struct LayoutFile {
    name: Option<String>,
    #[serde(default)]
    keys: Vec<KeyEntry>,
}

#[derive(Debug, Deserialize)]
struct KeyEntry {
    keycode: u32,
    name: String,
    #[serde(default)]
    symbols: Vec<Vec<String>>,
}

/// Parses layout TOML into a keyboard.
///
/// `fallback_name` is used when the file has no top-level `name`.
pub fn parse_layout(fallback_name: &str, source: &str) -> Result<KeyboardDescription, LayoutLoadError> {
    let file: LayoutFile = toml::from_str(source).map_err(|e| LayoutLoadError::Parse {
        name: fallback_name.to_string(),
        message: e.to_string(),
    })?;
    let name = file.name.unwrap_or_else(|| fallback_name.to_string());

    let keys = file
        .keys
        .into_iter()
        .map(|k| {
            let symbols = k
                .symbols
                .iter()
                .map(|group| group.iter().map(|s| Symbol::from_keysym_name(s)).collect())
                .collect();
            Key::new(k.keycode, k.name, symbols)
        })
        .collect();

    KeyboardDescription::new(name.clone(), keys)
        .map_err(|source| LayoutLoadError::Invalid { name, source })
}

/// Loads layouts from files, by path or by name under a directory.
#[derive(Debug, Clone)]
pub struct TomlLayoutLoader {
    directory: PathBuf,
}

impl TomlLayoutLoader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// An argument naming an existing file, or ending in `.toml`, is a path;
    /// anything else is a layout name under the directory.
    pub fn resolve(&self, spec: &str) -> PathBuf {
        let as_path = Path::new(spec);
        if as_path.is_file() || spec.ends_with(".toml") {
            as_path.to_path_buf()
        } else {
            self.directory.join(format!("{spec}.toml"))
        }
    }
}

impl LayoutLoader for TomlLayoutLoader {
    fn load(&self, spec: &str) -> Result<KeyboardDescription, LayoutLoadError> {
        let path = self.resolve(spec);
        let source = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LayoutLoadError::NotFound(spec.to_string())
            } else {
                LayoutLoadError::Io {
                    path: path.clone(),
                    source,
                }
            }
        });
        let source = match source {
            Ok(s) => s,
            Err(e) => {
                warn!(spec, path = %path.display(), error = %e, "layout load failed");
                return Err(e);
            }
        };

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(spec);
        let keyboard = parse_layout(stem, &source).inspect_err(|e| {
            warn!(spec, path = %path.display(), error = %e, "layout is invalid");
        })?;
        debug!(spec, name = keyboard.name(), keys = keyboard.key_count(), "layout loaded");
        Ok(keyboard)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use eekboard_core::KeyboardError;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("eekboard_layouts_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    const TWO_KEYS: &str = r#"
name = "mini"

[[keys]]
keycode = 38
name = "AC01"
symbols = [["a", "A"], ["b"]]

[[keys]]
keycode = 50
name = "LFSH"
symbols = [["Shift_L"]]
"#;

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_layout_builds_groups_and_levels() {
        let kb = parse_layout("fallback", TWO_KEYS).unwrap();

        assert_eq!(kb.name(), "mini");
        assert_eq!(kb.key_count(), 2);
        assert_eq!(kb.num_groups(), 2);
        assert_eq!(kb.current_symbol(38).unwrap().name, "a");
    }

    #[test]
    fn test_parse_layout_without_name_uses_fallback() {
        let kb = parse_layout("fallback", "[[keys]]\nkeycode = 9\nname = \"ESC\"\nsymbols = [[\"Escape\"]]\n")
            .unwrap();
        assert_eq!(kb.name(), "fallback");
    }

    #[test]
    fn test_parse_layout_without_keys_is_invalid() {
        let err = parse_layout("empty", "name = \"empty\"\n").unwrap_err();
        assert!(matches!(
            err,
            LayoutLoadError::Invalid {
                source: KeyboardError::Empty,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_layout_key_without_symbols_is_invalid() {
        let err = parse_layout("bad", "[[keys]]\nkeycode = 9\nname = \"ESC\"\n").unwrap_err();
        assert!(matches!(err, LayoutLoadError::Invalid { .. }));
    }

    #[test]
    fn test_parse_layout_duplicate_keycode_is_invalid() {
        let src = "[[keys]]\nkeycode = 9\nname = \"A\"\nsymbols = [[\"a\"]]\n\
                   [[keys]]\nkeycode = 9\nname = \"B\"\nsymbols = [[\"b\"]]\n";
        let err = parse_layout("dup", src).unwrap_err();
        assert!(matches!(
            err,
            LayoutLoadError::Invalid {
                source: KeyboardError::DuplicateKeycode(9),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_layout_malformed_toml_is_parse_error() {
        let err = parse_layout("broken", "[[[ nope").unwrap_err();
        assert!(matches!(err, LayoutLoadError::Parse { .. }));
    }

    // ── Resolution ────────────────────────────────────────────────────────────

    #[test]
    fn test_load_by_name_reads_from_directory() {
        let dir = scratch_dir();
        std::fs::write(dir.join("mini.toml"), TWO_KEYS).unwrap();
        let loader = TomlLayoutLoader::new(&dir);

        let kb = loader.load("mini").unwrap();

        assert_eq!(kb.name(), "mini");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_by_path_ignores_directory() {
        let dir = scratch_dir();
        let path = dir.join("custom.toml");
        std::fs::write(&path, TWO_KEYS).unwrap();
        let loader = TomlLayoutLoader::new("/nonexistent");

        let kb = loader.load(path.to_str().unwrap()).unwrap();

        assert_eq!(kb.key_count(), 2);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_unknown_name_is_not_found() {
        let dir = scratch_dir();
        let loader = TomlLayoutLoader::new(&dir);

        let err = loader.load("klingon").unwrap_err();

        assert!(matches!(err, LayoutLoadError::NotFound(ref s) if s == "klingon"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_resolve_treats_toml_suffix_as_path() {
        let loader = TomlLayoutLoader::new("/layouts");
        assert_eq!(loader.resolve("de"), PathBuf::from("/layouts/de.toml"));
        assert_eq!(loader.resolve("my/own.toml"), PathBuf::from("my/own.toml"));
    }

    #[test]
    fn test_bundled_us_layout_parses() {
        let source = include_str!("../../../layouts/us.toml");
        let kb = parse_layout("us", source).unwrap();
        assert_eq!(kb.name(), "us");
        assert_eq!(kb.current_symbol(38).unwrap().name, "a");
        assert!(kb.find_key(50).unwrap().symbols[0][0].is_modifier());
    }
}
