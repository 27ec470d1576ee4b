//! Persisted user settings (TOML).
//!
//! Unlike the process config, settings are written back whenever the user
//! changes them, and a missing or corrupted file is regenerated from fixed
//! defaults instead of failing the session.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::dungeon::chapter_name;
use crate::core::types::HealingStrategy;
use crate::io::config::write_atomic;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub healing_strategy: HealingStrategy,
    pub selected_dungeon: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            healing_strategy: HealingStrategy::AlwaysHeal,
            selected_dungeon: 6,
        }
    }
}

impl Settings {
    fn is_valid(&self) -> bool {
        chapter_name(self.selected_dungeon).is_some()
    }
}

/// Load settings, regenerating the file from defaults when it is missing,
/// unparsable, or names a chapter that does not exist.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        let settings = Settings::default();
        write_settings(path, &settings)?;
        return Ok(settings);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    match toml::from_str::<Settings>(&contents) {
        Ok(settings) if settings.is_valid() => Ok(settings),
        Ok(settings) => {
            warn!(
                dungeon = settings.selected_dungeon,
                "settings name an unknown chapter, regenerating defaults"
            );
            let settings = Settings::default();
            write_settings(path, &settings)?;
            Ok(settings)
        }
        Err(err) => {
            warn!(err = %err, path = %path.display(), "corrupted settings, regenerating defaults");
            let settings = Settings::default();
            write_settings(path, &settings)?;
            Ok(settings)
        }
    }
}

/// Atomically write settings to disk (temp file + rename).
pub fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    let mut buf = toml::to_string_pretty(settings).context("serialize settings toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_regenerated_with_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.toml");
        let settings = load_settings(&path).expect("load");
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
    }

    #[test]
    fn corrupted_file_is_regenerated() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.toml");
        fs::write(&path, "healing_strategy = 12").expect("write junk");
        let settings = load_settings(&path).expect("load");
        assert_eq!(settings, Settings::default());
        let reloaded = load_settings(&path).expect("reload");
        assert_eq!(reloaded, Settings::default());
    }

    #[test]
    fn unknown_chapter_is_regenerated() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.toml");
        write_settings(
            &path,
            &Settings {
                healing_strategy: HealingStrategy::AlwaysPowerUp,
                selected_dungeon: 99,
            },
        )
        .expect("write");
        let settings = load_settings(&path).expect("load");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.toml");
        let settings = Settings {
            healing_strategy: HealingStrategy::AlwaysPowerUp,
            selected_dungeon: 10,
        };
        write_settings(&path, &settings).expect("write");
        assert_eq!(load_settings(&path).expect("load"), settings);
    }
}
