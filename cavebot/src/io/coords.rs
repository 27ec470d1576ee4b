//! Per-resolution normalized coordinate tables.
//!
//! Taps and swipes are recorded as fractions of the screen so one table
//! serves every device of the same aspect ratio. Tables live under
//! `data/<WxH>/{buttons.json, movements.json}`; the folder is picked at
//! startup by device size, falling back to the first available folder and
//! finally to the embedded 1080x1920 defaults.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::{debug, warn};

const DEFAULT_SIZE: &str = "1080x1920";
const DEFAULT_BUTTONS: &str = include_str!("../../data/1080x1920/buttons.json");
const DEFAULT_MOVEMENTS: &str = include_str!("../../data/1080x1920/movements.json");

/// Normalized button and movement coordinates for one resolution family.
#[derive(Debug, Clone, Deserialize)]
pub struct CoordBook {
    buttons: HashMap<String, [f64; 2]>,
    movements: HashMap<String, [[f64; 2]; 2]>,
}

impl CoordBook {
    /// Load the table matching `width`x`height` from `data_dir`.
    pub fn load(data_dir: &Path, width: u32, height: u32) -> Result<Self> {
        let wanted = format!("{width}x{height}");
        let folders = size_folders(data_dir)?;
        if folders.is_empty() {
            warn!(
                data_dir = %data_dir.display(),
                "no coordinate folders found, using embedded {DEFAULT_SIZE} tables"
            );
            return Self::embedded();
        }
        let folder = if folders.contains(&wanted) {
            wanted
        } else {
            let fallback = folders[0].clone();
            warn!(
                %wanted,
                %fallback, "no coordinate table for this resolution, trying fallback"
            );
            fallback
        };
        debug!(%folder, "loading coordinate tables");
        let dir = data_dir.join(&folder);
        let book = Self {
            buttons: load_json(&dir.join("buttons.json"))?,
            movements: load_json(&dir.join("movements.json"))?,
        };
        book.validate()?;
        Ok(book)
    }

    pub fn embedded() -> Result<Self> {
        let book = Self {
            buttons: serde_json::from_str(DEFAULT_BUTTONS).context("parse embedded buttons")?,
            movements: serde_json::from_str(DEFAULT_MOVEMENTS)
                .context("parse embedded movements")?,
        };
        book.validate()?;
        Ok(book)
    }

    pub fn button(&self, name: &str) -> Result<[f64; 2]> {
        self.buttons
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown button {name:?}"))
    }

    pub fn movement(&self, label: &str) -> Result<[[f64; 2]; 2]> {
        self.movements
            .get(label)
            .copied()
            .ok_or_else(|| anyhow!("unknown movement {label:?}"))
    }

    /// Every coordinate must be a screen fraction.
    pub fn validate(&self) -> Result<()> {
        for (name, [x, y]) in &self.buttons {
            if !normalized(*x) || !normalized(*y) {
                return Err(anyhow!("button {name:?} out of 0..=1 range"));
            }
        }
        for (name, segment) in &self.movements {
            for [x, y] in segment {
                if !normalized(*x) || !normalized(*y) {
                    return Err(anyhow!("movement {name:?} out of 0..=1 range"));
                }
            }
        }
        Ok(())
    }
}

fn normalized(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

/// Size folders available under the data dir, sorted for a stable fallback.
fn size_folders(data_dir: &Path) -> Result<Vec<String>> {
    if !data_dir.exists() {
        return Ok(Vec::new());
    }
    let mut folders = Vec::new();
    for entry in
        fs::read_dir(data_dir).with_context(|| format!("read dir {}", data_dir.display()))?
    {
        let entry = entry.context("read dir entry")?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if parse_size(&name).is_some() {
            folders.push(name);
        }
    }
    folders.sort();
    Ok(folders)
}

/// Parse a "WxH" folder or override string.
pub fn parse_size(name: &str) -> Option<(u32, u32)> {
    let (w, h) = name.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_tables_parse_and_validate() {
        let book = CoordBook::embedded().expect("embedded coords");
        assert!(book.button("start").is_ok());
        assert!(book.movement("n").is_ok());
        assert!(book.button("no_such_button").is_err());
    }

    #[test]
    fn loads_matching_folder_from_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("720x1280");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("buttons.json"), r#"{"start": [0.5, 0.9]}"#).expect("write");
        fs::write(
            dir.join("movements.json"),
            r#"{"n": [[0.5, 0.7], [0.5, 0.3]]}"#,
        )
        .expect("write");

        let book = CoordBook::load(temp.path(), 720, 1280).expect("load");
        assert_eq!(book.button("start").expect("button"), [0.5, 0.9]);
    }

    #[test]
    fn missing_resolution_falls_back_to_first_folder() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("720x1280");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("buttons.json"), r#"{"start": [0.5, 0.9]}"#).expect("write");
        fs::write(
            dir.join("movements.json"),
            r#"{"n": [[0.5, 0.7], [0.5, 0.3]]}"#,
        )
        .expect("write");

        let book = CoordBook::load(temp.path(), 1440, 3040).expect("load");
        assert!(book.button("start").is_ok());
    }

    #[test]
    fn rejects_coordinates_outside_unit_range() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("720x1280");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("buttons.json"), r#"{"start": [1.5, 0.9]}"#).expect("write");
        fs::write(dir.join("movements.json"), "{}").expect("write");
        assert!(CoordBook::load(temp.path(), 720, 1280).is_err());
    }

    #[test]
    fn parses_size_strings() {
        assert_eq!(parse_size("1080x1920"), Some((1080, 1920)));
        assert_eq!(parse_size("junk"), None);
        assert_eq!(parse_size("10x"), None);
    }
}
