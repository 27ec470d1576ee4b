//! Process configuration, fixed at construction (TOML).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::levels::MAX_LEVEL;

/// Bot configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to the values the loops were tuned
/// against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Highest level slot of one attempt. Must match the fixed slot table.
    pub max_level: u8,

    /// Outer farm-loop attempt cap.
    pub farm_loops: u32,

    /// Popup-drain iteration cap before escalating.
    pub popup_drain_cap: u32,

    /// Final-boss wait: number of polls, and seconds between polls.
    pub boss_wait_polls: u32,
    pub boss_wait_interval_secs: u64,

    /// Watch loop: play budget per level, and seconds between state polls.
    pub playtime_secs: u32,
    pub check_secs: u32,

    /// Seconds to wait before re-checking the energy gate.
    pub energy_wait_secs: u64,

    /// Start runs without checking for energy (not recommended).
    pub skip_energy_check: bool,

    /// Collect VIP/privilege reward popups instead of only dismissing them.
    pub vip_rewards: bool,

    /// Re-center the player after crossing a patrol room. Experimental.
    pub center_after_crossing: bool,

    /// Directory holding per-resolution coordinate tables.
    pub data_dir: PathBuf,

    /// Optional movement-program book override; embedded defaults otherwise.
    pub programs_path: Option<PathBuf>,

    /// Optional ability tier-list override; embedded defaults otherwise.
    pub tier_list_path: Option<PathBuf>,

    pub settings_path: PathBuf,
    pub stats_path: PathBuf,

    /// Force the device resolution ("1080x1920") instead of detecting it.
    pub resolution: Option<String>,

    /// Wall-clock budget for one vision/adb invocation.
    pub command_timeout_secs: u64,

    /// Truncate captured child stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,

    pub vision: CommandConfig,
    pub adb: CommandConfig,
}

/// Command vector for an external collaborator (e.g. `["adb", "-s", "X"]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandConfig {
    pub command: Vec<String>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            command: vec!["adb".to_string()],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_level: MAX_LEVEL,
            farm_loops: 25,
            popup_drain_cap: 10,
            boss_wait_polls: 10,
            boss_wait_interval_secs: 5,
            playtime_secs: 100,
            check_secs: 5,
            energy_wait_secs: 3605,
            skip_energy_check: false,
            vip_rewards: true,
            center_after_crossing: false,
            data_dir: PathBuf::from("data"),
            programs_path: None,
            tier_list_path: None,
            settings_path: PathBuf::from("settings.toml"),
            stats_path: PathBuf::from("stats/games.jsonl"),
            resolution: None,
            command_timeout_secs: 30,
            output_limit_bytes: 100_000,
            vision: CommandConfig {
                command: vec!["cave-vision".to_string()],
            },
            adb: CommandConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.max_level != MAX_LEVEL {
            return Err(anyhow!(
                "max_level must be {MAX_LEVEL} to match the level table"
            ));
        }
        if self.farm_loops == 0 {
            return Err(anyhow!("farm_loops must be > 0"));
        }
        if self.popup_drain_cap == 0 {
            return Err(anyhow!("popup_drain_cap must be > 0"));
        }
        if self.boss_wait_polls == 0 || self.boss_wait_interval_secs == 0 {
            return Err(anyhow!("boss wait polls and interval must be > 0"));
        }
        if self.playtime_secs == 0 {
            return Err(anyhow!("playtime_secs must be > 0"));
        }
        if self.check_secs == 0 || self.check_secs > self.playtime_secs {
            return Err(anyhow!("check_secs must be in 1..=playtime_secs"));
        }
        if self.command_timeout_secs == 0 {
            return Err(anyhow!("command_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        for (name, cfg) in [("vision", &self.vision), ("adb", &self.adb)] {
            if cfg.command.is_empty() || cfg.command[0].trim().is_empty() {
                return Err(anyhow!("{name}.command must be a non-empty array"));
            }
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `Config::default()`.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        let cfg = Config::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: Config =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &Config) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let cfg = Config {
            farm_loops: 3,
            skip_energy_check: true,
            ..Config::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn validate_rejects_zero_caps() {
        let cfg = Config {
            popup_drain_cap: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = Config {
            check_secs: 101,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_command() {
        let cfg = Config {
            vision: CommandConfig {
                command: Vec::new(),
            },
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
