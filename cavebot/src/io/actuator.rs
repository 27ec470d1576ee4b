//! Input-actuation boundary.
//!
//! The [`Actuator`] trait decouples the loops from the input-event
//! transport. The production implementation resolves logical names through
//! the normalized coordinate tables and spawns `adb shell input`.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{debug, warn};

use crate::core::types::Direction;
use crate::io::config::Config;
use crate::io::coords::CoordBook;
use crate::io::process::run_command_with_timeout;

/// Abstraction over tap/swipe delivery.
pub trait Actuator {
    /// Tap the named button.
    fn tap(&self, button: &str) -> Result<()>;
    /// Swipe along the named direction for `secs`.
    fn swipe(&self, direction: Direction, secs: f32) -> Result<()>;
}

/// Actuator that spawns `adb shell input`.
pub struct AdbActuator {
    command: Vec<String>,
    coords: CoordBook,
    width: u32,
    height: u32,
    timeout: Duration,
    output_limit: usize,
}

impl AdbActuator {
    pub fn new(config: &Config, coords: CoordBook, width: u32, height: u32) -> Self {
        Self {
            command: config.adb.command.clone(),
            coords,
            width,
            height,
            timeout: Duration::from_secs(config.command_timeout_secs),
            output_limit: config.output_limit_bytes,
        }
    }

    fn shell_input(&self, args: &[String]) -> Result<()> {
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..])
            .arg("shell")
            .arg("input")
            .args(args);
        let output = run_command_with_timeout(cmd, self.timeout, self.output_limit)
            .context("run adb input")?;
        if output.timed_out {
            bail!("adb input timed out after {:?}", self.timeout);
        }
        if !output.status.success() {
            bail!(
                "adb input failed with status {:?}: {}",
                output.status.code(),
                output.stderr_text()
            );
        }
        Ok(())
    }

    fn scale(&self, [x, y]: [f64; 2]) -> (i64, i64) {
        (
            (x * f64::from(self.width)) as i64,
            (y * f64::from(self.height)) as i64,
        )
    }
}

impl Actuator for AdbActuator {
    fn tap(&self, button: &str) -> Result<()> {
        let (x, y) = self.scale(self.coords.button(button)?);
        debug!(button, x, y, "tap");
        self.shell_input(&["tap".to_string(), x.to_string(), y.to_string()])
    }

    fn swipe(&self, direction: Direction, secs: f32) -> Result<()> {
        let [from, to] = self.coords.movement(direction.label())?;
        let (x1, y1) = self.scale(from);
        let (x2, y2) = self.scale(to);
        let millis = (secs * 1000.0) as u64;
        debug!(%direction, secs, "swipe");
        self.shell_input(&[
            "swipe".to_string(),
            x1.to_string(),
            y1.to_string(),
            x2.to_string(),
            y2.to_string(),
            millis.to_string(),
        ])
    }
}

/// Query the device resolution via `adb shell wm size`.
///
/// When the device reports both a physical and an override size, the
/// override (last match) wins.
pub fn detect_size(config: &Config) -> Result<(u32, u32)> {
    let mut cmd = Command::new(&config.adb.command[0]);
    cmd.args(&config.adb.command[1..])
        .args(["shell", "wm", "size"]);
    let output = run_command_with_timeout(
        cmd,
        Duration::from_secs(config.command_timeout_secs),
        config.output_limit_bytes,
    )
    .context("run adb wm size")?;
    if !output.status.success() {
        bail!(
            "adb wm size failed with status {:?}: {}",
            output.status.code(),
            output.stderr_text()
        );
    }
    let text = output.stdout_text();
    parse_wm_size(&text).ok_or_else(|| {
        warn!(reply = %text, "could not parse device size");
        anyhow::anyhow!("could not parse device size from {text:?}")
    })
}

fn parse_wm_size(text: &str) -> Option<(u32, u32)> {
    let re = Regex::new(r"(?m)size:\s*(\d+)x(\d+)").expect("static regex");
    let caps = re.captures_iter(text).last()?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_physical_size() {
        assert_eq!(
            parse_wm_size("Physical size: 1080x1920"),
            Some((1080, 1920))
        );
    }

    #[test]
    fn override_size_wins() {
        let reply = "Physical size: 1080x1920\nOverride size: 720x1280";
        assert_eq!(parse_wm_size(reply), Some((720, 1280)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_wm_size("no size here"), None);
    }
}
