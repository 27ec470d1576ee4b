//! Screen-classifier boundary.
//!
//! The [`Screen`] trait decouples the loops from the actual frame-grabbing
//! and image-matching backend. The production implementation shells out to a
//! configurable vision command; tests use scripted screens that return
//! predetermined states without touching a device.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::dungeon::PatrolSite;
use crate::core::types::ScreenState;
use crate::io::config::Config;
use crate::io::process::run_command_with_timeout;

/// One of the three independent doors-open detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorCheck {
    First,
    Second,
    Third,
}

impl DoorCheck {
    pub const ALL: [Self; 3] = [Self::First, Self::Second, Self::Third];

    fn label(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Second => "second",
            Self::Third => "third",
        }
    }
}

/// Opaque experience-bar sample; compared across polls to detect progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpSample(pub String);

/// Which way the player has drifted off the room's center line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftSide {
    Left,
    Right,
    Center,
}

/// How far off-center the player is standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decentering {
    pub pixels: u32,
    pub side: DriftSide,
}

/// The three abilities currently offered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AbilityOffer {
    pub left: String,
    pub center: String,
    pub right: String,
}

/// Abstraction over frame capture and classification.
///
/// `state` must be idempotent for repeated calls on an unchanged frame.
pub trait Screen {
    /// Capture a frame and classify it.
    fn state(&self) -> Result<ScreenState>;
    /// Whether a named template matches the current frame.
    fn matches(&self, template: &str) -> Result<bool>;
    /// One doors-open detector against the current frame.
    fn doors_open(&self, check: DoorCheck) -> Result<bool>;
    /// Boss-defeated predicate for one patrol dungeon.
    fn boss_dead(&self, site: PatrolSite) -> Result<bool>;
    /// Sample the experience bar for later comparison.
    fn exp_sample(&self) -> Result<ExpSample>;
    /// Whether the experience bar changed since `baseline` was taken.
    fn exp_changed(&self, baseline: &ExpSample) -> Result<bool>;
    /// Identify the three offered abilities.
    fn abilities(&self) -> Result<AbilityOffer>;
    /// Measure how far the player stands off the room's center line.
    fn decentering(&self) -> Result<Decentering>;
}

/// Screen backed by an external vision command.
///
/// Each query runs `<command> <subcommand> [args...]` and parses the single
/// stdout line: a state label, `true`/`false`, a sample token, or a JSON
/// object for the ability offer.
pub struct CommandScreen {
    command: Vec<String>,
    timeout: Duration,
    output_limit: usize,
}

impl CommandScreen {
    pub fn from_config(config: &Config) -> Self {
        Self {
            command: config.vision.command.clone(),
            timeout: Duration::from_secs(config.command_timeout_secs),
            output_limit: config.output_limit_bytes,
        }
    }

    #[instrument(skip(self), fields(cmd = %self.command[0]))]
    fn invoke(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]).args(args);
        let output = run_command_with_timeout(cmd, self.timeout, self.output_limit)
            .context("run vision command")?;
        if output.timed_out {
            bail!("vision command timed out after {:?}", self.timeout);
        }
        if !output.status.success() {
            bail!(
                "vision command failed with status {:?}: {}",
                output.status.code(),
                output.stderr_text()
            );
        }
        Ok(output.stdout_text())
    }

    fn invoke_bool(&self, args: &[&str]) -> Result<bool> {
        let reply = self.invoke(args)?;
        match reply.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => bail!("unexpected vision reply {other:?}"),
        }
    }
}

impl Screen for CommandScreen {
    fn state(&self) -> Result<ScreenState> {
        let label = self.invoke(&["state"])?;
        let state = ScreenState::parse(&label);
        debug!(%label, %state, "classified frame");
        Ok(state)
    }

    fn matches(&self, template: &str) -> Result<bool> {
        self.invoke_bool(&["match", template])
    }

    fn doors_open(&self, check: DoorCheck) -> Result<bool> {
        self.invoke_bool(&["doors", check.label()])
    }

    fn boss_dead(&self, site: PatrolSite) -> Result<bool> {
        self.invoke_bool(&["boss", site.label()])
    }

    fn exp_sample(&self) -> Result<ExpSample> {
        Ok(ExpSample(self.invoke(&["expbar"])?))
    }

    fn exp_changed(&self, baseline: &ExpSample) -> Result<bool> {
        self.invoke_bool(&["expbar-changed", &baseline.0])
    }

    fn abilities(&self) -> Result<AbilityOffer> {
        let raw = self.invoke(&["abilities"])?;
        serde_json::from_str(&raw).context("parse ability offer")
    }

    fn decentering(&self) -> Result<Decentering> {
        // Reply format: "<left|right|center> <pixels>".
        let reply = self.invoke(&["decentering"])?;
        let mut parts = reply.split_whitespace();
        let side = match parts.next() {
            Some("left") => DriftSide::Left,
            Some("right") => DriftSide::Right,
            Some("center") => DriftSide::Center,
            other => bail!("unexpected decentering side {other:?}"),
        };
        let pixels = parts
            .next()
            .unwrap_or("0")
            .parse()
            .context("parse decentering pixels")?;
        Ok(Decentering { pixels, side })
    }
}
