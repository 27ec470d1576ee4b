//! Shared driver seam between the loops and the collaborators.
//!
//! [`Driver`] owns the collaborators and the session. The orchestration
//! modules (`popups`, `watch`, `boss`, `sequence`, `supervisor`) each add an
//! impl block with one loop's logic; everything here is the small shared
//! vocabulary they build on. The stop token is checked before every
//! actuation and inside every pause, so no input event is issued after a
//! stop is observed.

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::core::ability::{TierList, pick_best};
use crate::core::dungeon::DungeonKind;
use crate::core::types::{Direction, HealingStrategy, ScreenState};
use crate::io::actuator::Actuator;
use crate::io::config::Config;
use crate::io::pacer::Pacer;
use crate::io::programs::{MoveStep, ProgramBook};
use crate::io::screen::Screen;
use crate::io::settings::Settings;
use crate::io::stats::StatsBook;
use crate::session::RunSession;
use crate::stop::StopToken;

/// Everything a driver needs, bundled to keep construction call sites flat.
pub struct DriverParts<S, A, P> {
    pub screen: S,
    pub actuator: A,
    pub pacer: P,
    pub stop: StopToken,
    pub config: Config,
    pub settings: Settings,
    pub programs: ProgramBook,
    pub tiers: TierList,
    pub stats: StatsBook,
}

/// The run-control state machine over one selected dungeon.
pub struct Driver<S, A, P> {
    pub(crate) screen: S,
    pub(crate) actuator: A,
    pub(crate) pacer: P,
    pub(crate) stop: StopToken,
    pub(crate) config: Config,
    pub(crate) programs: ProgramBook,
    pub(crate) tiers: TierList,
    pub(crate) healing: HealingStrategy,
    pub(crate) kind: DungeonKind,
    pub(crate) session: RunSession,
    pub(crate) stats: StatsBook,
}

impl<S: Screen, A: Actuator, P: Pacer> Driver<S, A, P> {
    pub fn new(parts: DriverParts<S, A, P>) -> Self {
        let DriverParts {
            screen,
            actuator,
            pacer,
            stop,
            config,
            settings,
            programs,
            tiers,
            stats,
        } = parts;
        Self {
            screen,
            actuator,
            pacer,
            stop,
            config,
            programs,
            tiers,
            healing: settings.healing_strategy,
            kind: DungeonKind::from_id(settings.selected_dungeon),
            session: RunSession::new(settings.selected_dungeon),
            stats,
        }
    }

    pub fn session(&self) -> &RunSession {
        &self.session
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub(crate) fn tap(&self, button: &str) -> Result<()> {
        self.stop.checkpoint()?;
        debug!(button, "tap");
        self.actuator.tap(button)
    }

    pub(crate) fn swipe(&self, direction: Direction, secs: f32) -> Result<()> {
        self.stop.checkpoint()?;
        self.actuator.swipe(direction, secs)
    }

    pub(crate) fn settle(&self, secs: f32) -> Result<()> {
        self.pacer.pause(&self.stop, Duration::from_secs_f32(secs))
    }

    /// Replay one named movement program, step by step.
    pub(crate) fn run_program(&self, name: &str) -> Result<()> {
        debug!(program = name, "running movement program");
        for step in self.programs.get(name)? {
            match *step {
                MoveStep::Swipe { swipe, secs } => self.swipe(swipe, secs)?,
                MoveStep::Pause { pause } => self.settle(pause)?,
            }
        }
        Ok(())
    }

    pub(crate) fn state(&self) -> Result<ScreenState> {
        let state = self.screen.state()?;
        debug!(%state, "screen state");
        Ok(state)
    }

    /// Pick and apply the best of the three offered abilities.
    ///
    /// A classifier failure degrades to the left slot; tiering quality is
    /// not a safety concern.
    pub(crate) fn choose_ability(&self) -> Result<()> {
        let slot = match self.screen.abilities() {
            Ok(offer) => {
                let slot = pick_best(&self.tiers, &offer.left, &offer.center, &offer.right);
                info!(left = %offer.left, center = %offer.center, right = %offer.right, ?slot, "choosing ability");
                slot
            }
            Err(err) => {
                warn!(err = %err, "could not read ability offer, choosing left");
                crate::core::types::AbilitySlot::Left
            }
        };
        self.tap(slot.button())?;
        self.settle(1.0)
    }

    /// Close the end-of-run screen and reset the level counter. Unlike the
    /// other popup resolutions this changes session-level state.
    pub(crate) fn close_endgame(&mut self) -> Result<()> {
        info!("closing end-of-run screen");
        self.tap("close_end")?;
        self.session.current_level = 0;
        self.settle(8.0)
    }
}
