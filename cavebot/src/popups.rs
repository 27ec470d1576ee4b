//! Bounded resolution of transient interstitial screens.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::core::types::{ControlSignal, HealingStrategy, ScreenState};
use crate::driver::Driver;
use crate::io::actuator::Actuator;
use crate::io::pacer::Pacer;
use crate::io::screen::Screen;

/// Summary of one popup-drain invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Iterations spent before play resumed.
    pub rounds: u32,
    /// Whether an end-of-run screen was closed along the way.
    pub closed_endgame: bool,
}

impl<S: Screen, A: Actuator, P: Pacer> Driver<S, A, P> {
    /// Resolve transient screens one at a time until the game returns to
    /// active play.
    ///
    /// The attempt counter advances on every iteration regardless of
    /// outcome; exceeding the cap raises the unknown-screen signal. A main
    /// menu sighting is a hard escalation, not resolvable locally.
    pub fn drain_popups(&mut self) -> Result<DrainOutcome> {
        let mut rounds = 0u32;
        let mut closed_endgame = false;
        loop {
            self.stop.checkpoint()?;
            if rounds > self.config.popup_drain_cap {
                warn!(rounds, cap = self.config.popup_drain_cap, "popup drain cap reached");
                return Err(ControlSignal::UnknownScreen.into());
            }
            let state = self.state()?;
            match state {
                ScreenState::InGame => {
                    debug!(rounds, "play resumed");
                    return Ok(DrainOutcome {
                        rounds,
                        closed_endgame,
                    });
                }
                ScreenState::SelectAbility => self.choose_ability()?,
                ScreenState::FortuneWheel => {
                    info!("spinning fortune wheel");
                    self.tap("lucky_wheel_start")?;
                    self.settle(6.0)?;
                }
                ScreenState::DevilQuestion => {
                    info!("rejecting devil offer");
                    self.tap("ability_daemon_reject")?;
                    self.settle(2.0)?;
                }
                ScreenState::AdAsk
                | ScreenState::MisteryVendor
                | ScreenState::SpecialGiftRespin => {
                    info!(%state, "dismissing offer");
                    self.tap("spin_wheel_back")?;
                    self.settle(2.0)?;
                }
                ScreenState::AngelHeal => {
                    let button = if self.healing == HealingStrategy::AlwaysHeal {
                        "heal_right"
                    } else {
                        "heal_left"
                    };
                    info!(strategy = %self.healing.label(), "resolving angel heal");
                    self.tap(button)?;
                    self.settle(2.0)?;
                }
                ScreenState::OnPause => {
                    info!("resuming from pause");
                    self.tap("resume")?;
                    self.settle(2.0)?;
                }
                ScreenState::TimePrize => {
                    info!("collecting time prize");
                    self.tap("collect_time_prize")?;
                    self.settle(5.0)?;
                    self.tap("resume")?;
                    self.settle(2.0)?;
                }
                ScreenState::Endgame | ScreenState::RepeatEndgameQuestion => {
                    info!("run is over");
                    self.close_endgame()?;
                    self.settle(2.0)?;
                    closed_endgame = true;
                }
                ScreenState::MenuHome => {
                    warn!("main menu during popup drain");
                    return Err(ControlSignal::RestartFromMenu.into());
                }
                // Not resolvable here; the counter still advances and the
                // cap eventually escalates.
                ScreenState::Unknown => {}
            }
            rounds += 1;
        }
    }
}
