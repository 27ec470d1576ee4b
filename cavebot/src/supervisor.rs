//! Outer farm loop: housekeeping, recovery, and session termination.

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::core::types::{ControlSignal, ScreenState};
use crate::driver::Driver;
use crate::io::actuator::Actuator;
use crate::io::pacer::Pacer;
use crate::io::screen::Screen;
use crate::io::stats::GameRecord;
use crate::session::now_unix;
use crate::stop::Stopped;

/// Why the farm loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FarmStop {
    /// The attempt cap was reached: a clean, successful session end.
    Exhausted,
    /// A fatal condition ended the session.
    Fatal { reason: String },
    /// A cooperative stop request ended the session.
    Stopped,
}

/// Summary of a farm invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmOutcome {
    pub attempts: u32,
    pub stop: FarmStop,
}

impl<S: Screen, A: Actuator, P: Pacer> Driver<S, A, P> {
    /// Run dungeon attempts until the cap, a fatal signal, or a stop.
    ///
    /// Control signals raised by the inner loops are recovered here, and
    /// nowhere else: restart-from-menu retries the attempt, unknown-screen
    /// is fatal only for patrol dungeons, and anything unexpected is fatal.
    /// Every termination path flushes statistics first so no attempt is
    /// lost.
    pub fn farm(&mut self) -> Result<FarmOutcome> {
        for attempt in 1..=self.config.farm_loops {
            let stop = match self.run_attempt() {
                Ok(()) => None,
                Err(err) => self.interpret(err),
            };
            self.flush_stats();
            if let Some(stop) = stop {
                return Ok(FarmOutcome { attempts: attempt, stop });
            }
            info!(attempt, "farm loop complete");
        }
        info!(signal = %ControlSignal::FarmLoopExhausted, "session done");
        Ok(FarmOutcome {
            attempts: self.config.farm_loops,
            stop: FarmStop::Exhausted,
        })
    }

    /// Map an attempt error to a loop decision. `None` means play on.
    fn interpret(&self, err: anyhow::Error) -> Option<FarmStop> {
        if err.downcast_ref::<Stopped>().is_some() {
            info!("stop requested, ending session");
            return Some(FarmStop::Stopped);
        }
        match err.downcast_ref::<ControlSignal>() {
            Some(ControlSignal::RestartFromMenu) => {
                info!("back at the main menu, restarting");
                None
            }
            Some(ControlSignal::UnknownScreen) => {
                if self.kind.is_patrol() {
                    error!("unknown screen state, aborting session");
                    Some(FarmStop::Fatal {
                        reason: err.to_string(),
                    })
                } else {
                    // Generic chapters tolerate transient misclassification;
                    // their looser structure recovers on the next attempt.
                    warn!("unknown screen state, continuing");
                    None
                }
            }
            Some(ControlSignal::FarmLoopExhausted) | None => {
                error!(err = %err, "fatal error, aborting session");
                Some(FarmStop::Fatal {
                    reason: err.to_string(),
                })
            }
        }
    }

    fn run_attempt(&mut self) -> Result<()> {
        self.stop.checkpoint()?;
        info!("checking conditions");
        self.session.started_at = now_unix();
        self.housekeeping()?;
        self.level_trust_check()?;
        self.energy_gate()?;
        self.apply_start_policy()?;
        self.session.start_level = self.session.current_level;
        info!(level = self.session.current_level, "new game started");
        if self.session.current_level == 0 {
            self.enter_from_menu()
        } else {
            self.run_levels()
        }
    }

    /// Idempotent pre-flight pass over the home-screen popups. The checks
    /// are independent and non-exclusive; several may fire in one pass.
    fn housekeeping(&mut self) -> Result<()> {
        debug!("housekeeping pass");
        if self.screen.matches("popup_new_season")? {
            info!("okay to new season");
            self.tap("close_need_this")?;
            self.settle(5.0)?;
        }
        if self.screen.matches("popup_home_patrol")? {
            info!("collecting patrol reward");
            self.tap("collect_hero_patrol")?;
            self.settle(5.0)?;
            // A token popup follows the collect; any tap closes it.
            self.tap("collect_hero_patrol")?;
        }
        if self.screen.matches("btn_home_time_reward")? {
            info!("closing patrol");
            self.tap("close_hero_patrol")?;
            self.settle(5.0)?;
        }
        // The VIP reward popup can stack twice.
        for _ in 0..2 {
            if self.screen.matches("popup_vip_rewards")? {
                if self.config.vip_rewards {
                    info!("collecting vip rewards");
                    self.tap("collect_vip_rewards")?;
                    self.settle(5.0)?;
                }
                self.tap("close_vip_rewards")?;
                self.settle(5.0)?;
            }
        }
        if self.screen.matches("popup_need_this")? {
            info!("rejecting must-need ad");
            self.tap("close_need_this")?;
            self.settle(5.0)?;
        }
        if self.screen.matches("time_prize")? {
            info!("collecting time prize");
            self.tap("collect_time_prize")?;
            self.settle(5.0)?;
            self.tap("resume")?;
            self.settle(2.0)?;
        }
        Ok(())
    }

    /// Mid-run the level counter is only trustworthy while the classifier
    /// still sees active play; otherwise restart the attempt from scratch
    /// rather than failing.
    fn level_trust_check(&mut self) -> Result<()> {
        if self.session.current_level == 0 {
            return Ok(());
        }
        let state = self.state()?;
        if state != ScreenState::InGame {
            warn!(%state, level = self.session.current_level, "not in a dungeon, resetting to level 0");
            self.session.current_level = 0;
        }
        Ok(())
    }

    /// Cooperative wait for enough energy before a fresh run. Re-checks
    /// roughly every hour, indefinitely, unless skipped or cancelled.
    fn energy_gate(&mut self) -> Result<()> {
        if self.session.current_level != 0 || self.config.skip_energy_check {
            return Ok(());
        }
        while !self.screen.matches("least_5_energy")? {
            warn!("no energy, waiting");
            self.pacer
                .pause(&self.stop, Duration::from_secs(self.config.energy_wait_secs))?;
        }
        Ok(())
    }

    /// Patrol dungeons resume exactly where they left off; other chapters
    /// effectively restart at level 1 (or 0 when back at the home menu).
    fn apply_start_policy(&mut self) -> Result<()> {
        if self.kind.is_patrol() {
            return Ok(());
        }
        if !self.screen.matches("endgame")? {
            self.session.current_level = 1;
            if self.screen.matches("menu_home")? {
                self.session.current_level = 0;
            }
        }
        Ok(())
    }

    /// Write the attempt record for patrol dungeons. Statistics must never
    /// take the session down with them.
    fn flush_stats(&self) {
        if !self.kind.is_patrol() {
            return;
        }
        let record = GameRecord {
            started_at: self.session.started_at,
            dungeon: self.session.dungeon,
            start_level: self.session.start_level,
            end_level: self.session.current_level,
        };
        if let Err(err) = self.stats.record(&record) {
            warn!(err = %err, "could not write stats record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InstantPacer, RecordingActuator, ScriptedScreen, test_driver};

    fn quick_config(driver: &mut Driver<ScriptedScreen, RecordingActuator, InstantPacer>) {
        driver.config.playtime_secs = 5;
        driver.config.farm_loops = 2;
        driver.config.skip_energy_check = true;
    }

    #[test]
    fn cap_reached_is_a_clean_exhausted_stop() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut driver = test_driver(
            temp.path(),
            6,
            ScriptedScreen::new(),
            RecordingActuator::new(),
            InstantPacer::new(),
        );
        quick_config(&mut driver);

        let outcome = driver.farm().expect("farm");
        assert_eq!(outcome.stop, FarmStop::Exhausted);
        assert_eq!(outcome.attempts, 2);
        // One record per attempt for a patrol dungeon.
        assert_eq!(driver.stats.read_all().expect("stats").len(), 2);
    }

    #[test]
    fn restart_from_menu_does_not_terminate_the_loop() {
        let temp = tempfile::tempdir().expect("tempdir");
        let screen = ScriptedScreen::new();
        // First classification of attempt 1 is the main menu; attempt 2
        // then plays through on the fallback state.
        screen.push_state(ScreenState::MenuHome);
        let mut driver = test_driver(
            temp.path(),
            6,
            screen,
            RecordingActuator::new(),
            InstantPacer::new(),
        );
        quick_config(&mut driver);

        let outcome = driver.farm().expect("farm");
        assert_eq!(outcome.stop, FarmStop::Exhausted);
        assert_eq!(outcome.attempts, 2);
    }

    #[test]
    fn unknown_screen_is_fatal_for_patrol_dungeons() {
        let temp = tempfile::tempdir().expect("tempdir");
        let screen = ScriptedScreen::new().with_fallback(ScreenState::Unknown);
        let mut driver = test_driver(
            temp.path(),
            6,
            screen,
            RecordingActuator::new(),
            InstantPacer::new(),
        );
        quick_config(&mut driver);

        let outcome = driver.farm().expect("farm");
        assert!(matches!(outcome.stop, FarmStop::Fatal { .. }));
        assert_eq!(outcome.attempts, 1);
        // The abort still flushed one record.
        assert_eq!(driver.stats.read_all().expect("stats").len(), 1);
    }

    #[test]
    fn unknown_screen_is_tolerated_for_generic_dungeons() {
        let temp = tempfile::tempdir().expect("tempdir");
        let screen = ScriptedScreen::new().with_fallback(ScreenState::Unknown);
        let mut driver = test_driver(
            temp.path(),
            2,
            screen,
            RecordingActuator::new(),
            InstantPacer::new(),
        );
        quick_config(&mut driver);

        let outcome = driver.farm().expect("farm");
        assert_eq!(outcome.stop, FarmStop::Exhausted);
        assert_eq!(outcome.attempts, 2);
        // Generic chapters keep no statistics.
        assert!(driver.stats.read_all().expect("stats").is_empty());
    }

    #[test]
    fn energy_gate_waits_until_energy_is_back() {
        let temp = tempfile::tempdir().expect("tempdir");
        let screen = ScriptedScreen::new();
        screen.push_match("least_5_energy", false);
        screen.push_match("least_5_energy", false);
        screen.set_match("least_5_energy", true);
        let mut driver = test_driver(
            temp.path(),
            6,
            screen,
            RecordingActuator::new(),
            InstantPacer::new(),
        );
        driver.config.playtime_secs = 5;
        driver.config.farm_loops = 1;

        let outcome = driver.farm().expect("farm");
        assert_eq!(outcome.stop, FarmStop::Exhausted);
    }

    #[test]
    fn trust_check_resets_a_stale_level_counter() {
        let temp = tempfile::tempdir().expect("tempdir");
        let screen = ScriptedScreen::new();
        // Mid-run but the first classification is an offer screen, not play.
        screen.push_state(ScreenState::FortuneWheel);
        let mut driver = test_driver(
            temp.path(),
            6,
            screen,
            RecordingActuator::new(),
            InstantPacer::new(),
        );
        quick_config(&mut driver);
        driver.config.farm_loops = 1;
        driver.session.current_level = 9;

        driver.farm().expect("farm");
        // The attempt restarted from scratch rather than resuming slot 9.
        let record = driver.stats.read_all().expect("stats")[0];
        assert_eq!(record.start_level, 0);
    }
}
