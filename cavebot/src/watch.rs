//! Time-boxed supervision of one playing level.
//!
//! While the character auto-fights, the watch loop consumes a fixed play
//! budget, re-polling the classifier at a coarse interval and injecting
//! filler movement so the character keeps collecting kills. It returns the
//! moment the level logically ends; running the budget dry is deliberately
//! not an error, since long fights would otherwise escalate falsely.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::core::dungeon::DungeonKind;
use crate::core::routes::{PATROL_SWEEP, escape_route};
use crate::core::types::{ControlSignal, ScreenState};
use crate::driver::Driver;
use crate::io::actuator::Actuator;
use crate::io::pacer::Pacer;
use crate::io::screen::{DoorCheck, Screen};

/// Why the watch loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchVerdict {
    /// A level-ending interstitial appeared; popup handling comes next.
    Interstitial(ScreenState),
    /// One of the doors-open detectors fired (patrol dungeons only).
    DoorOpen,
    /// The experience bar moved: proof of level progress.
    Progressed,
    /// The end-of-run screen appeared and was closed.
    EndgameClosed,
    /// The budget ran out with the level still playing.
    TimedOut,
}

/// Verdict plus the countdown tick at which the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOutcome {
    pub verdict: WatchVerdict,
    /// Seconds that were still left on the budget (0 for a timeout).
    pub tick: u32,
}

impl<S: Screen, A: Actuator, P: Pacer> Driver<S, A, P> {
    /// Wait out up to `budget_secs` of play, returning on the first
    /// level-ending event. Boss fights skip the experience-bar shortcut.
    pub fn watch(&mut self, budget_secs: u32, is_boss: bool) -> Result<WatchOutcome> {
        let check_exp = !is_boss;
        let mut baseline = self.screen.exp_sample()?;
        let mut recheck = false;
        info!(budget_secs, is_boss, "watching the dungeon");

        for tick in (1..=budget_secs).rev() {
            self.stop.checkpoint()?;
            if tick % self.config.check_secs == 0 || recheck {
                recheck = false;
                let sample = self.screen.exp_sample()?;
                let state = self.state()?;
                debug!(tick, %state, "watch poll");
                match state {
                    ScreenState::Unknown => {
                        // One settle-and-retry before escalating; a forced
                        // re-check next tick costs no extra budget.
                        self.settle(5.0)?;
                        if self.state()? == ScreenState::Unknown {
                            warn!(tick, "screen still unknown after re-check");
                            return Err(ControlSignal::UnknownScreen.into());
                        }
                        recheck = true;
                        continue;
                    }
                    ScreenState::Endgame | ScreenState::RepeatEndgameQuestion => {
                        info!("level ended with the run");
                        self.close_endgame()?;
                        return Ok(WatchOutcome {
                            verdict: WatchVerdict::EndgameClosed,
                            tick,
                        });
                    }
                    ScreenState::MenuHome => {
                        warn!("main menu during watch");
                        return Err(ControlSignal::RestartFromMenu.into());
                    }
                    ScreenState::SelectAbility
                    | ScreenState::FortuneWheel
                    | ScreenState::DevilQuestion
                    | ScreenState::MisteryVendor
                    | ScreenState::AdAsk
                    | ScreenState::AngelHeal => {
                        info!(%state, "level ended");
                        return Ok(WatchOutcome {
                            verdict: WatchVerdict::Interstitial(state),
                            tick,
                        });
                    }
                    ScreenState::InGame
                    | ScreenState::OnPause
                    | ScreenState::TimePrize
                    | ScreenState::SpecialGiftRespin => {}
                }
                if check_exp && self.screen.exp_changed(&baseline)? {
                    info!("experience gained");
                    return Ok(WatchOutcome {
                        verdict: WatchVerdict::Progressed,
                        tick,
                    });
                }
                baseline = sample;
                if state == ScreenState::InGame {
                    match self.kind {
                        DungeonKind::Patrol(_) => {
                            for check in DoorCheck::ALL {
                                if self.screen.doors_open(check)? {
                                    info!(?check, "the door is open");
                                    return Ok(WatchOutcome {
                                        verdict: WatchVerdict::DoorOpen,
                                        tick,
                                    });
                                }
                            }
                            debug!("still playing, doing a patrol sweep");
                            self.run_program(PATROL_SWEEP)?;
                        }
                        DungeonKind::Generic => {
                            let route = escape_route(budget_secs, tick);
                            debug!(?route, "still playing, taking an escape route");
                            self.run_program(route.program())?;
                        }
                    }
                }
            }
            self.settle(1.0)?;
        }

        debug!("watch budget exhausted, still playing");
        Ok(WatchOutcome {
            verdict: WatchVerdict::TimedOut,
            tick: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InstantPacer, RecordingActuator, ScriptedScreen, test_driver};

    /// Door-open firing exactly at tick T returns at tick T.
    #[test]
    fn door_open_returns_on_its_exact_tick() {
        let temp = tempfile::tempdir().expect("tempdir");
        let screen = ScriptedScreen::new();
        // Polls at ticks 10 and 5; the door opens on the second poll's
        // first detector.
        for _ in 0..3 {
            screen.push_door(false);
        }
        screen.push_door(true);
        let mut driver = test_driver(
            temp.path(),
            6,
            screen,
            RecordingActuator::new(),
            InstantPacer::new(),
        );

        let outcome = driver.watch(10, false).expect("watch");
        assert_eq!(outcome.verdict, WatchVerdict::DoorOpen);
        assert_eq!(outcome.tick, 5);
    }

    #[test]
    fn patrol_sweeps_while_doors_stay_closed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut driver = test_driver(
            temp.path(),
            6,
            ScriptedScreen::new(),
            RecordingActuator::new(),
            InstantPacer::new(),
        );

        let outcome = driver.watch(10, false).expect("watch");
        assert_eq!(outcome.verdict, WatchVerdict::TimedOut);
        assert_eq!(outcome.tick, 0);
        // Two polls, one sweep each (4 swipes per sweep).
        assert_eq!(driver.actuator.swipes().len(), 8);
    }

    #[test]
    fn generic_dungeon_takes_escape_routes() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut driver = test_driver(
            temp.path(),
            1,
            ScriptedScreen::new(),
            RecordingActuator::new(),
            InstantPacer::new(),
        );

        let outcome = driver.watch(10, false).expect("watch");
        assert_eq!(outcome.verdict, WatchVerdict::TimedOut);
        assert!(!driver.actuator.swipes().is_empty());
    }

    #[test]
    fn interstitial_ends_the_level() {
        let temp = tempfile::tempdir().expect("tempdir");
        let screen = ScriptedScreen::new();
        screen.push_state(ScreenState::FortuneWheel);
        let mut driver = test_driver(
            temp.path(),
            6,
            screen,
            RecordingActuator::new(),
            InstantPacer::new(),
        );

        let outcome = driver.watch(10, false).expect("watch");
        assert_eq!(
            outcome.verdict,
            WatchVerdict::Interstitial(ScreenState::FortuneWheel)
        );
        assert_eq!(outcome.tick, 10);
    }

    #[test]
    fn exp_bar_delta_counts_as_progress_except_for_bosses() {
        let temp = tempfile::tempdir().expect("tempdir");
        let screen = ScriptedScreen::new();
        screen.push_exp_changed(true);
        let mut driver = test_driver(
            temp.path(),
            6,
            screen,
            RecordingActuator::new(),
            InstantPacer::new(),
        );
        let outcome = driver.watch(10, false).expect("watch");
        assert_eq!(outcome.verdict, WatchVerdict::Progressed);

        // The same script during a boss fight is ignored.
        let screen = ScriptedScreen::new();
        screen.push_exp_changed(true);
        let mut driver = test_driver(
            temp.path(),
            6,
            screen,
            RecordingActuator::new(),
            InstantPacer::new(),
        );
        let outcome = driver.watch(10, true).expect("watch");
        assert_eq!(outcome.verdict, WatchVerdict::TimedOut);
    }

    #[test]
    fn unknown_twice_escalates() {
        let temp = tempfile::tempdir().expect("tempdir");
        let screen = ScriptedScreen::new().with_fallback(ScreenState::Unknown);
        let mut driver = test_driver(
            temp.path(),
            6,
            screen,
            RecordingActuator::new(),
            InstantPacer::new(),
        );

        let err = driver.watch(10, false).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ControlSignal>(),
            Some(&ControlSignal::UnknownScreen)
        );
    }

    #[test]
    fn unknown_then_clear_forces_a_recheck_next_tick() {
        let temp = tempfile::tempdir().expect("tempdir");
        let screen = ScriptedScreen::new();
        // Poll at tick 10 sees unknown, re-check clears it; the forced
        // re-check at tick 9 sees the wheel.
        screen.push_state(ScreenState::Unknown);
        screen.push_state(ScreenState::InGame);
        screen.push_state(ScreenState::FortuneWheel);
        let mut driver = test_driver(
            temp.path(),
            6,
            screen,
            RecordingActuator::new(),
            InstantPacer::new(),
        );

        let outcome = driver.watch(10, false).expect("watch");
        assert_eq!(
            outcome.verdict,
            WatchVerdict::Interstitial(ScreenState::FortuneWheel)
        );
        assert_eq!(outcome.tick, 9);
    }

    #[test]
    fn endgame_closes_and_returns() {
        let temp = tempfile::tempdir().expect("tempdir");
        let screen = ScriptedScreen::new();
        screen.push_state(ScreenState::Endgame);
        let mut driver = test_driver(
            temp.path(),
            6,
            screen,
            RecordingActuator::new(),
            InstantPacer::new(),
        );
        driver.session.current_level = 7;

        let outcome = driver.watch(10, false).expect("watch");
        assert_eq!(outcome.verdict, WatchVerdict::EndgameClosed);
        assert_eq!(driver.session.current_level, 0);
    }
}
