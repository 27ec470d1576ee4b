//! Bounded wait for the final-boss kill signal.

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::core::dungeon::PatrolSite;
use crate::driver::Driver;
use crate::io::actuator::Actuator;
use crate::io::pacer::Pacer;
use crate::io::screen::Screen;

/// Result of the final-boss wait. A timeout is not an escalation: "still
/// locked in combat" and "already open" are treated identically here, and
/// any real trouble surfaces downstream in popup handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossVerdict {
    Defeated,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossOutcome {
    pub verdict: BossVerdict,
    pub polls: u32,
}

impl<S: Screen, A: Actuator, P: Pacer> Driver<S, A, P> {
    /// Open the fight, then poll the boss-defeated predicates at a fixed
    /// interval until one fires or the poll budget runs out.
    pub fn final_boss_wait(&mut self) -> Result<BossOutcome> {
        info!("final boss appeared, attacking");
        self.run_program("final_boss_open")?;
        let interval = Duration::from_secs(self.config.boss_wait_interval_secs);
        for poll in 1..=self.config.boss_wait_polls {
            self.pacer.pause(&self.stop, interval)?;
            for site in PatrolSite::ALL {
                if self.screen.boss_dead(site)? {
                    info!(site = site.label(), poll, "boss dead");
                    return Ok(BossOutcome {
                        verdict: BossVerdict::Defeated,
                        polls: poll,
                    });
                }
            }
            debug!(poll, "boss still up");
        }
        debug!("boss wait budget exhausted, moving on");
        Ok(BossOutcome {
            verdict: BossVerdict::TimedOut,
            polls: self.config.boss_wait_polls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InstantPacer, RecordingActuator, ScriptedScreen, test_driver};

    #[test]
    fn stops_polling_on_the_first_true_predicate() {
        let temp = tempfile::tempdir().expect("tempdir");
        let screen = ScriptedScreen::new();
        // Poll 1: all three predicates false. Poll 2: second fires.
        for _ in 0..3 {
            screen.push_boss(false);
        }
        screen.push_boss(false);
        screen.push_boss(true);
        let mut driver = test_driver(
            temp.path(),
            6,
            screen,
            RecordingActuator::new(),
            InstantPacer::new(),
        );

        let outcome = driver.final_boss_wait().expect("boss wait");
        assert_eq!(outcome.verdict, BossVerdict::Defeated);
        assert_eq!(outcome.polls, 2);
    }

    #[test]
    fn timeout_is_not_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut driver = test_driver(
            temp.path(),
            6,
            ScriptedScreen::new(),
            RecordingActuator::new(),
            InstantPacer::new(),
        );

        let outcome = driver.final_boss_wait().expect("boss wait");
        assert_eq!(outcome.verdict, BossVerdict::TimedOut);
        assert_eq!(outcome.polls, driver.config.boss_wait_polls);
        // The opener swipe ran exactly once.
        assert_eq!(driver.actuator.swipes().len(), 1);
    }
}
