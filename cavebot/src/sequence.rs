//! One dungeon attempt as an ordered sequence of typed level slots.

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::core::dungeon::{DungeonKind, PatrolSite};
use crate::core::levels::{LevelType, MAX_LEVEL, level_type};
use crate::core::types::{Direction, ScreenState};
use crate::driver::Driver;
use crate::io::actuator::Actuator;
use crate::io::pacer::Pacer;
use crate::io::screen::{DriftSide, Screen};

impl<S: Screen, A: Actuator, P: Pacer> Driver<S, A, P> {
    /// Start an attempt from the main menu, then play the level sequence.
    pub fn enter_from_menu(&mut self) -> Result<()> {
        info!("main menu, starting a run");
        self.tap("start")?;
        self.settle(2.0)?;
        if self.screen.matches("quick_raid_option")? {
            debug!("declining quick raid");
            self.tap("start_no_raid")?;
        }
        self.run_levels()
    }

    /// Drive the level slots in order until past the final boss.
    ///
    /// A handler either completes (enabling the advance to the next slot)
    /// or raises a control signal that aborts the whole attempt; slots are
    /// never skipped or retried.
    pub fn run_levels(&mut self) -> Result<()> {
        if self.session.current_level > MAX_LEVEL && self.kind.is_patrol() {
            bail!("level {} out of range", self.session.current_level);
        }
        while self.session.current_level <= MAX_LEVEL {
            let level = self.session.current_level;
            let slot = level_type(level);
            info!(level, ?slot, "level start");
            match slot {
                LevelType::Intro => self.intro_level()?,
                LevelType::Normal => self.normal_level()?,
                LevelType::Heal => self.heal_level()?,
                LevelType::Boss => self.boss_level()?,
                LevelType::FinalBoss => self.final_boss_level()?,
            }
            self.session.current_level = level + 1;
        }
        self.leave_endgame()
    }

    /// One-time setup room: first ability, starter wheel, entry movement.
    fn intro_level(&mut self) -> Result<()> {
        debug!("intro room");
        // The ability wheel takes a while to appear on a fresh run.
        self.settle(8.0)?;
        self.choose_ability()?;
        self.run_program("intro_enter")?;
        self.tap("lucky_wheel_start")?;
        self.settle(4.0)?;
        self.drain_popups()?;
        info!("leaving start room");
        self.run_program("intro_leave")?;
        self.settle(1.0)
    }

    fn normal_level(&mut self) -> Result<()> {
        match self.kind {
            DungeonKind::Patrol(site) => {
                self.cross_dungeon(site)?;
                self.watch(self.config.playtime_secs, false)?;
                self.drain_popups()?;
                self.exit_dungeon()
            }
            DungeonKind::Generic => {
                // Popups first: high-level chapters stack offers between
                // rooms faster than the watch loop alone can absorb.
                self.drain_popups()?;
                self.run_program(self.kind.route_plan().traverse)?;
                self.drain_popups()?;
                self.watch(self.config.playtime_secs, false)?;
                self.exit_dungeon()
            }
        }
    }

    fn heal_level(&mut self) -> Result<()> {
        if !self.kind.is_patrol() {
            return self.normal_level();
        }
        info!("approaching healer");
        self.run_program("heal_approach")?;
        self.drain_popups()?;
        self.run_program("heal_step")?;
        self.drain_popups()?;
        info!("leaving healer");
        self.run_program("heal_leave")?;
        self.settle(1.0)
    }

    fn boss_level(&mut self) -> Result<()> {
        if !self.kind.is_patrol() {
            return self.normal_level();
        }
        info!("attacking boss");
        self.run_program("boss_attack")?;
        self.watch(self.config.playtime_secs, true)?;
        self.drain_popups()?;
        info!("moving to door");
        self.run_program("boss_exit")?;
        self.exit_dungeon()
    }

    fn final_boss_level(&mut self) -> Result<()> {
        if !self.kind.is_patrol() {
            return self.normal_level();
        }
        self.final_boss_wait()?;
        let state = self.state()?;
        debug!(%state, "after final boss wait");
        self.drain_popups()?;
        info!("leaving dungeon");
        self.run_program("final_boss_exit")?;
        self.settle(1.0)
    }

    /// Cross a patrol room, with the chapter-10 slot-18 position fix.
    fn cross_dungeon(&mut self, site: PatrolSite) -> Result<()> {
        info!("crossing dungeon");
        self.run_program(self.kind.route_plan().traverse)?;
        if site == PatrolSite::Doom && self.session.current_level == 18 {
            debug!("adjusting level 18 position");
            self.run_program("cross_doom_lvl18_fix")?;
        }
        if self.config.center_after_crossing {
            self.center_player()?;
        }
        Ok(())
    }

    /// Swipe back toward the room's center line, proportionally to the
    /// measured drift. Small offsets are left alone.
    fn center_player(&mut self) -> Result<()> {
        let drift = self.screen.decentering()?;
        let secs = 0.019 * drift.pixels as f32 - 4.8;
        if secs <= 0.0 {
            return Ok(());
        }
        match drift.side {
            DriftSide::Left => {
                debug!(pixels = drift.pixels, "centering player rightward");
                self.swipe(Direction::East, secs)
            }
            DriftSide::Right => {
                debug!(pixels = drift.pixels, "centering player leftward");
                self.swipe(Direction::West, secs)
            }
            DriftSide::Center => Ok(()),
        }
    }

    /// Leave the cleared room through the exit route, double-checking that
    /// play actually resumed before moving on.
    fn exit_dungeon(&mut self) -> Result<()> {
        self.drain_popups()?;
        info!("leaving room");
        let exit = self.kind.route_plan().exit;
        self.run_program(exit)?;
        if self.state()? != ScreenState::InGame {
            self.drain_popups()?;
            self.run_program(exit)?;
        }
        self.settle(1.0)
    }

    /// Post-sequence cleanup: settle onto the end-of-run screen and close
    /// whatever variant of it is showing.
    fn leave_endgame(&mut self) -> Result<()> {
        debug!("managing endgame exit");
        // The loot screen takes a while to load.
        self.settle(8.0)?;
        let state = self.state()?;
        if state == ScreenState::MenuHome {
            return Ok(());
        }
        if state != ScreenState::Endgame {
            // Maybe a level-up screen slid in front; close through it.
            self.tap("close_end")?;
            self.settle(8.0)?;
        }
        if state == ScreenState::Endgame {
            info!("run won");
            self.close_endgame()?;
        }
        if self.state()? == ScreenState::Endgame {
            self.close_endgame()?;
            self.settle(8.0)?;
        }
        // The attempt is over either way; the next one starts fresh.
        self.session.current_level = 0;
        Ok(())
    }
}
