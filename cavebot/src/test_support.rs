//! Test-only scripted collaborators.
//!
//! The scripted screen answers classifier queries from queues (falling back
//! to a fixed state when a queue runs dry), the recording actuator keeps
//! every tap and swipe, and the instant pacer makes time pass without
//! sleeping. Handles are cheap clones over shared interiors, so a test can
//! keep one and hand another to the driver.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::core::ability::TierList;
use crate::core::dungeon::PatrolSite;
use crate::core::types::{Direction, ScreenState};
use crate::driver::{Driver, DriverParts};
use crate::io::actuator::Actuator;
use crate::io::config::Config;
use crate::io::pacer::Pacer;
use crate::io::programs::ProgramBook;
use crate::io::screen::{AbilityOffer, Decentering, DoorCheck, DriftSide, ExpSample, Screen};
use crate::io::settings::Settings;
use crate::io::stats::StatsBook;
use crate::stop::StopToken;

struct ScreenScript {
    states: VecDeque<ScreenState>,
    fallback: ScreenState,
    match_queues: HashMap<String, VecDeque<bool>>,
    match_constants: HashMap<String, bool>,
    doors: VecDeque<bool>,
    boss: VecDeque<bool>,
    exp_changed: VecDeque<bool>,
    abilities: VecDeque<AbilityOffer>,
    decentering: VecDeque<Decentering>,
    classifications: usize,
}

impl Default for ScreenScript {
    fn default() -> Self {
        Self {
            states: VecDeque::new(),
            fallback: ScreenState::InGame,
            match_queues: HashMap::new(),
            match_constants: HashMap::new(),
            doors: VecDeque::new(),
            boss: VecDeque::new(),
            exp_changed: VecDeque::new(),
            abilities: VecDeque::new(),
            decentering: VecDeque::new(),
            classifications: 0,
        }
    }
}

/// Screen that replays scripted answers.
#[derive(Clone, Default)]
pub struct ScriptedScreen {
    script: Rc<RefCell<ScreenScript>>,
}

impl ScriptedScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// State returned once the queue is empty (default `in_game`).
    pub fn with_fallback(self, state: ScreenState) -> Self {
        self.script.borrow_mut().fallback = state;
        self
    }

    pub fn push_state(&self, state: ScreenState) {
        self.script.borrow_mut().states.push_back(state);
    }

    /// Queue one answer for a template; consumed before the constant.
    pub fn push_match(&self, template: &str, answer: bool) {
        self.script
            .borrow_mut()
            .match_queues
            .entry(template.to_string())
            .or_default()
            .push_back(answer);
    }

    /// Constant answer for a template once its queue is empty.
    pub fn set_match(&self, template: &str, answer: bool) {
        self.script
            .borrow_mut()
            .match_constants
            .insert(template.to_string(), answer);
    }

    pub fn push_door(&self, open: bool) {
        self.script.borrow_mut().doors.push_back(open);
    }

    pub fn push_boss(&self, dead: bool) {
        self.script.borrow_mut().boss.push_back(dead);
    }

    pub fn push_exp_changed(&self, changed: bool) {
        self.script.borrow_mut().exp_changed.push_back(changed);
    }

    pub fn push_decentering(&self, pixels: u32, side: DriftSide) {
        self.script
            .borrow_mut()
            .decentering
            .push_back(Decentering { pixels, side });
    }

    pub fn push_abilities(&self, left: &str, center: &str, right: &str) {
        self.script.borrow_mut().abilities.push_back(AbilityOffer {
            left: left.to_string(),
            center: center.to_string(),
            right: right.to_string(),
        });
    }

    /// How many frames have been classified so far.
    pub fn classifications(&self) -> usize {
        self.script.borrow().classifications
    }
}

impl Screen for ScriptedScreen {
    fn state(&self) -> Result<ScreenState> {
        let mut script = self.script.borrow_mut();
        script.classifications += 1;
        let state = script.states.pop_front().unwrap_or(script.fallback);
        Ok(state)
    }

    fn matches(&self, template: &str) -> Result<bool> {
        let mut script = self.script.borrow_mut();
        if let Some(queue) = script.match_queues.get_mut(template)
            && let Some(answer) = queue.pop_front()
        {
            return Ok(answer);
        }
        Ok(script.match_constants.get(template).copied().unwrap_or(false))
    }

    fn doors_open(&self, _check: DoorCheck) -> Result<bool> {
        Ok(self.script.borrow_mut().doors.pop_front().unwrap_or(false))
    }

    fn boss_dead(&self, _site: PatrolSite) -> Result<bool> {
        Ok(self.script.borrow_mut().boss.pop_front().unwrap_or(false))
    }

    fn exp_sample(&self) -> Result<ExpSample> {
        Ok(ExpSample("scripted".to_string()))
    }

    fn exp_changed(&self, _baseline: &ExpSample) -> Result<bool> {
        Ok(self
            .script
            .borrow_mut()
            .exp_changed
            .pop_front()
            .unwrap_or(false))
    }

    fn abilities(&self) -> Result<AbilityOffer> {
        self.script
            .borrow_mut()
            .abilities
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted ability offer"))
    }

    fn decentering(&self) -> Result<Decentering> {
        Ok(self
            .script
            .borrow_mut()
            .decentering
            .pop_front()
            .unwrap_or(Decentering {
                pixels: 0,
                side: DriftSide::Center,
            }))
    }
}

/// Tap or swipe as observed by the recording actuator.
#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorEvent {
    Tap(String),
    Swipe(Direction, f32),
}

/// Actuator that records every event and performs nothing.
#[derive(Clone, Default)]
pub struct RecordingActuator {
    events: Rc<RefCell<Vec<ActuatorEvent>>>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ActuatorEvent> {
        self.events.borrow().clone()
    }

    pub fn taps(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ActuatorEvent::Tap(name) => Some(name.clone()),
                ActuatorEvent::Swipe(..) => None,
            })
            .collect()
    }

    pub fn swipes(&self) -> Vec<(Direction, f32)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ActuatorEvent::Swipe(direction, secs) => Some((*direction, *secs)),
                ActuatorEvent::Tap(_) => None,
            })
            .collect()
    }
}

impl Actuator for RecordingActuator {
    fn tap(&self, button: &str) -> Result<()> {
        self.events
            .borrow_mut()
            .push(ActuatorEvent::Tap(button.to_string()));
        Ok(())
    }

    fn swipe(&self, direction: Direction, secs: f32) -> Result<()> {
        self.events
            .borrow_mut()
            .push(ActuatorEvent::Swipe(direction, secs));
        Ok(())
    }
}

#[derive(Default)]
struct PacerState {
    pauses: u32,
    stop_after: Option<u32>,
}

/// Pacer that never sleeps. Counts pauses, and can arm the stop token after
/// the Nth pause to simulate a stop request arriving mid-sleep.
#[derive(Clone, Default)]
pub struct InstantPacer {
    state: Rc<RefCell<PacerState>>,
}

impl InstantPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_after(self, pauses: u32) -> Self {
        self.state.borrow_mut().stop_after = Some(pauses);
        self
    }

    pub fn pauses(&self) -> u32 {
        self.state.borrow().pauses
    }
}

impl Pacer for InstantPacer {
    fn pause(&self, stop: &StopToken, _duration: Duration) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.pauses += 1;
        if let Some(limit) = state.stop_after
            && state.pauses >= limit
        {
            stop.set();
        }
        drop(state);
        stop.checkpoint()
    }
}

/// Temporary working directory owning the stats book of a test driver.
pub struct TestHome {
    dir: tempfile::TempDir,
}

impl TestHome {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn stats_book(&self) -> StatsBook {
        StatsBook::new(self.path().join("games.jsonl"))
    }
}

/// Build a driver over scripted collaborators with a test-friendly config.
///
/// The stats book lives under `dir`; the energy gate is skipped by default
/// since most tests start from level 0 with no energy scripting.
pub fn test_driver(
    dir: &Path,
    dungeon: u32,
    screen: ScriptedScreen,
    actuator: RecordingActuator,
    pacer: InstantPacer,
) -> Driver<ScriptedScreen, RecordingActuator, InstantPacer> {
    let config = Config {
        skip_energy_check: true,
        stats_path: dir.join("games.jsonl"),
        ..Config::default()
    };
    driver_with_config(config, dungeon, screen, actuator, pacer)
}

/// Build a driver over scripted collaborators with an explicit config.
pub fn driver_with_config(
    config: Config,
    dungeon: u32,
    screen: ScriptedScreen,
    actuator: RecordingActuator,
    pacer: InstantPacer,
) -> Driver<ScriptedScreen, RecordingActuator, InstantPacer> {
    let stats = StatsBook::new(config.stats_path.clone());
    Driver::new(DriverParts {
        screen,
        actuator,
        pacer,
        stop: StopToken::new(),
        config,
        settings: Settings {
            selected_dungeon: dungeon,
            ..Settings::default()
        },
        programs: ProgramBook::embedded().expect("embedded program book"),
        tiers: TierList::embedded().expect("embedded tier list"),
        stats,
    })
}
