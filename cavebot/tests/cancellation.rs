//! Cooperative-stop behavior across the whole session.
//!
//! A stop request observed during any sleep or immediately before any
//! actuation must end the session without further input events, after one
//! final statistics record.

use cavebot::io::config::Config;
use cavebot::supervisor::FarmStop;
use cavebot::test_support::{
    InstantPacer, RecordingActuator, ScriptedScreen, TestHome, driver_with_config,
};

fn quick_config(home: &TestHome) -> Config {
    Config {
        playtime_secs: 5,
        farm_loops: 2,
        skip_energy_check: true,
        stats_path: home.path().join("games.jsonl"),
        ..Config::default()
    }
}

/// A stop arriving during the first sleep of the session ends it right
/// there: the only actuation is the menu tap that preceded the sleep.
#[test]
fn stop_during_a_sleep_ends_the_session() {
    let home = TestHome::new().expect("home");
    let actuator = RecordingActuator::new();
    let mut driver = driver_with_config(
        quick_config(&home),
        6,
        ScriptedScreen::new(),
        actuator.clone(),
        InstantPacer::new().stop_after(1),
    );

    let outcome = driver.farm().expect("farm");
    assert_eq!(outcome.stop, FarmStop::Stopped);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(actuator.taps(), vec!["start".to_string()]);
    assert!(actuator.swipes().is_empty());

    // The abort still flushed exactly one record.
    assert_eq!(home.stats_book().read_all().expect("stats").len(), 1);
}

/// A stop that is already set when the first actuation would happen issues
/// no input events at all.
#[test]
fn stop_before_any_actuation_issues_nothing() {
    let home = TestHome::new().expect("home");
    let actuator = RecordingActuator::new();
    let mut driver = driver_with_config(
        quick_config(&home),
        6,
        ScriptedScreen::new(),
        actuator.clone(),
        InstantPacer::new(),
    );
    driver.stop_token().set();

    let outcome = driver.farm().expect("farm");
    assert_eq!(outcome.stop, FarmStop::Stopped);
    assert!(actuator.events().is_empty());
    assert_eq!(home.stats_book().read_all().expect("stats").len(), 1);
}

/// A stop deep inside a session (mid-watch of a later level) unwinds past
/// every nested loop with a single record.
#[test]
fn stop_mid_watch_unwinds_every_loop() {
    let home = TestHome::new().expect("home");
    let actuator = RecordingActuator::new();
    let mut driver = driver_with_config(
        quick_config(&home),
        6,
        ScriptedScreen::new(),
        actuator.clone(),
        // Far enough to be inside a timed room of the first attempt.
        InstantPacer::new().stop_after(40),
    );

    let outcome = driver.farm().expect("farm");
    assert_eq!(outcome.stop, FarmStop::Stopped);
    let events_at_stop = actuator.events().len();
    assert!(events_at_stop > 0);
    assert_eq!(home.stats_book().read_all().expect("stats").len(), 1);
}
