//! Screen-driven dungeon farm bot CLI.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use cavebot::core::ability::TierList;
use cavebot::core::dungeon::chapter_name;
use cavebot::core::types::HealingStrategy;
use cavebot::driver::{Driver, DriverParts};
use cavebot::exit_codes;
use cavebot::io::actuator::{AdbActuator, detect_size};
use cavebot::io::config::{Config, load_config};
use cavebot::io::coords::{CoordBook, parse_size};
use cavebot::io::pacer::ThreadPacer;
use cavebot::io::screen::CommandScreen;
use cavebot::io::settings::{Settings, load_settings, write_settings};
use cavebot::io::stats::{StatsBook, summarize};
use cavebot::logging;
use cavebot::stop::StopToken;
use cavebot::supervisor::FarmStop;

#[derive(Parser)]
#[command(name = "cavebot", version, about = "Screen-driven dungeon farm bot")]
struct Cli {
    /// Path to the bot configuration file.
    #[arg(long, global = true, default_value = "cavebot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Farm the selected dungeon until the attempt cap or a stop.
    Run {
        /// Chapter id to farm (overrides the persisted selection).
        #[arg(long)]
        dungeon: Option<u32>,
        /// Attempt cap for this session (overrides the config).
        #[arg(long)]
        loops: Option<u32>,
        /// Start runs without checking for energy (not recommended).
        #[arg(long)]
        skip_energy_check: bool,
    },
    /// Classify the current screen once and print the label.
    State,
    /// Show or change the persisted settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Summarize the statistics book.
    Stats,
    /// Check config, settings, coordinate tables, programs, and tier list.
    Validate,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings.
    Show,
    /// Set the healing strategy (always_heal | always_power).
    Heal { strategy: String },
    /// Select the dungeon chapter to farm.
    Dungeon { id: u32 },
}

fn main() {
    logging::init();
    std::process::exit(match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            exit_codes::INVALID
        }
    });
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            dungeon,
            loops,
            skip_energy_check,
        } => cmd_run(&cli.config, dungeon, loops, skip_energy_check),
        Command::State => cmd_state(&cli.config),
        Command::Settings { action } => cmd_settings(&cli.config, action),
        Command::Stats => cmd_stats(&cli.config),
        Command::Validate => cmd_validate(&cli.config),
    }
}

fn cmd_run(
    config_path: &Path,
    dungeon: Option<u32>,
    loops: Option<u32>,
    skip_energy_check: bool,
) -> Result<i32> {
    let mut config = load_config(config_path)?;
    if let Some(loops) = loops {
        config.farm_loops = loops;
    }
    config.skip_energy_check |= skip_energy_check;
    config.validate()?;

    let mut settings = load_settings(&config.settings_path)?;
    if let Some(dungeon) = dungeon {
        if chapter_name(dungeon).is_none() {
            bail!("unknown chapter {dungeon}");
        }
        settings.selected_dungeon = dungeon;
        write_settings(&config.settings_path, &settings)?;
    }
    let chapter = chapter_name(settings.selected_dungeon).unwrap_or("?");
    info!(
        dungeon = settings.selected_dungeon,
        chapter, "farming session starting"
    );

    let (width, height) = device_size(&config)?;
    let coords = CoordBook::load(&config.data_dir, width, height)?;
    let programs =
        cavebot::io::programs::ProgramBook::load(config.programs_path.as_deref())?;
    let tiers = match &config.tier_list_path {
        Some(path) => TierList::load(path)?,
        None => TierList::embedded()?,
    };

    let stop = StopToken::new();
    watch_stdin_for_stop(stop.clone());

    let screen = CommandScreen::from_config(&config);
    let actuator = AdbActuator::new(&config, coords, width, height);
    let stats = StatsBook::new(config.stats_path.clone());
    let mut driver = Driver::new(DriverParts {
        screen,
        actuator,
        pacer: ThreadPacer,
        stop,
        config,
        settings,
        programs,
        tiers,
        stats,
    });

    let outcome = driver.farm()?;
    Ok(match outcome.stop {
        FarmStop::Exhausted => {
            info!(attempts = outcome.attempts, "farming complete");
            exit_codes::EXHAUSTED
        }
        FarmStop::Fatal { reason } => {
            warn!(attempts = outcome.attempts, %reason, "session aborted");
            exit_codes::FATAL
        }
        FarmStop::Stopped => {
            info!(attempts = outcome.attempts, "session stopped");
            exit_codes::STOPPED
        }
    })
}

fn cmd_state(config_path: &Path) -> Result<i32> {
    let config = load_config(config_path)?;
    let screen = CommandScreen::from_config(&config);
    use cavebot::io::screen::Screen;
    let state = screen.state()?;
    println!("{state}");
    Ok(exit_codes::OK)
}

fn cmd_settings(config_path: &Path, action: SettingsAction) -> Result<i32> {
    let config = load_config(config_path)?;
    let mut settings = load_settings(&config.settings_path)?;
    match action {
        SettingsAction::Show => {
            print_settings(&settings);
        }
        SettingsAction::Heal { strategy } => {
            let strategy = HealingStrategy::parse(&strategy)
                .with_context(|| format!("unknown healing strategy {strategy:?}"))?;
            settings.healing_strategy = strategy;
            write_settings(&config.settings_path, &settings)?;
            print_settings(&settings);
        }
        SettingsAction::Dungeon { id } => {
            if chapter_name(id).is_none() {
                bail!("unknown chapter {id}");
            }
            settings.selected_dungeon = id;
            write_settings(&config.settings_path, &settings)?;
            print_settings(&settings);
        }
    }
    Ok(exit_codes::OK)
}

fn print_settings(settings: &Settings) {
    println!("healing_strategy = {}", settings.healing_strategy.label());
    println!(
        "selected_dungeon = {} ({})",
        settings.selected_dungeon,
        chapter_name(settings.selected_dungeon).unwrap_or("?")
    );
}

fn cmd_stats(config_path: &Path) -> Result<i32> {
    let config = load_config(config_path)?;
    let book = StatsBook::new(config.stats_path.clone());
    let records = book.read_all()?;
    let summary = summarize(&records);
    println!("games: {}", summary.games);
    println!("best end level: {}", summary.best_end_level);
    println!("levels cleared: {}", summary.levels_cleared);
    Ok(exit_codes::OK)
}

fn cmd_validate(config_path: &Path) -> Result<i32> {
    let config = load_config(config_path)?;
    config.validate()?;
    load_settings(&config.settings_path)?;
    cavebot::io::programs::ProgramBook::load(config.programs_path.as_deref())?;
    match &config.tier_list_path {
        Some(path) => TierList::load(path)?,
        None => TierList::embedded()?,
    };
    // Coordinate tables need a resolution; use the override or the embedded
    // default family without touching a device.
    match &config.resolution {
        Some(raw) => {
            let (width, height) =
                parse_size(raw).with_context(|| format!("parse resolution {raw:?}"))?;
            CoordBook::load(&config.data_dir, width, height)?;
        }
        None => {
            CoordBook::embedded()?;
        }
    }
    println!("ok");
    Ok(exit_codes::OK)
}

fn device_size(config: &Config) -> Result<(u32, u32)> {
    if let Some(raw) = &config.resolution {
        return parse_size(raw).with_context(|| format!("parse resolution {raw:?}"));
    }
    detect_size(config)
}

/// Arm the stop token when the user presses Enter. The flag is observed at
/// the next suspension or pre-actuation point, never mid-gesture.
fn watch_stdin_for_stop(stop: StopToken) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_ok() {
            info!("stop requested, finishing up");
            stop.set();
        }
    });
}
