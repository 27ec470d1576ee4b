//! Shared deterministic types for the run-control core.
//!
//! These types define stable contracts between the loops and the external
//! collaborators. Labels match the classifier and settings wire formats and
//! must remain stable across releases.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete classification of the currently visible game screen.
///
/// Produced by the screen classifier; consumed, never mutated, by all loops.
/// Unrecognized labels map to [`ScreenState::Unknown`] so that classifier
/// gaps degrade into the bounded retry path instead of a hard failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    InGame,
    Unknown,
    Endgame,
    RepeatEndgameQuestion,
    MenuHome,
    SelectAbility,
    FortuneWheel,
    DevilQuestion,
    MisteryVendor,
    AdAsk,
    AngelHeal,
    OnPause,
    TimePrize,
    SpecialGiftRespin,
}

impl ScreenState {
    /// Parse a classifier label. Anything unrecognized is `Unknown`.
    pub fn parse(label: &str) -> Self {
        match label {
            "in_game" => Self::InGame,
            "endgame" => Self::Endgame,
            "repeat_endgame_question" => Self::RepeatEndgameQuestion,
            "menu_home" => Self::MenuHome,
            "select_ability" => Self::SelectAbility,
            "fortune_wheel" => Self::FortuneWheel,
            "devil_question" => Self::DevilQuestion,
            "mistery_vendor" => Self::MisteryVendor,
            "ad_ask" => Self::AdAsk,
            "angel_heal" => Self::AngelHeal,
            "on_pause" => Self::OnPause,
            "time_prize" => Self::TimePrize,
            "special_gift_respin" => Self::SpecialGiftRespin,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::InGame => "in_game",
            Self::Unknown => "unknown",
            Self::Endgame => "endgame",
            Self::RepeatEndgameQuestion => "repeat_endgame_question",
            Self::MenuHome => "menu_home",
            Self::SelectAbility => "select_ability",
            Self::FortuneWheel => "fortune_wheel",
            Self::DevilQuestion => "devil_question",
            Self::MisteryVendor => "mistery_vendor",
            Self::AdAsk => "ad_ask",
            Self::AngelHeal => "angel_heal",
            Self::OnPause => "on_pause",
            Self::TimePrize => "time_prize",
            Self::SpecialGiftRespin => "special_gift_respin",
        }
    }
}

impl fmt::Display for ScreenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which of the three offered ability slots to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilitySlot {
    Left,
    Center,
    Right,
}

impl AbilitySlot {
    /// Logical button name for the slot, resolved through the coordinate table.
    pub fn button(self) -> &'static str {
        match self {
            Self::Left => "ability_left",
            Self::Center => "ability_center",
            Self::Right => "ability_right",
        }
    }
}

/// Persisted policy for resolving the healer's heal-or-power-up offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealingStrategy {
    #[serde(rename = "always_heal")]
    AlwaysHeal,
    #[serde(rename = "always_power")]
    AlwaysPowerUp,
}

impl HealingStrategy {
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "always_heal" => Some(Self::AlwaysHeal),
            "always_power" => Some(Self::AlwaysPowerUp),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AlwaysHeal => "always_heal",
            Self::AlwaysPowerUp => "always_power",
        }
    }
}

/// Swipe direction. Wire labels are the compass abbreviations used by the
/// movement coordinate tables; display names are for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "n")]
    North,
    #[serde(rename = "s")]
    South,
    #[serde(rename = "e")]
    East,
    #[serde(rename = "w")]
    West,
    #[serde(rename = "ne")]
    NorthEast,
    #[serde(rename = "nw")]
    NorthWest,
    #[serde(rename = "se")]
    SouthEast,
    #[serde(rename = "sw")]
    SouthWest,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Self::North => "n",
            Self::South => "s",
            Self::East => "e",
            Self::West => "w",
            Self::NorthEast => "ne",
            Self::NorthWest => "nw",
            Self::SouthEast => "se",
            Self::SouthWest => "sw",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::North => "up",
            Self::South => "down",
            Self::East => "right",
            Self::West => "left",
            Self::NorthEast => "up-right",
            Self::NorthWest => "up-left",
            Self::SouthEast => "down-right",
            Self::SouthWest => "down-left",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Control transfer raised by an inner loop and interpreted by the
/// supervisor. These are not ordinary failures: each carries a defined
/// recovery action. Raised through `anyhow::Error` and recovered with
/// `downcast_ref` so the supervisor's handling is one exhaustive `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// The main menu was observed mid-sequence; the supervisor restarts the
    /// attempt loop. Never fatal.
    RestartFromMenu,
    /// The classifier returned `unknown` beyond the retry budget, or a
    /// bounded loop exceeded its cap. Fatal for patrol dungeons only.
    UnknownScreen,
    /// The outer attempt cap was reached. A clean, successful termination.
    FarmLoopExhausted,
}

impl fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RestartFromMenu => f.write_str("main menu observed mid-sequence"),
            Self::UnknownScreen => f.write_str("unknown screen state"),
            Self::FarmLoopExhausted => f.write_str("farm loop cap reached"),
        }
    }
}

impl std::error::Error for ControlSignal {}
