//! Fixed level-slot table for one dungeon attempt.

/// Highest level slot in an attempt. Slot layout below assumes this value.
pub const MAX_LEVEL: u8 = 20;

/// Room type behind a level slot. Drives the per-slot handler dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelType {
    Intro,
    Normal,
    Heal,
    Boss,
    FinalBoss,
}

/// Map a level slot to its type.
///
/// The table is immutable: slot 0 is the intro room, slots 5/10/15 are boss
/// rooms, every second slot in between offers the healer, and the single
/// final-boss slot sits at [`MAX_LEVEL`]. Slots past the table end are
/// clamped to `FinalBoss` so callers can probe without panicking.
pub fn level_type(level: u8) -> LevelType {
    match level {
        0 => LevelType::Intro,
        2 | 4 | 7 | 9 | 12 | 14 | 17 | 19 => LevelType::Heal,
        5 | 10 | 15 => LevelType::Boss,
        1 | 3 | 6 | 8 | 11 | 13 | 16 | 18 => LevelType::Normal,
        _ => LevelType::FinalBoss,
    }
}
