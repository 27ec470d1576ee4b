//! Per-attempt session bookkeeping.

use std::time::{SystemTime, UNIX_EPOCH};

/// Mutable bookkeeping for the current dungeon attempt. Owned by the
/// supervisor; the level counter advances as slots complete and is consumed
/// by the statistics book on every session boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSession {
    pub dungeon: u32,
    /// Unix seconds when the current attempt started.
    pub started_at: u64,
    pub start_level: u8,
    pub current_level: u8,
}

impl RunSession {
    pub fn new(dungeon: u32) -> Self {
        Self {
            dungeon,
            started_at: now_unix(),
            start_level: 0,
            current_level: 0,
        }
    }
}

pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
