//! Append-only statistics book for completed and aborted attempts.

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One attempt record (JSONL line).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameRecord {
    /// Unix seconds when the attempt started.
    pub started_at: u64,
    pub dungeon: u32,
    pub start_level: u8,
    pub end_level: u8,
}

/// Append-only JSONL store. Every session boundary (normal end, abort,
/// cancellation) flushes a record through here so no attempt is lost.
#[derive(Debug, Clone)]
pub struct StatsBook {
    path: PathBuf,
}

impl StatsBook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, record: &GameRecord) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create stats dir {}", parent.display()))?;
        }
        let mut line = serde_json::to_string(record).context("serialize stats record")?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open stats book {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("append stats record {}", self.path.display()))?;
        debug!(dungeon = record.dungeon, end_level = record.end_level, "stats record appended");
        Ok(())
    }

    /// Read every record back. Missing file means no games yet.
    pub fn read_all(&self) -> Result<Vec<GameRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("read stats book {}", self.path.display()))?;
        let mut records = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: GameRecord = serde_json::from_str(line)
                .with_context(|| format!("parse stats line {}", idx + 1))?;
            records.push(record);
        }
        Ok(records)
    }
}

/// Aggregated view over the stats book, for the CLI report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSummary {
    pub games: usize,
    pub best_end_level: u8,
    pub levels_cleared: u64,
}

pub fn summarize(records: &[GameRecord]) -> StatsSummary {
    let mut summary = StatsSummary {
        games: records.len(),
        ..StatsSummary::default()
    };
    for record in records {
        summary.best_end_level = summary.best_end_level.max(record.end_level);
        summary.levels_cleared += u64::from(record.end_level.saturating_sub(record.start_level));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_append_and_read_back_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let book = StatsBook::new(temp.path().join("stats/games.jsonl"));
        let first = GameRecord {
            started_at: 1,
            dungeon: 6,
            start_level: 0,
            end_level: 12,
        };
        let second = GameRecord {
            started_at: 2,
            dungeon: 6,
            start_level: 12,
            end_level: 21,
        };
        book.record(&first).expect("record");
        book.record(&second).expect("record");
        assert_eq!(book.read_all().expect("read"), vec![first, second]);
    }

    #[test]
    fn missing_book_reads_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let book = StatsBook::new(temp.path().join("none.jsonl"));
        assert!(book.read_all().expect("read").is_empty());
    }

    #[test]
    fn summary_counts_games_and_levels() {
        let records = [
            GameRecord {
                started_at: 1,
                dungeon: 6,
                start_level: 0,
                end_level: 10,
            },
            GameRecord {
                started_at: 2,
                dungeon: 6,
                start_level: 10,
                end_level: 21,
            },
        ];
        let summary = summarize(&records);
        assert_eq!(summary.games, 2);
        assert_eq!(summary.best_end_level, 21);
        assert_eq!(summary.levels_cleared, 21);
    }
}
