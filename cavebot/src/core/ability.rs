//! Ability tier ranking and best-of-three slot selection.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::types::AbilitySlot;

const DEFAULT_TIER_LIST: &str = include_str!("../../data/tier_list.json");

/// Ability identifier to numeric rank (lower is better). Loaded once at
/// startup and immutable for the process lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct TierList(HashMap<String, u32>);

impl TierList {
    /// Load from a JSON file, or fall back to the embedded ranking when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Self::embedded();
        }
        let raw =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
    }

    pub fn embedded() -> Result<Self> {
        serde_json::from_str(DEFAULT_TIER_LIST).context("parse embedded tier list")
    }

    pub fn rank(&self, ability: &str) -> Option<u32> {
        self.0.get(ability).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Choose the offered slot with the strictly smallest rank.
///
/// Falls back to the left slot when any rank is missing or when no slot is
/// a strict winner (an exact tie). The fallback always succeeds regardless
/// of ranking gaps: tiering quality is not a safety concern.
pub fn pick_best(tiers: &TierList, left: &str, center: &str, right: &str) -> AbilitySlot {
    let (Some(l), Some(c), Some(r)) = (tiers.rank(left), tiers.rank(center), tiers.rank(right))
    else {
        return AbilitySlot::Left;
    };
    if l < c && l < r {
        AbilitySlot::Left
    } else if c < l && c < r {
        AbilitySlot::Center
    } else if r < l && r < c {
        AbilitySlot::Right
    } else {
        AbilitySlot::Left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers(entries: &[(&str, u32)]) -> TierList {
        TierList(
            entries
                .iter()
                .map(|(name, rank)| (name.to_string(), *rank))
                .collect(),
        )
    }

    #[test]
    fn strict_minimum_wins_in_every_slot() {
        let t = tiers(&[("a", 1), ("b", 5), ("c", 9)]);
        assert_eq!(pick_best(&t, "a", "b", "c"), AbilitySlot::Left);
        assert_eq!(pick_best(&t, "b", "a", "c"), AbilitySlot::Center);
        assert_eq!(pick_best(&t, "c", "b", "a"), AbilitySlot::Right);
    }

    #[test]
    fn missing_rank_falls_back_to_left() {
        let t = tiers(&[("a", 1), ("b", 5)]);
        assert_eq!(pick_best(&t, "a", "b", "mystery"), AbilitySlot::Left);
        assert_eq!(pick_best(&t, "mystery", "a", "b"), AbilitySlot::Left);
    }

    #[test]
    fn exact_tie_falls_back_to_left() {
        let t = tiers(&[("a", 3), ("b", 3), ("c", 7)]);
        // No strict winner between the two rank-3 offers.
        assert_eq!(pick_best(&t, "a", "b", "c"), AbilitySlot::Left);
        assert_eq!(pick_best(&t, "c", "a", "b"), AbilitySlot::Left);
    }

    #[test]
    fn embedded_tier_list_parses_and_is_nonempty() {
        let t = TierList::embedded().expect("embedded tier list");
        assert!(!t.is_empty());
    }
}
