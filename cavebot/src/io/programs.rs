//! Movement choreography as data.
//!
//! A movement program is an ordered list of swipe/pause steps invoked by
//! name from the loops. The book lives entirely outside the state-machine
//! core; the embedded defaults can be overridden by a JSON file validated
//! against the same schema.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::Draft;
use serde::Deserialize;
use serde_json::Value;

use crate::core::types::Direction;

const PROGRAMS_JSON: &str = include_str!("../../data/programs.json");
const PROGRAMS_SCHEMA: &str = include_str!("../../schemas/programs.schema.json");

/// Program names the loops invoke. The book must define all of them.
pub const REQUIRED_PROGRAMS: [&str; 23] = [
    "cross_ruins",
    "cross_bones",
    "cross_doom",
    "cross_doom_lvl18_fix",
    "cross_generic",
    "exit_bones",
    "exit_doom",
    "exit_generic",
    "patrol_sweep",
    "escape_route_1",
    "escape_route_2",
    "escape_route_3",
    "escape_route_4",
    "escape_route_5",
    "heal_approach",
    "heal_step",
    "heal_leave",
    "boss_attack",
    "boss_exit",
    "final_boss_open",
    "final_boss_exit",
    "intro_enter",
    "intro_leave",
];

/// One step of a movement program.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MoveStep {
    Swipe { swipe: Direction, secs: f32 },
    Pause { pause: f32 },
}

/// Named movement programs, loaded once at startup.
#[derive(Debug, Clone)]
pub struct ProgramBook(HashMap<String, Vec<MoveStep>>);

impl ProgramBook {
    /// Load from a JSON file when given, embedded defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("read {}", path.display()))?;
                Self::from_json(&raw).with_context(|| format!("load {}", path.display()))
            }
            None => Self::embedded(),
        }
    }

    pub fn embedded() -> Result<Self> {
        Self::from_json(PROGRAMS_JSON).context("load embedded program book")
    }

    /// Parse and validate a program book: schema conformance first, then the
    /// required-name inventory.
    pub fn from_json(raw: &str) -> Result<Self> {
        let instance: Value = serde_json::from_str(raw).context("parse program json")?;
        let schema: Value = serde_json::from_str(PROGRAMS_SCHEMA).context("parse schema json")?;
        validate_schema(&instance, &schema)?;
        let programs: HashMap<String, Vec<MoveStep>> =
            serde_json::from_value(instance).context("parse programs")?;
        let book = Self(programs);
        book.validate_required()?;
        Ok(book)
    }

    pub fn get(&self, name: &str) -> Result<&[MoveStep]> {
        self.0
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| anyhow!("unknown movement program {name:?}"))
    }

    fn validate_required(&self) -> Result<()> {
        let missing: Vec<&str> = REQUIRED_PROGRAMS
            .iter()
            .copied()
            .filter(|name| !self.0.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            bail!("program book missing: {}", missing.join(", "));
        }
        Ok(())
    }
}

/// Validate JSON instance against a JSON Schema (Draft 2020-12).
fn validate_schema(instance: &Value, schema: &Value) -> Result<()> {
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .context("compile json schema")?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("schema validation failed:\n- {}", messages.join("\n- "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_book_defines_every_required_program() {
        let book = ProgramBook::embedded().expect("embedded book");
        for name in REQUIRED_PROGRAMS {
            assert!(book.get(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn route_plan_names_are_in_the_required_inventory() {
        use crate::core::dungeon::DungeonKind;
        use crate::core::routes::{EscapeRoute, PATROL_SWEEP};

        for chapter in [3, 6, 10, 1] {
            let plan = DungeonKind::from_id(chapter).route_plan();
            assert!(REQUIRED_PROGRAMS.contains(&plan.traverse));
            assert!(REQUIRED_PROGRAMS.contains(&plan.exit));
        }
        for route in [
            EscapeRoute::First,
            EscapeRoute::Second,
            EscapeRoute::Third,
            EscapeRoute::Fourth,
            EscapeRoute::Fifth,
        ] {
            assert!(REQUIRED_PROGRAMS.contains(&route.program()));
        }
        assert!(REQUIRED_PROGRAMS.contains(&PATROL_SWEEP));
    }

    #[test]
    fn schema_rejects_malformed_steps() {
        let raw = r#"{"cross_ruins": [{"swipe": "north", "secs": 1.0}]}"#;
        assert!(ProgramBook::from_json(raw).is_err());

        let raw = r#"{"cross_ruins": [{"pause": 0}]}"#;
        assert!(ProgramBook::from_json(raw).is_err());
    }

    #[test]
    fn missing_required_program_is_rejected() {
        let raw = r#"{"cross_ruins": [{"swipe": "n", "secs": 1.0}]}"#;
        let err = ProgramBook::from_json(raw).unwrap_err();
        assert!(err.to_string().contains("program book missing"));
    }

    #[test]
    fn steps_parse_into_swipes_and_pauses() {
        let book = ProgramBook::embedded().expect("embedded book");
        let steps = book.get("patrol_sweep").expect("patrol sweep");
        assert!(matches!(steps[0], MoveStep::Swipe { swipe: Direction::West, .. }));
        assert!(matches!(steps[1], MoveStep::Pause { .. }));
    }
}
