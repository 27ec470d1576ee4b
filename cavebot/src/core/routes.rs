//! Escape-route selection for timed generic chapters.
//!
//! While a generic level is still playing, the watch loop fills idle time
//! with one of five fixed movement programs, chosen purely by the fraction
//! of the play budget remaining. Integer arithmetic keeps the threshold
//! ticks exact (tick 85 of a 100s budget is still the first route).

/// Filler movement program for one budget band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeRoute {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
}

impl EscapeRoute {
    pub fn program(self) -> &'static str {
        match self {
            Self::First => "escape_route_1",
            Self::Second => "escape_route_2",
            Self::Third => "escape_route_3",
            Self::Fourth => "escape_route_4",
            Self::Fifth => "escape_route_5",
        }
    }
}

/// Movement program performed while a patrol level is still playing.
pub const PATROL_SWEEP: &str = "patrol_sweep";

/// Select the escape route for the current countdown tick.
///
/// Bands are >=85%, >=70%, >=50%, >=35% and below, of the original budget.
pub fn escape_route(budget_secs: u32, remaining_secs: u32) -> EscapeRoute {
    let scaled = remaining_secs.saturating_mul(100);
    if scaled >= budget_secs.saturating_mul(85) {
        EscapeRoute::First
    } else if scaled >= budget_secs.saturating_mul(70) {
        EscapeRoute::Second
    } else if scaled >= budget_secs.saturating_mul(50) {
        EscapeRoute::Third
    } else if scaled >= budget_secs.saturating_mul(35) {
        EscapeRoute::Fourth
    } else {
        EscapeRoute::Fifth
    }
}
