//! Side-effecting collaborators behind the run-control loops.

pub mod actuator;
pub mod config;
pub mod coords;
pub mod pacer;
pub mod process;
pub mod programs;
pub mod screen;
pub mod settings;
pub mod stats;
