//! Process-wide cooperative cancellation.
//!
//! A [`StopToken`] is cloned into every loop and collaborator. It is checked
//! at every suspension point and immediately before every actuation; once
//! set, all in-flight loops unwind to the supervisor without issuing further
//! input events. A stop always wins over any in-progress recovery.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

/// Cooperative stop flag shared across the session.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raise [`Stopped`] if a stop has been requested.
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_set() {
            return Err(Stopped.into());
        }
        Ok(())
    }
}

/// Typed unwind marker for a requested stop. Recovered by `downcast_ref`
/// at the supervisor, never treated as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped;

impl fmt::Display for Stopped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("stop requested")
    }
}

impl std::error::Error for Stopped {}
