//! Stop-aware sleeping.
//!
//! All fixed delays in the loops go through a [`Pacer`] so that a stop
//! request interrupts a sleep at a one-second granularity and tests can run
//! without real time passing.

use std::thread;
use std::time::Duration;

use anyhow::Result;

use crate::stop::StopToken;

pub trait Pacer {
    /// Sleep for `duration`, unwinding with the typed stop error as soon as
    /// a stop request is observed.
    fn pause(&self, stop: &StopToken, duration: Duration) -> Result<()>;
}

/// Pacer that sleeps on the current thread in one-second slices.
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, stop: &StopToken, duration: Duration) -> Result<()> {
        let mut left = duration;
        while left > Duration::ZERO {
            stop.checkpoint()?;
            let slice = left.min(Duration::from_secs(1));
            thread::sleep(slice);
            left -= slice;
        }
        stop.checkpoint()
    }
}
