//! Run logging
//!
//! Recorded samples leave the controller through a [`RunLog`]. The on-disk
//! format is owned by whoever consumes the log; the controller only needs to
//! know whether a write succeeded and whether a run name is already taken.

mod channel;

pub use channel::{ChannelRunLog, LOG_CHANNEL_CAPACITY, LogChannel, LogError, LogEvent};

use crate::config::NAME_CAPACITY;

/// Name a run is logged under
pub type RunName = heapless::String<NAME_CAPACITY>;

/// One recorded sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord {
    pub index: u16,
    /// Illuminance in lux
    pub intensity: f32,
    /// Run time at which the sample was taken
    pub timestamp_ms: u64,
}

/// Totals written when a run completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub samples: u16,
    pub elapsed_ms: u64,
}

/// Sink for recorded runs
pub trait RunLog {
    type Error: core::fmt::Debug;

    /// Whether the log can currently accept writes
    fn is_available(&mut self) -> bool;

    /// Whether a run called `name` has already been logged
    fn contains(&mut self, name: &str) -> bool;

    /// Open a new run, replacing any earlier run of the same name
    fn begin_run(&mut self, name: &str) -> Result<(), Self::Error>;

    fn record(&mut self, sample: SampleRecord) -> Result<(), Self::Error>;

    fn end_run(&mut self, summary: RunSummary) -> Result<(), Self::Error>;
}
