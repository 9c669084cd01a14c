//! [`RunLog`] that hands events to a storage task over an `embassy-sync` channel

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;
use log::{info, warn};
use thiserror_no_std::Error;

use super::{RunLog, RunName, RunSummary, SampleRecord};
use crate::config::NAME_CAPACITY;

/// Channel capacity for log events
pub const LOG_CHANNEL_CAPACITY: usize = 16;

/// Run names remembered for the collision check
const MAX_KNOWN_RUNS: usize = 32;

/// Event published for the storage consumer
#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    RunStarted(RunName),
    Sample(SampleRecord),
    RunEnded(RunSummary),
}

/// Channel type shared between the controller and the storage consumer
pub type LogChannel = Channel<CriticalSectionRawMutex, LogEvent, LOG_CHANNEL_CAPACITY>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogError {
    #[error("Log channel full")]
    ChannelFull,
    #[error("Run name longer than {max} characters")]
    NameTooLong { max: usize },
}

/// Producer side of a [`LogChannel`].
///
/// The log counts as unavailable while the channel is full; it recovers once
/// the consumer drains it.
pub struct ChannelRunLog<'a> {
    channel: &'a LogChannel,
    known: Vec<RunName, MAX_KNOWN_RUNS>,
}

impl<'a> ChannelRunLog<'a> {
    pub fn new(channel: &'a LogChannel) -> Self {
        Self {
            channel,
            known: Vec::new(),
        }
    }

    /// Start with names already present in storage
    pub fn with_known_runs<'n>(
        channel: &'a LogChannel,
        names: impl IntoIterator<Item = &'n str>,
    ) -> Self {
        let mut log = Self::new(channel);
        for name in names {
            if let Ok(name) = to_run_name(name) {
                log.remember(name);
            }
        }
        log
    }

    pub fn known_runs(&self) -> impl Iterator<Item = &str> {
        self.known.iter().map(|name| name.as_str())
    }

    fn publish(&mut self, event: LogEvent) -> Result<(), LogError> {
        self.channel.try_send(event).map_err(|_| {
            warn!("Log channel full, dropping event");
            LogError::ChannelFull
        })
    }

    fn remember(&mut self, name: RunName) {
        if self.known.contains(&name) {
            return;
        }
        if self.known.is_full() {
            // Oldest name is forgotten
            self.known.remove(0);
        }
        let _ = self.known.push(name);
    }
}

fn to_run_name(name: &str) -> Result<RunName, LogError> {
    let mut run_name = RunName::new();
    run_name.push_str(name).map_err(|_| LogError::NameTooLong {
        max: NAME_CAPACITY,
    })?;
    Ok(run_name)
}

impl RunLog for ChannelRunLog<'_> {
    type Error = LogError;

    fn is_available(&mut self) -> bool {
        !self.channel.is_full()
    }

    fn contains(&mut self, name: &str) -> bool {
        self.known.iter().any(|known| known.as_str() == name)
    }

    fn begin_run(&mut self, name: &str) -> Result<(), LogError> {
        let run_name = to_run_name(name)?;
        self.publish(LogEvent::RunStarted(run_name.clone()))?;
        info!("Logging run {}", name);
        self.remember(run_name);
        Ok(())
    }

    fn record(&mut self, sample: SampleRecord) -> Result<(), LogError> {
        self.publish(LogEvent::Sample(sample))
    }

    fn end_run(&mut self, summary: RunSummary) -> Result<(), LogError> {
        self.publish(LogEvent::RunEnded(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[test]
    fn test_events_arrive_in_order() {
        let channel = LogChannel::new();
        let mut log = ChannelRunLog::new(&channel);

        log.begin_run("RUN_01").unwrap();
        log.record(SampleRecord {
            index: 0,
            intensity: 12.5,
            timestamp_ms: 0,
        })
        .unwrap();
        log.end_run(RunSummary {
            samples: 1,
            elapsed_ms: 1000,
        })
        .unwrap();

        assert!(matches!(
            channel.try_receive(),
            Ok(LogEvent::RunStarted(name)) if name.as_str() == "RUN_01"
        ));
        assert!(matches!(channel.try_receive(), Ok(LogEvent::Sample(s)) if s.index == 0));
        assert!(matches!(
            channel.try_receive(),
            Ok(LogEvent::RunEnded(RunSummary { samples: 1, .. }))
        ));
        assert!(channel.try_receive().is_err());
    }

    #[test]
    fn test_started_runs_are_known() {
        let channel = LogChannel::new();
        let mut log = ChannelRunLog::new(&channel);

        assert!(!log.contains("RUN_01"));
        log.begin_run("RUN_01").unwrap();
        assert!(log.contains("RUN_01"));
        assert!(!log.contains("RUN_02"));
    }

    #[test]
    fn test_seeded_names_are_known() {
        let channel = LogChannel::new();
        let mut log = ChannelRunLog::with_known_runs(&channel, ["A", "B", "WAY_TOO_LONG"]);

        assert!(log.contains("A"));
        assert!(log.contains("B"));
        assert_eq!(log.known_runs().count(), 2);
    }

    #[test]
    fn test_full_channel_fails_until_drained() {
        let channel = LogChannel::new();
        let mut log = ChannelRunLog::new(&channel);
        let sample = SampleRecord {
            index: 0,
            intensity: 1.0,
            timestamp_ms: 0,
        };

        for _ in 0..LOG_CHANNEL_CAPACITY {
            log.record(sample).unwrap();
        }
        assert!(!log.is_available());
        assert_eq!(log.record(sample), Err(LogError::ChannelFull));

        channel.clear();
        assert!(log.is_available());
        assert!(log.record(sample).is_ok());
    }

    #[test]
    fn test_overlong_name_rejected() {
        let channel = LogChannel::new();
        let mut log = ChannelRunLog::new(&channel);
        assert!(matches!(
            log.begin_run("NINECHARS"),
            Err(LogError::NameTooLong { max: 8 })
        ));
        assert!(channel.is_empty());
    }

    #[test]
    fn test_known_names_drop_oldest_when_full() {
        let channel = LogChannel::new();
        let mut log = ChannelRunLog::new(&channel);
        for i in 0..=MAX_KNOWN_RUNS {
            let mut name = RunName::new();
            write!(name, "R{}", i).unwrap();
            log.remember(name);
        }
        assert!(!log.contains("R0"));
        assert!(log.contains("R1"));
        assert!(log.contains("R32"));
    }
}
