use core::ops::Range;

use heapless::Vec;
use log::debug;

use crate::config::SAMPLE_COUNT;

/// Intensity samples of one run.
///
/// The next sample is due once the elapsed run time reaches
/// `interval_ms * len()`. Thresholds are derived from the count, never
/// accumulated, so uneven tick spacing does not drift the schedule. A call
/// that arrives late appends one sample per boundary it crossed.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<f32, SAMPLE_COUNT>,
    interval_ms: u32,
    /// Fixed vertical full-scale value for the whole run
    scale: f32,
    /// Highest intensity recorded so far
    peak: f32,
}

impl SampleBuffer {
    pub fn new(interval_ms: u32, scale: f32) -> Self {
        Self {
            samples: Vec::new(),
            interval_ms,
            scale,
            peak: 0.0,
        }
    }

    /// Buffer for a run of `total_ms`, scaled to the first reading plus `margin`
    pub fn for_run(total_ms: u32, first_reading: f32, margin: f32) -> Self {
        let interval_ms = Self::interval_for(total_ms);
        let reading = if first_reading.is_finite() {
            first_reading
        } else {
            0.0
        };
        let mut buffer = Self::new(interval_ms, reading + margin);
        buffer.peak = reading;
        buffer
    }

    /// Sampling interval that spreads [`SAMPLE_COUNT`] samples over `total_ms`
    pub const fn interval_for(total_ms: u32) -> u32 {
        total_ms / SAMPLE_COUNT as u32
    }

    /// Elapsed run time at which the next sample becomes due
    pub fn next_due_ms(&self) -> u64 {
        self.interval_ms as u64 * self.samples.len() as u64
    }

    /// Record `intensity` for every sample due at `elapsed_ms`.
    ///
    /// Returns the indices of the appended samples, empty when none was due.
    /// A zero interval has no boundaries to catch up on and takes one sample
    /// per call.
    pub fn observe(&mut self, elapsed_ms: u64, intensity: f32) -> Range<usize> {
        let first = self.samples.len();
        while !self.is_full() && elapsed_ms >= self.next_due_ms() {
            if self.samples.push(intensity).is_err() {
                break;
            }
            if self.interval_ms == 0 {
                break;
            }
        }
        let appended = first..self.samples.len();

        if !appended.is_empty() {
            if intensity > self.peak {
                self.peak = intensity;
            }
            debug!(
                "Samples {:?} at {} ms: {} lux",
                appended, elapsed_ms, intensity
            );
        }
        appended
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn latest(&self) -> Option<f32> {
        self.samples.last().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == SAMPLE_COUNT
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }
}
