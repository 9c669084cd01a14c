//! Device configuration
//!
//! Deployment-tunable parameters (button addresses, hold thresholds, pauses)
//! live in [`DeviceConfig`], persisted as compact `postcard` bytes. Sizes that
//! shape static buffers are compile-time constants.

extern crate alloc;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Number of intensity samples recorded over one run (1 px per sample on the plot)
pub const SAMPLE_COUNT: usize = 192;

/// Characters in a run name
pub const NAME_CAPACITY: usize = 8;

/// Digits of the MM:SS run duration
pub const DURATION_DIGITS: usize = 4;

/// Default I2C address of the confirm (green) button
pub const DEFAULT_CONFIRM_ADDRESS: u8 = 0x6F;

/// Default I2C address of the cancel (red) button
pub const DEFAULT_CANCEL_ADDRESS: u8 = 0x6E;

/// Press-duration band boundaries in milliseconds.
///
/// A hold longer than `click_ms` lights the LED dimly, longer than
/// `short_hold_ms` at mid brightness, and longer than `long_hold_ms` at full
/// brightness. Starting a run requires a hold of at least `long_hold_ms`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldThresholds {
    pub click_ms: u32,
    pub short_hold_ms: u32,
    pub long_hold_ms: u32,
}

impl Default for HoldThresholds {
    fn default() -> Self {
        Self {
            click_ms: 20,
            short_hold_ms: 1000,
            long_hold_ms: 2000,
        }
    }
}

/// Errors raised while loading or storing a [`DeviceConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config decode failed: {0}")]
    Decode(postcard::Error),
    #[error("Config encode failed: {0}")]
    Encode(postcard::Error),
    #[error("Invalid config: {reason}")]
    Invalid { reason: &'static str },
}

/// Runtime configuration for one instrument
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Bus address of the confirm (green) button
    pub confirm_address: u8,
    /// Bus address of the cancel (red) button
    pub cancel_address: u8,
    pub thresholds: HoldThresholds,
    /// Hold time per symbol step while scrolling a name character or digit
    pub scroll_step_ms: u32,
    /// Headroom added to the first reading of a run to fix the plot scale
    pub intensity_margin: f32,
    /// Show the 3-2-1 countdown before a run starts
    pub countdown: bool,
    /// How long the "connection re-established" notice stays up
    pub notice_ms: u32,
    /// LED warm-up period shown before the first session (0 skips it)
    pub warm_up_ms: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            confirm_address: DEFAULT_CONFIRM_ADDRESS,
            cancel_address: DEFAULT_CANCEL_ADDRESS,
            thresholds: HoldThresholds::default(),
            scroll_step_ms: 300,
            intensity_margin: 1000.0,
            countdown: true,
            notice_ms: 2000,
            warm_up_ms: 0,
        }
    }
}

impl DeviceConfig {
    /// Decode and validate a config previously written with [`to_bytes`](Self::to_bytes)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(ConfigError::Decode)?;
        config.validate()?;
        Ok(config)
    }

    /// Encode the config for storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(ConfigError::Encode)
    }

    /// Check the invariants the session controller relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if !(t.click_ms < t.short_hold_ms && t.short_hold_ms < t.long_hold_ms) {
            return Err(ConfigError::Invalid {
                reason: "hold thresholds must be strictly increasing",
            });
        }
        if self.scroll_step_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "scroll step must be non-zero",
            });
        }
        if self.confirm_address == self.cancel_address {
            return Err(ConfigError::Invalid {
                reason: "buttons need distinct bus addresses",
            });
        }
        if !self.intensity_margin.is_finite() || self.intensity_margin < 0.0 {
            return Err(ConfigError::Invalid {
                reason: "intensity margin must be finite and non-negative",
            });
        }
        Ok(())
    }
}
