//! Physical button input
//!
//! Buttons are polled, not interrupt driven. Each physical button sits behind
//! an [`InputPeripheral`] (a bus-addressed device that reports connection and
//! pressed state and owns an LED). A [`ButtonMonitor`] wraps one peripheral
//! and turns raw polling into [`PressClassification`]s.

mod monitor;
mod qwiic;

pub use monitor::{ButtonMonitor, ButtonState};
pub use qwiic::{QWIIC_BUTTON_DEVICE_ID, QwiicButton};

use crate::config::HoldThresholds;

/// LED brightness for a hold shorter than the click threshold
pub const LED_OFF: u8 = 0;
/// LED brightness once a hold passes the click threshold
pub const LED_LOW: u8 = 10;
/// LED brightness once a hold passes the short-hold threshold
pub const LED_MID: u8 = 100;
/// LED brightness once a hold passes the long-hold threshold
pub const LED_MAX: u8 = 250;

/// A polled digital button with an LED, addressed by a fixed bus identifier.
pub trait InputPeripheral {
    type Error: core::fmt::Debug;

    /// Bus address this peripheral answers on
    fn address(&self) -> u8;

    /// Whether the device currently responds on the bus
    fn is_connected(&mut self) -> bool;

    /// Raw pressed/released state
    fn is_pressed(&mut self) -> Result<bool, Self::Error>;

    /// Set a steady LED intensity (0 = off)
    fn set_led(&mut self, intensity: u8) -> Result<(), Self::Error>;
}

/// Outcome of one poll of a [`ButtonMonitor`].
///
/// Durations are milliseconds since the press started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressClassification {
    /// Not pressed now and not pressed last tick
    NoChange,
    /// Pressed and still held
    StillHeld(u32),
    /// Released since the previous tick
    Released(u32),
    /// The peripheral did not answer
    Disconnected,
}

impl PressClassification {
    /// Hold duration carried by a `StillHeld` or `Released` event
    pub const fn duration_ms(self) -> Option<u32> {
        match self {
            Self::StillHeld(ms) | Self::Released(ms) => Some(ms),
            Self::NoChange | Self::Disconnected => None,
        }
    }
}

/// Press-duration band of a hold in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HoldBand {
    /// Below the click threshold
    Tap,
    Click,
    ShortHold,
    LongHold,
}

impl HoldBand {
    /// Classify a hold duration against the configured thresholds
    pub const fn classify(held_ms: u32, thresholds: &HoldThresholds) -> Self {
        if held_ms > thresholds.long_hold_ms {
            Self::LongHold
        } else if held_ms > thresholds.short_hold_ms {
            Self::ShortHold
        } else if held_ms > thresholds.click_ms {
            Self::Click
        } else {
            Self::Tap
        }
    }

    /// LED feedback intensity for this band
    pub const fn brightness(self) -> u8 {
        match self {
            Self::Tap => LED_OFF,
            Self::Click => LED_LOW,
            Self::ShortHold => LED_MID,
            Self::LongHold => LED_MAX,
        }
    }
}

/// LED intensity for a hold of `held_ms`
pub const fn brightness_for(held_ms: u32, thresholds: &HoldThresholds) -> u8 {
    HoldBand::classify(held_ms, thresholds).brightness()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brightness_is_zero_below_click() {
        let thresholds = HoldThresholds::default();
        for held in 0..=thresholds.click_ms {
            assert_eq!(brightness_for(held, &thresholds), LED_OFF);
        }
    }

    #[test]
    fn test_brightness_is_monotonic() {
        let thresholds = HoldThresholds::default();
        let mut previous = 0;
        for held in (0..5000).step_by(7) {
            let level = brightness_for(held, &thresholds);
            assert!(level >= previous, "brightness dropped at {} ms", held);
            previous = level;
        }
        assert_eq!(previous, LED_MAX);
    }

    #[test]
    fn test_band_boundaries_are_exclusive() {
        let thresholds = HoldThresholds::default();
        assert_eq!(HoldBand::classify(20, &thresholds), HoldBand::Tap);
        assert_eq!(HoldBand::classify(21, &thresholds), HoldBand::Click);
        assert_eq!(HoldBand::classify(1000, &thresholds), HoldBand::Click);
        assert_eq!(HoldBand::classify(1001, &thresholds), HoldBand::ShortHold);
        assert_eq!(HoldBand::classify(2001, &thresholds), HoldBand::LongHold);
    }

    #[test]
    fn test_duration_only_for_press_events() {
        assert_eq!(PressClassification::Released(40).duration_ms(), Some(40));
        assert_eq!(PressClassification::StillHeld(0).duration_ms(), Some(0));
        assert_eq!(PressClassification::NoChange.duration_ms(), None);
        assert_eq!(PressClassification::Disconnected.duration_ms(), None);
    }
}
