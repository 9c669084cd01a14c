//! Run session state machine
//!
//! A session cycles name entry → time entry → ready → running → ended and
//! back to name entry. Any peripheral fault drops the session into a matching
//! error state, which only clears once the peripheral answers again; recovery
//! always restarts from a clean name entry.

mod controller;
pub mod entry;

pub use controller::{Devices, SessionController};

use core::fmt;

use thiserror_no_std::Error;

/// Current step of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    EnterName,
    EnterTime,
    TestReady,
    TestInProgress,
    TestEnded,
    ErrorLogger,
    ErrorSensor,
    ErrorButton,
    NameOverwriteConfirm,
}

impl SessionState {
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            Self::ErrorLogger | Self::ErrorSensor | Self::ErrorButton
        )
    }

    /// Short label for logs
    pub const fn label(self) -> &'static str {
        match self {
            Self::EnterName => "enter name",
            Self::EnterTime => "enter time",
            Self::TestReady => "test ready",
            Self::TestInProgress => "test in progress",
            Self::TestEnded => "test ended",
            Self::ErrorLogger => "logger error",
            Self::ErrorSensor => "sensor error",
            Self::ErrorButton => "button error",
            Self::NameOverwriteConfirm => "confirm overwrite",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hardware a fault can be attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peripheral {
    Sensor,
    ConfirmButton,
    CancelButton,
}

impl Peripheral {
    /// Name shown on screen
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sensor => "Light sensor",
            Self::ConfirmButton => "Green button",
            Self::CancelButton => "Red button",
        }
    }

    /// Error state this peripheral's disconnection leads to
    pub const fn error_state(self) -> SessionState {
        match self {
            Self::Sensor => SessionState::ErrorSensor,
            Self::ConfirmButton | Self::CancelButton => SessionState::ErrorButton,
        }
    }
}

impl fmt::Display for Peripheral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Faults surfaced by the session
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("{which} disconnected")]
    PeripheralDisconnected { which: Peripheral },
    #[error("Run log write failed")]
    LogWriteFailed,
    #[error("A run with this name already exists")]
    NameCollision,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_states() {
        assert!(SessionState::ErrorLogger.is_error());
        assert!(SessionState::ErrorSensor.is_error());
        assert!(SessionState::ErrorButton.is_error());
        assert!(!SessionState::NameOverwriteConfirm.is_error());
        assert!(!SessionState::TestInProgress.is_error());
    }

    #[test]
    fn test_peripheral_maps_to_error_state() {
        assert_eq!(Peripheral::Sensor.error_state(), SessionState::ErrorSensor);
        assert_eq!(
            Peripheral::ConfirmButton.error_state(),
            SessionState::ErrorButton
        );
        assert_eq!(
            Peripheral::CancelButton.error_state(),
            SessionState::ErrorButton
        );
    }

    #[test]
    fn test_error_messages_name_the_peripheral() {
        let error = SessionError::PeripheralDisconnected {
            which: Peripheral::Sensor,
        };
        assert_eq!(error.to_string(), "Light sensor disconnected");
    }
}
