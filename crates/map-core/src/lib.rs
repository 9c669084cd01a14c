//! Hardware-independent core library for the magnetophotometer (MAP)
//!
//! This crate contains all platform-agnostic logic for the MAP instrument:
//! button press classification, the run session state machine, live sample
//! collection with trend geometry, and screen rendering against a small
//! [`Canvas`](ui::Canvas) abstraction.
//!
//! It is `no_std` with `extern crate alloc` so it compiles on both embedded
//! targets and desktop hosts (for the simulator and tests). Tests run with
//! `std` enabled so the standard harness and fakes are available.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod input;
pub mod sampling;
pub mod sensors;
pub mod session;
pub mod storage;
pub mod time;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

pub use config::DeviceConfig;
pub use session::{Devices, SessionController, SessionError, SessionState};
