//! Press-duration tracking for a single button

use log::warn;

use super::{InputPeripheral, LED_OFF, PressClassification, brightness_for};
use crate::config::HoldThresholds;

/// Tracking state of one button, mutated once per poll tick.
///
/// `press_started_ms` is only meaningful while `pressed` is set, or on the
/// tick that reports the release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    pub address: u8,
    pub connected: bool,
    pub pressed: bool,
    pub was_pressed: bool,
    pub press_started_ms: u64,
}

/// Converts raw press/release polling of one [`InputPeripheral`] into
/// [`PressClassification`]s, driving the button LED as hold feedback.
pub struct ButtonMonitor<P> {
    peripheral: P,
    thresholds: HoldThresholds,
    state: ButtonState,
}

impl<P: InputPeripheral> ButtonMonitor<P> {
    pub fn new(peripheral: P, thresholds: HoldThresholds) -> Self {
        let state = ButtonState {
            address: peripheral.address(),
            connected: true,
            pressed: false,
            was_pressed: false,
            press_started_ms: 0,
        };

        Self {
            peripheral,
            thresholds,
            state,
        }
    }

    /// Poll the peripheral once at time `now_ms`.
    ///
    /// A disconnected peripheral leaves the press tracking untouched. While
    /// held, the LED brightness command is re-sent every tick.
    pub fn poll(&mut self, now_ms: u64) -> PressClassification {
        if !self.peripheral.is_connected() {
            self.state.connected = false;
            return PressClassification::Disconnected;
        }
        self.state.connected = true;

        let pressed = match self.peripheral.is_pressed() {
            Ok(pressed) => pressed,
            Err(e) => {
                warn!(
                    "Button 0x{:02X} status read failed: {:?}",
                    self.state.address, e
                );
                self.state.connected = false;
                return PressClassification::Disconnected;
            }
        };

        self.state.was_pressed = self.state.pressed;
        self.state.pressed = pressed;

        match (pressed, self.state.was_pressed) {
            (true, false) => {
                self.state.press_started_ms = now_ms;
                self.drive_led(brightness_for(0, &self.thresholds));
                PressClassification::StillHeld(0)
            }
            (true, true) => {
                let held = self.held_ms(now_ms);
                self.drive_led(brightness_for(held, &self.thresholds));
                PressClassification::StillHeld(held)
            }
            (false, true) => {
                let held = self.held_ms(now_ms);
                self.drive_led(LED_OFF);
                PressClassification::Released(held)
            }
            (false, false) => {
                self.drive_led(LED_OFF);
                PressClassification::NoChange
            }
        }
    }

    pub fn state(&self) -> &ButtonState {
        &self.state
    }

    fn held_ms(&self, now_ms: u64) -> u32 {
        let held = now_ms.saturating_sub(self.state.press_started_ms);
        u32::try_from(held).unwrap_or(u32::MAX)
    }

    fn drive_led(&mut self, intensity: u8) {
        // Re-sent next tick if it fails
        if let Err(e) = self.peripheral.set_led(intensity) {
            warn!(
                "Button 0x{:02X} LED command failed: {:?}",
                self.state.address, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{LED_LOW, LED_MAX, LED_MID};
    use crate::testing::FakeButton;

    fn monitor() -> (ButtonMonitor<FakeButton>, FakeButton) {
        let button = FakeButton::new(0x6F);
        (
            ButtonMonitor::new(button.clone(), HoldThresholds::default()),
            button,
        )
    }

    #[test]
    fn test_idle_polls_report_no_change_and_keep_led_off() {
        let (mut monitor, button) = monitor();
        for t in 0..5 {
            assert_eq!(monitor.poll(t * 10), PressClassification::NoChange);
        }
        assert_eq!(button.led(), LED_OFF);
        assert!(!monitor.state().pressed);
    }

    #[test]
    fn test_press_hold_release_sequence() {
        let (mut monitor, button) = monitor();

        button.set_pressed(true);
        assert_eq!(monitor.poll(1000), PressClassification::StillHeld(0));
        assert_eq!(monitor.state().press_started_ms, 1000);

        assert_eq!(monitor.poll(1500), PressClassification::StillHeld(500));
        assert_eq!(button.led(), LED_LOW);

        assert_eq!(monitor.poll(2200), PressClassification::StillHeld(1200));
        assert_eq!(button.led(), LED_MID);

        assert_eq!(monitor.poll(3500), PressClassification::StillHeld(2500));
        assert_eq!(button.led(), LED_MAX);

        button.set_pressed(false);
        assert_eq!(monitor.poll(3600), PressClassification::Released(2600));
        assert_eq!(button.led(), LED_OFF);

        assert_eq!(monitor.poll(3700), PressClassification::NoChange);
    }

    #[test]
    fn test_led_command_repeats_every_held_tick() {
        let (mut monitor, button) = monitor();
        button.set_pressed(true);
        monitor.poll(0);
        let before = button.led_writes();
        monitor.poll(1500);
        monitor.poll(1510);
        monitor.poll(1520);
        assert_eq!(button.led_writes() - before, 3);
        assert_eq!(button.led(), LED_MID);
    }

    #[test]
    fn test_release_duration_never_negative() {
        let (mut monitor, button) = monitor();
        button.set_pressed(true);
        monitor.poll(500);
        button.set_pressed(false);
        // Clock reported an earlier instant than the press start
        assert_eq!(monitor.poll(400), PressClassification::Released(0));
    }

    #[test]
    fn test_disconnect_preserves_press_tracking() {
        let (mut monitor, button) = monitor();
        button.set_pressed(true);
        monitor.poll(100);

        button.set_connected(false);
        assert_eq!(monitor.poll(200), PressClassification::Disconnected);
        assert!(monitor.state().pressed);
        assert!(!monitor.state().connected);
        assert_eq!(monitor.state().press_started_ms, 100);

        button.set_connected(true);
        assert_eq!(monitor.poll(400), PressClassification::StillHeld(300));
    }

    #[test]
    fn test_failed_status_read_reports_disconnected() {
        let (mut monitor, button) = monitor();
        button.fail_reads(true);
        assert_eq!(monitor.poll(0), PressClassification::Disconnected);
        assert!(!monitor.state().connected);
    }
}
