//! SparkFun Qwiic Button driver
//!
//! Register-level access over a blocking `embedded-hal` I2C bus. Only the
//! subset of the register map the instrument needs is covered: identity,
//! pressed status, debounce time and the LED pulse engine (driven as a steady
//! light).

use embedded_hal::i2c::I2c;
use log::debug;

use super::InputPeripheral;

/// Value of the ID register on a genuine Qwiic Button
pub const QWIIC_BUTTON_DEVICE_ID: u8 = 0x5D;

// ---------------------------------------------------------------------------
// Register map
// ---------------------------------------------------------------------------

const REG_ID: u8 = 0x00;
const REG_BUTTON_STATUS: u8 = 0x03;
const REG_BUTTON_DEBOUNCE_TIME: u8 = 0x05;
const REG_LED_BRIGHTNESS: u8 = 0x19;
const REG_LED_PULSE_GRANULARITY: u8 = 0x1A;
const REG_LED_PULSE_CYCLE_TIME: u8 = 0x1B;
const REG_LED_PULSE_OFF_TIME: u8 = 0x1D;

const STATUS_IS_PRESSED: u8 = 1 << 2;

/// One Qwiic Button at a fixed bus address
pub struct QwiicButton<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> QwiicButton<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Read the identity register
    pub fn device_id(&mut self) -> Result<u8, I::Error> {
        self.read_register(REG_ID)
    }

    /// Set the on-device debounce window
    pub fn set_debounce_time(&mut self, ms: u16) -> Result<(), I::Error> {
        debug!("Qwiic 0x{:02X}: debounce {} ms", self.address, ms);
        self.write_register_u16(REG_BUTTON_DEBOUNCE_TIME, ms)
    }

    /// Drive the LED pulse engine.
    ///
    /// A zero `cycle_ms` gives a steady light at `brightness`.
    pub fn set_led_pulse(
        &mut self,
        brightness: u8,
        cycle_ms: u16,
        off_ms: u16,
    ) -> Result<(), I::Error> {
        self.write_register(REG_LED_BRIGHTNESS, brightness)?;
        self.write_register(REG_LED_PULSE_GRANULARITY, 1)?;
        self.write_register_u16(REG_LED_PULSE_CYCLE_TIME, cycle_ms)?;
        self.write_register_u16(REG_LED_PULSE_OFF_TIME, off_ms)
    }

    /// Give the bus back
    pub fn release(self) -> I {
        self.i2c
    }

    fn read_register(&mut self, register: u8) -> Result<u8, I::Error> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(self.address, &[register], &mut buf)?;
        Ok(buf[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), I::Error> {
        self.i2c.write(self.address, &[register, value])
    }

    fn write_register_u16(&mut self, register: u8, value: u16) -> Result<(), I::Error> {
        let [lo, hi] = value.to_le_bytes();
        self.i2c.write(self.address, &[register, lo, hi])
    }
}

impl<I: I2c> InputPeripheral for QwiicButton<I> {
    type Error = I::Error;

    fn address(&self) -> u8 {
        self.address
    }

    fn is_connected(&mut self) -> bool {
        matches!(self.device_id(), Ok(QWIIC_BUTTON_DEVICE_ID))
    }

    fn is_pressed(&mut self) -> Result<bool, Self::Error> {
        let status = self.read_register(REG_BUTTON_STATUS)?;
        Ok(status & STATUS_IS_PRESSED != 0)
    }

    fn set_led(&mut self, intensity: u8) -> Result<(), Self::Error> {
        self.set_led_pulse(intensity, 0, 0)
    }
}
