//! Light sensor abstraction
//!
//! The instrument only needs an illuminance value and a way to tell whether
//! the sensor is still on the bus. Calibration is left to the driver.

/// A polled illuminance sensor
pub trait LightSensor {
    type Error: core::fmt::Debug;

    /// Whether the sensor currently responds
    fn is_connected(&mut self) -> bool;

    /// Current illuminance in lux
    fn read_lux(&mut self) -> Result<f32, Self::Error>;
}

impl<S: LightSensor + ?Sized> LightSensor for &mut S {
    type Error = S::Error;

    fn is_connected(&mut self) -> bool {
        (**self).is_connected()
    }

    fn read_lux(&mut self) -> Result<f32, Self::Error> {
        (**self).read_lux()
    }
}
