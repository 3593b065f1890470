#![doc = include_str!("../README.md")]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod conversions;
mod dht;
pub mod platform;
pub mod sensor_type;

pub use config::{Timings, DEFAULT_TIMINGS};
pub use dht::Dht;
pub use platform::{Clock, InterruptControl, NoopInterruptControl, PinMode, PinModeControl};
pub use sensor_type::{RawSample, SensorType};

/// A sensor reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    humidity: f32,
    temperature: f32,
}

impl Reading {
    pub(crate) fn new(humidity: f32, temperature: f32) -> Self {
        Self {
            humidity,
            temperature,
        }
    }

    /// Returns the relative humidity, as a percentage value from 0.0 to 100.0
    pub fn humidity(&self) -> f32 {
        self.humidity
    }

    /// Returns the ambient temperature, in degrees Celsius
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Returns the ambient temperature, in degrees Fahrenheit
    pub fn temperature_fahrenheit(&self) -> f32 {
        conversions::celsius_to_fahrenheit(self.temperature)
    }

    /// Returns the heat index, in degrees Celsius
    pub fn heat_index(&self) -> f32 {
        conversions::heat_index_celsius(self.temperature, self.humidity)
    }

    /// Returns the heat index, in degrees Fahrenheit
    pub fn heat_index_fahrenheit(&self) -> f32 {
        conversions::heat_index_fahrenheit(self.temperature_fahrenheit(), self.humidity)
    }
}

/// A type detailing various errors a read cycle can end with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DhtError<HE> {
    /// The sensor did not answer the start signal
    NotPresent,
    /// The checksum provided in the sensor data did not match the checksum of the data itself (received, calculated)
    ChecksumMismatch(u8, u8),
    /// A data bit did not arrive in time
    Timeout,
    /// The minimum sample interval has not passed yet and the previous cycle
    /// did not produce a valid sample
    NoValidReading,
    /// Received a low-level error from the HAL while reading or writing to pins
    PinError(HE),
}

impl<HE> From<HE> for DhtError<HE> {
    fn from(error: HE) -> Self {
        DhtError::PinError(error)
    }
}

impl<HE: core::fmt::Debug> core::fmt::Display for DhtError<HE> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use DhtError::*;
        match self {
            NotPresent => write!(f, "DHT device not found"),
            ChecksumMismatch(received, calculated) => write!(
                f,
                "Data read was corrupt (received checksum {:x}, calculated {:x})",
                received, calculated
            ),
            Timeout => f.write_str("Timed out waiting for a data bit"),
            NoValidReading => f.write_str("No valid reading yet; sensor is still cooling down"),
            PinError(err) => write!(f, "HAL pin error: {:?}", err),
        }
    }
}

#[cfg(feature = "std")]
impl<HE: core::fmt::Debug> std::error::Error for DhtError<HE> {}
