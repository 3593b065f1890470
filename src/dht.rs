use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin, PinState},
};

use crate::{
    config::Timings,
    platform::{elapsed_since, Clock, InterruptControl, PinMode, PinModeControl},
    sensor_type::{RawSample, SensorType, FRAME_BITS},
    DhtError, Reading,
};

/// One DHT sensor on one data pin.
///
/// The driver owns the pin and remembers the last frame it read. The sensor
/// cannot produce a new sample faster than
/// [`SensorType::min_sample_interval_ms`]; calls that come in sooner are
/// answered from the cached frame without touching the pin.
///
/// The `read_*` methods start a cycle if one is due and return `NaN` if no
/// valid sample is available. The methods without the `read_` prefix only
/// look at the cached frame.
pub struct Dht<P, I, D, C> {
    sensor_type: SensorType,
    timings: Timings,
    pin: P,
    interrupts: I,
    delay: D,
    clock: C,
    raw: RawSample,
    last_read_ms: u32,
    first_reading: bool,
    valid: bool,
}

impl<P, I, D, C> Dht<P, I, D, C>
where
    P: InputPin + OutputPin + PinModeControl,
    I: InterruptControl,
    D: DelayNs,
    C: Clock,
{
    /// Creates a driver with the default [`Timings`]
    pub fn new(sensor_type: SensorType, pin: P, interrupts: I, delay: D, clock: C) -> Self {
        Self::with_timings(sensor_type, pin, interrupts, delay, clock, Timings::default())
    }

    pub fn with_timings(
        sensor_type: SensorType,
        pin: P,
        interrupts: I,
        delay: D,
        clock: C,
        timings: Timings,
    ) -> Self {
        Self {
            sensor_type,
            timings,
            pin,
            interrupts,
            delay,
            clock,
            raw: RawSample::default(),
            last_read_ms: 0,
            first_reading: true,
            valid: false,
        }
    }

    /// Puts the data line into its idle state: input, pulled HIGH.
    ///
    /// Call this once, as early as possible after power-up, so the sensor
    /// has time to settle before the first read.
    pub fn begin(&mut self) -> Result<(), DhtError<P::Error>> {
        self.pin.set_mode(PinMode::Input)?;
        self.pin.set_high()?;
        self.last_read_ms = self.clock.now_millis();
        Ok(())
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn min_sample_interval_ms(&self) -> u32 {
        self.sensor_type.min_sample_interval_ms()
    }

    /// Returns `true` if the cached frame passed its checksum
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The frame read by the last cycle, valid or not
    pub fn raw_sample(&self) -> &RawSample {
        &self.raw
    }

    /// Gives back the peripherals
    pub fn release(self) -> (P, I, D, C) {
        (self.pin, self.interrupts, self.delay, self.clock)
    }

    /// Reads a new frame from the sensor, unless the last cycle was less than
    /// the minimum sample interval ago.
    ///
    /// When the call is throttled, the cached frame is kept and the result
    /// says whether it is valid: `Ok(())` if so, [`DhtError::NoValidReading`]
    /// otherwise.
    pub fn read_sensor_data(&mut self) -> Result<(), DhtError<P::Error>> {
        let now = self.clock.now_millis();
        if !self.first_reading
            && elapsed_since(self.last_read_ms, now) < self.min_sample_interval_ms()
        {
            debug!(
                "{}: {} ms since last cycle, using cached frame",
                self.sensor_type,
                elapsed_since(self.last_read_ms, now)
            );
            return if self.valid {
                Ok(())
            } else {
                Err(DhtError::NoValidReading)
            };
        }
        let first_reading = core::mem::replace(&mut self.first_reading, false);

        trace!("{}: starting read cycle at {} ms", self.sensor_type, now);
        self.last_read_ms = now;
        self.raw.clear();
        self.valid = false;
        self.request(first_reading)?;

        self.interrupts.disable_interrupts();
        let res = self.read_uninterruptible();
        self.interrupts.enable_interrupts();

        if let Err(err) = res {
            warn!("{}: read cycle aborted: {}", self.sensor_type, err);
            return Err(err);
        }

        self.valid = self.raw.is_checksum_valid();
        if self.valid {
            Ok(())
        } else {
            warn!("{}: checksum mismatch in {:?}", self.sensor_type, self.raw);
            Err(DhtError::ChecksumMismatch(
                self.raw.checksum(),
                self.raw.calculated_checksum(),
            ))
        }
    }

    /// Reads from the sensor if a cycle is due and returns the cached sample
    pub fn read(&mut self) -> Result<Reading, DhtError<P::Error>> {
        self.read_sensor_data()?;
        self.reading().ok_or(DhtError::NoValidReading)
    }

    /// The cached sample, if the last cycle produced a valid one
    pub fn reading(&self) -> Option<Reading> {
        if !self.valid {
            return None;
        }
        Some(Reading::new(
            self.sensor_type.decode_humidity(&self.raw),
            self.sensor_type.decode_temperature(&self.raw),
        ))
    }

    /// Cached temperature in degrees Celsius, or `NaN`.
    ///
    /// Accurate to ±2 °C on a DHT11, ±1 °C on a DHT21, ±0.2 °C on a DHT22.
    pub fn temperature_celsius(&self) -> f32 {
        self.reading().map_or(f32::NAN, |r| r.temperature())
    }

    /// Cached temperature in degrees Fahrenheit, or `NaN`.
    ///
    /// Accurate to ±3.6 °F on a DHT11, ±1.8 °F on a DHT21, ±0.36 °F on a DHT22.
    pub fn temperature_fahrenheit(&self) -> f32 {
        self.reading().map_or(f32::NAN, |r| r.temperature_fahrenheit())
    }

    /// Cached relative humidity in percent, or `NaN`.
    ///
    /// Accurate to ±5 % on a DHT11, ±3-5 % on a DHT21, ±2-5 % on a DHT22.
    pub fn percent_humidity(&self) -> f32 {
        self.reading().map_or(f32::NAN, |r| r.humidity())
    }

    /// Heat index of the cached sample in degrees Celsius, or `NaN`
    pub fn heat_index_celsius(&self) -> f32 {
        self.reading().map_or(f32::NAN, |r| r.heat_index())
    }

    /// Heat index of the cached sample in degrees Fahrenheit, or `NaN`
    pub fn heat_index_fahrenheit(&self) -> f32 {
        self.reading().map_or(f32::NAN, |r| r.heat_index_fahrenheit())
    }

    pub fn read_temperature_celsius(&mut self) -> f32 {
        self.read().map_or(f32::NAN, |r| r.temperature())
    }

    pub fn read_temperature_fahrenheit(&mut self) -> f32 {
        self.read().map_or(f32::NAN, |r| r.temperature_fahrenheit())
    }

    pub fn read_percent_humidity(&mut self) -> f32 {
        self.read().map_or(f32::NAN, |r| r.humidity())
    }

    pub fn read_heat_index_celsius(&mut self) -> f32 {
        self.read().map_or(f32::NAN, |r| r.heat_index())
    }

    pub fn read_heat_index_fahrenheit(&mut self) -> f32 {
        self.read().map_or(f32::NAN, |r| r.heat_index_fahrenheit())
    }

    fn request(&mut self, first_reading: bool) -> Result<(), DhtError<P::Error>> {
        // Let the line float HIGH so the sensor settles
        self.pin.set_mode(PinMode::Output)?;
        self.pin.set_high()?;
        self.delay
            .delay_ms(self.timings.wakeup_delay_ms(first_reading));

        // Start signal
        self.pin.set_low()?;
        self.delay.delay_ms(self.timings.start_signal_ms);
        Ok(())
    }

    fn read_uninterruptible(&mut self) -> Result<(), DhtError<P::Error>> {
        self.pin.set_high()?;
        self.delay.delay_us(self.timings.release_us);
        self.pin.set_mode(PinMode::Input)?;

        // The sensor takes the line, then answers with ~80us LOW and ~80us HIGH
        self.time_level(PinState::High, DhtError::NotPresent)?;
        self.time_level(PinState::Low, DhtError::NotPresent)?;
        self.time_level(PinState::High, DhtError::NotPresent)?;

        // Each bit is ~50us LOW followed by ~26us HIGH for a 0 or ~70us for a 1
        for bit in 0..FRAME_BITS {
            self.time_level(PinState::Low, DhtError::Timeout)?;
            let high_us = self.time_level(PinState::High, DhtError::Timeout)?;
            if self.timings.is_one_bit(high_us) {
                self.raw.set_bit(bit);
            }
        }
        Ok(())
    }

    /// Polls the pin while it stays at `level` and returns how long that took,
    /// in microseconds
    fn time_level(
        &mut self,
        level: PinState,
        on_timeout: DhtError<P::Error>,
    ) -> Result<u32, DhtError<P::Error>> {
        let start = self.clock.now_micros();
        loop {
            let at_level = match level {
                PinState::High => self.pin.is_high(),
                PinState::Low => self.pin.is_low(),
            }?;
            let elapsed = elapsed_since(start, self.clock.now_micros());

            if !at_level {
                return Ok(elapsed);
            }
            if elapsed > self.timings.timeout_us {
                return Err(on_timeout);
            }
            self.delay.delay_us(1);
        }
    }
}
