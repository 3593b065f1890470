//! Sensor variants and the layout of the 5-byte frame they send.

use core::fmt;

/// Number of bytes in one frame: four data bytes followed by a checksum
pub const FRAME_BYTES: usize = 5;

/// Number of bits in one frame
pub const FRAME_BITS: usize = FRAME_BYTES * 8;

/// The raw bytes of one frame, in the order the sensor sent them.
///
/// Byte 4 is the checksum: the low byte of the sum of bytes 0 through 3.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct RawSample([u8; FRAME_BYTES]);

impl RawSample {
    /// Wraps bytes received from a sensor
    pub const fn new(bytes: [u8; FRAME_BYTES]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes
    pub const fn bytes(&self) -> &[u8; FRAME_BYTES] {
        &self.0
    }

    /// Returns the checksum byte the sensor sent
    pub const fn checksum(&self) -> u8 {
        self.0[4]
    }

    /// Returns the checksum computed over the four data bytes
    pub fn calculated_checksum(&self) -> u8 {
        self.0[..4]
            .iter()
            .fold(0u8, |accum, next| accum.wrapping_add(*next))
    }

    /// Returns `true` if the received checksum matches the data bytes
    pub fn is_checksum_valid(&self) -> bool {
        self.checksum() == self.calculated_checksum()
    }

    pub(crate) fn clear(&mut self) {
        self.0 = [0; FRAME_BYTES];
    }

    /// Stores one received bit. Bits arrive most significant first, so bit 0
    /// is the top bit of byte 0 and bit 39 is the bottom bit of the checksum.
    pub(crate) fn set_bit(&mut self, index: usize) {
        let byte = index / 8;
        let shift = 7 - index % 8;
        self.0[byte] |= 1 << shift;
    }
}

impl fmt::Debug for RawSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RawSample([{:#04x}, {:#04x}, {:#04x}, {:#04x}, {:#04x}])",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4]
        )
    }
}

/// How one variant lays out its frame and how often it can be sampled
#[derive(Clone, Copy)]
pub struct Layout {
    /// Minimum time between two read cycles, in milliseconds
    pub min_sample_interval_ms: u32,
    /// Decodes the temperature in degrees Celsius
    pub decode_temperature: fn(&RawSample) -> f32,
    /// Decodes the relative humidity in percent
    pub decode_humidity: fn(&RawSample) -> f32,
}

/// The supported sensor variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorType {
    /// DHT11: whole degrees (±2 °C) and whole percent (±5 %), sampled at most
    /// once a second
    Dht11,
    /// DHT21 / AM2301: tenths (±1 °C, ±3-5 %), sampled at most every two
    /// seconds
    Dht21,
    /// DHT22 / AM2302: tenths (±0.2 °C, ±2-5 %), sampled at most every two
    /// seconds
    Dht22,
}

const DHT11_LAYOUT: Layout = Layout {
    min_sample_interval_ms: 1000,
    decode_temperature: decode_dht11_temperature,
    decode_humidity: decode_dht11_humidity,
};

const DHT2X_LAYOUT: Layout = Layout {
    min_sample_interval_ms: 2000,
    decode_temperature: decode_dht2x_temperature,
    decode_humidity: decode_dht2x_humidity,
};

impl SensorType {
    /// The AM2301 is sold under this name but speaks the DHT21 format
    pub const AM2301: SensorType = SensorType::Dht21;

    /// Returns the frame layout and sampling limit of this variant
    pub const fn layout(self) -> Layout {
        match self {
            SensorType::Dht11 => DHT11_LAYOUT,
            SensorType::Dht21 | SensorType::Dht22 => DHT2X_LAYOUT,
        }
    }

    /// Minimum time between two read cycles, in milliseconds
    pub const fn min_sample_interval_ms(self) -> u32 {
        self.layout().min_sample_interval_ms
    }

    /// Decodes the temperature in degrees Celsius from a frame
    pub fn decode_temperature(self, raw: &RawSample) -> f32 {
        (self.layout().decode_temperature)(raw)
    }

    /// Decodes the relative humidity in percent from a frame
    pub fn decode_humidity(self, raw: &RawSample) -> f32 {
        (self.layout().decode_humidity)(raw)
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorType::Dht11 => f.write_str("DHT11"),
            SensorType::Dht21 => f.write_str("DHT21"),
            SensorType::Dht22 => f.write_str("DHT22"),
        }
    }
}

// Whole degrees in byte 2. Newer DHT11 revisions flag sub-zero readings with
// the top bit of byte 3.
fn decode_dht11_temperature(raw: &RawSample) -> f32 {
    let bytes = raw.bytes();
    let temperature = bytes[2] as f32;
    if bytes[3] & 0x80 != 0 {
        -temperature
    } else {
        temperature
    }
}

fn decode_dht11_humidity(raw: &RawSample) -> f32 {
    raw.bytes()[0] as f32
}

// Sign-magnitude tenths of a degree: bit 15 is the sign, bits 0-14 the value.
fn decode_dht2x_temperature(raw: &RawSample) -> f32 {
    let bytes = raw.bytes();
    let mut temperature = u16::from_be_bytes([bytes[2] & 0x7f, bytes[3]]) as f32;
    if bytes[2] & 0x80 != 0 {
        temperature = -temperature;
    }
    temperature / 10.0
}

fn decode_dht2x_humidity(raw: &RawSample) -> f32 {
    let bytes = raw.bytes();
    u16::from_be_bytes([bytes[0], bytes[1]]) as f32 / 10.0
}
