/// Protocol timings used by a read cycle.
///
/// The defaults match what DHT11, DHT21 and DHT22 parts expect. Slow hosts
/// with a coarse microsecond clock may need a larger `timeout_us`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// How long the line is held HIGH before the very first start signal
    pub first_wakeup_delay_ms: u32,
    /// How long the line is held HIGH before every later start signal
    pub wakeup_delay_ms: u32,
    /// Length of the LOW start signal
    pub start_signal_ms: u32,
    /// How long the line is driven HIGH after the start signal, before the
    /// pin becomes an input
    pub release_us: u32,
    /// Longest time any single level may last before the cycle is aborted
    pub timeout_us: u32,
    /// HIGH pulses at least this long are `1` bits; shorter ones are `0` bits
    pub one_bit_threshold_us: u32,
}

/// The timings used by [`Timings::default`]
pub const DEFAULT_TIMINGS: Timings = Timings {
    first_wakeup_delay_ms: 250,
    wakeup_delay_ms: 10,
    start_signal_ms: 20,
    release_us: 40,
    // Sensor levels last at most ~80us; 200us leaves room for clocks that
    // tick in 4us or 8us steps.
    timeout_us: 200,
    // Midway between the ~26us of a `0` and the ~70us of a `1`
    one_bit_threshold_us: 50,
};

impl Default for Timings {
    fn default() -> Self {
        DEFAULT_TIMINGS
    }
}

impl Timings {
    /// Returns the warm-up delay for a cycle
    pub(crate) fn wakeup_delay_ms(&self, first_reading: bool) -> u32 {
        if first_reading {
            self.first_wakeup_delay_ms
        } else {
            self.wakeup_delay_ms
        }
    }

    /// Classifies a measured HIGH pulse
    pub(crate) fn is_one_bit(&self, high_us: u32) -> bool {
        high_us >= self.one_bit_threshold_us
    }
}
