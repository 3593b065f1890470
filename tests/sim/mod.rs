#![allow(dead_code)]

//! A simulated sensor and host. Every `SimEnv` is independent, so tests can
//! run in parallel.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use dht_sampler::{Clock, Dht, InterruptControl, PinMode, PinModeControl, SensorType};
use embedded_hal::{
    delay::DelayNs,
    digital::{self, ErrorKind, ErrorType, InputPin, OutputPin, PinState},
};

pub type SimDht = Dht<SimPin, SimInterrupts, SimDelay, SimClock>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    Injected,
}

impl digital::Error for SimError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// One answer from the sensor, as a list of line levels and how long each
/// lasts.
#[derive(Debug, Clone)]
pub struct Frame {
    bytes: Option<[u8; 5]>,
    bits: usize,
    low_us: u32,
    zero_us: u32,
    one_us: u32,
}

impl Frame {
    /// A frame carrying exactly these five bytes, checksum included
    pub fn from_bytes(bytes: [u8; 5]) -> Frame {
        Frame {
            bytes: Some(bytes),
            bits: 40,
            low_us: 50,
            zero_us: 26,
            one_us: 70,
        }
    }

    /// A frame with a correct checksum for these four data bytes
    pub fn from_data(data: [u8; 4]) -> Frame {
        let checksum = data.iter().fold(0u8, |a, b| a.wrapping_add(*b));
        Frame::from_bytes([data[0], data[1], data[2], data[3], checksum])
    }

    /// Encodes tenths of a degree and tenths of a percent the way a DHT21 or
    /// DHT22 does
    pub fn dht22(celsius: f32, humidity: f32) -> Frame {
        let humidity = (humidity * 10.0).round() as u16;
        let mut temperature = ((celsius.abs() * 10.0).round() as u16) & 0x7fff;
        if celsius < 0.0 {
            temperature |= 0x8000;
        }
        let [h0, h1] = humidity.to_be_bytes();
        let [t0, t1] = temperature.to_be_bytes();
        Frame::from_data([h0, h1, t0, t1])
    }

    /// Encodes whole degrees and whole percent the way a DHT11 does
    pub fn dht11(celsius: i8, humidity: u8) -> Frame {
        let sign = if celsius < 0 { 0x80 } else { 0x00 };
        Frame::from_data([humidity, 0, celsius.unsigned_abs(), sign])
    }

    /// No sensor on the line: it stays HIGH
    pub fn silent() -> Frame {
        Frame {
            bytes: None,
            ..Frame::from_bytes([0; 5])
        }
    }

    pub fn bytes(&self) -> Option<[u8; 5]> {
        self.bytes
    }

    pub fn corrupt_checksum(mut self) -> Frame {
        if let Some(bytes) = self.bytes.as_mut() {
            bytes[4] = bytes[4].wrapping_add(1);
        }
        self
    }

    /// The sensor goes quiet after sending `bits` bits
    pub fn truncated(mut self, bits: usize) -> Frame {
        self.bits = bits;
        self
    }

    pub fn with_pulse_widths(mut self, low_us: u32, zero_us: u32, one_us: u32) -> Frame {
        self.low_us = low_us;
        self.zero_us = zero_us;
        self.one_us = one_us;
        self
    }

    fn transitions(&self) -> Vec<(PinState, u32)> {
        let bytes = match self.bytes {
            Some(bytes) => bytes,
            None => return Vec::new(),
        };

        let mut transitions = vec![
            (PinState::High, 5),
            (PinState::Low, 80),
            (PinState::High, 80),
        ];
        for bit in 0..self.bits {
            let is_one = bytes[bit / 8] & (0x80 >> (bit % 8)) != 0;
            transitions.push((PinState::Low, self.low_us));
            transitions.push((PinState::High, if is_one { self.one_us } else { self.zero_us }));
        }
        if self.bits == 40 {
            transitions.push((PinState::Low, self.low_us));
        }
        transitions
    }
}

struct Replay {
    transitions: Vec<(PinState, u32)>,
    started_at: u32,
}

impl Replay {
    fn level_at(&self, now: u32) -> PinState {
        let elapsed = now.wrapping_sub(self.started_at);
        let mut end = 0u32;
        for (level, duration) in &self.transitions {
            end += duration;
            if elapsed < end {
                return *level;
            }
        }
        // Pull-up
        PinState::High
    }
}

struct SimState {
    millis: u32,
    micros: u32,
    remainder_us: u32,
    read_cost_us: u32,
    mode: PinMode,
    driven: PinState,
    frames: VecDeque<Frame>,
    replay: Option<Replay>,
    pin_ops: usize,
    start_signals: usize,
    requested: bool,
    fail_reads_after: Option<usize>,
    interrupts_enabled: bool,
    interrupt_disables: usize,
    interrupt_enables: usize,
    reads_with_interrupts: usize,
}

impl SimState {
    fn advance_us(&mut self, us: u32) {
        self.micros = self.micros.wrapping_add(us);
        self.remainder_us += us % 1000;
        self.millis = self
            .millis
            .wrapping_add(us / 1000 + self.remainder_us / 1000);
        self.remainder_us %= 1000;
    }

    fn advance_ms(&mut self, ms: u32) {
        self.millis = self.millis.wrapping_add(ms);
        self.micros = self.micros.wrapping_add(ms.wrapping_mul(1000));
    }

    fn level(&self) -> PinState {
        match self.mode {
            PinMode::Output => self.driven,
            PinMode::Input => self
                .replay
                .as_ref()
                .map_or(PinState::High, |replay| replay.level_at(self.micros)),
        }
    }

    fn read(&mut self) -> Result<PinState, SimError> {
        self.pin_ops += 1;
        if let Some(remaining) = self.fail_reads_after.as_mut() {
            if *remaining == 0 {
                return Err(SimError::Injected);
            }
            *remaining -= 1;
        }
        if self.interrupts_enabled && self.mode == PinMode::Input {
            self.reads_with_interrupts += 1;
        }
        let cost = self.read_cost_us;
        self.advance_us(cost);
        Ok(self.level())
    }

    fn write(&mut self, level: PinState) {
        self.pin_ops += 1;
        if self.mode == PinMode::Output && level == PinState::Low && self.driven == PinState::High {
            self.start_signals += 1;
            self.requested = true;
        }
        self.driven = level;
    }
}

/// The simulated host: a clock, a delay, an interrupt switch and one data
/// pin with a sensor attached. Frames queued with [`SimEnv::push_frame`] are
/// replayed, one per start signal, from the moment the pin becomes an input.
#[derive(Clone)]
pub struct SimEnv {
    state: Rc<RefCell<SimState>>,
}

impl SimEnv {
    pub fn new() -> SimEnv {
        SimEnv {
            state: Rc::new(RefCell::new(SimState {
                millis: 12_345,
                micros: 12_345_678,
                remainder_us: 678,
                read_cost_us: 1,
                mode: PinMode::Input,
                driven: PinState::High,
                frames: VecDeque::new(),
                replay: None,
                pin_ops: 0,
                start_signals: 0,
                requested: false,
                fail_reads_after: None,
                interrupts_enabled: true,
                interrupt_disables: 0,
                interrupt_enables: 0,
                reads_with_interrupts: 0,
            })),
        }
    }

    pub fn dht(&self, sensor_type: SensorType) -> SimDht {
        Dht::new(
            sensor_type,
            self.pin(),
            self.interrupts(),
            self.delay(),
            self.clock(),
        )
    }

    pub fn pin(&self) -> SimPin {
        SimPin { env: self.clone() }
    }

    pub fn interrupts(&self) -> SimInterrupts {
        SimInterrupts { env: self.clone() }
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay { env: self.clone() }
    }

    pub fn clock(&self) -> SimClock {
        SimClock { env: self.clone() }
    }

    pub fn push_frame(&self, frame: Frame) {
        self.state.borrow_mut().frames.push_back(frame);
    }

    /// Sets both counters; they run on independently from here and each
    /// wraps at `u32::MAX`
    pub fn set_time(&self, millis: u32, micros: u32) {
        let mut state = self.state.borrow_mut();
        state.millis = millis;
        state.micros = micros;
        state.remainder_us = 0;
    }

    pub fn advance_ms(&self, ms: u32) {
        self.state.borrow_mut().advance_ms(ms);
    }

    pub fn advance_us(&self, us: u32) {
        self.state.borrow_mut().advance_us(us);
    }

    pub fn now_millis(&self) -> u32 {
        self.state.borrow().millis
    }

    pub fn now_micros(&self) -> u32 {
        self.state.borrow().micros
    }

    /// Makes every pin read after the next `reads` ones fail
    pub fn fail_pin_reads_after(&self, reads: usize) {
        self.state.borrow_mut().fail_reads_after = Some(reads);
    }

    pub fn pin_ops(&self) -> usize {
        self.state.borrow().pin_ops
    }

    pub fn start_signals(&self) -> usize {
        self.state.borrow().start_signals
    }

    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    pub fn pin_mode(&self) -> PinMode {
        self.state.borrow().mode
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.state.borrow().interrupts_enabled
    }

    pub fn interrupt_disables(&self) -> usize {
        self.state.borrow().interrupt_disables
    }

    pub fn interrupt_enables(&self) -> usize {
        self.state.borrow().interrupt_enables
    }

    /// Pin reads taken as an input while interrupts were enabled
    pub fn reads_with_interrupts(&self) -> usize {
        self.state.borrow().reads_with_interrupts
    }
}

pub struct SimPin {
    env: SimEnv,
}

impl ErrorType for SimPin {
    type Error = SimError;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.env.state.borrow_mut().read()? == PinState::High)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.env.state.borrow_mut().read()? == PinState::Low)
    }
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.env.state.borrow_mut().write(PinState::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.env.state.borrow_mut().write(PinState::High);
        Ok(())
    }
}

impl PinModeControl for SimPin {
    fn set_mode(&mut self, mode: PinMode) -> Result<(), Self::Error> {
        let mut state = self.env.state.borrow_mut();
        state.pin_ops += 1;
        state.mode = mode;
        // The sensor only answers a start signal
        state.replay = match mode {
            PinMode::Input if state.requested => {
                state.requested = false;
                let started_at = state.micros;
                state.frames.pop_front().map(|frame| Replay {
                    transitions: frame.transitions(),
                    started_at,
                })
            }
            _ => None,
        };
        Ok(())
    }
}

pub struct SimInterrupts {
    env: SimEnv,
}

impl InterruptControl for SimInterrupts {
    fn enable_interrupts(&mut self) {
        let mut state = self.env.state.borrow_mut();
        state.interrupts_enabled = true;
        state.interrupt_enables += 1;
    }

    fn disable_interrupts(&mut self) {
        let mut state = self.env.state.borrow_mut();
        state.interrupts_enabled = false;
        state.interrupt_disables += 1;
    }
}

pub struct SimDelay {
    env: SimEnv,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.env.advance_us(ns.div_ceil(1000));
    }

    fn delay_us(&mut self, us: u32) {
        self.env.advance_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.env.advance_ms(ms);
    }
}

pub struct SimClock {
    env: SimEnv,
}

impl Clock for SimClock {
    fn now_millis(&self) -> u32 {
        self.env.now_millis()
    }

    fn now_micros(&self) -> u32 {
        self.env.now_micros()
    }
}

#[track_caller]
pub fn assert_close(left: f32, right: f32, delta: f32) {
    assert!(
        (left - right).abs() <= delta,
        "left = {}, right = {}, not within delta = {}",
        left,
        right,
        delta
    );
}
