//! What the driver needs from the host besides `embedded-hal` pins and delays.

use embedded_hal::digital::ErrorType;

/// Direction of the data pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// The sensor drives the line; the pull-up holds it HIGH when idle
    Input,
    /// The host drives the line
    Output,
}

/// A pin that can be switched between input and output at runtime.
///
/// `embedded-hal` has no trait for this, so the host implements it for its
/// pin type alongside `InputPin` and `OutputPin`.
pub trait PinModeControl: ErrorType {
    /// Switches the pin direction
    fn set_mode(&mut self, mode: PinMode) -> Result<(), Self::Error>;
}

/// Trait that allows us to disable interrupts when reading from the sensor
pub trait InterruptControl {
    fn enable_interrupts(&mut self);
    fn disable_interrupts(&mut self);
}

/// A dummy implementation of InterruptControl that does nothing
pub struct NoopInterruptControl;

impl InterruptControl for NoopInterruptControl {
    fn enable_interrupts(&mut self) {}
    fn disable_interrupts(&mut self) {}
}

/// Free-running millisecond and microsecond counters.
///
/// Both counters may wrap at any point, including in the middle of a read.
/// The driver only ever subtracts two readings with wrapping arithmetic, so
/// any width up to 32 bits works as long as it is zero-extended.
pub trait Clock {
    /// Milliseconds since some fixed point
    fn now_millis(&self) -> u32;
    /// Microseconds since some fixed point
    fn now_micros(&self) -> u32;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_millis(&self) -> u32 {
        T::now_millis(self)
    }

    fn now_micros(&self) -> u32 {
        T::now_micros(self)
    }
}

/// Time elapsed from `start` to `now` on a wrapping `u32` counter
#[inline]
pub fn elapsed_since(start: u32, now: u32) -> u32 {
    now.wrapping_sub(start)
}
