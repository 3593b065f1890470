//! Reads a DHT sensor wired to a Linux GPIO character device.
//!
//! ```text
//! linux_read <chip> <line> <dht11|dht21|dht22>
//! ```

use std::{
    env, thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Context};
use dht_sampler::{Clock, Dht, NoopInterruptControl, PinMode, PinModeControl, SensorType};
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};
use gpio_cdev::{Chip, Line, LineHandle, LineRequestFlags};
use linux_embedded_hal::Delay;

const CONSUMER: &str = "dht-sampler";

#[derive(Debug)]
enum LinePinError {
    Gpio(gpio_cdev::Error),
    NotRequested,
}

impl digital::Error for LinePinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// A GPIO line that is re-requested whenever its direction changes
struct LinePin {
    line: Line,
    handle: Option<LineHandle>,
    mode: PinMode,
    level: u8,
}

impl LinePin {
    fn new(line: Line) -> Result<Self, LinePinError> {
        let mut pin = LinePin {
            line,
            handle: None,
            mode: PinMode::Input,
            level: 1,
        };
        pin.set_mode(PinMode::Input)?;
        Ok(pin)
    }

    fn handle(&self) -> Result<&LineHandle, LinePinError> {
        self.handle
            .as_ref()
            .ok_or(LinePinError::NotRequested)
    }

    fn write(&mut self, level: u8) -> Result<(), LinePinError> {
        self.level = level;
        if self.mode == PinMode::Output {
            self.handle()?.set_value(level).map_err(LinePinError::Gpio)?;
        }
        Ok(())
    }
}

impl ErrorType for LinePin {
    type Error = LinePinError;
}

impl PinModeControl for LinePin {
    fn set_mode(&mut self, mode: PinMode) -> Result<(), Self::Error> {
        // The kernel refuses a second request while the line is held
        self.handle = None;
        let flags = match mode {
            PinMode::Input => LineRequestFlags::INPUT,
            PinMode::Output => LineRequestFlags::OUTPUT,
        };
        let handle = self
            .line
            .request(flags, self.level, CONSUMER)
            .map_err(LinePinError::Gpio)?;
        self.handle = Some(handle);
        self.mode = mode;
        Ok(())
    }
}

impl InputPin for LinePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.handle()?.get_value().map_err(LinePinError::Gpio)? != 0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_high()?)
    }
}

impl OutputPin for LinePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(0)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(1)
    }
}

struct StdClock(Instant);

impl Clock for StdClock {
    // Truncation gives the same wrapping counters a microcontroller has
    fn now_millis(&self) -> u32 {
        self.0.elapsed().as_millis() as u32
    }

    fn now_micros(&self) -> u32 {
        self.0.elapsed().as_micros() as u32
    }
}

fn parse_sensor_type(name: &str) -> anyhow::Result<SensorType> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "dht11" => SensorType::Dht11,
        "dht21" | "am2301" => SensorType::Dht21,
        "dht22" | "am2302" => SensorType::Dht22,
        other => bail!("unknown sensor type '{}'", other),
    })
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        bail!("usage: {} <chip> <line> <dht11|dht21|dht22>", args[0]);
    }
    let offset: u32 = args[2].parse().context("line offset must be a number")?;
    let sensor_type = parse_sensor_type(&args[3])?;

    let mut chip = Chip::new(&args[1]).with_context(|| format!("opening {}", args[1]))?;
    let line = chip.get_line(offset)?;
    let pin = LinePin::new(line).map_err(|e| anyhow!("{:?}", e))?;

    let mut dht = Dht::new(
        sensor_type,
        pin,
        NoopInterruptControl,
        Delay,
        StdClock(Instant::now()),
    );
    dht.begin().map_err(|e| anyhow!("{}", e))?;

    loop {
        match dht.read() {
            Ok(reading) => println!(
                "{}: {:.1} °C ({:.1} °F), {:.1} % RH, feels like {:.1} °C",
                sensor_type,
                reading.temperature(),
                reading.temperature_fahrenheit(),
                reading.humidity(),
                reading.heat_index(),
            ),
            Err(e) => eprintln!("{}: {}", sensor_type, e),
        }
        thread::sleep(Duration::from_millis(sensor_type.min_sample_interval_ms().into()));
    }
}
