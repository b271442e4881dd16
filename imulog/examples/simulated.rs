//! Runs the controller on a desktop: a synthetic IMU, a timed button, and the
//! serial link carried over TCP.
//!
//! ```text
//! cargo run -p imulog --example simulated [config.json]
//! nc 127.0.0.1 7878      # then type `issetup`, `sendfiles`, ...
//! ```
//!
//! Once a host connects the single button is pressed at 1s (arm), 2s
//! (calibrate) and 12s (stop), leaving one ten second session to fetch.

use std::io::{self, Read as _, Write as _};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_io::ErrorKind;
use imulog::{Bias, ButtonLayout, Controller, DeviceConfig, Peripherals, SampleSource, Unconnected};
use imulog_common::{CalibrationRecord, Sample};
use log::info;

const ADDR: &str = "127.0.0.1:7878";
const PRESSES_MS: [u64; 3] = [1_000, 2_000, 12_000];
const PRESS_LEN_MS: u64 = 100;

/// Spins slowly about z under a constant 1 g.
struct SimulatedImu {
    started: Instant,
    calibration: CalibrationRecord,
}

impl SampleSource for SimulatedImu {
    type Error = Infallible;

    fn read_sample(&mut self) -> Result<Sample, Infallible> {
        let angle = self.started.elapsed().as_secs_f32() * 0.5;
        let raw = [angle.cos() * 0.4, angle.sin() * 0.4, -0.3];
        let CalibrationRecord { offset, scale } = self.calibration;
        let mag = [0usize, 1, 2].map(|i| (raw[i] - offset[i]) * scale[i]);
        Ok(Sample::new([0.0, 0.0, 0.5], [0.0, 0.0, 1.0], mag))
    }

    fn calibrate(&mut self) -> Result<Bias, Infallible> {
        thread::sleep(Duration::from_millis(200));
        Ok(Bias::default())
    }

    fn calibrate_magnetometer(&mut self) -> Result<CalibrationRecord, Infallible> {
        thread::sleep(Duration::from_secs(1));
        Ok(CalibrationRecord::new([0.02, -0.01, 0.0], [1.1, 0.95, 1.0]))
    }

    fn apply_calibration(&mut self, record: &CalibrationRecord) -> Result<(), Infallible> {
        self.calibration = *record;
        Ok(())
    }
}

struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns as u64));
    }
}

/// High for a moment at each of `PRESSES_MS`.
struct TimedPress {
    started: Instant,
}

impl ErrorType for TimedPress {
    type Error = Infallible;
}

impl InputPin for TimedPress {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        let now = self.started.elapsed().as_millis() as u64;
        Ok(PRESSES_MS
            .iter()
            .any(|&at| (at..at + PRESS_LEN_MS).contains(&now)))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

struct LogLed(&'static str);

impl ErrorType for LogLed {
    type Error = Infallible;
}

impl OutputPin for LogLed {
    fn set_low(&mut self) -> Result<(), Infallible> {
        info!("{} off", self.0);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        info!("{} on", self.0);
        Ok(())
    }
}

/// Non-blocking TCP stream standing in for the serial port.
struct TcpSerial(TcpStream);

impl TcpSerial {
    fn new(stream: TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self(stream))
    }
}

impl embedded_io::ErrorType for TcpSerial {
    type Error = ErrorKind;
}

impl embedded_io::ReadReady for TcpSerial {
    fn read_ready(&mut self) -> Result<bool, ErrorKind> {
        match self.0.peek(&mut [0u8; 1]) {
            Ok(n) => Ok(n > 0),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(_) => Err(ErrorKind::Other),
        }
    }
}

impl embedded_io::Read for TcpSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ErrorKind> {
        match self.0.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(_) => Err(ErrorKind::Other),
        }
    }
}

impl embedded_io::Write for TcpSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
        loop {
            match self.0.write(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(1))
                }
                Err(_) => return Err(ErrorKind::Other),
            }
        }
    }

    fn flush(&mut self) -> Result<(), ErrorKind> {
        self.0.flush().map_err(|_| ErrorKind::Other)
    }
}

fn main() -> imulog::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = match std::env::args().nth(1) {
        Some(path) => DeviceConfig::load(Path::new(&path))?,
        None => DeviceConfig::default(),
    };
    // no calibrate button on this board
    config.button_layout = ButtonLayout::SingleButton;

    let listener = TcpListener::bind(ADDR)?;
    info!("Waiting for a host on {}", ADDR);
    let (stream, peer) = listener.accept()?;
    info!("Host connected from {}", peer);

    let started = Instant::now();
    let source = SimulatedImu {
        started,
        calibration: config.default_calibration(),
    };
    let io = Peripherals {
        start_stop: TimedPress { started },
        calibrate: Unconnected,
        status_led: LogLed("status"),
        heartbeat_led: Unconnected,
        serial: TcpSerial::new(stream)?,
        delay: StdDelay,
    };

    let mut controller = Controller::new(&config, source, io)?;
    controller.run()
}
