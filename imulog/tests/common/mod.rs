
use std::path::Path;

use imulog::{Controller, DeviceConfig, Peripherals, State};
use imulog_common::Sample;

pub use mock_board::{Delay, MockButton, MockDelay, MockLed, MockSerial, MockSource};

pub type TestController<'a> =
    Controller<'a, MockSource, MockButton, MockButton, MockLed, MockLed, MockSerial, MockDelay>;

/// Still device, unit field along the magnetometer x axis.
pub const MAG_X: Sample = Sample {
    gyro: [0.0; 3],
    accel: [0.0; 3],
    mag: [1.0, 0.0, 0.0],
};

/// Test-side handles onto everything the controller is given.
pub struct Board {
    pub start_stop: MockButton,
    pub calibrate: MockButton,
    pub status_led: MockLed,
    pub heartbeat_led: MockLed,
    pub serial: MockSerial,
    pub delay: MockDelay,
    pub source: MockSource,
}

impl Board {
    pub fn new(raw: Sample) -> Self {
        Self {
            start_stop: MockButton::default(),
            calibrate: MockButton::default(),
            status_led: MockLed::default(),
            heartbeat_led: MockLed::default(),
            serial: MockSerial::default(),
            delay: MockDelay::default(),
            source: MockSource::new(raw),
        }
    }

    pub fn peripherals(&self) -> Peripherals<MockButton, MockButton, MockLed, MockLed, MockSerial, MockDelay> {
        Peripherals {
            start_stop: self.start_stop.clone(),
            calibrate: self.calibrate.clone(),
            status_led: self.status_led.clone(),
            heartbeat_led: self.heartbeat_led.clone(),
            serial: self.serial.clone(),
            delay: self.delay.clone(),
        }
    }

    pub fn controller<'a>(&self, config: &'a DeviceConfig) -> TestController<'a> {
        Controller::new(config, self.source.clone(), self.peripherals()).unwrap()
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Default configuration with both files placed under `dir`.
pub fn test_config(dir: &Path) -> DeviceConfig {
    DeviceConfig {
        session_dir: dir.join("sessions"),
        calibration_path: dir.join("calib.txt"),
        ..DeviceConfig::default()
    }
}

pub fn run_steps(controller: &mut TestController<'_>, steps: usize) -> Vec<State> {
    (0..steps).map(|_| controller.step().unwrap()).collect()
}

/// Script a two-button session of `samples` records and step through it:
/// arm, calibrate, record, stop.
pub fn record_session(controller: &mut TestController<'_>, board: &Board, samples: usize) -> Vec<State> {
    board.start_stop.script([true]);
    board.start_stop.script(std::iter::repeat(false).take(samples));
    board.start_stop.script([true]);
    board.calibrate.script([true]);

    run_steps(controller, samples + 4)
}

/// Send one command line and run the step that serves it.
pub fn command(controller: &mut TestController<'_>, board: &Board, line: &str) -> Vec<u8> {
    board.serial.send(line);
    controller.step().unwrap();
    board.serial.take_output()
}
