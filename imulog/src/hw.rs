//! Seams to the board: the sensor stack, two buttons, two indicators, the
//! serial link and a blocking delay.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};
use imulog_common::{CalibrationRecord, Sample, Triple};
use log::warn;

/// Accelerometer/gyroscope bias gathered right before a recording. Kept in
/// memory only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bias {
    pub gyro: Triple,
    pub accel: Triple,
}

/// The 9-axis sensor stack.
pub trait SampleSource {
    type Error: core::fmt::Debug;

    /// One reading, with the magnetometer corrected by the calibration last
    /// passed to [`SampleSource::apply_calibration`].
    fn read_sample(&mut self) -> Result<Sample, Self::Error>;

    /// Blocks while gathering readings at rest, returns the bias it removed.
    fn calibrate(&mut self) -> Result<Bias, Self::Error>;

    /// Blocks while the operator rotates the device.
    fn calibrate_magnetometer(&mut self) -> Result<CalibrationRecord, Self::Error>;

    /// Rebuild the magnetometer driver around `record`.
    fn apply_calibration(&mut self, record: &CalibrationRecord) -> Result<(), Self::Error>;
}

pub struct Peripherals<START, CALIB, STATUS, HEARTBEAT, SERIAL, DELAY> {
    pub start_stop: START,
    pub calibrate: CALIB,
    pub status_led: STATUS,
    pub heartbeat_led: HEARTBEAT,
    pub serial: SERIAL,
    pub delay: DELAY,
}

/// Stand-in for a button or indicator the board does not have. Reads as
/// released, ignores writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconnected;

impl ErrorType for Unconnected {
    type Error = Infallible;
}

impl InputPin for Unconnected {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

impl OutputPin for Unconnected {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl StatefulOutputPin for Unconnected {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Buttons read high while pressed. A failed read counts as released.
pub(crate) fn is_pressed<P: InputPin>(button: &mut P) -> bool {
    match button.is_high() {
        Ok(pressed) => pressed,
        Err(e) => {
            warn!("Button read failed: {:?}", e);
            false
        }
    }
}

pub(crate) fn set_led<P: OutputPin>(led: &mut P, on: bool) {
    let result = if on { led.set_high() } else { led.set_low() };
    if let Err(e) = result {
        warn!("Indicator write failed: {:?}", e);
    }
}

pub(crate) fn toggle_led<P: StatefulOutputPin>(led: &mut P) {
    if let Err(e) = led.toggle() {
        warn!("Indicator toggle failed: {:?}", e);
    }
}
