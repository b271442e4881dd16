//! Host command protocol over the serial link.
//!
//! Host -> Device
//! - one command per `\n`-terminated line
//!
//! Device -> Host
//! - `flash`     -> `done`
//! - `calibmag`  -> `start` ... `done`
//! - `issetup`   -> `true` | `false`
//! - `sendfiles` -> session listing, see [`imulog_common::transfer`]
//! - anything else -> nothing

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_io::{Error as _, Read, ReadReady, Write};
use imulog_common::cmd::{Command, MAX_LINE_LEN, RESP_DONE, RESP_FALSE, RESP_START, RESP_TRUE};
use imulog_common::{transfer, CalibrationRecord};
use log::{debug, error, info, warn};

use crate::calib_store::CalibrationStore;
use crate::config::DeviceConfig;
use crate::error::{sensor_err, serial_err, Result};
use crate::hw::{set_led, SampleSource};
use crate::session_store::SessionStore;

/// Assembles command lines from the serial link without ever waiting on it.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull whatever is already waiting on `serial` and return the next
    /// complete line, if there is one.
    pub fn poll<S: Read + ReadReady>(&mut self, serial: &mut S) -> Option<String> {
        if let Some(line) = self.take_line() {
            return Some(line);
        }

        match serial.read_ready() {
            Ok(true) => {
                let mut chunk = [0u8; MAX_LINE_LEN];
                match serial.read(&mut chunk) {
                    Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                    Err(e) => warn!("Serial read failed: {:?}", e.kind()),
                }
            }
            Ok(false) => {}
            Err(e) => warn!("Serial poll failed: {:?}", e.kind()),
        }

        let line = self.take_line();
        if line.is_none() && self.buf.len() > MAX_LINE_LEN {
            debug!("Dropping {} bytes without a line break", self.buf.len());
            self.buf.clear();
        }
        line
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.buf.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buf.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line[..end]).into_owned())
    }
}

/// Everything a command may touch, borrowed from the controller for the
/// duration of one command.
pub struct CommandContext<'a, SRC, SERIAL, LED, DELAY> {
    pub config: &'a DeviceConfig,
    pub source: &'a mut SRC,
    pub serial: &'a mut SERIAL,
    pub status_led: &'a mut LED,
    pub delay: &'a mut DELAY,
    pub calibration_store: &'a CalibrationStore,
    pub sessions: &'a SessionStore,
    pub calibration: &'a mut CalibrationRecord,
}

impl<SRC, SERIAL, LED, DELAY> CommandContext<'_, SRC, SERIAL, LED, DELAY>
where
    SRC: SampleSource,
    SERIAL: Write,
    LED: OutputPin,
    DELAY: DelayNs,
{
    pub fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Flash => self.flash(),
            Command::CalibrateMagnetometer => self.calibrate_magnetometer(),
            Command::IsSetup => self.is_setup(),
            Command::SendFiles => self.send_files(),
            Command::Unrecognized => {
                debug!("Ignoring unrecognized command");
                Ok(())
            }
        }
    }

    fn flash(&mut self) -> Result<()> {
        for _ in 0..self.config.flash_count {
            set_led(self.status_led, true);
            self.delay.delay_ms(self.config.flash_interval_ms);
            set_led(self.status_led, false);
            self.delay.delay_ms(self.config.flash_interval_ms);
        }
        self.respond(RESP_DONE)
    }

    fn calibrate_magnetometer(&mut self) -> Result<()> {
        self.respond(RESP_START)?;

        let record = self.source.calibrate_magnetometer().map_err(sensor_err)?;
        self.calibration_store.save(&record)?;
        self.source.apply_calibration(&record).map_err(sensor_err)?;
        *self.calibration = record;
        info!("Magnetometer calibrated: {:?}", record);

        self.respond(RESP_DONE)
    }

    fn is_setup(&mut self) -> Result<()> {
        let answer = if self.calibration_store.exists() {
            RESP_TRUE
        } else {
            RESP_FALSE
        };
        self.respond(answer)
    }

    fn send_files(&mut self) -> Result<()> {
        let handles = match self.sessions.list_valid_sessions() {
            Ok(handles) => handles,
            Err(e) => {
                error!("Could not list sessions: {}", e);
                self.write(transfer::count_line(0).as_bytes())?;
                self.serial.flush().map_err(serial_err)?;
                return Err(e);
            }
        };

        // report what could be read, stop at the first failure
        let mut loaded = Vec::with_capacity(handles.len());
        for handle in handles {
            match self.sessions.read(&handle) {
                Ok(payload) => loaded.push((handle, payload)),
                Err(e) => {
                    error!("Could not read session {}: {}", handle.id(), e);
                    break;
                }
            }
        }

        info!("Sending {} sessions", loaded.len());
        self.write(transfer::count_line(loaded.len()).as_bytes())?;
        for (handle, payload) in &loaded {
            self.write(transfer::session_header(handle.id(), payload.len()).as_bytes())?;
            self.write(payload)?;
        }
        self.serial.flush().map_err(serial_err)?;

        for (handle, _) in &loaded {
            if let Err(e) = self.sessions.delete(handle) {
                error!("Could not delete sent session {}: {}", handle.id(), e);
            }
        }
        Ok(())
    }

    fn respond(&mut self, text: &str) -> Result<()> {
        self.write(text.as_bytes())?;
        self.write(b"\n")?;
        self.serial.flush().map_err(serial_err)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.serial.write_all(bytes).map_err(serial_err)
    }
}
