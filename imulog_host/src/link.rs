use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use imulog_common::cmd::{RESP_DONE, RESP_FALSE, RESP_START, RESP_TRUE};
use imulog_common::transfer::{read_listing, TransferredSession};
use imulog_common::Command;
use log::{debug, info, warn};
use serialport::SerialPort;

/// Command/response exchange with the logger over any byte stream.
pub struct DeviceLink<T: Read + Write> {
    stream: BufReader<T>,
}

impl<T: Read + Write> DeviceLink<T> {
    pub fn new(stream: T) -> Self {
        Self {
            stream: BufReader::new(stream),
        }
    }

    pub fn send_command(&mut self, command: Command) -> Result<()> {
        debug!("sending {}", command);
        let port = self.stream.get_mut();
        port.write_all(command.as_str().as_bytes())?;
        port.write_all(b"\n")?;
        port.flush()?;
        Ok(())
    }

    /// Next response line without its terminator. Read timeouts are retried
    /// until `wait` has passed.
    pub fn read_line(&mut self, wait: Duration) -> Result<String> {
        let started = Instant::now();
        let mut line = String::new();
        loop {
            match self.stream.read_line(&mut line) {
                Ok(0) => bail!("device closed the link"),
                Ok(_) if line.ends_with('\n') => return Ok(line.trim().to_string()),
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    if started.elapsed() >= wait {
                        bail!("no response within {:?}", wait);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn expect_line(&mut self, want: &str, wait: Duration) -> Result<()> {
        let got = self.read_line(wait)?;
        if got != want {
            bail!("expected {:?}, device answered {:?}", want, got);
        }
        Ok(())
    }

    pub fn flash(&mut self, wait: Duration) -> Result<()> {
        self.send_command(Command::Flash)?;
        self.expect_line(RESP_DONE, wait)
    }

    pub fn is_setup(&mut self, wait: Duration) -> Result<bool> {
        self.send_command(Command::IsSetup)?;
        match self.read_line(wait)?.as_str() {
            RESP_TRUE => Ok(true),
            RESP_FALSE => Ok(false),
            other => Err(anyhow!("unexpected issetup answer {:?}", other)),
        }
    }

    /// Runs while the operator rotates the device, so `wait` should be
    /// generous.
    pub fn calibrate_magnetometer(&mut self, wait: Duration) -> Result<()> {
        self.send_command(Command::CalibrateMagnetometer)?;
        self.expect_line(RESP_START, wait)?;
        info!("Calibrating, rotate the device through every orientation");
        self.expect_line(RESP_DONE, wait)
    }

    /// Pull every recorded session. The device deletes them once sent.
    pub fn download(&mut self) -> Result<Vec<TransferredSession>> {
        self.send_command(Command::SendFiles)?;
        let sessions = read_listing(&mut self.stream).context("reading session listing")?;
        info!("Received {} sessions", sessions.len());
        Ok(sessions)
    }
}

/// First USB serial port, for when none is given.
pub fn find_device_port() -> Option<String> {
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            warn!("Could not list serial ports: {}", e);
            return None;
        }
    };

    for port in ports {
        debug!("Found port: {}", port.port_name);
        if let serialport::SerialPortType::UsbPort(info) = port.port_type {
            info!(
                "Using USB port {} ({:04x}:{:04x})",
                port.port_name, info.vid, info.pid
            );
            return Some(port.port_name);
        }
    }
    None
}

pub fn open(port_name: &str, baud: u32, timeout: Duration) -> Result<DeviceLink<Box<dyn SerialPort>>> {
    let port = serialport::new(port_name, baud)
        .timeout(timeout)
        .open()
        .with_context(|| format!("opening {}", port_name))?;
    info!("Opened {} at {} baud", port_name, baud);
    Ok(DeviceLink::new(port))
}
