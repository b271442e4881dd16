use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, StatefulOutputPin};
use embedded_io::{Read, ReadReady, Write};
use imulog_common::{CalibrationRecord, Command};
use log::{error, info, warn};

use crate::calib_store::CalibrationStore;
use crate::config::{ButtonLayout, DeviceConfig};
use crate::error::{sensor_err, DeviceError, Result};
use crate::hw::{is_pressed, set_led, toggle_led, Bias, Peripherals, SampleSource};
use crate::protocol::{CommandContext, LineBuffer};
use crate::session_store::{SessionStore, SessionWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Serving host commands, waiting for start/stop.
    Idle,
    /// Status indicator lit, waiting for the calibration press.
    ArmedForCalibration,
    /// Gathering sensor bias before a recording.
    Calibrating,
    /// Appending samples to the open session.
    Recording,
}

pub struct Controller<'a, SRC, START, CALIB, STATUS, HEARTBEAT, SERIAL, DELAY> {
    config: &'a DeviceConfig,
    source: SRC,
    io: Peripherals<START, CALIB, STATUS, HEARTBEAT, SERIAL, DELAY>,
    calibration_store: CalibrationStore,
    sessions: SessionStore,
    calibration: CalibrationRecord,
    bias: Option<Bias>,
    lines: LineBuffer,
    state: State,
    active: Option<SessionWriter>,
}

impl<'a, SRC, START, CALIB, STATUS, HEARTBEAT, SERIAL, DELAY>
    Controller<'a, SRC, START, CALIB, STATUS, HEARTBEAT, SERIAL, DELAY>
where
    SRC: SampleSource,
    START: InputPin,
    CALIB: InputPin,
    STATUS: OutputPin,
    HEARTBEAT: StatefulOutputPin,
    SERIAL: Read + ReadReady + Write,
    DELAY: DelayNs,
{
    /// Open the stores, load the magnetometer calibration (or fall back to
    /// the configured default) and hand it to the sample source.
    pub fn new(
        config: &'a DeviceConfig,
        mut source: SRC,
        mut io: Peripherals<START, CALIB, STATUS, HEARTBEAT, SERIAL, DELAY>,
    ) -> Result<Self> {
        config.validate()?;

        let calibration_store =
            CalibrationStore::new(&config.calibration_path, config.default_mag_scale);
        let sessions = SessionStore::open(
            &config.session_dir,
            config.record_format,
            config.session_naming,
        )?;

        let calibration = match calibration_store.load() {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!("Device not set up, using default calibration");
                config.default_calibration()
            }
            Err(e) => {
                warn!("{}, using default calibration", e);
                config.default_calibration()
            }
        };
        source.apply_calibration(&calibration).map_err(sensor_err)?;

        set_led(&mut io.status_led, true);
        io.delay.delay_ms(config.startup_blink_ms);
        set_led(&mut io.status_led, false);
        info!("Controller ready");

        Ok(Self {
            config,
            source,
            io,
            calibration_store,
            sessions,
            calibration,
            bias: None,
            lines: LineBuffer::new(),
            state: State::Idle,
            active: None,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn calibration(&self) -> &CalibrationRecord {
        &self.calibration
    }

    pub fn bias(&self) -> Option<&Bias> {
        self.bias.as_ref()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn source(&self) -> &SRC {
        &self.source
    }

    /// Run the state machine forever. Errors end the current command or
    /// session, never the loop.
    pub fn run(&mut self) -> ! {
        loop {
            if let Err(e) = self.step() {
                error!("{}", e);
            }
        }
    }

    /// One iteration of the current state. On error the controller is
    /// already back in `Idle`.
    pub fn step(&mut self) -> Result<State> {
        match self.state {
            State::Idle => self.idle()?,
            State::ArmedForCalibration => self.armed(),
            State::Calibrating => self.calibrating()?,
            State::Recording => self.recording()?,
        }
        Ok(self.state)
    }

    fn transition(&mut self, next: State) {
        info!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn idle(&mut self) -> Result<()> {
        toggle_led(&mut self.io.heartbeat_led);

        if let Some(line) = self.lines.poll(&mut self.io.serial) {
            let command = Command::parse_line(&line);
            return self.command_context().dispatch(command).map_err(|e| {
                warn!("Abandoned {} command", command);
                e
            });
        }

        if is_pressed(&mut self.io.start_stop) {
            set_led(&mut self.io.status_led, true);
            if self.config.button_layout == ButtonLayout::SingleButton {
                self.io.delay.delay_ms(self.config.debounce_ms);
            }
            self.transition(State::ArmedForCalibration);
        } else {
            self.io.delay.delay_ms(self.config.idle_poll_ms);
        }
        Ok(())
    }

    fn armed(&mut self) {
        let pressed = match self.config.button_layout {
            ButtonLayout::TwoButton => is_pressed(&mut self.io.calibrate),
            ButtonLayout::SingleButton => is_pressed(&mut self.io.start_stop),
        };

        if pressed {
            // recording watches the same button for stop
            if self.config.button_layout == ButtonLayout::SingleButton {
                self.io.delay.delay_ms(self.config.debounce_ms);
            }
            self.transition(State::Calibrating);
        } else {
            self.io.delay.delay_ms(self.config.idle_poll_ms);
        }
    }

    fn calibrating(&mut self) -> Result<()> {
        let bias = match self.source.calibrate() {
            Ok(bias) => bias,
            Err(e) => {
                set_led(&mut self.io.status_led, false);
                self.transition(State::Idle);
                return Err(sensor_err(e));
            }
        };
        info!("Sensor bias {:?}", bias);
        self.bias = Some(bias);

        set_led(&mut self.io.status_led, false);
        match self.sessions.create() {
            Ok(writer) => {
                self.active = Some(writer);
                self.transition(State::Recording);
                Ok(())
            }
            Err(e) => {
                self.transition(State::Idle);
                Err(e)
            }
        }
    }

    fn recording(&mut self) -> Result<()> {
        if is_pressed(&mut self.io.start_stop) {
            let closed = self.active.take().map(SessionWriter::finish);
            self.io.delay.delay_ms(self.config.hang_time_ms);
            self.transition(State::Idle);
            return closed.transpose().map(|_| ());
        }

        let Some(writer) = self.active.as_mut() else {
            self.transition(State::Idle);
            return Err(DeviceError::Storage(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "recording without an open session",
            )));
        };

        let written = self
            .source
            .read_sample()
            .map_err(sensor_err)
            .and_then(|sample| writer.append(self.config.record_format.encode(&sample).as_bytes()));
        if let Err(e) = written {
            if let Some(writer) = self.active.take() {
                writer.abandon();
            }
            self.transition(State::Idle);
            return Err(e);
        }

        self.io.delay.delay_us(self.config.sample_period_us());
        Ok(())
    }

    fn command_context(&mut self) -> CommandContext<'_, SRC, SERIAL, STATUS, DELAY> {
        CommandContext {
            config: self.config,
            source: &mut self.source,
            serial: &mut self.io.serial,
            status_led: &mut self.io.status_led,
            delay: &mut self.io.delay,
            calibration_store: &self.calibration_store,
            sessions: &self.sessions,
            calibration: &mut self.calibration,
        }
    }
}
