use std::path::{Path, PathBuf};

use imulog_common::{CalibrationRecord, RecordFormat, Triple};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, Result};

/// How the operator arms and triggers calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonLayout {
    /// Start/stop arms, a separate button starts calibration.
    #[default]
    TwoButton,
    /// Start/stop does both, separated by the debounce delay.
    SingleButton,
}

/// How new sessions are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionNaming {
    #[default]
    Sequential,
    /// Capture time in UNIX seconds.
    Timestamp,
}

/// Device configuration. Built once at startup and handed to the
/// controller by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub sample_frequency_hz: f32,
    pub hang_time_ms: u32,
    pub debounce_ms: u32,
    pub idle_poll_ms: u32,
    pub startup_blink_ms: u32,
    pub flash_count: u32,
    pub flash_interval_ms: u32,
    pub button_layout: ButtonLayout,
    pub record_format: RecordFormat,
    pub session_naming: SessionNaming,
    pub session_dir: PathBuf,
    pub calibration_path: PathBuf,
    pub default_mag_offset: Triple,
    pub default_mag_scale: Triple,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sample_frequency_hz: 5.0,
            hang_time_ms: 500,
            debounce_ms: 500,
            idle_poll_ms: 10,
            startup_blink_ms: 1000,
            flash_count: 3,
            flash_interval_ms: 200,
            button_layout: ButtonLayout::TwoButton,
            record_format: RecordFormat::Binary,
            session_naming: SessionNaming::Sequential,
            session_dir: PathBuf::from("sessions"),
            calibration_path: PathBuf::from("calib.txt"),
            default_mag_offset: [0.0; 3],
            default_mag_scale: [1.0; 3],
        }
    }
}

impl DeviceConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sample_frequency_hz.is_finite() || self.sample_frequency_hz <= 0.0 {
            return Err(DeviceError::Config(format!(
                "sample_frequency_hz must be positive, got {}",
                self.sample_frequency_hz
            )));
        }
        Ok(())
    }

    /// Delay between two samples while recording.
    pub fn sample_period_us(&self) -> u32 {
        (1_000_000.0 / self.sample_frequency_hz as f64).round() as u32
    }

    /// Calibration used until a calibration file exists.
    pub fn default_calibration(&self) -> CalibrationRecord {
        CalibrationRecord::new(self.default_mag_offset, self.default_mag_scale)
    }
}
