use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use imulog_common::{CalibrationRecord, Triple};
use log::{debug, info};

use crate::error::Result;

/// Magnetometer calibration persisted as a short text file.
pub struct CalibrationStore {
    path: PathBuf,
    default_scale: Triple,
}

impl CalibrationStore {
    /// `default_scale` completes files that only carry an offset.
    pub fn new(path: impl Into<PathBuf>, default_scale: Triple) -> Self {
        Self {
            path: path.into(),
            default_scale,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// `Ok(None)` when no calibration has been saved yet.
    pub fn load(&self) -> Result<Option<CalibrationRecord>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No calibration file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let record = CalibrationRecord::parse(&text, self.default_scale)?;
        info!("Loaded calibration {:?}", record);
        Ok(Some(record))
    }

    /// Rewrites the whole file in one write.
    pub fn save(&self, record: &CalibrationRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, record.to_string())?;
        info!("Saved calibration to {}", self.path.display());
        Ok(())
    }
}
