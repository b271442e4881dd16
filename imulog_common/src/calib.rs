use core::fmt;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

use crate::Triple;

/// Magnetometer hard-iron offset and soft-iron scale.
#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationRecord {
    pub offset: Triple,
    pub scale: Triple,
}

#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationParseError {
    /// The n-th whitespace-separated field is not a number.
    InvalidNumber(usize),
    /// Only 3 (offset) or 6 (offset + scale) numbers are accepted.
    WrongCount(usize),
}

impl fmt::Display for CalibrationParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationParseError::InvalidNumber(n) => write!(f, "field {} is not a number", n),
            CalibrationParseError::WrongCount(n) => {
                write!(f, "expected 3 or 6 numbers, found {}", n)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CalibrationParseError {}

impl CalibrationRecord {
    pub fn new(offset: Triple, scale: Triple) -> Self {
        Self { offset, scale }
    }

    /// Zero offset, unit scale.
    pub fn identity() -> Self {
        Self {
            offset: [0.0; 3],
            scale: [1.0; 3],
        }
    }

    /// Parse `ox oy oz [sx sy sz]`. An offset-only file takes `default_scale`.
    pub fn parse(text: &str, default_scale: Triple) -> Result<Self, CalibrationParseError> {
        let mut values = [0.0f32; 6];
        let mut count = 0;

        for (i, field) in text.split_whitespace().enumerate() {
            let value = field
                .parse::<f32>()
                .map_err(|_| CalibrationParseError::InvalidNumber(i))?;
            if i < values.len() {
                values[i] = value;
            }
            count += 1;
        }

        match count {
            3 => Ok(Self {
                offset: [values[0], values[1], values[2]],
                scale: default_scale,
            }),
            6 => Ok(Self {
                offset: [values[0], values[1], values[2]],
                scale: [values[3], values[4], values[5]],
            }),
            n => Err(CalibrationParseError::WrongCount(n)),
        }
    }

    /// Apply the correction to a raw magnetometer reading.
    pub fn correct(&self, raw: Triple) -> Triple {
        [
            (raw[0] - self.offset[0]) * self.scale[0],
            (raw[1] - self.offset[1]) * self.scale[1],
            (raw[2] - self.offset[2]) * self.scale[2],
        ]
    }
}

impl Default for CalibrationRecord {
    fn default() -> Self {
        Self::identity()
    }
}

/// Renders the six-number file form. Float formatting is shortest
/// round-trip, so `parse` reads back the identical values.
impl fmt::Display for CalibrationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} {} {} {} {}",
            self.offset[0], self.offset[1], self.offset[2], self.scale[0], self.scale[1], self.scale[2]
        )
    }
}
