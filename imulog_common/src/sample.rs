#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

/// Size of one encoded sample record, in bytes.
pub const RECORD_SIZE: usize = 36;

pub type Triple = [f32; 3];

/// One synchronized reading of the three sensors.
#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    pub gyro: Triple,
    pub accel: Triple,
    pub mag: Triple,
}

/// Maps the magnetometer's axes onto the accel/gyro axes of the board: x and
/// y are swapped and z is inverted. The map is its own inverse.
pub fn remap_mag(mag: Triple) -> Triple {
    [mag[1], mag[0], -mag[2]]
}

impl Sample {
    pub fn new(gyro: Triple, accel: Triple, mag: Triple) -> Self {
        Self { gyro, accel, mag }
    }

    /// Values in record order: gyro, accel, mag.
    pub fn values(&self) -> [f32; crate::SAMPLE_VALUES] {
        let mut values = [0.0f32; crate::SAMPLE_VALUES];
        values[0..3].copy_from_slice(&self.gyro);
        values[3..6].copy_from_slice(&self.accel);
        values[6..9].copy_from_slice(&self.mag);
        values
    }

    /// Little-endian record with the magnetometer triple remapped.
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let aligned = Sample {
            mag: remap_mag(self.mag),
            ..*self
        };

        let mut bytes = [0u8; RECORD_SIZE];
        for (i, value) in aligned.values().iter().enumerate() {
            bytes[i * 4..(i + 1) * 4].copy_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Inverse of [`Sample::to_bytes`].
    pub fn from_bytes(bytes: &[u8; RECORD_SIZE]) -> Self {
        let aligned = Self::aligned_from_bytes(bytes);
        Sample {
            mag: remap_mag(aligned.mag),
            ..aligned
        }
    }

    /// The record as stored, with the magnetometer already in the board frame.
    pub fn aligned_from_bytes(bytes: &[u8; RECORD_SIZE]) -> Self {
        let value = |i: usize| {
            let o = i * 4;
            f32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]])
        };

        Sample {
            gyro: [value(0), value(1), value(2)],
            accel: [value(3), value(4), value(5)],
            mag: [value(6), value(7), value(8)],
        }
    }
}
