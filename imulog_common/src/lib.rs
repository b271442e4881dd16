#![cfg_attr(feature = "no_std", no_std)]

pub mod calib;
pub mod cmd;
pub mod format;
pub mod printable;
pub mod sample;
#[cfg(feature = "std")]
pub mod transfer;

pub use calib::CalibrationRecord;
pub use cmd::Command;
pub use format::{EncodedRecord, RecordFormat};
pub use sample::{Sample, Triple, RECORD_SIZE};

use static_assertions::const_assert_eq;

/// Serial line speed used by both ends of the link.
pub const BAUD_RATE: u32 = 115200;

/// Number of values carried by one sample.
pub const SAMPLE_VALUES: usize = 9;

const_assert_eq!(RECORD_SIZE, SAMPLE_VALUES * core::mem::size_of::<f32>());
const_assert_eq!(printable::PRINTABLE_SIZE * 6, RECORD_SIZE * 8);
