use core::fmt;
use core::str::FromStr;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

use crate::printable::{self, PrintableError, PRINTABLE_SIZE};
use crate::sample::{Sample, RECORD_SIZE};

/// How samples are laid out in a session file. The two are never mixed
/// within one session.
#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFormat {
    /// Raw 36-byte little-endian records.
    #[default]
    Binary,
    /// One 48-character radix-64 token per record, no delimiter.
    Printable,
}

pub enum EncodedRecord {
    Binary([u8; RECORD_SIZE]),
    Printable([u8; PRINTABLE_SIZE]),
}

impl EncodedRecord {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            EncodedRecord::Binary(bytes) => bytes,
            EncodedRecord::Printable(token) => token,
        }
    }
}

#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload length is not a whole number of records.
    Truncated { len: usize, record_len: usize },
    Printable(PrintableError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated { len, record_len } => write!(
                f,
                "payload of {} bytes is not a multiple of the {}-byte record",
                len, record_len
            ),
            DecodeError::Printable(e) => write!(f, "bad printable record: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

impl From<PrintableError> for DecodeError {
    fn from(e: PrintableError) -> Self {
        DecodeError::Printable(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFormatError;

impl fmt::Display for ParseFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record format must be \"binary\" or \"printable\"")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseFormatError {}

impl FromStr for RecordFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" => Ok(RecordFormat::Binary),
            "printable" => Ok(RecordFormat::Printable),
            _ => Err(ParseFormatError),
        }
    }
}

impl RecordFormat {
    /// Width of one record on disk and on the wire.
    pub const fn record_len(self) -> usize {
        match self {
            RecordFormat::Binary => RECORD_SIZE,
            RecordFormat::Printable => PRINTABLE_SIZE,
        }
    }

    /// Session file extension.
    pub const fn extension(self) -> &'static str {
        match self {
            RecordFormat::Binary => "bin",
            RecordFormat::Printable => "txt",
        }
    }

    pub fn encode(self, sample: &Sample) -> EncodedRecord {
        let bytes = sample.to_bytes();
        match self {
            RecordFormat::Binary => EncodedRecord::Binary(bytes),
            RecordFormat::Printable => EncodedRecord::Printable(printable::to_printable(&bytes)),
        }
    }

    /// Raw record bytes of one encoded record.
    pub fn record_bytes(self, record: &[u8]) -> Result<[u8; RECORD_SIZE], DecodeError> {
        if record.len() != self.record_len() {
            return Err(DecodeError::Truncated {
                len: record.len(),
                record_len: self.record_len(),
            });
        }
        match self {
            RecordFormat::Binary => {
                let mut bytes = [0u8; RECORD_SIZE];
                bytes.copy_from_slice(record);
                Ok(bytes)
            }
            RecordFormat::Printable => Ok(printable::from_printable(record)?),
        }
    }

    pub fn decode(self, record: &[u8]) -> Result<Sample, DecodeError> {
        Ok(Sample::from_bytes(&self.record_bytes(record)?))
    }

    /// Iterate over the records of a whole session payload.
    pub fn records(self, payload: &[u8]) -> Result<core::slice::ChunksExact<'_, u8>, DecodeError> {
        if payload.len() % self.record_len() != 0 {
            return Err(DecodeError::Truncated {
                len: payload.len(),
                record_len: self.record_len(),
            });
        }
        Ok(payload.chunks_exact(self.record_len()))
    }
}
