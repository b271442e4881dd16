//! Printable form of a sample record.
//!
//! The record is read as one big-endian unsigned integer and written out in
//! radix 64, most significant digit first, zero-padded to a fixed width.
//! A record is 288 bits, exactly 48 digits, so the token is identical to the
//! standard base-64 text of the record and any base-64 decoder on the host
//! side recovers the bytes.

use crate::sample::RECORD_SIZE;

pub const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Width of one printable token, in characters.
pub const PRINTABLE_SIZE: usize = 48;

const RADIX: u16 = 64;

#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintableError {
    Length(usize),
    Digit(u8),
}

impl core::fmt::Display for PrintableError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PrintableError::Length(len) => {
                write!(f, "token is {} characters, expected {}", len, PRINTABLE_SIZE)
            }
            PrintableError::Digit(ch) => write!(f, "0x{:02x} is not a radix-64 digit", ch),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PrintableError {}

pub fn to_printable(record: &[u8; RECORD_SIZE]) -> [u8; PRINTABLE_SIZE] {
    let mut number = *record;
    let mut token = [ALPHABET[0]; PRINTABLE_SIZE];

    // long division by 64, one output digit per pass
    for digit in token.iter_mut().rev() {
        let mut rem: u16 = 0;
        for byte in number.iter_mut() {
            let acc = (rem << 8) | *byte as u16;
            *byte = (acc / RADIX) as u8;
            rem = acc % RADIX;
        }
        *digit = ALPHABET[rem as usize];
    }
    token
}

pub fn from_printable(token: &[u8]) -> Result<[u8; RECORD_SIZE], PrintableError> {
    if token.len() != PRINTABLE_SIZE {
        return Err(PrintableError::Length(token.len()));
    }

    let mut number = [0u8; RECORD_SIZE];
    for &ch in token {
        let mut carry = digit_value(ch)? as u16;
        for byte in number.iter_mut().rev() {
            let acc = *byte as u16 * RADIX + carry;
            *byte = acc as u8;
            carry = acc >> 8;
        }
    }
    Ok(number)
}

fn digit_value(ch: u8) -> Result<u8, PrintableError> {
    match ch {
        b'A'..=b'Z' => Ok(ch - b'A'),
        b'a'..=b'z' => Ok(ch - b'a' + 26),
        b'0'..=b'9' => Ok(ch - b'0' + 52),
        b'+' => Ok(62),
        b'/' => Ok(63),
        _ => Err(PrintableError::Digit(ch)),
    }
}
