//! Framing of the `sendfiles` response.
//!
//! ```text
//! <count>\n
//! <id>\n<payload-length>\n<payload>     (count times)
//! ```

use std::io::{self, BufRead, Read};
use std::str::FromStr;

/// One session as it arrives over the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferredSession {
    pub id: u64,
    pub payload: Vec<u8>,
}

pub fn count_line(count: usize) -> String {
    format!("{}\n", count)
}

pub fn session_header(id: u64, payload_len: usize) -> String {
    format!("{}\n{}\n", id, payload_len)
}

pub fn read_listing<R: BufRead>(reader: &mut R) -> io::Result<Vec<TransferredSession>> {
    let count: usize = read_number(reader)?;
    let mut sessions = Vec::new();

    for _ in 0..count {
        let id: u64 = read_number(reader)?;
        let len: usize = read_number(reader)?;
        // the length comes off the wire, so grow only as bytes arrive
        let mut payload = Vec::new();
        reader.by_ref().take(len as u64).read_to_end(&mut payload)?;
        if payload.len() != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("session {} ended after {} of {} bytes", id, payload.len(), len),
            ));
        }
        sessions.push(TransferredSession { id, payload });
    }
    Ok(sessions)
}

fn read_number<R: BufRead, T: FromStr>(reader: &mut R) -> io::Result<T> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "listing ended early",
        ));
    }
    line.trim().parse().map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("expected a number, got {:?}", line.trim()),
        )
    })
}
