use core::fmt::Display;

/// Longest command line the device buffers before giving up on it.
pub const MAX_LINE_LEN: usize = 64;

pub const RESP_DONE: &str = "done";
pub const RESP_START: &str = "start";
pub const RESP_TRUE: &str = "true";
pub const RESP_FALSE: &str = "false";

/// Host -> device commands, one per newline-terminated line.
#[cfg_attr(feature = "no_std", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Flash,
    CalibrateMagnetometer,
    IsSetup,
    SendFiles,
    Unrecognized,
}

impl Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Command {
    /// Parse one line. Surrounding whitespace, including a trailing `\r`,
    /// is ignored; anything outside the vocabulary is `Unrecognized`.
    pub fn parse_line(line: &str) -> Self {
        match line.trim() {
            "flash" => Command::Flash,
            "calibmag" => Command::CalibrateMagnetometer,
            "issetup" => Command::IsSetup,
            "sendfiles" => Command::SendFiles,
            _ => Command::Unrecognized,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Flash => "flash",
            Command::CalibrateMagnetometer => "calibmag",
            Command::IsSetup => "issetup",
            Command::SendFiles => "sendfiles",
            Command::Unrecognized => "unrecognized",
        }
    }
}
