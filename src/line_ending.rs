use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::ConfigError;

/// Terminator written after each record.
///
/// Equality is by named mode: `Default` resolves to the platform terminator
/// when bytes are taken, yet never compares equal to the explicit mode it
/// resolves to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LineEnding {
    /// No terminator at all.
    None,
    /// Carriage return.
    Cr,
    /// Line feed.
    Lf,
    /// Carriage return followed by line feed.
    CrLf,
    /// A single NUL byte.
    Null,
    /// Platform terminator of the build target.
    Default,
}

impl LineEnding {
    pub fn as_bytes(&self) -> &'static [u8] {
        match *self {
            LineEnding::None => b"",
            LineEnding::Cr => b"\r",
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
            LineEnding::Null => b"\0",
            LineEnding::Default => {
                if cfg!(windows) {
                    b"\r\n"
                } else {
                    b"\n"
                }
            }
        }
    }
}

impl Default for LineEnding {
    fn default() -> LineEnding {
        LineEnding::Default
    }
}

impl Display for LineEnding {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), fmt::Error> {
        let name = match *self {
            LineEnding::None => "None",
            LineEnding::Cr => "CR",
            LineEnding::Lf => "LF",
            LineEnding::CrLf => "CRLF",
            LineEnding::Null => "Null",
            LineEnding::Default => "Default",
        };

        fmt.write_str(name)
    }
}

impl FromStr for LineEnding {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<LineEnding, ConfigError> {
        match &*name.to_ascii_lowercase() {
            "none" => Ok(LineEnding::None),
            "cr" => Ok(LineEnding::Cr),
            "lf" => Ok(LineEnding::Lf),
            "crlf" => Ok(LineEnding::CrLf),
            "null" => Ok(LineEnding::Null),
            "default" => Ok(LineEnding::Default),
            _ => Err(ConfigError::Invalid("lineEnding", "one of None, CR, LF, CRLF, Null, Default")),
        }
    }
}
