//! # Argument validation
//!
//! Everything the user passes ends up either inside a `/sys` path or written verbatim into a
//! control file, so both kinds of value get their own type and can only be built through
//! `FromStr`. clap calls these parsers, which means a bad value never gets past argument parsing.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Longest value accepted for any argument.
/// Ten digits always fit an `i64`, so this is also what keeps numbers in range.
pub const MAX_LEN: usize = 10;

/// Reasons a command line value gets rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckE {
    #[error("value is empty")]
    Empty,

    #[error("value is longer than {MAX_LEN} characters")]
    TooLong,

    /// `.` and `/` would let the value walk out of the sysfs directory
    #[error("value must not contain '.' or '/'")]
    Unsafe,

    #[error("value must be a non-negative decimal integer")]
    NotNumber,
}

fn check_len(s: &str) -> Result<(), CheckE> {
    match s.len() {
        0 => Err(CheckE::Empty),
        n if n > MAX_LEN => Err(CheckE::TooLong),
        _ => Ok(()),
    }
}

/// A CPU or GPU name that is safe to interpolate into a path, e.g. `cpu3` or `card0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DeviceId {
    type Err = CheckE;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        check_len(s)?;
        if s.contains(['.', '/']) {
            return Err(CheckE::Unsafe);
        }
        Ok(Self(s.to_owned()))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric payload for a control file. Keeps the text exactly as given, since that is what gets
/// written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value(String);

impl Value {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for Value {
    type Err = CheckE;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        check_len(s)?;
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CheckE::NotNumber);
        }
        Ok(Self(s.to_owned()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
