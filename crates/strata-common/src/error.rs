use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum StrataError {
    /// An index into a fixed-size cell store was outside `[0, len)`.
    IndexOutOfRange { index: usize, len: usize },
    /// A value did not fit into the configured number of bits per entry.
    ValueTooWide { value: u32, bits: u8 },
    /// A block/light coordinate was outside `[0, 15]`.
    CoordinateOutOfRange { x: usize, y: usize, z: usize },
    /// The caller asked for an encoding this version cannot express.
    /// Retrying with the same arguments will fail again.
    UnsupportedRequest(String),
    IoError(std::io::Error),
}

impl fmt::Display for StrataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrataError::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range for length {}", index, len)
            }
            StrataError::ValueTooWide { value, bits } => {
                write!(f, "value {} does not fit in {} bits", value, bits)
            }
            StrataError::CoordinateOutOfRange { x, y, z } => {
                write!(f, "coordinate ({}, {}, {}) outside section bounds", x, y, z)
            }
            StrataError::UnsupportedRequest(msg) => write!(f, "unsupported request: {}", msg),
            StrataError::IoError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl Error for StrataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StrataError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StrataError {
    fn from(err: std::io::Error) -> Self {
        StrataError::IoError(err)
    }
}
