//! Command decoding errors
//!
//! None of these reach the caller of the polling API: a rejected line
//! degrades to an ignored command.

/// Decode error with code and message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// D01: Line held no fields
    Empty,
    /// D02: Opcode not in the command table
    UnknownOpcode,
    /// D03: Required field missing
    MissingField,
    /// D04: Pin index or pixel coordinate not a number
    InvalidAddress,
}

impl DecodeError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Empty => "D01",
            Self::UnknownOpcode => "D02",
            Self::MissingField => "D03",
            Self::InvalidAddress => "D04",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "empty line",
            Self::UnknownOpcode => "unknown opcode",
            Self::MissingField => "missing field",
            Self::InvalidAddress => "invalid address",
        }
    }
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}
