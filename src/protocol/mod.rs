//! Serial protocol between the device and the monitoring host
//!
//! Incoming: one command per line, fields split on `,`.
//! Outgoing: one self-contained JSON-shaped record per line, each
//! terminated by `&\r\n`.
//! Zero heap allocation - fixed-capacity buffers only.

pub mod command;
pub mod error;
pub mod line_buffer;
pub mod parser;
pub mod telemetry;

pub use command::{decode, Command, Opcode, PinKind};
pub use error::DecodeError;
pub use line_buffer::LineBuffer;
pub use parser::{parse_double, parse_float, parse_int, parse_line, parse_long, Fields};
