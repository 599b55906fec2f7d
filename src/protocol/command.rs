//! Command decoding
//!
//! Field 0 of a line selects one of a closed set of opcodes. Unknown
//! opcodes decode to an error so the session can fail safe.

use heapless::String;

use super::error::DecodeError;
use super::parser::{parse_int, Fields};
use crate::config::{NAME_SIZE, VALUE_SIZE};
use crate::watch::ValueType;

/// Name of a variable or sensor
pub type Name = String<NAME_SIZE>;

/// Raw text of a pushed variable value
pub type RawValue = String<VALUE_SIZE>;

/// Opcodes accepted from the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Sync = 1,
    ReadPin = 3,
    WriteDigital = 4,
    WritePwm = 5,
    Hold = 11,
    Release = 12,
    Step = 13,
    ToggleBreakpoints = 15,
    UpdateVariable = 18,
    EnumerateSensors = 21,
    SelectSensor = 22,
    Plot = 31,
    Unplot = 32,
    CalibrateCompass = 41,
    Heading = 42,
    MagneticField = 43,
    SetAccelRange = 44,
    Acceleration = 45,
    Tilt = 46,
    Gesture = 47,
    Light = 51,
    Temperature = 52,
    Sound = 61,
}

impl Opcode {
    /// Match the literal opcode field.
    ///
    /// Comparison is textual: `"01"` or `" 1"` are not opcode 1.
    pub fn from_field(field: &str) -> Option<Self> {
        let op = match field {
            "1" => Opcode::Sync,
            "3" => Opcode::ReadPin,
            "4" => Opcode::WriteDigital,
            "5" => Opcode::WritePwm,
            "11" => Opcode::Hold,
            "12" => Opcode::Release,
            "13" => Opcode::Step,
            "15" => Opcode::ToggleBreakpoints,
            "18" => Opcode::UpdateVariable,
            "21" => Opcode::EnumerateSensors,
            "22" => Opcode::SelectSensor,
            "31" => Opcode::Plot,
            "32" => Opcode::Unplot,
            "41" => Opcode::CalibrateCompass,
            "42" => Opcode::Heading,
            "43" => Opcode::MagneticField,
            "44" => Opcode::SetAccelRange,
            "45" => Opcode::Acceleration,
            "46" => Opcode::Tilt,
            "47" => Opcode::Gesture,
            "51" => Opcode::Light,
            "52" => Opcode::Temperature,
            "61" => Opcode::Sound,
            _ => return None,
        };
        Some(op)
    }

    /// Numeric wire value.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Pin family addressed by a read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinKind {
    Digital,
    Analog,
}

/// A decoded host command.
///
/// Owned so the session can keep the last one and re-dispatch it on
/// polls that bring no new input.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Neutral marker: nothing to repeat.
    Idle,
    /// A rejected line, kept as the last command.
    Ignored,
    Sync,
    ReadPin { kind: PinKind, pin: u8 },
    WriteDigital { pin: u8, high: bool },
    WritePwm { pin: u8, duty: u16 },
    Hold,
    Release,
    Step,
    ToggleBreakpoints,
    UpdateVariable {
        name: Name,
        value: RawValue,
        declared: Option<ValueType>,
    },
    EnumerateSensors,
    SelectSensor(Name),
    Plot { x: u8, y: u8 },
    Unplot { x: u8, y: u8 },
    CalibrateCompass,
    Heading,
    MagneticField,
    SetAccelRange(u8),
    Acceleration,
    Tilt,
    Gesture,
    Light,
    Temperature,
    Sound,
}

impl Command {
    /// Opcode this command was decoded from, if any.
    pub fn opcode(&self) -> Option<Opcode> {
        let op = match self {
            Command::Idle | Command::Ignored => return None,
            Command::Sync => Opcode::Sync,
            Command::ReadPin { .. } => Opcode::ReadPin,
            Command::WriteDigital { .. } => Opcode::WriteDigital,
            Command::WritePwm { .. } => Opcode::WritePwm,
            Command::Hold => Opcode::Hold,
            Command::Release => Opcode::Release,
            Command::Step => Opcode::Step,
            Command::ToggleBreakpoints => Opcode::ToggleBreakpoints,
            Command::UpdateVariable { .. } => Opcode::UpdateVariable,
            Command::EnumerateSensors => Opcode::EnumerateSensors,
            Command::SelectSensor(_) => Opcode::SelectSensor,
            Command::Plot { .. } => Opcode::Plot,
            Command::Unplot { .. } => Opcode::Unplot,
            Command::CalibrateCompass => Opcode::CalibrateCompass,
            Command::Heading => Opcode::Heading,
            Command::MagneticField => Opcode::MagneticField,
            Command::SetAccelRange(_) => Opcode::SetAccelRange,
            Command::Acceleration => Opcode::Acceleration,
            Command::Tilt => Opcode::Tilt,
            Command::Gesture => Opcode::Gesture,
            Command::Light => Opcode::Light,
            Command::Temperature => Opcode::Temperature,
            Command::Sound => Opcode::Sound,
        };
        Some(op)
    }
}

/// Decode a parsed line into a command.
pub fn decode(fields: &Fields<'_>) -> Result<Command, DecodeError> {
    if fields.is_empty() {
        return Err(DecodeError::Empty);
    }

    let op = Opcode::from_field(fields.selector()).ok_or(DecodeError::UnknownOpcode)?;

    let cmd = match op {
        Opcode::Sync => Command::Sync,
        Opcode::ReadPin => {
            let kind = match parse_int(field(fields, 1)?) {
                Some(0) => PinKind::Digital,
                Some(_) => PinKind::Analog,
                None => return Err(DecodeError::InvalidAddress),
            };
            Command::ReadPin { kind, pin: address(fields, 2)? }
        }
        Opcode::WriteDigital => Command::WriteDigital {
            pin: address(fields, 1)?,
            high: value(fields, 2)? != 0,
        },
        Opcode::WritePwm => Command::WritePwm {
            pin: address(fields, 1)?,
            duty: value(fields, 2)?.clamp(0, u16::MAX as i32) as u16,
        },
        Opcode::Hold => Command::Hold,
        Opcode::Release => Command::Release,
        Opcode::Step => Command::Step,
        Opcode::ToggleBreakpoints => Command::ToggleBreakpoints,
        Opcode::UpdateVariable => Command::UpdateVariable {
            name: bounded(field(fields, 1)?),
            value: bounded(field(fields, 2)?),
            declared: ValueType::from_code(value(fields, 3)?),
        },
        Opcode::EnumerateSensors => Command::EnumerateSensors,
        Opcode::SelectSensor => Command::SelectSensor(bounded(field(fields, 1)?)),
        Opcode::Plot => Command::Plot {
            x: address(fields, 1)?,
            y: address(fields, 2)?,
        },
        Opcode::Unplot => Command::Unplot {
            x: address(fields, 1)?,
            y: address(fields, 2)?,
        },
        Opcode::CalibrateCompass => Command::CalibrateCompass,
        Opcode::Heading => Command::Heading,
        Opcode::MagneticField => Command::MagneticField,
        Opcode::SetAccelRange => {
            Command::SetAccelRange(value(fields, 1)?.clamp(0, u8::MAX as i32) as u8)
        }
        Opcode::Acceleration => Command::Acceleration,
        Opcode::Tilt => Command::Tilt,
        Opcode::Gesture => Command::Gesture,
        Opcode::Light => Command::Light,
        Opcode::Temperature => Command::Temperature,
        Opcode::Sound => Command::Sound,
    };

    Ok(cmd)
}

fn field<'a>(fields: &Fields<'a>, idx: usize) -> Result<&'a str, DecodeError> {
    fields.get(idx).ok_or(DecodeError::MissingField)
}

/// Pin index or pixel coordinate: must be a non-negative number.
fn address(fields: &Fields<'_>, idx: usize) -> Result<u8, DecodeError> {
    parse_int(field(fields, idx)?)
        .and_then(|n| u8::try_from(n).ok())
        .ok_or(DecodeError::InvalidAddress)
}

/// Numeric value: malformed text reads as zero.
fn value(fields: &Fields<'_>, idx: usize) -> Result<i32, DecodeError> {
    Ok(parse_int(field(fields, idx)?).unwrap_or(0))
}

/// Copy `s` into a fixed-capacity string, truncating on a char boundary.
pub(crate) fn bounded<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parser::parse_line;

    #[test]
    fn test_opcode_literal_match() {
        assert_eq!(Opcode::from_field("13"), Some(Opcode::Step));
        assert_eq!(Opcode::from_field("013"), None);
        assert_eq!(Opcode::from_field("2"), None);
        assert_eq!(Opcode::Sound.code(), 61);
    }

    #[test]
    fn test_bounded_truncates() {
        let s: String<4> = bounded("abcdef");
        assert_eq!(s.as_str(), "abcd");
    }

    #[test]
    fn test_opcode_roundtrip_through_command() {
        let cmd = decode(&parse_line("46,")).unwrap();
        assert_eq!(cmd.opcode(), Some(Opcode::Tilt));
        assert_eq!(Command::Idle.opcode(), None);
    }
}
