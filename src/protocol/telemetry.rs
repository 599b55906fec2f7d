//! Outgoing telemetry records
//!
//! Every function writes exactly one record followed by
//! [`RECORD_TERMINATOR`]. Records never depend on each other, so a lost
//! line is repaired by the next report. Key names are matched by the host
//! byte-for-byte.

use core::fmt::{self, Write};

use super::parser::Fields;
use super::PinKind;
use crate::config::{DISPLAY_SIZE, RECORD_TERMINATOR};
use crate::hal::{Axes, Display, Gesture, Tilt};
use crate::watch::WatchValue;

fn finish(out: &mut dyn Write) -> fmt::Result {
    out.write_str(RECORD_TERMINATOR)
}

/// Write `s` as a quoted JSON string.
pub fn write_json_str(out: &mut dyn Write, s: &str) -> fmt::Result {
    out.write_char('"')?;
    write_escaped(out, s)?;
    out.write_char('"')
}

fn write_escaped(out: &mut dyn Write, s: &str) -> fmt::Result {
    for c in s.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    Ok(())
}

/// `{"Breakpoint":{"id":"<label>"}}`
pub fn breakpoint(out: &mut dyn Write, label: &str) -> fmt::Result {
    out.write_str("{\"Breakpoint\":{\"id\":")?;
    write_json_str(out, label)?;
    out.write_str("}}")?;
    finish(out)
}

/// `{"Variable":{"name":"|<name>|","value":<v>,"type":<t>}}`
///
/// The name is wrapped in `|` so the host can match it exactly even when
/// one variable name is a prefix of another.
pub fn variable<T: WatchValue>(out: &mut dyn Write, name: &str, value: &T) -> fmt::Result {
    out.write_str("{\"Variable\":{\"name\":\"|")?;
    write_escaped(out, name)?;
    out.write_str("|\",\"value\":")?;
    value.write_value(out)?;
    write!(out, ",\"type\":{}}}}}", T::TYPE.code())?;
    finish(out)
}

/// `{"Sensor_Name":"<name>"}`
pub fn sensor_name(out: &mut dyn Write, name: &str) -> fmt::Result {
    out.write_str("{\"Sensor_Name\":")?;
    write_json_str(out, name)?;
    out.write_str("}")?;
    finish(out)
}

/// `{"Sensor":{"name":"<name>","value":<v>,"type":<t>}}`
pub fn sensor_value<T: WatchValue>(out: &mut dyn Write, name: &str, value: &T) -> fmt::Result {
    out.write_str("{\"Sensor\":{\"name\":")?;
    write_json_str(out, name)?;
    out.write_str(",\"value\":")?;
    value.write_value(out)?;
    write!(out, ",\"type\":{}}}}}", T::TYPE.code())?;
    finish(out)
}

/// `{"Pins":{"DP<n>":<v>}}` or `{"Pins":{"AP<n>":<v>}}`
pub fn pin(out: &mut dyn Write, kind: PinKind, pin: u8, value: u16) -> fmt::Result {
    let prefix = match kind {
        PinKind::Digital => "DP",
        PinKind::Analog => "AP",
    };
    write!(out, "{{\"Pins\":{{\"{}{}\":{}}}}}", prefix, pin, value)?;
    finish(out)
}

/// `{"Reset_LEDs":[[..],..]}`: every pixel, row-major, 1 = lit.
pub fn display_snapshot(out: &mut dyn Write, display: &dyn Display) -> fmt::Result {
    out.write_str("{\"Reset_LEDs\":[")?;
    for y in 0..DISPLAY_SIZE {
        if y > 0 {
            out.write_char(',')?;
        }
        out.write_char('[')?;
        for x in 0..DISPLAY_SIZE {
            if x > 0 {
                out.write_char(',')?;
            }
            let lit = display.point(x as u8, y as u8);
            out.write_char(if lit { '1' } else { '0' })?;
        }
        out.write_char(']')?;
    }
    out.write_str("]}")?;
    finish(out)
}

/// `{"Compass":<degrees>}`
pub fn heading(out: &mut dyn Write, degrees: i32) -> fmt::Result {
    write!(out, "{{\"Compass\":{}}}", degrees)?;
    finish(out)
}

fn axes(out: &mut dyn Write, key: &str, a: Axes) -> fmt::Result {
    write!(
        out,
        "{{\"{}\":{{\"X\":{},\"Y\":{},\"Z\":{},\"Strength\":{}}}}}",
        key, a.x, a.y, a.z, a.strength
    )?;
    finish(out)
}

/// `{"Magnet":{"X":..,"Y":..,"Z":..,"Strength":..}}`
pub fn magnetic_field(out: &mut dyn Write, field: Axes) -> fmt::Result {
    axes(out, "Magnet", field)
}

/// `{"Motion":{"X":..,"Y":..,"Z":..,"Strength":..}}`
pub fn acceleration(out: &mut dyn Write, accel: Axes) -> fmt::Result {
    axes(out, "Motion", accel)
}

/// `{"Rotation":{"Pitch":..,"Roll":..}}`
pub fn tilt(out: &mut dyn Write, tilt: Tilt) -> fmt::Result {
    write!(
        out,
        "{{\"Rotation\":{{\"Pitch\":{},\"Roll\":{}}}}}",
        tilt.pitch, tilt.roll
    )?;
    finish(out)
}

/// `{"Gesture":"<text>"}`, `"None"` when no gesture is active.
pub fn gesture(out: &mut dyn Write, gesture: Option<Gesture>) -> fmt::Result {
    let text = gesture.map(Gesture::text).unwrap_or("None");
    write!(out, "{{\"Gesture\":\"{}\"}}", text)?;
    finish(out)
}

/// `{"Light":<level>}`
pub fn light(out: &mut dyn Write, level: u8) -> fmt::Result {
    write!(out, "{{\"Light\":{}}}", level)?;
    finish(out)
}

/// `{"Temp":<celsius>}`
pub fn temperature(out: &mut dyn Write, celsius: i32) -> fmt::Result {
    write!(out, "{{\"Temp\":{}}}", celsius)?;
    finish(out)
}

/// `{"Sound":<level>}`
pub fn sound(out: &mut dyn Write, level: u8) -> fmt::Result {
    write!(out, "{{\"Sound\":{}}}", level)?;
    finish(out)
}

/// Human-readable echo of a received line.
///
/// `{"Message":" Raw data was <raw> selection was <f0> and Data was : [0] <f0> | ..."}`
pub fn echo(out: &mut dyn Write, fields: &Fields<'_>) -> fmt::Result {
    out.write_str("{\"Message\":\" Raw data was ")?;
    write_escaped(out, fields.raw)?;
    out.write_str(" selection was ")?;
    write_escaped(out, fields.selector())?;
    out.write_str(" and Data was : ")?;
    for (i, f) in fields.iter().enumerate() {
        write!(out, "[{}] ", i)?;
        write_escaped(out, f)?;
        out.write_str(" | ")?;
    }
    out.write_str("\"}")?;
    finish(out)
}
