//! Watched variables and sensors.
//!
//! The user program exposes its own state through the [`Watch`] hooks.
//! Each hook receives a [`Reporter`] and calls [`Reporter::variable`] or
//! [`Reporter::sensor`] once per value it wants the host to see.
//!
//! # Example
//!
//! ```
//! use rust_live_probe::watch::{Reporter, Watch};
//!
//! struct Counter {
//!     count: i32,
//!     celsius: f32,
//! }
//!
//! impl Watch for Counter {
//!     fn variables(&mut self, report: &mut Reporter<'_>) {
//!         // The host may overwrite `count`; the returned value wins.
//!         self.count = report.variable("count", self.count);
//!     }
//!
//!     fn sensors(&mut self, report: &mut Reporter<'_>) {
//!         report.sensor("temp", self.celsius);
//!     }
//! }
//! ```

use core::fmt::{self, Write};

use heapless::String;

use crate::protocol::parser::{parse_double, parse_float, parse_long};
use crate::protocol::telemetry;
use crate::session::state::{SensorSelector, SessionState};
use crate::stats::LinkStats;

/// Type code carried by variable and sensor records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ValueType {
    /// Whole number.
    Integer = 1,
    /// Decimal number.
    Decimal = 2,
    /// Text.
    String = 3,
    /// `true` / `false`.
    Boolean = 4,
}

impl ValueType {
    /// Convert from the wire code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ValueType::Integer),
            2 => Some(ValueType::Decimal),
            3 => Some(ValueType::String),
            4 => Some(ValueType::Boolean),
            _ => None,
        }
    }

    /// Wire code.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// A value that can be reported to, and overwritten by, the host.
pub trait WatchValue: Sized {
    /// Type code sent with every record of this value.
    const TYPE: ValueType;

    /// Coerce raw text pushed by the host. Malformed text reads as zero.
    fn from_raw(raw: &str) -> Self;

    /// Write the value as it appears in a record.
    fn write_value(&self, out: &mut dyn Write) -> fmt::Result;
}

macro_rules! integer_watch_value {
    ($($t:ty),*) => {$(
        impl WatchValue for $t {
            const TYPE: ValueType = ValueType::Integer;

            fn from_raw(raw: &str) -> Self {
                let n = parse_long(raw).unwrap_or(0);
                n.clamp(<$t>::MIN as i64, <$t>::MAX as i64) as $t
            }

            fn write_value(&self, out: &mut dyn Write) -> fmt::Result {
                write!(out, "{}", self)
            }
        }
    )*};
}

integer_watch_value!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! decimal_watch_value {
    ($($t:ty => $parse:ident),*) => {$(
        impl WatchValue for $t {
            const TYPE: ValueType = ValueType::Decimal;

            fn from_raw(raw: &str) -> Self {
                $parse(raw).unwrap_or(0.0)
            }

            fn write_value(&self, out: &mut dyn Write) -> fmt::Result {
                if self.is_finite() {
                    write!(out, "{}", self)
                } else {
                    out.write_str("null")
                }
            }
        }
    )*};
}

decimal_watch_value!(f32 => parse_float, f64 => parse_double);

impl WatchValue for bool {
    const TYPE: ValueType = ValueType::Boolean;

    fn from_raw(raw: &str) -> Self {
        raw.trim() == "true"
    }

    fn write_value(&self, out: &mut dyn Write) -> fmt::Result {
        out.write_str(if *self { "true" } else { "false" })
    }
}

impl<const N: usize> WatchValue for String<N> {
    const TYPE: ValueType = ValueType::String;

    fn from_raw(raw: &str) -> Self {
        crate::protocol::command::bounded(raw)
    }

    fn write_value(&self, out: &mut dyn Write) -> fmt::Result {
        telemetry::write_json_str(out, self.as_str())
    }
}

/// Hooks the user program implements to expose its state.
///
/// Both default to doing nothing, so a program without watched values
/// can pass `&mut ()`.
pub trait Watch {
    /// Report every watched variable (prepare variable data).
    fn variables(&mut self, report: &mut Reporter<'_>) {
        let _ = report;
    }

    /// Report every sensor (prepare sensor data).
    fn sensors(&mut self, report: &mut Reporter<'_>) {
        let _ = report;
    }
}

impl Watch for () {}

/// Handle given to the [`Watch`] hooks for one report pass.
pub struct Reporter<'a> {
    out: &'a mut dyn Write,
    state: &'a mut SessionState,
    stats: &'a mut LinkStats,
}

impl<'a> Reporter<'a> {
    pub(crate) fn new(
        out: &'a mut dyn Write,
        state: &'a mut SessionState,
        stats: &'a mut LinkStats,
    ) -> Self {
        Self { out, state, stats }
    }

    /// Report a variable, or take the value the host pushed for it.
    ///
    /// If a pending update names this variable, the update is consumed
    /// and its raw text is coerced to `T`; nothing is written. Otherwise
    /// a `Variable` record is written and `current` comes back unchanged.
    pub fn variable<T: WatchValue>(&mut self, name: &str, current: T) -> T {
        if let Some(update) = self.state.take_update_for(name) {
            return T::from_raw(update.value.as_str());
        }

        let result = telemetry::variable(self.out, name, &current);
        self.stats.track_record(result);
        current
    }

    /// Report a sensor reading.
    ///
    /// Writes only the name while the host is enumerating sensors, the
    /// full record when this sensor is selected, and nothing otherwise.
    pub fn sensor<T: WatchValue>(&mut self, name: &str, value: T) {
        let result = match self.state.selector() {
            SensorSelector::EnumerateNames => telemetry::sensor_name(self.out, name),
            SensorSelector::Named(selected) if selected.as_str() == name => {
                telemetry::sensor_value(self.out, name, &value)
            }
            _ => return,
        };
        self.stats.track_record(result);
    }
}
