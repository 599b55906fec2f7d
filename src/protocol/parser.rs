//! Command line parser
//!
//! Simple split on [`FIELD_DELIMITER`], max [`MAX_FIELDS`] fields.
//! The host appends one framing character to the final field; it is
//! stripped here so handlers see clean values.

use heapless::Vec;

use crate::config::{FIELD_DELIMITER, MAX_FIELDS};

/// Parsed command line, borrowing from the raw text
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    /// The raw line as received (line ending removed)
    pub raw: &'a str,
    fields: Vec<&'a str, MAX_FIELDS>,
}

impl<'a> Fields<'a> {
    /// Get field by index (0 is the opcode)
    pub fn get(&self, idx: usize) -> Option<&'a str> {
        self.fields.get(idx).copied()
    }

    /// The opcode field
    pub fn selector(&self) -> &'a str {
        self.get(0).unwrap_or("")
    }

    /// Number of fields kept
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no field was kept
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over kept fields
    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.fields.iter().copied()
    }
}

/// Parse a command line into fields
pub fn parse_line(line: &str) -> Fields<'_> {
    let raw = line.trim_end_matches(['\r', '\n']);
    if raw.trim().is_empty() {
        return Fields { raw, fields: Vec::new() };
    }

    let total = raw.split(FIELD_DELIMITER).count();
    let mut fields: Vec<&str, MAX_FIELDS> = Vec::new();
    for part in raw.split(FIELD_DELIMITER).take(MAX_FIELDS) {
        // capacity is MAX_FIELDS and take() bounds the iterator
        let _ = fields.push(part);
    }

    if total <= MAX_FIELDS {
        if let Some(last) = fields.last_mut() {
            *last = strip_last_char(last);
        }
    }

    Fields { raw, fields }
}

fn strip_last_char(s: &str) -> &str {
    match s.char_indices().next_back() {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Lenient integer parse
///
/// Accepts an optional sign followed by leading digits; anything after
/// the digits is ignored ("42abc" is 42). Returns `None` when there are
/// no digits at all. Saturates instead of overflowing.
pub fn parse_int(s: &str) -> Option<i32> {
    parse_long(s).map(|n| n.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

/// [`parse_int`] at 64-bit width.
pub fn parse_long(s: &str) -> Option<i64> {
    const LIMIT: u64 = i64::MAX as u64 + 1;

    let s = s.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut magnitude: u64 = 0;
    let mut seen = false;
    for b in digits.bytes() {
        if !b.is_ascii_digit() {
            break;
        }
        seen = true;
        magnitude = magnitude
            .saturating_mul(10)
            .saturating_add((b - b'0') as u64)
            .min(LIMIT);
    }

    if !seen {
        return None;
    }

    Some(match (negative, magnitude) {
        (true, LIMIT) => i64::MIN,
        (true, m) => -(m as i64),
        (false, m) => m.min(i64::MAX as u64) as i64,
    })
}

/// Lenient float parse
///
/// Uses the longest numeric prefix ("3.5V" is 3.5).
pub fn parse_float(s: &str) -> Option<f32> {
    parse_decimal_prefix(s)
}

/// [`parse_float`] at double precision.
pub fn parse_double(s: &str) -> Option<f64> {
    parse_decimal_prefix(s)
}

fn parse_decimal_prefix<T: core::str::FromStr>(s: &str) -> Option<T> {
    let s = s.trim();
    let end = s
        .bytes()
        .position(|b| !(b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E')))
        .unwrap_or(s.len());

    let candidate = &s[..end];
    (1..=candidate.len())
        .rev()
        .find_map(|n| candidate[..n].parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_last_char() {
        assert_eq!(strip_last_char("temp|"), "temp");
        assert_eq!(strip_last_char(""), "");
        assert_eq!(strip_last_char("é"), "");
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int(" -7 "), Some(-7));
        assert_eq!(parse_int("12px"), Some(12));
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("99999999999"), Some(i32::MAX));
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float("3.5"), Some(3.5));
        assert_eq!(parse_float("3.5V"), Some(3.5));
        assert_eq!(parse_float("-0.25"), Some(-0.25));
        assert_eq!(parse_float("x"), None);
    }
}
