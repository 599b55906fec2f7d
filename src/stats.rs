//! Link statistics for RustLiveProbe.
//!
//! Monotonic counters kept by the session. Nothing here ever stops the
//! device: a bad line or a failed write is counted and forgotten.

use core::fmt;

/// Counters since the session was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Non-blank lines read from the host.
    pub lines_received: u32,
    /// Lines rejected by the decoder.
    pub commands_ignored: u32,
    /// Records fully written to the link.
    pub records_sent: u32,
    /// Records whose write failed.
    pub write_errors: u32,
    /// Breakpoints announced.
    pub breakpoints_hit: u32,
}

impl LinkStats {
    /// Create zeroed counters.
    pub const fn new() -> Self {
        Self {
            lines_received: 0,
            commands_ignored: 0,
            records_sent: 0,
            write_errors: 0,
            breakpoints_hit: 0,
        }
    }

    /// Count the outcome of one record write.
    #[inline]
    pub fn track_record(&mut self, result: fmt::Result) {
        match result {
            Ok(()) => self.records_sent = self.records_sent.wrapping_add(1),
            Err(_) => self.write_errors = self.write_errors.wrapping_add(1),
        }
    }

    /// Get a snapshot of the counters.
    #[inline]
    pub fn snapshot(&self) -> LinkStats {
        *self
    }
}
