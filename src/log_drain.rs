//! Diagnostic log output.
//!
//! Drains a [`LogStream`] into a secondary sink: a TX-only UART on the
//! device, stderr in the host simulator. Never the protocol link.
//!
//! # Hardware Setup
//!
//! ```text
//! ESP32-S3 GPIO6 (TX) ──────▶ USB-UART RX
//!                              └─▶ PC Serial Monitor
//! ```

use core::fmt::Write;

use crate::logging::{LogEntry, LogStream};

/// Interval between dropped-message reports.
pub const DROPPED_REPORT_INTERVAL_MS: u32 = 10_000;

/// Format log entry to string.
///
/// Format: `[timestamp_ms] LEVEL: message\n`
fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl<'a> Write for BufWriter<'a> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            let remaining = self.buf.len() - self.pos;
            let to_write = bytes.len().min(remaining);
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            Ok(())
        }
    }

    let mut writer = BufWriter { buf, pos: 0 };

    let _ = write!(
        writer,
        "[{:10}] {}: {}\n",
        entry.timestamp_ms,
        entry.level.as_str(),
        core::str::from_utf8(&entry.msg[..entry.len as usize]).unwrap_or("<invalid utf8>")
    );

    writer.pos
}

/// Drains one stream into a sink, reporting drops now and then.
pub struct LogDrain {
    last_dropped_report_ms: u32,
}

impl LogDrain {
    pub const fn new() -> Self {
        Self {
            last_dropped_report_ms: 0,
        }
    }

    /// Write every pending entry to `sink`.
    ///
    /// Returns the number of entries written. Sink errors drop the entry.
    pub fn drain<const N: usize>(
        &mut self,
        stream: &LogStream<N>,
        sink: &mut dyn Write,
        now_ms: u32,
    ) -> usize {
        let mut format_buf = [0u8; 160];
        let mut written = 0;

        while let Some(entry) = stream.drain() {
            let len = format_log_entry(&entry, &mut format_buf);
            if let Ok(text) = core::str::from_utf8(&format_buf[..len]) {
                let _ = sink.write_str(text);
            }
            written += 1;
        }

        if now_ms.wrapping_sub(self.last_dropped_report_ms) >= DROPPED_REPORT_INTERVAL_MS {
            let dropped = stream.dropped();
            if dropped > 0 {
                let _ = write!(sink, "[WARN] Dropped: {}\n", dropped);
                stream.reset_dropped();
            }
            self.last_dropped_report_ms = now_ms;
        }

        written
    }
}

impl Default for LogDrain {
    fn default() -> Self {
        Self::new()
    }
}
