//! Non-blocking diagnostic logging for RustLiveProbe.
//!
//! # Architecture
//!
//! ```text
//! Poll loop               LogStream            Drain
//! ─────────               ─────────            ─────
//!
//! probe_log!() ────────▶ [L0][L1][L2] ──────▶ log UART / stderr
//! stack buffer            lock-free           blocking ok
//! never blocks            ring buffer         at leisure
//! ```
//!
//! # Rules
//!
//! - Diagnostics never go onto the protocol link: the host parses every
//!   line it receives there.
//! - Pushing never blocks and never allocates.
//! - Log messages may be dropped if the ring is full; drops are counted.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 96;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Session clock in milliseconds.
    pub timestamp_ms: u32,
    /// Log level.
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl Default for LogEntry {
    fn default() -> Self {
        Self {
            timestamp_ms: 0,
            level: LogLevel::Info,
            len: 0,
            msg: [0; MAX_MSG_LEN],
        }
    }
}

/// Lock-free log stream (multiple producers, single consumer).
///
/// - Any context can push (slots reserved via compare-exchange on write_idx)
/// - A slot becomes visible to the drain only once its sequence number
///   is published, after the entry is written
/// - Push never blocks (drops message if full)
/// - Drain runs wherever the board has time for blocking I/O
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    /// Per slot: reservation index + 1 of the entry last written there.
    ready: [AtomicU32; N],
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: Multiple producers each own the slot they reserved until they
// publish it through `ready`; the single consumer reads a slot only after
// observing that publication, and frees it through `read_idx`.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

#[allow(clippy::declare_interior_mutable_const)]
const UNPUBLISHED: AtomicU32 = AtomicU32::new(0);

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    /// Create a new empty log stream.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        Self {
            entries: UnsafeCell::new([LogEntry {
                timestamp_ms: 0,
                level: LogLevel::Info,
                len: 0,
                msg: [0; MAX_MSG_LEN],
            }; N]),
            ready: [UNPUBLISHED; N],
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push a log entry (never blocks).
    ///
    /// Returns `true` if message was queued, `false` if dropped (ring full).
    #[inline]
    pub fn push(&self, timestamp_ms: u32, level: LogLevel, msg: &[u8]) -> bool {
        // Reserve a slot; a full ring leaves write_idx untouched
        let mut write = self.write_idx.load(Ordering::Acquire);
        loop {
            let read = self.read_idx.load(Ordering::Acquire);
            if write.wrapping_sub(read) >= N as u32 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            match self.write_idx.compare_exchange_weak(
                write,
                write.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(current) => write = current,
            }
        }

        let idx = (write as usize) & Self::MASK;

        // SAFETY: the compare-exchange above hands each producer a unique
        // index, the ring-full check guarantees the drain is done with this
        // slot, and the drain will not touch it until `ready` is published.
        unsafe {
            let entry = &mut (*self.entries.get())[idx];
            entry.timestamp_ms = timestamp_ms;
            entry.level = level;
            entry.len = msg.len().min(MAX_MSG_LEN) as u8;
            entry.msg[..entry.len as usize].copy_from_slice(&msg[..entry.len as usize]);
        }
        self.ready[idx].store(write.wrapping_add(1), Ordering::Release);

        true
    }

    /// Drain next log entry (single consumer).
    ///
    /// Returns `None` if no entries available, or if the oldest reserved
    /// entry is still being written.
    #[inline]
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let idx = (read as usize) & Self::MASK;

        if self.ready[idx].load(Ordering::Acquire) != read.wrapping_add(1) {
            return None;
        }

        // SAFETY: Single consumer; the Acquire load above pairs with the
        // producer's Release store made after the entry was written.
        let entry = unsafe { (*self.entries.get())[idx] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset dropped counter (e.g., after reporting).
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Check if there are entries to drain.
    #[inline]
    pub fn has_entries(&self) -> bool {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        read != write
    }

    /// Get number of entries waiting to be drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a message into a buffer.
///
/// Returns the number of bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    use core::fmt::Write;

    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl<'a> Write for BufWriter<'a> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            let remaining = self.buf.len() - self.pos;
            let mut to_write = bytes.len().min(remaining);
            // Never split a character: the drain decodes entries as UTF-8
            while to_write < bytes.len() && !s.is_char_boundary(to_write) {
                to_write -= 1;
            }
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            Ok(())
        }
    }

    let mut writer = BufWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// Log macro.
///
/// Formats into a stack buffer and pushes to the given stream. Use this
/// instead of writing diagnostics anywhere near the protocol link.
///
/// # Example
///
/// ```ignore
/// probe_log!(LogLevel::Info, SESSION_LOG, now_ms, "hold {}", held);
/// ```
#[macro_export]
macro_rules! probe_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $stream.push($timestamp, $level, &buf[..len]);
    }};
}

/// Info log.
#[macro_export]
macro_rules! probe_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::probe_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

/// Warning log.
#[macro_export]
macro_rules! probe_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::probe_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

/// Error log.
#[macro_export]
macro_rules! probe_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::probe_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

/// Debug log.
#[macro_export]
macro_rules! probe_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::probe_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}

/// Trace log (maximum verbosity).
#[macro_export]
macro_rules! probe_trace {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::probe_log!($crate::logging::LogLevel::Trace, $stream, $timestamp, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_stream_basic() {
        let stream = LogStream::<16>::new();

        assert!(stream.push(1000, LogLevel::Info, b"hold on"));
        assert!(stream.has_entries());
        assert_eq!(stream.pending(), 1);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.timestamp_ms, 1000);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(&entry.msg[..entry.len as usize], b"hold on");

        assert!(!stream.has_entries());
    }

    #[test]
    fn test_log_stream_full_keeps_old_entries() {
        let stream = LogStream::<4>::new();

        assert!(stream.push(1, LogLevel::Info, b"1"));
        assert!(stream.push(2, LogLevel::Info, b"2"));
        assert!(stream.push(3, LogLevel::Info, b"3"));
        assert!(stream.push(4, LogLevel::Info, b"4"));

        // Should drop without consuming a slot
        assert!(!stream.push(5, LogLevel::Info, b"5"));
        assert_eq!(stream.dropped(), 1);
        assert_eq!(stream.pending(), 4);

        let first = stream.drain().unwrap();
        assert_eq!(first.timestamp_ms, 1);
        assert!(stream.push(6, LogLevel::Info, b"6"));

        let order: Vec<u32> = core::iter::from_fn(|| stream.drain())
            .map(|e| e.timestamp_ms)
            .collect();
        assert_eq!(order, [2, 3, 4, 6]);
    }

    #[test]
    fn test_reserved_slot_waits_for_publish() {
        let stream = LogStream::<4>::new();

        // slot 0 reserved by a producer that has not written it yet
        stream.write_idx.store(1, Ordering::Release);
        assert!(stream.has_entries());
        assert!(stream.drain().is_none());

        unsafe {
            let entry = &mut (*stream.entries.get())[0];
            entry.timestamp_ms = 9;
            entry.len = 3;
            entry.msg[..3].copy_from_slice(b"rx ");
        }
        stream.ready[0].store(1, Ordering::Release);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.timestamp_ms, 9);
        assert_eq!(&entry.msg[..entry.len as usize], b"rx ");
        assert!(stream.drain().is_none());
    }

    #[test]
    fn test_stale_slot_not_drained_after_wrap() {
        let stream = LogStream::<4>::new();

        for t in 0..4 {
            assert!(stream.push(t, LogLevel::Info, b"x"));
            assert!(stream.drain().is_some());
        }

        // slot 0 still holds the first lap's entry
        stream.write_idx.store(5, Ordering::Release);
        assert!(stream.drain().is_none());
    }

    #[test]
    fn test_concurrent_drain_sees_whole_entries() {
        use std::sync::Arc;
        use std::thread;

        let stream = Arc::new(LogStream::<8>::new());
        let producer = {
            let stream = Arc::clone(&stream);
            thread::spawn(move || {
                for t in 0..2000u32 {
                    while !stream.push(t, LogLevel::Debug, format!("seq {}", t).as_bytes()) {
                        thread::yield_now();
                    }
                }
            })
        };

        let mut next = 0u32;
        while next < 2000 {
            match stream.drain() {
                Some(entry) => {
                    assert_eq!(entry.timestamp_ms, next);
                    let expected = format!("seq {}", next);
                    assert_eq!(&entry.msg[..entry.len as usize], expected.as_bytes());
                    next += 1;
                }
                None => thread::yield_now(),
            }
        }
        producer.join().unwrap();
    }

    #[test]
    fn test_format_to_buffer() {
        let mut buf = [0u8; 32];
        let len = format_to_buffer(&mut buf, format_args!("pin {} high", 2));
        assert_eq!(&buf[..len], b"pin 2 high");
    }

    #[test]
    fn test_format_to_buffer_keeps_utf8_whole() {
        let mut buf = [0u8; 4];
        let len = format_to_buffer(&mut buf, format_args!("abcé"));
        assert_eq!(&buf[..len], b"abc");
    }

    #[test]
    fn test_log_macro_pushes() {
        let stream = LogStream::<8>::new();
        crate::probe_warn!(stream, 77, "ignored {}", "D02");

        let entry = stream.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(&entry.msg[..entry.len as usize], b"ignored D02");
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn test_multiple_producers() {
        use std::sync::Arc;
        use std::thread;

        let stream = Arc::new(LogStream::<64>::new());
        let mut handles = vec![];

        for i in 0..4 {
            let stream = Arc::clone(&stream);
            handles.push(thread::spawn(move || {
                for j in 0..10 {
                    let msg = format!("producer {} msg {}", i, j);
                    stream.push(j, LogLevel::Info, msg.as_bytes());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let mut count = 0;
        while stream.drain().is_some() {
            count += 1;
        }
        assert_eq!(count, 40, "All messages should be present");
    }
}
