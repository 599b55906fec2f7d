//! Global log stream instance.
//!
//! The whole session runs on one thread of control, so a single stream
//! is enough. The drain lives wherever the board has spare time.

use crate::logging::LogStream;

/// Session log stream.
///
/// Producers: the session's poll loop and dispatcher.
/// Consumer: [`log_drain`](crate::log_drain) on the diagnostic sink.
pub static SESSION_LOG: LogStream = LogStream::new();
