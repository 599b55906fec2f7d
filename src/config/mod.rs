//! Module: config
//!
//! Purpose: Session and link configuration for RustLiveProbe.
//!
//! Architecture:
//! - Wire constants are fixed: the host matches them byte-for-byte.
//! - [`SessionConfig`] holds the tunables a board may override at startup.
//! - [`LinkConfig`] holds UART settings used only by the device binary.
//!
//! Safety: plain `Copy` data, read by the single polling thread.

/// Version string (set by build.rs, includes git hash)
pub const VERSION: &str = env!("VERSION_STRING");

/// Separator between fields of an incoming command line.
pub const FIELD_DELIMITER: char = ',';

/// Marker appended to every outgoing record.
pub const RECORD_DELIMITER: &str = "&";

/// Full terminator written after every outgoing record.
pub const RECORD_TERMINATOR: &str = "&\r\n";

/// Side length of the square LED display.
pub const DISPLAY_SIZE: usize = 5;

/// Maximum incoming line length in bytes.
pub const LINE_SIZE: usize = 128;

/// Maximum length of a variable or sensor name.
pub const NAME_SIZE: usize = 32;

/// Maximum length of a raw pushed value.
pub const VALUE_SIZE: usize = 32;

/// Maximum number of fields kept from one command line.
pub const MAX_FIELDS: usize = 8;

/// Breakpoint label echoed on sync from the supervised loop.
pub const RUNNING_LABEL: &str = "Running";

/// Breakpoint label echoed on sync from inside a delay.
pub const PAUSE_LABEL: &str = "Running inside pause";

/// Default minimum spacing between protocol services.
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 25;

/// Spacing used while a high-rate sensor read is being reported.
pub const SLOW_POLL_INTERVAL_MS: u32 = 125;

/// Digital pin count of the reference board (P0..P20).
pub const DEFAULT_DIGITAL_PINS: u8 = 21;

/// Analog pin count of the reference board (P0..P2).
pub const DEFAULT_ANALOG_PINS: u8 = 3;

/// Tunables for one debug session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Initial minimum spacing between protocol services.
    pub poll_interval_ms: u32,

    /// Interval set by expensive or high-rate sensor reads.
    pub slow_poll_interval_ms: u32,

    /// Echo every received line back as a `Message` record.
    pub echo_received: bool,

    /// Valid digital pin indices are `0..digital_pins`.
    pub digital_pins: u8,

    /// Valid analog pin indices are `0..analog_pins`.
    pub analog_pins: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            slow_poll_interval_ms: SLOW_POLL_INTERVAL_MS,
            echo_received: true,
            digital_pins: DEFAULT_DIGITAL_PINS,
            analog_pins: DEFAULT_ANALOG_PINS,
        }
    }
}

impl SessionConfig {
    /// Config with diagnostic echo disabled.
    pub fn quiet() -> Self {
        Self {
            echo_received: false,
            ..Default::default()
        }
    }
}

/// UART configuration for the device binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkConfig {
    /// Baud rate of the protocol link.
    pub baud_rate: u32,
    /// Baud rate of the TX-only diagnostic log UART.
    pub log_baud_rate: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            log_baud_rate: 115200,
        }
    }
}
