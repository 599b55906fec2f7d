//! # RustLiveProbe
//!
//! Live debugging agent for microcontroller programs.
//!
//! ## Architecture
//!
//! The user program and the protocol share one thread of control. The
//! program hands control to a [`Session`] at supervised-loop boundaries,
//! inside delays and at breakpoints; the session services the serial link
//! there and nowhere else:
//!
//! ```text
//! host ──line──▶ parse ──▶ decode ──▶ SessionState ──▶ dispatch ──▶ board
//!                                                          │
//! host ◀──────────────── telemetry records ◀───────────────┘
//! ```
//!
//! - [`protocol`]: wire format, both directions
//! - [`session`]: the poll loop, state and dispatcher
//! - [`watch`]: hooks through which the program exposes its values
//! - [`hal`]: board traits, simulation board, ESP-IDF board
//!
//! Diagnostics go through [`logging`] to a separate sink, never the link.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod hal;
pub mod log_drain;
pub mod log_globals;
pub mod logging;
pub mod protocol;
pub mod session;
pub mod stats;
pub mod watch;

pub use config::{SessionConfig, VERSION};
pub use log_globals::SESSION_LOG;
pub use session::{Mode, Session, SessionState};
pub use stats::LinkStats;
pub use watch::{Reporter, Watch, WatchValue};
