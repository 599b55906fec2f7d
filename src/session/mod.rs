//! Debug session: the cooperative poll loop.
//!
//! There is one thread of control, shared by the user program and the
//! protocol. The user program hands control to the session at three
//! kinds of points:
//!
//! - [`Session::run_supervised`]: the outer loop around one user step
//! - [`Session::yield_for`]: a delay that keeps the link serviced
//! - [`Session::breakpoint`]: a named stop released by the host
//!
//! Every one of them ends up in the throttled protocol service: write a
//! display snapshot, read at most one line, apply it, re-dispatch the
//! sticky command. Waits are literal spin loops around that service;
//! there is no timeout, a human releases holds and breakpoints.
//!
//! # Example
//!
//! ```
//! use rust_live_probe::hal::sim::{ScriptedLink, SimBoard};
//! use rust_live_probe::session::Session;
//!
//! let link = ScriptedLink::with_script(["4,2,1,"]);
//! let mut session = Session::new(link, SimBoard::new());
//!
//! // Wait 100 ms of board time while serving the host.
//! session.yield_for(100, &mut ());
//! assert_eq!(session.board().digital[2], 1);
//! ```

mod dispatch;
pub mod state;

pub use state::{Mode, PendingUpdate, SensorSelector, SessionState};

use crate::config::{SessionConfig, PAUSE_LABEL, RUNNING_LABEL};
use crate::hal::{Board, Link};
use crate::log_globals::SESSION_LOG;
use crate::protocol::{decode, parse_line, telemetry, Command, LineBuffer};
use crate::stats::LinkStats;
use crate::watch::{Reporter, Watch};
use crate::{probe_debug, probe_info, probe_trace, probe_warn};

/// One debug session over one link.
pub struct Session<L: Link, B: Board> {
    link: L,
    board: B,
    config: SessionConfig,
    state: SessionState,
    stats: LinkStats,
    line: LineBuffer,
    /// Last clock reading, used to timestamp log entries.
    now_ms: u32,
}

impl<L: Link, B: Board> Session<L, B> {
    /// Create a session with the default configuration.
    pub fn new(link: L, board: B) -> Self {
        Self::with_config(link, board, SessionConfig::default())
    }

    /// Create a session with an explicit configuration.
    pub fn with_config(link: L, board: B, config: SessionConfig) -> Self {
        Self {
            link,
            board,
            config,
            state: SessionState::new(config.poll_interval_ms),
            stats: LinkStats::new(),
            line: LineBuffer::new(),
            now_ms: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stats(&self) -> LinkStats {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    /// Split back into link and board.
    pub fn into_parts(self) -> (L, B) {
        (self.link, self.board)
    }

    // --- Entry points ---

    /// Run the user program under supervision, forever.
    ///
    /// Each cycle reports the watched variables, spins while the host
    /// holds execution, then runs `step` once. `step` must return so
    /// the link is serviced between cycles.
    pub fn run_supervised<W, F>(&mut self, watch: &mut W, mut step: F) -> !
    where
        W: Watch,
        F: FnMut(&mut Self, &mut W),
    {
        loop {
            self.run_cycle(watch, &mut step);
        }
    }

    /// One cycle of [`run_supervised`](Self::run_supervised).
    pub fn run_cycle<W, F>(&mut self, watch: &mut W, step: F)
    where
        W: Watch,
        F: FnOnce(&mut Self, &mut W),
    {
        self.report_variables(watch);
        loop {
            self.service(RUNNING_LABEL, watch);
            if !self.state.is_held() {
                break;
            }
        }
        step(self, watch);
    }

    /// Drop-in replacement for a blocking delay.
    ///
    /// Services the link once immediately, then spins until the deadline
    /// servicing it at the poll interval.
    pub fn yield_for(&mut self, duration_ms: u32, watch: &mut dyn Watch) {
        let start = self.now();

        self.report_variables(watch);
        self.service_at(start, PAUSE_LABEL, watch);

        loop {
            let now = self.now();
            if !within(start, now, duration_ms) {
                break;
            }
            if self.state.poll_due(now) {
                self.service_at(now, PAUSE_LABEL, watch);
            }
        }
    }

    /// Stop at a named breakpoint until the host steps past it.
    ///
    /// Announces the breakpoint with a breakpoint record, a display
    /// snapshot and the watched variables, then spins servicing the link
    /// until a step is latched or breakpoints are disabled. The step is
    /// consumed on return, so the next breakpoint blocks again.
    pub fn breakpoint(&mut self, label: &str, watch: &mut dyn Watch) {
        self.stats.breakpoints_hit = self.stats.breakpoints_hit.wrapping_add(1);
        probe_info!(SESSION_LOG, self.now_ms, "breakpoint {}", label);

        let result = telemetry::breakpoint(&mut self.link, label);
        self.stats.track_record(result);
        self.send_snapshot();
        self.report_variables(watch);

        self.state.enter_breakpoint();
        loop {
            self.service(label, watch);
            if self.state.breakpoint_released() {
                break;
            }
        }
        self.state.leave_breakpoint();
    }

    /// [`breakpoint`](Self::breakpoint) when `condition` holds, else nothing.
    pub fn conditional_breakpoint(&mut self, condition: bool, label: &str, watch: &mut dyn Watch) {
        if condition {
            self.breakpoint(label, watch);
        }
    }

    // --- Reporting ---

    /// Run the variables hook.
    pub fn report_variables(&mut self, watch: &mut dyn Watch) {
        let mut reporter = Reporter::new(&mut self.link, &mut self.state, &mut self.stats);
        watch.variables(&mut reporter);
    }

    /// Run the sensors hook.
    pub fn report_sensors(&mut self, watch: &mut dyn Watch) {
        let mut reporter = Reporter::new(&mut self.link, &mut self.state, &mut self.stats);
        watch.sensors(&mut reporter);
    }

    /// Write the display snapshot record.
    pub fn send_snapshot(&mut self) {
        let result = telemetry::display_snapshot(&mut self.link, &self.board);
        self.stats.track_record(result);
    }

    // --- Protocol service ---

    /// Service the link if the poll interval has elapsed.
    ///
    /// Returns `true` when work was done.
    pub fn service(&mut self, label: &str, watch: &mut dyn Watch) -> bool {
        let now = self.now();
        if !self.state.poll_due(now) {
            return false;
        }
        self.service_at(now, label, watch);
        true
    }

    /// Snapshot, read, apply, re-dispatch, stamp.
    fn service_at(&mut self, now: u32, label: &str, watch: &mut dyn Watch) {
        self.send_snapshot();

        self.line.clear();
        if self.link.read_line(&mut self.line) && !self.line.is_blank() {
            self.receive();
        }

        self.dispatch(label, watch);
        self.state.stamp_poll(now);
    }

    /// Decode the buffered line and make it the current command.
    fn receive(&mut self) {
        self.stats.lines_received = self.stats.lines_received.wrapping_add(1);

        let fields = parse_line(self.line.as_str());
        probe_trace!(SESSION_LOG, self.now_ms, "rx {}", fields.raw);
        if self.config.echo_received {
            let result = telemetry::echo(&mut self.link, &fields);
            self.stats.track_record(result);
        }

        let cmd = match decode(&fields) {
            Ok(cmd) => {
                probe_debug!(SESSION_LOG, self.now_ms, "decoded {:?}", cmd.opcode());
                cmd
            }
            Err(e) => {
                self.stats.commands_ignored = self.stats.commands_ignored.wrapping_add(1);
                probe_warn!(SESSION_LOG, self.now_ms, "ignored '{}': {}", fields.raw, e);
                Command::Ignored
            }
        };

        self.state.accept(cmd);
    }

    fn now(&mut self) -> u32 {
        self.now_ms = self.board.now_ms();
        self.now_ms
    }
}

/// Less than `duration_ms` has passed between `start` and `now` on the
/// wrapping millisecond clock.
#[inline]
fn within(start: u32, now: u32, duration_ms: u32) -> bool {
    now.wrapping_sub(start) < duration_ms
}
