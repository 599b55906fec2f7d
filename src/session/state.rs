//! Session state.
//!
//! One owned struct holds everything the host can change. Only the
//! session's dispatcher mutates it; the poll loop and the reporters read
//! it. A command is fully applied before the next record is written.

use crate::protocol::command::{Name, RawValue};
use crate::protocol::Command;
use crate::watch::ValueType;

/// Coarse execution mode seen by the host.
///
/// Whether breakpoints are enabled is orthogonal and reported by
/// [`SessionState::breakpoints_enabled`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// User code runs between polls.
    Running,
    /// Held by the host in the supervised loop.
    Held,
    /// Blocked at a breakpoint until a step.
    AwaitingStep,
}

/// Which sensor, if any, is reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SensorSelector {
    /// Nothing selected yet.
    None,
    /// Report every sensor's name only.
    EnumerateNames,
    /// Report the full record of this sensor only.
    Named(Name),
}

/// A value pushed by the host, waiting for its variable's next report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingUpdate {
    pub name: Name,
    pub value: RawValue,
    /// Type code the host sent. The report call's own type wins.
    pub declared: Option<ValueType>,
}

/// Mutable session state.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    held: bool,
    step_requested: bool,
    breakpoints_disabled: bool,
    at_breakpoint: bool,
    selector: SensorSelector,
    pending: Option<PendingUpdate>,
    current: Command,
    previous: Command,
    poll_interval_ms: u32,
    last_poll_ms: u32,
}

impl SessionState {
    /// Fresh state: running, nothing selected.
    pub fn new(poll_interval_ms: u32) -> Self {
        Self {
            held: false,
            step_requested: false,
            breakpoints_disabled: false,
            at_breakpoint: false,
            selector: SensorSelector::None,
            pending: None,
            current: Command::Idle,
            previous: Command::Idle,
            poll_interval_ms,
            last_poll_ms: 0,
        }
    }

    /// Current mode. A breakpoint wait outranks a hold.
    pub fn mode(&self) -> Mode {
        if self.at_breakpoint {
            Mode::AwaitingStep
        } else if self.held {
            Mode::Held
        } else {
            Mode::Running
        }
    }

    #[inline]
    pub fn is_held(&self) -> bool {
        self.held
    }

    #[inline]
    pub fn breakpoints_enabled(&self) -> bool {
        !self.breakpoints_disabled
    }

    /// A step is latched and will release the next breakpoint wait.
    #[inline]
    pub fn step_requested(&self) -> bool {
        self.step_requested
    }

    #[inline]
    pub fn selector(&self) -> &SensorSelector {
        &self.selector
    }

    #[inline]
    pub fn pending_update(&self) -> Option<&PendingUpdate> {
        self.pending.as_ref()
    }

    /// Command re-dispatched on polls without new input.
    #[inline]
    pub fn last_command(&self) -> &Command {
        &self.current
    }

    /// Command that was current before the last line arrived.
    #[inline]
    pub fn previous_command(&self) -> &Command {
        &self.previous
    }

    #[inline]
    pub fn poll_interval_ms(&self) -> u32 {
        self.poll_interval_ms
    }

    #[inline]
    pub fn last_poll_ms(&self) -> u32 {
        self.last_poll_ms
    }

    /// True once `poll_interval_ms` has elapsed since the last service.
    #[inline]
    pub fn poll_due(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.last_poll_ms) >= self.poll_interval_ms
    }

    /// Consume the pending update if it names `name` exactly.
    pub fn take_update_for(&mut self, name: &str) -> Option<PendingUpdate> {
        match &self.pending {
            Some(update) if update.name.as_str() == name => self.pending.take(),
            _ => None,
        }
    }

    // --- Mutators (dispatcher and poll loop only) ---

    /// Record a freshly decoded command.
    pub(crate) fn accept(&mut self, cmd: Command) {
        self.previous = core::mem::replace(&mut self.current, cmd);
    }

    /// Resume the command that was current before this one.
    pub(crate) fn restore_previous(&mut self) {
        self.current = self.previous.clone();
    }

    /// Do not repeat the current command.
    pub(crate) fn settle(&mut self) {
        self.current = Command::Idle;
    }

    pub(crate) fn set_held(&mut self, held: bool) {
        self.held = held;
    }

    pub(crate) fn request_step(&mut self) {
        self.step_requested = true;
    }

    pub(crate) fn toggle_breakpoints(&mut self) {
        self.breakpoints_disabled = !self.breakpoints_disabled;
    }

    pub(crate) fn set_selector(&mut self, selector: SensorSelector) {
        self.selector = selector;
    }

    pub(crate) fn set_pending(&mut self, update: PendingUpdate) {
        self.pending = Some(update);
    }

    pub(crate) fn set_poll_interval(&mut self, ms: u32) {
        self.poll_interval_ms = ms;
    }

    pub(crate) fn stamp_poll(&mut self, now_ms: u32) {
        self.last_poll_ms = now_ms;
    }

    pub(crate) fn enter_breakpoint(&mut self) {
        self.at_breakpoint = true;
    }

    /// Leave a breakpoint wait; the next breakpoint blocks again.
    pub(crate) fn leave_breakpoint(&mut self) {
        self.at_breakpoint = false;
        self.step_requested = false;
    }

    /// True when a breakpoint wait should end.
    #[inline]
    pub(crate) fn breakpoint_released(&self) -> bool {
        self.step_requested || self.breakpoints_disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = SessionState::new(25);
        assert_eq!(state.mode(), Mode::Running);
        assert!(state.breakpoints_enabled());
        assert_eq!(state.selector(), &SensorSelector::None);
        assert_eq!(state.last_command(), &Command::Idle);
        assert!(state.pending_update().is_none());
    }

    #[test]
    fn test_mode_priority() {
        let mut state = SessionState::new(25);
        state.set_held(true);
        assert_eq!(state.mode(), Mode::Held);
        state.enter_breakpoint();
        assert_eq!(state.mode(), Mode::AwaitingStep);
        state.leave_breakpoint();
        assert_eq!(state.mode(), Mode::Held);
    }

    #[test]
    fn test_accept_and_restore() {
        let mut state = SessionState::new(25);
        state.accept(Command::Light);
        state.accept(Command::Hold);
        assert_eq!(state.previous_command(), &Command::Light);

        state.restore_previous();
        assert_eq!(state.last_command(), &Command::Light);
    }

    #[test]
    fn test_poll_due_wraps() {
        let mut state = SessionState::new(25);
        state.stamp_poll(u32::MAX - 10);
        assert!(!state.poll_due(u32::MAX));
        assert!(state.poll_due(14));
    }

    #[test]
    fn test_take_update_exact_name() {
        let mut state = SessionState::new(25);
        state.set_pending(PendingUpdate {
            name: crate::protocol::command::bounded("x"),
            value: crate::protocol::command::bounded("42"),
            declared: Some(ValueType::Integer),
        });

        assert!(state.take_update_for("xy").is_none());
        assert!(state.take_update_for("x").is_some());
        assert!(state.take_update_for("x").is_none());
    }
}
