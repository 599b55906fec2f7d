//! Breakpoint tests
//!
//! Every script that stops at a breakpoint ends with a release, so the
//! spin loop always terminates.

use rust_live_probe::hal::sim::{ScriptedLink, SimBoard};
use rust_live_probe::session::{Mode, Session};
use rust_live_probe::watch::{Reporter, Watch};
use rust_live_probe::SessionConfig;

type TestSession = Session<ScriptedLink, SimBoard>;

struct Counter {
    count: i32,
}

impl Watch for Counter {
    fn variables(&mut self, report: &mut Reporter<'_>) {
        self.count = report.variable("count", self.count);
    }
}

fn session(script: &[&str]) -> TestSession {
    Session::with_config(
        ScriptedLink::with_script(script.iter().copied()),
        SimBoard::new(),
        SessionConfig::quiet(),
    )
}

fn records(session: &TestSession) -> Vec<String> {
    session
        .link()
        .records()
        .filter(|r| !r.starts_with("{\"Reset_LEDs\""))
        .map(String::from)
        .collect()
}

#[test]
fn test_breakpoint_waits_for_step() {
    let mut counter = Counter { count: 3 };
    let mut s = session(&["", "", "13,"]);

    s.breakpoint("loop top", &mut counter);

    assert_eq!(s.link().pending(), 0);
    assert_eq!(s.state().mode(), Mode::Running);
    assert!(!s.state().step_requested());
    assert_eq!(s.stats().breakpoints_hit, 1);
    assert_eq!(
        records(&s),
        [
            "{\"Breakpoint\":{\"id\":\"loop top\"}}",
            "{\"Variable\":{\"name\":\"|count|\",\"value\":3,\"type\":1}}",
        ]
    );
}

#[test]
fn test_breakpoint_announces_snapshot() {
    let mut s = session(&["13,"]);
    s.breakpoint("bp", &mut ());

    let all: Vec<&str> = s.link().records().collect();
    assert_eq!(all[0], "{\"Breakpoint\":{\"id\":\"bp\"}}");
    assert!(all[1].starts_with("{\"Reset_LEDs\""));
}

#[test]
fn test_step_before_breakpoint_is_latched() {
    let mut s = session(&["13,"]);
    while !s.service("Running", &mut ()) {}
    assert!(s.state().step_requested());

    // passes without input, then the latch is spent
    s.breakpoint("bp", &mut ());
    assert!(!s.state().step_requested());
    assert_eq!(s.link().pending(), 0);
}

#[test]
fn test_toggle_releases_and_disables() {
    let mut s = session(&["", "15,"]);

    s.breakpoint("first", &mut ());
    assert!(!s.state().breakpoints_enabled());

    // disabled: announces, then returns without waiting for input
    let reads = s.link().reads();
    s.breakpoint("second", &mut ());
    assert!(s.link().reads() <= reads + 1);

    assert_eq!(s.stats().breakpoints_hit, 2);
    assert_eq!(
        records(&s),
        [
            "{\"Breakpoint\":{\"id\":\"first\"}}",
            "{\"Breakpoint\":{\"id\":\"second\"}}",
        ]
    );
}

#[test]
fn test_toggle_twice_reenables() {
    let mut s = session(&["15,", "15,"]);
    while !s.service("Running", &mut ()) {}
    while !s.service("Running", &mut ()) {}

    assert!(s.state().breakpoints_enabled());
}

#[test]
fn test_sync_at_breakpoint_echoes_its_label() {
    let mut s = session(&["1,", "13,"]);
    s.breakpoint("after read", &mut ());

    let bp = "{\"Breakpoint\":{\"id\":\"after read\"}}";
    assert_eq!(records(&s).iter().filter(|r| *r == bp).count(), 2);
}

#[test]
fn test_variable_update_while_stopped() {
    let mut counter = Counter { count: 5 };
    let mut s = session(&["18,count,42,1,", "13,"]);

    s.breakpoint("bp", &mut counter);

    assert_eq!(counter.count, 42);
    assert!(s.state().pending_update().is_none());
}

#[test]
fn test_hold_survives_breakpoint() {
    let mut s = session(&["11,", "13,"]);
    s.breakpoint("bp", &mut ());

    assert_eq!(s.state().mode(), Mode::Held);
}

#[test]
fn test_conditional_breakpoint_false_is_silent() {
    let mut s = session(&[]);
    s.conditional_breakpoint(false, "never", &mut ());

    assert!(s.link().output().is_empty());
    assert_eq!(s.link().reads(), 0);
    assert_eq!(s.stats().breakpoints_hit, 0);
}

#[test]
fn test_conditional_breakpoint_true_stops() {
    let mut s = session(&["13,"]);
    s.conditional_breakpoint(true, "maybe", &mut ());

    assert_eq!(s.stats().breakpoints_hit, 1);
    assert_eq!(records(&s), ["{\"Breakpoint\":{\"id\":\"maybe\"}}"]);
}
