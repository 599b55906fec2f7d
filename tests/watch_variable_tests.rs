//! Watched variable and sensor reporting tests

use heapless::String as HString;
use rust_live_probe::hal::sim::{ScriptedLink, SimBoard};
use rust_live_probe::session::{SensorSelector, Session};
use rust_live_probe::watch::{Reporter, ValueType, Watch, WatchValue};
use rust_live_probe::SessionConfig;

type TestSession = Session<ScriptedLink, SimBoard>;

fn session(script: &[&str]) -> TestSession {
    Session::with_config(
        ScriptedLink::with_script(script.iter().copied()),
        SimBoard::new(),
        SessionConfig::quiet(),
    )
}

fn poll(session: &mut TestSession, watch: &mut dyn Watch) {
    while !session.service("test", watch) {}
}

fn records(session: &TestSession) -> Vec<String> {
    session
        .link()
        .records()
        .filter(|r| !r.starts_with("{\"Reset_LEDs\""))
        .map(String::from)
        .collect()
}

/// Reports a fixed value and remembers what every report call returned.
struct Fixed {
    current: i32,
    seen: Vec<i32>,
}

impl Watch for Fixed {
    fn variables(&mut self, report: &mut Reporter<'_>) {
        let v = report.variable("x", self.current);
        self.seen.push(v);
    }
}

#[test]
fn test_update_is_returned_exactly_once() {
    let mut fixed = Fixed { current: 5, seen: Vec::new() };
    let mut s = session(&["18,x,42,1,"]);

    poll(&mut s, &mut fixed);
    assert_eq!(fixed.seen, [42]);
    assert!(s.state().pending_update().is_none());

    s.report_variables(&mut fixed);
    assert_eq!(fixed.seen, [42, 5]);
}

#[test]
fn test_consumed_update_writes_no_record() {
    let mut fixed = Fixed { current: 5, seen: Vec::new() };
    let mut s = session(&["18,x,42,1,"]);

    poll(&mut s, &mut fixed);
    assert!(records(&s).is_empty());

    s.report_variables(&mut fixed);
    assert_eq!(
        records(&s),
        ["{\"Variable\":{\"name\":\"|x|\",\"value\":5,\"type\":1}}"]
    );
}

struct Mixed {
    ratio: f32,
    flag: bool,
    label: HString<16>,
    level: u8,
}

impl Watch for Mixed {
    fn variables(&mut self, report: &mut Reporter<'_>) {
        self.ratio = report.variable("ratio", self.ratio);
        self.flag = report.variable("flag", self.flag);
        self.label = report.variable("label", self.label.clone());
        self.level = report.variable("level", self.level);
    }
}

fn mixed() -> Mixed {
    Mixed {
        ratio: 0.0,
        flag: false,
        label: HString::new(),
        level: 1,
    }
}

#[test]
fn test_update_coerces_to_reported_type() {
    let mut m = mixed();
    let mut s = session(&[
        "18,ratio,2.5,2,",
        "18,flag,true,4,",
        "18,label,hello,3,",
        "18,level,300,1,",
    ]);

    for _ in 0..4 {
        poll(&mut s, &mut m);
    }

    assert_eq!(m.ratio, 2.5);
    assert!(m.flag);
    assert_eq!(m.label.as_str(), "hello");
    // clamped to the variable's own range
    assert_eq!(m.level, 255);
}

struct Wide {
    precise: f64,
    big: i64,
    count: u32,
}

impl Watch for Wide {
    fn variables(&mut self, report: &mut Reporter<'_>) {
        self.precise = report.variable("precise", self.precise);
        self.big = report.variable("big", self.big);
        self.count = report.variable("count", self.count);
    }
}

#[test]
fn test_update_keeps_double_precision() {
    let mut w = Wide { precise: 0.0, big: 0, count: 0 };
    let mut s = session(&["18,precise,0.1,2,"]);

    poll(&mut s, &mut w);
    assert_eq!(w.precise, 0.1);
}

#[test]
fn test_update_beyond_32_bits() {
    let mut w = Wide { precise: 0.0, big: 0, count: 0 };
    let mut s = session(&["18,big,5000000000,1,", "18,count,4000000000,1,", "18,big,-5000000000,1,"]);

    poll(&mut s, &mut w);
    assert_eq!(w.big, 5_000_000_000);

    poll(&mut s, &mut w);
    assert_eq!(w.count, 4_000_000_000);

    poll(&mut s, &mut w);
    assert_eq!(w.big, -5_000_000_000);
}

#[test]
fn test_malformed_update_reads_zero() {
    let mut m = mixed();
    m.level = 9;
    let mut s = session(&["18,level,abc,1,"]);

    poll(&mut s, &mut m);
    assert_eq!(m.level, 0);
}

#[test]
fn test_reported_type_wins_over_declared() {
    let mut m = mixed();
    // declared as a string, reported as a number
    let mut s = session(&["18,level,7,3,"]);

    poll(&mut s, &mut m);
    assert_eq!(m.level, 7);
}

#[test]
fn test_variable_records_carry_type_codes() {
    let mut m = mixed();
    m.label = HString::try_from("a\"b").unwrap();
    let mut s = session(&[]);

    s.report_variables(&mut m);

    assert_eq!(
        records(&s),
        [
            "{\"Variable\":{\"name\":\"|ratio|\",\"value\":0,\"type\":2}}",
            "{\"Variable\":{\"name\":\"|flag|\",\"value\":false,\"type\":4}}",
            "{\"Variable\":{\"name\":\"|label|\",\"value\":\"a\\\"b\",\"type\":3}}",
            "{\"Variable\":{\"name\":\"|level|\",\"value\":1,\"type\":1}}",
        ]
    );
}

struct Prefixed {
    xy: i32,
    x: i32,
}

impl Watch for Prefixed {
    fn variables(&mut self, report: &mut Reporter<'_>) {
        self.xy = report.variable("xy", self.xy);
        self.x = report.variable("x", self.x);
    }
}

#[test]
fn test_update_matches_exact_name() {
    let mut p = Prefixed { xy: 1, x: 2 };
    let mut s = session(&["18,x,9,1,"]);

    poll(&mut s, &mut p);

    assert_eq!(p.xy, 1);
    assert_eq!(p.x, 9);
}

#[test]
fn test_update_for_unknown_name_stays_pending() {
    let mut p = Prefixed { xy: 1, x: 2 };
    let mut s = session(&["18,z,9,1,"]);

    poll(&mut s, &mut p);

    let pending = s.state().pending_update().unwrap();
    assert_eq!(pending.name.as_str(), "z");
    assert_eq!(pending.declared, Some(ValueType::Integer));
}

struct Sensors {
    temp: i32,
}

impl Watch for Sensors {
    fn sensors(&mut self, report: &mut Reporter<'_>) {
        report.sensor("temp", self.temp);
        report.sensor("light", 40u8);
    }
}

#[test]
fn test_selected_sensor_is_sticky() {
    let mut sensors = Sensors { temp: 21 };
    let mut s = session(&["22,temp,", "", ""]);

    poll(&mut s, &mut sensors);
    sensors.temp = 22;
    poll(&mut s, &mut sensors);
    poll(&mut s, &mut sensors);

    assert_eq!(
        records(&s),
        [
            "{\"Sensor\":{\"name\":\"temp\",\"value\":21,\"type\":1}}",
            "{\"Sensor\":{\"name\":\"temp\",\"value\":22,\"type\":1}}",
            "{\"Sensor\":{\"name\":\"temp\",\"value\":22,\"type\":1}}",
        ]
    );
    assert!(matches!(s.state().selector(), SensorSelector::Named(n) if n.as_str() == "temp"));
}

#[test]
fn test_no_selection_no_sensor_traffic() {
    let mut sensors = Sensors { temp: 21 };
    let mut s = session(&[]);

    s.report_sensors(&mut sensors);
    assert!(records(&s).is_empty());
}

#[test]
fn test_enumerate_lists_names_once() {
    let mut sensors = Sensors { temp: 21 };
    let mut s = session(&["21,", ""]);

    poll(&mut s, &mut sensors);
    poll(&mut s, &mut sensors);

    assert_eq!(
        records(&s),
        ["{\"Sensor_Name\":\"temp\"}", "{\"Sensor_Name\":\"light\"}"]
    );
    assert_eq!(s.state().selector(), &SensorSelector::None);
}

#[test]
fn test_watch_value_parsing() {
    assert_eq!(i32::from_raw("-12"), -12);
    assert_eq!(i8::from_raw("1000"), i8::MAX);
    assert_eq!(u16::from_raw("-5"), 0);
    assert_eq!(f64::from_raw("1.25"), 1.25);
    assert_eq!(f64::from_raw("0.1"), 0.1);
    assert_eq!(i64::from_raw("9999999999"), 9_999_999_999);
    assert_eq!(i64::from_raw("99999999999999999999"), i64::MAX);
    assert!(!bool::from_raw("1"));
    assert!(bool::from_raw("true"));
    assert_eq!(HString::<4>::from_raw("abcdef").as_str(), "abcd");
}
