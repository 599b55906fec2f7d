//! Simulation board for host builds and tests.
//!
//! - [`SimBoard`]: in-memory pins, LED frame and sensors, with a log of
//!   every hardware write.
//! - [`ScriptedLink`]: serves scripted input lines and captures output.
//! - [`SimClock`]: advances a fixed step on every read so spin loops
//!   make progress without real time passing.

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use super::{Axes, Clock, Display, FrameBuffer, Gesture, Link, Pins, SensorHub, Tilt};
use crate::config::{DEFAULT_ANALOG_PINS, DEFAULT_DIGITAL_PINS, RECORD_TERMINATOR};
use crate::protocol::LineBuffer;

/// Digital index that reads button A.
pub const BUTTON_A_PIN: u8 = 5;

/// Digital index that reads button B.
pub const BUTTON_B_PIN: u8 = 11;

/// Clock that advances `step_ms` after every read.
#[derive(Clone, Copy, Debug)]
pub struct SimClock {
    now_ms: u32,
    step_ms: u32,
}

impl SimClock {
    pub fn new(step_ms: u32) -> Self {
        Self { now_ms: 0, step_ms }
    }

    /// Start at `now_ms` instead of zero.
    pub fn starting_at(now_ms: u32, step_ms: u32) -> Self {
        Self { now_ms, step_ms }
    }

    /// Jump forward without a read.
    pub fn advance(&mut self, ms: u32) {
        self.now_ms = self.now_ms.wrapping_add(ms);
    }

    /// Current time without advancing.
    pub fn peek(&self) -> u32 {
        self.now_ms
    }
}

impl Clock for SimClock {
    fn now_ms(&mut self) -> u32 {
        let now = self.now_ms;
        self.now_ms = self.now_ms.wrapping_add(self.step_ms);
        now
    }
}

/// A hardware write observed by the simulation board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinWrite {
    Digital { pin: u8, high: bool },
    Pwm { pin: u8, duty: u16 },
}

/// In-memory board.
#[derive(Debug)]
pub struct SimBoard {
    pub digital: Vec<u8>,
    pub analog: Vec<u16>,
    pub button_a: bool,
    pub button_b: bool,
    pub frame: FrameBuffer,
    pub clock: SimClock,
    pub writes: Vec<PinWrite>,

    pub heading: i32,
    pub magnetic_field: Axes,
    pub acceleration: Axes,
    pub accel_range: u8,
    pub tilt: Tilt,
    pub gesture: Option<Gesture>,
    pub light_level: u8,
    pub temperature: i32,
    pub sound_level: u8,
    pub compass_calibrations: u32,
}

impl SimBoard {
    /// Board with the reference pin counts and a 1 ms clock step.
    pub fn new() -> Self {
        Self::with_clock(SimClock::new(1))
    }

    pub fn with_clock(clock: SimClock) -> Self {
        Self {
            digital: alloc::vec![0; DEFAULT_DIGITAL_PINS as usize],
            analog: alloc::vec![0; DEFAULT_ANALOG_PINS as usize],
            button_a: false,
            button_b: false,
            frame: FrameBuffer::new(),
            clock,
            writes: Vec::new(),
            heading: 0,
            magnetic_field: Axes::default(),
            acceleration: Axes::default(),
            accel_range: 2,
            tilt: Tilt::default(),
            gesture: None,
            light_level: 0,
            temperature: 0,
            sound_level: 0,
            compass_calibrations: 0,
        }
    }

    /// Digital writes in the order they happened.
    pub fn digital_writes(&self) -> impl Iterator<Item = (u8, bool)> + '_ {
        self.writes.iter().filter_map(|w| match *w {
            PinWrite::Digital { pin, high } => Some((pin, high)),
            PinWrite::Pwm { .. } => None,
        })
    }
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl Pins for SimBoard {
    fn digital_read(&mut self, pin: u8) -> u8 {
        match pin {
            BUTTON_A_PIN => self.button_a as u8,
            BUTTON_B_PIN => self.button_b as u8,
            _ => self.digital.get(pin as usize).copied().unwrap_or(0),
        }
    }

    fn digital_write(&mut self, pin: u8, high: bool) {
        if let Some(p) = self.digital.get_mut(pin as usize) {
            *p = high as u8;
        }
        self.writes.push(PinWrite::Digital { pin, high });
    }

    fn analog_read(&mut self, pin: u8) -> u16 {
        self.analog.get(pin as usize).copied().unwrap_or(0)
    }

    fn analog_write(&mut self, pin: u8, duty: u16) {
        if let Some(p) = self.analog.get_mut(pin as usize) {
            *p = duty;
        }
        self.writes.push(PinWrite::Pwm { pin, duty });
    }
}

impl Display for SimBoard {
    fn point(&self, x: u8, y: u8) -> bool {
        self.frame.point(x, y)
    }

    fn plot(&mut self, x: u8, y: u8) {
        self.frame.plot(x, y);
    }

    fn unplot(&mut self, x: u8, y: u8) {
        self.frame.unplot(x, y);
    }
}

impl Clock for SimBoard {
    fn now_ms(&mut self) -> u32 {
        self.clock.now_ms()
    }
}

impl SensorHub for SimBoard {
    fn calibrate_compass(&mut self) {
        self.compass_calibrations += 1;
    }

    fn heading(&mut self) -> i32 {
        self.heading
    }

    fn magnetic_field(&mut self) -> Axes {
        self.magnetic_field
    }

    fn set_accel_range(&mut self, g: u8) {
        self.accel_range = g;
    }

    fn acceleration(&mut self) -> Axes {
        self.acceleration
    }

    fn tilt(&mut self) -> Tilt {
        self.tilt
    }

    fn gesture(&mut self) -> Option<Gesture> {
        self.gesture
    }

    fn light_level(&mut self) -> u8 {
        self.light_level
    }

    fn temperature(&mut self) -> i32 {
        self.temperature
    }

    fn sound_level(&mut self) -> u8 {
        self.sound_level
    }
}

/// Link that plays back a script and records everything written.
///
/// Each read consumes one script entry; an empty entry means "nothing
/// pending this poll". Once the script runs out every read is empty.
#[derive(Debug, Default)]
pub struct ScriptedLink {
    script: VecDeque<String>,
    output: String,
    reads: u32,
}

impl ScriptedLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link that will serve `lines` in order.
    pub fn with_script<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut link = Self::new();
        for line in lines {
            link.push_line(line);
        }
        link
    }

    /// Queue one more input line.
    pub fn push_line(&mut self, line: &str) {
        self.script.push_back(String::from(line));
    }

    /// Script entries not yet read.
    pub fn pending(&self) -> usize {
        self.script.len()
    }

    /// Number of read attempts so far.
    pub fn reads(&self) -> u32 {
        self.reads
    }

    /// Everything written so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Written records without their terminators.
    pub fn records(&self) -> impl Iterator<Item = &str> + '_ {
        self.output
            .split(RECORD_TERMINATOR)
            .filter(|r| !r.is_empty())
    }

    /// Drop captured output.
    pub fn clear_output(&mut self) {
        self.output.clear();
    }
}

impl fmt::Write for ScriptedLink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.output.push_str(s);
        Ok(())
    }
}

impl Link for ScriptedLink {
    fn read_line(&mut self, line: &mut LineBuffer) -> bool {
        self.reads += 1;
        match self.script.pop_front() {
            Some(next) if !next.is_empty() => {
                line.set(&next);
                true
            }
            _ => false,
        }
    }
}
