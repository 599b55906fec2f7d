//! Hardware Abstraction Layer for RustLiveProbe.
//!
//! The session only talks to hardware through these traits.
//! Business logic stays in core modules, HAL is just I/O.

pub mod frame;
pub mod sim;

#[cfg(target_os = "espidf")]
pub mod esp;

pub use frame::FrameBuffer;

use core::fmt::Write;

use crate::protocol::LineBuffer;

/// Line-oriented serial link to the host.
///
/// Writing goes through [`core::fmt::Write`]; records carry their own
/// terminator, so implementations must not add line endings.
pub trait Link: Write {
    /// Non-blocking read of one pending line into `line`.
    ///
    /// Returns `false` when nothing is pending. Absence of input is not
    /// an error.
    fn read_line(&mut self, line: &mut LineBuffer) -> bool;
}

/// Indexed digital and analog pins.
///
/// Index validity is checked by the session against
/// [`SessionConfig`](crate::config::SessionConfig) before any call.
pub trait Pins {
    /// Read a digital pin: 0 or 1.
    fn digital_read(&mut self, pin: u8) -> u8;
    /// Drive a digital pin.
    fn digital_write(&mut self, pin: u8, high: bool);
    /// Read an analog pin (0..=1023 on the reference board).
    fn analog_read(&mut self, pin: u8) -> u16;
    /// Set PWM duty on an analog-capable pin.
    fn analog_write(&mut self, pin: u8, duty: u16);
}

/// Square LED matrix of [`DISPLAY_SIZE`](crate::config::DISPLAY_SIZE) pixels per side.
pub trait Display {
    /// True when the pixel is lit.
    fn point(&self, x: u8, y: u8) -> bool;
    /// Light a pixel.
    fn plot(&mut self, x: u8, y: u8);
    /// Turn a pixel off.
    fn unplot(&mut self, x: u8, y: u8);
}

/// Monotonic millisecond clock. Wraps after ~49 days.
pub trait Clock {
    fn now_ms(&mut self) -> u32;
}

/// Three-axis reading plus magnitude.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Axes {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub strength: i32,
}

/// Board orientation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tilt {
    pub pitch: i32,
    pub roll: i32,
}

/// Gestures recognised by the motion sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    EightG,
    FreeFall,
    LogoDown,
    LogoUp,
    ScreenDown,
    ScreenUp,
    Shake,
    SixG,
    ThreeG,
    TiltLeft,
    TiltRight,
}

impl Gesture {
    /// Text the host displays.
    pub fn text(self) -> &'static str {
        match self {
            Gesture::EightG => "Eight G",
            Gesture::FreeFall => "Free Fall",
            Gesture::LogoDown => "Logo Down",
            Gesture::LogoUp => "Logo Up",
            Gesture::ScreenDown => "Screen Down",
            Gesture::ScreenUp => "Screen Up",
            Gesture::Shake => "Shake",
            Gesture::SixG => "Six G",
            Gesture::ThreeG => "Three G",
            Gesture::TiltLeft => "Tilt Left",
            Gesture::TiltRight => "Tilt Right",
        }
    }
}

/// On-board sensors.
///
/// Every method has a neutral default so boards without a given sensor
/// still answer the host.
pub trait SensorHub {
    fn calibrate_compass(&mut self) {}

    /// Compass heading in degrees.
    fn heading(&mut self) -> i32 {
        0
    }

    fn magnetic_field(&mut self) -> Axes {
        Axes::default()
    }

    /// Accelerometer range in g (1, 2, 4 or 8).
    fn set_accel_range(&mut self, g: u8) {
        let _ = g;
    }

    fn acceleration(&mut self) -> Axes {
        Axes::default()
    }

    fn tilt(&mut self) -> Tilt {
        Tilt::default()
    }

    fn gesture(&mut self) -> Option<Gesture> {
        None
    }

    fn light_level(&mut self) -> u8 {
        0
    }

    fn temperature(&mut self) -> i32 {
        0
    }

    fn sound_level(&mut self) -> u8 {
        0
    }
}

/// Everything the session needs from the board besides the link.
pub trait Board: Pins + Display + SensorHub + Clock {}

impl<T: Pins + Display + SensorHub + Clock> Board for T {}
