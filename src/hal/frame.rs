//! In-memory LED frame.
//!
//! Used as the display of boards without an LED matrix and by the
//! simulation board.

use super::Display;
use crate::config::DISPLAY_SIZE;

/// 5x5 on/off frame buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: [[bool; DISPLAY_SIZE]; DISPLAY_SIZE],
}

impl FrameBuffer {
    /// Create a dark frame.
    pub const fn new() -> Self {
        Self {
            pixels: [[false; DISPLAY_SIZE]; DISPLAY_SIZE],
        }
    }

    /// Set one pixel. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: u8, y: u8, lit: bool) {
        if let Some(px) = self
            .pixels
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
        {
            *px = lit;
        }
    }

    /// Read one pixel. Out-of-range coordinates read dark.
    pub fn get(&self, x: u8, y: u8) -> bool {
        self.pixels
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or(false)
    }

    /// Turn every pixel off.
    pub fn clear(&mut self) {
        self.pixels = [[false; DISPLAY_SIZE]; DISPLAY_SIZE];
    }

    /// Number of lit pixels.
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().flatten().filter(|&&p| p).count()
    }
}

impl Display for FrameBuffer {
    fn point(&self, x: u8, y: u8) -> bool {
        self.get(x, y)
    }

    fn plot(&mut self, x: u8, y: u8) {
        self.set(x, y, true);
    }

    fn unplot(&mut self, x: u8, y: u8) {
        self.set(x, y, false);
    }
}
