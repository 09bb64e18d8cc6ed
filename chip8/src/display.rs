//! Display frame buffer.
use std::fmt::{self, Write};

use crate::constants::*;

/// Read-only view of the display, handed to the renderer between steps.
///
/// Pixels are stored row by row, so the pixel at `(x, y)`
/// is located at `x + y * DISPLAY_WIDTH`.
pub type Chip8DisplayBuffer<'a> = &'a [bool; DISPLAY_BUFFER_SIZE];

/// Monochrome pixel grid that is drawn to by the interpreter.
pub struct Framebuffer {
    pixels: Box<[bool; DISPLAY_BUFFER_SIZE]>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self {
            pixels: Box::new([false; DISPLAY_BUFFER_SIZE]),
        }
    }
}

impl Framebuffer {
    pub fn new() -> Self {
        Default::default()
    }

    /// Turn all pixels off.
    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// State of the pixel at the given coordinate.
    ///
    /// Coordinates wrap around the edges of the display.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[Self::offset(x, y)]
    }

    #[inline(always)]
    fn offset(x: usize, y: usize) -> usize {
        (x % DISPLAY_WIDTH) + (y % DISPLAY_HEIGHT) * DISPLAY_WIDTH
    }

    /// XOR a sprite onto the display.
    ///
    /// Each byte in `rows` is one row of 8 pixels, with the most significant
    /// bit on the left. Sprites that cross the edge of the display are
    /// wrapped around to the other side.
    ///
    /// Returns `true` when any pixel was switched from on to off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, rows: &[u8]) -> bool {
        let mut is_erased = false;

        for (r, row) in rows.iter().enumerate() {
            // Each row is 8 bits representing the 8 pixels of the sprite.
            for c in 0..8 {
                if (row >> (7 - c)) & 1 == 0 {
                    continue;
                }

                let d = Self::offset(x + c, y + r);
                let old_px = self.pixels[d];

                // XOR erases a pixel when both the old and new values are both 1.
                is_erased |= old_px;

                self.pixels[d] = !old_px;
            }
        }

        is_erased
    }

    /// Stable view of the display for the renderer.
    #[inline]
    pub fn snapshot(&self) -> Chip8DisplayBuffer<'_> {
        &self.pixels
    }

    /// Number of pixels that are switched on.
    pub fn count_lit(&self) -> usize {
        self.pixels.iter().filter(|px| **px).count()
    }

    /// Render the display as text, `#` for lit pixels and `.` for dark.
    pub fn dump(&self) -> Result<String, fmt::Error> {
        let mut buf = String::with_capacity((DISPLAY_WIDTH + 1) * DISPLAY_HEIGHT);

        for row in self.pixels.chunks(DISPLAY_WIDTH) {
            for px in row {
                buf.write_char(if *px { '#' } else { '.' })?;
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }
}
