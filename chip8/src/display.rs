//! Monochrome display buffer.
use std::fmt::{self, Write};

use crate::constants::*;

/// Screen buffer that sprites are drawn to.
///
/// Pixels are stored row-major, `x + y * DISPLAY_WIDTH`.
#[derive(Clone)]
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

    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// Read-only view of the pixels for rendering.
    #[inline]
    pub fn pixels(&self) -> &[bool; DISPLAY_BUFFER_SIZE] {
        &self.pixels
    }

    /// State of the pixel at the given coordinate, wrapped to the screen bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.pixels[index(x, y)]
    }

    /// XOR a sprite onto the buffer at coordinate (x, y).
    ///
    /// Each byte in `rows` is one row of 8 pixels, most significant bit
    /// leftmost. Pixels that fall outside the screen wrap around to the
    /// opposite side.
    ///
    /// Returns `true` if any pixel that was on has been turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, rows: &[u8]) -> bool {
        let mut is_erased = false;

        for (r, row) in rows.iter().enumerate() {
            for c in 0..8 {
                let d = index(x + c, y + r);

                let old_px = self.pixels[d];
                let new_px = (row >> (7 - c) & 1) != 0;

                // XOR erases a pixel when both the old and new values are both 1.
                is_erased |= old_px && new_px;

                self.pixels[d] = old_px ^ new_px;
            }
        }

        is_erased
    }

    /// Render the buffer as rows of `#` (on) and `.` (off).
    pub fn dump(&self) -> Result<String, fmt::Error> {
        let mut buf = String::with_capacity(DISPLAY_BUFFER_SIZE + DISPLAY_HEIGHT);

        for row in self.pixels.chunks(DISPLAY_WIDTH) {
            for px in row {
                buf.write_char(if *px { '#' } else { '.' })?;
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }
}

#[inline(always)]
fn index(x: usize, y: usize) -> usize {
    (x & DISPLAY_WIDTH_MASK) + (y & DISPLAY_HEIGHT_MASK) * DISPLAY_WIDTH
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_draw_wraps_both_axes() {
        let mut fb = Framebuffer::new();
        let collision = fb.draw_sprite(60, 30, &[0xFF, 0x81]);
        assert!(!collision);

        // first row: columns 60..=63 then 0..=3
        for x in [60, 61, 62, 63, 0, 1, 2, 3] {
            assert!(fb.get(x, 30), "row 30, column {x}");
        }
        // second row wraps to y = 31, only the outer bits are set
        assert!(fb.get(60, 31));
        assert!(!fb.get(61, 31));
        assert!(!fb.get(2, 31));
        assert!(fb.get(3, 31));
        assert_eq!(fb.pixels().iter().filter(|px| **px).count(), 10);
    }

    #[test]
    fn test_draw_row_wraps_to_top() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(0, 31, &[0x80, 0x80]);
        assert!(fb.get(0, 31));
        assert!(fb.get(0, 0));
    }

    #[test]
    fn test_xor_self_inverse() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(10, 5, &[0xF0]);
        let before = fb.clone();

        // clear of the first sprite, then drawn over itself
        assert!(!fb.draw_sprite(20, 5, &[0b1010_0101]));
        assert!(fb.get(20, 5));
        assert!(fb.draw_sprite(20, 5, &[0b1010_0101]));
        assert_eq!(fb.pixels()[..], before.pixels()[..]);

        // overlapping the first sprite collides, and only clears shared pixels
        assert!(fb.draw_sprite(12, 5, &[0b1010_0101]));
        assert!(!fb.get(12, 5));
        assert!(fb.get(13, 5));
        assert!(fb.get(14, 5));
    }

    #[test]
    fn test_zero_bits_do_not_collide() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(4, 0, &[0b1111_0000]);
        assert!(!fb.draw_sprite(0, 0, &[0b1111_0000]));
        assert!(fb.get(0, 0));
        assert!(fb.get(4, 0));
    }

    #[test]
    fn test_dump() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(0, 0, &[0xC0]);
        let dump = fb.dump().unwrap();
        let first = dump.lines().next().unwrap();
        assert!(first.starts_with("##.."));
        assert_eq!(first.len(), DISPLAY_WIDTH);
        assert_eq!(dump.lines().count(), DISPLAY_HEIGHT);
    }
}
