//! Window display and RGB drawing primitives.
//!
//! Wraps a minifb window that presents RGB frame buffers, plus the small
//! set of shapes the tracker and calibration screens draw: dots, circles,
//! polylines, and bars. All drawing happens directly on the RGB buffer
//! before it is handed to the window.

use anyhow::{anyhow, Result};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

pub type Color = (u8, u8, u8);

pub const GREEN: Color = (0, 255, 0);
pub const RED: Color = (255, 0, 0);
pub const WHITE: Color = (255, 255, 255);
pub const GRAY: Color = (100, 100, 100);

/// Window presenting RGB buffers at a fixed size.
pub struct Display {
    window: Window,
    argb: Vec<u32>,
    width: usize,
    height: usize,
}

impl Display {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| anyhow!("failed to create window: {e}"))?;

        // ~60 FPS refresh ceiling
        window.set_target_fps(60);

        Ok(Self {
            window,
            argb: vec![0; width * height],
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// True once per physical key press (no key repeat).
    pub fn key_pressed(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }

    /// Present an RGB buffer. Buffers smaller than the window leave the
    /// remainder black.
    pub fn present(&mut self, rgb: &[u8]) -> Result<()> {
        for (i, px) in self.argb.iter_mut().enumerate() {
            let off = i * 3;
            *px = if off + 2 < rgb.len() {
                ((rgb[off] as u32) << 16) | ((rgb[off + 1] as u32) << 8) | rgb[off + 2] as u32
            } else {
                0
            };
        }
        self.window
            .update_with_buffer(&self.argb, self.width, self.height)
            .map_err(|e| anyhow!("window update failed: {e}"))
    }
}

/// A blank RGB canvas matching the display size, for calibration screens.
pub fn blank_canvas(width: usize, height: usize) -> Vec<u8> {
    vec![0u8; width * height * 3]
}

pub fn set_pixel(rgb: &mut [u8], width: usize, height: usize, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
        return;
    }
    let off = (y as usize * width + x as usize) * 3;
    rgb[off] = color.0;
    rgb[off + 1] = color.1;
    rgb[off + 2] = color.2;
}

/// Filled circle.
pub fn fill_circle(rgb: &mut [u8], width: usize, height: usize, cx: i32, cy: i32, r: i32, color: Color) {
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                set_pixel(rgb, width, height, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Circle outline, two pixels thick.
pub fn draw_circle(rgb: &mut [u8], width: usize, height: usize, cx: i32, cy: i32, r: i32, color: Color) {
    let inner = (r - 2) * (r - 2);
    let outer = r * r;
    for dy in -r..=r {
        for dx in -r..=r {
            let d = dx * dx + dy * dy;
            if d <= outer && d >= inner {
                set_pixel(rgb, width, height, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Line segment (Bresenham).
pub fn draw_line(rgb: &mut [u8], width: usize, height: usize, mut x0: i32, mut y0: i32, x1: i32, y1: i32, color: Color) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        set_pixel(rgb, width, height, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Filled axis-aligned rectangle.
pub fn fill_rect(rgb: &mut [u8], width: usize, height: usize, x: i32, y: i32, w: i32, h: i32, color: Color) {
    for yy in y..y + h {
        for xx in x..x + w {
            set_pixel(rgb, width, height, xx, yy, color);
        }
    }
}

/// Rectangle outline.
pub fn draw_rect(rgb: &mut [u8], width: usize, height: usize, x: i32, y: i32, w: i32, h: i32, color: Color) {
    draw_line(rgb, width, height, x, y, x + w - 1, y, color);
    draw_line(rgb, width, height, x, y + h - 1, x + w - 1, y + h - 1, color);
    draw_line(rgb, width, height, x, y, x, y + h - 1, color);
    draw_line(rgb, width, height, x + w - 1, y, x + w - 1, y + h - 1, color);
}

/// Closed polyline through the given points.
pub fn draw_polyline(rgb: &mut [u8], width: usize, height: usize, points: &[(i32, i32)], color: Color) {
    if points.len() < 2 {
        return;
    }
    for i in 0..points.len() {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % points.len()];
        draw_line(rgb, width, height, x0, y0, x1, y1, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(w: usize, h: usize) -> Vec<u8> {
        blank_canvas(w, h)
    }

    fn pixel(rgb: &[u8], w: usize, x: usize, y: usize) -> Color {
        let off = (y * w + x) * 3;
        (rgb[off], rgb[off + 1], rgb[off + 2])
    }

    #[test]
    fn test_set_pixel_in_bounds() {
        let mut c = canvas(4, 4);
        set_pixel(&mut c, 4, 4, 2, 1, RED);
        assert_eq!(pixel(&c, 4, 2, 1), RED);
    }

    #[test]
    fn test_set_pixel_out_of_bounds_ignored() {
        let mut c = canvas(4, 4);
        set_pixel(&mut c, 4, 4, -1, 0, RED);
        set_pixel(&mut c, 4, 4, 4, 0, RED);
        set_pixel(&mut c, 4, 4, 0, 100, RED);
        assert!(c.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_fill_circle_center() {
        let mut c = canvas(20, 20);
        fill_circle(&mut c, 20, 20, 10, 10, 3, GREEN);
        assert_eq!(pixel(&c, 20, 10, 10), GREEN);
        assert_eq!(pixel(&c, 20, 12, 10), GREEN);
        // Outside the radius stays black
        assert_eq!(pixel(&c, 20, 15, 10), (0, 0, 0));
    }

    #[test]
    fn test_draw_line_endpoints() {
        let mut c = canvas(10, 10);
        draw_line(&mut c, 10, 10, 1, 1, 8, 8, WHITE);
        assert_eq!(pixel(&c, 10, 1, 1), WHITE);
        assert_eq!(pixel(&c, 10, 8, 8), WHITE);
        assert_eq!(pixel(&c, 10, 5, 5), WHITE);
    }

    #[test]
    fn test_fill_rect_clipped() {
        let mut c = canvas(5, 5);
        fill_rect(&mut c, 5, 5, 3, 3, 10, 10, GRAY);
        assert_eq!(pixel(&c, 5, 4, 4), GRAY);
        assert_eq!(pixel(&c, 5, 2, 2), (0, 0, 0));
    }

    #[test]
    fn test_polyline_closes_shape() {
        let mut c = canvas(10, 10);
        draw_polyline(&mut c, 10, 10, &[(1, 1), (8, 1), (8, 8)], GREEN);
        // Closing segment from (8,8) back to (1,1) passes the midpoint.
        assert_eq!(pixel(&c, 10, 1, 1), GREEN);
        assert_eq!(pixel(&c, 10, 8, 8), GREEN);
    }
}
