//! Off-screen raster surface
//!
//! A CPU-side RGBA8 surface of fixed output dimensions supporting clipped
//! rect fills and draw-image-scaled operations, snapshotted once per tick
//! into the output frame stream.

use bytes::Bytes;

use crate::compositor::geometry::Rect;
use crate::frame::{VideoFrame, BYTES_PER_PIXEL};

/// An RGBA color value
pub type Rgba = [u8; 4];

pub const WHITE: Rgba = [255, 255, 255, 255];
pub const BLACK: Rgba = [0, 0, 0, 255];

/// Fixed-size RGBA8 raster surface, row-major
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        let mut surface = Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        };
        surface.fill(BLACK);
        surface
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }

    /// Fill the whole surface with one color
    pub fn fill(&mut self, color: Rgba) {
        for px in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&color);
        }
    }

    /// Fill a rect with one color, clipped to the surface
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let x0 = rect.x.max(0) as u32;
        let y0 = rect.y.max(0) as u32;
        let x1 = (rect.x + rect.w as i32).clamp(0, self.width as i32) as u32;
        let y1 = (rect.y + rect.h as i32).clamp(0, self.height as i32) as u32;

        for y in y0..y1 {
            for x in x0..x1 {
                let off = self.offset(x, y);
                self.pixels[off..off + BYTES_PER_PIXEL].copy_from_slice(&color);
            }
        }
    }

    /// Draw a frame stretched into `dst` with nearest-neighbor scaling,
    /// clipped to the surface. The source resolution is irrelevant to the
    /// destination geometry.
    pub fn draw_frame(&mut self, frame: &VideoFrame, dst: Rect) {
        if frame.width == 0 || frame.height == 0 || dst.w == 0 || dst.h == 0 {
            return;
        }

        for dy in 0..dst.h {
            let y = dst.y + dy as i32;
            if y < 0 || y >= self.height as i32 {
                continue;
            }
            let sy = (dy as u64 * frame.height as u64 / dst.h as u64) as u32;

            for dx in 0..dst.w {
                let x = dst.x + dx as i32;
                if x < 0 || x >= self.width as i32 {
                    continue;
                }
                let sx = (dx as u64 * frame.width as u64 / dst.w as u64) as u32;

                let src = frame.pixel_offset(sx, sy);
                let off = self.offset(x as u32, y as u32);
                self.pixels[off..off + BYTES_PER_PIXEL]
                    .copy_from_slice(&frame.pixels[src..src + BYTES_PER_PIXEL]);
            }
        }
    }

    /// Capture the surface contents as a new output frame
    pub fn snapshot(&self, timestamp: u64, sequence: u32) -> VideoFrame {
        VideoFrame::new(
            Bytes::copy_from_slice(&self.pixels),
            self.width,
            self.height,
            timestamp,
            sequence,
        )
    }

    /// RGBA value of the pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let off = self.offset(x, y);
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.pixels[off..off + BYTES_PER_PIXEL]);
        px
    }
}
