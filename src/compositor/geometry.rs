//! Layout geometry
//!
//! Pure functions mapping layout parameters onto the fixed output surface.
//! All geometry is relative to the output size, never to a source's native
//! resolution; overlay rects may extend past the surface and are clipped at
//! draw time.

use crate::constants::{PIP_BORDER, PIP_MARGIN, SEPARATOR_WIDTH};
use crate::layout::Corner;

/// An axis-aligned rectangle on the output surface.
/// Coordinates are signed so partially off-surface rects stay representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.w as i32 && y < self.y + self.h as i32
    }
}

/// The whole output surface
pub fn full_surface(width: u32, height: u32) -> Rect {
    Rect::new(0, 0, width, height)
}

/// Picture-in-picture overlay rect.
///
/// Width is `size_pct` percent of the output width; height follows a fixed
/// 16:9 aspect ratio. The overlay sits in the requested corner with a fixed
/// margin from each edge.
pub fn pip_overlay(output_w: u32, output_h: u32, size_pct: u8, corner: Corner) -> Rect {
    let w = (output_w as u64 * size_pct as u64 / 100) as u32;
    let h = w * 9 / 16;
    let margin = PIP_MARGIN as i32;

    let right = output_w as i32 - w as i32 - margin;
    let bottom = output_h as i32 - h as i32 - margin;
    let (x, y) = match corner {
        Corner::TopLeft => (margin, margin),
        Corner::TopRight => (right, margin),
        Corner::BottomLeft => (margin, bottom),
        Corner::BottomRight => (right, bottom),
    };
    Rect::new(x, y, w, h)
}

/// Backing rect for the solid border drawn behind the PiP overlay
pub fn pip_border(overlay: Rect) -> Rect {
    let b = PIP_BORDER as i32;
    Rect::new(
        overlay.x - b,
        overlay.y - b,
        overlay.w + 2 * PIP_BORDER,
        overlay.h + 2 * PIP_BORDER,
    )
}

/// Left (screen) and right (camera) halves of the side-by-side layout
pub fn side_by_side_halves(output_w: u32, output_h: u32) -> (Rect, Rect) {
    let half = output_w / 2;
    (
        Rect::new(0, 0, half, output_h),
        Rect::new(half as i32, 0, output_w - half, output_h),
    )
}

/// Vertical separator line centered on the midline, spanning full height
pub fn separator(output_w: u32, output_h: u32) -> Rect {
    let half = output_w / 2;
    Rect::new(
        half as i32 - (SEPARATOR_WIDTH / 2) as i32,
        0,
        SEPARATOR_WIDTH,
        output_h,
    )
}
