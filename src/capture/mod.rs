//! Capture boundary
//!
//! The engine never talks to camera or screen hardware directly; it consumes
//! a [`CaptureBackend`] that performs constrained camera capture and
//! constrained display capture, each returning a live track set or failing
//! with a permission/availability error.

pub mod synthetic;

use futures_util::future::BoxFuture;

use crate::constants::*;
use crate::error::CaptureError;
use crate::source::TrackSet;

pub use synthetic::{SolidColorSampler, SyntheticBackend};

/// Resolution and frame-rate hints for an acquisition request.
///
/// These are ideals, not exact requirements; the backend may deliver a
/// different native resolution and the compositor scales to its fixed
/// output geometry regardless.
#[derive(Debug, Clone)]
pub struct CaptureConstraints {
    /// Requested device id; `None` selects the platform default
    pub device_id: Option<String>,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    /// Whether to capture audio alongside the video track
    pub audio: bool,
}

impl CaptureConstraints {
    /// Camera constraints: ideal 1280x720 at 30fps, audio included
    pub fn camera(device_id: Option<&str>) -> Self {
        Self {
            device_id: device_id.map(str::to_string),
            width: CAMERA_WIDTH,
            height: CAMERA_HEIGHT,
            frame_rate: CAPTURE_FPS,
            audio: true,
        }
    }

    /// Display capture constraints: ideal 1920x1080 at 30fps, audio included
    pub fn screen() -> Self {
        Self {
            device_id: None,
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            frame_rate: CAPTURE_FPS,
            audio: true,
        }
    }
}

/// Boundary to the platform capture capability
pub trait CaptureBackend: Send + Sync {
    /// Request constrained camera capture
    fn capture_camera(
        &self,
        constraints: CaptureConstraints,
    ) -> BoxFuture<'_, Result<TrackSet, CaptureError>>;

    /// Request constrained display capture.
    ///
    /// The returned track set's `ended` signal fires when the OS-level
    /// "stop sharing" control terminates the capture from outside.
    fn capture_screen(
        &self,
        constraints: CaptureConstraints,
    ) -> BoxFuture<'_, Result<TrackSet, CaptureError>>;
}
