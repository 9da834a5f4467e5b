//! # Stream Composer
//!
//! Multi-source live broadcast composition engine: combines a camera feed
//! and/or a screen-share feed into a single output video stream under a
//! selectable layout, then hands the output to a streaming backend.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           PRESENTER                                  │
//! │   ┌──────────────┐                     ┌──────────────┐             │
//! │   │    Camera    │                     │ Screen Share │             │
//! │   └──────┬───────┘                     └──────┬───────┘             │
//! │          │     CaptureBackend (capture)       │                     │
//! │          ▼                                    ▼                     │
//! │   ┌─────────────────────────────────────────────────────────────┐   │
//! │   │            Source Manager (source::manager)                 │   │
//! │   │    camera slot ─ epochs ─ screen slot ─ ended watcher       │   │
//! │   └──────────────┬──────────────────────────┬───────────────────┘   │
//! │                  │ capability watch channel │                       │
//! │                  ▼                          │                       │
//! │   ┌──────────────────────────┐              │ live tracks           │
//! │   │ Layout Controller        │              │                       │
//! │   │ camera-only, screen-only │              │                       │
//! │   │ pip, side-by-side        │              │                       │
//! │   └──────────────┬───────────┘              │                       │
//! │                  │ CompositionState         │                       │
//! │                  ▼                          ▼                       │
//! │   ┌─────────────────────────────────────────────────────────────┐   │
//! │   │          Frame Compositor (compositor::engine)              │   │
//! │   │   render loop → RasterSurface 1280×720 → FrameQueue @30fps  │   │
//! │   └──────────────────────────┬──────────────────────────────────┘   │
//! │                              │ OutputStream (video + audio)         │
//! │                              ▼                                      │
//! │   ┌─────────────────────────────────────────────────────────────┐   │
//! │   │        Broadcast Launcher (broadcast::launcher)             │   │
//! │   │    title/auth/source checks → StreamingBackend session      │   │
//! │   └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

pub mod broadcast;
pub mod capture;
pub mod compositor;
pub mod config;
pub mod device;
pub mod error;
pub mod frame;
pub mod layout;
pub mod source;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Composited output surface width in pixels
    pub const OUTPUT_WIDTH: u32 = 1280;

    /// Composited output surface height in pixels
    pub const OUTPUT_HEIGHT: u32 = 720;

    /// Target output frame rate
    pub const OUTPUT_FPS: u32 = 30;

    /// Ideal camera capture width
    pub const CAMERA_WIDTH: u32 = 1280;

    /// Ideal camera capture height
    pub const CAMERA_HEIGHT: u32 = 720;

    /// Ideal screen capture width
    pub const SCREEN_WIDTH: u32 = 1920;

    /// Ideal screen capture height
    pub const SCREEN_HEIGHT: u32 = 1080;

    /// Ideal capture frame rate for both sources
    pub const CAPTURE_FPS: u32 = 30;

    /// Margin between a picture-in-picture overlay and the surface edges
    pub const PIP_MARGIN: u32 = 20;

    /// Border thickness drawn around the picture-in-picture overlay
    pub const PIP_BORDER: u32 = 3;

    /// Default picture-in-picture overlay size, percent of output width
    pub const DEFAULT_PIP_SIZE_PCT: u8 = 25;

    /// Width of the side-by-side separator line
    pub const SEPARATOR_WIDTH: u32 = 2;

    /// Output frame queue capacity (in frames)
    pub const FRAME_QUEUE_CAPACITY: usize = 8;
}
