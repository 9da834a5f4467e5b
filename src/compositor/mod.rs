//! Real-time frame composition

pub mod engine;
pub mod geometry;
pub mod surface;

pub use engine::{
    FrameCompositor, IntervalTicker, ManualTicker, OutputStream, Ticker, VideoFeed,
};
pub use geometry::Rect;
pub use surface::{RasterSurface, Rgba, BLACK, WHITE};
