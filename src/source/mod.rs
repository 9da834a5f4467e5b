//! Media source lifecycle: tracks, slots, and the source manager

pub mod manager;
pub mod tracks;

pub use manager::{Capabilities, SourceManager};
pub use tracks::{AudioTrack, MediaSource, SourceKind, TrackSet, VideoTrack};
