//! Live capture tracks
//!
//! A [`TrackSet`] is the ownership handle over one capture: exactly one
//! video track plus its audio tracks. Stop flags are shared across clones,
//! so stopping a track is observable from every handle that holds it.
//! Releasing hardware locks by stopping every track on every exit path is
//! an explicit obligation of the owners.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::frame::VideoSampler;

/// Kind of a logical media source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Camera,
    Screen,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Camera => write!(f, "camera"),
            SourceKind::Screen => write!(f, "screen"),
        }
    }
}

/// One live video capture track
#[derive(Clone)]
pub struct VideoTrack {
    id: Uuid,
    label: String,
    stopped: Arc<AtomicBool>,
    sampler: Arc<dyn VideoSampler>,
}

impl VideoTrack {
    pub fn new(label: impl Into<String>, sampler: Arc<dyn VideoSampler>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            stopped: Arc::new(AtomicBool::new(false)),
            sampler,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Stop the track, releasing the underlying capture. Idempotent.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            tracing::debug!(track = %self.id, label = %self.label, "video track stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn sampler(&self) -> &Arc<dyn VideoSampler> {
        &self.sampler
    }
}

/// One live audio capture track, passed through uncomposited
#[derive(Clone)]
pub struct AudioTrack {
    id: Uuid,
    label: String,
    stopped: Arc<AtomicBool>,
}

impl AudioTrack {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            tracing::debug!(track = %self.id, label = %self.label, "audio track stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// The track set of one capture: one video track plus audio tracks
#[derive(Clone)]
pub struct TrackSet {
    pub video: VideoTrack,
    pub audio: Vec<AudioTrack>,
    ended: watch::Receiver<bool>,
    // Keeps the dormant channel open for captures that can only end locally.
    _ended_tx: Option<Arc<watch::Sender<bool>>>,
}

impl std::fmt::Debug for TrackSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackSet")
            .field("video", &self.video.id())
            .field("audio", &self.audio.iter().map(|a| a.id()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl TrackSet {
    /// Track set for a capture that can only be stopped locally
    pub fn new(video: VideoTrack, audio: Vec<AudioTrack>) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            video,
            audio,
            ended: rx,
            _ended_tx: Some(Arc::new(tx)),
        }
    }

    /// Track set whose capture the OS can terminate from outside; the
    /// backend flips `ended` to true when that happens.
    pub fn with_ended(video: VideoTrack, audio: Vec<AudioTrack>, ended: watch::Receiver<bool>) -> Self {
        Self {
            video,
            audio,
            ended,
            _ended_tx: None,
        }
    }

    /// Stop every track. Idempotent.
    pub fn stop_all(&self) {
        self.video.stop();
        for track in &self.audio {
            track.stop();
        }
    }

    pub fn is_live(&self) -> bool {
        !self.video.is_stopped()
    }

    /// Signal observed when the capture is terminated externally
    pub fn ended_signal(&self) -> watch::Receiver<bool> {
        self.ended.clone()
    }
}

/// One logical input occupying a source slot
pub struct MediaSource {
    kind: SourceKind,
    tracks: TrackSet,
    epoch: u64,
}

impl MediaSource {
    pub(crate) fn new(kind: SourceKind, tracks: TrackSet, epoch: u64) -> Self {
        Self { kind, tracks, epoch }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn tracks(&self) -> &TrackSet {
        &self.tracks
    }

    pub fn is_live(&self) -> bool {
        self.tracks.is_live()
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl Drop for MediaSource {
    fn drop(&mut self) {
        // Leaking a live track leaks a hardware lock.
        self.tracks.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::VideoFrame;

    struct NullSampler;

    impl VideoSampler for NullSampler {
        fn latest_frame(&self) -> Option<VideoFrame> {
            None
        }
    }

    fn track_set() -> TrackSet {
        TrackSet::new(
            VideoTrack::new("cam", Arc::new(NullSampler)),
            vec![AudioTrack::new("mic")],
        )
    }

    #[test]
    fn test_stop_is_shared_across_clones() {
        let tracks = track_set();
        let clone = tracks.clone();

        assert!(clone.is_live());
        tracks.stop_all();
        assert!(!clone.is_live());
        assert!(clone.audio[0].is_stopped());

        // Idempotent
        tracks.stop_all();
    }

    #[test]
    fn test_drop_stops_tracks() {
        let tracks = track_set();
        let video = tracks.video.clone();

        let source = MediaSource::new(SourceKind::Camera, tracks, 1);
        assert!(!video.is_stopped());
        drop(source);
        assert!(video.is_stopped());
    }
}
