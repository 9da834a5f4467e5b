//! Source slot management
//!
//! Owns acquisition, release, and switching of the two independent media
//! sources (camera, screen share). Each slot has exactly one live writer at
//! a time; an epoch counter per slot discards acquisition results that
//! complete after the user has already stopped the source.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::capture::{CaptureBackend, CaptureConstraints};
use crate::error::CaptureError;
use crate::source::tracks::{MediaSource, SourceKind, TrackSet};

/// The current capability set: which sources are live right now.
///
/// This is the only channel through which the layout controller learns
/// about source availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub camera: bool,
    pub screen: bool,
}

impl Capabilities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn any(&self) -> bool {
        self.camera || self.screen
    }

    pub fn has(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Camera => self.camera,
            SourceKind::Screen => self.screen,
        }
    }
}

struct Slot {
    current: Mutex<Option<MediaSource>>,
    /// Bumped on every acquisition start and every release; a result that
    /// completes under an older epoch is stale and gets discarded.
    epoch: AtomicU64,
}

impl Slot {
    fn new() -> Self {
        Self {
            current: Mutex::new(None),
            epoch: AtomicU64::new(0),
        }
    }
}

/// Owner of the camera and screen source slots
pub struct SourceManager {
    backend: Arc<dyn CaptureBackend>,
    camera: Slot,
    screen: Slot,
    caps_tx: watch::Sender<Capabilities>,
}

impl SourceManager {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Arc<Self> {
        let (caps_tx, _) = watch::channel(Capabilities::none());
        Arc::new(Self {
            backend,
            camera: Slot::new(),
            screen: Slot::new(),
            caps_tx,
        })
    }

    /// Acquire the camera slot, releasing any camera already live first so
    /// two camera locks are never held at once. Returns false when the
    /// result arrived stale (the user stopped the slot while the permission
    /// prompt was pending) and was discarded.
    pub async fn acquire_camera(&self, device_id: Option<&str>) -> Result<bool, CaptureError> {
        self.release(SourceKind::Camera);
        let epoch = self.camera.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let tracks = self
            .backend
            .capture_camera(CaptureConstraints::camera(device_id))
            .await?;
        self.install(SourceKind::Camera, tracks, epoch)
    }

    /// Acquire the screen slot and register the external-termination
    /// watcher so the OS "stop sharing" control is observed as source loss.
    pub async fn acquire_screen(self: &Arc<Self>) -> Result<bool, CaptureError> {
        self.release(SourceKind::Screen);
        let epoch = self.screen.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let tracks = self
            .backend
            .capture_screen(CaptureConstraints::screen())
            .await?;
        let ended = tracks.ended_signal();
        let installed = self.install(SourceKind::Screen, tracks, epoch)?;
        if installed {
            self.spawn_ended_watcher(ended, epoch);
        }
        Ok(installed)
    }

    /// Switch the camera slot to a new device: acquire first, swap on
    /// success. On failure the slot keeps the previously-live device
    /// instead of regressing to empty.
    pub async fn switch_camera_device(&self, device_id: &str) -> Result<bool, CaptureError> {
        let epoch = self.camera.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let tracks = self
            .backend
            .capture_camera(CaptureConstraints::camera(Some(device_id)))
            .await?;
        self.install(SourceKind::Camera, tracks, epoch)
    }

    /// Stop all tracks of the slot and clear it. Idempotent, and also
    /// invalidates any acquisition still in flight for this slot.
    pub fn release(&self, kind: SourceKind) {
        let slot = self.slot(kind);
        slot.epoch.fetch_add(1, Ordering::SeqCst);
        let source = slot.current.lock().take();
        if let Some(source) = source {
            source.tracks().stop_all();
            tracing::info!(kind = %kind, "source released");
            self.publish();
        }
    }

    /// Whether the given slot currently holds a live source
    pub fn is_live(&self, kind: SourceKind) -> bool {
        self.slot(kind)
            .current
            .lock()
            .as_ref()
            .map(MediaSource::is_live)
            .unwrap_or(false)
    }

    /// Clone of the track set currently occupying the slot
    pub fn tracks(&self, kind: SourceKind) -> Option<TrackSet> {
        self.slot(kind)
            .current
            .lock()
            .as_ref()
            .map(|source| source.tracks().clone())
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            camera: self.is_live(SourceKind::Camera),
            screen: self.is_live(SourceKind::Screen),
        }
    }

    /// Subscribe to capability-change notifications
    pub fn subscribe(&self) -> watch::Receiver<Capabilities> {
        self.caps_tx.subscribe()
    }

    fn slot(&self, kind: SourceKind) -> &Slot {
        match kind {
            SourceKind::Camera => &self.camera,
            SourceKind::Screen => &self.screen,
        }
    }

    fn install(&self, kind: SourceKind, tracks: TrackSet, epoch: u64) -> Result<bool, CaptureError> {
        let slot = self.slot(kind);
        let mut current = slot.current.lock();
        if slot.epoch.load(Ordering::SeqCst) != epoch {
            drop(current);
            tracing::debug!(kind = %kind, "discarding stale acquisition result");
            tracks.stop_all();
            return Ok(false);
        }

        let old = current.replace(MediaSource::new(kind, tracks, epoch));
        drop(current);
        if let Some(old) = old {
            old.tracks().stop_all();
        }
        tracing::info!(kind = %kind, "source acquired");
        self.publish();
        Ok(true)
    }

    fn spawn_ended_watcher(self: &Arc<Self>, mut ended: watch::Receiver<bool>, epoch: u64) {
        let manager = Arc::downgrade(self);
        tokio::spawn(async move {
            // A closed channel means the tracks went away through a normal
            // release; only a true value is an external termination.
            while ended.changed().await.is_ok() {
                if *ended.borrow() {
                    if let Some(manager) = manager.upgrade() {
                        manager.handle_external_loss(SourceKind::Screen, epoch);
                    }
                    return;
                }
            }
        });
    }

    /// Externally-triggered stop: treated as a graceful release, not an
    /// error, and only honored if the slot still holds that same capture.
    fn handle_external_loss(&self, kind: SourceKind, epoch: u64) {
        let slot = self.slot(kind);
        let mut current = slot.current.lock();
        let is_current = current
            .as_ref()
            .map(|source| source.epoch() == epoch)
            .unwrap_or(false);
        if !is_current {
            return;
        }

        slot.epoch.fetch_add(1, Ordering::SeqCst);
        let source = current.take();
        drop(current);
        if let Some(source) = source {
            source.tracks().stop_all();
        }
        tracing::info!(kind = %kind, "source ended externally");
        self.publish();
    }

    fn publish(&self) {
        self.caps_tx.send_replace(self.capabilities());
    }
}
