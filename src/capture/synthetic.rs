//! Synthetic capture backend
//!
//! In-process stand-in for the platform capture capability: every
//! acquisition yields a solid-color test pattern at the requested
//! resolution. Used by the demo binary and by tests that need to steer
//! permission failures, cancelled pickers, delayed acquisitions, and
//! externally-terminated screen shares.

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Notify};

use crate::capture::{CaptureBackend, CaptureConstraints};
use crate::device::{DeviceEnumerator, DeviceKind, RawDeviceInfo};
use crate::error::CaptureError;
use crate::frame::{VideoFrame, VideoSampler, BYTES_PER_PIXEL};
use crate::source::{AudioTrack, TrackSet, VideoTrack};

/// Sampler producing solid-color frames at a fixed resolution
pub struct SolidColorSampler {
    pixels: bytes::Bytes,
    width: u32,
    height: u32,
    start: Instant,
    sequence: AtomicU32,
}

impl SolidColorSampler {
    pub fn new(color: [u8; 4], width: u32, height: u32) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for _ in 0..(width * height) {
            pixels.extend_from_slice(&color);
        }
        Self {
            pixels: bytes::Bytes::from(pixels),
            width,
            height,
            start: Instant::now(),
            sequence: AtomicU32::new(0),
        }
    }
}

impl VideoSampler for SolidColorSampler {
    fn latest_frame(&self) -> Option<VideoFrame> {
        Some(VideoFrame::new(
            self.pixels.clone(),
            self.width,
            self.height,
            self.start.elapsed().as_micros() as u64,
            self.sequence.fetch_add(1, Ordering::Relaxed),
        ))
    }
}

/// Default test-pattern color for camera captures
pub const CAMERA_COLOR: [u8; 4] = [0, 120, 255, 255];

/// Default test-pattern color for screen captures
pub const SCREEN_COLOR: [u8; 4] = [40, 40, 40, 255];

/// Controllable in-process capture backend
pub struct SyntheticBackend {
    gate: Mutex<Option<Arc<Notify>>>,
    failing_devices: Mutex<HashSet<String>>,
    deny_camera: AtomicBool,
    deny_screen: AtomicBool,
    cancel_next_screen: AtomicBool,
    issued_cameras: Mutex<Vec<VideoTrack>>,
    screen_ended: Mutex<Vec<watch::Sender<bool>>>,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self {
            gate: Mutex::new(None),
            failing_devices: Mutex::new(HashSet::new()),
            deny_camera: AtomicBool::new(false),
            deny_screen: AtomicBool::new(false),
            cancel_next_screen: AtomicBool::new(false),
            issued_cameras: Mutex::new(Vec::new()),
            screen_ended: Mutex::new(Vec::new()),
        }
    }

    /// Hold the next acquisition until the returned handle is notified.
    /// Models a permission prompt the user has not answered yet.
    pub fn hold_next(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock() = Some(notify.clone());
        notify
    }

    /// Make acquisitions of `device_id` fail with `DeviceUnavailable`
    pub fn fail_device(&self, device_id: &str) {
        self.failing_devices.lock().insert(device_id.to_string());
    }

    /// Refuse all camera acquisitions
    pub fn deny_camera(&self) {
        self.deny_camera.store(true, Ordering::SeqCst);
    }

    /// Refuse all screen acquisitions
    pub fn deny_screen(&self) {
        self.deny_screen.store(true, Ordering::SeqCst);
    }

    /// Dismiss the next screen-share picker
    pub fn cancel_next_screen(&self) {
        self.cancel_next_screen.store(true, Ordering::SeqCst);
    }

    /// Fire the OS-level "stop sharing" control for every live screen share
    pub fn end_screen_shares(&self) {
        for tx in self.screen_ended.lock().iter() {
            let _ = tx.send(true);
        }
    }

    /// Number of camera tracks handed out that are still live
    pub fn live_camera_count(&self) -> usize {
        self.issued_cameras
            .lock()
            .iter()
            .filter(|t| !t.is_stopped())
            .count()
    }

    async fn wait_gate(&self) {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for SyntheticBackend {
    fn capture_camera(
        &self,
        constraints: CaptureConstraints,
    ) -> BoxFuture<'_, Result<TrackSet, CaptureError>> {
        Box::pin(async move {
            self.wait_gate().await;

            if self.deny_camera.load(Ordering::SeqCst) {
                return Err(CaptureError::PermissionDenied("camera".to_string()));
            }
            if let Some(id) = &constraints.device_id {
                if self.failing_devices.lock().contains(id) {
                    return Err(CaptureError::DeviceUnavailable(id.clone()));
                }
            }

            let label = constraints
                .device_id
                .clone()
                .unwrap_or_else(|| "default camera".to_string());
            let sampler = Arc::new(SolidColorSampler::new(
                CAMERA_COLOR,
                constraints.width,
                constraints.height,
            ));
            let video = VideoTrack::new(label, sampler);
            self.issued_cameras.lock().push(video.clone());

            let audio = if constraints.audio {
                vec![AudioTrack::new("camera audio")]
            } else {
                Vec::new()
            };
            Ok(TrackSet::new(video, audio))
        })
    }

    fn capture_screen(
        &self,
        constraints: CaptureConstraints,
    ) -> BoxFuture<'_, Result<TrackSet, CaptureError>> {
        Box::pin(async move {
            self.wait_gate().await;

            if self.deny_screen.load(Ordering::SeqCst) {
                return Err(CaptureError::PermissionDenied("screen".to_string()));
            }
            if self.cancel_next_screen.swap(false, Ordering::SeqCst) {
                return Err(CaptureError::UserCancelled);
            }

            let sampler = Arc::new(SolidColorSampler::new(
                SCREEN_COLOR,
                constraints.width,
                constraints.height,
            ));
            let video = VideoTrack::new("screen share", sampler);

            let (ended_tx, ended_rx) = watch::channel(false);
            self.screen_ended.lock().push(ended_tx);

            let audio = if constraints.audio {
                vec![AudioTrack::new("screen audio")]
            } else {
                Vec::new()
            };
            Ok(TrackSet::with_ended(video, audio, ended_rx))
        })
    }
}

impl DeviceEnumerator for SyntheticBackend {
    fn enumerate(&self) -> BoxFuture<'_, Result<Vec<RawDeviceInfo>, CaptureError>> {
        Box::pin(async {
            Ok(vec![
                RawDeviceInfo {
                    device_id: "cam-front".to_string(),
                    label: "Synthetic Front Camera".to_string(),
                    kind: DeviceKind::VideoInput,
                },
                RawDeviceInfo {
                    device_id: "cam-rear".to_string(),
                    label: "Synthetic Back Camera".to_string(),
                    kind: DeviceKind::VideoInput,
                },
                RawDeviceInfo {
                    device_id: "mic-0".to_string(),
                    label: "Synthetic Microphone".to_string(),
                    kind: DeviceKind::AudioInput,
                },
            ])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_camera_capture_yields_pattern() {
        let backend = SyntheticBackend::new();
        let tracks = backend
            .capture_camera(CaptureConstraints::camera(None))
            .await
            .unwrap();

        let frame = tracks.video.sampler().latest_frame().unwrap();
        assert_eq!(frame.width, 1280);
        assert_eq!(frame.height, 720);
        assert_eq!(frame.pixel(0, 0), CAMERA_COLOR);
        assert_eq!(tracks.audio.len(), 1);
    }

    #[tokio::test]
    async fn test_screen_cancel_is_one_shot() {
        let backend = SyntheticBackend::new();
        backend.cancel_next_screen();

        let err = backend
            .capture_screen(CaptureConstraints::screen())
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::UserCancelled));

        assert!(backend
            .capture_screen(CaptureConstraints::screen())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_end_screen_shares_fires_signal() {
        let backend = SyntheticBackend::new();
        let tracks = backend
            .capture_screen(CaptureConstraints::screen())
            .await
            .unwrap();

        let mut ended = tracks.ended_signal();
        assert!(!*ended.borrow());

        backend.end_screen_shares();
        ended.changed().await.unwrap();
        assert!(*ended.borrow());
    }
}
