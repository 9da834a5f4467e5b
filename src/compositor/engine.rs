//! Frame compositor
//!
//! Produces the output stream for the active layout. Single-source layouts
//! pass the source's tracks through untouched with zero added latency.
//! Dual-source layouts run a cancellable render-loop task that rasterizes
//! both sources into the fixed output surface once per tick and captures
//! the result into the output frame queue.
//!
//! The loop is an explicit task with a run flag checked every iteration,
//! not self-rescheduling callbacks: teardown and restart are deterministic
//! and the loop is testable with an injected manual ticker.

use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::compositor::geometry;
use crate::compositor::surface::{RasterSurface, WHITE};
use crate::config::VideoConfig;
use crate::constants::FRAME_QUEUE_CAPACITY;
use crate::error::CompositorError;
use crate::frame::{create_shared_queue, SharedFrameQueue};
use crate::layout::{LayoutMode, PipSettings};
use crate::source::{AudioTrack, TrackSet, VideoTrack};

/// Drives render-loop iterations, one tick per display-refresh opportunity
pub trait Ticker: Send {
    fn next_tick(&mut self) -> BoxFuture<'_, ()>;
}

/// Production ticker at a fixed frame rate; missed ticks are skipped, not
/// replayed, so the loop never composites a backlog.
pub struct IntervalTicker {
    interval: tokio::time::Interval,
}

impl IntervalTicker {
    pub fn from_fps(fps: u32) -> Self {
        let period = Duration::from_micros(1_000_000 / u64::from(fps.max(1)));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        Self { interval }
    }
}

impl Ticker for IntervalTicker {
    fn next_tick(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.interval.tick().await;
        })
    }
}

/// Test ticker driven by hand; one message per render-loop iteration
pub struct ManualTicker {
    rx: mpsc::Receiver<()>,
}

impl ManualTicker {
    pub fn new() -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel(64);
        (tx, Self { rx })
    }
}

impl Ticker for ManualTicker {
    fn next_tick(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if self.rx.recv().await.is_none() {
                // Driver gone, never tick again
                futures_util::future::pending::<()>().await;
            }
        })
    }
}

/// Video half of the output stream
pub enum VideoFeed {
    /// A single-source layout hands the source track through unmodified
    Passthrough(VideoTrack),
    /// A dual-source layout captures the raster surface into a frame queue
    Composited(SharedFrameQueue),
}

/// The compositor's product: a live, non-restartable frame sequence plus
/// passthrough audio from the sources the layout uses
pub struct OutputStream {
    pub video: VideoFeed,
    pub audio: Vec<AudioTrack>,
}

impl std::fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let video = match &self.video {
            VideoFeed::Passthrough(track) => format!("Passthrough({})", track.id()),
            VideoFeed::Composited(_) => "Composited".to_string(),
        };
        f.debug_struct("OutputStream")
            .field("video", &video)
            .field("audio", &self.audio.iter().map(|a| a.id()).collect::<Vec<_>>())
            .finish()
    }
}

impl OutputStream {
    pub fn is_passthrough(&self) -> bool {
        matches!(self.video, VideoFeed::Passthrough(_))
    }

    /// The composited frame queue, if this output is composited
    pub fn frames(&self) -> Result<&SharedFrameQueue, CompositorError> {
        match &self.video {
            VideoFeed::Composited(queue) => Ok(queue),
            VideoFeed::Passthrough(_) => Err(CompositorError::NotComposite),
        }
    }
}

struct ActiveLoop {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    mode: LayoutMode,
}

/// Merges two live sources into one output frame stream per the layout rule
pub struct FrameCompositor {
    output: VideoConfig,
    active: Option<ActiveLoop>,
}

impl FrameCompositor {
    pub fn new(output: VideoConfig) -> Self {
        Self {
            output,
            active: None,
        }
    }

    /// Build the output stream for `mode`.
    ///
    /// Any running render loop is torn down first; a mode change is a full
    /// restart with a fresh queue, never a resume. The ticker is only used
    /// for dual-source layouts.
    pub fn compose(
        &mut self,
        mode: LayoutMode,
        camera: Option<&TrackSet>,
        screen: Option<&TrackSet>,
        pip: Arc<RwLock<PipSettings>>,
        ticker: Box<dyn Ticker>,
    ) -> Result<OutputStream, CompositorError> {
        self.stop();

        match mode {
            LayoutMode::CameraOnly => {
                let tracks = camera
                    .filter(|t| t.is_live())
                    .ok_or_else(|| CompositorError::MissingSource("camera".to_string()))?;
                Ok(OutputStream {
                    video: VideoFeed::Passthrough(tracks.video.clone()),
                    audio: tracks.audio.clone(),
                })
            }
            LayoutMode::ScreenOnly => {
                let tracks = screen
                    .filter(|t| t.is_live())
                    .ok_or_else(|| CompositorError::MissingSource("screen".to_string()))?;
                Ok(OutputStream {
                    video: VideoFeed::Passthrough(tracks.video.clone()),
                    audio: tracks.audio.clone(),
                })
            }
            LayoutMode::PictureInPicture | LayoutMode::SideBySide => {
                let camera = camera
                    .filter(|t| t.is_live())
                    .ok_or_else(|| CompositorError::MissingSource("camera".to_string()))?;
                let screen = screen
                    .filter(|t| t.is_live())
                    .ok_or_else(|| CompositorError::MissingSource("screen".to_string()))?;

                let queue = create_shared_queue(FRAME_QUEUE_CAPACITY);
                let running = Arc::new(AtomicBool::new(true));
                let handle = tokio::spawn(render_loop(
                    mode,
                    self.output,
                    camera.video.clone(),
                    screen.video.clone(),
                    pip,
                    queue.clone(),
                    running.clone(),
                    ticker,
                ));
                self.active = Some(ActiveLoop {
                    running,
                    handle,
                    mode,
                });

                let mut audio = camera.audio.clone();
                audio.extend(screen.audio.iter().cloned());
                Ok(OutputStream {
                    video: VideoFeed::Composited(queue),
                    audio,
                })
            }
        }
    }

    /// Tear down the render loop. No callbacks stay scheduled afterwards.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.running.store(false, Ordering::SeqCst);
            active.handle.abort();
            tracing::debug!(mode = %active.mode, "render loop stopped");
        }
    }

    /// Whether a render loop is currently scheduling itself
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .map(|active| active.running.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}

impl Drop for FrameCompositor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[allow(clippy::too_many_arguments)]
async fn render_loop(
    mode: LayoutMode,
    output: VideoConfig,
    camera: VideoTrack,
    screen: VideoTrack,
    pip: Arc<RwLock<PipSettings>>,
    queue: SharedFrameQueue,
    running: Arc<AtomicBool>,
    mut ticker: Box<dyn Ticker>,
) {
    let (width, height) = (output.width, output.height);
    let mut surface = RasterSurface::new(width, height);
    let start = Instant::now();
    let mut sequence: u32 = 0;

    loop {
        ticker.next_tick().await;
        if !running.load(Ordering::SeqCst) {
            break;
        }
        // Stop scheduling the moment a required source is gone; the
        // source manager's capability change handles the layout fallback.
        if camera.is_stopped() || screen.is_stopped() {
            tracing::debug!(mode = %mode, "source lost, render loop halting");
            running.store(false, Ordering::SeqCst);
            break;
        }

        let screen_frame = screen.sampler().latest_frame();
        let camera_frame = camera.sampler().latest_frame();

        match mode {
            LayoutMode::PictureInPicture => {
                if let Some(frame) = &screen_frame {
                    surface.draw_frame(frame, geometry::full_surface(width, height));
                }
                let settings = *pip.read();
                let overlay = geometry::pip_overlay(width, height, settings.size_pct, settings.corner);
                surface.fill_rect(geometry::pip_border(overlay), WHITE);
                if let Some(frame) = &camera_frame {
                    surface.draw_frame(frame, overlay);
                }
            }
            LayoutMode::SideBySide => {
                let (left, right) = geometry::side_by_side_halves(width, height);
                if let Some(frame) = &screen_frame {
                    surface.draw_frame(frame, left);
                }
                if let Some(frame) = &camera_frame {
                    surface.draw_frame(frame, right);
                }
                surface.fill_rect(geometry::separator(width, height), WHITE);
            }
            LayoutMode::CameraOnly | LayoutMode::ScreenOnly => {
                // Single-source layouts never reach the render loop.
                break;
            }
        }

        queue.push(surface.snapshot(start.elapsed().as_micros() as u64, sequence));
        sequence = sequence.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::synthetic::{SolidColorSampler, CAMERA_COLOR, SCREEN_COLOR};
    use crate::frame::VideoFrame;
    use crate::layout::Corner;

    fn camera_tracks() -> TrackSet {
        TrackSet::new(
            VideoTrack::new(
                "camera",
                Arc::new(SolidColorSampler::new(CAMERA_COLOR, 640, 360)),
            ),
            vec![AudioTrack::new("camera audio")],
        )
    }

    fn screen_tracks() -> TrackSet {
        TrackSet::new(
            VideoTrack::new(
                "screen",
                Arc::new(SolidColorSampler::new(SCREEN_COLOR, 1920, 1080)),
            ),
            vec![AudioTrack::new("screen audio")],
        )
    }

    fn output_config() -> VideoConfig {
        VideoConfig {
            width: 1280,
            height: 720,
            fps: 30,
        }
    }

    fn pip_handle(size_pct: u8, corner: Corner) -> Arc<RwLock<PipSettings>> {
        Arc::new(RwLock::new(PipSettings { size_pct, corner }))
    }

    async fn next_frame(queue: &SharedFrameQueue, ticks: &mpsc::Sender<()>) -> VideoFrame {
        ticks.send(()).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(frame) = queue.try_pop() {
                    return frame;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("render loop produced no frame")
    }

    async fn wait_stopped(compositor: &FrameCompositor) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while compositor.is_running() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("render loop did not halt");
    }

    #[tokio::test]
    async fn test_single_source_layouts_pass_through() {
        let mut compositor = FrameCompositor::new(output_config());
        let camera = camera_tracks();
        let (_tx, ticker) = ManualTicker::new();

        let output = compositor
            .compose(
                LayoutMode::CameraOnly,
                Some(&camera),
                None,
                pip_handle(25, Corner::TopRight),
                Box::new(ticker),
            )
            .unwrap();

        assert!(output.is_passthrough());
        assert!(!compositor.is_running());
        match &output.video {
            VideoFeed::Passthrough(track) => assert_eq!(track.id(), camera.video.id()),
            VideoFeed::Composited(_) => panic!("expected passthrough"),
        }
        assert_eq!(output.audio.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_source_is_rejected() {
        let mut compositor = FrameCompositor::new(output_config());
        let camera = camera_tracks();
        let (_tx, ticker) = ManualTicker::new();

        let err = compositor
            .compose(
                LayoutMode::SideBySide,
                Some(&camera),
                None,
                pip_handle(25, Corner::TopRight),
                Box::new(ticker),
            )
            .unwrap_err();
        assert!(matches!(err, CompositorError::MissingSource(_)));
        assert!(!compositor.is_running());
    }

    #[tokio::test]
    async fn test_pip_geometry_in_rendered_frame() {
        let mut compositor = FrameCompositor::new(output_config());
        let camera = camera_tracks();
        let screen = screen_tracks();
        let (ticks, ticker) = ManualTicker::new();

        let output = compositor
            .compose(
                LayoutMode::PictureInPicture,
                Some(&camera),
                Some(&screen),
                pip_handle(25, Corner::TopRight),
                Box::new(ticker),
            )
            .unwrap();
        let queue = output.frames().unwrap();

        let frame = next_frame(queue, &ticks).await;
        assert_eq!((frame.width, frame.height), (1280, 720));

        // Screen fills the background
        assert_eq!(frame.pixel(0, 719), SCREEN_COLOR);
        assert_eq!(frame.pixel(640, 360), SCREEN_COLOR);
        // Overlay occupies (940, 20)..(1260, 200)
        assert_eq!(frame.pixel(1000, 100), CAMERA_COLOR);
        assert_eq!(frame.pixel(941, 21), CAMERA_COLOR);
        // 3px border outlines the overlay
        assert_eq!(frame.pixel(938, 18), WHITE);
        assert_eq!(frame.pixel(1261, 100), WHITE);
        // Just outside the border is screen again
        assert_eq!(frame.pixel(930, 100), SCREEN_COLOR);

        // Both sources supply passthrough audio
        assert_eq!(output.audio.len(), 2);
    }

    #[tokio::test]
    async fn test_pip_size_change_applies_next_frame() {
        let mut compositor = FrameCompositor::new(output_config());
        let camera = camera_tracks();
        let screen = screen_tracks();
        let (ticks, ticker) = ManualTicker::new();
        let pip = pip_handle(25, Corner::TopLeft);

        let output = compositor
            .compose(
                LayoutMode::PictureInPicture,
                Some(&camera),
                Some(&screen),
                pip.clone(),
                Box::new(ticker),
            )
            .unwrap();
        let queue = output.frames().unwrap();

        let frame = next_frame(queue, &ticks).await;
        // 25% top-left overlay is (20, 20)..(340, 200); x=400 is screen
        assert_eq!(frame.pixel(400, 100), SCREEN_COLOR);

        pip.write().size_pct = 50;
        let frame = next_frame(queue, &ticks).await;
        // 50% overlay is (20, 20)..(660, 380); x=400 is now camera
        assert_eq!(frame.pixel(400, 100), CAMERA_COLOR);
    }

    #[tokio::test]
    async fn test_side_by_side_rendered_frame() {
        let mut compositor = FrameCompositor::new(output_config());
        let camera = camera_tracks();
        let screen = screen_tracks();
        let (ticks, ticker) = ManualTicker::new();

        let output = compositor
            .compose(
                LayoutMode::SideBySide,
                Some(&camera),
                Some(&screen),
                pip_handle(25, Corner::TopRight),
                Box::new(ticker),
            )
            .unwrap();
        let queue = output.frames().unwrap();

        let frame = next_frame(queue, &ticks).await;
        // Screen on the left half, camera on the right half
        assert_eq!(frame.pixel(100, 360), SCREEN_COLOR);
        assert_eq!(frame.pixel(638, 0), SCREEN_COLOR);
        assert_eq!(frame.pixel(700, 360), CAMERA_COLOR);
        assert_eq!(frame.pixel(1279, 719), CAMERA_COLOR);
        // Separator covers the midline over the full height
        assert_eq!(frame.pixel(640, 0), WHITE);
        assert_eq!(frame.pixel(639, 719), WHITE);
    }

    #[tokio::test]
    async fn test_loop_halts_when_source_is_lost() {
        let mut compositor = FrameCompositor::new(output_config());
        let camera = camera_tracks();
        let screen = screen_tracks();
        let (ticks, ticker) = ManualTicker::new();

        let output = compositor
            .compose(
                LayoutMode::PictureInPicture,
                Some(&camera),
                Some(&screen),
                pip_handle(25, Corner::TopRight),
                Box::new(ticker),
            )
            .unwrap();
        let queue = output.frames().unwrap();
        let _ = next_frame(queue, &ticks).await;

        screen.stop_all();
        ticks.send(()).await.unwrap();
        wait_stopped(&compositor).await;

        // No frame came out of the post-loss tick
        assert!(queue.try_pop().is_none());
    }

    #[tokio::test]
    async fn test_mode_change_restarts_loop_with_fresh_queue() {
        let mut compositor = FrameCompositor::new(output_config());
        let camera = camera_tracks();
        let screen = screen_tracks();

        let (ticks_a, ticker_a) = ManualTicker::new();
        let output_a = compositor
            .compose(
                LayoutMode::PictureInPicture,
                Some(&camera),
                Some(&screen),
                pip_handle(25, Corner::TopRight),
                Box::new(ticker_a),
            )
            .unwrap();
        let queue_a = output_a.frames().unwrap().clone();
        let _ = next_frame(&queue_a, &ticks_a).await;
        let pushed_before = queue_a.pushed_total();

        let (ticks_b, ticker_b) = ManualTicker::new();
        let output_b = compositor
            .compose(
                LayoutMode::SideBySide,
                Some(&camera),
                Some(&screen),
                pip_handle(25, Corner::TopRight),
                Box::new(ticker_b),
            )
            .unwrap();
        let queue_b = output_b.frames().unwrap();

        let frame = next_frame(queue_b, &ticks_b).await;
        assert_eq!(frame.sequence, 0, "restart starts a fresh stream");

        // The old loop is gone; its queue receives nothing further.
        let _ = ticks_a.send(()).await;
        tokio::task::yield_now().await;
        assert_eq!(queue_a.pushed_total(), pushed_before);
        assert!(compositor.is_running());
    }

    #[tokio::test]
    async fn test_stop_tears_down() {
        let mut compositor = FrameCompositor::new(output_config());
        let camera = camera_tracks();
        let screen = screen_tracks();
        let (ticks, ticker) = ManualTicker::new();

        let output = compositor
            .compose(
                LayoutMode::SideBySide,
                Some(&camera),
                Some(&screen),
                pip_handle(25, Corner::TopRight),
                Box::new(ticker),
            )
            .unwrap();
        let queue = output.frames().unwrap();
        let _ = next_frame(queue, &ticks).await;

        compositor.stop();
        assert!(!compositor.is_running());

        let _ = ticks.send(()).await;
        tokio::task::yield_now().await;
        assert!(queue.try_pop().is_none());
    }
}
