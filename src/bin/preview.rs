//! Preview Application
//!
//! Drives the full composition pipeline against the synthetic capture
//! backend: enumerate cameras, acquire both sources, render the dual
//! layouts for a few seconds each, then launch a logged broadcast.

use anyhow::Result;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stream_composer::{
    broadcast::{
        AuthProvider, AuthenticatedUser, BackendError, BroadcastLauncher, BroadcastRequest,
        SessionInfo, StreamingBackend,
    },
    capture::SyntheticBackend,
    compositor::{FrameCompositor, IntervalTicker, OutputStream},
    config::AppConfig,
    device::DeviceCatalog,
    layout::{LayoutController, LayoutMode, PipSettings},
    source::{SourceKind, SourceManager},
};

/// Demo backend: serializes the session request to the log instead of
/// calling a network service.
struct LoggingBackend;

impl StreamingBackend for LoggingBackend {
    fn create_session(
        &self,
        request: BroadcastRequest,
    ) -> BoxFuture<'_, Result<SessionInfo, BackendError>> {
        Box::pin(async move {
            let body = serde_json::to_string(&request)
                .map_err(|e| BackendError::new(e.to_string()))?;
            tracing::info!(request = %body, "session create request");
            Ok(SessionInfo {
                stream_id: format!("preview-{}", uuid::Uuid::new_v4()),
            })
        })
    }

    fn attach_output(
        &self,
        session: SessionInfo,
        output: OutputStream,
    ) -> BoxFuture<'_, Result<(), BackendError>> {
        Box::pin(async move {
            tracing::info!(
                stream_id = %session.stream_id,
                passthrough = output.is_passthrough(),
                audio_tracks = output.audio.len(),
                "output attached"
            );
            Ok(())
        })
    }
}

struct StaticAuth;

impl AuthProvider for StaticAuth {
    fn current_user(&self) -> Option<AuthenticatedUser> {
        Some(AuthenticatedUser {
            id: "preview-user".to_string(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting composition preview");

    let config = AppConfig::load()?;

    let backend = Arc::new(SyntheticBackend::new());

    // List available cameras
    let catalog = DeviceCatalog::new(backend.clone());
    println!("\n=== Available Cameras ===");
    for device in catalog.refresh().await? {
        println!("  {}:", device.label);
        println!("    ID: {}", device.device_id);
        println!("    Raw label: {}", device.raw_label);
    }
    println!();

    // Acquire both sources
    let sources = SourceManager::new(backend.clone());
    sources.acquire_camera(None).await?;
    sources.acquire_screen().await?;
    tracing::info!("Camera and screen sources live");

    let mut controller = LayoutController::new(PipSettings {
        size_pct: config.pip.size_pct,
        corner: config.pip.corner,
    });
    controller.apply_capabilities(sources.capabilities());

    let mut compositor = FrameCompositor::new(config.output);

    // Render each dual layout for a few seconds
    for mode in [LayoutMode::PictureInPicture, LayoutMode::SideBySide] {
        controller.select(mode)?;
        let camera = sources.tracks(SourceKind::Camera);
        let screen = sources.tracks(SourceKind::Screen);
        let output = compositor.compose(
            mode,
            camera.as_ref(),
            screen.as_ref(),
            controller.pip_handle(),
            Box::new(IntervalTicker::from_fps(config.output.fps)),
        )?;

        tracing::info!(
            layout = %controller.display_label(),
            sources = %controller.source_indicator(),
            "rendering"
        );

        let queue = output.frames()?;
        let mut consumed: usize = 0;
        let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
        while tokio::time::Instant::now() < deadline {
            while let Some(frame) = queue.try_pop() {
                consumed += 1;
                if consumed % 30 == 0 {
                    tracing::info!(
                        "Stats: {} frames consumed, seq {}, ts {:.1}s, {} overflows",
                        consumed,
                        frame.sequence,
                        frame.timestamp as f64 / 1_000_000.0,
                        queue.overflow_count()
                    );
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    // Launch a broadcast against the logging backend
    controller.select(LayoutMode::PictureInPicture)?;
    let camera = sources.tracks(SourceKind::Camera);
    let screen = sources.tracks(SourceKind::Screen);
    let output = compositor.compose(
        LayoutMode::PictureInPicture,
        camera.as_ref(),
        screen.as_ref(),
        controller.pip_handle(),
        Box::new(IntervalTicker::from_fps(config.output.fps)),
    )?;

    let launcher = BroadcastLauncher::new(Arc::new(LoggingBackend), Arc::new(StaticAuth));
    let outcome = launcher
        .launch(
            BroadcastRequest::new("Composition preview").with_description("synthetic sources"),
            &controller.composition_state(),
            output,
        )
        .await?;
    println!(
        "Broadcast {} live as {} (source: {})",
        outcome.stream_id, outcome.title, outcome.source
    );

    tokio::time::sleep(Duration::from_secs(2)).await;

    // Teardown
    compositor.stop();
    sources.release(SourceKind::Camera);
    sources.release(SourceKind::Screen);
    tracing::info!("Preview finished");
    Ok(())
}
