//! Error types for the composition engine

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Compositor error: {0}")]
    Compositor(#[from] CompositorError),

    #[error("Launch error: {0}")]
    Launch(#[from] LaunchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source acquisition and device errors
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The user or OS refused camera/screen access. Reported, never retried
    /// automatically.
    #[error("Permission denied for {0}")]
    PermissionDenied(String),

    /// The requested device id no longer exists.
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The screen-share picker was dismissed. Callers leave state unchanged
    /// and report nothing.
    #[error("Capture cancelled by user")]
    UserCancelled,

    #[error("Capture backend error: {0}")]
    Backend(String),
}

/// Layout state machine errors
#[derive(Error, Debug)]
pub enum LayoutError {
    /// A layout was requested whose source requirement is not met; the
    /// controller stays in its current state.
    #[error("Layout {layout} needs sources that are not live: {missing}")]
    SourcesUnavailable { layout: String, missing: String },

    #[error("Invalid PiP size {0}% (must be 1-100)")]
    InvalidPipSize(u8),
}

/// Frame composition errors
#[derive(Error, Debug)]
pub enum CompositorError {
    /// A layout was handed to the compositor without the source it draws.
    #[error("Missing live {0} source for the requested layout")]
    MissingSource(String),

    #[error("No composited output is active")]
    NotComposite,
}

/// Broadcast launch errors
#[derive(Error, Debug)]
pub enum LaunchError {
    /// Title was empty after trimming. Checked before any backend call.
    #[error("Broadcast title must not be empty")]
    EmptyTitle,

    /// No authenticated user; the caller redirects to a login flow.
    #[error("Authentication required")]
    AuthRequired,

    /// Reached only if upstream gating failed; never calls the backend.
    #[error("No live source to broadcast")]
    NoLiveSource,

    /// Session creation rejected by the backend, surfaced verbatim.
    #[error("Backend rejected the broadcast: {0}")]
    Backend(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to write config: {0}")]
    Write(String),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
