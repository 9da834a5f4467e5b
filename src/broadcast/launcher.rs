//! Broadcast launcher
//!
//! Validates launch preconditions in order, requests a session from the
//! injected backend, and attaches the compositor's output stream on
//! success. Not internally serialized: callers disable repeat invocation
//! while a launch is in flight.

use std::fmt;
use std::sync::Arc;

use crate::broadcast::backend::{
    AuthProvider, BroadcastRequest, SessionInfo, StreamingBackend,
};
use crate::compositor::OutputStream;
use crate::error::LaunchError;
use crate::layout::{CompositionState, LayoutMode, LayoutState};

/// Source tag reported to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTag {
    Camera,
    Screen,
}

impl SourceTag {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceTag::Camera => "camera",
            SourceTag::Screen => "screen",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `camera` by default; `screen` whenever the active layout uses a live
/// screen source, or a screen is live with no camera at all.
pub fn derive_source_tag(state: &CompositionState) -> SourceTag {
    let caps = state.capabilities;
    match state.layout {
        LayoutState::Active(LayoutMode::ScreenOnly) if caps.screen => SourceTag::Screen,
        LayoutState::Active(LayoutMode::PictureInPicture)
        | LayoutState::Active(LayoutMode::SideBySide)
            if caps.screen =>
        {
            SourceTag::Screen
        }
        _ if caps.screen && !caps.camera => SourceTag::Screen,
        _ => SourceTag::Camera,
    }
}

/// Result of a successful launch, used by the caller to transition views
#[derive(Debug, Clone)]
pub struct LaunchOutcome {
    pub stream_id: String,
    pub source: SourceTag,
    pub title: String,
    pub host_id: String,
}

/// Starts a broadcast against the injected backend
pub struct BroadcastLauncher {
    backend: Arc<dyn StreamingBackend>,
    auth: Arc<dyn AuthProvider>,
}

impl BroadcastLauncher {
    pub fn new(backend: Arc<dyn StreamingBackend>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { backend, auth }
    }

    /// Launch a broadcast. Preconditions are checked in order and the
    /// first failure wins; nothing reaches the backend before all pass.
    pub async fn launch(
        &self,
        request: BroadcastRequest,
        state: &CompositionState,
        output: OutputStream,
    ) -> Result<LaunchOutcome, LaunchError> {
        let title = request.title.trim().to_string();
        if title.is_empty() {
            return Err(LaunchError::EmptyTitle);
        }

        let user = self.auth.current_user().ok_or(LaunchError::AuthRequired)?;

        // Normally gated upstream by disabling the start action; still
        // checked so a stray invocation fails instead of hitting the
        // backend with nothing to stream.
        if !state.capabilities.any() {
            return Err(LaunchError::NoLiveSource);
        }

        let source = derive_source_tag(state);
        let request = BroadcastRequest { title: title.clone(), ..request };

        let session: SessionInfo = self
            .backend
            .create_session(request)
            .await
            .map_err(|e| LaunchError::Backend(e.to_string()))?;

        self.backend
            .attach_output(session.clone(), output)
            .await
            .map_err(|e| LaunchError::Backend(e.to_string()))?;

        tracing::info!(
            stream_id = %session.stream_id,
            source = %source,
            host = %user.id,
            "broadcast started"
        );
        Ok(LaunchOutcome {
            stream_id: session.stream_id,
            source,
            title,
            host_id: user.id,
        })
    }
}
