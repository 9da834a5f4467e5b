//! Backend and auth boundaries
//!
//! The engine never implements the network protocol; session creation is a
//! single injected async operation returning a structured result, and the
//! output stream is attached to the session after success.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compositor::OutputStream;

/// Parameters of a broadcast, created only at launch time and never
/// persisted by this engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl BroadcastRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            thumbnail_url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }
}

/// A successfully created broadcast session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub stream_id: String,
}

/// Failure reported by the streaming backend, surfaced verbatim
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The external streaming backend collaborator
pub trait StreamingBackend: Send + Sync {
    /// Register a new broadcast session
    fn create_session(
        &self,
        request: BroadcastRequest,
    ) -> BoxFuture<'_, Result<SessionInfo, BackendError>>;

    /// Attach the composited output as the session's outgoing stream
    fn attach_output(
        &self,
        session: SessionInfo,
        output: OutputStream,
    ) -> BoxFuture<'_, Result<(), BackendError>>;
}

/// An authenticated presenter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: String,
}

/// The external authentication collaborator
pub trait AuthProvider: Send + Sync {
    /// The currently signed-in user, if any
    fn current_user(&self) -> Option<AuthenticatedUser>;
}
