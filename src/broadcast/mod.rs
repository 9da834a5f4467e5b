//! Broadcast session launch

pub mod backend;
pub mod launcher;

pub use backend::{
    AuthProvider, AuthenticatedUser, BackendError, BroadcastRequest, SessionInfo, StreamingBackend,
};
pub use launcher::{BroadcastLauncher, LaunchOutcome, SourceTag};
