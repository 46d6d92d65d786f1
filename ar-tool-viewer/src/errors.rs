//! Error taxonomy for the viewer core.

use thiserror::Error;

use crate::engine::xr::session::SessionStatus;
use crate::engine::xr::SessionMode;

/// Rejections from the session lifecycle manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Entry attempted while the platform does not (or not yet) support the mode.
    #[error("AR session mode `{0}` is not supported on this device")]
    UnsupportedMode(SessionMode),
    /// A second entry while a session is already in flight.
    #[error("an AR session is already {0}")]
    SessionAlreadyActive(SessionStatus),
    /// Nothing to place: no tool selected, the tool has no model, or its
    /// load failed.
    #[error("the selected tool has no model to place in AR")]
    NoModel,
}

/// Failures reported by the XR runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("XR runtime is not available")]
    Unavailable,
    #[error("session request rejected: {0}")]
    RequestRejected(String),
    #[error("failed to end session: {0}")]
    EndFailed(String),
    #[error("no platform session is bound to this request")]
    NoSession,
}

/// A model asset that could not be turned into a renderable scene.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load model `{path}`: {reason}")]
pub struct AssetLoadError {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown tool id `{0}`")]
    UnknownTool(String),
    #[error("catalog contains duplicate tool id `{0}`")]
    DuplicateId(String),
    #[error("catalog could not be parsed: {0}")]
    Malformed(String),
}
