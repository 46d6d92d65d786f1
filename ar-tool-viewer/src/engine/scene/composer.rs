use bevy::prelude::*;

use crate::engine::loading::model_load::{LoadState, ModelLoadState};
use crate::engine::selection::{RemountToken, Selection};
use crate::engine::xr::session::{ArSession, SessionStatus};

/// What the viewport shows besides the lighting rig and controls.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportContent {
    NoSelection,
    /// Fallback while the model loads.
    Loading,
    Model(Handle<Scene>),
    /// The tool has no model configured.
    NotAvailable { title: String },
    LoadFailed { title: String, reason: String },
}

impl ViewportContent {
    /// Whether the 3D stage (lights, camera, controls) is mounted.
    pub fn has_stage(&self) -> bool {
        matches!(self, Self::Loading | Self::Model(_))
    }

    /// Text shown in place of (or over) the model, if any.
    pub fn message(&self) -> Option<String> {
        use constants::overlay::{LOADING_MESSAGE, NO_SELECTION_MESSAGE};
        match self {
            Self::NoSelection => Some(NO_SELECTION_MESSAGE.to_string()),
            Self::Loading => Some(LOADING_MESSAGE.to_string()),
            Self::Model(_) => None,
            Self::NotAvailable { title } => Some(format!("3D model of {title} not yet available")),
            Self::LoadFailed { title, .. } => {
                Some(format!("Failed to load the 3D model of {title}"))
            }
        }
    }
}

/// Overlay shown only while the session is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOverlay {
    pub hint: String,
    pub exit_label: String,
}

impl Default for SessionOverlay {
    fn default() -> Self {
        use constants::overlay::{EXIT_BUTTON_LABEL, SESSION_HINT};
        Self {
            hint: SESSION_HINT.to_string(),
            exit_label: EXIT_BUTTON_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescription {
    pub token: RemountToken,
    pub content: ViewportContent,
    pub overlay: Option<SessionOverlay>,
}

/// Compose the viewport for the live selection.
///
/// Load state or session snapshots tagged with another token are treated as
/// not yet initialised for this one.
pub fn compose_scene(
    selection: &Selection,
    load: &ModelLoadState,
    session: &ArSession,
) -> SceneDescription {
    let content = match &selection.tool {
        None => ViewportContent::NoSelection,
        Some(_) if load.token() != selection.token => ViewportContent::Loading,
        Some(tool) => match load.state() {
            LoadState::NoAsset => ViewportContent::NotAvailable {
                title: tool.title.clone(),
            },
            LoadState::Pending => ViewportContent::Loading,
            LoadState::Ready(handle) => ViewportContent::Model(handle.clone()),
            LoadState::Failed(err) => ViewportContent::LoadFailed {
                title: tool.title.clone(),
                reason: err.reason.clone(),
            },
        },
    };

    let overlay = (session.status == SessionStatus::Active
        && session.bound_token == Some(selection.token))
    .then(SessionOverlay::default);

    SceneDescription {
        token: selection.token,
        content,
        overlay,
    }
}
