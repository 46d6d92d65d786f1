use bevy::prelude::*;

use crate::engine::selection::{RemountToken, Selection};
use crate::errors::AssetLoadError;

/// Load state of the selected tool's model, scoped to one remount token.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    /// The tool has no model configured. Terminal for its token.
    #[default]
    NoAsset,
    Pending,
    Ready(Handle<Scene>),
    Failed(AssetLoadError),
}

impl LoadState {
    /// Identifier used in frontend notifications.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoAsset => "no_asset",
            Self::Pending => "pending",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Resource, Debug, Default)]
pub struct ModelLoadState {
    token: RemountToken,
    state: LoadState,
}

impl ModelLoadState {
    /// Restart tracking for a new selection. Never inherits the previous state.
    pub fn begin_load(&mut self, selection: &Selection) -> &LoadState {
        self.token = selection.token;
        self.state = match selection.tool.as_ref().and_then(|tool| tool.model_path()) {
            Some(_) => LoadState::Pending,
            None => LoadState::NoAsset,
        };
        &self.state
    }

    /// Apply a resolved asset. Returns `false` when the result was discarded.
    pub fn on_asset_resolved(&mut self, token: RemountToken, handle: Handle<Scene>) -> bool {
        if !self.accepts(token) {
            return false;
        }
        self.state = LoadState::Ready(handle);
        true
    }

    /// Apply a load failure. Returns `false` when the result was discarded.
    pub fn on_asset_failed(&mut self, token: RemountToken, error: AssetLoadError) -> bool {
        if !self.accepts(token) {
            return false;
        }
        self.state = LoadState::Failed(error);
        true
    }

    pub fn token(&self) -> RemountToken {
        self.token
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Whether the viewer at `live` has a model to place in AR. A load that
    /// is still pending counts; the session shows it once it arrives.
    pub fn is_placeable(&self, live: RemountToken) -> bool {
        self.token == live && matches!(self.state, LoadState::Pending | LoadState::Ready(_))
    }

    fn accepts(&self, token: RemountToken) -> bool {
        token == self.token && self.state == LoadState::Pending
    }
}

/// Ask the asset loader for a model. At most one per token.
#[derive(Event, Debug, Clone)]
pub struct ModelLoadRequest {
    pub token: RemountToken,
    pub path: String,
}

/// Completion of a model load, tagged with the token it was issued under.
#[derive(Event, Debug, Clone)]
pub struct ModelAssetOutcome {
    pub token: RemountToken,
    pub result: Result<Handle<Scene>, AssetLoadError>,
}

pub fn apply_model_outcomes(
    mut outcomes: EventReader<ModelAssetOutcome>,
    mut model_load: ResMut<ModelLoadState>,
) {
    for outcome in outcomes.read() {
        let applied = match &outcome.result {
            Ok(handle) => model_load.on_asset_resolved(outcome.token, handle.clone()),
            Err(err) => {
                let applied = model_load.on_asset_failed(outcome.token, err.clone());
                if applied {
                    warn!(token = %outcome.token, "{err}");
                }
                applied
            }
        };

        if !applied {
            debug!(
                token = %outcome.token,
                live = %model_load.token(),
                "Discarding model outcome for superseded viewer"
            );
        }
    }
}
