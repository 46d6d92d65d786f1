use bevy::asset::{LoadState as AssetLoadState, RecursiveDependencyLoadState};
use bevy::prelude::*;

use crate::engine::loading::model_load::{ModelAssetOutcome, ModelLoadRequest};
use crate::engine::selection::RemountToken;
use crate::errors::AssetLoadError;

struct InFlightLoad {
    token: RemountToken,
    path: String,
    handle: Handle<Scene>,
}

/// The single outstanding model load. A newer request replaces (and drops) it.
#[derive(Resource, Default)]
pub struct InFlightModel {
    load: Option<InFlightLoad>,
}

impl InFlightModel {
    pub fn token(&self) -> Option<RemountToken> {
        self.load.as_ref().map(|load| load.token)
    }
}

pub fn request_model_assets(
    mut requests: EventReader<ModelLoadRequest>,
    mut in_flight: ResMut<InFlightModel>,
    asset_server: Res<AssetServer>,
) {
    for request in requests.read() {
        debug!(token = %request.token, path = %request.path, "Requesting model scene");
        let handle = asset_server.load(GltfAssetLabel::Scene(0).from_asset(request.path.clone()));
        in_flight.load = Some(InFlightLoad {
            token: request.token,
            path: request.path.clone(),
            handle,
        });
    }
}

/// Turn the asset server's view of the in-flight load into an outcome event.
pub fn poll_model_assets(
    mut in_flight: ResMut<InFlightModel>,
    mut outcomes: EventWriter<ModelAssetOutcome>,
    asset_server: Res<AssetServer>,
) {
    let Some(load) = &in_flight.load else {
        return;
    };

    let result = if asset_server.is_loaded_with_dependencies(&load.handle) {
        Ok(load.handle.clone())
    } else if let Some(AssetLoadState::Failed(err)) = asset_server.get_load_state(&load.handle) {
        Err(err.to_string())
    } else if let Some(RecursiveDependencyLoadState::Failed(err)) =
        asset_server.get_recursive_dependency_load_state(&load.handle)
    {
        Err(err.to_string())
    } else {
        return;
    };

    let token = load.token;
    let path = load.path.clone();
    in_flight.load = None;

    outcomes.write(ModelAssetOutcome {
        token,
        result: result.map_err(|reason| AssetLoadError { path, reason }),
    });
}
