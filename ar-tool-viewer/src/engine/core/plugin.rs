use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;
use constants::path::CATALOG_EXTENSION;

use crate::catalog::{CatalogLoader, ToolCatalog, load_catalog_system, start_catalog_load};
use crate::controls::update_enter_button;
use crate::engine::camera::orbit_camera::{orbit_camera_input, update_orbit_cameras};
use crate::engine::core::config::ViewerConfig;
use crate::engine::core::viewer_state::{PublishedState, ViewerStateEvent, publish_state_changes};
use crate::engine::loading::asset_requests::{InFlightModel, poll_model_assets, request_model_assets};
use crate::engine::loading::model_load::{
    ModelAssetOutcome, ModelLoadRequest, ModelLoadState, apply_model_outcomes,
};
use crate::engine::scene::lighting::insert_light_settings;
use crate::engine::scene::model_fit::fit_loaded_models;
use crate::engine::scene::overlay::{exit_button_system, retry_button_system};
use crate::engine::scene::viewer_instance::{ComposedScene, sync_viewer_instance};
use crate::engine::selection::{
    RetryModelRequest, SelectionController, ToolSelectionEvent, handle_retry_requests,
    handle_tool_selection_events,
};
use crate::engine::xr::SessionMode;
use crate::engine::xr::capability::{
    CapabilityCheckRequest, CapabilityMonitor, apply_capability_signals,
    handle_capability_requests, start_capability_check,
};
use crate::engine::xr::platform::{
    PlatformInbox, PlatformSignal, drain_platform_signals, install_xr_platform,
};
use crate::engine::xr::session::{
    ArSessionRequest, SessionFailureEvent, SessionManager, apply_session_signals,
    handle_session_requests,
};
use crate::engine::xr::simulated::SimulatedXrPlatform;

/// Frame phases. Selection changes are applied before any async result is,
/// so late acknowledgements are always checked against the live token.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewerSet {
    /// Input surfaces turn user intent into request events.
    Input,
    Selection,
    /// Platform signals, asset outcomes and session requests.
    Async,
    Compose,
    Output,
}

/// Viewer core: selection, model loading, capability, session and the
/// per-token viewport.
///
/// `new()` is the full renderer. `headless()` keeps the whole state machine
/// but spawns only marker components and never touches the asset server,
/// so it runs under `MinimalPlugins`.
pub struct ToolViewerPlugin {
    config: ViewerConfig,
}

impl Default for ToolViewerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolViewerPlugin {
    pub fn new() -> Self {
        Self {
            config: ViewerConfig::default(),
        }
    }

    pub fn headless() -> Self {
        Self {
            config: ViewerConfig {
                render_stage: false,
                ..default()
            },
        }
    }

    pub fn with_session_mode(mut self, mode: SessionMode) -> Self {
        self.config.session_mode = mode;
        self
    }

    pub fn with_catalog_path(mut self, path: impl Into<String>) -> Self {
        self.config.catalog_path = path.into();
        self
    }

    pub fn with_auto_select(mut self, enabled: bool) -> Self {
        self.config.auto_select_first = enabled;
        self
    }
}

impl Plugin for ToolViewerPlugin {
    fn build(&self, app: &mut App) {
        let config = self.config.clone();
        let mode = config.session_mode;

        app.insert_resource(config.clone())
            .init_resource::<SelectionController>()
            .init_resource::<ModelLoadState>()
            .init_resource::<PlatformInbox>()
            .init_resource::<ComposedScene>()
            .init_resource::<PublishedState>()
            .insert_resource(CapabilityMonitor::new(mode))
            .insert_resource(SessionManager::new(mode))
            .add_event::<ToolSelectionEvent>()
            .add_event::<RetryModelRequest>()
            .add_event::<ModelLoadRequest>()
            .add_event::<ModelAssetOutcome>()
            .add_event::<PlatformSignal>()
            .add_event::<CapabilityCheckRequest>()
            .add_event::<ArSessionRequest>()
            .add_event::<SessionFailureEvent>()
            .add_event::<ViewerStateEvent>()
            .configure_sets(
                Update,
                (
                    ViewerSet::Input,
                    ViewerSet::Selection,
                    ViewerSet::Async,
                    ViewerSet::Compose,
                    ViewerSet::Output,
                )
                    .chain(),
            );

        // Replaced by `app_setup` or by tests through `install_xr_platform`.
        install_xr_platform(app, SimulatedXrPlatform::unsupported);

        app.add_systems(Startup, start_capability_check)
            .add_systems(
                Update,
                (handle_retry_requests, handle_tool_selection_events)
                    .chain()
                    .in_set(ViewerSet::Selection),
            )
            .add_systems(
                Update,
                (
                    drain_platform_signals,
                    apply_model_outcomes,
                    handle_capability_requests,
                    apply_capability_signals,
                    handle_session_requests,
                    apply_session_signals,
                )
                    .chain()
                    .in_set(ViewerSet::Async),
            )
            .add_systems(
                Update,
                (sync_viewer_instance, publish_state_changes)
                    .chain()
                    .in_set(ViewerSet::Compose),
            );

        if !config.render_stage {
            return;
        }

        insert_light_settings(app);
        app.add_plugins(JsonAssetPlugin::<ToolCatalog>::new(&[CATALOG_EXTENSION]))
            .init_resource::<CatalogLoader>()
            .init_resource::<InFlightModel>()
            .add_systems(Startup, start_catalog_load)
            .add_systems(
                Update,
                (load_catalog_system, exit_button_system, retry_button_system)
                    .in_set(ViewerSet::Input),
            )
            .add_systems(
                Update,
                (request_model_assets, poll_model_assets)
                    .chain()
                    .before(apply_model_outcomes)
                    .in_set(ViewerSet::Async),
            )
            .add_systems(
                Update,
                (
                    fit_loaded_models,
                    orbit_camera_input,
                    update_orbit_cameras,
                    update_enter_button,
                )
                    .after(sync_viewer_instance)
                    .in_set(ViewerSet::Compose),
            );

        #[cfg(not(target_arch = "wasm32"))]
        {
            use crate::controls::shortcuts::keyboard_shortcuts;
            use crate::controls::{enter_button_system, spawn_controls_panel};

            app.add_systems(Startup, spawn_controls_panel).add_systems(
                Update,
                (keyboard_shortcuts, enter_button_system).in_set(ViewerSet::Input),
            );
        }
    }
}
