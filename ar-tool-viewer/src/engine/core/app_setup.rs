use bevy::asset::AssetMetaCheck;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use constants::session::LOG_FILTER;

use crate::engine::core::plugin::ToolViewerPlugin;
use crate::engine::core::window_config::create_window_config;
use crate::engine::xr::platform::install_xr_platform;

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .add_plugins(ToolViewerPlugin::new());

    install_runtime_platform(&mut app);

    // The page drives the viewer over postMessage on the web.
    #[cfg(target_arch = "wasm32")]
    app.add_plugins(crate::rpc::web_rpc::WebRpcPlugin);

    app
}

#[cfg(target_arch = "wasm32")]
fn install_runtime_platform(app: &mut App) {
    use crate::engine::xr::web_xr::WebXrPlatform;

    install_xr_platform(app, WebXrPlatform::new);
}

/// Native builds have no XR runtime. Setting the simulate variable stands in
/// a runtime that accepts every session.
#[cfg(not(target_arch = "wasm32"))]
fn install_runtime_platform(app: &mut App) {
    use constants::session::SIMULATE_XR_ENV;

    use crate::engine::xr::simulated::SimulatedXrPlatform;

    let simulate = std::env::var(SIMULATE_XR_ENV).is_ok_and(|value| value == "1");
    if simulate {
        info!("Using simulated XR runtime");
        install_xr_platform(app, SimulatedXrPlatform::supported);
    } else {
        install_xr_platform(app, SimulatedXrPlatform::unsupported);
    }
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    let log_config = LogPlugin {
        filter: LOG_FILTER.to_string(),
        ..default()
    };

    DefaultPlugins
        .set(window_config)
        .set(asset_config)
        .set(log_config)
}
