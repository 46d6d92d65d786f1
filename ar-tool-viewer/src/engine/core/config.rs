use bevy::prelude::*;
use constants::path::CATALOG_PATH;

use crate::engine::xr::SessionMode;

/// Runtime configuration set through the plugin builder.
#[derive(Resource, Debug, Clone)]
pub struct ViewerConfig {
    /// XR mode the capability monitor checks and the session manager requests.
    pub session_mode: SessionMode,
    pub catalog_path: String,
    /// Select the first catalog entry once the catalog resolves.
    pub auto_select_first: bool,
    /// Spawn render components (lights, camera, scene, UI). Off in headless runs,
    /// where viewer instances carry only their marker components.
    pub render_stage: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            session_mode: SessionMode::ImmersiveAr,
            catalog_path: CATALOG_PATH.to_string(),
            auto_select_first: true,
            render_stage: true,
        }
    }
}
