use bevy::prelude::*;
use bevy::window::PresentMode;

/// Primary window: fills the `#bevy` canvas on the web, a plain vsynced
/// window elsewhere.
pub fn create_window_config() -> Window {
    #[cfg(target_arch = "wasm32")]
    {
        Window {
            canvas: Some(constants::path::CANVAS_SELECTOR.to_string()),
            fit_canvas_to_parent: true,
            prevent_default_event_handling: false,
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Window {
            title: "AR Tool Viewer".to_string(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }
}
