use bevy::color::Color;

pub const LOADING_MESSAGE: &str = "Loading model...";
pub const NO_SELECTION_MESSAGE: &str = "No tool selected";
pub const SESSION_HINT: &str = "Move your device slowly to place the model";

pub const EXIT_BUTTON_LABEL: &str = "Exit AR";
pub const EXIT_BUTTON_COLOR: Color = Color::srgb(0.937, 0.267, 0.267);
pub const EXIT_BUTTON_MARGIN_PX: f32 = 16.0;

pub const ENTER_BUTTON_COLOR: Color = Color::srgb(0.2, 0.2, 0.2);
pub const ENTER_BUTTON_DISABLED_COLOR: Color = Color::srgb(0.55, 0.55, 0.55);

pub const MESSAGE_FONT_SIZE: f32 = 18.0;
pub const MESSAGE_COLOR: Color = Color::srgb(0.25, 0.25, 0.25);

pub const ENTER_LABEL_CHECKING: &str = "Checking AR support...";
pub const ENTER_LABEL_AVAILABLE: &str = "Enter AR";
pub const ENTER_LABEL_UNAVAILABLE: &str = "AR not supported";
pub const ENTER_LABEL_NO_MODEL: &str = "No model to place";
pub const CONTROLS_MARGIN_PX: f32 = 12.0;
