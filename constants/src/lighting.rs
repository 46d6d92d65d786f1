use bevy::color::Color;
use bevy::math::Vec3;

/// Conversion from relative design light intensities to lux.
pub const LUX_PER_INTENSITY: f32 = 2_500.0;

/// Ambient fill shared by every viewer instance.
pub const AMBIENT_INTENSITY: f32 = 0.4;
/// Ambient brightness in cd/m^2, scaled from the relative intensity.
pub const AMBIENT_BRIGHTNESS: f32 = AMBIENT_INTENSITY * 200.0;

pub struct DirectionalLightSpec {
    pub name: &'static str,
    pub position: Vec3,
    pub intensity: f32,
    pub color: Color,
    pub shadows: bool,
}

impl DirectionalLightSpec {
    pub fn illuminance(&self) -> f32 {
        self.intensity * LUX_PER_INTENSITY
    }
}

pub const KEY_LIGHT: DirectionalLightSpec = DirectionalLightSpec {
    name: "key",
    position: Vec3::new(1.0, 10.0, 1.0),
    intensity: 4.0,
    color: Color::WHITE,
    shadows: true,
};

pub const FILL_LIGHT: DirectionalLightSpec = DirectionalLightSpec {
    name: "fill",
    position: Vec3::new(1.0, -10.0, -1.0),
    intensity: 2.0,
    color: Color::WHITE,
    shadows: false,
};

/// Warm rim light, #D68270.
pub const RIM_LIGHT: DirectionalLightSpec = DirectionalLightSpec {
    name: "rim",
    position: Vec3::new(-1.0, 0.0, 1.0),
    intensity: 1.3,
    color: Color::srgb(214.0 / 255.0, 130.0 / 255.0, 112.0 / 255.0),
    shadows: false,
};

pub const DIRECTIONAL_LIGHTS: [DirectionalLightSpec; 3] = [KEY_LIGHT, FILL_LIGHT, RIM_LIGHT];

// Key light shadow cascade.
pub const SHADOW_MAP_SIZE: usize = 1024;
pub const SHADOW_NEAR: f32 = 0.1;
pub const SHADOW_FAR: f32 = 50.0;
