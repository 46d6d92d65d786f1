use bevy::pbr::{CascadeShadowConfigBuilder, DirectionalLightShadowMap};
use bevy::prelude::*;
use constants::lighting::{
    AMBIENT_BRIGHTNESS, DIRECTIONAL_LIGHTS, DirectionalLightSpec, SHADOW_FAR, SHADOW_MAP_SIZE,
    SHADOW_NEAR,
};

#[derive(Component)]
pub struct StageLight;

/// Process-wide light settings; the per-instance rig only adds directional lights.
pub fn insert_light_settings(app: &mut App) {
    app.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: AMBIENT_BRIGHTNESS,
        ..default()
    })
    .insert_resource(DirectionalLightShadowMap {
        size: SHADOW_MAP_SIZE,
    });
}

pub fn spawn_lighting_rig(commands: &mut Commands, root: Entity) {
    for spec in &DIRECTIONAL_LIGHTS {
        let mut light = commands.spawn((
            StageLight,
            Name::new(format!("{} light", spec.name)),
            directional_light(spec),
            Transform::from_translation(spec.position).looking_at(Vec3::ZERO, Vec3::Y),
            ChildOf(root),
        ));
        if spec.shadows {
            light.insert(
                CascadeShadowConfigBuilder {
                    num_cascades: 1,
                    minimum_distance: SHADOW_NEAR,
                    maximum_distance: SHADOW_FAR,
                    first_cascade_far_bound: SHADOW_FAR,
                    ..default()
                }
                .build(),
            );
        }
    }
}

fn directional_light(spec: &DirectionalLightSpec) -> DirectionalLight {
    DirectionalLight {
        color: spec.color,
        illuminance: spec.illuminance(),
        shadows_enabled: spec.shadows,
        ..default()
    }
}
