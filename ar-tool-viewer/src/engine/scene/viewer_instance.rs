use bevy::prelude::*;

use crate::engine::camera::orbit_camera::OrbitCamera;
use crate::engine::core::config::ViewerConfig;
use crate::engine::loading::model_load::ModelLoadState;
use crate::engine::scene::composer::{SceneDescription, ViewportContent, compose_scene};
use crate::engine::scene::lighting::spawn_lighting_rig;
use crate::engine::scene::model_fit::PendingFit;
use crate::engine::scene::overlay::{spawn_session_overlay, spawn_viewport_message};
use crate::engine::selection::{RemountToken, SelectionController};
use crate::engine::xr::session::SessionManager;

/// Root of one viewer generation. Lights, camera and model are its descendants.
#[derive(Component, Debug, Clone, Copy)]
pub struct ViewerInstance {
    pub token: RemountToken,
}

/// The spawned model scene.
#[derive(Component)]
pub struct ModelRoot;

#[derive(Component)]
pub struct ViewerCamera;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Message,
    Overlay,
}

/// Top-level UI entity belonging to a viewer generation.
#[derive(Component, Debug, Clone, Copy)]
pub struct InstancePart {
    pub token: RemountToken,
    pub kind: PartKind,
}

/// Last description pushed to the world and the instance it lives in.
#[derive(Resource, Default)]
pub struct ComposedScene {
    current: Option<SceneDescription>,
    instance: Option<Entity>,
}

impl ComposedScene {
    pub fn description(&self) -> Option<&SceneDescription> {
        self.current.as_ref()
    }

    pub fn instance(&self) -> Option<Entity> {
        self.instance
    }
}

/// Recompose the viewport and reconcile entities with the result.
///
/// A new token (or the stage mounting/unmounting) tears the old instance down
/// completely before the new one is spawned. Otherwise only the parts that
/// changed are replaced.
pub fn sync_viewer_instance(
    mut commands: Commands,
    mut composed: ResMut<ComposedScene>,
    controller: Res<SelectionController>,
    model_load: Res<ModelLoadState>,
    session: Res<SessionManager>,
    config: Res<ViewerConfig>,
    parts: Query<(Entity, &InstancePart)>,
    models: Query<Entity, With<ModelRoot>>,
) {
    let next = compose_scene(controller.selection(), &model_load, &session.session());

    let (content_changed, overlay_changed, remount) = match (&composed.current, composed.instance)
    {
        (Some(current), Some(_)) => (
            current.content != next.content,
            current.overlay != next.overlay,
            current.token != next.token
                || current.content.has_stage() != next.content.has_stage(),
        ),
        _ => (true, true, true),
    };
    if !content_changed && !overlay_changed && !remount {
        return;
    }

    if remount {
        if let Some(old) = composed.instance.take() {
            commands.entity(old).despawn();
        }
        for (entity, _) in &parts {
            commands.entity(entity).despawn();
        }
        let root = spawn_instance(&mut commands, &next, &config);
        composed.instance = Some(root);
        info!(token = %next.token, stage = next.content.has_stage(), "Viewer instance mounted");
    } else if let Some(root) = composed.instance {
        if content_changed {
            for entity in &models {
                commands.entity(entity).despawn();
            }
            despawn_parts(&mut commands, &parts, PartKind::Message);
            spawn_content(&mut commands, root, next.token, &next.content, &config);
        }
        if overlay_changed {
            despawn_parts(&mut commands, &parts, PartKind::Overlay);
            spawn_overlay(&mut commands, &next, &config);
        }
    }

    composed.current = Some(next);
}

fn despawn_parts(commands: &mut Commands, parts: &Query<(Entity, &InstancePart)>, kind: PartKind) {
    for (entity, part) in parts {
        if part.kind == kind {
            commands.entity(entity).despawn();
        }
    }
}

fn spawn_instance(commands: &mut Commands, scene: &SceneDescription, config: &ViewerConfig) -> Entity {
    let root = commands
        .spawn((
            ViewerInstance { token: scene.token },
            Name::new(format!("Viewer {}", scene.token)),
            Transform::default(),
            Visibility::default(),
        ))
        .id();

    if config.render_stage {
        spawn_camera(commands, root, scene.content.has_stage());
        if scene.content.has_stage() {
            spawn_lighting_rig(commands, root);
        }
    }
    spawn_content(commands, root, scene.token, &scene.content, config);
    spawn_overlay(commands, scene, config);
    root
}

fn spawn_camera(commands: &mut Commands, root: Entity, orbit: bool) {
    let controls = OrbitCamera::default();
    let mut camera = commands.spawn((
        ViewerCamera,
        Camera3d::default(),
        controls.transform(),
        ChildOf(root),
    ));
    if orbit {
        camera.insert(controls);
    }
}

fn spawn_content(
    commands: &mut Commands,
    root: Entity,
    token: RemountToken,
    content: &ViewportContent,
    config: &ViewerConfig,
) {
    if let ViewportContent::Model(handle) = content {
        let mut model = commands.spawn((ModelRoot, Transform::default(), ChildOf(root)));
        if config.render_stage {
            model.insert((SceneRoot(handle.clone()), PendingFit));
        }
    }

    if content.message().is_some() {
        let mut part = commands.spawn(InstancePart {
            token,
            kind: PartKind::Message,
        });
        if config.render_stage {
            spawn_viewport_message(&mut part, content);
        }
    }
}

fn spawn_overlay(commands: &mut Commands, scene: &SceneDescription, config: &ViewerConfig) {
    let Some(overlay) = &scene.overlay else {
        return;
    };
    let mut part = commands.spawn(InstancePart {
        token: scene.token,
        kind: PartKind::Overlay,
    });
    if config.render_stage {
        spawn_session_overlay(&mut part, overlay);
    }
}
