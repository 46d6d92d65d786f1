use bevy::math::Affine3A;
use bevy::prelude::*;
use bevy::render::mesh::MeshAabb;
use bevy::render::primitives::Aabb;
use constants::stage::MODEL_FIT_SIZE;

use crate::engine::scene::viewer_instance::ModelRoot;

/// A model root whose scene has not been measured yet.
#[derive(Component)]
pub struct PendingFit;

/// Axis-aligned extent of a model, in the space of its root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for ModelBounds {
    fn default() -> Self {
        Self {
            min: Vec3::INFINITY,
            max: Vec3::NEG_INFINITY,
        }
    }
}

impl ModelBounds {
    pub fn update(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Uniform scale bringing the largest side to `target`, centred on the
    /// root's origin. Empty or flat-to-a-point bounds leave the model as is.
    pub fn fit_transform(&self, target: f32) -> Transform {
        let extent = self.size().max_element();
        if self.is_empty() || !extent.is_finite() || extent <= f32::EPSILON {
            return Transform::IDENTITY;
        }
        let scale = target / extent;
        Transform::from_translation(-self.center() * scale).with_scale(Vec3::splat(scale))
    }

    fn include_aabb(&mut self, aabb: &Aabb, affine: Affine3A) {
        let (min, max) = (Vec3::from(aabb.min()), Vec3::from(aabb.max()));
        for x in [min.x, max.x] {
            for y in [min.y, max.y] {
                for z in [min.z, max.z] {
                    self.update(affine.transform_point3(Vec3::new(x, y, z)));
                }
            }
        }
    }
}

/// Fit each freshly spawned model into a `MODEL_FIT_SIZE` box.
///
/// Runs every frame until the scene has been instanced and its meshes are
/// available; the fit is applied once per model root.
pub fn fit_loaded_models(
    mut commands: Commands,
    mut roots: Query<(Entity, &mut Transform), (With<ModelRoot>, With<PendingFit>)>,
    children: Query<&Children>,
    nodes: Query<(Option<&Transform>, Option<&Mesh3d>), Without<ModelRoot>>,
    meshes: Res<Assets<Mesh>>,
) {
    for (root, mut transform) in &mut roots {
        let Ok(scene) = children.get(root) else {
            continue;
        };

        let mut bounds = ModelBounds::default();
        let mut stack: Vec<(Entity, Affine3A)> = scene
            .iter()
            .map(|child| (child, Affine3A::IDENTITY))
            .collect();
        while let Some((entity, parent)) = stack.pop() {
            let Ok((local, mesh)) = nodes.get(entity) else {
                continue;
            };
            let affine = parent * local.map_or(Affine3A::IDENTITY, Transform::compute_affine);
            if let Some(aabb) = mesh
                .and_then(|mesh| meshes.get(&mesh.0))
                .and_then(Mesh::compute_aabb)
            {
                bounds.include_aabb(&aabb, affine);
            }
            if let Ok(grandchildren) = children.get(entity) {
                stack.extend(grandchildren.iter().map(|child| (child, affine)));
            }
        }

        if bounds.is_empty() {
            continue;
        }
        *transform = bounds.fit_transform(MODEL_FIT_SIZE);
        commands.entity(root).remove::<PendingFit>();
        debug!(size = ?bounds.size(), scale = transform.scale.x, "Fitted model to stage");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(min: Vec3, max: Vec3) -> ModelBounds {
        ModelBounds { min, max }
    }

    #[test]
    fn millimetre_model_shrinks_to_unit_box() {
        let model = bounds(Vec3::ZERO, Vec3::new(200.0, 100.0, 50.0));
        let fit = model.fit_transform(1.0);

        assert!((fit.scale.x - 0.005).abs() < 1e-6);
        assert_eq!(fit.scale.x, fit.scale.y);
        assert!(fit.transform_point(model.max).abs_diff_eq(Vec3::new(0.5, 0.25, 0.125), 1e-5));
        assert!(fit.transform_point(model.center()).abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn tiny_model_grows_to_unit_box() {
        let model = bounds(Vec3::splat(-0.01), Vec3::splat(0.01));
        let fit = model.fit_transform(1.0);
        assert!((fit.scale.x - 50.0).abs() < 1e-3);
    }

    #[test]
    fn degenerate_bounds_keep_identity() {
        assert_eq!(ModelBounds::default().fit_transform(1.0), Transform::IDENTITY);
        let point = bounds(Vec3::ONE, Vec3::ONE);
        assert_eq!(point.fit_transform(1.0), Transform::IDENTITY);
    }

    #[test]
    fn spawned_scene_is_fitted_once() {
        let mut app = App::new();
        app.insert_resource(Assets::<Mesh>::default());
        app.add_systems(Update, fit_loaded_models);

        let root = app
            .world_mut()
            .spawn((ModelRoot, PendingFit, Transform::default()))
            .id();
        // Nothing instanced yet: the root keeps waiting.
        app.update();
        assert!(app.world().get::<PendingFit>(root).is_some());

        let mesh = app
            .world_mut()
            .resource_mut::<Assets<Mesh>>()
            .add(Cuboid::new(2000.0, 500.0, 100.0));
        app.world_mut().spawn((
            Mesh3d(mesh),
            Transform::from_xyz(1000.0, 0.0, 0.0),
            ChildOf(root),
        ));
        app.update();

        let transform = app.world().get::<Transform>(root).unwrap();
        assert!((transform.scale.x - 0.0005).abs() < 1e-7);
        assert!(transform.translation.abs_diff_eq(Vec3::new(-0.5, 0.0, 0.0), 1e-4));
        assert!(app.world().get::<PendingFit>(root).is_none());
    }
}
