//! Fills in derived fields that importers are allowed to leave unset.
//!
//! This pass never fails and is idempotent: running it twice leaves the scene
//! exactly as running it once.

use glam::Vec3;

use crate::anim::Animation;
use crate::material::{Material, MaterialKey, DEFAULT_MATERIAL_NAME};
use crate::mesh::{Mesh, MAX_TEXTURE_COORDS};
use crate::scene::Scene;

/// Normalize `scene` in place.
pub fn preprocess(scene: &mut Scene) {
    log::debug!("Scene preprocessing begin");

    for mesh in &mut scene.meshes {
        preprocess_mesh(mesh);
    }
    for animation in &mut scene.animations {
        preprocess_animation(animation);
    }

    if scene.materials.is_empty() && !scene.meshes.is_empty() {
        let mut material = Material::new();
        material.set_color(MaterialKey::ColorDiffuse, Vec3::splat(0.6));
        material.set_name(DEFAULT_MATERIAL_NAME);
        scene.materials.push(material);
        for mesh in &mut scene.meshes {
            mesh.material_index = 0;
        }
        log::debug!("Scene has no materials, added '{DEFAULT_MATERIAL_NAME}'");
    }

    log::debug!("Scene preprocessing end");
}

fn preprocess_mesh(mesh: &mut Mesh) {
    for channel in 0..MAX_TEXTURE_COORDS {
        if !mesh.has_texture_coords(channel) {
            mesh.num_uv_components[channel] = 0;
            continue;
        }
        if mesh.num_uv_components[channel] == 0 {
            mesh.num_uv_components[channel] = 2;
        }
        // Unused components are zeroed so 1D channels read like 2D ones.
        let components = mesh.num_uv_components[channel];
        if let Some(uvs) = mesh.texture_coords[channel].as_mut() {
            for uv in uvs.iter_mut() {
                if components < 3 {
                    uv.z = 0.0;
                }
                if components < 2 {
                    uv.y = 0.0;
                }
            }
        }
    }

    if mesh.primitive_types.is_empty() {
        mesh.primitive_types = mesh.compute_primitive_types();
    }

    if mesh.bitangents.is_none() {
        if let (Some(normals), Some(tangents)) = (&mesh.normals, &mesh.tangents) {
            let bitangents = (0..mesh.num_vertices as usize)
                .map(|i| match (normals.get(i), tangents.get(i)) {
                    (Some(n), Some(t)) => n.cross(*t),
                    _ => Vec3::ZERO,
                })
                .collect();
            mesh.bitangents = Some(bitangents);
        }
    }
}

/// Infer a missing duration from the spread of position and scaling key times.
fn preprocess_animation(animation: &mut Animation) {
    if animation.has_duration() {
        return;
    }
    let times = animation
        .channels
        .iter()
        .flat_map(|c| c.position_keys.iter().chain(c.scaling_keys.iter()))
        .map(|k| k.time);

    let mut range: Option<(f64, f64)> = None;
    for t in times {
        range = Some(match range {
            Some((first, last)) => (first.min(t), last.max(t)),
            None => (t, t),
        });
    }
    if let Some((first, last)) = range {
        animation.duration = last - first;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::{NodeAnim, VectorKey};
    use crate::mesh::{Face, PrimitiveTypes};

    fn triangle_mesh() -> Mesh {
        Mesh {
            num_vertices: 3,
            positions: Some(vec![Vec3::ZERO, Vec3::X, Vec3::Y]),
            faces: vec![Face::new(vec![0, 1, 2])],
            ..Default::default()
        }
    }

    #[test]
    fn test_uv_component_defaults() {
        let mut mesh = triangle_mesh();
        mesh.texture_coords[0] = Some(vec![Vec3::new(0.1, 0.2, 0.9); 3]);
        mesh.num_uv_components[1] = 3; // channel 1 absent
        let mut scene = Scene { meshes: vec![mesh], ..Scene::with_root("root") };

        preprocess(&mut scene);

        let mesh = &scene.meshes[0];
        assert_eq!(mesh.num_uv_components[0], 2);
        assert_eq!(mesh.num_uv_components[1], 0);
        let uvs = mesh.texture_coords[0].as_ref().unwrap();
        assert!(uvs.iter().all(|uv| uv.z == 0.0 && uv.x == 0.1 && uv.y == 0.2));
    }

    #[test]
    fn test_primitive_types_derived_when_unset() {
        let mut mesh = triangle_mesh();
        mesh.num_vertices = 5;
        mesh.faces.push(Face::new(vec![3, 4]));
        let mut scene = Scene { meshes: vec![mesh], ..Scene::with_root("root") };

        preprocess(&mut scene);

        assert_eq!(
            scene.meshes[0].primitive_types,
            PrimitiveTypes(PrimitiveTypes::TRIANGLE | PrimitiveTypes::LINE)
        );
    }

    #[test]
    fn test_primitive_types_kept_when_set() {
        let mut mesh = triangle_mesh();
        mesh.primitive_types = PrimitiveTypes(PrimitiveTypes::POLYGON);
        let mut scene = Scene { meshes: vec![mesh], ..Scene::with_root("root") };

        preprocess(&mut scene);

        assert_eq!(scene.meshes[0].primitive_types, PrimitiveTypes(PrimitiveTypes::POLYGON));
    }

    #[test]
    fn test_bitangents_computed_from_normals_and_tangents() {
        let mut mesh = triangle_mesh();
        mesh.normals = Some(vec![Vec3::Z; 3]);
        mesh.tangents = Some(vec![Vec3::X; 3]);
        let mut scene = Scene { meshes: vec![mesh], ..Scene::with_root("root") };

        preprocess(&mut scene);

        let bitangents = scene.meshes[0].bitangents.as_ref().unwrap();
        assert_eq!(bitangents.len(), 3);
        // Z x X = Y
        assert!(bitangents.iter().all(|b| *b == Vec3::Y));
    }

    #[test]
    fn test_bitangents_not_created_without_tangents() {
        let mut mesh = triangle_mesh();
        mesh.normals = Some(vec![Vec3::Z; 3]);
        let mut scene = Scene { meshes: vec![mesh], ..Scene::with_root("root") };

        preprocess(&mut scene);

        assert!(scene.meshes[0].bitangents.is_none());
    }

    #[test]
    fn test_default_material_added() {
        let mut mesh = triangle_mesh();
        mesh.material_index = 4;
        let mut scene = Scene { meshes: vec![mesh], ..Scene::with_root("root") };

        preprocess(&mut scene);

        assert_eq!(scene.materials.len(), 1);
        assert_eq!(scene.materials[0].name(), Some(DEFAULT_MATERIAL_NAME));
        assert_eq!(scene.materials[0].color(MaterialKey::ColorDiffuse), Some(Vec3::splat(0.6)));
        assert_eq!(scene.meshes[0].material_index, 0);
    }

    #[test]
    fn test_animation_duration_inferred() {
        let key = |time| VectorKey { time, value: Vec3::ZERO };
        let mut scene = Scene::with_root("root");
        scene.animations.push(Animation {
            channels: vec![
                NodeAnim {
                    node_name: "a".into(),
                    position_keys: vec![key(2.0), key(5.0)],
                    ..Default::default()
                },
                NodeAnim {
                    node_name: "b".into(),
                    scaling_keys: vec![key(1.0), key(9.5)],
                    ..Default::default()
                },
            ],
            ..Default::default()
        });
        scene.animations.push(Animation { duration: 3.0, ..Default::default() });

        preprocess(&mut scene);

        assert_eq!(scene.animations[0].duration, 8.5);
        assert_eq!(scene.animations[1].duration, 3.0);
    }

    #[test]
    fn test_preprocess_is_idempotent() {
        let mut mesh = triangle_mesh();
        mesh.normals = Some(vec![Vec3::Z; 3]);
        mesh.tangents = Some(vec![Vec3::X; 3]);
        mesh.texture_coords[0] = Some(vec![Vec3::new(0.5, 0.5, 0.5); 3]);
        let mut scene = Scene { meshes: vec![mesh], ..Scene::with_root("root") };

        preprocess(&mut scene);
        let once = scene.clone();
        preprocess(&mut scene);
        assert_eq!(scene, once);
    }
}
