use anyhow::Context;
use glam::Vec3;

use assetry_md2::decode_with;
use assetry_scene::{preprocess, Material, Mesh, Scene, ShadingModel, TextureType, Validator};

use crate::cli::Input;

pub fn run(input: &Input) -> anyhow::Result<()> {
    let bytes = std::fs::read(&input.file)
        .with_context(|| format!("failed to read {}", input.file.display()))?;
    let mut scene = decode_with(&bytes, &input.options())
        .with_context(|| format!("failed to decode {}", input.file.display()))?;
    preprocess(&mut scene);

    println!("{} (frame {})", input.file.display(), input.frame);
    print_scene(&scene);

    check(&scene).with_context(|| format!("{} failed validation", input.file.display()))
}

/// Print validation warnings and fail on the first fatal violation.
fn check(scene: &Scene) -> anyhow::Result<()> {
    let mut validator = Validator::new();
    let result = validator.run(scene);
    println!("Validation:");
    for warning in validator.warnings() {
        println!("  warning: {warning}");
    }
    result?;
    println!("  ok");
    Ok(())
}

fn print_scene(scene: &Scene) {
    for id in scene.walk() {
        if let Some(node) = scene.node(id) {
            println!("  node '{}': meshes {:?}, {} children", node.name, node.meshes, node.children.len());
        }
    }
    for (i, mesh) in scene.meshes.iter().enumerate() {
        print_mesh(i, mesh);
    }
    for (i, material) in scene.materials.iter().enumerate() {
        print_material(i, material);
    }
}

fn print_mesh(index: usize, mesh: &Mesh) {
    println!(
        "  mesh {index} '{}': {} vertices, {} faces, {} UV channels, material {}",
        mesh.name,
        mesh.num_vertices,
        mesh.faces.len(),
        mesh.num_uv_channels(),
        mesh.material_index
    );
    if let Some((min, max)) = bounds(mesh.positions.as_deref().unwrap_or(&[])) {
        println!("    bounds: {min} .. {max}");
    }
}

fn print_material(index: usize, material: &Material) {
    let name = material.name().unwrap_or("<unnamed>");
    let shading = material.shading_model().map_or("unset".to_string(), |m: ShadingModel| format!("{m:?}"));
    println!("  material {index} '{name}': shading {shading}");
    if let Some(path) = material.texture(TextureType::Diffuse) {
        println!("    diffuse texture: {path}");
    }
}

fn bounds(points: &[Vec3]) -> Option<(Vec3, Vec3)> {
    let first = *points.first()?;
    Some(points.iter().fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))))
}

#[cfg(test)]
mod tests {
    use assetry_scene::ValidationError;

    use super::*;

    #[test]
    fn test_check_fails_on_invalid_scene() {
        let scene = Scene::with_root("empty");
        let err = check(&scene).unwrap_err();
        assert_eq!(err.downcast_ref::<ValidationError>(), Some(&ValidationError::NoMeshes));
    }

    #[test]
    fn test_check_passes_incomplete_scene() {
        let mut scene = Scene::with_root("empty");
        scene.flags.set(assetry_scene::SceneFlags::INCOMPLETE);
        assert!(check(&scene).is_ok());
    }
}
