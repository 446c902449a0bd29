use assetry_md2::{decode, import_bytes, import_file, DecodeError, DecodeOptions, ImportError, IndexPolicy};
use assetry_scene::mesh::{MAX_COLOR_SETS, MAX_TEXTURE_COORDS};
use assetry_scene::{PrimitiveTypes, SceneFlags, ValidationWarning};

use assetry_md2::testing::Md2Builder;

#[test]
fn test_two_triangle_file_decodes_to_one_mesh() {
    let bytes = Md2Builder::quad().bytes();
    let scene = decode(&bytes, 0).unwrap();

    assert_eq!(scene.meshes.len(), 1);
    let mesh = &scene.meshes[0];
    assert_eq!(mesh.faces.len(), 2);
    assert_eq!(mesh.num_vertices, 6);
    assert_eq!(mesh.primitive_types, PrimitiveTypes(PrimitiveTypes::TRIANGLE));
}

#[test]
fn test_pipeline_marks_scene_validated() {
    let imported = import_bytes(&Md2Builder::quad().bytes(), &DecodeOptions::default()).unwrap();
    assert!(imported.warnings.is_empty());
    assert!(imported.scene.flags.has(SceneFlags::VALIDATED));
    assert!(!imported.scene.flags.has(SceneFlags::VALIDATION_WARNING));
}

#[test]
fn test_end_offset_past_buffer_is_truncated() {
    let bytes = Md2Builder::quad().bytes_with(|h| h.offset_end = 10_000);
    assert!(matches!(decode(&bytes, 0), Err(DecodeError::Truncated { end: 10_000, .. })));
    assert!(matches!(
        import_bytes(&bytes, &DecodeOptions::default()),
        Err(ImportError::Decode(DecodeError::Truncated { .. }))
    ));
}

#[test]
fn test_unknown_magic_is_rejected() {
    for tag in [*b"IDPO", *b"2PDJ", [0; 4]] {
        let bytes = Md2Builder::quad().bytes_with(|h| h.magic = i32::from_ne_bytes(tag));
        assert!(matches!(decode(&bytes, 0), Err(DecodeError::BadMagic { .. })));
    }
}

#[test]
fn test_zero_frames_is_empty() {
    let bytes = Md2Builder::quad().bytes_with(|h| h.num_frames = 0);
    assert_eq!(decode(&bytes, 0), Err(DecodeError::Empty));
}

#[test]
fn test_decoded_face_indices_stay_in_range() {
    let mut md2 = Md2Builder::quad();
    md2.triangles.push(assetry_md2::format::Triangle {
        vertex_indices: [3, 40, u16::MAX],
        tex_coord_indices: [0, 0, 0],
    });
    let scene = decode(&md2.bytes(), 0).unwrap();

    for mesh in &scene.meshes {
        for face in &mesh.faces {
            assert!(face.indices().iter().all(|&i| i < mesh.num_vertices));
        }
    }
}

#[test]
fn test_strict_policy_rejects_through_pipeline() {
    let mut md2 = Md2Builder::quad();
    md2.triangles[0].vertex_indices[2] = 4;
    let options = DecodeOptions { index_policy: IndexPolicy::Strict, ..Default::default() };

    let err = import_bytes(&md2.bytes(), &options).unwrap_err();
    assert!(matches!(
        err,
        ImportError::Decode(DecodeError::VertexIndexOutOfRange { triangle: 0, index: 4, count: 4 })
    ));
}

#[test]
fn test_validated_channels_are_contiguous() {
    let imported = import_bytes(&Md2Builder::quad().textured("skin.pcx").bytes(), &DecodeOptions::default()).unwrap();
    assert!(imported.warnings.is_empty());

    let mesh = &imported.scene.meshes[0];
    assert_eq!(mesh.num_uv_channels(), 1);
    let first_gap = (0..MAX_TEXTURE_COORDS).find(|&c| !mesh.has_texture_coords(c)).unwrap();
    assert!((first_gap..MAX_TEXTURE_COORDS).all(|c| !mesh.has_texture_coords(c)));
    assert!((0..MAX_COLOR_SETS).all(|c| !mesh.has_vertex_colors(c)));
    // Preprocessing leaves the absent channels at zero components.
    assert_eq!(mesh.num_uv_components[1..], [0u32; MAX_TEXTURE_COORDS - 1]);
}

#[test]
fn test_import_file_from_disk() {
    let path = std::env::temp_dir().join(format!("assetry-md2-{}-tris.md2", std::process::id()));
    std::fs::write(&path, Md2Builder::quad().bytes()).unwrap();

    let result = import_file(&path, &DecodeOptions::default());
    std::fs::remove_file(&path).unwrap();
    let imported = result.unwrap();

    let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
    let stem = file_name.trim_end_matches(".md2");
    assert_eq!(imported.scene.root_node().unwrap().name, file_name);
    assert_eq!(
        imported.scene.materials[0].texture(assetry_scene::TextureType::Diffuse),
        Some(format!("{stem}.bmp").as_str())
    );

    // The guessed texture samples UV channel 0, which a file without
    // texture coordinates does not have.
    assert_eq!(
        imported.warnings,
        vec![ValidationWarning::UvChannelOutOfRange { material: 0, mesh: 0, channel: 0, available: 0 }]
    );
    assert!(imported.scene.flags.has(SceneFlags::VALIDATION_WARNING));
}

#[test]
fn test_missing_file_is_io_error() {
    let path = std::env::temp_dir().join("assetry-md2-does-not-exist.md2");
    let err = import_file(&path, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, ImportError::Io { .. }));
    assert!(err.to_string().contains("assetry-md2-does-not-exist.md2"));
}
