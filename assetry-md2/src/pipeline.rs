//! Decode, preprocess and validate in one call.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use assetry_scene::{preprocess, validate, Scene, SceneFlags, ValidationError, ValidationWarning};

use crate::decode::{decode_with, DecodeError, DecodeOptions};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed MD2 data: {0}")]
    Decode(#[from] DecodeError),
    #[error("scene failed validation: {0}")]
    Validation(#[from] ValidationError),
}

/// A validated scene and the warnings raised while validating it.
#[derive(Debug)]
pub struct Imported {
    pub scene: Scene,
    pub warnings: Vec<ValidationWarning>,
}

/// Run the whole pipeline over an in-memory buffer.
pub fn import_bytes(bytes: &[u8], options: &DecodeOptions) -> Result<Imported, ImportError> {
    let mut scene = decode_with(bytes, options)?;
    preprocess(&mut scene);
    let warnings = validate(&scene)?;

    scene.flags.set(SceneFlags::VALIDATED);
    if !warnings.is_empty() {
        scene.flags.set(SceneFlags::VALIDATION_WARNING);
    }
    log::info!(
        "Imported {}: {} meshes, {} materials, {} warnings",
        options.source_name.as_deref().unwrap_or("MD2 buffer"),
        scene.meshes.len(),
        scene.materials.len(),
        warnings.len()
    );
    Ok(Imported { scene, warnings })
}

/// Read `path` and import it. The file name becomes the source name unless
/// `options` already sets one.
pub fn import_file(path: impl AsRef<Path>, options: &DecodeOptions) -> Result<Imported, ImportError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| ImportError::Io { path: path.to_path_buf(), source })?;

    let mut options = options.clone();
    if options.source_name.is_none() {
        options.source_name = path.file_name().map(|name| name.to_string_lossy().into_owned());
    }
    import_bytes(&bytes, &options)
}
