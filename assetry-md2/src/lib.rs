//! Quake II MD2 importer.
//!
//! [`decode`] turns one keyframe of an MD2 buffer into an
//! [`assetry_scene::Scene`]; [`import_file`] additionally runs the scene
//! preprocessor and validator.

mod cursor;
pub mod decode;
pub mod format;
pub mod normals;
pub mod pipeline;
#[doc(hidden)]
pub mod testing;

pub use decode::{decode, decode_with, DecodeError, DecodeOptions, IndexPolicy, ROOT_NODE_NAME};
pub use pipeline::{import_bytes, import_file, ImportError, Imported};
