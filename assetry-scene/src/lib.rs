//! Scene graph shared by every assetry importer.
//!
//! A decoder produces a [`Scene`], [`preprocess`] fills in derived fields the
//! decoder left unset, and [`validate`] rejects scenes that break the
//! structural invariants before they reach renderers or exporters.

pub mod anim;
pub mod material;
pub mod mesh;
pub mod preprocess;
pub mod scene;
pub mod validate;

pub use anim::{Animation, NodeAnim, QuatKey, VectorKey};
pub use material::{
    Material, MaterialKey, MaterialProperty, PropertyValue, ShadingModel, TextureType,
    DEFAULT_MATERIAL_NAME,
};
pub use mesh::{Bone, Face, Mesh, PrimitiveTypes, VertexWeight};
pub use preprocess::preprocess;
pub use scene::{Node, NodeId, Scene, SceneFlags};
pub use validate::{validate, ValidationError, ValidationWarning, Validator};
