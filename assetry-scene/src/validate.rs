//! Structural validation of a [`Scene`].
//!
//! The walk is fail-fast and deterministic: node tree in pre-order, then
//! meshes, materials and animations in declaration order. Soft anomalies are
//! collected as [`ValidationWarning`]s and logged; they never stop the walk.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::anim::{Animation, NodeAnim};
use crate::material::MaterialKey;
use crate::mesh::{
    Mesh, PrimitiveTypes, MAX_BONE_WEIGHTS, MAX_COLOR_SETS, MAX_FACES, MAX_FACE_INDICES,
    MAX_TEXTURE_COORDS, MAX_VERTICES,
};
use crate::scene::{NodeId, Scene, SceneFlags};

/// Longest name accepted for nodes, meshes, bones and animations, in bytes.
pub const MAX_NAME_LEN: usize = 1024;

/// Allowed drift of the per-vertex bone weight sum around 1.0.
const WEIGHT_SUM_MIN: f32 = 0.94;
const WEIGHT_SUM_MAX: f32 = 1.05;

/// Slack when comparing key times against an animation's duration.
const DURATION_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("node reference {id:?} does not resolve to a node")]
    NullNode { id: Option<usize> },
    #[error("node {node} ('{name}') has no parent")]
    DetachedNode { node: usize, name: String },
    #[error("node {node} does not point back at the node that lists it")]
    ParentMismatch { node: usize },
    #[error("node {node} references mesh {mesh}, but the scene has {count} meshes")]
    MeshIndexOutOfRange { node: usize, mesh: u32, count: usize },
    #[error("node {node} references mesh {mesh} more than once")]
    DuplicateMeshReference { node: usize, mesh: u32 },
    #[error("{what} name is {len} bytes long, the limit is {}", MAX_NAME_LEN)]
    NameTooLong { what: &'static str, len: usize },
    #[error("scene contains no meshes")]
    NoMeshes,
    #[error("mesh {mesh} uses material {index}, but the scene has {count} materials")]
    MaterialIndexOutOfRange { mesh: usize, index: u32, count: usize },
    #[error("mesh {mesh}: face {face} has no index array")]
    NullFaceIndices { mesh: usize, face: usize },
    #[error("mesh {mesh}: face {face} is empty")]
    EmptyFace { mesh: usize, face: usize },
    #[error("mesh {mesh}: face {face} has {count} indices but the primitive type flags do not include it")]
    PrimitiveTypeMismatch { mesh: usize, face: usize, count: usize },
    #[error("mesh {mesh}: face {face} has {count} indices, the limit is {}", MAX_FACE_INDICES)]
    TooManyFaceIndices { mesh: usize, face: usize, count: usize },
    #[error("mesh {mesh} contains no vertices")]
    NoVertices { mesh: usize },
    #[error("mesh {mesh} has {count} vertices, the limit is {}", MAX_VERTICES)]
    TooManyVertices { mesh: usize, count: u32 },
    #[error("mesh {mesh} has {count} faces, the limit is {}", MAX_FACES)]
    TooManyFaces { mesh: usize, count: usize },
    #[error("mesh {mesh} contains no faces")]
    NoFaces { mesh: usize },
    #[error("mesh {mesh}: {attribute} holds {len} entries for {expected} vertices")]
    AttributeLengthMismatch { mesh: usize, attribute: &'static str, len: usize, expected: u32 },
    #[error("mesh {mesh}: tangents and bitangents must be present together")]
    AsymmetricTangentSpace { mesh: usize },
    #[error("mesh {mesh}: face {face} references vertex {index}, but the mesh has {count} vertices")]
    VertexIndexOutOfRange { mesh: usize, face: usize, index: u32, count: u32 },
    #[error("mesh {mesh}: vertex {vertex} is referenced by more than one face (second use in face {face})")]
    DuplicateVertexReference { mesh: usize, face: usize, vertex: u32 },
    #[error("mesh {mesh}: {kind} channel {channel} exists although the previous channel does not")]
    NonContiguousChannel { mesh: usize, kind: &'static str, channel: usize },
    #[error("mesh {mesh} declares {declared} bones but has no bone array")]
    NullBones { mesh: usize, declared: u32 },
    #[error("mesh {mesh} declares {declared} bones but holds {actual}")]
    BoneCountMismatch { mesh: usize, declared: u32, actual: usize },
    #[error("mesh {mesh} has a bone array although it declares no bones")]
    SpuriousBones { mesh: usize },
    #[error("mesh {mesh}: bone {bone} has {count} weights, the limit is {}", MAX_BONE_WEIGHTS)]
    TooManyBoneWeights { mesh: usize, bone: usize, count: usize },
    #[error("mesh {mesh}: bone {bone} has no weights")]
    BoneWithoutWeights { mesh: usize, bone: usize },
    #[error("mesh {mesh}: bone name '{name}' is used more than once")]
    DuplicateBoneName { mesh: usize, name: String },
    #[error("mesh {mesh}: bone {bone} weight {weight} targets vertex {vertex}, but the mesh has {count} vertices")]
    BoneVertexIndexOutOfRange { mesh: usize, bone: usize, weight: usize, vertex: u32, count: u32 },
    #[error("animation {animation} has no channels")]
    EmptyAnimation { animation: usize },
    #[error("animation {animation}: channel {channel} has no keys")]
    EmptyAnimationChannel { animation: usize, channel: usize },
    #[error("animation {animation}: channel {channel} has a {track} key at {time}, after the duration {duration}")]
    KeyBeyondDuration { animation: usize, channel: usize, track: &'static str, time: f64, duration: f64 },
}

/// Non-fatal anomaly found while validating.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    UnreferencedVertices { mesh: usize, count: usize, first: u32 },
    InvalidBoneWeight { mesh: usize, bone: usize, weight: usize, value: f32 },
    BoneWeightSum { mesh: usize, vertex: u32, sum: f32 },
    SpecularWithoutShininess { material: usize },
    ZeroShininessStrength { material: usize },
    InvalidOpacity { material: usize, opacity: f32 },
    UvChannelOutOfRange { material: usize, mesh: usize, channel: u32, available: usize },
    UnorderedKeys { animation: usize, channel: usize, track: &'static str, key: usize },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnreferencedVertices { mesh, count, first } => {
                write!(f, "mesh {mesh}: {count} vertices are not referenced by any face (first: {first})")
            }
            Self::InvalidBoneWeight { mesh, bone, weight, value } => {
                write!(f, "mesh {mesh}: bone {bone} weight {weight} has invalid value {value}")
            }
            Self::BoneWeightSum { mesh, vertex, sum } => {
                write!(f, "mesh {mesh}: bone weights of vertex {vertex} sum to {sum}")
            }
            Self::SpecularWithoutShininess { material } => {
                write!(f, "material {material}: specular shading model without a shininess value")
            }
            Self::ZeroShininessStrength { material } => {
                write!(f, "material {material}: specular shading model with shininess strength 0")
            }
            Self::InvalidOpacity { material, opacity } => {
                write!(f, "material {material}: opacity {opacity} is outside (0, 1]")
            }
            Self::UvChannelOutOfRange { material, mesh, channel, available } => write!(
                f,
                "material {material}: texture samples UV channel {channel}, mesh {mesh} has {available}"
            ),
            Self::UnorderedKeys { animation, channel, track, key } => write!(
                f,
                "animation {animation}: channel {channel} {track} key {key} is not later than the previous key"
            ),
        }
    }
}

/// Depth-first scene checker that keeps the warnings it emitted.
#[derive(Debug, Default)]
pub struct Validator {
    warnings: Vec<ValidationWarning>,
}

/// Validate `scene`, returning the warnings on success.
pub fn validate(scene: &Scene) -> Result<Vec<ValidationWarning>, ValidationError> {
    let mut validator = Validator::new();
    validator.run(scene)?;
    Ok(validator.into_warnings())
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings emitted so far, including those preceding a failure.
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<ValidationWarning> {
        self.warnings
    }

    pub fn run(&mut self, scene: &Scene) -> Result<(), ValidationError> {
        log::debug!("Validation begin");

        let root = scene.root.ok_or(ValidationError::NullNode { id: None })?;
        check_node_tree(scene, root)?;

        if scene.meshes.is_empty() && !scene.flags.has(SceneFlags::INCOMPLETE) {
            return Err(ValidationError::NoMeshes);
        }
        for (index, mesh) in scene.meshes.iter().enumerate() {
            self.validate_mesh(scene, index, mesh)?;
        }
        for index in 0..scene.materials.len() {
            self.validate_material(scene, index);
        }
        for (index, animation) in scene.animations.iter().enumerate() {
            self.validate_animation(index, animation)?;
        }

        log::debug!("Validation end, {} warnings", self.warnings.len());
        Ok(())
    }

    fn warn(&mut self, warning: ValidationWarning) {
        log::warn!("Validation warning: {warning}");
        self.warnings.push(warning);
    }

    fn validate_mesh(&mut self, scene: &Scene, index: usize, mesh: &Mesh) -> Result<(), ValidationError> {
        let incomplete = scene.flags.has(SceneFlags::INCOMPLETE);

        if !scene.materials.is_empty() && mesh.material_index as usize >= scene.materials.len() {
            return Err(ValidationError::MaterialIndexOutOfRange {
                mesh: index,
                index: mesh.material_index,
                count: scene.materials.len(),
            });
        }
        check_name("mesh", &mesh.name)?;

        for (f, face) in mesh.faces.iter().enumerate() {
            let Some(indices) = &face.indices else {
                return Err(ValidationError::NullFaceIndices { mesh: index, face: f });
            };
            if indices.is_empty() {
                return Err(ValidationError::EmptyFace { mesh: index, face: f });
            }
            if !mesh.primitive_types.is_empty()
                && !mesh.primitive_types.has(PrimitiveTypes::for_index_count(indices.len()))
            {
                return Err(ValidationError::PrimitiveTypeMismatch {
                    mesh: index,
                    face: f,
                    count: indices.len(),
                });
            }
        }

        if mesh.num_vertices == 0 || (!mesh.has_positions() && !incomplete) {
            return Err(ValidationError::NoVertices { mesh: index });
        }
        if mesh.num_vertices > MAX_VERTICES {
            return Err(ValidationError::TooManyVertices { mesh: index, count: mesh.num_vertices });
        }
        if mesh.faces.len() > MAX_FACES {
            return Err(ValidationError::TooManyFaces { mesh: index, count: mesh.faces.len() });
        }
        if mesh.tangents.is_some() != mesh.bitangents.is_some() {
            return Err(ValidationError::AsymmetricTangentSpace { mesh: index });
        }
        if mesh.faces.is_empty() && !incomplete {
            return Err(ValidationError::NoFaces { mesh: index });
        }
        check_attribute_lengths(index, mesh)?;

        self.validate_face_indices(scene, index, mesh)?;
        check_channels(index, "texture coordinate", MAX_TEXTURE_COORDS, |c| mesh.has_texture_coords(c))?;
        check_channels(index, "vertex color", MAX_COLOR_SETS, |c| mesh.has_vertex_colors(c))?;
        self.validate_bones(index, mesh)
    }

    fn validate_face_indices(
        &mut self,
        scene: &Scene,
        index: usize,
        mesh: &Mesh,
    ) -> Result<(), ValidationError> {
        let unique = !scene.is_non_verbose();
        let mut referenced = vec![false; mesh.num_vertices as usize];

        for (f, face) in mesh.faces.iter().enumerate() {
            if face.len() > MAX_FACE_INDICES {
                return Err(ValidationError::TooManyFaceIndices { mesh: index, face: f, count: face.len() });
            }
            for &vertex in face.indices() {
                let Some(seen) = referenced.get_mut(vertex as usize) else {
                    return Err(ValidationError::VertexIndexOutOfRange {
                        mesh: index,
                        face: f,
                        index: vertex,
                        count: mesh.num_vertices,
                    });
                };
                if *seen && unique {
                    return Err(ValidationError::DuplicateVertexReference { mesh: index, face: f, vertex });
                }
                *seen = true;
            }
        }

        let mut unreferenced = referenced.iter().enumerate().filter(|(_, r)| !**r).map(|(v, _)| v as u32);
        if let Some(first) = unreferenced.next() {
            let count = 1 + unreferenced.count();
            self.warn(ValidationWarning::UnreferencedVertices { mesh: index, count, first });
        }
        Ok(())
    }

    fn validate_bones(&mut self, index: usize, mesh: &Mesh) -> Result<(), ValidationError> {
        if mesh.num_bones == 0 {
            if mesh.bones.is_some() {
                return Err(ValidationError::SpuriousBones { mesh: index });
            }
            return Ok(());
        }
        let Some(bones) = &mesh.bones else {
            return Err(ValidationError::NullBones { mesh: index, declared: mesh.num_bones });
        };
        if bones.len() != mesh.num_bones as usize {
            return Err(ValidationError::BoneCountMismatch {
                mesh: index,
                declared: mesh.num_bones,
                actual: bones.len(),
            });
        }

        let mut sums = vec![0.0f32; mesh.num_vertices as usize];
        let mut names = HashSet::with_capacity(bones.len());
        for (b, bone) in bones.iter().enumerate() {
            if bone.weights.len() > MAX_BONE_WEIGHTS {
                return Err(ValidationError::TooManyBoneWeights {
                    mesh: index,
                    bone: b,
                    count: bone.weights.len(),
                });
            }
            check_name("bone", &bone.name)?;
            if bone.weights.is_empty() {
                return Err(ValidationError::BoneWithoutWeights { mesh: index, bone: b });
            }
            for (w, weight) in bone.weights.iter().enumerate() {
                let Some(sum) = sums.get_mut(weight.vertex_id as usize) else {
                    return Err(ValidationError::BoneVertexIndexOutOfRange {
                        mesh: index,
                        bone: b,
                        weight: w,
                        vertex: weight.vertex_id,
                        count: mesh.num_vertices,
                    });
                };
                *sum += weight.weight;
                if !(weight.weight > 0.0 && weight.weight <= 1.0) {
                    self.warn(ValidationWarning::InvalidBoneWeight {
                        mesh: index,
                        bone: b,
                        weight: w,
                        value: weight.weight,
                    });
                }
            }
            if !names.insert(bone.name.as_str()) {
                return Err(ValidationError::DuplicateBoneName { mesh: index, name: bone.name.clone() });
            }
        }

        for (vertex, &sum) in sums.iter().enumerate() {
            if sum != 0.0 && !(WEIGHT_SUM_MIN..=WEIGHT_SUM_MAX).contains(&sum) {
                self.warn(ValidationWarning::BoneWeightSum { mesh: index, vertex: vertex as u32, sum });
            }
        }
        Ok(())
    }

    fn validate_material(&mut self, scene: &Scene, index: usize) {
        let material = &scene.materials[index];

        if material.shading_model().is_some_and(|m| m.is_specular()) {
            match material.float(MaterialKey::Shininess) {
                None => self.warn(ValidationWarning::SpecularWithoutShininess { material: index }),
                Some(_) if material.float(MaterialKey::ShininessStrength) == Some(0.0) => {
                    self.warn(ValidationWarning::ZeroShininessStrength { material: index })
                }
                Some(_) => {}
            }
        }
        if let Some(opacity) = material.float(MaterialKey::Opacity) {
            if opacity == 0.0 || opacity > 1.01 {
                self.warn(ValidationWarning::InvalidOpacity { material: index, opacity });
            }
        }

        let channels: Vec<u32> = material.textures().map(|(_, _, uv)| uv).collect();
        for (m, mesh) in scene.meshes.iter().enumerate() {
            if mesh.material_index as usize != index {
                continue;
            }
            let available = mesh.num_uv_channels();
            for &channel in &channels {
                if channel as usize >= available {
                    self.warn(ValidationWarning::UvChannelOutOfRange {
                        material: index,
                        mesh: m,
                        channel,
                        available,
                    });
                }
            }
        }
    }

    fn validate_animation(&mut self, index: usize, animation: &Animation) -> Result<(), ValidationError> {
        check_name("animation", &animation.name)?;
        if animation.channels.is_empty() {
            return Err(ValidationError::EmptyAnimation { animation: index });
        }
        for (c, channel) in animation.channels.iter().enumerate() {
            self.validate_channel(index, animation.duration, c, channel)?;
        }
        Ok(())
    }

    fn validate_channel(
        &mut self,
        animation: usize,
        duration: f64,
        index: usize,
        channel: &NodeAnim,
    ) -> Result<(), ValidationError> {
        check_name("animation channel", &channel.node_name)?;
        if channel.is_empty() {
            return Err(ValidationError::EmptyAnimationChannel { animation, channel: index });
        }

        let tracks: [(&'static str, Vec<f64>); 3] = [
            ("position", channel.position_keys.iter().map(|k| k.time).collect()),
            ("rotation", channel.rotation_keys.iter().map(|k| k.time).collect()),
            ("scaling", channel.scaling_keys.iter().map(|k| k.time).collect()),
        ];
        for (track, times) in tracks {
            for (k, &time) in times.iter().enumerate() {
                if duration > 0.0 && time > duration + DURATION_EPSILON {
                    return Err(ValidationError::KeyBeyondDuration {
                        animation,
                        channel: index,
                        track,
                        time,
                        duration,
                    });
                }
                if k > 0 && time <= times[k - 1] {
                    self.warn(ValidationWarning::UnorderedKeys { animation, channel: index, track, key: k });
                }
            }
        }
        Ok(())
    }
}

/// Pre-order walk from `root`, with each child checked against the node that
/// lists it. Driven by an explicit stack so deep hierarchies cannot exhaust
/// the thread stack.
fn check_node_tree(scene: &Scene, root: NodeId) -> Result<(), ValidationError> {
    let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(root, None)];

    while let Some((id, parent)) = stack.pop() {
        let node = scene.node(id).ok_or(ValidationError::NullNode { id: Some(id.0) })?;

        match (parent, node.parent) {
            (None, Some(_)) => return Err(ValidationError::ParentMismatch { node: id.0 }),
            (Some(_), None) => {
                return Err(ValidationError::DetachedNode { node: id.0, name: node.name.clone() })
            }
            (Some(expected), Some(found)) if expected != found => {
                return Err(ValidationError::ParentMismatch { node: id.0 })
            }
            _ => {}
        }
        check_name("node", &node.name)?;

        let mut seen = HashSet::with_capacity(node.meshes.len());
        for &mesh in &node.meshes {
            if mesh as usize >= scene.meshes.len() {
                return Err(ValidationError::MeshIndexOutOfRange {
                    node: id.0,
                    mesh,
                    count: scene.meshes.len(),
                });
            }
            if !seen.insert(mesh) {
                return Err(ValidationError::DuplicateMeshReference { node: id.0, mesh });
            }
        }

        stack.extend(node.children.iter().rev().map(|&child| (child, Some(id))));
    }
    Ok(())
}

fn check_name(what: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong { what, len: name.len() });
    }
    Ok(())
}

fn check_attribute_lengths(index: usize, mesh: &Mesh) -> Result<(), ValidationError> {
    let expected = mesh.num_vertices;
    let vec3_attributes = [
        ("positions", mesh.positions.as_ref()),
        ("normals", mesh.normals.as_ref()),
        ("tangents", mesh.tangents.as_ref()),
        ("bitangents", mesh.bitangents.as_ref()),
    ];
    let lengths = vec3_attributes
        .into_iter()
        .filter_map(|(attribute, data)| Some((attribute, data?.len())))
        .chain(mesh.texture_coords.iter().flatten().map(|uv| ("texture coordinates", uv.len())))
        .chain(mesh.colors.iter().flatten().map(|c| ("vertex colors", c.len())));

    for (attribute, len) in lengths {
        if len != expected as usize {
            return Err(ValidationError::AttributeLengthMismatch { mesh: index, attribute, len, expected });
        }
    }
    Ok(())
}

/// Once a channel is missing, no later channel may be present.
fn check_channels(
    mesh: usize,
    kind: &'static str,
    max: usize,
    present: impl Fn(usize) -> bool,
) -> Result<(), ValidationError> {
    let first_gap = (0..max).find(|&c| !present(c)).unwrap_or(max);
    match (first_gap..max).find(|&c| present(c)) {
        Some(channel) => Err(ValidationError::NonContiguousChannel { mesh, kind, channel }),
        None => Ok(()),
    }
}
