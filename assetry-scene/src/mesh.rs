use glam::{Mat4, Vec3, Vec4};

/// Maximum number of texture-coordinate channels per mesh.
pub const MAX_TEXTURE_COORDS: usize = 8;
/// Maximum number of vertex-color channels per mesh.
pub const MAX_COLOR_SETS: usize = 8;

pub const MAX_VERTICES: u32 = 0x7fff_ffff;
pub const MAX_FACES: usize = 0x7fff_ffff;
pub const MAX_FACE_INDICES: usize = 0x7fff;
pub const MAX_BONE_WEIGHTS: usize = 0x7fff_ffff;

/// Primitive-type bitfield: which kinds of faces a mesh contains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrimitiveTypes(pub u32);

impl PrimitiveTypes {
    pub const POINT: u32 = 1 << 0;
    pub const LINE: u32 = 1 << 1;
    pub const TRIANGLE: u32 = 1 << 2;
    pub const POLYGON: u32 = 1 << 3;

    /// The bit implied by a face with `count` indices.
    pub fn for_index_count(count: usize) -> u32 {
        match count {
            1 => Self::POINT,
            2 => Self::LINE,
            3 => Self::TRIANGLE,
            _ => Self::POLYGON,
        }
    }

    pub fn has(&self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u32) {
        self.0 |= flag;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// One primitive: 1 index is a point, 2 a line, 3 a triangle, more a polygon.
///
/// `indices` is `None` when an importer allocated the face without filling it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Face {
    pub indices: Option<Vec<u32>>,
}

impl Face {
    pub fn new(indices: Vec<u32>) -> Self {
        Self { indices: Some(indices) }
    }

    /// The face indices, empty when unset.
    pub fn indices(&self) -> &[u32] {
        self.indices.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.indices().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<u32>> for Face {
    fn from(indices: Vec<u32>) -> Self {
        Self::new(indices)
    }
}

/// Influence of a bone on a single vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexWeight {
    pub vertex_id: u32,
    /// Expected in (0, 1].
    pub weight: f32,
}

/// Named skeletal influence on a subset of a mesh's vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    /// Unique among the bones of one mesh.
    pub name: String,
    pub weights: Vec<VertexWeight>,
    /// Mesh space to bone space in bind pose.
    pub offset_matrix: Mat4,
}

impl Bone {
    pub fn new(name: impl Into<String>, weights: Vec<VertexWeight>) -> Self {
        Self { name: name.into(), weights, offset_matrix: Mat4::IDENTITY }
    }
}

/// Single-material collection of vertices, per-vertex attributes and faces.
///
/// Per-vertex arrays hold `num_vertices` entries when present. Counts are kept
/// apart from the arrays so that partially built meshes can be represented
/// and rejected by the validator rather than by the type system.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub primitive_types: PrimitiveTypes,
    pub num_vertices: u32,
    pub positions: Option<Vec<Vec3>>,
    pub normals: Option<Vec<Vec3>>,
    pub tangents: Option<Vec<Vec3>>,
    pub bitangents: Option<Vec<Vec3>>,
    pub texture_coords: [Option<Vec<Vec3>>; MAX_TEXTURE_COORDS],
    /// Components used per texture-coordinate channel (1, 2 or 3).
    pub num_uv_components: [u32; MAX_TEXTURE_COORDS],
    pub colors: [Option<Vec<Vec4>>; MAX_COLOR_SETS],
    pub faces: Vec<Face>,
    /// Declared bone count.
    pub num_bones: u32,
    pub bones: Option<Vec<Bone>>,
    /// Index into [`crate::Scene::materials`].
    pub material_index: u32,
}

impl Mesh {
    pub fn has_positions(&self) -> bool {
        self.positions.as_ref().is_some_and(|p| !p.is_empty())
    }

    pub fn has_texture_coords(&self, channel: usize) -> bool {
        self.texture_coords
            .get(channel)
            .is_some_and(|c| c.as_ref().is_some_and(|uv| !uv.is_empty()))
    }

    pub fn has_vertex_colors(&self, channel: usize) -> bool {
        self.colors
            .get(channel)
            .is_some_and(|c| c.as_ref().is_some_and(|col| !col.is_empty()))
    }

    /// Number of leading, contiguous texture-coordinate channels.
    pub fn num_uv_channels(&self) -> usize {
        (0..MAX_TEXTURE_COORDS).take_while(|&c| self.has_texture_coords(c)).count()
    }

    /// Bones of the mesh, empty when unset.
    pub fn bones(&self) -> &[Bone] {
        self.bones.as_deref().unwrap_or(&[])
    }

    /// Replace the bone list, keeping the declared count in sync.
    pub fn set_bones(&mut self, bones: Vec<Bone>) {
        self.num_bones = bones.len() as u32;
        self.bones = if bones.is_empty() { None } else { Some(bones) };
    }

    /// Derive the primitive bitfield from the faces.
    pub fn compute_primitive_types(&self) -> PrimitiveTypes {
        let mut types = PrimitiveTypes::default();
        for face in &self.faces {
            types.set(PrimitiveTypes::for_index_count(face.len()));
        }
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_bit_for_index_count() {
        assert_eq!(PrimitiveTypes::for_index_count(1), PrimitiveTypes::POINT);
        assert_eq!(PrimitiveTypes::for_index_count(2), PrimitiveTypes::LINE);
        assert_eq!(PrimitiveTypes::for_index_count(3), PrimitiveTypes::TRIANGLE);
        assert_eq!(PrimitiveTypes::for_index_count(4), PrimitiveTypes::POLYGON);
        assert_eq!(PrimitiveTypes::for_index_count(12), PrimitiveTypes::POLYGON);
    }

    #[test]
    fn test_compute_primitive_types_mixed() {
        let mesh = Mesh {
            faces: vec![Face::new(vec![0]), Face::new(vec![1, 2, 3]), Face::new(vec![4, 5, 6, 7])],
            ..Default::default()
        };
        let types = mesh.compute_primitive_types();
        assert!(types.has(PrimitiveTypes::POINT));
        assert!(!types.has(PrimitiveTypes::LINE));
        assert!(types.has(PrimitiveTypes::TRIANGLE));
        assert!(types.has(PrimitiveTypes::POLYGON));
    }

    #[test]
    fn test_uv_channel_count_stops_at_gap() {
        let mut mesh = Mesh::default();
        mesh.texture_coords[0] = Some(vec![Vec3::ZERO]);
        mesh.texture_coords[1] = Some(vec![Vec3::ZERO]);
        mesh.texture_coords[3] = Some(vec![Vec3::ZERO]);
        assert_eq!(mesh.num_uv_channels(), 2);
        assert!(mesh.has_texture_coords(3));
        assert!(!mesh.has_texture_coords(2));
        assert!(!mesh.has_texture_coords(MAX_TEXTURE_COORDS));
    }

    #[test]
    fn test_set_bones_syncs_count() {
        let mut mesh = Mesh::default();
        mesh.set_bones(vec![Bone::new("hip", vec![VertexWeight { vertex_id: 0, weight: 1.0 }])]);
        assert_eq!(mesh.num_bones, 1);
        assert_eq!(mesh.bones().len(), 1);
        mesh.set_bones(Vec::new());
        assert_eq!(mesh.num_bones, 0);
        assert!(mesh.bones.is_none());
    }

    #[test]
    fn test_unset_face_reads_as_empty() {
        let face = Face::default();
        assert!(face.is_empty());
        assert_eq!(face.indices(), &[] as &[u32]);
    }
}
