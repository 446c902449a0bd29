use bytemuck::Pod;
use glam::Vec3;
use thiserror::Error;

use assetry_scene::{
    Face, Material, MaterialKey, Mesh, PrimitiveTypes, Scene, ShadingModel, TextureType,
    DEFAULT_MATERIAL_NAME,
};

use crate::cursor::Cursor;
use crate::format::{
    FrameHeader, Header, Skin, TexCoord, Triangle, Vertex, GL_COMMAND_SIZE, HEADER_SIZE, MAX_FRAMES,
    MAX_SKINS, MAX_VERTS, SKIN_SIZE, TEX_COORD_SIZE, TRIANGLE_SIZE, VERSION,
};
use crate::normals::{self, NUM_NORMALS};

/// Root node name used when the caller does not name the source.
pub const ROOT_NODE_NAME: &str = "<MD2Root>";

/// Malformed or untrusted input. Always fatal; no partial scene is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("buffer holds {len} bytes, an MD2 header needs {}", HEADER_SIZE)]
    TooSmall { len: usize },
    #[error("invalid MD2 magic word {found:#010x}, expected IDP2")]
    BadMagic { found: i32 },
    #[error("header field {field} is negative ({value})")]
    InvalidField { field: &'static str, value: i32 },
    #[error("file contains no frames")]
    Empty,
    #[error("file claims to end at byte {end}, buffer holds {len}")]
    Truncated { end: usize, len: usize },
    #[error("{section} section ends at byte {end}, buffer holds {len}")]
    SectionOutOfRange { section: &'static str, offset: usize, end: usize, len: usize },
    #[error("frame {frame} requested, file has {count}")]
    FrameOutOfRange { frame: usize, count: usize },
    #[error("file has {triangles} triangles but frames hold no vertices")]
    NoVertices { triangles: usize },
    #[error("triangle {triangle} references vertex {index}, frames hold {count}")]
    VertexIndexOutOfRange { triangle: usize, index: usize, count: usize },
    #[error("frame vertex {vertex} uses normal {index}, the table has {}", NUM_NORMALS)]
    NormalIndexOutOfRange { vertex: usize, index: usize },
    #[error("triangle {triangle} references texture coordinate {index}, file has {count}")]
    TexCoordIndexOutOfRange { triangle: usize, index: usize, count: usize },
}

/// What to do with vertex, normal and texture-coordinate indices that point
/// past the end of their table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IndexPolicy {
    /// Clamp to the last valid entry and log a warning.
    #[default]
    Lenient,
    /// Reject the file.
    Strict,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Keyframe to materialize.
    pub frame: usize,
    pub index_policy: IndexPolicy,
    /// File name of the source, used for the root node name and to guess a
    /// texture for files without skins.
    pub source_name: Option<String>,
}

/// Decode `frame` of an MD2 buffer with default options.
pub fn decode(bytes: &[u8], frame: usize) -> Result<Scene, DecodeError> {
    decode_with(bytes, &DecodeOptions { frame, ..Default::default() })
}

/// Decode an MD2 buffer into a scene with one root node, one mesh and one
/// material.
///
/// Triangles are unrolled: every corner becomes its own vertex, so the mesh
/// has `3 * numTriangles` vertices and face `i` is `[3i, 3i + 1, 3i + 2]`.
pub fn decode_with(bytes: &[u8], options: &DecodeOptions) -> Result<Scene, DecodeError> {
    let header = read_header(bytes, options.frame)?;
    let policy = options.index_policy;

    let num_vertices = header.num_vertices as usize;
    let num_tex_coords = header.num_tex_coords as usize;
    let num_triangles = header.num_triangles as usize;

    let frame_offset = header.offset_frames as usize + header.frame_stride() * options.frame;
    let mut cursor = Cursor::at(bytes, frame_offset);
    let frame: FrameHeader = cursor.read().ok_or_else(|| out_of_range("frames", frame_offset, bytes))?;
    let vertices: Vec<Vertex> =
        cursor.read_array(num_vertices).ok_or_else(|| out_of_range("frames", frame_offset, bytes))?;

    let triangles: Vec<Triangle> =
        read_section(bytes, "triangles", header.offset_triangles, num_triangles)?;
    let tex_coords: Vec<TexCoord> =
        read_section(bytes, "texcoords", header.offset_tex_coords, num_tex_coords)?;

    let scale = Vec3::from(frame.scale);
    let translate = Vec3::from(frame.translate);
    let (divisor_u, divisor_v) = if num_tex_coords > 0 {
        (skin_divisor(header.skin_width, "width"), skin_divisor(header.skin_height, "height"))
    } else {
        (1.0, 1.0)
    };

    let corners = num_triangles * 3;
    let mut positions = Vec::with_capacity(corners);
    let mut normals = Vec::with_capacity(corners);
    let mut uvs = Vec::with_capacity(if num_tex_coords > 0 { corners } else { 0 });
    let mut faces = Vec::with_capacity(num_triangles);

    for (t, triangle) in triangles.iter().enumerate() {
        let mut face = Vec::with_capacity(3);
        for c in 0..3 {
            let index = triangle.vertex_indices[c] as usize;
            let v = resolve(index, num_vertices, policy, "vertex", || {
                DecodeError::VertexIndexOutOfRange { triangle: t, index, count: num_vertices }
            })?;
            let vertex = vertices[v];

            let quantized = Vec3::new(
                vertex.position[0] as f32,
                vertex.position[1] as f32,
                vertex.position[2] as f32,
            );
            let p = translate + scale * quantized;
            // Z-up to Y-up.
            positions.push(Vec3::new(p.x, p.z, p.y));
            normals.push(lookup_normal(v, vertex.normal_index as usize, policy)?);

            if num_tex_coords > 0 {
                let index = triangle.tex_coord_indices[c] as usize;
                let tc = resolve(index, num_tex_coords, policy, "texture coordinate", || {
                    DecodeError::TexCoordIndexOutOfRange { triangle: t, index, count: num_tex_coords }
                })?;
                let TexCoord { s, t: tv } = tex_coords[tc];
                uvs.push(Vec3::new(s as f32 / divisor_u, 1.0 - tv as f32 / divisor_v, 0.0));
            }

            face.push((positions.len() - 1) as u32);
        }
        faces.push(Face::new(face));
    }

    let mut mesh = Mesh {
        name: frame.name(),
        primitive_types: PrimitiveTypes(PrimitiveTypes::TRIANGLE),
        num_vertices: positions.len() as u32,
        positions: Some(positions),
        normals: Some(normals),
        faces,
        material_index: 0,
        ..Default::default()
    };
    if num_tex_coords > 0 {
        mesh.texture_coords[0] = Some(uvs);
        mesh.num_uv_components[0] = 2;
    }

    let material = build_material(bytes, &header, options.source_name.as_deref())?;

    let root_name = options.source_name.clone().unwrap_or_else(|| ROOT_NODE_NAME.to_string());
    let mut scene = Scene::with_root(root_name);
    if let Some(root) = scene.root_node_mut() {
        root.meshes.push(0);
    }
    log::debug!(
        "Decoded MD2 frame {} ('{}'): {} triangles, {} vertices",
        options.frame,
        mesh.name,
        num_triangles,
        mesh.num_vertices
    );
    scene.meshes.push(mesh);
    scene.materials.push(material);
    Ok(scene)
}

// ── Header validation ──

fn read_header(bytes: &[u8], frame: usize) -> Result<Header, DecodeError> {
    let len = bytes.len();
    let header: Header = Cursor::new(bytes).read().ok_or(DecodeError::TooSmall { len })?;

    if !header.has_valid_magic() {
        return Err(DecodeError::BadMagic { found: header.magic });
    }
    if header.version != VERSION {
        log::warn!("Unsupported MD2 file version {}, continuing", header.version);
    }
    for (field, value) in header.counts_and_offsets() {
        if value < 0 {
            return Err(DecodeError::InvalidField { field, value });
        }
    }
    if header.num_frames == 0 {
        return Err(DecodeError::Empty);
    }
    let end = header.offset_end as usize;
    if end > len {
        return Err(DecodeError::Truncated { end, len });
    }

    let stride = header.frame_stride();
    if header.frame_size as usize != stride {
        log::warn!(
            "MD2 header declares {} bytes per frame, {} vertices need {}; using the latter",
            header.frame_size,
            header.num_vertices,
            stride
        );
    }

    check_section("skins", header.offset_skins, header.num_skins, SKIN_SIZE, len)?;
    check_section("texcoords", header.offset_tex_coords, header.num_tex_coords, TEX_COORD_SIZE, len)?;
    check_section("triangles", header.offset_triangles, header.num_triangles, TRIANGLE_SIZE, len)?;
    check_section("frames", header.offset_frames, header.num_frames, stride, len)?;
    check_section(
        "gl commands",
        header.offset_gl_commands,
        header.num_gl_commands,
        GL_COMMAND_SIZE,
        len,
    )?;

    if header.num_skins > MAX_SKINS {
        log::warn!("MD2 file has {} skins, more than Quake II supports", header.num_skins);
    }
    if header.num_frames > MAX_FRAMES {
        log::warn!("MD2 file has {} frames, more than Quake II supports", header.num_frames);
    }
    if header.num_vertices > MAX_VERTS {
        log::warn!("MD2 file has {} vertices, more than Quake II supports", header.num_vertices);
    }

    let count = header.num_frames as usize;
    if frame >= count {
        return Err(DecodeError::FrameOutOfRange { frame, count });
    }
    if header.num_triangles > 0 && header.num_vertices == 0 {
        return Err(DecodeError::NoVertices { triangles: header.num_triangles as usize });
    }
    Ok(header)
}

/// `offset + count * size` must stay within the buffer. Fields are known to
/// be non-negative here.
fn check_section(
    section: &'static str,
    offset: i32,
    count: i32,
    size: usize,
    len: usize,
) -> Result<(), DecodeError> {
    let offset = offset as usize;
    let end = (count as usize).checked_mul(size).and_then(|n| n.checked_add(offset));
    match end {
        Some(end) if end <= len => Ok(()),
        end => Err(DecodeError::SectionOutOfRange { section, offset, end: end.unwrap_or(usize::MAX), len }),
    }
}

fn read_section<T: Pod>(
    bytes: &[u8],
    section: &'static str,
    offset: i32,
    count: usize,
) -> Result<Vec<T>, DecodeError> {
    let offset = offset as usize;
    Cursor::at(bytes, offset)
        .read_array(count)
        .ok_or_else(|| out_of_range(section, offset, bytes))
}

fn out_of_range(section: &'static str, offset: usize, bytes: &[u8]) -> DecodeError {
    DecodeError::SectionOutOfRange { section, offset, end: usize::MAX, len: bytes.len() }
}

// ── Attribute reconstruction ──

fn resolve(
    index: usize,
    count: usize,
    policy: IndexPolicy,
    what: &str,
    strict_error: impl FnOnce() -> DecodeError,
) -> Result<usize, DecodeError> {
    if index < count {
        return Ok(index);
    }
    match policy {
        IndexPolicy::Strict => Err(strict_error()),
        IndexPolicy::Lenient => {
            log::warn!("MD2: {what} index {index} is out of range, clamping to {}", count - 1);
            Ok(count - 1)
        }
    }
}

fn lookup_normal(vertex: usize, index: usize, policy: IndexPolicy) -> Result<Vec3, DecodeError> {
    let index = resolve(index, NUM_NORMALS, policy, "normal", || {
        DecodeError::NormalIndexOutOfRange { vertex, index }
    })?;
    Ok(normals::lookup(index).unwrap_or(Vec3::ZERO))
}

fn skin_divisor(value: i32, what: &str) -> f32 {
    if value <= 0 {
        log::warn!("MD2: no valid skin {what} given, texture coordinates stay in texels");
        1.0
    } else {
        value as f32
    }
}

// ── Material ──

fn build_material(bytes: &[u8], header: &Header, source_name: Option<&str>) -> Result<Material, DecodeError> {
    let mut material = Material::new();
    material.set_shading_model(ShadingModel::Gouraud);

    if header.num_tex_coords > 0 && header.num_skins > 0 {
        let skins: Vec<Skin> = read_section(bytes, "skins", header.offset_skins, 1)?;
        material.set_color(MaterialKey::ColorDiffuse, Vec3::ONE);
        material.set_color(MaterialKey::ColorSpecular, Vec3::ONE);
        material.set_color(MaterialKey::ColorAmbient, Vec3::splat(0.05));

        match skins.first().map(Skin::name) {
            Some(name) if !name.is_empty() => material.set_texture(name, TextureType::Diffuse, 0),
            _ => {
                log::warn!("MD2 skin name is empty, the texture is skipped");
                material.set_name(DEFAULT_MATERIAL_NAME);
            }
        }
    } else {
        material.set_color(MaterialKey::ColorDiffuse, Vec3::splat(0.6));
        material.set_color(MaterialKey::ColorSpecular, Vec3::splat(0.6));
        material.set_color(MaterialKey::ColorAmbient, Vec3::splat(0.05));
        material.set_name(DEFAULT_MATERIAL_NAME);
        if let Some(source) = source_name {
            material.set_texture(guess_texture(source), TextureType::Diffuse, 0);
        }
    }
    Ok(material)
}

/// `models/tris.md2` -> `tris.bmp`
fn guess_texture(source: &str) -> String {
    let file = source.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(source);
    let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
    format!("{stem}.bmp")
}
