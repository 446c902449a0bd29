//! MD2 on-disk layout.
//!
//! Every record is `#[repr(C)]` plain old data read straight out of the file
//! in native byte order. Offsets in the header are bytes from the file start.

use bytemuck::{Pod, Zeroable};

/// `IDP2` spelled as a big-endian integer.
pub const MAGIC_BE: i32 = i32::from_be_bytes(*b"IDP2");
/// `IDP2` spelled as a little-endian integer (what a little-endian host reads).
pub const MAGIC_LE: i32 = i32::from_le_bytes(*b"IDP2");

pub const VERSION: i32 = 8;

// Quake II engine limits. Files exceeding them still load.
pub const MAX_SKINS: i32 = 32;
pub const MAX_FRAMES: i32 = 512;
pub const MAX_VERTS: i32 = 2048;

pub const HEADER_SIZE: usize = std::mem::size_of::<Header>();
pub const FRAME_HEADER_SIZE: usize = std::mem::size_of::<FrameHeader>();
pub const VERTEX_SIZE: usize = std::mem::size_of::<Vertex>();
pub const TRIANGLE_SIZE: usize = std::mem::size_of::<Triangle>();
pub const TEX_COORD_SIZE: usize = std::mem::size_of::<TexCoord>();
pub const SKIN_SIZE: usize = std::mem::size_of::<Skin>();
pub const GL_COMMAND_SIZE: usize = 4;

// ── Header (68 bytes) ──

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Header {
    pub magic: i32,
    pub version: i32,
    pub skin_width: i32,
    pub skin_height: i32,
    /// Declared bytes per frame record.
    pub frame_size: i32,
    pub num_skins: i32,
    pub num_vertices: i32,
    pub num_tex_coords: i32,
    pub num_triangles: i32,
    pub num_gl_commands: i32,
    pub num_frames: i32,
    pub offset_skins: i32,
    pub offset_tex_coords: i32,
    pub offset_triangles: i32,
    pub offset_frames: i32,
    pub offset_gl_commands: i32,
    pub offset_end: i32,
}

impl Header {
    pub fn has_valid_magic(&self) -> bool {
        self.magic == MAGIC_LE || self.magic == MAGIC_BE
    }

    /// Byte stride of one frame record for this header's vertex count.
    pub fn frame_stride(&self) -> usize {
        (self.num_vertices.max(0) as usize)
            .saturating_mul(VERTEX_SIZE)
            .saturating_add(FRAME_HEADER_SIZE)
    }

    /// Counts and offsets with their field names, in header order.
    pub fn counts_and_offsets(&self) -> [(&'static str, i32); 12] {
        [
            ("numSkins", self.num_skins),
            ("numVertices", self.num_vertices),
            ("numTexCoords", self.num_tex_coords),
            ("numTriangles", self.num_triangles),
            ("numGlCommands", self.num_gl_commands),
            ("numFrames", self.num_frames),
            ("offsetSkins", self.offset_skins),
            ("offsetTexCoords", self.offset_tex_coords),
            ("offsetTriangles", self.offset_triangles),
            ("offsetFrames", self.offset_frames),
            ("offsetGlCommands", self.offset_gl_commands),
            ("offsetEnd", self.offset_end),
        ]
    }
}

// ── Frames ──

/// Fixed part of a frame record, followed by `num_vertices` [`Vertex`]es.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FrameHeader {
    pub scale: [f32; 3],
    pub translate: [f32; 3],
    pub name: [u8; 16],
}

impl FrameHeader {
    pub fn name(&self) -> String {
        fixed_str(&self.name)
    }
}

/// Compressed vertex: quantized position plus an index into the normal table.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [u8; 3],
    pub normal_index: u8,
}

// ── Geometry ──

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Triangle {
    pub vertex_indices: [u16; 3],
    pub tex_coord_indices: [u16; 3],
}

/// Texel-space texture coordinate.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct TexCoord {
    pub s: u16,
    pub t: u16,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Skin {
    pub name: [u8; 64],
}

impl Skin {
    pub fn name(&self) -> String {
        fixed_str(&self.name)
    }
}

/// NUL-terminated, space-padded fixed-width string.
fn fixed_str(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(HEADER_SIZE, 68);
        assert_eq!(FRAME_HEADER_SIZE, 40);
        assert_eq!(VERTEX_SIZE, 4);
        assert_eq!(TRIANGLE_SIZE, 12);
        assert_eq!(TEX_COORD_SIZE, 4);
        assert_eq!(SKIN_SIZE, 64);
    }

    #[test]
    fn test_magic_spellings() {
        assert_ne!(MAGIC_LE, MAGIC_BE);
        assert_eq!(MAGIC_BE.swap_bytes(), MAGIC_LE);
        let header = Header { magic: MAGIC_BE, ..Default::default() };
        assert!(header.has_valid_magic());
        let header = Header { magic: i32::from_le_bytes(*b"IDP3"), ..Default::default() };
        assert!(!header.has_valid_magic());
    }

    #[test]
    fn test_frame_stride() {
        let header = Header { num_vertices: 4, ..Default::default() };
        assert_eq!(header.frame_stride(), 56);
    }

    #[test]
    fn test_fixed_str_stops_at_nul() {
        let mut frame = FrameHeader::default();
        frame.name[..6].copy_from_slice(b"stand1");
        frame.name[7] = b'x';
        assert_eq!(frame.name(), "stand1");

        let mut skin = Skin { name: [b' '; 64] };
        skin.name[..8].copy_from_slice(b"skin.pcx");
        assert_eq!(skin.name(), "skin.pcx");
    }
}
