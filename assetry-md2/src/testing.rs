//! In-memory MD2 buffer builder for tests.

use crate::format::{
    FrameHeader, Header, Skin, TexCoord, Triangle, Vertex, FRAME_HEADER_SIZE, HEADER_SIZE, MAGIC_LE,
    VERSION, VERTEX_SIZE,
};

pub fn frame(name: &str, scale: [f32; 3], translate: [f32; 3]) -> FrameHeader {
    let mut header = FrameHeader { scale, translate, name: [0; 16] };
    header.name[..name.len()].copy_from_slice(name.as_bytes());
    header
}

pub fn vertex(x: u8, y: u8, z: u8, normal_index: u8) -> Vertex {
    Vertex { position: [x, y, z], normal_index }
}

pub fn triangle(v: [u16; 3], t: [u16; 3]) -> Triangle {
    Triangle { vertex_indices: v, tex_coord_indices: t }
}

pub fn skin(name: &str) -> Skin {
    let mut skin = Skin { name: [0; 64] };
    skin.name[..name.len()].copy_from_slice(name.as_bytes());
    skin
}

/// Section contents of one model. Counts, offsets and the frame size are
/// filled in when the buffer is laid out.
pub struct Md2Builder {
    pub header: Header,
    pub skins: Vec<Skin>,
    pub tex_coords: Vec<TexCoord>,
    pub triangles: Vec<Triangle>,
    pub frames: Vec<(FrameHeader, Vec<Vertex>)>,
    pub gl_commands: Vec<i32>,
}

impl Md2Builder {
    /// Unit quad split into two triangles, one frame, no texture data.
    pub fn quad() -> Self {
        Self {
            header: Header { magic: MAGIC_LE, version: VERSION, ..Default::default() },
            skins: Vec::new(),
            tex_coords: Vec::new(),
            triangles: vec![triangle([0, 1, 2], [0, 1, 2]), triangle([0, 2, 3], [0, 2, 3])],
            frames: vec![(
                frame("stand01", [0.5, 0.5, 0.5], [1.0, 2.0, 3.0]),
                vec![vertex(0, 0, 0, 5), vertex(10, 0, 0, 5), vertex(10, 10, 0, 5), vertex(0, 10, 0, 5)],
            )],
            gl_commands: Vec::new(),
        }
    }

    /// One 64x32 skin and a texture coordinate per quad corner.
    pub fn textured(mut self, skin_name: &str) -> Self {
        self.header.skin_width = 64;
        self.header.skin_height = 32;
        self.skins = vec![skin(skin_name)];
        self.tex_coords = vec![
            TexCoord { s: 0, t: 0 },
            TexCoord { s: 64, t: 0 },
            TexCoord { s: 64, t: 32 },
            TexCoord { s: 0, t: 16 },
        ];
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.bytes_with(|_| {})
    }

    /// Lay out all sections after the header, then let `patch` corrupt it.
    pub fn bytes_with(&self, patch: impl FnOnce(&mut Header)) -> Vec<u8> {
        let mut h = self.header;
        let mut body = Vec::new();
        let num_vertices = self.frames.first().map_or(0, |(_, v)| v.len());

        h.num_skins = self.skins.len() as i32;
        h.offset_skins = (HEADER_SIZE + body.len()) as i32;
        body.extend_from_slice(bytemuck::cast_slice(&self.skins));
        h.num_tex_coords = self.tex_coords.len() as i32;
        h.offset_tex_coords = (HEADER_SIZE + body.len()) as i32;
        body.extend_from_slice(bytemuck::cast_slice(&self.tex_coords));
        h.num_triangles = self.triangles.len() as i32;
        h.offset_triangles = (HEADER_SIZE + body.len()) as i32;
        body.extend_from_slice(bytemuck::cast_slice(&self.triangles));
        h.num_vertices = num_vertices as i32;
        h.frame_size = (FRAME_HEADER_SIZE + VERTEX_SIZE * num_vertices) as i32;
        h.num_frames = self.frames.len() as i32;
        h.offset_frames = (HEADER_SIZE + body.len()) as i32;
        for (fh, verts) in &self.frames {
            body.extend_from_slice(bytemuck::bytes_of(fh));
            body.extend_from_slice(bytemuck::cast_slice(verts));
        }
        h.num_gl_commands = self.gl_commands.len() as i32;
        h.offset_gl_commands = (HEADER_SIZE + body.len()) as i32;
        body.extend_from_slice(bytemuck::cast_slice(&self.gl_commands));
        h.offset_end = (HEADER_SIZE + body.len()) as i32;

        patch(&mut h);
        let mut out = bytemuck::bytes_of(&h).to_vec();
        out.extend_from_slice(&body);
        out
    }
}
