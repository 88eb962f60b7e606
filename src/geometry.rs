use crate::error::{RenderError, RenderResult};
use crate::gl::Gl;
use crate::program::ProgramLocations;

pub const QUAD_VERTEX_COUNT: i32 = 6;
pub const COMPONENTS_PER_VERTEX: i32 = 2;

/// Two triangles covering clip space.
#[rustfmt::skip]
pub const QUAD_POSITIONS: [f32; 12] = [
    -1.0, -1.0,
     1.0, -1.0,
    -1.0,  1.0,
    -1.0,  1.0,
     1.0, -1.0,
     1.0,  1.0,
];

#[rustfmt::skip]
pub const QUAD_TEX_COORDS: [f32; 12] = [
    0.0, 0.0,
    1.0, 0.0,
    0.0, 1.0,
    0.0, 1.0,
    1.0, 0.0,
    1.0, 1.0,
];

/// The static fullscreen quad. Uploaded once, never resized: coordinates are
/// in normalized space so the viewport size does not matter.
pub struct QuadBuffers<G: Gl> {
    pub positions: G::Buffer,
    pub tex_coords: G::Buffer,
}

fn upload_attribute<G: Gl>(gl: &G, data: &[f32], location: Option<u32>) -> RenderResult<G::Buffer> {
    let buffer = gl
        .create_buffer()
        .ok_or(RenderError::ResourceCreation("vertex buffer"))?;
    gl.bind_array_buffer(Some(&buffer));
    gl.buffer_static_f32(data);
    if let Some(index) = location {
        gl.enable_vertex_attrib_array(index);
        gl.vertex_attrib_pointer_f32(index, COMPONENTS_PER_VERTEX, false, 0, 0);
    }
    Ok(buffer)
}

impl<G: Gl> QuadBuffers<G> {
    pub fn upload<U>(gl: &G, locations: &ProgramLocations<U>) -> RenderResult<Self> {
        let positions = upload_attribute(gl, &QUAD_POSITIONS, locations.position)?;
        let tex_coords = match upload_attribute(gl, &QUAD_TEX_COORDS, locations.tex_coord) {
            Ok(buffer) => buffer,
            Err(err) => {
                gl.delete_buffer(&positions);
                return Err(err);
            }
        };
        Ok(Self { positions, tex_coords })
    }

    /// Deletes both vertex buffers.
    pub fn release(self, gl: &G) {
        gl.bind_array_buffer(None);
        gl.delete_buffer(&self.positions);
        gl.delete_buffer(&self.tex_coords);
    }
}
