//! The render controller: exclusive owner of the surface, the GL context, the
//! program and the quad buffers.

use crate::config::Rgba;
use crate::context::{acquire_gl, fit_to_viewport};
use crate::error::{RenderError, RenderResult};
use crate::geometry::{QuadBuffers, QUAD_VERTEX_COUNT};
use crate::gl::{Gl, Topology};
use crate::program::{build_program, CloudProgram};
use crate::shaders::{FRAGMENT_SHADER, VERTEX_SHADER};
use crate::surface::{AcquireContext, Viewport};

/// What one draw call sent to the device.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub time: f32,
    pub resolution: [f32; 2],
}

pub struct Renderer<S, G: Gl> {
    surface: S,
    gl: G,
    program: Option<CloudProgram<G>>,
    quad: Option<QuadBuffers<G>>,
    viewport: Viewport,
}

impl<S, G> Renderer<S, G>
where
    S: AcquireContext<G>,
    G: Gl,
{
    /// Sets up the cloud scene with the built-in shaders.
    pub fn new(surface: S, background: Rgba) -> RenderResult<Self> {
        Self::with_sources(surface, background, VERTEX_SHADER, FRAGMENT_SHADER)
    }

    /// Acquires the context, builds the program and uploads the quad, in that
    /// order. Whatever was allocated before a failure is released again.
    pub fn with_sources(
        mut surface: S,
        background: Rgba,
        vertex: &str,
        fragment: &str,
    ) -> RenderResult<Self> {
        let gl = acquire_gl(&mut surface, background)?;
        let viewport = surface.pixel_size();
        let mut renderer = Self {
            surface,
            gl,
            program: None,
            quad: None,
            viewport,
        };

        if let Err(err) = renderer.build(vertex, fragment) {
            renderer.teardown();
            return Err(err);
        }
        Ok(renderer)
    }

    fn build(&mut self, vertex: &str, fragment: &str) -> RenderResult<()> {
        let program = self.program.insert(build_program(&self.gl, vertex, fragment)?);
        self.gl.use_program(Some(&program.handle));
        self.quad = Some(QuadBuffers::upload(&self.gl, &program.locations)?);
        Ok(())
    }

    /// Re-fits the surface to its viewport. The next frame picks up the new
    /// resolution.
    pub fn resize(&mut self) -> Viewport {
        let size = fit_to_viewport(&mut self.surface);
        if size != self.viewport {
            log::debug!("viewport resized to {}x{}", size.width, size.height);
        }
        self.viewport = size;
        self.gl
            .viewport(0, 0, size.width as i32, size.height as i32);
        size
    }
}

impl<S, G: Gl> Renderer<S, G> {
    pub fn is_live(&self) -> bool {
        self.program.is_some()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn program(&self) -> Option<&CloudProgram<G>> {
        self.program.as_ref()
    }

    /// Makes the cloud program the active one.
    pub fn bind_program(&self) -> RenderResult<()> {
        let program = self.program.as_ref().ok_or(RenderError::ResourcesReleased)?;
        self.gl.use_program(Some(&program.handle));
        Ok(())
    }

    /// Clears, writes `iTime` and `iResolution`, and draws the quad once.
    pub fn draw_frame(&self, time: f32) -> RenderResult<Frame> {
        let program = self.program.as_ref().ok_or(RenderError::ResourcesReleased)?;
        let frame = Frame {
            time,
            resolution: self.viewport.resolution(),
        };

        self.gl.clear_color_buffer();
        self.gl.uniform1f(program.locations.time.as_ref(), frame.time);
        self.gl.uniform2f(
            program.locations.resolution.as_ref(),
            frame.resolution[0],
            frame.resolution[1],
        );
        self.gl.draw_arrays(Topology::Triangles, 0, QUAD_VERTEX_COUNT);
        Ok(frame)
    }

    /// Unbinds the program, then deletes both buffers and the program.
    /// Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.program.is_none() && self.quad.is_none() {
            return;
        }
        self.gl.use_program(None);
        if let Some(quad) = self.quad.take() {
            quad.release(&self.gl);
        }
        if let Some(program) = self.program.take() {
            self.gl.delete_program(&program.handle);
        }
        log::info!("render resources released");
    }
}
