//! Compiles the two shader stages, links them and resolves the locations the
//! renderer writes to.

use std::fmt;

use crate::error::{RenderError, RenderResult};
use crate::gl::Gl;

pub const ATTR_POSITION: &str = "position";
pub const ATTR_TEX_COORD: &str = "texCoord";
pub const UNIFORM_TIME: &str = "iTime";
pub const UNIFORM_RESOLUTION: &str = "iResolution";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Cached attribute indices and uniform locations. `None` means the linked
/// program does not expose that name.
pub struct ProgramLocations<U> {
    pub position: Option<u32>,
    pub tex_coord: Option<u32>,
    pub time: Option<U>,
    pub resolution: Option<U>,
}

impl<U> ProgramLocations<U> {
    pub fn is_complete(&self) -> bool {
        self.position.is_some()
            && self.tex_coord.is_some()
            && self.time.is_some()
            && self.resolution.is_some()
    }
}

/// A linked program together with its resolved locations.
pub struct CloudProgram<G: Gl> {
    pub handle: G::Program,
    pub locations: ProgramLocations<G::UniformLocation>,
}

fn compile<G: Gl>(gl: &G, stage: ShaderStage, source: &str) -> RenderResult<G::Shader> {
    let shader = gl
        .create_shader(stage)
        .ok_or(RenderError::ResourceCreation("shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    if gl.shader_compiled(&shader) {
        return Ok(shader);
    }

    let log = gl
        .shader_info_log(&shader)
        .unwrap_or_else(|| "unknown shader error".to_string());
    log::error!("{stage} shader compile failed: {log}");
    gl.delete_shader(&shader);
    Err(RenderError::ShaderCompile { stage, log })
}

fn attrib<G: Gl>(gl: &G, program: &G::Program, name: &str) -> Option<u32> {
    let index = gl.attrib_location(program, name);
    if index < 0 {
        log::warn!("attribute `{name}` not found in linked program");
        return None;
    }
    Some(index as u32)
}

fn uniform<G: Gl>(gl: &G, program: &G::Program, name: &str) -> Option<G::UniformLocation> {
    let location = gl.uniform_location(program, name);
    if location.is_none() {
        log::warn!("uniform `{name}` not found in linked program; writes will be ignored");
    }
    location
}

/// Builds the cloud program from vertex and fragment sources.
///
/// A stage that fails to compile is deleted along with any stage compiled
/// before it, and linking is never attempted. A link failure deletes the
/// program object as well. On success the stage objects are detached and
/// deleted, leaving only the program.
pub fn build_program<G: Gl>(gl: &G, vertex: &str, fragment: &str) -> RenderResult<CloudProgram<G>> {
    let vs = compile(gl, ShaderStage::Vertex, vertex)?;
    let fs = match compile(gl, ShaderStage::Fragment, fragment) {
        Ok(fs) => fs,
        Err(err) => {
            gl.delete_shader(&vs);
            return Err(err);
        }
    };

    let Some(program) = gl.create_program() else {
        gl.delete_shader(&vs);
        gl.delete_shader(&fs);
        return Err(RenderError::ResourceCreation("program"));
    };
    gl.attach_shader(&program, &vs);
    gl.attach_shader(&program, &fs);
    gl.link_program(&program);

    let linked = gl.program_linked(&program);
    let link_log = (!linked).then(|| {
        gl.program_info_log(&program)
            .unwrap_or_else(|| "unknown program error".to_string())
    });

    gl.detach_shader(&program, &vs);
    gl.detach_shader(&program, &fs);
    gl.delete_shader(&vs);
    gl.delete_shader(&fs);

    if let Some(log) = link_log {
        log::error!("program link failed: {log}");
        gl.delete_program(&program);
        return Err(RenderError::ProgramLink { log });
    }

    let locations = ProgramLocations {
        position: attrib(gl, &program, ATTR_POSITION),
        tex_coord: attrib(gl, &program, ATTR_TEX_COORD),
        time: uniform(gl, &program, UNIFORM_TIME),
        resolution: uniform(gl, &program, UNIFORM_RESOLUTION),
    };
    log::debug!("cloud program linked (all locations resolved: {})", locations.is_complete());

    Ok(CloudProgram { handle: program, locations })
}
