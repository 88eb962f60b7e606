use cloudscape_wasm::geometry::{QUAD_POSITIONS, QUAD_TEX_COORDS};
use cloudscape_wasm::headless::{HeadlessGl, HeadlessSurface};
use cloudscape_wasm::program::{build_program, ShaderStage};
use cloudscape_wasm::shaders::{FRAGMENT_SHADER, VERTEX_SHADER};
use cloudscape_wasm::{RenderError, Renderer, Rgba, Viewport};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn reference_shaders_resolve_every_location() {
    init_logs();
    let gl = HeadlessGl::new();
    let program = build_program(&gl, VERTEX_SHADER, FRAGMENT_SHADER).expect("program builds");

    let locations = &program.locations;
    assert!(locations.is_complete());
    assert_eq!(locations.position, Some(0));
    assert_eq!(locations.tex_coord, Some(1));
    // Stage objects are not kept around once the program is linked.
    assert_eq!(gl.live_shaders(), 0);
    assert!(gl.errors().is_empty(), "{:?}", gl.errors());
}

#[test]
fn invalid_vertex_source_fails_without_linking() {
    init_logs();
    let gl = HeadlessGl::new();
    let err = build_program(&gl, "void main() { gl_Position = vec4(0.0;", FRAGMENT_SHADER)
        .err()
        .expect("vertex stage must be rejected");

    match err {
        RenderError::ShaderCompile { stage, log } => {
            assert_eq!(stage, ShaderStage::Vertex);
            assert!(log.starts_with("ERROR:"), "{log}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(gl.link_attempts(), 0);
    assert_eq!(gl.live_shaders(), 0);
    assert!(gl.program_ids().is_empty());
}

#[test]
fn invalid_fragment_source_releases_compiled_vertex_stage() {
    init_logs();
    let gl = HeadlessGl::new();
    let err = build_program(&gl, VERTEX_SHADER, "precision highp float; void main() {")
        .err()
        .expect("fragment stage must be rejected");

    assert!(matches!(
        err,
        RenderError::ShaderCompile { stage: ShaderStage::Fragment, .. }
    ));
    assert_eq!(gl.link_attempts(), 0);
    assert_eq!(gl.live_shaders(), 0);
}

#[test]
fn link_failure_deletes_the_program() {
    init_logs();
    let gl = HeadlessGl::new();
    let fragment = "#version 300 es\nprecision highp float;\nin vec2 vMissing;\nout vec4 c;\nvoid main() { c = vec4(vMissing, 0.0, 1.0); }\n";
    let err = build_program(&gl, VERTEX_SHADER, fragment)
        .err()
        .expect("link must fail");

    let RenderError::ProgramLink { log } = err else {
        panic!("expected link error, got {err}");
    };
    assert!(log.contains("vMissing"));
    assert_eq!(gl.link_attempts(), 1);
    let programs = gl.program_ids();
    assert_eq!(programs.len(), 1);
    assert!(gl.is_program_deleted(programs[0]));
    assert_eq!(gl.live_shaders(), 0);
}

#[test]
fn missing_names_are_tolerated() {
    init_logs();
    let gl = HeadlessGl::new();
    let vertex = "#version 300 es\nin vec2 position;\nvoid main() { gl_Position = vec4(position, 0.0, 1.0); }\n";
    let fragment = "#version 300 es\nprecision highp float;\nout vec4 c;\nvoid main() { c = vec4(1.0); }\n";
    let program = build_program(&gl, vertex, fragment).expect("links");

    assert_eq!(program.locations.position, Some(0));
    assert_eq!(program.locations.tex_coord, None);
    assert!(program.locations.time.is_none());
    assert!(program.locations.resolution.is_none());
    assert!(!program.locations.is_complete());
}

#[test]
fn renderer_uploads_both_static_buffers() {
    init_logs();
    let surface = HeadlessSurface::new(Viewport::new(1024, 768));
    let renderer = Renderer::<_, HeadlessGl>::new(surface, Rgba::sky_blue()).expect("setup");
    let gl = renderer.gl();

    let buffers = gl.buffer_ids();
    assert_eq!(buffers.len(), 2);
    assert_eq!(gl.buffer_data(buffers[0]).unwrap(), QUAD_POSITIONS.to_vec());
    assert_eq!(gl.buffer_data(buffers[1]).unwrap(), QUAD_TEX_COORDS.to_vec());

    for (index, buffer) in [(0, buffers[0]), (1, buffers[1])] {
        let ptr = gl.attrib_pointer(index).expect("attribute configured");
        assert!(ptr.enabled);
        assert_eq!(ptr.buffer, Some(buffer));
        assert_eq!(ptr.components, 2);
        assert!(!ptr.normalized);
        assert_eq!((ptr.stride, ptr.offset), (0, 0));
    }

    let program = renderer.program().expect("live program");
    assert_eq!(gl.current_program(), Some(program.handle));
    let sky = Rgba::sky_blue();
    assert_eq!(gl.clear_rgba(), [sky.r, sky.g, sky.b, sky.a]);
}

#[test]
fn shader_failure_in_renderer_leaves_nothing_allocated() {
    init_logs();
    let surface = HeadlessSurface::new(Viewport::new(64, 64));
    let err = Renderer::<_, HeadlessGl>::with_sources(surface.clone(), Rgba::sky_blue(), VERTEX_SHADER, "")
        .err()
        .expect("empty fragment stage");
    assert!(err.is_setup_failure());
    // The context was acquired and sized before the program failed.
    assert_eq!(cloudscape_wasm::Surface::pixel_size(&surface), Viewport::new(64, 64));

    let gl = surface.gl().expect("context was handed out");
    assert_eq!(gl.live_shaders(), 0);
    assert!(gl.program_ids().is_empty());
    assert_eq!(gl.current_program(), None);
    assert!(gl.buffer_ids().is_empty());
}

#[test]
fn second_buffer_failure_releases_first_buffer_and_program() {
    init_logs();
    let gl = HeadlessGl::new().fail_buffers_after(1);
    let surface = HeadlessSurface::new(Viewport::new(64, 64)).with_gl(gl.clone());
    let err = Renderer::<_, HeadlessGl>::new(surface, Rgba::sky_blue())
        .err()
        .expect("tex-coord buffer cannot be created");

    assert!(matches!(err, RenderError::ResourceCreation("vertex buffer")));
    assert_eq!(gl.buffer_ids().len(), 1);
    assert_eq!(gl.live_buffers(), 0);
    assert_eq!(gl.current_program(), None);
    let programs = gl.program_ids();
    assert_eq!(programs.len(), 1);
    assert!(programs.iter().all(|&p| gl.is_program_deleted(p)));
    assert_eq!(gl.live_shaders(), 0);
    assert!(gl.draw_calls().is_empty());
}

#[test]
fn first_buffer_failure_releases_program() {
    init_logs();
    let gl = HeadlessGl::new().fail_buffers_after(0);
    let surface = HeadlessSurface::new(Viewport::new(64, 64)).with_gl(gl.clone());
    let err = Renderer::<_, HeadlessGl>::new(surface, Rgba::sky_blue())
        .err()
        .expect("no buffers available");

    assert!(matches!(err, RenderError::ResourceCreation(_)));
    assert!(gl.buffer_ids().is_empty());
    assert_eq!(gl.current_program(), None);
    assert!(gl.program_ids().iter().all(|&p| gl.is_program_deleted(p)));
}

#[test]
fn unavailable_context_is_terminal() {
    init_logs();
    let surface = HeadlessSurface::new(Viewport::new(640, 480)).without_context();
    let err = Renderer::<_, HeadlessGl>::new(surface, Rgba::sky_blue())
        .err()
        .expect("no context");
    assert!(matches!(err, RenderError::ContextUnavailable { .. }));
}
