//! CPU-side stand-ins for the browser: a GL context, a canvas, a 2D painter,
//! a clock and an animation scheduler.
//!
//! `HeadlessGl` does not rasterize anything. It checks GLSL structurally
//! (balanced delimiters, a `main`), discovers attributes and uniforms from
//! their declarations, links by matching varyings, and records uniform writes
//! and draw calls. Calls that WebGL would reject are recorded as errors
//! instead of panicking, the way a real context sets `getError()`.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::clock::Clock;
use crate::error::RenderResult;
use crate::frame_loop::FrameScheduler;
use crate::gl::{Gl, Topology};
use crate::placeholder::Painter;
use crate::program::{ShaderStage, UNIFORM_RESOLUTION, UNIFORM_TIME};
use crate::surface::{AcquireContext, Surface, Viewport};

/// Pixel size of a freshly created HTML canvas.
pub const DEFAULT_CANVAS_SIZE: Viewport = Viewport::new(300, 150);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ShaderId(usize);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ProgramId(usize);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BufferId(usize);

/// Uniform location handed out by `HeadlessGl`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformSlot {
    program: ProgramId,
    name: String,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AttribPointer {
    pub buffer: Option<BufferId>,
    pub components: i32,
    pub normalized: bool,
    pub stride: i32,
    pub offset: i32,
    pub enabled: bool,
}

impl Default for AttribPointer {
    fn default() -> Self {
        Self {
            buffer: None,
            components: 4,
            normalized: false,
            stride: 0,
            offset: 0,
            enabled: false,
        }
    }
}

/// A successful `draw_arrays` with the uniform values it saw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: ProgramId,
    pub topology: Topology,
    pub first: i32,
    pub count: i32,
    pub time: Option<f32>,
    pub resolution: Option<[f32; 2]>,
    pub viewport: [i32; 4],
}

struct ShaderRecord {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: Option<String>,
    deleted: bool,
}

#[derive(Default)]
struct ProgramRecord {
    attached: Vec<ShaderId>,
    linked: bool,
    log: Option<String>,
    deleted: bool,
    attributes: Vec<String>,
    uniforms: Vec<String>,
    values: BTreeMap<String, UniformValue>,
}

struct BufferRecord {
    data: Vec<f32>,
    deleted: bool,
}

#[derive(Default)]
struct GlState {
    shaders: Vec<ShaderRecord>,
    programs: Vec<ProgramRecord>,
    buffers: Vec<BufferRecord>,
    bound_buffer: Option<BufferId>,
    attribs: BTreeMap<u32, AttribPointer>,
    current: Option<ProgramId>,
    link_attempts: usize,
    draws: Vec<DrawCall>,
    errors: Vec<String>,
    viewport: [i32; 4],
    clear_color: [f32; 4],
    clears: usize,
    buffer_limit: Option<usize>,
}

impl GlState {
    fn error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log::debug!("headless gl: {msg}");
        self.errors.push(msg);
    }

    fn live_program(&self, id: ProgramId) -> Option<&ProgramRecord> {
        self.programs.get(id.0).filter(|p| !p.deleted)
    }
}

/// Clones are the same context, the way repeated `getContext` calls on one
/// canvas return the same object.
#[derive(Clone, Default)]
pub struct HeadlessGl {
    state: Rc<RefCell<GlState>>,
}

impl HeadlessGl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `create_buffer` return `None` once `count` buffers exist, as a
    /// context that has run out of memory would.
    pub fn fail_buffers_after(self, count: usize) -> Self {
        self.state.borrow_mut().buffer_limit = Some(count);
        self
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    /// Operations a real context would have flagged through `getError()`.
    pub fn errors(&self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }

    pub fn clear_count(&self) -> usize {
        self.state.borrow().clears
    }

    pub fn clear_rgba(&self) -> [f32; 4] {
        self.state.borrow().clear_color
    }

    pub fn viewport_rect(&self) -> [i32; 4] {
        self.state.borrow().viewport
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.state.borrow().current
    }

    pub fn link_attempts(&self) -> usize {
        self.state.borrow().link_attempts
    }

    pub fn program_ids(&self) -> Vec<ProgramId> {
        (0..self.state.borrow().programs.len()).map(ProgramId).collect()
    }

    pub fn is_program_deleted(&self, id: ProgramId) -> bool {
        self.state.borrow().programs.get(id.0).is_none_or(|p| p.deleted)
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.iter().filter(|s| !s.deleted).count()
    }

    pub fn buffer_ids(&self) -> Vec<BufferId> {
        (0..self.state.borrow().buffers.len()).map(BufferId).collect()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.iter().filter(|b| !b.deleted).count()
    }

    pub fn buffer_data(&self, id: BufferId) -> Option<Vec<f32>> {
        self.state.borrow().buffers.get(id.0).map(|b| b.data.clone())
    }

    pub fn attrib_pointer(&self, index: u32) -> Option<AttribPointer> {
        self.state.borrow().attribs.get(&index).copied()
    }
}

fn check_syntax(source: &str) -> Result<(), String> {
    if source.trim().is_empty() {
        return Err("ERROR: 0:0: empty shader source".to_string());
    }

    let mut stack = Vec::new();
    for (line_no, line) in source.lines().enumerate() {
        let code = line.split("//").next().unwrap_or_default();
        for c in code.chars() {
            match c {
                '(' | '{' | '[' => stack.push((c, line_no + 1)),
                ')' | '}' | ']' => {
                    let open = match c {
                        ')' => '(',
                        '}' => '{',
                        _ => '[',
                    };
                    match stack.pop() {
                        Some((o, _)) if o == open => {}
                        _ => return Err(format!("ERROR: 0:{}: '{c}' : syntax error", line_no + 1)),
                    }
                }
                _ => {}
            }
        }
    }
    if let Some((c, line)) = stack.pop() {
        return Err(format!("ERROR: 0:{line}: '{c}' : unexpected end of source"));
    }

    if !source.contains("void main") {
        return Err("ERROR: 0:0: missing function definition for main()".to_string());
    }
    Ok(())
}

/// Names declared at global scope with one of `qualifiers` as first keyword.
fn declared(source: &str, qualifiers: &[&str]) -> Vec<String> {
    let mut names = Vec::new();
    for line in source.lines() {
        let mut code = line.split("//").next().unwrap_or_default().trim();
        if code.starts_with("layout") {
            code = code.split_once(')').map_or("", |(_, rest)| rest.trim());
        }
        let Some(decl) = code.strip_suffix(';') else {
            continue;
        };
        let tokens: Vec<&str> = decl.split_whitespace().collect();
        if tokens.len() < 3 || !qualifiers.contains(&tokens[0]) {
            continue;
        }
        let name = tokens[tokens.len() - 1];
        let name = name.split('[').next().unwrap_or(name);
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn link(vs: &ShaderRecord, fs: &ShaderRecord) -> Result<(Vec<String>, Vec<String>), String> {
    let outputs = declared(&vs.source, &["out", "varying"]);
    for input in declared(&fs.source, &["in", "varying"]) {
        if !outputs.contains(&input) {
            return Err(format!(
                "ERROR: fragment input `{input}` has no matching output in the vertex stage"
            ));
        }
    }

    let attributes = declared(&vs.source, &["in", "attribute"]);
    let mut uniforms = declared(&vs.source, &["uniform"]);
    for name in declared(&fs.source, &["uniform"]) {
        if !uniforms.contains(&name) {
            uniforms.push(name);
        }
    }
    Ok((attributes, uniforms))
}

impl Gl for HeadlessGl {
    type Shader = ShaderId;
    type Program = ProgramId;
    type Buffer = BufferId;
    type UniformLocation = UniformSlot;

    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderId> {
        let mut st = self.state.borrow_mut();
        st.shaders.push(ShaderRecord {
            stage,
            source: String::new(),
            compiled: false,
            log: None,
            deleted: false,
        });
        Some(ShaderId(st.shaders.len() - 1))
    }

    fn shader_source(&self, shader: &ShaderId, source: &str) {
        if let Some(rec) = self.state.borrow_mut().shaders.get_mut(shader.0) {
            rec.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: &ShaderId) {
        let mut st = self.state.borrow_mut();
        let Some(rec) = st.shaders.get_mut(shader.0).filter(|s| !s.deleted) else {
            st.error("INVALID_VALUE: compileShader on deleted shader");
            return;
        };
        match check_syntax(&rec.source) {
            Ok(()) => {
                rec.compiled = true;
                rec.log = None;
            }
            Err(log) => {
                rec.compiled = false;
                rec.log = Some(log);
            }
        }
    }

    fn shader_compiled(&self, shader: &ShaderId) -> bool {
        self.state
            .borrow()
            .shaders
            .get(shader.0)
            .is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: &ShaderId) -> Option<String> {
        self.state.borrow().shaders.get(shader.0).and_then(|s| s.log.clone())
    }

    fn delete_shader(&self, shader: &ShaderId) {
        if let Some(rec) = self.state.borrow_mut().shaders.get_mut(shader.0) {
            rec.deleted = true;
        }
    }

    fn create_program(&self) -> Option<ProgramId> {
        let mut st = self.state.borrow_mut();
        st.programs.push(ProgramRecord::default());
        Some(ProgramId(st.programs.len() - 1))
    }

    fn attach_shader(&self, program: &ProgramId, shader: &ShaderId) {
        let mut st = self.state.borrow_mut();
        let Some(rec) = st.programs.get_mut(program.0).filter(|p| !p.deleted) else {
            st.error("INVALID_OPERATION: attachShader on deleted program");
            return;
        };
        rec.attached.push(*shader);
    }

    fn detach_shader(&self, program: &ProgramId, shader: &ShaderId) {
        if let Some(rec) = self.state.borrow_mut().programs.get_mut(program.0) {
            rec.attached.retain(|s| s != shader);
        }
    }

    fn link_program(&self, program: &ProgramId) {
        let mut st = self.state.borrow_mut();
        st.link_attempts += 1;
        let Some(rec) = st.live_program(*program) else {
            st.error("INVALID_OPERATION: linkProgram on deleted program");
            return;
        };

        let stage = |want: ShaderStage| {
            rec.attached
                .iter()
                .filter_map(|id| st.shaders.get(id.0))
                .find(|s| s.stage == want)
        };
        let result = match (stage(ShaderStage::Vertex), stage(ShaderStage::Fragment)) {
            (Some(vs), Some(fs)) if vs.compiled && fs.compiled => link(vs, fs),
            (Some(_), Some(_)) => Err("ERROR: attached shaders are not compiled".to_string()),
            _ => Err("ERROR: program needs one vertex and one fragment shader".to_string()),
        };

        let rec = &mut st.programs[program.0];
        match result {
            Ok((attributes, uniforms)) => {
                rec.linked = true;
                rec.log = None;
                rec.attributes = attributes;
                rec.uniforms = uniforms;
                rec.values.clear();
            }
            Err(log) => {
                rec.linked = false;
                rec.log = Some(log);
            }
        }
    }

    fn program_linked(&self, program: &ProgramId) -> bool {
        self.state
            .borrow()
            .programs
            .get(program.0)
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: &ProgramId) -> Option<String> {
        self.state.borrow().programs.get(program.0).and_then(|p| p.log.clone())
    }

    fn use_program(&self, program: Option<&ProgramId>) {
        let mut st = self.state.borrow_mut();
        match program {
            None => st.current = None,
            Some(id) => {
                if st.live_program(*id).is_some_and(|p| p.linked) {
                    st.current = Some(*id);
                } else {
                    st.error("INVALID_OPERATION: useProgram with deleted or unlinked program");
                }
            }
        }
    }

    fn delete_program(&self, program: &ProgramId) {
        if let Some(rec) = self.state.borrow_mut().programs.get_mut(program.0) {
            rec.deleted = true;
        }
    }

    fn attrib_location(&self, program: &ProgramId, name: &str) -> i32 {
        let st = self.state.borrow();
        st.live_program(*program)
            .filter(|p| p.linked)
            .and_then(|p| p.attributes.iter().position(|a| a == name))
            .map_or(-1, |i| i as i32)
    }

    fn uniform_location(&self, program: &ProgramId, name: &str) -> Option<UniformSlot> {
        let st = self.state.borrow();
        st.live_program(*program)
            .filter(|p| p.linked && p.uniforms.iter().any(|u| u == name))
            .map(|_| UniformSlot {
                program: *program,
                name: name.to_string(),
            })
    }

    fn create_buffer(&self) -> Option<BufferId> {
        let mut st = self.state.borrow_mut();
        if st.buffer_limit.is_some_and(|limit| st.buffers.len() >= limit) {
            return None;
        }
        st.buffers.push(BufferRecord {
            data: Vec::new(),
            deleted: false,
        });
        Some(BufferId(st.buffers.len() - 1))
    }

    fn bind_array_buffer(&self, buffer: Option<&BufferId>) {
        let mut st = self.state.borrow_mut();
        match buffer {
            None => st.bound_buffer = None,
            Some(id) => {
                if st.buffers.get(id.0).is_some_and(|b| !b.deleted) {
                    st.bound_buffer = Some(*id);
                } else {
                    st.error("INVALID_OPERATION: bindBuffer with deleted buffer");
                }
            }
        }
    }

    fn buffer_static_f32(&self, data: &[f32]) {
        let mut st = self.state.borrow_mut();
        let Some(id) = st.bound_buffer else {
            st.error("INVALID_OPERATION: bufferData with no ARRAY_BUFFER bound");
            return;
        };
        st.buffers[id.0].data = data.to_vec();
    }

    fn delete_buffer(&self, buffer: &BufferId) {
        let mut st = self.state.borrow_mut();
        if let Some(rec) = st.buffers.get_mut(buffer.0) {
            rec.deleted = true;
        }
        if st.bound_buffer == Some(*buffer) {
            st.bound_buffer = None;
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.state
            .borrow_mut()
            .attribs
            .entry(index)
            .or_default()
            .enabled = true;
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        components: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        let mut st = self.state.borrow_mut();
        let Some(buffer) = st.bound_buffer else {
            st.error("INVALID_OPERATION: vertexAttribPointer with no ARRAY_BUFFER bound");
            return;
        };
        if !(1..=4).contains(&components) {
            st.error("INVALID_VALUE: vertexAttribPointer size out of range");
            return;
        }
        let ptr = st.attribs.entry(index).or_default();
        ptr.buffer = Some(buffer);
        ptr.components = components;
        ptr.normalized = normalized;
        ptr.stride = stride;
        ptr.offset = offset;
    }

    fn uniform1f(&self, location: Option<&UniformSlot>, x: f32) {
        write_uniform(&self.state, location, UniformValue::Float(x));
    }

    fn uniform2f(&self, location: Option<&UniformSlot>, x: f32, y: f32) {
        write_uniform(&self.state, location, UniformValue::Vec2([x, y]));
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().viewport = [x, y, width, height];
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.state.borrow_mut().clear_color = [r, g, b, a];
    }

    fn clear_color_buffer(&self) {
        self.state.borrow_mut().clears += 1;
    }

    fn draw_arrays(&self, topology: Topology, first: i32, count: i32) {
        let mut st = self.state.borrow_mut();
        let Some(program) = st.current else {
            st.error("INVALID_OPERATION: drawArrays with no current program");
            return;
        };
        let Some(rec) = st.live_program(program) else {
            st.error("INVALID_OPERATION: drawArrays with deleted program");
            return;
        };
        let time = match rec.values.get(UNIFORM_TIME) {
            Some(UniformValue::Float(t)) => Some(*t),
            _ => None,
        };
        let resolution = match rec.values.get(UNIFORM_RESOLUTION) {
            Some(UniformValue::Vec2(r)) => Some(*r),
            _ => None,
        };

        let needed = (first + count).max(0) as usize;
        let short = st.attribs.values().filter(|p| p.enabled).any(|p| {
            p.buffer
                .and_then(|id| st.buffers.get(id.0))
                .filter(|b| !b.deleted)
                .is_none_or(|b| b.data.len() < needed * p.components as usize)
        });
        if short {
            st.error("INVALID_OPERATION: drawArrays reads past an attribute buffer");
            return;
        }

        let call = DrawCall {
            program,
            topology,
            first,
            count,
            time,
            resolution,
            viewport: st.viewport,
        };
        st.draws.push(call);
    }
}

fn write_uniform(state: &RefCell<GlState>, location: Option<&UniformSlot>, value: UniformValue) {
    // A null location is silently ignored, as in WebGL.
    let Some(slot) = location else {
        return;
    };
    let mut st = state.borrow_mut();
    if st.current != Some(slot.program) {
        st.error("INVALID_OPERATION: uniform location does not belong to the current program");
        return;
    }
    st.programs[slot.program.0]
        .values
        .insert(slot.name.clone(), value);
}

struct SurfaceState {
    viewport: Viewport,
    pixels: Viewport,
    context_available: bool,
    gl: Option<HeadlessGl>,
}

/// A canvas inside a window. Clones share state, so a test can keep one
/// handle to resize the window while the renderer owns another.
#[derive(Clone)]
pub struct HeadlessSurface {
    inner: Rc<RefCell<SurfaceState>>,
}

impl HeadlessSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SurfaceState {
                viewport,
                pixels: DEFAULT_CANVAS_SIZE,
                context_available: true,
                gl: None,
            })),
        }
    }

    /// A host that refuses every context request.
    pub fn without_context(self) -> Self {
        self.inner.borrow_mut().context_available = false;
        self
    }

    /// Hands out `gl` as this canvas's WebGL context.
    pub fn with_gl(self, gl: HeadlessGl) -> Self {
        self.inner.borrow_mut().gl = Some(gl);
        self
    }

    /// The WebGL context this canvas has handed out, if any.
    pub fn gl(&self) -> Option<HeadlessGl> {
        self.inner.borrow().gl.clone()
    }

    /// Changes the window size; the canvas keeps its pixel size until the
    /// owner handles the resize.
    pub fn resize_window(&self, viewport: Viewport) {
        self.inner.borrow_mut().viewport = viewport;
    }
}

impl Surface for HeadlessSurface {
    fn viewport_size(&self) -> Viewport {
        self.inner.borrow().viewport
    }

    fn pixel_size(&self) -> Viewport {
        self.inner.borrow().pixels
    }

    fn set_pixel_size(&mut self, size: Viewport) {
        self.inner.borrow_mut().pixels = size;
    }
}

impl AcquireContext<HeadlessGl> for HeadlessSurface {
    fn acquire_context(&self) -> Option<HeadlessGl> {
        let mut inner = self.inner.borrow_mut();
        if !inner.context_available {
            return None;
        }
        Some(inner.gl.get_or_insert_with(HeadlessGl::new).clone())
    }
}

impl AcquireContext<RecordingPainter> for HeadlessSurface {
    fn acquire_context(&self) -> Option<RecordingPainter> {
        self.inner
            .borrow()
            .context_available
            .then(RecordingPainter::default)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    Rect {
        color: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle {
        color: String,
        cx: f64,
        cy: f64,
        radius: f64,
    },
}

#[derive(Default)]
pub struct RecordingPainter {
    ops: RefCell<Vec<PaintOp>>,
}

impl RecordingPainter {
    pub fn ops(&self) -> Vec<PaintOp> {
        self.ops.borrow().clone()
    }
}

impl Painter for RecordingPainter {
    fn fill_rect(&self, color: &str, x: f64, y: f64, width: f64, height: f64) {
        self.ops.borrow_mut().push(PaintOp::Rect {
            color: color.to_string(),
            x,
            y,
            width,
            height,
        });
    }

    fn fill_circle(&self, color: &str, cx: f64, cy: f64, radius: f64) {
        self.ops.borrow_mut().push(PaintOp::Circle {
            color: color.to_string(),
            cx,
            cy,
            radius,
        });
    }
}

/// Hand-driven time source. Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(seconds: f64) -> Self {
        let clock = Self::new();
        clock.set(seconds);
        clock
    }

    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Counts frame requests; a test "delivers" a frame by taking one.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    pending: Rc<Cell<usize>>,
    requested: Rc<Cell<usize>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one pending request, if any.
    pub fn take(&self) -> bool {
        let pending = self.pending.get();
        if pending == 0 {
            return false;
        }
        self.pending.set(pending - 1);
        true
    }

    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    pub fn requested(&self) -> usize {
        self.requested.get()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> RenderResult<()> {
        self.pending.set(self.pending.get() + 1);
        self.requested.set(self.requested.get() + 1);
        Ok(())
    }
}
