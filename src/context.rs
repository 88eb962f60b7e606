//! Context acquisition: get a context from the surface, size the surface to
//! its viewport and clear it.

use crate::config::Rgba;
use crate::error::{RenderError, RenderResult};
use crate::gl::Gl;
use crate::surface::{AcquireContext, Surface, Viewport};

pub const WEBGL2: &str = "webgl2";
pub const CANVAS_2D: &str = "2d";

/// Matches the surface's pixel buffer to the viewport it is shown in.
pub fn fit_to_viewport<S: Surface + ?Sized>(surface: &mut S) -> Viewport {
    let size = surface.viewport_size();
    surface.set_pixel_size(size);
    size
}

fn acquire<C, S: AcquireContext<C>>(surface: &mut S, kind: &'static str) -> RenderResult<C> {
    let Some(ctx) = surface.acquire_context() else {
        log::error!("{kind} rendering context is not available");
        return Err(RenderError::ContextUnavailable { kind });
    };
    let size = fit_to_viewport(surface);
    log::debug!("acquired {kind} context at {}x{}", size.width, size.height);
    Ok(ctx)
}

/// Acquires a GL context and clears the freshly sized surface to `background`.
pub fn acquire_gl<G, S>(surface: &mut S, background: Rgba) -> RenderResult<G>
where
    G: Gl,
    S: AcquireContext<G>,
{
    let gl = acquire(surface, WEBGL2)?;
    let size = surface.pixel_size();
    gl.viewport(0, 0, size.width as i32, size.height as i32);
    gl.clear_color(background.r, background.g, background.b, background.a);
    gl.clear_color_buffer();
    Ok(gl)
}

/// Acquires a 2D painter. The placeholder scene paints its own background.
pub fn acquire_2d<P, S: AcquireContext<P>>(surface: &mut S) -> RenderResult<P> {
    acquire(surface, CANVAS_2D)
}
