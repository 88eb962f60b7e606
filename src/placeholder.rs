//! 2D canvas fallback: a sky-coloured background with one white circle.

use crate::context::{acquire_2d, fit_to_viewport};
use crate::error::RenderResult;
use crate::surface::{AcquireContext, Viewport};

pub const BACKGROUND: &str = "skyblue";
pub const CIRCLE_FILL: &str = "white";
pub const CIRCLE_RADIUS: f64 = 50.0;

/// Minimal fill operations of a 2D drawing context.
pub trait Painter {
    fn fill_rect(&self, color: &str, x: f64, y: f64, width: f64, height: f64);
    fn fill_circle(&self, color: &str, cx: f64, cy: f64, radius: f64);
}

pub struct PlaceholderScene<S, P> {
    surface: S,
    painter: P,
    viewport: Viewport,
}

impl<S, P> PlaceholderScene<S, P>
where
    S: AcquireContext<P>,
    P: Painter,
{
    /// Acquires the 2D context and draws the first frame.
    pub fn new(mut surface: S) -> RenderResult<Self> {
        let painter = acquire_2d(&mut surface)?;
        let viewport = surface.pixel_size();
        let scene = Self { surface, painter, viewport };
        scene.draw();
        Ok(scene)
    }

    /// Matches the surface to the new viewport and redraws synchronously.
    pub fn resize(&mut self) -> Viewport {
        self.viewport = fit_to_viewport(&mut self.surface);
        self.draw();
        self.viewport
    }

    pub fn draw(&self) {
        let (cx, cy) = self.viewport.center();
        self.painter.fill_rect(
            BACKGROUND,
            0.0,
            0.0,
            f64::from(self.viewport.width),
            f64::from(self.viewport.height),
        );
        self.painter.fill_circle(CIRCLE_FILL, cx, cy, CIRCLE_RADIUS);
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn painter(&self) -> &P {
        &self.painter
    }
}
