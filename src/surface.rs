/// Pixel dimensions of the drawing surface or of the window containing it.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Host window sizes arrive as CSS pixel doubles; negative or NaN
    /// values collapse to zero.
    pub fn from_f64(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0) as u32,
            height: height.max(0.0) as u32,
        }
    }

    /// Resolution as sent to the `iResolution` uniform.
    pub fn resolution(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }

    pub fn center(&self) -> (f64, f64) {
        (f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A drawing region exposed by the host.
pub trait Surface {
    /// Size of the viewport the surface is displayed in.
    fn viewport_size(&self) -> Viewport;
    /// Size of the backing pixel buffer.
    fn pixel_size(&self) -> Viewport;
    fn set_pixel_size(&mut self, size: Viewport);
}

/// A surface that can hand out a rendering context of type `C`.
pub trait AcquireContext<C>: Surface {
    /// `None` when the host cannot provide this kind of context.
    fn acquire_context(&self) -> Option<C>;
}
