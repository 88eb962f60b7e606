use std::f64::consts::PI;

use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, WebGl2RenderingContext as GL, Window,
};

use crate::context::{CANVAS_2D, WEBGL2};
use crate::placeholder::Painter;
use crate::surface::{AcquireContext, Surface, Viewport};

/// The page canvas, sized against the browser window.
pub struct CanvasSurface {
    window: Window,
    canvas: HtmlCanvasElement,
}

impl CanvasSurface {
    pub fn new(window: Window, canvas: HtmlCanvasElement) -> Self {
        Self { window, canvas }
    }

    fn context<C: JsCast>(&self, kind: &str) -> Option<C> {
        self.canvas
            .get_context(kind)
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<C>().ok())
    }
}

impl Surface for CanvasSurface {
    fn viewport_size(&self) -> Viewport {
        let dim = |v: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
            v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
        };
        Viewport::from_f64(dim(self.window.inner_width()), dim(self.window.inner_height()))
    }

    fn pixel_size(&self) -> Viewport {
        Viewport::new(self.canvas.width(), self.canvas.height())
    }

    fn set_pixel_size(&mut self, size: Viewport) {
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
    }
}

impl AcquireContext<GL> for CanvasSurface {
    fn acquire_context(&self) -> Option<GL> {
        self.context(WEBGL2)
    }
}

impl AcquireContext<CanvasRenderingContext2d> for CanvasSurface {
    fn acquire_context(&self) -> Option<CanvasRenderingContext2d> {
        self.context(CANVAS_2D)
    }
}

impl Painter for CanvasRenderingContext2d {
    fn fill_rect(&self, color: &str, x: f64, y: f64, width: f64, height: f64) {
        self.set_fill_style_str(color);
        CanvasRenderingContext2d::fill_rect(self, x, y, width, height);
    }

    fn fill_circle(&self, color: &str, cx: f64, cy: f64, radius: f64) {
        self.set_fill_style_str(color);
        self.begin_path();
        if self.arc(cx, cy, radius, 0.0, PI * 2.0).is_err() {
            log::warn!("arc rejected (radius {radius})");
            return;
        }
        self.fill();
    }
}

/// Puts a visible notice into the page when the scene cannot start.
pub fn show_message(document: &Document, message: &str) {
    let notice = match document.create_element("p") {
        Ok(notice) => notice,
        Err(err) => {
            log::warn!("could not create error notice: {err:?}");
            return;
        }
    };
    notice.set_text_content(Some(message));
    if let Err(err) = notice.set_attribute(
        "style",
        "position:fixed;top:1em;left:1em;margin:0;padding:.5em 1em;\
         font:14px sans-serif;color:#fff;background:rgba(160,0,0,.85)",
    ) {
        log::warn!("could not style error notice: {err:?}");
    }
    let Some(body) = document.body() else {
        log::warn!("no <body> to show the error notice in");
        return;
    };
    if let Err(err) = body.append_child(&notice) {
        log::warn!("could not show error notice: {err:?}");
    }
}
