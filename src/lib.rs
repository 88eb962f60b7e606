#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

//! Animated procedural clouds in a full-window canvas.
//!
//! The WebGL pipeline (context, program, quad, frame loop) is written against
//! the [`gl::Gl`] trait so it can run on the CPU stand-ins of the `headless`
//! feature natively; the browser bindings live in the wasm-only module below.

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod frame_loop;
pub mod geometry;
pub mod gl;
#[cfg(any(test, feature = "headless"))]
pub mod headless;
pub mod placeholder;
pub mod program;
pub mod render;
pub mod shaders;
pub mod surface;

pub use config::{RenderConfig, RenderMode, Rgba};
pub use error::{RenderError, RenderResult};
pub use frame_loop::{FrameLoop, FrameOutcome, FrameScheduler, LoopState};
pub use render::{Frame, Renderer};
pub use surface::{AcquireContext, Surface, Viewport};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use wasm_bindgen::prelude::*;

    mod canvas;
    mod gl;
    mod logging;
    mod render;

    /// Reads the config from the canvas and starts the selected pipeline.
    /// Setup failures are shown in the page and logged; they never panic.
    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let config = crate::RenderConfig::default();
        logging::init(config.log_level);

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id(&config.canvas_id)
            .ok_or("canvas not found")?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        let config = match config.with_overrides(
            canvas.get_attribute("data-renderer").as_deref(),
            canvas.get_attribute("data-log-level").as_deref(),
        ) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{err}");
                canvas::show_message(&document, &err.to_string());
                return Ok(());
            }
        };
        logging::set_level(config.log_level);

        if let Err(err) = render::start(canvas, &config) {
            log::error!("renderer did not start: {err}");
            canvas::show_message(&document, &err.to_string());
        }
        Ok(())
    }

    /// Stops the WebGL loop and releases its program and buffers.
    #[wasm_bindgen]
    pub fn shutdown() {
        render::shutdown();
    }
}

// When compiling for non-wasm targets (e.g., `cargo test` on host),
// provide an empty stub so the crate still builds.
#[cfg(not(target_arch = "wasm32"))]
pub fn main() {}
