use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    window, CanvasRenderingContext2d, HtmlCanvasElement, Performance, WebGl2RenderingContext as GL,
    Window,
};

use super::canvas::CanvasSurface;
use crate::clock::Clock;
use crate::error::{RenderError, RenderResult};
use crate::frame_loop::{FrameLoop, FrameScheduler};
use crate::placeholder::PlaceholderScene;
use crate::render::Renderer;
use crate::{RenderConfig, RenderMode};

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;
type CloudLoop = FrameLoop<CanvasSurface, GL, PerformanceClock, AnimationFrameScheduler>;

thread_local! {
    static ACTIVE: RefCell<Option<Rc<RefCell<CloudLoop>>>> = const { RefCell::new(None) };
}

fn host_error(context: &str, value: JsValue) -> RenderError {
    RenderError::host(format!("{context}: {value:?}"))
}

/// `performance.now()` in seconds.
pub struct PerformanceClock {
    performance: Performance,
}

impl Clock for PerformanceClock {
    fn now(&self) -> f64 {
        self.performance.now() / 1000.0
    }
}

/// Re-registers the frame closure with `request_animation_frame`.
pub struct AnimationFrameScheduler {
    window: Window,
    callback: FrameCallback,
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&mut self) -> RenderResult<()> {
        let slot = self.callback.borrow();
        let closure = slot
            .as_ref()
            .ok_or_else(|| RenderError::host("frame callback not installed"))?;
        self.window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .map_err(|e| host_error("requestAnimationFrame", e))?;
        Ok(())
    }
}

/// Starts the configured pipeline on `canvas`.
pub fn start(canvas: HtmlCanvasElement, config: &RenderConfig) -> RenderResult<()> {
    let window = window().ok_or_else(|| RenderError::host("no window"))?;
    log::info!("starting {} renderer", config.mode);
    match config.mode {
        RenderMode::WebGl => start_webgl(window, canvas, config),
        RenderMode::Canvas2d => start_canvas2d(window, canvas),
    }
}

fn on_resize(window: &Window, mut handler: impl FnMut() + 'static) -> RenderResult<()> {
    let resize_closure = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);
    window
        .add_event_listener_with_callback("resize", resize_closure.as_ref().unchecked_ref())
        .map_err(|e| host_error("addEventListener(resize)", e))?;
    resize_closure.forget();
    Ok(())
}

fn start_webgl(window: Window, canvas: HtmlCanvasElement, config: &RenderConfig) -> RenderResult<()> {
    let performance = window
        .performance()
        .ok_or_else(|| RenderError::host("no performance timer"))?;
    let surface = CanvasSurface::new(window.clone(), canvas);
    let renderer: Renderer<CanvasSurface, GL> = Renderer::new(surface, config.background)?;

    // `callback` holds the animation-frame closure so the scheduler can keep
    // re-registering it. Storing it inside an `Option` allows us to create the
    // `Closure` after the loop that it drives.
    let callback: FrameCallback = Rc::new(RefCell::new(None));
    let scheduler = AnimationFrameScheduler {
        window: window.clone(),
        callback: callback.clone(),
    };
    let frame_loop = Rc::new(RefCell::new(FrameLoop::new(
        renderer,
        PerformanceClock { performance },
        scheduler,
    )));

    let ticking = frame_loop.clone();
    *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        if let Err(err) = ticking.borrow_mut().tick() {
            log::error!("frame failed: {err}");
        }
    }) as Box<dyn FnMut()>));

    let resizing = frame_loop.clone();
    let started = on_resize(&window, move || match resizing.try_borrow_mut() {
        Ok(mut frame_loop) => {
            if let Err(err) = frame_loop.resize() {
                log::error!("resize redraw failed: {err}");
            }
        }
        Err(_) => log::warn!("resize delivered during a frame; skipped"),
    })
    .and_then(|()| frame_loop.borrow_mut().start());

    if let Err(err) = started {
        // Release GL resources and break the loop <-> closure cycle.
        frame_loop.borrow_mut().stop();
        callback.borrow_mut().take();
        return Err(err);
    }
    ACTIVE.with(|active| *active.borrow_mut() = Some(frame_loop));
    Ok(())
}

fn start_canvas2d(window: Window, canvas: HtmlCanvasElement) -> RenderResult<()> {
    let surface = CanvasSurface::new(window.clone(), canvas);
    let scene: PlaceholderScene<CanvasSurface, CanvasRenderingContext2d> =
        PlaceholderScene::new(surface)?;
    let scene = Rc::new(RefCell::new(scene));
    on_resize(&window, move || {
        scene.borrow_mut().resize();
    })
}

/// Stops the active WebGL loop, if there is one.
pub fn shutdown() {
    let Some(frame_loop) = ACTIVE.with(|active| active.borrow_mut().take()) else {
        log::debug!("shutdown requested with no active renderer");
        return;
    };
    frame_loop.borrow_mut().stop();
}
