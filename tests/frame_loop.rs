use cloudscape_wasm::headless::{HeadlessGl, HeadlessSurface, ManualClock, ManualScheduler, PaintOp, RecordingPainter};
use cloudscape_wasm::gl::Topology;
use cloudscape_wasm::placeholder::PlaceholderScene;
use cloudscape_wasm::{FrameLoop, FrameOutcome, LoopState, RenderError, Renderer, Rgba, Viewport};

type TestLoop = FrameLoop<HeadlessSurface, HeadlessGl, ManualClock, ManualScheduler>;

struct Harness {
    surface: HeadlessSurface,
    clock: ManualClock,
    scheduler: ManualScheduler,
    frame_loop: TestLoop,
}

fn harness(size: Viewport) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let surface = HeadlessSurface::new(size);
    let clock = ManualClock::at(42.0);
    let scheduler = ManualScheduler::new();
    let renderer = Renderer::new(surface.clone(), Rgba::sky_blue()).expect("setup");
    let frame_loop = FrameLoop::new(renderer, clock.clone(), scheduler.clone());
    Harness {
        surface,
        clock,
        scheduler,
        frame_loop,
    }
}

impl Harness {
    /// Delivers every pending animation frame, advancing the clock by `dt`
    /// before each one, up to `limit` frames.
    fn pump(&mut self, dt: f64, limit: usize) -> usize {
        let mut delivered = 0;
        while delivered < limit && self.scheduler.take() {
            self.clock.advance(dt);
            self.frame_loop.tick().expect("frame");
            delivered += 1;
        }
        delivered
    }
}

#[test]
fn loop_starts_idle_and_schedules_first_frame() {
    let mut h = harness(Viewport::new(800, 600));
    assert_eq!(h.frame_loop.state(), LoopState::Idle);
    assert_eq!(h.frame_loop.tick().unwrap(), FrameOutcome::Skipped);
    assert_eq!(h.scheduler.requested(), 0);

    h.frame_loop.start().unwrap();
    assert_eq!(h.frame_loop.state(), LoopState::Running);
    assert_eq!(h.scheduler.pending(), 1);

    // A second start is a no-op.
    h.frame_loop.start().unwrap();
    assert_eq!(h.scheduler.pending(), 1);
}

#[test]
fn n_frames_issue_n_draws_with_non_decreasing_time() {
    let mut h = harness(Viewport::new(800, 600));
    h.frame_loop.start().unwrap();

    let delivered = h.pump(1.0 / 60.0, 120);
    assert_eq!(delivered, 120);
    assert_eq!(h.frame_loop.frames_drawn(), 120);

    let draws = h.frame_loop.renderer().gl().draw_calls();
    assert_eq!(draws.len(), 120);
    for draw in &draws {
        assert_eq!(draw.topology, Topology::Triangles);
        assert_eq!((draw.first, draw.count), (0, 6));
        assert_eq!(draw.resolution, Some([800.0, 600.0]));
    }
    let times: Vec<f32> = draws.iter().map(|d| d.time.expect("iTime written")).collect();
    assert!(times.windows(2).all(|w| w[1] >= w[0]), "{times:?}");
    assert!((times[0] - 1.0 / 60.0).abs() < 1e-4);
    assert!((times[119] - 2.0).abs() < 1e-3);
    // Every tick re-registers exactly one callback.
    assert_eq!(h.scheduler.pending(), 1);
}

#[test]
fn clock_stepping_backwards_never_lowers_itime() {
    let mut h = harness(Viewport::new(320, 200));
    h.frame_loop.start().unwrap();
    h.pump(0.5, 2);
    h.clock.advance(-10.0);
    h.pump(0.0, 1);

    let times: Vec<f32> = h
        .frame_loop
        .renderer()
        .gl()
        .draw_calls()
        .iter()
        .filter_map(|d| d.time)
        .collect();
    assert_eq!(times, vec![0.5, 1.0, 1.0]);
}

#[test]
fn resize_redraw_time_is_a_floor_for_later_frames() {
    let mut h = harness(Viewport::new(800, 600));
    h.frame_loop.start().unwrap();

    assert!(h.scheduler.take());
    h.clock.set(43.0);
    h.frame_loop.tick().unwrap();

    h.clock.set(44.0);
    h.surface.resize_window(Viewport::new(640, 480));
    h.frame_loop.resize().unwrap();

    assert!(h.scheduler.take());
    h.clock.set(43.5);
    h.frame_loop.tick().unwrap();

    let times: Vec<f32> = h
        .frame_loop
        .renderer()
        .gl()
        .draw_calls()
        .iter()
        .filter_map(|d| d.time)
        .collect();
    assert_eq!(times, vec![1.0, 2.0, 2.0]);
}

#[test]
fn resize_redraws_immediately_with_new_resolution() {
    let mut h = harness(Viewport::new(800, 600));
    h.frame_loop.start().unwrap();
    h.pump(0.016, 3);

    h.surface.resize_window(Viewport::new(1920, 1080));
    let outcome = h.frame_loop.resize().unwrap();
    let FrameOutcome::Drawn(frame) = outcome else {
        panic!("resize while running must redraw");
    };
    assert_eq!(frame.resolution, [1920.0, 1080.0]);
    assert_eq!(cloudscape_wasm::Surface::pixel_size(&h.surface), Viewport::new(1920, 1080));

    let gl = h.frame_loop.renderer().gl();
    let last = gl.draw_calls().last().cloned().unwrap();
    assert_eq!(last.resolution, Some([1920.0, 1080.0]));
    assert_eq!(last.viewport, [0, 0, 1920, 1080]);
    // The synchronous redraw does not queue an extra animation frame.
    assert_eq!(h.scheduler.pending(), 1);

    h.pump(0.016, 1);
    let next = h.frame_loop.renderer().gl().draw_calls().last().cloned().unwrap();
    assert_eq!(next.resolution, Some([1920.0, 1080.0]));
}

#[test]
fn resize_before_start_only_updates_the_surface() {
    let mut h = harness(Viewport::new(100, 100));
    h.surface.resize_window(Viewport::new(0, 0));
    assert_eq!(h.frame_loop.resize().unwrap(), FrameOutcome::Skipped);
    assert_eq!(h.frame_loop.renderer().viewport(), Viewport::new(0, 0));
    assert!(h.frame_loop.renderer().gl().draw_calls().is_empty());
}

#[test]
fn stop_releases_resources_and_silences_pending_frames() {
    let mut h = harness(Viewport::new(800, 600));
    h.frame_loop.start().unwrap();
    h.pump(0.016, 5);
    h.frame_loop.stop();
    assert_eq!(h.frame_loop.state(), LoopState::Stopped);

    // The host may still deliver the frame requested before the stop.
    assert!(h.scheduler.take());
    assert_eq!(h.frame_loop.tick().unwrap(), FrameOutcome::Skipped);
    assert_eq!(h.scheduler.pending(), 0);
    assert_eq!(h.frame_loop.renderer().gl().draw_calls().len(), 5);

    let gl = h.frame_loop.renderer().gl();
    assert_eq!(gl.current_program(), None);
    assert_eq!(gl.live_buffers(), 0);
    assert!(gl.program_ids().iter().all(|&p| gl.is_program_deleted(p)));

    assert!(matches!(h.frame_loop.start(), Err(RenderError::ResourcesReleased)));
    h.surface.resize_window(Viewport::new(10, 10));
    assert_eq!(h.frame_loop.resize().unwrap(), FrameOutcome::Skipped);
    h.frame_loop.stop();
}

#[test]
fn stopping_a_loop_that_never_started_releases_resources() {
    let mut h = harness(Viewport::new(320, 240));
    h.frame_loop.stop();

    assert_eq!(h.frame_loop.state(), LoopState::Stopped);
    assert_eq!(h.scheduler.requested(), 0);
    let gl = h.frame_loop.renderer().gl();
    assert_eq!(gl.current_program(), None);
    assert_eq!(gl.live_buffers(), 0);
    assert!(gl.program_ids().iter().all(|&p| gl.is_program_deleted(p)));
}

#[test]
fn released_program_cannot_be_rebound() {
    let surface = HeadlessSurface::new(Viewport::new(64, 64));
    let mut renderer: Renderer<HeadlessSurface, HeadlessGl> =
        Renderer::new(surface, Rgba::sky_blue()).unwrap();
    let program = renderer.program().map(|p| p.handle).unwrap();

    renderer.teardown();
    renderer.teardown();
    assert!(!renderer.is_live());
    assert!(matches!(renderer.bind_program(), Err(RenderError::ResourcesReleased)));
    assert!(matches!(renderer.draw_frame(1.0), Err(RenderError::ResourcesReleased)));

    // Even going around the controller, the context refuses the dead program.
    use cloudscape_wasm::gl::Gl;
    renderer.gl().use_program(Some(&program));
    assert_eq!(renderer.gl().current_program(), None);
    assert_eq!(renderer.gl().errors().len(), 1);
    assert!(renderer.gl().draw_calls().is_empty());
}

#[test]
fn placeholder_scene_redraws_on_every_resize() {
    let _ = env_logger::builder().is_test(true).try_init();
    let surface = HeadlessSurface::new(Viewport::new(400, 300));
    let mut scene: PlaceholderScene<HeadlessSurface, RecordingPainter> =
        PlaceholderScene::new(surface.clone()).expect("2d context");

    assert_eq!(
        scene.painter().ops(),
        vec![
            PaintOp::Rect { color: "skyblue".into(), x: 0.0, y: 0.0, width: 400.0, height: 300.0 },
            PaintOp::Circle { color: "white".into(), cx: 200.0, cy: 150.0, radius: 50.0 },
        ]
    );

    for size in [Viewport::new(1000, 500), Viewport::new(0, 0), Viewport::new(1001, 501)] {
        surface.resize_window(size);
        assert_eq!(scene.resize(), size);
        assert_eq!(cloudscape_wasm::Surface::pixel_size(&surface), size);
    }

    let ops = scene.painter().ops();
    assert_eq!(ops.len(), 8);
    assert_eq!(
        ops[7],
        PaintOp::Circle { color: "white".into(), cx: 500.5, cy: 250.5, radius: 50.0 }
    );
}

#[test]
fn placeholder_scene_without_context_fails_visibly() {
    let surface = HeadlessSurface::new(Viewport::new(400, 300)).without_context();
    let result: Result<PlaceholderScene<HeadlessSurface, RecordingPainter>, _> =
        PlaceholderScene::new(surface);
    let err = result.err().expect("no 2d context");
    assert_eq!(err.to_string(), "2d context unavailable");
}
