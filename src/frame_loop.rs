//! Drives the renderer once per host frame.
//!
//! The host's animation callback and its time source are both injected, so
//! the loop runs the same way under `request_animation_frame` and under a
//! test that pumps frames by hand.

use crate::clock::{Clock, FrameClock};
use crate::error::{RenderError, RenderResult};
use crate::gl::Gl;
use crate::render::{Frame, Renderer};
use crate::surface::AcquireContext;

/// Asks the host to call back once before the next repaint.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> RenderResult<()>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FrameOutcome {
    Drawn(Frame),
    /// The loop is not running; nothing was submitted.
    Skipped,
}

pub struct FrameLoop<S, G: Gl, C, K> {
    renderer: Renderer<S, G>,
    clock: FrameClock<C>,
    scheduler: K,
    state: LoopState,
    frames_drawn: u64,
}

impl<S, G, C, K> FrameLoop<S, G, C, K>
where
    S: AcquireContext<G>,
    G: Gl,
    C: Clock,
    K: FrameScheduler,
{
    pub fn new(renderer: Renderer<S, G>, clock: C, scheduler: K) -> Self {
        Self {
            renderer,
            clock: FrameClock::new(clock),
            scheduler,
            state: LoopState::Idle,
            frames_drawn: 0,
        }
    }

    /// Resets the time epoch and schedules the first frame. Starting a loop
    /// that is already running does nothing; a stopped loop cannot restart.
    pub fn start(&mut self) -> RenderResult<()> {
        match self.state {
            LoopState::Running => Ok(()),
            LoopState::Stopped => Err(RenderError::ResourcesReleased),
            LoopState::Idle => {
                self.clock.start();
                self.scheduler.request_frame()?;
                self.state = LoopState::Running;
                log::info!("frame loop started");
                Ok(())
            }
        }
    }

    /// One iteration: draw with the current elapsed time, then ask for the
    /// next frame.
    pub fn tick(&mut self) -> RenderResult<FrameOutcome> {
        if self.state != LoopState::Running {
            return Ok(FrameOutcome::Skipped);
        }
        let time = self.clock.tick();
        let frame = self.renderer.draw_frame(time.elapsed)?;
        self.frames_drawn += 1;
        log::trace!("frame {} at {:.3}s", time.frame_index, time.elapsed);
        self.scheduler.request_frame()?;
        Ok(FrameOutcome::Drawn(frame))
    }

    /// Applies a viewport change and, while running, redraws immediately
    /// instead of waiting for the next scheduled frame.
    pub fn resize(&mut self) -> RenderResult<FrameOutcome> {
        if self.state == LoopState::Stopped {
            return Ok(FrameOutcome::Skipped);
        }
        self.renderer.resize();
        if self.state != LoopState::Running {
            return Ok(FrameOutcome::Skipped);
        }
        let frame = self.renderer.draw_frame(self.clock.sample())?;
        self.frames_drawn += 1;
        Ok(FrameOutcome::Drawn(frame))
    }

    /// Stops the loop and releases the GL resources. Any frame the host
    /// still delivers afterwards is skipped.
    pub fn stop(&mut self) {
        if self.state == LoopState::Stopped {
            return;
        }
        self.state = LoopState::Stopped;
        self.renderer.teardown();
        log::info!("frame loop stopped after {} frames", self.frames_drawn);
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn renderer(&self) -> &Renderer<S, G> {
        &self.renderer
    }

    pub fn scheduler(&self) -> &K {
        &self.scheduler
    }
}
