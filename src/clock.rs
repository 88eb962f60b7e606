/// A monotonic time source, in seconds since an arbitrary epoch.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Seconds since the clock was started; never decreases.
    pub elapsed: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Turns raw clock readings into per-frame elapsed time.
///
/// Only deltas matter for the animation, so the epoch is whatever the source
/// reports at `start`. Readings that go backwards are held at the last value
/// so `iTime` never decreases between frames.
#[derive(Debug, Clone)]
pub struct FrameClock<C> {
    source: C,
    epoch: f64,
    last: f32,
    frame_index: u64,
}

impl<C: Clock> FrameClock<C> {
    pub fn new(source: C) -> Self {
        let epoch = source.now();
        Self {
            source,
            epoch,
            last: 0.0,
            frame_index: 0,
        }
    }

    /// Resets the epoch to the current reading.
    pub fn start(&mut self) {
        self.epoch = self.source.now();
        self.last = 0.0;
        self.frame_index = 0;
    }

    /// Elapsed time right now, without advancing the frame counter.
    pub fn peek(&self) -> f32 {
        let elapsed = (self.source.now() - self.epoch) as f32;
        elapsed.max(self.last)
    }

    /// Reads the elapsed time for an out-of-band draw. The reading counts
    /// towards the floor later ticks are held at, but the frame counter does
    /// not move.
    pub fn sample(&mut self) -> f32 {
        self.last = self.peek();
        self.last
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let elapsed = self.sample();

        let ft = FrameTime {
            elapsed,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::ManualClock;

    #[test]
    fn elapsed_is_relative_to_start() {
        let source = ManualClock::at(100.0);
        let mut clock = FrameClock::new(source.clone());
        source.advance(0.5);
        clock.start();
        source.advance(0.25);

        let ft = clock.tick();
        assert_eq!(ft.frame_index, 0);
        assert!((ft.elapsed - 0.25).abs() < 1e-6);
        assert_eq!(clock.tick().frame_index, 1);
    }

    #[test]
    fn backwards_source_is_clamped() {
        let source = ManualClock::at(10.0);
        let mut clock = FrameClock::new(source.clone());
        source.set(12.0);
        let first = clock.tick().elapsed;
        source.set(11.0);
        let second = clock.tick().elapsed;
        assert_eq!(first, 2.0);
        assert_eq!(second, first);
    }

    #[test]
    fn sample_raises_the_floor_without_counting_a_frame() {
        let source = ManualClock::at(0.0);
        let mut clock = FrameClock::new(source.clone());
        source.set(1.0);
        assert_eq!(clock.tick().frame_index, 0);
        source.set(2.0);
        assert_eq!(clock.sample(), 2.0);
        source.set(1.5);

        let ft = clock.tick();
        assert_eq!(ft.frame_index, 1);
        assert_eq!(ft.elapsed, 2.0);
    }
}
