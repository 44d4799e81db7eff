use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time since the clock origin, in nanoseconds. Drives frame parameters.
    pub elapsed_nanos: u64,

    /// Time elapsed since the previous tick, in seconds.
    pub dt: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Monotonic frame clock.
///
/// The origin is the instant the clock was created, shifted back by an
/// optional offset so a loop can start at any point of the animation.
///
/// Delta time is clamped to avoid pathological values when the loop is paused
/// by the debugger or stalls.
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Instant,
    offset: Duration,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a new clock with default clamps.
    pub fn new(offset: Duration) -> Self {
        Self::with_clamps(offset, Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(offset: Duration, dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            origin: now,
            offset,
            last: now,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let elapsed = now.saturating_duration_since(self.origin) + self.offset;
        let ft = FrameTime {
            elapsed_nanos: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            dt: dt.as_secs_f32(),
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }

    /// The instant elapsed time is measured from, before the offset.
    pub fn origin(&self) -> Instant {
        self.origin
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_shifts_elapsed_time() {
        let mut clock = FrameClock::new(Duration::from_secs(3));
        let t = clock.tick_at(clock.origin() + Duration::from_millis(5));
        assert_eq!(t.elapsed_nanos, 3_005_000_000);
        assert_eq!(t.frame_index, 0);
    }

    #[test]
    fn frame_index_increments() {
        let mut clock = FrameClock::default();
        let origin = clock.origin();
        let a = clock.tick_at(origin + Duration::from_millis(20));
        let b = clock.tick_at(origin + Duration::from_millis(40));
        assert_eq!((a.frame_index, b.frame_index), (0, 1));
        assert!(b.elapsed_nanos > a.elapsed_nanos);
    }

    #[test]
    fn dt_is_clamped() {
        let mut clock = FrameClock::default();
        let origin = clock.origin();
        let stalled = clock.tick_at(origin + Duration::from_secs(10));
        assert!((stalled.dt - 0.25).abs() < 1e-6);
        let tight = clock.tick_at(origin + Duration::from_secs(10));
        assert!((tight.dt - 0.0001).abs() < 1e-6);
    }
}
