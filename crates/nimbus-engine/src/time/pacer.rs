use std::time::Duration;

/// How the frame interval relates to the time spent rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PacingMode {
    /// Wait the full interval after each frame completes.
    ///
    /// The effective rate is `1 / (interval + render cost)`.
    #[default]
    Delay,

    /// Subtract the render cost from the interval, targeting a fixed rate.
    Rate,
}

/// Computes the wait before the next frame tick.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    interval: Duration,
    mode: PacingMode,
}

impl Pacer {
    pub fn new(interval: Duration, mode: PacingMode) -> Self {
        Self { interval, mode }
    }

    /// Remaining wait given that the last frame took `render_cost`.
    pub fn wait_after(&self, render_cost: Duration) -> Duration {
        match self.mode {
            PacingMode::Delay => self.interval,
            PacingMode::Rate => self.interval.saturating_sub(render_cost),
        }
    }
}
