use std::time::Duration;

use crate::assemble::PackingPolicy;
use crate::time::PacingMode;

/// Output resolution shared by the host buffers and the kernel.
///
/// Pixels are stored row-major: `index = row * width + col`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square resolution, as used by the default 700x700 display.
    #[inline]
    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    /// Number of pixels, which is also the global work size and the length
    /// of every channel buffer.
    #[inline]
    pub const fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Maps `(row, col)` to its host array index.
    #[inline]
    pub const fn index(self, row: u32, col: u32) -> usize {
        row as usize * self.width as usize + col as usize
    }

    /// Maps a host array index back to `(row, col)`.
    #[inline]
    pub const fn position(self, index: usize) -> (u32, u32) {
        let w = self.width as usize;
        ((index / w) as u32, (index % w) as u32)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::square(700)
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Render loop configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Output resolution, validated against the kernel at startup.
    pub resolution: Resolution,

    /// Name of the compute entry point to resolve in the kernel source.
    pub entry_point: String,

    /// Target interval between frames.
    pub frame_interval: Duration,

    /// How the interval is applied relative to frame production time.
    pub pacing: PacingMode,

    /// What to do with channel values outside `[0, 255]`.
    pub packing: PackingPolicy,

    /// Upper bound on how long a single dispatch may block.
    ///
    /// `None` waits indefinitely.
    pub dispatch_timeout: Option<Duration>,

    /// How often the render worker logs throughput statistics.
    pub stats_interval: Duration,

    /// Offset added to the clock before deriving frame parameters.
    pub time_offset: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            entry_point: "raymarch".to_string(),
            frame_interval: Duration::from_millis(20),
            pacing: PacingMode::Delay,
            packing: PackingPolicy::Reject,
            dispatch_timeout: None,
            stats_interval: Duration::from_secs(5),
            time_offset: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_position_bijection() {
        for res in [Resolution::new(4, 4), Resolution::new(7, 3), Resolution::new(1, 9)] {
            let n = res.pixel_count();
            let mut seen = vec![false; n];
            for row in 0..res.height {
                for col in 0..res.width {
                    let i = res.index(row, col);
                    assert!(i < n);
                    assert!(!seen[i], "index {i} hit twice");
                    seen[i] = true;
                    assert_eq!(res.position(i), (row, col));
                }
            }
            assert!(seen.iter().all(|s| *s));
        }
    }

    #[test]
    fn index_round_trip_for_every_index() {
        let res = Resolution::new(13, 5);
        for i in 0..res.pixel_count() {
            let (row, col) = res.position(i);
            assert!(row < res.height && col < res.width);
            assert_eq!(res.index(row, col), i);
        }
    }

    #[test]
    fn default_is_700_square() {
        let res = Resolution::default();
        assert_eq!(res.pixel_count(), 490_000);
        assert_eq!(res.to_string(), "700x700");
    }

    #[test]
    fn zero_dimension_is_empty() {
        assert!(Resolution::new(0, 10).is_empty());
        assert!(Resolution::new(10, 0).is_empty());
        assert!(!Resolution::new(1, 1).is_empty());
    }
}
