use std::time::{Duration, Instant};

/// Throughput counters kept by the render loop.
#[derive(Debug, Clone)]
pub struct RenderStats {
    /// Frames published since the loop started.
    pub rendered: u64,

    /// Frames dropped because of a per-frame error.
    pub skipped: u64,

    total_cost: Duration,
    window_start: Instant,
    window_rendered: u64,
    window_cost: Duration,
}

impl RenderStats {
    pub fn new(now: Instant) -> Self {
        Self {
            rendered: 0,
            skipped: 0,
            total_cost: Duration::ZERO,
            window_start: now,
            window_rendered: 0,
            window_cost: Duration::ZERO,
        }
    }

    pub fn record_rendered(&mut self, cost: Duration) {
        self.rendered += 1;
        self.total_cost += cost;
        self.window_rendered += 1;
        self.window_cost += cost;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Mean render cost over every published frame.
    pub fn mean_cost(&self) -> Duration {
        mean(self.total_cost, self.rendered)
    }

    /// Logs and resets the reporting window once `interval` has passed.
    pub fn maybe_log(&mut self, now: Instant, interval: Duration) {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < interval {
            return;
        }

        let fps = self.window_rendered as f64 / elapsed.as_secs_f64();
        log::info!(
            "rendered {} frames ({} skipped), {fps:.1} fps, mean cost {:?}",
            self.rendered,
            self.skipped,
            mean(self.window_cost, self.window_rendered),
        );

        self.window_start = now;
        self.window_rendered = 0;
        self.window_cost = Duration::ZERO;
    }
}

fn mean(total: Duration, count: u64) -> Duration {
    match u32::try_from(count) {
        Ok(0) => Duration::ZERO,
        Ok(n) => total / n,
        Err(_) => Duration::from_secs_f64(total.as_secs_f64() / count as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_mean() {
        let start = Instant::now();
        let mut stats = RenderStats::new(start);
        assert_eq!(stats.mean_cost(), Duration::ZERO);

        stats.record_rendered(Duration::from_millis(10));
        stats.record_rendered(Duration::from_millis(30));
        stats.record_skipped();

        assert_eq!(stats.rendered, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.mean_cost(), Duration::from_millis(20));
    }

    #[test]
    fn window_resets_after_interval() {
        let start = Instant::now();
        let mut stats = RenderStats::new(start);
        stats.record_rendered(Duration::from_millis(10));

        stats.maybe_log(start + Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(stats.window_rendered, 1);

        stats.maybe_log(start + Duration::from_secs(6), Duration::from_secs(5));
        assert_eq!(stats.window_rendered, 0);
        assert_eq!(stats.rendered, 1);
    }
}
