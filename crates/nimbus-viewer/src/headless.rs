use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use nimbus_engine::{DeviceInit, KernelSource, RenderConfig, Renderer};

/// Renders `frames` frames at synthetic times and writes each as a PNG.
///
/// Frame `i` is rendered at `time_offset + i * frame_interval`, so a run is
/// reproducible. Frames that fail are logged and skipped.
pub fn run(
    init: &DeviceInit,
    source: &KernelSource,
    config: &RenderConfig,
    frames: u32,
    out_dir: &Path,
) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {out_dir:?}"))?;

    let mut renderer = Renderer::gpu(init, source, config)?;
    let mut written = 0u32;

    for i in 0..frames {
        let t = synthetic_time(config.time_offset, config.frame_interval, i);
        match renderer.render_next(t) {
            Ok(frame) => {
                let path = frame_path(out_dir, i);
                frame
                    .image
                    .save_with_format(&path, image::ImageFormat::Png)
                    .with_context(|| format!("failed to write {path:?}"))?;
                log::info!("wrote {path:?} ({:?})", frame.render_cost);
                written += 1;
            }
            Err(err) => log::warn!("frame {i} skipped: {err}"),
        }
    }

    log::info!("headless run finished: {written}/{frames} frames written");
    Ok(())
}

fn synthetic_time(offset: Duration, interval: Duration, index: u32) -> u64 {
    let t = offset + interval * index;
    u64::try_from(t.as_nanos()).unwrap_or(u64::MAX)
}

fn frame_path(dir: &Path, index: u32) -> PathBuf {
    dir.join(format!("frame_{index:05}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_times_are_evenly_spaced() {
        let interval = Duration::from_millis(20);
        assert_eq!(synthetic_time(Duration::ZERO, interval, 0), 0);
        assert_eq!(synthetic_time(Duration::ZERO, interval, 3), 60_000_000);
        assert_eq!(
            synthetic_time(Duration::from_secs(1), interval, 1),
            1_020_000_000
        );
    }

    #[test]
    fn frame_paths_sort_in_order() {
        let dir = Path::new("out");
        assert_eq!(frame_path(dir, 7), Path::new("out/frame_00007.png"));
        assert!(frame_path(dir, 9) < frame_path(dir, 10));
    }
}
