//! nimbus viewer: shows the raymarched animation in a window, or renders
//! frames to PNG files with `--headless`.

mod headless;
mod present;
mod runtime;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use nimbus_engine::logging::{LoggingConfig, init_logging};
use nimbus_engine::{
    DeviceInit, FrameSlot, KernelSource, PackingPolicy, RenderConfig, RenderWorker, Resolution,
};
use winit::dpi::PhysicalSize;

use crate::present::PresentInit;
use crate::runtime::{Runtime, WindowConfig};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    Auto,
    Vulkan,
    Metal,
    Dx12,
    Gl,
}

impl Backend {
    fn backends(self) -> wgpu::Backends {
        match self {
            Backend::Auto => wgpu::Backends::all(),
            Backend::Vulkan => wgpu::Backends::VULKAN,
            Backend::Metal => wgpu::Backends::METAL,
            Backend::Dx12 => wgpu::Backends::DX12,
            Backend::Gl => wgpu::Backends::GL,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Kernel source file (WGSL); the bundled raymarcher is used if omitted
    #[clap(short, long)]
    kernel: Option<PathBuf>,

    /// Compute entry point in the kernel
    #[clap(short, long, default_value = "raymarch")]
    entry: String,

    /// Image width in pixels
    #[clap(long, default_value_t = 700)]
    width: u32,

    /// Image height in pixels
    #[clap(long, default_value_t = 700)]
    height: u32,

    /// Interval between frames, in milliseconds
    #[clap(long, default_value_t = 20)]
    interval_ms: u64,

    /// Saturate out-of-range channel values instead of dropping the frame
    #[clap(long)]
    clamp: bool,

    /// Give up on a dispatch after this many milliseconds
    #[clap(long)]
    timeout_ms: Option<u64>,

    /// Graphics backend used for compute
    #[clap(long, value_enum, default_value_t = Backend::Auto)]
    backend: Backend,

    /// Render on the fallback (software) adapter only, never on a GPU
    #[clap(long)]
    force_fallback_adapter: bool,

    /// Render to PNG files instead of opening a window
    #[clap(long, requires = "out")]
    headless: bool,

    /// Number of frames to render in headless mode
    #[clap(long, default_value_t = 1)]
    frames: u32,

    /// Output directory for headless frames
    #[clap(long)]
    out: Option<PathBuf>,

    /// Start the animation this many milliseconds in
    #[clap(long, default_value_t = 0)]
    time_offset_ms: u64,
}

impl Args {
    fn render_config(&self) -> RenderConfig {
        RenderConfig {
            resolution: Resolution::new(self.width, self.height),
            entry_point: self.entry.clone(),
            frame_interval: Duration::from_millis(self.interval_ms),
            packing: if self.clamp {
                PackingPolicy::Clamp
            } else {
                PackingPolicy::Reject
            },
            dispatch_timeout: self.timeout_ms.map(Duration::from_millis),
            time_offset: Duration::from_millis(self.time_offset_ms),
            ..RenderConfig::default()
        }
    }

    fn device_init(&self) -> DeviceInit {
        DeviceInit {
            backends: self.backend.backends(),
            force_fallback_adapter: self.force_fallback_adapter,
            ..DeviceInit::default()
        }
    }

    fn kernel_source(&self) -> Result<KernelSource> {
        match &self.kernel {
            Some(path) => Ok(KernelSource::from_path(path)?),
            None => Ok(KernelSource::builtin()),
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let args = Args::parse();
    let config = args.render_config();
    let init = args.device_init();
    let source = args.kernel_source()?;

    log::info!(
        "kernel {:?}, entry point `{}`, {}",
        source.label(),
        config.entry_point,
        config.resolution
    );

    if args.headless {
        let out = args.out.as_deref().context("--headless requires --out")?;
        return headless::run(&init, &source, &config, args.frames, out);
    }

    let slot = FrameSlot::new();
    let worker = RenderWorker::spawn_gpu(init, source, config.clone(), slot.clone())
        .context("failed to start renderer")?;

    let window = WindowConfig {
        initial_size: PhysicalSize::new(config.resolution.width, config.resolution.height),
        ..WindowConfig::default()
    };
    Runtime::run(window, PresentInit::default(), slot, worker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_render_config() {
        let args = Args::parse_from(["nimbus-viewer"]);
        let config = args.render_config();
        let default = RenderConfig::default();
        assert_eq!(config.resolution, default.resolution);
        assert_eq!(config.entry_point, default.entry_point);
        assert_eq!(config.frame_interval, default.frame_interval);
        assert_eq!(config.packing, PackingPolicy::Reject);
        assert_eq!(config.dispatch_timeout, None);
        assert_eq!(args.device_init().backends, wgpu::Backends::all());
        assert!(!args.device_init().force_fallback_adapter);
    }

    #[test]
    fn fallback_adapter_is_opt_in() {
        let args = Args::parse_from(["nimbus-viewer", "--force-fallback-adapter"]);
        assert!(args.device_init().force_fallback_adapter);
    }

    #[test]
    fn flags_are_applied() {
        let args = Args::parse_from([
            "nimbus-viewer",
            "--width",
            "320",
            "--height",
            "200",
            "--clamp",
            "--timeout-ms",
            "250",
            "--time-offset-ms",
            "1500",
            "--backend",
            "vulkan",
        ]);
        let config = args.render_config();
        assert_eq!(config.resolution, Resolution::new(320, 200));
        assert_eq!(config.packing, PackingPolicy::Clamp);
        assert_eq!(config.dispatch_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.time_offset, Duration::from_millis(1500));
        assert_eq!(args.device_init().backends, wgpu::Backends::VULKAN);
    }

    #[test]
    fn headless_requires_output_directory() {
        assert!(Args::try_parse_from(["nimbus-viewer", "--headless"]).is_err());
        let args =
            Args::try_parse_from(["nimbus-viewer", "--headless", "--frames", "3", "--out", "o"])
                .unwrap();
        assert_eq!(args.frames, 3);
    }
}
