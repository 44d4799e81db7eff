//! Host-side pipeline for a GPU raymarching kernel.
//!
//! A [`DeviceSession`] owns the compute device, a [`Kernel`] is compiled
//! against it, [`ChannelBuffers`] hold the per-pixel output, and each frame
//! goes through parameter derivation, dispatch, readback and assembly.
//! [`Renderer`] runs that sequence synchronously; [`RenderWorker`] runs it
//! on a background thread and hands frames to a display through a
//! [`FrameSlot`].

pub mod assemble;
pub mod channels;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod kernel;
pub mod logging;
pub mod params;
pub mod render;
pub mod time;

pub use assemble::{PackingPolicy, assemble, pack_rgb};
pub use channels::{Channel, ChannelBuffers, HostChannels};
pub use config::{RenderConfig, Resolution};
pub use device::{DeviceInit, DeviceSession};
pub use dispatch::{FrameDevice, GpuFrameDevice, render_frame, render_frame_with};
pub use error::{FrameError, StartupError};
pub use kernel::{Kernel, KernelSource};
pub use params::{FrameParameters, derive_parameters};
pub use render::{Frame, FrameSlot, RenderStats, RenderWorker, Renderer};
pub use time::{FrameClock, FrameTime, Pacer, PacingMode};
