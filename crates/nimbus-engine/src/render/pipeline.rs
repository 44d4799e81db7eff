use std::time::Instant;

use crate::assemble::{PackingPolicy, assemble};
use crate::channels::HostChannels;
use crate::config::{RenderConfig, Resolution};
use crate::device::DeviceInit;
use crate::dispatch::{FrameDevice, GpuFrameDevice, render_frame_with};
use crate::error::{FrameError, StartupError};
use crate::kernel::KernelSource;
use crate::params::derive_parameters;

use super::Frame;

/// Synchronous frame producer: parameters, dispatch, readback, assembly.
///
/// Host channel arrays are allocated once and reused across frames.
pub struct Renderer<D = GpuFrameDevice> {
    device: D,
    host: HostChannels,
    packing: PackingPolicy,
    next_index: u64,
}

impl Renderer<GpuFrameDevice> {
    /// Builds a renderer on the first matching GPU.
    pub fn gpu(
        init: &DeviceInit,
        source: &KernelSource,
        config: &RenderConfig,
    ) -> Result<Self, StartupError> {
        let device = GpuFrameDevice::build(init, source, config)?;
        Ok(Self::new(device, config.packing))
    }
}

impl<D: FrameDevice> Renderer<D> {
    pub fn new(device: D, packing: PackingPolicy) -> Self {
        let host = HostChannels::new(device.resolution());
        Self {
            device,
            host,
            packing,
            next_index: 0,
        }
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.device.resolution()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Renders the frame for `time_nanos`.
    ///
    /// A failed frame still consumes an index, so gaps in [`Frame::index`]
    /// mark dropped frames.
    pub fn render_next(&mut self, time_nanos: u64) -> Result<Frame, FrameError> {
        let index = self.next_index;
        self.next_index += 1;

        let started = Instant::now();
        let params = derive_parameters(time_nanos);
        render_frame_with(&mut self.device, &params, &mut self.host)?;
        let image = assemble(&self.host, self.device.resolution(), self.packing)?;
        let render_cost = started.elapsed();

        log::trace!("frame {index} at {time_nanos} ns took {render_cost:?}");

        Ok(Frame {
            index,
            time_nanos,
            render_cost,
            image,
        })
    }
}
