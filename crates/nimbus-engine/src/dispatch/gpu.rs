use std::time::Duration;

use crate::channels::{Channel, ChannelBuffers, HostChannels};
use crate::config::{RenderConfig, Resolution};
use crate::device::{DeviceInit, DeviceSession};
use crate::error::{DispatchError, FrameError, ReadbackError, StartupError};
use crate::kernel::{Kernel, KernelSource, abi};
use crate::params::FrameParameters;

use super::{FrameDevice, render_frame_with};

/// Runs one frame against explicit device objects, waiting as long as needed.
pub fn render_frame(
    session: &DeviceSession,
    kernel: &Kernel,
    buffers: &ChannelBuffers,
    params: &FrameParameters,
    host: &mut HostChannels,
) -> Result<(), FrameError> {
    let mut device = Borrowed {
        session,
        kernel,
        buffers,
        timeout: None,
    };
    render_frame_with(&mut device, params, host)
}

/// Owns everything needed to render frames on a real device.
pub struct GpuFrameDevice {
    session: DeviceSession,
    kernel: Kernel,
    buffers: ChannelBuffers,
    timeout: Option<Duration>,
}

impl GpuFrameDevice {
    /// Acquires a device, compiles `source` and allocates the channel buffers.
    pub fn build(
        init: &DeviceInit,
        source: &KernelSource,
        config: &RenderConfig,
    ) -> Result<Self, StartupError> {
        let session = DeviceSession::initialize(init)?;
        let kernel = Kernel::compile(&session, source, &config.entry_point, config.resolution)?;
        let buffers = ChannelBuffers::allocate(&session, config.resolution.pixel_count())?;

        log::info!(
            "render device ready: {} entry point `{}`",
            config.resolution,
            kernel.entry_point()
        );

        Ok(Self {
            session,
            kernel,
            buffers,
            timeout: config.dispatch_timeout,
        })
    }
}

impl FrameDevice for GpuFrameDevice {
    fn resolution(&self) -> Resolution {
        self.kernel.resolution()
    }

    fn dispatch(&mut self, params: &FrameParameters) -> Result<(), DispatchError> {
        dispatch(&self.session, &self.kernel, &self.buffers, params, self.timeout)
    }

    fn read_back(&mut self, host: &mut HostChannels) -> Result<(), ReadbackError> {
        read_back(&self.session, &self.buffers, host, self.timeout)
    }
}

/// [`FrameDevice`] view over borrowed device objects.
struct Borrowed<'a> {
    session: &'a DeviceSession,
    kernel: &'a Kernel,
    buffers: &'a ChannelBuffers,
    timeout: Option<Duration>,
}

impl FrameDevice for Borrowed<'_> {
    fn resolution(&self) -> Resolution {
        self.kernel.resolution()
    }

    fn dispatch(&mut self, params: &FrameParameters) -> Result<(), DispatchError> {
        dispatch(self.session, self.kernel, self.buffers, params, self.timeout)
    }

    fn read_back(&mut self, host: &mut HostChannels) -> Result<(), ReadbackError> {
        read_back(self.session, self.buffers, host, self.timeout)
    }
}

fn dispatch(
    session: &DeviceSession,
    kernel: &Kernel,
    buffers: &ChannelBuffers,
    params: &FrameParameters,
    timeout: Option<Duration>,
) -> Result<(), DispatchError> {
    params.validate()?;

    let work_items = kernel.resolution().pixel_count();
    if buffers.element_count() < work_items {
        return Err(DispatchError::InvalidArgument {
            slot: abi::Slot::OutR.index(),
            reason: format!(
                "channel buffers hold {} elements, kernel writes {work_items}",
                buffers.element_count()
            ),
        });
    }

    let device = session.device();
    let queue = session.queue();
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

    kernel.write_arguments(queue, params);
    let bind_group = kernel.bind(session, buffers);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("nimbus dispatch encoder"),
    });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("nimbus dispatch pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(kernel.pipeline());
        pass.set_bind_group(abi::BIND_GROUP, &bind_group, &[]);
        pass.dispatch_workgroups(abi::workgroup_count(work_items), 1, 1);
    }
    let submission = queue.submit(Some(encoder.finish()));

    if let Some(err) = pollster::block_on(scope.pop()) {
        return Err(DispatchError::DeviceFault(err.to_string()));
    }

    match device.poll(wgpu::PollType::Wait {
        submission_index: Some(submission),
        timeout,
    }) {
        Ok(_) => Ok(()),
        Err(wgpu::PollError::Timeout) => Err(DispatchError::Timeout(timeout.unwrap_or_default())),
        Err(e) => Err(DispatchError::DeviceFault(e.to_string())),
    }
}

fn read_back(
    session: &DeviceSession,
    buffers: &ChannelBuffers,
    host: &mut HostChannels,
    timeout: Option<Duration>,
) -> Result<(), ReadbackError> {
    let device = session.device();
    let staging = buffers.staging();

    // Rejected copies or maps (e.g. a staging buffer still mapped) land here
    // instead of the uncaptured error handler.
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("nimbus readback encoder"),
    });
    for (src, dst) in buffers.storage().into_iter().zip(staging) {
        encoder.copy_buffer_to_buffer(src, 0, dst, 0, buffers.byte_len());
    }
    let submission = session.queue().submit(Some(encoder.finish()));

    let (tx, rx) = crossbeam_channel::bounded(Channel::ALL.len());
    for (channel, buffer) in Channel::ALL.into_iter().zip(staging) {
        let tx = tx.clone();
        buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send((channel, result));
        });
    }
    drop(tx);

    let rejected = pollster::block_on(scope.pop());

    let poll = device.poll(wgpu::PollType::Wait {
        submission_index: Some(submission),
        timeout,
    });

    let mut outcomes: [Option<Result<(), String>>; 3] = [None, None, None];
    for (channel, result) in rx.try_iter() {
        outcomes[channel.index()] = Some(result.map_err(|e| e.to_string()));
    }

    let failure = Channel::ALL.into_iter().find_map(|channel| {
        let reason = match &outcomes[channel.index()] {
            Some(Ok(())) => return None,
            Some(Err(reason)) => reason.clone(),
            None => match &poll {
                Err(e) => e.to_string(),
                Ok(_) => "map did not complete".to_string(),
            },
        };
        Some(ReadbackError::TransferFailed { channel, reason })
    });
    let failure = failure.or_else(|| rejected.map(|e| ReadbackError::CopyRejected(e.to_string())));

    if let Some(err) = failure {
        // Releases mapped buffers and cancels pending maps so the next frame
        // can map again. Unmapping an idle buffer is a validation error.
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        for buffer in staging {
            buffer.unmap();
        }
        let _ = pollster::block_on(scope.pop());
        return Err(err);
    }

    for (channel, buffer) in Channel::ALL.into_iter().zip(staging) {
        {
            let view = buffer.slice(..).get_mapped_range();
            let bytes: &[u8] = &view;
            let values: &[i32] = bytemuck::cast_slice(bytes);
            let dst = host.channel_mut(channel);
            dst.resize(values.len(), 0);
            dst.copy_from_slice(values);
        }
        buffer.unmap();
    }
    Ok(())
}
