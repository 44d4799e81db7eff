use crate::channels::ChannelBuffers;
use crate::config::Resolution;
use crate::device::DeviceSession;
use crate::error::CompileError;
use crate::params::FrameParameters;

use super::abi::{self, Slot, UNIFORM_SLOT_SIZE};
use super::{KernelInterface, KernelSource};

/// Compiled kernel bound to one device session.
///
/// Owns the compute pipeline, its bind group layout and the uniform buffers
/// backing argument slots 3-5. The channel buffers (slots 0-2) live in
/// [`ChannelBuffers`].
pub struct Kernel {
    entry_point: String,
    resolution: Resolution,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    /// Uniform buffers for camera, orientation and shape, in slot order.
    uniforms: [(Slot, wgpu::Buffer); 3],
}

impl Kernel {
    /// Compiles `source` and resolves `entry_point` for `resolution`.
    ///
    /// Source-level problems are caught before the device sees the module;
    /// anything the device still rejects is reported as a build failure.
    pub fn compile(
        session: &DeviceSession,
        source: &KernelSource,
        entry_point: &str,
        resolution: Resolution,
    ) -> Result<Self, CompileError> {
        let iface = KernelInterface::inspect(source, entry_point, resolution)?;

        check_dispatch_size(resolution, &session.limits())?;

        let device = session.device();
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.label()),
            source: wgpu::ShaderSource::Wgsl(source.text().into()),
        });

        let entries = Slot::ALL.map(Slot::layout_entry);
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("nimbus kernel bgl"),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("nimbus kernel pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let owned = iface.pipeline_constants(resolution);
        let constants: Vec<(&str, f64)> = owned.iter().map(|(k, v)| (k.as_str(), *v)).collect();

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("nimbus kernel pipeline"),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some(entry_point),
            compilation_options: wgpu::PipelineCompilationOptions {
                constants: &constants,
                zero_initialize_workgroup_memory: true,
            },
            cache: None,
        });

        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(CompileError::BuildFailed(err.to_string()));
        }

        let uniforms = [Slot::Camera, Slot::Orientation, Slot::Shape].map(|slot| {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(slot.name()),
                size: UNIFORM_SLOT_SIZE,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            (slot, buffer)
        });

        log::info!(
            "compiled kernel {:?} entry point `{entry_point}` for {resolution}",
            source.label()
        );

        Ok(Self {
            entry_point: iface.entry_point,
            resolution,
            pipeline,
            bind_group_layout,
            uniforms,
        })
    }

    #[inline]
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    #[inline]
    pub fn pipeline(&self) -> &wgpu::ComputePipeline {
        &self.pipeline
    }

    /// Uploads `params` into the uniform argument slots.
    pub fn write_arguments(&self, queue: &wgpu::Queue, params: &FrameParameters) {
        for ((slot, buffer), (arg_slot, arg)) in self.uniforms.iter().zip(abi::uniform_args(params)) {
            debug_assert_eq!(*slot, arg_slot);
            queue.write_buffer(buffer, 0, bytemuck::bytes_of(&arg));
        }
    }

    /// Binds all six arguments, in slot order, into one bind group.
    pub fn bind(&self, session: &DeviceSession, buffers: &ChannelBuffers) -> wgpu::BindGroup {
        let [r, g, b] = buffers.storage();
        let [(_, camera), (_, orientation), (_, shape)] = &self.uniforms;
        let resources = [r, g, b, camera, orientation, shape];

        let entries: Vec<wgpu::BindGroupEntry<'_>> = Slot::ALL
            .iter()
            .zip(resources)
            .map(|(slot, buffer)| wgpu::BindGroupEntry {
                binding: slot.index(),
                resource: buffer.as_entire_binding(),
            })
            .collect();

        session.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("nimbus kernel bind group"),
            layout: &self.bind_group_layout,
            entries: &entries,
        })
    }
}

/// Fails when one dispatch cannot cover every pixel of `resolution`.
fn check_dispatch_size(resolution: Resolution, limits: &wgpu::Limits) -> Result<(), CompileError> {
    let groups = abi::workgroup_count(resolution.pixel_count());
    let limit = limits.max_compute_workgroups_per_dimension;
    if groups > limit {
        return Err(CompileError::DispatchTooLarge {
            resolution,
            groups,
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_resolution_fits_one_dispatch() {
        let limits = wgpu::Limits::default();
        assert!(check_dispatch_size(Resolution::new(700, 700), &limits).is_ok());
        assert!(check_dispatch_size(Resolution::new(2040, 2048), &limits).is_ok());
    }

    #[test]
    fn oversized_resolution_is_dispatch_too_large() {
        let limits = wgpu::Limits::default();
        let err = check_dispatch_size(Resolution::new(2048, 2048), &limits).unwrap_err();
        assert!(matches!(
            err,
            CompileError::DispatchTooLarge {
                groups: 65536,
                limit: 65535,
                ..
            }
        ));
    }
}
