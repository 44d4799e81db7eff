use crate::error::DeviceError;

use super::DeviceInit;

/// Owns the wgpu core objects used by the render pipeline.
///
/// This type is the compute environment:
/// - picks the first backend/adapter matching [`DeviceInit`]
/// - creates and stores the logical device and its in-order queue
///
/// One session is created at startup and passed explicitly to every pipeline
/// call. Resources are released when it is dropped.
pub struct DeviceSession {
    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,
}

impl DeviceSession {
    /// Acquires the first adapter and creates its device and queue.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu; this blocks the
    /// calling thread until both are ready.
    pub fn initialize(init: &DeviceInit) -> Result<Self, DeviceError> {
        pollster::block_on(Self::initialize_async(init))
    }

    async fn initialize_async(init: &DeviceInit) -> Result<Self, DeviceError> {
        let backends = init.backends & wgpu::Instance::enabled_backend_features();
        if backends.is_empty() {
            return Err(DeviceError::NoPlatform {
                requested: format!("{:?}", init.backends),
            });
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .map_err(|e| DeviceError::NoDevice(e.to_string()))?;

        let info = adapter.get_info();
        log::info!(
            "using adapter {:?} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("nimbus compute device"),
                required_features: wgpu::Features::empty(),
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| DeviceError::ContextCreationFailed(e.to_string()))?;

        // An empty submission that never completes means the queue is unusable.
        let probe = queue.submit(std::iter::empty());
        device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(probe),
                timeout: Some(init.probe_timeout),
            })
            .map_err(|e| DeviceError::QueueCreationFailed(e.to_string()))?;

        log::debug!("compute device and queue ready");

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the limits the device was created with.
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Returns information about the selected adapter.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        log::debug!("releasing compute device {:?}", self.adapter.get_info().name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_backend_set_is_no_platform() {
        let init = DeviceInit {
            backends: wgpu::Backends::empty(),
            ..DeviceInit::default()
        };
        assert!(matches!(
            DeviceSession::initialize(&init),
            Err(DeviceError::NoPlatform { .. })
        ));
    }

    #[test]
    fn backend_without_adapter_is_no_device() {
        for backends in wgpu::Instance::enabled_backend_features().iter() {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends,
                ..Default::default()
            });
            let opts = wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: true,
            };
            if pollster::block_on(instance.request_adapter(&opts)).is_ok() {
                eprintln!("{backends:?} exposes a fallback adapter, skipping");
                continue;
            }

            let init = DeviceInit {
                backends,
                force_fallback_adapter: true,
                ..DeviceInit::default()
            };
            let result = DeviceSession::initialize(&init);
            assert!(
                matches!(result, Err(DeviceError::NoDevice(_))),
                "{backends:?}: expected NoDevice"
            );
        }
    }
}
