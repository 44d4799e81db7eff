use std::time::Duration;

/// Initialization parameters for the compute device.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct DeviceInit {
    /// Backends to consider, intersected with those compiled into wgpu.
    pub backends: wgpu::Backends,

    /// Adapter preference used when picking the first device.
    pub power_preference: wgpu::PowerPreference,

    /// Only accept a fallback (usually software) adapter.
    ///
    /// When set, hardware adapters are never returned.
    pub force_fallback_adapter: bool,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// How long the startup queue probe may take before the queue is
    /// considered unusable.
    pub probe_timeout: Duration,
}

impl Default for DeviceInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_limits: wgpu::Limits::default(),
            probe_timeout: Duration::from_secs(5),
        }
    }
}
