//! Frame pipeline driven by host-side stand-ins for the kernel.

use std::time::{Duration, Instant};

use nimbus_engine::error::{DispatchError, FrameError, PackingError, ReadbackError, StartupError};
use nimbus_engine::{
    Channel, FrameDevice, FrameParameters, FrameSlot, HostChannels, PackingPolicy, RenderConfig,
    RenderWorker, Renderer, Resolution, assemble, derive_parameters, render_frame_with,
};

/// Evaluates a per-pixel function on the host, like a kernel would.
struct HostKernel {
    resolution: Resolution,
    shade: fn(i32) -> [i32; 3],
    fail_on: Option<Channel>,
    last_params: Option<FrameParameters>,
}

impl HostKernel {
    fn new(resolution: Resolution, shade: fn(i32) -> [i32; 3]) -> Self {
        Self {
            resolution,
            shade,
            fail_on: None,
            last_params: None,
        }
    }
}

impl FrameDevice for HostKernel {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn dispatch(&mut self, params: &FrameParameters) -> Result<(), DispatchError> {
        self.last_params = Some(*params);
        Ok(())
    }

    fn read_back(&mut self, host: &mut HostChannels) -> Result<(), ReadbackError> {
        if let Some(channel) = self.fail_on {
            return Err(ReadbackError::TransferFailed {
                channel,
                reason: "injected fault".into(),
            });
        }
        let n = self.resolution.pixel_count() as i32;
        let values: Vec<[i32; 3]> = (0..n).map(self.shade).collect();
        host.r = values.iter().map(|v| v[0]).collect();
        host.g = values.iter().map(|v| v[1]).collect();
        host.b = values.iter().map(|v| v[2]).collect();
        Ok(())
    }
}

fn gradient(id: i32) -> [i32; 3] {
    [id, 0, 255 - id]
}

fn overflow(_id: i32) -> [i32; 3] {
    [300, 0, 0]
}

#[test]
fn gradient_scenario() {
    let res = Resolution::new(4, 4);
    let mut device = HostKernel::new(res, gradient);
    let mut host = HostChannels::new(res);

    render_frame_with(&mut device, &derive_parameters(0), &mut host).unwrap();
    let image = assemble(&host, res, PackingPolicy::Reject).unwrap();

    assert_eq!(image.get_pixel(0, 0).0, [0, 0, 255]);
    assert_eq!(image.get_pixel(3, 3).0, [15, 0, 240]);
    assert_eq!(image.get_pixel(1, 2).0, [9, 0, 246]);
}

#[test]
fn renderer_passes_derived_parameters() {
    let res = Resolution::new(4, 4);
    let mut renderer = Renderer::new(HostKernel::new(res, gradient), PackingPolicy::Reject);

    let t = 1_234_567_890;
    let frame = renderer.render_next(t).unwrap();
    assert_eq!(frame.index, 0);
    assert_eq!(frame.time_nanos, t);
    assert_eq!(renderer.device().last_params, Some(derive_parameters(t)));

    let next = renderer.render_next(t + 20_000_000).unwrap();
    assert_eq!(next.index, 1);
    assert_eq!(next.packed()[0], 0x0000_00ff);
}

#[test]
fn green_readback_fault_yields_no_image() {
    let res = Resolution::new(4, 4);
    let mut device = HostKernel::new(res, gradient);
    device.fail_on = Some(Channel::G);
    let mut renderer = Renderer::new(device, PackingPolicy::Reject);

    match renderer.render_next(0) {
        Err(FrameError::Readback(ReadbackError::TransferFailed { channel, .. })) => {
            assert_eq!(channel, Channel::G)
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("faulty readback produced a frame"),
    }
}

#[test]
fn host_arrays_always_cover_every_pixel() {
    for res in [Resolution::new(1, 1), Resolution::new(7, 3), Resolution::new(64, 65)] {
        let mut device = HostKernel::new(res, |id| [id % 256, 0, 0]);
        let mut host = HostChannels::with_len(0);
        render_frame_with(&mut device, &derive_parameters(42), &mut host).unwrap();
        for channel in Channel::ALL {
            assert_eq!(host.channel(channel).len(), res.pixel_count());
        }
    }
}

#[test]
fn packing_policy_decides_overflowing_frames() {
    let res = Resolution::new(2, 2);

    let mut strict = Renderer::new(HostKernel::new(res, overflow), PackingPolicy::Reject);
    assert!(matches!(
        strict.render_next(0),
        Err(FrameError::Packing(PackingError::ChannelOutOfRange {
            channel: Channel::R,
            index: 0,
            value: 300,
        }))
    ));

    let mut lenient = Renderer::new(HostKernel::new(res, overflow), PackingPolicy::Clamp);
    let frame = lenient.render_next(0).unwrap();
    assert!(frame.image.pixels().all(|p| p.0 == [255, 0, 0]));
}

fn fast_config(res: Resolution, packing: PackingPolicy) -> RenderConfig {
    RenderConfig {
        resolution: res,
        frame_interval: Duration::from_millis(1),
        packing,
        ..RenderConfig::default()
    }
}

fn wait_for<T>(mut probe: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Some(v) = probe() {
            return Some(v);
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    None
}

#[test]
fn worker_publishes_latest_frame() {
    let res = Resolution::new(4, 4);
    let slot = FrameSlot::new();
    let worker = RenderWorker::spawn(
        move || Ok(HostKernel::new(res, gradient)),
        fast_config(res, PackingPolicy::Reject),
        slot.clone(),
    )
    .unwrap();

    let frame = wait_for(|| slot.latest().filter(|f| f.index >= 2)).expect("no frames published");
    assert_eq!(frame.image.dimensions(), (4, 4));

    let stats = worker.stop().unwrap();
    assert!(stats.rendered >= 3);
    assert_eq!(stats.skipped, 0);
}

#[test]
fn worker_skips_failed_frames() {
    let res = Resolution::new(2, 2);
    let slot = FrameSlot::new();
    let worker = RenderWorker::spawn(
        move || Ok(HostKernel::new(res, overflow)),
        fast_config(res, PackingPolicy::Reject),
        slot.clone(),
    )
    .unwrap();

    std::thread::sleep(Duration::from_millis(30));
    let stats = worker.stop().unwrap();
    assert!(stats.skipped >= 1);
    assert_eq!(stats.rendered, 0);
    assert!(slot.latest().is_none());
}

#[test]
fn worker_reports_startup_failure() {
    let result = RenderWorker::spawn(
        || -> Result<HostKernel, StartupError> { Err(StartupError::Worker("no device".into())) },
        RenderConfig::default(),
        FrameSlot::new(),
    );
    match result {
        Err(StartupError::Worker(msg)) => assert_eq!(msg, "no device"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("worker started without a device"),
    }
}
