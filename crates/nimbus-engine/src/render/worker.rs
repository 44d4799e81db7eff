use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::config::RenderConfig;
use crate::device::DeviceInit;
use crate::dispatch::{FrameDevice, GpuFrameDevice};
use crate::error::StartupError;
use crate::kernel::KernelSource;
use crate::time::{FrameClock, Pacer};

use super::{FrameSlot, RenderStats, Renderer};

enum Control {
    Stop,
}

/// Background thread driving the frame loop.
///
/// The worker owns the device for its whole life. Completed frames are
/// published to a [`FrameSlot`]; failed frames are logged and skipped.
/// Dropping the handle stops the thread and waits for it.
pub struct RenderWorker {
    control: Sender<Control>,
    handle: Option<JoinHandle<RenderStats>>,
}

impl RenderWorker {
    /// Spawns a worker rendering on the first matching GPU.
    ///
    /// Returns once the device, kernel and buffers are ready, or with the
    /// error that prevented it.
    pub fn spawn_gpu(
        init: DeviceInit,
        source: KernelSource,
        config: RenderConfig,
        slot: FrameSlot,
    ) -> Result<Self, StartupError> {
        let build_config = config.clone();
        Self::spawn(
            move || GpuFrameDevice::build(&init, &source, &build_config),
            config,
            slot,
        )
    }

    /// Spawns a worker whose device is created by `build` on the worker thread.
    pub fn spawn<F, D>(build: F, config: RenderConfig, slot: FrameSlot) -> Result<Self, StartupError>
    where
        F: FnOnce() -> Result<D, StartupError> + Send + 'static,
        D: FrameDevice + 'static,
    {
        let (control, control_rx) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let handle = std::thread::Builder::new()
            .name("nimbus-render".into())
            .spawn(move || {
                let device = match build() {
                    Ok(device) => {
                        let _ = ready_tx.send(Ok(()));
                        device
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return RenderStats::new(Instant::now());
                    }
                };
                let renderer = Renderer::new(device, config.packing);
                run(renderer, &config, &slot, &control_rx)
            })
            .map_err(|e| StartupError::Worker(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log::debug!("render worker started");
                Ok(Self {
                    control,
                    handle: Some(handle),
                })
            }
            Ok(Err(err)) => {
                let _ = handle.join();
                Err(err)
            }
            Err(_) => {
                let _ = handle.join();
                Err(StartupError::Worker(
                    "render worker exited before reporting startup".into(),
                ))
            }
        }
    }

    /// Stops the loop and returns its final counters.
    pub fn stop(mut self) -> Option<RenderStats> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<RenderStats> {
        let handle = self.handle.take()?;
        let _ = self.control.send(Control::Stop);
        match handle.join() {
            Ok(stats) => {
                log::info!(
                    "render worker stopped after {} frames ({} skipped)",
                    stats.rendered,
                    stats.skipped
                );
                Some(stats)
            }
            Err(_) => {
                log::error!("render worker panicked");
                None
            }
        }
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run<D: FrameDevice>(
    mut renderer: Renderer<D>,
    config: &RenderConfig,
    slot: &FrameSlot,
    control: &Receiver<Control>,
) -> RenderStats {
    let mut clock = FrameClock::new(config.time_offset);
    let pacer = Pacer::new(config.frame_interval, config.pacing);
    let mut stats = RenderStats::new(Instant::now());

    loop {
        let tick = clock.tick();
        let started = Instant::now();

        match renderer.render_next(tick.elapsed_nanos) {
            Ok(frame) => {
                stats.record_rendered(frame.render_cost);
                slot.publish(frame);
            }
            Err(err) => {
                stats.record_skipped();
                log::warn!("frame {} skipped: {err}", tick.frame_index);
            }
        }
        stats.maybe_log(Instant::now(), config.stats_interval);

        match control.recv_timeout(pacer.wait_after(started.elapsed())) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    stats
}
