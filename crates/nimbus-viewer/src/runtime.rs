use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use nimbus_engine::{FrameSlot, RenderWorker};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::present::{PresentInit, Presenter, SurfaceErrorAction};

/// Window configuration.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub initial_size: PhysicalSize<u32>,

    /// Interval between redraws.
    pub redraw_interval: Duration,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "nimbus".to_string(),
            initial_size: PhysicalSize::new(700, 700),
            redraw_interval: Duration::from_millis(20),
        }
    }
}

/// Entry point for the windowed viewer.
pub struct Runtime;

impl Runtime {
    /// Shows frames from `slot` until the window is closed, then stops `worker`.
    pub fn run(
        config: WindowConfig,
        present_init: PresentInit,
        slot: FrameSlot,
        worker: RenderWorker,
    ) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, present_init, slot, worker);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        if let Some(err) = state.fatal.take() {
            return Err(err);
        }
        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    presenter: Presenter<'this>,
}

struct AppState {
    config: WindowConfig,
    present_init: PresentInit,
    slot: FrameSlot,
    worker: Option<RenderWorker>,

    entry: Option<WindowEntry>,
    next_redraw: Instant,
    fatal: Option<anyhow::Error>,
}

impl AppState {
    fn new(
        config: WindowConfig,
        present_init: PresentInit,
        slot: FrameSlot,
        worker: RenderWorker,
    ) -> Self {
        Self {
            config,
            present_init,
            slot,
            worker: Some(worker),
            entry: None,
            next_redraw: Instant::now(),
            fatal: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let init = self.present_init.clone();
        let entry = WindowEntryTryBuilder {
            window,
            presenter_builder: |w| pollster::block_on(Presenter::new(w, init)),
        }
        .try_build()?;

        self.entry = Some(entry);
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        // Stop rendering before the window and its surface go away.
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
        self.entry = None;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.fatal = Some(err);
        self.shutdown(event_loop);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        let latest = self.slot.latest();
        let result = entry.with_presenter_mut(|presenter| {
            if let Some(frame) = latest {
                if presenter.shown_index() != Some(frame.index) {
                    presenter.upload(&frame);
                }
            }
            presenter.draw().err().map(|err| {
                log::warn!("surface error: {err}");
                presenter.handle_surface_error(err)
            })
        });

        if result == Some(SurfaceErrorAction::Fatal) {
            self.fail(event_loop, anyhow::anyhow!("surface ran out of memory"));
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e.context("failed to create viewer window"));
            return;
        }

        self.next_redraw = Instant::now();
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = &self.entry else {
            return;
        };

        let now = Instant::now();
        if now >= self.next_redraw {
            entry.with_window(|w| w.request_redraw());
            self.next_redraw = now + self.config.redraw_interval;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_redraw));
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => self.shutdown(event_loop),

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.with_presenter_mut(|p| p.resize(new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.entry.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_presenter_mut(|p| p.resize(new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
