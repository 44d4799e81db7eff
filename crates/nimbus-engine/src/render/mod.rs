//! Frame production: the synchronous renderer, the background worker and
//! the handoff to displays.

mod frame;
mod pipeline;
mod slot;
mod stats;
mod worker;

pub use frame::Frame;
pub use pipeline::Renderer;
pub use slot::FrameSlot;
pub use stats::RenderStats;
pub use worker::RenderWorker;
