//! Time subsystem.
//!
//! Provides the clock that feeds frame parameter derivation and the pacing
//! rules of the render loop. Intended usage:
//! - one `FrameClock` per render loop
//! - call `tick()` once per produced frame to obtain `FrameTime`
//! - ask the `Pacer` how long to wait before the next tick

mod frame_clock;
mod pacer;

pub use frame_clock::{FrameClock, FrameTime};
pub use pacer::{Pacer, PacingMode};
