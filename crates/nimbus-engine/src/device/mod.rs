//! Compute device management.
//!
//! This module is responsible for:
//! - selecting the first backend and adapter
//! - creating the wgpu Device/Queue pair the rest of the pipeline runs on

mod init;
mod session;

pub use init::DeviceInit;
pub use session::DeviceSession;
