//! Kernel program: source, interface checks and the compiled pipeline.

pub mod abi;
mod interface;
mod program;
mod source;

pub use interface::{Dimension, KernelInterface};
pub use program::Kernel;
pub use source::KernelSource;
