//! Error taxonomy for the render pipeline.
//!
//! Startup failures (device, kernel, buffers) are fatal and surface through
//! [`StartupError`]. Per-frame failures (dispatch, readback, packing) surface
//! through [`FrameError`]; callers drop the frame and keep going.
use std::path::PathBuf;

use thiserror::Error;

use crate::channels::Channel;
use crate::config::Resolution;

/// Compute environment acquisition failed
#[derive(Error, Debug)]
pub enum DeviceError {
    /// None of the requested backends is available in this build
    #[error("no compute platform available (requested backends: {requested})")]
    NoPlatform { requested: String },

    /// A backend is available, but it exposes no usable adapter
    #[error("no compute device found: {0}")]
    NoDevice(String),

    /// The adapter refused to create a logical device
    #[error("failed to create device context: {0}")]
    ContextCreationFailed(String),

    /// The device was created but its queue could not complete a submission
    #[error("failed to create command queue: {0}")]
    QueueCreationFailed(String),
}

/// Kernel compilation or entry point resolution failed
#[derive(Error, Debug)]
pub enum CompileError {
    /// The kernel source could not be read
    #[error("failed to read kernel source from {path:?}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parsing or validation failed; carries the rendered compiler diagnostic
    #[error("kernel build failed:\n{0}")]
    BuildFailed(String),

    /// The named compute entry point does not exist in the module
    #[error("kernel entry point `{0}` not found")]
    EntryPointNotFound(String),

    /// The entry point is not declared with the host's workgroup size
    #[error("entry point `{entry_point}` declares workgroup size {declared:?}, expected [{expected}, 1, 1]")]
    WorkgroupSize {
        entry_point: String,
        declared: [u32; 3],
        expected: u32,
    },

    /// The resolution needs more workgroups than one dispatch may launch
    #[error("{resolution} needs {groups} workgroups, device allows {limit} per dispatch")]
    DispatchTooLarge {
        resolution: Resolution,
        groups: u32,
        limit: u32,
    },

    /// An argument slot is missing or declared with the wrong type
    #[error("kernel argument {slot} ({name}): {reason}")]
    AbiMismatch {
        slot: u32,
        name: &'static str,
        reason: String,
    },

    /// The kernel hardcodes a resolution different from the host's
    #[error("kernel declares {name} = {kernel}, host is configured for {host}")]
    ResolutionMismatch {
        name: &'static str,
        kernel: u64,
        host: u32,
    },

    /// The kernel declares neither an override nor a constant for a dimension
    #[error("kernel does not declare `{0}` as an override or constant")]
    ResolutionUndeclared(&'static str),
}

/// Channel buffer allocation failed
#[derive(Error, Debug)]
pub enum AllocationError {
    /// The requested size exceeds what the device allows for one buffer
    #[error("channel buffer of {requested} bytes exceeds device limit of {limit} bytes")]
    OutOfMemory { requested: u64, limit: u64 },

    /// Zero-sized channel buffers are not allowed
    #[error("channel buffers must hold at least one element")]
    Empty,
}

/// Kernel dispatch failed
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A kernel argument was rejected before binding
    #[error("invalid kernel argument {slot}: {reason}")]
    InvalidArgument { slot: u32, reason: String },

    /// The device reported a failure while executing the dispatch
    #[error("device fault during dispatch: {0}")]
    DeviceFault(String),

    /// The dispatch did not complete within the configured timeout
    #[error("dispatch did not complete within {0:?}")]
    Timeout(std::time::Duration),
}

/// Transfer of channel data back to the host failed
#[derive(Error, Debug)]
pub enum ReadbackError {
    #[error("readback of {channel} channel failed: {reason}")]
    TransferFailed { channel: Channel, reason: String },

    /// The device rejected the copy into the staging buffers
    #[error("device rejected the readback copy: {0}")]
    CopyRejected(String),
}

/// Host channel data could not be packed into an image
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PackingError {
    /// A channel value lies outside `[0, 255]`
    #[error("{channel} channel value {value} at index {index} is outside [0, 255]")]
    ChannelOutOfRange {
        channel: Channel,
        index: usize,
        value: i32,
    },

    /// A host array does not hold exactly `width * height` values
    #[error("{channel} channel holds {actual} values, expected {expected}")]
    LengthMismatch {
        channel: Channel,
        expected: usize,
        actual: usize,
    },
}

/// Fatal error raised while building the pipeline
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// The render worker thread could not be started or died during startup
    #[error("render worker failed to start: {0}")]
    Worker(String),
}

/// Recoverable error raised while producing a single frame
#[derive(Error, Debug)]
pub enum FrameError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Readback(#[from] ReadbackError),

    #[error(transparent)]
    Packing(#[from] PackingError),
}
