//! Frame dispatch: bind arguments, run the kernel, read the channels back.
//!
//! [`FrameDevice`] is the boundary between the frame loop and whatever
//! executes the kernel. [`GpuFrameDevice`] drives a real device; tests plug
//! in host-side stand-ins.

mod gpu;

pub use gpu::{GpuFrameDevice, render_frame};

use crate::channels::{Channel, HostChannels};
use crate::config::Resolution;
use crate::error::{DispatchError, FrameError, ReadbackError};
use crate::params::FrameParameters;

/// Executes the kernel for one frame and copies its output to the host.
pub trait FrameDevice {
    /// Resolution the kernel was compiled for.
    fn resolution(&self) -> Resolution;

    /// Binds `params` and runs the kernel over every pixel.
    ///
    /// Returns once the device has finished executing.
    fn dispatch(&mut self, params: &FrameParameters) -> Result<(), DispatchError>;

    /// Copies the R, G and B channels into `host`.
    ///
    /// On error `host` must be left exactly as it was.
    fn read_back(&mut self, host: &mut HostChannels) -> Result<(), ReadbackError>;
}

/// Runs one frame on `device`: validate, dispatch, read back.
///
/// On success every host channel holds exactly `width * height` values.
pub fn render_frame_with<D>(
    device: &mut D,
    params: &FrameParameters,
    host: &mut HostChannels,
) -> Result<(), FrameError>
where
    D: FrameDevice + ?Sized,
{
    params.validate()?;
    device.dispatch(params)?;
    device.read_back(host)?;

    let expected = device.resolution().pixel_count();
    for channel in Channel::ALL {
        let actual = host.channel(channel).len();
        if actual != expected {
            return Err(ReadbackError::TransferFailed {
                channel,
                reason: format!("received {actual} values, expected {expected}"),
            }
            .into());
        }
    }
    Ok(())
}
