//! Packs host channel arrays into an RGB image.
use image::{Rgb, RgbImage};

use crate::channels::{Channel, HostChannels};
use crate::config::Resolution;
use crate::error::PackingError;

/// Handling of channel values outside `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackingPolicy {
    /// Fail the frame with [`PackingError::ChannelOutOfRange`].
    #[default]
    Reject,
    /// Saturate into `[0, 255]`.
    Clamp,
}

impl PackingPolicy {
    fn pack(self, channel: Channel, index: usize, value: i32) -> Result<u8, PackingError> {
        match (self, u8::try_from(value)) {
            (_, Ok(v)) => Ok(v),
            (PackingPolicy::Clamp, Err(_)) => Ok(value.clamp(0, 255) as u8),
            (PackingPolicy::Reject, Err(_)) => Err(PackingError::ChannelOutOfRange {
                channel,
                index,
                value,
            }),
        }
    }
}

/// Builds a `width x height` image where pixel `(col, row)` takes its color
/// from index `row * width + col` of each channel.
///
/// Either every pixel is written or an error is returned.
pub fn assemble(
    host: &HostChannels,
    resolution: Resolution,
    policy: PackingPolicy,
) -> Result<RgbImage, PackingError> {
    let expected = resolution.pixel_count();
    for channel in Channel::ALL {
        let actual = host.channel(channel).len();
        if actual < expected {
            return Err(PackingError::LengthMismatch {
                channel,
                expected,
                actual,
            });
        }
    }

    let mut image = RgbImage::new(resolution.width, resolution.height);
    for (col, row, pixel) in image.enumerate_pixels_mut() {
        let index = resolution.index(row, col);
        *pixel = Rgb([
            policy.pack(Channel::R, index, host.r[index])?,
            policy.pack(Channel::G, index, host.g[index])?,
            policy.pack(Channel::B, index, host.b[index])?,
        ]);
    }
    Ok(image)
}

/// Packs one pixel as `0x00RRGGBB`.
#[inline]
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}
