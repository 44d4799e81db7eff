use std::time::Duration;

use image::RgbImage;

use crate::assemble::pack_rgb;

/// One fully assembled output image and where it came from.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Sequence number assigned by the renderer, starting at 0.
    pub index: u64,

    /// Time input the frame parameters were derived from.
    pub time_nanos: u64,

    /// Wall time spent dispatching, reading back and assembling.
    pub render_cost: Duration,

    pub image: RgbImage,
}

impl Frame {
    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixels as `0x00RRGGBB`, row-major.
    pub fn packed(&self) -> Vec<u32> {
        self.image
            .pixels()
            .map(|p| pack_rgb(p[0], p[1], p[2]))
            .collect()
    }

    /// Pixels as opaque RGBA8, row-major, ready for texture upload.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.image.as_raw().len() / 3 * 4);
        for p in self.image.pixels() {
            out.extend_from_slice(&[p[0], p[1], p[2], 255]);
        }
        out
    }
}
