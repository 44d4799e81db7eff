//! Per-pixel color channel storage on the device and on the host.

use std::fmt;

use crate::config::Resolution;
use crate::device::DeviceSession;
use crate::error::AllocationError;

/// One of the three color channels written by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    R,
    G,
    B,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::R, Channel::G, Channel::B];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Channel::R => "red",
            Channel::G => "green",
            Channel::B => "blue",
        })
    }
}

const ELEMENT_SIZE: u64 = std::mem::size_of::<i32>() as u64;

/// Device-resident channel buffers plus the staging buffers used to read
/// them back.
///
/// Both sets are allocated once at startup and reused for every frame.
pub struct ChannelBuffers {
    element_count: usize,
    storage: [wgpu::Buffer; 3],
    staging: [wgpu::Buffer; 3],
}

impl ChannelBuffers {
    /// Allocates three channel buffers of `element_count` `i32` elements each.
    pub fn allocate(session: &DeviceSession, element_count: usize) -> Result<Self, AllocationError> {
        if element_count == 0 {
            return Err(AllocationError::Empty);
        }

        let requested = (element_count as u64).saturating_mul(ELEMENT_SIZE);
        let limits = session.limits();
        let limit = limits
            .max_buffer_size
            .min(u64::from(limits.max_storage_buffer_binding_size));
        if requested > limit {
            return Err(AllocationError::OutOfMemory { requested, limit });
        }

        let device = session.device();
        let scope = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let storage = Channel::ALL.map(|channel| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(storage_label(channel)),
                size: requested,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        });
        let staging = Channel::ALL.map(|channel| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(staging_label(channel)),
                size: requested,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        if pollster::block_on(scope.pop()).is_some() {
            return Err(AllocationError::OutOfMemory { requested, limit });
        }

        log::debug!("allocated 3x{element_count} channel elements ({requested} bytes each)");

        Ok(Self {
            element_count,
            storage,
            staging,
        })
    }

    #[inline]
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Size in bytes of each channel buffer.
    #[inline]
    pub fn byte_len(&self) -> u64 {
        self.element_count as u64 * ELEMENT_SIZE
    }

    /// Storage buffers in R, G, B order.
    pub fn storage(&self) -> [&wgpu::Buffer; 3] {
        self.storage.each_ref()
    }

    /// Staging buffers in R, G, B order.
    pub fn staging(&self) -> [&wgpu::Buffer; 3] {
        self.staging.each_ref()
    }
}

fn storage_label(channel: Channel) -> &'static str {
    match channel {
        Channel::R => "nimbus out_r",
        Channel::G => "nimbus out_g",
        Channel::B => "nimbus out_b",
    }
}

fn staging_label(channel: Channel) -> &'static str {
    match channel {
        Channel::R => "nimbus staging r",
        Channel::G => "nimbus staging g",
        Channel::B => "nimbus staging b",
    }
}

/// Host copies of the three channels, one element per pixel in row-major
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostChannels {
    pub r: Vec<i32>,
    pub g: Vec<i32>,
    pub b: Vec<i32>,
}

impl HostChannels {
    /// Zero-filled channels sized for `resolution`.
    pub fn new(resolution: Resolution) -> Self {
        Self::with_len(resolution.pixel_count())
    }

    pub fn with_len(len: usize) -> Self {
        Self {
            r: vec![0; len],
            g: vec![0; len],
            b: vec![0; len],
        }
    }

    pub fn channel(&self, channel: Channel) -> &[i32] {
        match channel {
            Channel::R => &self.r,
            Channel::G => &self.g,
            Channel::B => &self.b,
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut Vec<i32> {
        match channel {
            Channel::R => &mut self.r,
            Channel::G => &mut self.g,
            Channel::B => &mut self.b,
        }
    }

    /// Length of the red channel. All three are expected to agree.
    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_channels_match_resolution() {
        let host = HostChannels::new(Resolution::new(4, 3));
        assert_eq!(host.len(), 12);
        for channel in Channel::ALL {
            assert_eq!(host.channel(channel).len(), 12);
            assert!(host.channel(channel).iter().all(|&v| v == 0));
        }
    }

    #[test]
    fn channel_accessors_are_distinct() {
        let mut host = HostChannels::with_len(2);
        host.channel_mut(Channel::G)[1] = 7;
        assert_eq!(host.g, vec![0, 7]);
        assert_eq!(host.r, vec![0, 0]);
        assert_eq!(host.b, vec![0, 0]);
    }

    #[test]
    fn channel_order_and_names() {
        assert_eq!(Channel::ALL.map(Channel::index), [0, 1, 2]);
        assert_eq!(Channel::G.to_string(), "green");
    }
}
