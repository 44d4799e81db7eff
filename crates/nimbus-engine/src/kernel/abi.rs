//! Host/kernel argument contract.
//!
//! The kernel receives six arguments in bind group 0, one binding per slot:
//!
//! | slot | WGSL declaration                                        |
//! |------|---------------------------------------------------------|
//! | 0    | `var<storage, read_write> out_r: array<i32>`            |
//! | 1    | `var<storage, read_write> out_g: array<i32>`            |
//! | 2    | `var<storage, read_write> out_b: array<i32>`            |
//! | 3    | `var<uniform> camera: vec3<f32>`                        |
//! | 4    | `var<uniform> orientation: vec2<f32>`                   |
//! | 5    | `var<uniform> shape: vec2<f32>` (`.y` unused, always 0) |
//!
//! Output resolution arrives as `WIDTH`/`HEIGHT`, either pipeline overrides
//! supplied by the host or module constants checked against it.
use bytemuck::{Pod, Zeroable};

use crate::params::FrameParameters;

/// Bind group holding every kernel argument.
pub const BIND_GROUP: u32 = 0;

/// Workgroup size the kernel must declare on its entry point.
pub const WORKGROUP_SIZE: u32 = 64;

/// Names of the resolution declarations in the kernel.
pub const WIDTH_NAME: &str = "WIDTH";
pub const HEIGHT_NAME: &str = "HEIGHT";

/// Each uniform argument is backed by a 16-byte buffer.
pub(crate) const UNIFORM_SLOT_SIZE: u64 = 16;

/// One kernel argument position.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Slot {
    OutR,
    OutG,
    OutB,
    Camera,
    Orientation,
    Shape,
}

/// What a slot must be declared as in the kernel.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SlotKind {
    /// `var<storage, read_write>` runtime-sized `array<i32>`
    ChannelStorage,
    /// `var<uniform>` float vector with this many components
    UniformVector(u8),
}

impl Slot {
    /// All slots in binding order.
    pub const ALL: [Slot; 6] = [
        Slot::OutR,
        Slot::OutG,
        Slot::OutB,
        Slot::Camera,
        Slot::Orientation,
        Slot::Shape,
    ];

    #[inline]
    pub const fn index(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Slot::OutR => "out_r",
            Slot::OutG => "out_g",
            Slot::OutB => "out_b",
            Slot::Camera => "camera",
            Slot::Orientation => "orientation",
            Slot::Shape => "shape",
        }
    }

    pub const fn kind(self) -> SlotKind {
        match self {
            Slot::OutR | Slot::OutG | Slot::OutB => SlotKind::ChannelStorage,
            Slot::Camera => SlotKind::UniformVector(3),
            Slot::Orientation | Slot::Shape => SlotKind::UniformVector(2),
        }
    }

    pub(crate) fn layout_entry(self) -> wgpu::BindGroupLayoutEntry {
        let ty = match self.kind() {
            SlotKind::ChannelStorage => wgpu::BufferBindingType::Storage { read_only: false },
            SlotKind::UniformVector(_) => wgpu::BufferBindingType::Uniform,
        };
        wgpu::BindGroupLayoutEntry {
            binding: self.index(),
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }
}

/// Host image of one uniform argument slot.
///
/// `vec3<f32>` has 16-byte alignment in the uniform address space, so every
/// slot is padded to four floats.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct UniformArg {
    pub values: [f32; 4],
}

impl UniformArg {
    fn from_slice(v: &[f32]) -> Self {
        let mut values = [0.0; 4];
        values[..v.len()].copy_from_slice(v);
        Self { values }
    }
}

/// Packs slots 3, 4 and 5 for upload, in slot order.
pub fn uniform_args(params: &FrameParameters) -> [(Slot, UniformArg); 3] {
    [
        (Slot::Camera, UniformArg::from_slice(&params.camera_position)),
        (Slot::Orientation, UniformArg::from_slice(&params.orientation)),
        // Second component is unused by convention.
        (Slot::Shape, UniformArg::from_slice(&[params.shape, 0.0])),
    ]
}

/// Number of workgroups needed to cover `work_items` invocations.
#[inline]
pub fn workgroup_count(work_items: usize) -> u32 {
    work_items.div_ceil(WORKGROUP_SIZE as usize) as u32
}
