//! Static checks of kernel source against the host's argument contract.
//!
//! The WGSL is parsed and validated with naga before anything touches the
//! device, so build diagnostics, missing entry points and ABI drift are all
//! reported as [`CompileError`]s instead of device validation failures.
use naga::{AddressSpace, ArraySize, Literal, Scalar, StorageAccess, TypeInner};

use crate::config::Resolution;
use crate::error::CompileError;

use super::abi::{Slot, SlotKind, BIND_GROUP, HEIGHT_NAME, WIDTH_NAME, WORKGROUP_SIZE};
use super::KernelSource;

/// How the kernel learns one output dimension.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Dimension {
    /// Pipeline-overridable constant; the host supplies the value under `key`.
    Override { key: String },
    /// Module constant already equal to the host's value.
    Constant,
}

/// Result of inspecting a kernel: everything pipeline creation needs to know.
#[derive(Debug, Clone)]
pub struct KernelInterface {
    pub entry_point: String,
    pub width: Dimension,
    pub height: Dimension,
}

impl KernelInterface {
    /// Parses, validates and checks `source` against the argument contract.
    pub fn inspect(
        source: &KernelSource,
        entry_point: &str,
        resolution: Resolution,
    ) -> Result<Self, CompileError> {
        let text = source.text();
        let module = naga::front::wgsl::parse_str(text)
            .map_err(|e| CompileError::BuildFailed(e.emit_to_string(text)))?;

        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .map_err(|e| CompileError::BuildFailed(e.emit_to_string(text)))?;

        let ep = module
            .entry_points
            .iter()
            .find(|ep| ep.name == entry_point && ep.stage == naga::ShaderStage::Compute)
            .ok_or_else(|| CompileError::EntryPointNotFound(entry_point.to_string()))?;

        if ep.workgroup_size != [WORKGROUP_SIZE, 1, 1] {
            return Err(CompileError::WorkgroupSize {
                entry_point: entry_point.to_string(),
                declared: ep.workgroup_size,
                expected: WORKGROUP_SIZE,
            });
        }

        for slot in Slot::ALL {
            check_slot(&module, slot)?;
        }

        let width = resolve_dimension(&module, WIDTH_NAME, resolution.width)?;
        let height = resolve_dimension(&module, HEIGHT_NAME, resolution.height)?;

        Ok(Self {
            entry_point: entry_point.to_string(),
            width,
            height,
        })
    }

    /// Override values to pass at pipeline creation.
    pub fn pipeline_constants(&self, resolution: Resolution) -> Vec<(String, f64)> {
        [(&self.width, resolution.width), (&self.height, resolution.height)]
            .into_iter()
            .filter_map(|(dim, value)| match dim {
                Dimension::Override { key } => Some((key.clone(), f64::from(value))),
                Dimension::Constant => None,
            })
            .collect()
    }
}

fn check_slot(module: &naga::Module, slot: Slot) -> Result<(), CompileError> {
    let mismatch = |reason: String| CompileError::AbiMismatch {
        slot: slot.index(),
        name: slot.name(),
        reason,
    };

    let binding = naga::ResourceBinding {
        group: BIND_GROUP,
        binding: slot.index(),
    };
    let var = module
        .global_variables
        .iter()
        .map(|(_, v)| v)
        .find(|v| v.binding.as_ref() == Some(&binding))
        .ok_or_else(|| {
            mismatch(format!("no variable bound at @group({BIND_GROUP}) @binding({})", slot.index()))
        })?;

    let inner = &module.types[var.ty].inner;
    match slot.kind() {
        SlotKind::ChannelStorage => {
            let writable = matches!(
                var.space,
                AddressSpace::Storage { access } if access.contains(StorageAccess::STORE)
            );
            if !writable {
                return Err(mismatch("expected var<storage, read_write>".to_string()));
            }
            let element_ok = match inner {
                TypeInner::Array {
                    base,
                    size: ArraySize::Dynamic,
                    ..
                } => module.types[*base].inner == TypeInner::Scalar(Scalar::I32),
                _ => false,
            };
            if !element_ok {
                return Err(mismatch("expected runtime-sized array<i32>".to_string()));
            }
        }
        SlotKind::UniformVector(n) => {
            if var.space != AddressSpace::Uniform {
                return Err(mismatch("expected var<uniform>".to_string()));
            }
            let vector_ok = matches!(
                inner,
                TypeInner::Vector { size, scalar } if *size as u8 == n && *scalar == Scalar::F32
            );
            if !vector_ok {
                return Err(mismatch(format!("expected vec{n}<f32>")));
            }
        }
    }
    Ok(())
}

fn resolve_dimension(
    module: &naga::Module,
    name: &'static str,
    host: u32,
) -> Result<Dimension, CompileError> {
    if let Some((_, o)) = module
        .overrides
        .iter()
        .find(|(_, o)| o.name.as_deref() == Some(name))
    {
        // Overrides with an explicit @id are keyed by the id.
        let key = o.id.map_or_else(|| name.to_string(), |id| id.to_string());
        return Ok(Dimension::Override { key });
    }

    let Some((_, c)) = module
        .constants
        .iter()
        .find(|(_, c)| c.name.as_deref() == Some(name))
    else {
        return Err(CompileError::ResolutionUndeclared(name));
    };

    let kernel = match module.global_expressions[c.init] {
        naga::Expression::Literal(Literal::U32(v)) => Some(u64::from(v)),
        naga::Expression::Literal(Literal::I32(v)) => u64::try_from(v).ok(),
        naga::Expression::Literal(Literal::AbstractInt(v)) => u64::try_from(v).ok(),
        _ => None,
    };
    match kernel {
        Some(v) if v == u64::from(host) => Ok(Dimension::Constant),
        Some(v) => Err(CompileError::ResolutionMismatch { name, kernel: v, host }),
        None => Err(CompileError::ResolutionUndeclared(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARGS: &str = r#"
@group(0) @binding(0) var<storage, read_write> out_r: array<i32>;
@group(0) @binding(1) var<storage, read_write> out_g: array<i32>;
@group(0) @binding(2) var<storage, read_write> out_b: array<i32>;
@group(0) @binding(3) var<uniform> camera: vec3<f32>;
@group(0) @binding(4) var<uniform> orientation: vec2<f32>;
@group(0) @binding(5) var<uniform> shape: vec2<f32>;
"#;

    const BODY: &str = r#"
@compute @workgroup_size(64)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let id = gid.x;
    if id >= WIDTH * HEIGHT {
        return;
    }
    out_r[id] = i32(id);
    out_g[id] = i32(camera.x + orientation.y + shape.x);
    out_b[id] = 255 - i32(id);
}
"#;

    fn kernel(dims: &str, args: &str) -> KernelSource {
        KernelSource::new("test", format!("{args}{dims}{BODY}"))
    }

    fn overrides() -> &'static str {
        "override WIDTH: u32;\noverride HEIGHT: u32;\n"
    }

    #[test]
    fn builtin_kernel_passes() {
        let iface =
            KernelInterface::inspect(&KernelSource::builtin(), "raymarch", Resolution::default())
                .unwrap();
        assert_eq!(
            iface.pipeline_constants(Resolution::default()),
            vec![("WIDTH".to_string(), 700.0), ("HEIGHT".to_string(), 700.0)]
        );
    }

    #[test]
    fn override_dimensions_are_supplied() {
        let res = Resolution::new(4, 3);
        let iface = KernelInterface::inspect(&kernel(overrides(), ARGS), "main", res).unwrap();
        assert_eq!(iface.width, Dimension::Override { key: "WIDTH".into() });
        assert_eq!(
            iface.pipeline_constants(res),
            vec![("WIDTH".to_string(), 4.0), ("HEIGHT".to_string(), 3.0)]
        );
    }

    #[test]
    fn override_with_id_is_keyed_by_id() {
        let dims = "@id(7) override WIDTH: u32;\noverride HEIGHT: u32;\n";
        let iface =
            KernelInterface::inspect(&kernel(dims, ARGS), "main", Resolution::new(4, 4)).unwrap();
        assert_eq!(iface.width, Dimension::Override { key: "7".into() });
    }

    #[test]
    fn matching_constants_pass() {
        let dims = "const WIDTH: u32 = 4u;\nconst HEIGHT: u32 = 4u;\n";
        let iface =
            KernelInterface::inspect(&kernel(dims, ARGS), "main", Resolution::new(4, 4)).unwrap();
        assert_eq!(iface.width, Dimension::Constant);
        assert!(iface.pipeline_constants(Resolution::new(4, 4)).is_empty());
    }

    #[test]
    fn mismatched_constant_is_rejected() {
        let dims = "const WIDTH: u32 = 700u;\nconst HEIGHT: u32 = 700u;\n";
        let err = KernelInterface::inspect(&kernel(dims, ARGS), "main", Resolution::new(4, 4))
            .unwrap_err();
        match err {
            CompileError::ResolutionMismatch { name, kernel, host } => {
                assert_eq!((name, kernel, host), ("WIDTH", 700, 4));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn undeclared_dimension_is_rejected() {
        let src = KernelSource::new(
            "test",
            format!("{ARGS}{}", BODY.replace("WIDTH * HEIGHT", "16u")),
        );
        let err = KernelInterface::inspect(&src, "main", Resolution::new(4, 4)).unwrap_err();
        assert!(matches!(err, CompileError::ResolutionUndeclared("WIDTH")));
    }

    #[test]
    fn syntax_error_carries_diagnostic() {
        let src = KernelSource::new("test", "fn broken( {");
        match KernelInterface::inspect(&src, "main", Resolution::new(4, 4)) {
            Err(CompileError::BuildFailed(diag)) => assert!(!diag.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn type_error_is_build_failure() {
        let src = KernelSource::new(
            "test",
            format!("{ARGS}{}{}", overrides(), BODY.replace("i32(id)", "id")),
        );
        let err = KernelInterface::inspect(&src, "main", Resolution::new(4, 4)).unwrap_err();
        assert!(matches!(err, CompileError::BuildFailed(_)));
    }

    #[test]
    fn missing_entry_point_is_distinct() {
        let err = KernelInterface::inspect(&kernel(overrides(), ARGS), "sampleKernel", Resolution::new(4, 4))
            .unwrap_err();
        match err {
            CompileError::EntryPointNotFound(name) => assert_eq!(name, "sampleKernel"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrong_argument_type_is_abi_mismatch() {
        let args = ARGS.replace(
            "var<uniform> orientation: vec2<f32>",
            "var<uniform> orientation: vec3<f32>",
        );
        let body_ok = kernel(overrides(), &args);
        match KernelInterface::inspect(&body_ok, "main", Resolution::new(4, 4)) {
            Err(CompileError::AbiMismatch { slot, .. }) => assert_eq!(slot, 4),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn read_only_output_is_abi_mismatch() {
        let args = ARGS.replace(
            "var<storage, read_write> out_b",
            "var<storage, read> out_b",
        );
        let src = KernelSource::new(
            "test",
            format!("{args}{}{}", overrides(), BODY.replace("out_b[id] = 255 - i32(id);", "")),
        );
        match KernelInterface::inspect(&src, "main", Resolution::new(4, 4)) {
            Err(CompileError::AbiMismatch { slot, .. }) => assert_eq!(slot, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrong_workgroup_size_is_rejected() {
        let src = KernelSource::new(
            "test",
            format!("{ARGS}{}{}", overrides(), BODY.replace("@workgroup_size(64)", "@workgroup_size(8, 8)")),
        );
        let err = KernelInterface::inspect(&src, "main", Resolution::new(4, 4)).unwrap_err();
        assert!(matches!(err, CompileError::WorkgroupSize { declared: [8, 8, 1], .. }));
    }
}
