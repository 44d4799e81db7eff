use std::path::Path;

use crate::error::CompileError;

/// Bundled Mandelbulb raymarcher, entry point `raymarch`.
const BUILTIN: &str = include_str!("../../kernels/raymarch.wgsl");

/// WGSL kernel text plus a label used in diagnostics.
#[derive(Debug, Clone)]
pub struct KernelSource {
    label: String,
    text: String,
}

impl KernelSource {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// Loads a kernel from a UTF-8 file, verbatim.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CompileError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CompileError::Source {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded kernel source {} ({} bytes)", path.display(), text.len());
        Ok(Self::new(path.display().to_string(), text))
    }

    /// The kernel shipped with the engine.
    pub fn builtin() -> Self {
        Self::new("builtin:raymarch.wgsl", BUILTIN)
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}
