use std::borrow::Cow;
use std::collections::HashMap;

use crate::backend::ShaderSource;
use crate::error::{ErrorCode, GpuError, GpuResult};

/// Named WGSL blobs handed to the renderer.
#[derive(Debug, Default, Clone)]
pub struct ShaderLibrary {
    shaders: HashMap<String, ShaderSource>,
}

impl ShaderLibrary {
    /// Shaders the frame pipeline looks up by name.
    pub const REQUIRED: [&'static str; 8] = [
        "scene",
        "sky",
        "shadow",
        "hiz_first",
        "hiz_reduce",
        "ssr",
        "composite",
        "brdf_lut",
    ];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        wgsl: impl Into<Cow<'static, str>>,
    ) -> &mut Self {
        let name = name.into();
        self.shaders.insert(
            name.to_string(),
            ShaderSource {
                name,
                wgsl: wgsl.into(),
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> GpuResult<&ShaderSource> {
        self.shaders.get(name).ok_or_else(|| {
            GpuError::new(ErrorCode::Internal, "shader lookup")
                .with_detail(format!("no shader named `{name}`"))
        })
    }

    /// Names from [`ShaderLibrary::REQUIRED`] that were never inserted.
    pub fn missing(&self) -> Vec<&'static str> {
        Self::REQUIRED
            .into_iter()
            .filter(|n| !self.shaders.contains_key(*n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_of_unknown_shader_is_an_error() {
        let mut lib = ShaderLibrary::new();
        lib.insert("scene", "// wgsl");
        assert_eq!(lib.get("scene").unwrap().wgsl, "// wgsl");

        let err = lib.get("sky").unwrap_err();
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(lib.missing().len(), 7);
    }
}
