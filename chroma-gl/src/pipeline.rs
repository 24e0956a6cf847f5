//! Pipeline and resource-binding values.
//!
//! Both are plain descriptors with their own bind behavior; the deferred
//! `BindPipeline` / `BindResources` operations delegate here.

use std::sync::Arc;

use crate::device::GlApi;
use crate::program::ProgramHandle;
use crate::texture::TextureHandle;
use crate::types::CompareFunc;

/// Fixed-function state bundled with a program.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub label: &'static str,
    pub program: Option<ProgramHandle>,
    pub depth_write: bool,
    pub depth_compare: CompareFunc,
}

pub type PipelineHandle = Arc<Pipeline>;

impl Pipeline {
    pub fn bind(&self, gl: &dyn GlApi) {
        if let Some(program) = &self.program {
            gl.use_program(program.id());
        }
        gl.set_depth_write_mask(self.depth_write);
        gl.set_depth_compare(self.depth_compare);
    }
}

/// A texture bound to a sampler unit.
#[derive(Debug, Clone)]
pub struct TextureBinding {
    pub unit: u32,
    pub texture: TextureHandle,
}

/// The set of shader-visible resources for a draw.
#[derive(Debug, Clone, Default)]
pub struct ResourceBindings {
    pub label: &'static str,
    pub textures: Vec<TextureBinding>,
}

pub type ResourceBindingsHandle = Arc<ResourceBindings>;

impl ResourceBindings {
    pub fn bind(&self, gl: &dyn GlApi) {
        for binding in &self.textures {
            gl.set_active_texture_unit(binding.unit);
            gl.bind_texture(binding.texture.desc().kind(), binding.texture.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Program;
    use crate::testing::RecordingGl;
    use crate::texture::{Texture, TextureDesc};
    use crate::types::{TextureFormat, TextureKind};

    #[test]
    fn pipeline_bind_applies_program_and_depth_state() {
        let gl = RecordingGl::new();
        let program = Arc::new(Program::build(&gl, "void main() {}", "void main() {}").unwrap());
        let pipeline = Pipeline {
            label: "grade pipeline",
            program: Some(program),
            depth_write: false,
            depth_compare: CompareFunc::Always,
        };
        pipeline.bind(&gl);
        assert!(!gl.depth_write_mask());
        assert_eq!(gl.depth_compare(), CompareFunc::Always);
    }

    #[test]
    fn resource_bindings_bind_each_unit() {
        let gl = RecordingGl::new();
        let texture = Arc::new(Texture::create(
            &gl,
            TextureDesc::color_2d("bound", 4, 4, TextureFormat::Rgba8Unorm),
        ));
        let bindings = ResourceBindings {
            label: "draw resources",
            textures: vec![TextureBinding {
                unit: 2,
                texture: texture.clone(),
            }],
        };
        bindings.bind(&gl);
        assert_eq!(gl.active_texture_unit(), 2);
        assert_eq!(gl.bound_texture(TextureKind::TwoD), texture.id());
    }
}
