//! Shader program compile + link.
//!
//! Compilation failures are values, not faults: the caller discards the
//! partial program and skips its frame.

use std::sync::Arc;

use crate::device::GlApi;
use crate::types::ShaderStage;

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("vertex shader compile failed: {0}")]
    VertexCompile(String),
    #[error("fragment shader compile failed: {0}")]
    FragmentCompile(String),
    #[error("program link failed: {0}")]
    Link(String),
}

#[derive(Debug)]
pub struct Program {
    id: u32,
}

pub type ProgramHandle = Arc<Program>;

impl Program {
    /// Compile vertex then fragment, then link. Any failure deletes the
    /// partial objects and surfaces the info log.
    pub fn build(
        gl: &dyn GlApi,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let vertex = gl
            .compile_shader(ShaderStage::Vertex, vertex_source)
            .map_err(ShaderError::VertexCompile)?;
        let fragment = match gl.compile_shader(ShaderStage::Fragment, fragment_source) {
            Ok(fragment) => fragment,
            Err(log) => {
                gl.delete_shader(vertex);
                return Err(ShaderError::FragmentCompile(log));
            }
        };
        let id = gl
            .link_program(&[vertex, fragment])
            .map_err(ShaderError::Link)?;
        Ok(Self { id })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn uniform_location(&self, gl: &dyn GlApi, name: &str) -> Option<i32> {
        gl.uniform_location(self.id, name)
    }

    pub fn attrib_location(&self, gl: &dyn GlApi, name: &str) -> Option<u32> {
        gl.attrib_location(self.id, name)
    }

    pub fn destroy(self, gl: &dyn GlApi) {
        gl.delete_program(self.id);
    }
}
