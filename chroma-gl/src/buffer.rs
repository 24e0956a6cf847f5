//! Buffer resources. Created once; contents are re-uploaded only when a
//! caller explicitly asks.

use std::sync::Arc;

use crate::device::GlApi;
use crate::types::{BufferTarget, BufferUsage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    pub label: &'static str,
    pub usage: BufferUsage,
    pub byte_size: usize,
}

#[derive(Debug)]
pub struct GpuBuffer {
    id: u32,
    desc: BufferDesc,
}

pub type BufferHandle = Arc<GpuBuffer>;

impl GpuBuffer {
    pub fn create(gl: &dyn GlApi, desc: BufferDesc) -> Self {
        let id = gl.create_buffer();
        Self { id, desc }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    /// Declared per-vertex stride, when this is a vertex buffer.
    pub fn vertex_stride(&self) -> Option<u32> {
        match self.desc.usage {
            BufferUsage::Vertex { stride } => Some(stride),
            BufferUsage::Index32 => None,
        }
    }

    /// Replace the buffer contents wholesale. Leaves the array binding
    /// cleared, matching a one-shot upload.
    pub fn upload(&self, gl: &dyn GlApi, data: &[u8]) {
        gl.bind_buffer(BufferTarget::Array, self.id);
        gl.buffer_data(BufferTarget::Array, data);
        gl.bind_buffer(BufferTarget::Array, 0);
    }

    pub fn destroy(self, gl: &dyn GlApi) {
        gl.delete_buffer(self.id);
    }
}
