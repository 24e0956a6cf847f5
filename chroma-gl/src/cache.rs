//! Lazy create-or-reuse resource caching.
//!
//! A slot compares the requested descriptor against what it holds: equal
//! descriptors reuse the existing native object, anything else destroys the
//! old object and allocates a fresh one. All calls happen on the calling
//! thread; there is no internal synchronization.

use std::collections::HashMap;

use crate::buffer::{BufferDesc, GpuBuffer};
use crate::device::GlApi;
use crate::framebuffer::{AttachmentKey, RenderPassDesc};
use crate::texture::{Texture, TextureDesc};
use crate::types::Attachment;

/// One cached texture, rebuilt whenever the requested descriptor differs.
#[derive(Debug, Default)]
pub struct TextureSlot {
    texture: Option<Texture>,
}

impl TextureSlot {
    pub fn ensure(&mut self, gl: &dyn GlApi, desc: TextureDesc) -> &Texture {
        let rebuild = self.texture.as_ref().is_none_or(|t| t.desc() != &desc);
        if rebuild {
            if let Some(old) = self.texture.take() {
                old.destroy(gl);
            }
        }
        self.texture.get_or_insert_with(|| Texture::create(gl, desc))
    }

    pub fn get(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    pub fn destroy(&mut self, gl: &dyn GlApi) {
        if let Some(texture) = self.texture.take() {
            texture.destroy(gl);
        }
    }
}

/// One cached buffer. Created on first ensure; contents are uploaded only
/// when the caller explicitly asks the buffer to.
#[derive(Debug, Default)]
pub struct BufferSlot {
    buffer: Option<GpuBuffer>,
}

impl BufferSlot {
    pub fn ensure(&mut self, gl: &dyn GlApi, desc: BufferDesc) -> &GpuBuffer {
        let rebuild = self.buffer.as_ref().is_none_or(|b| b.desc() != &desc);
        if rebuild {
            if let Some(old) = self.buffer.take() {
                old.destroy(gl);
            }
        }
        self.buffer.get_or_insert_with(|| GpuBuffer::create(gl, desc))
    }

    pub fn get(&self) -> Option<&GpuBuffer> {
        self.buffer.as_ref()
    }

    /// True exactly when the next `ensure` with this descriptor would
    /// allocate, letting callers pair creation with a one-time upload.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_none()
    }

    pub fn destroy(&mut self, gl: &dyn GlApi) {
        if let Some(buffer) = self.buffer.take() {
            buffer.destroy(gl);
        }
    }
}

/// Native framebuffers keyed by attachment identity. Backs the
/// `BindFramebuffer` operation.
#[derive(Debug, Default)]
pub struct FramebufferCache {
    framebuffers: HashMap<AttachmentKey, u32>,
}

impl FramebufferCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the framebuffer matching the descriptor's attachment set,
    /// wiring up a new one on first sight.
    pub fn acquire(&mut self, gl: &dyn GlApi, desc: &RenderPassDesc) -> u32 {
        let key = desc.attachment_key();
        if let Some(&id) = self.framebuffers.get(&key) {
            return id;
        }

        let id = gl.create_framebuffer();
        for (slot, attachment) in desc.color_attachments.iter().enumerate() {
            gl.attach_framebuffer_texture(
                id,
                Attachment::Color(slot as u32),
                attachment.texture.desc().kind(),
                attachment.texture.id(),
            );
        }
        let draw_targets: Vec<Option<u32>> = if desc.color_attachments.is_empty() {
            vec![None]
        } else {
            (0..desc.color_attachments.len() as u32).map(Some).collect()
        };
        gl.set_framebuffer_draw_targets(id, &draw_targets);
        if let Some(depth) = &desc.depth_attachment {
            gl.attach_framebuffer_texture(
                id,
                Attachment::Depth,
                depth.texture.desc().kind(),
                depth.texture.id(),
            );
        }
        if !gl.framebuffer_complete(id) {
            tracing::warn!(label = desc.label, "acquired framebuffer is incomplete");
        }

        self.framebuffers.insert(key, id);
        id
    }

    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }

    /// Delete every cached framebuffer.
    pub fn clear(&mut self, gl: &dyn GlApi) {
        for (_, id) in self.framebuffers.drain() {
            gl.delete_framebuffer(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::{ColorAttachment, LoadOp};
    use crate::testing::RecordingGl;
    use crate::types::TextureFormat;
    use glam::Vec4;
    use std::sync::Arc;

    fn desc(width: i32, height: i32) -> TextureDesc {
        TextureDesc::color_2d("cache test", width, height, TextureFormat::Rgba16Float)
    }

    #[test]
    fn ensure_with_identical_descriptor_reuses_native_id() {
        let gl = RecordingGl::new();
        let mut slot = TextureSlot::default();
        let first = slot.ensure(&gl, desc(800, 600)).id();
        let second = slot.ensure(&gl, desc(800, 600)).id();
        assert_eq!(first, second);
        assert!(gl.deleted_textures().is_empty());
    }

    #[test]
    fn ensure_with_differing_size_destroys_then_recreates() {
        let gl = RecordingGl::new();
        let mut slot = TextureSlot::default();
        let first = slot.ensure(&gl, desc(800, 600)).id();
        let second = slot.ensure(&gl, desc(1920, 1080)).id();
        assert_ne!(first, second);
        assert_eq!(gl.deleted_textures(), vec![first]);
    }

    #[test]
    fn framebuffer_cache_is_keyed_by_attachment_identity() {
        let gl = RecordingGl::new();
        let mut cache = FramebufferCache::new();
        let texture_a = Arc::new(Texture::create(&gl, desc(64, 64)));
        let texture_b = Arc::new(Texture::create(&gl, desc(64, 64)));

        let pass = |texture: &Arc<Texture>| RenderPassDesc {
            label: "pass",
            color_attachments: vec![ColorAttachment {
                texture: texture.clone(),
                load: LoadOp::Clear,
                clear_value: Vec4::ZERO,
                blend: None,
            }],
            depth_attachment: None,
        };

        let fb_a = cache.acquire(&gl, &pass(&texture_a));
        let fb_a_again = cache.acquire(&gl, &pass(&texture_a));
        let fb_b = cache.acquire(&gl, &pass(&texture_b));
        assert_eq!(fb_a, fb_a_again);
        assert_ne!(fb_a, fb_b);
        assert_eq!(cache.len(), 2);

        cache.clear(&gl);
        assert!(cache.is_empty());
        assert_eq!(gl.deleted_framebuffers().len(), 2);
    }
}
