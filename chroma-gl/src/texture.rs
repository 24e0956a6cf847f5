//! Texture resources: an immutable descriptor plus one owned native id.

use std::sync::Arc;

use crate::device::GlApi;
use crate::types::{Filter, TextureFormat, TextureKind, TextureUsage};

/// The parameters that determine whether a cached texture must be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub label: &'static str,
    /// Width, height, depth/layer extent.
    pub dimensions: [i32; 3],
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub layer_count: u32,
    pub mip_levels: u32,
    pub sample_count: u32,
    pub filter: Filter,
}

impl TextureDesc {
    /// Flat 2-D color target, the common case for render targets.
    pub fn color_2d(label: &'static str, width: i32, height: i32, format: TextureFormat) -> Self {
        Self {
            label,
            dimensions: [width, height, 1],
            format,
            usage: TextureUsage::ColorTarget,
            layer_count: 1,
            mip_levels: 1,
            sample_count: 1,
            filter: Filter::Nearest,
        }
    }

    /// Binding target family implied by the descriptor.
    pub fn kind(&self) -> TextureKind {
        if self.sample_count > 1 {
            TextureKind::TwoDMultisample
        } else if self.dimensions[2] > 1 {
            TextureKind::ThreeD
        } else {
            TextureKind::TwoD
        }
    }
}

/// One native texture object. Identity is the native id; descriptor
/// mismatches are resolved by destroy-then-recreate, never in place.
#[derive(Debug)]
pub struct Texture {
    id: u32,
    desc: TextureDesc,
}

/// Shared handle: the same texture may be captured by several deferred
/// operations at once.
pub type TextureHandle = Arc<Texture>;

impl Texture {
    /// Allocate storage per `desc`. Leaves the ambient texture binding of
    /// the descriptor's target as it was. Storage and sampler state apply
    /// to flat 2-D targets; multisampled and 3-D objects get their storage
    /// through their own upload paths.
    pub fn create(gl: &dyn GlApi, desc: TextureDesc) -> Self {
        let kind = desc.kind();
        let prior = gl.bound_texture(kind);
        let id = gl.create_texture();
        gl.bind_texture(kind, id);
        if kind == TextureKind::TwoD {
            gl.set_texture_sampling(kind, desc.filter);
            gl.allocate_texture_2d(desc.format, desc.dimensions[0], desc.dimensions[1]);
        }
        gl.bind_texture(kind, prior);
        Self { id, desc }
    }

    /// Wrap a native object created elsewhere (e.g. a render-buffer
    /// registry handing in an output target). The wrapper takes ownership
    /// of nothing; `destroy` still deletes the id.
    pub fn from_raw(id: u32, desc: TextureDesc) -> Self {
        Self { id, desc }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn destroy(self, gl: &dyn GlApi) {
        gl.delete_texture(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingGl;

    #[test]
    fn create_restores_ambient_binding() {
        let gl = RecordingGl::new();
        let other = gl.create_texture();
        gl.bind_texture(TextureKind::TwoD, other);

        let tex = Texture::create(
            &gl,
            TextureDesc::color_2d("test", 64, 64, TextureFormat::Rgba8Unorm),
        );

        assert_ne!(tex.id(), other);
        assert_eq!(gl.bound_texture(TextureKind::TwoD), other);
    }

    #[test]
    fn kind_follows_descriptor_shape() {
        let mut desc = TextureDesc::color_2d("t", 8, 8, TextureFormat::Rgba8Unorm);
        assert_eq!(desc.kind(), TextureKind::TwoD);
        desc.sample_count = 4;
        assert_eq!(desc.kind(), TextureKind::TwoDMultisample);
        desc.sample_count = 1;
        desc.dimensions = [8, 8, 8];
        assert_eq!(desc.kind(), TextureKind::ThreeD);
    }
}
