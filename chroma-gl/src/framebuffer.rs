//! Render-pass descriptors and framebuffer attachment identity.

use glam::Vec4;

use crate::texture::TextureHandle;
use crate::types::{BlendFactor, BlendOp};

/// What to do with an attachment's existing contents when it is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    /// Preserve the existing contents.
    Load,
    /// Clear to the attachment's clear value.
    Clear,
}

/// Per-attachment blend configuration. Absent blend means the attachment
/// does not blend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlendState {
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub color_op: BlendOp,
    pub alpha_op: BlendOp,
}

impl BlendState {
    /// Classic premultiplied-alpha-style blending.
    pub fn alpha() -> Self {
        Self {
            src_color: BlendFactor::SrcAlpha,
            dst_color: BlendFactor::OneMinusSrcAlpha,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::OneMinusSrcAlpha,
            color_op: BlendOp::Add,
            alpha_op: BlendOp::Add,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColorAttachment {
    pub texture: TextureHandle,
    pub load: LoadOp,
    pub clear_value: Vec4,
    pub blend: Option<BlendState>,
}

#[derive(Debug, Clone)]
pub struct DepthAttachment {
    pub texture: TextureHandle,
    pub load: LoadOp,
    pub clear_value: f32,
}

/// Everything a `BindFramebuffer` operation needs: the attachment set plus
/// per-attachment load and blend policy.
#[derive(Debug, Clone, Default)]
pub struct RenderPassDesc {
    pub label: &'static str,
    pub color_attachments: Vec<ColorAttachment>,
    pub depth_attachment: Option<DepthAttachment>,
}

impl RenderPassDesc {
    pub fn has_attachments(&self) -> bool {
        !self.color_attachments.is_empty() || self.depth_attachment.is_some()
    }

    /// Identity of the attachment set; two descriptors with equal keys may
    /// share one native framebuffer.
    pub fn attachment_key(&self) -> AttachmentKey {
        AttachmentKey {
            colors: self
                .color_attachments
                .iter()
                .map(|a| a.texture.id())
                .collect(),
            depth: self.depth_attachment.as_ref().map(|a| a.texture.id()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttachmentKey {
    pub colors: Vec<u32>,
    pub depth: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{Texture, TextureDesc};
    use crate::types::TextureFormat;
    use std::sync::Arc;

    fn texture(id: u32) -> TextureHandle {
        Arc::new(Texture::from_raw(
            id,
            TextureDesc::color_2d("t", 16, 16, TextureFormat::Rgba8Unorm),
        ))
    }

    #[test]
    fn attachment_key_tracks_texture_identity() {
        let a = RenderPassDesc {
            label: "pass",
            color_attachments: vec![ColorAttachment {
                texture: texture(7),
                load: LoadOp::Load,
                clear_value: Vec4::ZERO,
                blend: None,
            }],
            depth_attachment: None,
        };
        let mut b = a.clone();
        assert_eq!(a.attachment_key(), b.attachment_key());

        b.color_attachments[0].texture = texture(8);
        assert_ne!(a.attachment_key(), b.attachment_key());
    }

    #[test]
    fn empty_desc_has_no_attachments() {
        assert!(!RenderPassDesc::default().has_attachments());
    }
}
