//! Mappings between the crate vocabulary and raw GL constants.
//!
//! Only the glow backend consumes these; nothing else in the workspace
//! names a GL constant.

use crate::types::{
    Attachment, Barrier, BlendFactor, BlendOp, BlitMask, BufferTarget, CompareFunc, Filter,
    FramebufferTarget, PixelComponent, PixelLayout, ShaderStage, TextureFormat, TextureKind,
};

pub fn texture_target(kind: TextureKind) -> u32 {
    match kind {
        TextureKind::TwoD => glow::TEXTURE_2D,
        TextureKind::TwoDMultisample => glow::TEXTURE_2D_MULTISAMPLE,
        TextureKind::ThreeD => glow::TEXTURE_3D,
    }
}

pub fn texture_binding_query(kind: TextureKind) -> u32 {
    match kind {
        TextureKind::TwoD => glow::TEXTURE_BINDING_2D,
        TextureKind::TwoDMultisample => glow::TEXTURE_BINDING_2D_MULTISAMPLE,
        TextureKind::ThreeD => glow::TEXTURE_BINDING_3D,
    }
}

pub fn internal_format(format: TextureFormat) -> u32 {
    match format {
        TextureFormat::Rgba8Unorm => glow::RGBA8,
        TextureFormat::Rgba16Float => glow::RGBA16F,
        TextureFormat::Rgba32Float => glow::RGBA32F,
        TextureFormat::Rgb32Float => glow::RGB32F,
        TextureFormat::Float32 => glow::DEPTH_COMPONENT32F,
    }
}

pub fn pixel_layout(layout: PixelLayout) -> u32 {
    match layout {
        PixelLayout::Rgba => glow::RGBA,
        PixelLayout::Rgb => glow::RGB,
        PixelLayout::Depth => glow::DEPTH_COMPONENT,
    }
}

pub fn pixel_component(component: PixelComponent) -> u32 {
    match component {
        PixelComponent::U8 => glow::UNSIGNED_BYTE,
        PixelComponent::F16 => glow::HALF_FLOAT,
        PixelComponent::F32 => glow::FLOAT,
    }
}

pub fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

pub fn framebuffer_target(target: FramebufferTarget) -> u32 {
    match target {
        FramebufferTarget::Read => glow::READ_FRAMEBUFFER,
        FramebufferTarget::Draw => glow::DRAW_FRAMEBUFFER,
        FramebufferTarget::Both => glow::FRAMEBUFFER,
    }
}

pub fn attachment_point(attachment: Attachment) -> u32 {
    match attachment {
        Attachment::Color(slot) => glow::COLOR_ATTACHMENT0 + slot,
        Attachment::Depth => glow::DEPTH_ATTACHMENT,
    }
}

pub fn blit_mask(mask: BlitMask) -> u32 {
    match mask {
        BlitMask::Color => glow::COLOR_BUFFER_BIT,
        BlitMask::Depth => glow::DEPTH_BUFFER_BIT,
    }
}

pub fn filter(filter: Filter) -> u32 {
    match filter {
        Filter::Nearest => glow::NEAREST,
        Filter::Linear => glow::LINEAR,
    }
}

pub fn compare_func(func: CompareFunc) -> u32 {
    match func {
        CompareFunc::Never => glow::NEVER,
        CompareFunc::Less => glow::LESS,
        CompareFunc::Equal => glow::EQUAL,
        CompareFunc::LessOrEqual => glow::LEQUAL,
        CompareFunc::Greater => glow::GREATER,
        CompareFunc::NotEqual => glow::NOTEQUAL,
        CompareFunc::GreaterOrEqual => glow::GEQUAL,
        CompareFunc::Always => glow::ALWAYS,
    }
}

/// Inverse of [`compare_func`], for state capture. Unknown values fall back
/// to `Less` (the API default).
pub fn compare_func_from_gl(value: u32) -> CompareFunc {
    match value {
        glow::NEVER => CompareFunc::Never,
        glow::LESS => CompareFunc::Less,
        glow::EQUAL => CompareFunc::Equal,
        glow::LEQUAL => CompareFunc::LessOrEqual,
        glow::GREATER => CompareFunc::Greater,
        glow::NOTEQUAL => CompareFunc::NotEqual,
        glow::GEQUAL => CompareFunc::GreaterOrEqual,
        glow::ALWAYS => CompareFunc::Always,
        _ => CompareFunc::Less,
    }
}

pub fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
    }
}

pub fn blend_op(op: BlendOp) -> u32 {
    match op {
        BlendOp::Add => glow::FUNC_ADD,
        BlendOp::Subtract => glow::FUNC_SUBTRACT,
        BlendOp::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        BlendOp::Min => glow::MIN,
        BlendOp::Max => glow::MAX,
    }
}

pub fn shader_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

pub fn barrier_bits(barrier: Barrier) -> u32 {
    match barrier {
        Barrier::All => glow::ALL_BARRIER_BITS,
        Barrier::BufferUpdate => glow::BUFFER_UPDATE_BARRIER_BIT,
    }
}
