//! Shared vocabulary for the device layer.
//!
//! Every enum here is crate-local: the rest of the crate never names a raw
//! GL constant. The glow backend translates these through `conversions`.

/// Binding target family of a texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    TwoD,
    TwoDMultisample,
    ThreeD,
}

/// Texel storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba16Float,
    Rgba32Float,
    Rgb32Float,
    /// Single-channel 32-bit float, used for depth targets.
    Float32,
}

impl TextureFormat {
    /// Channel layout + component type used when texels cross the CPU/GPU
    /// boundary in this format.
    pub fn transfer(self) -> PixelTransfer {
        match self {
            TextureFormat::Rgba8Unorm => PixelTransfer {
                layout: PixelLayout::Rgba,
                component: PixelComponent::U8,
            },
            TextureFormat::Rgba16Float => PixelTransfer {
                layout: PixelLayout::Rgba,
                component: PixelComponent::F16,
            },
            TextureFormat::Rgba32Float => PixelTransfer {
                layout: PixelLayout::Rgba,
                component: PixelComponent::F32,
            },
            TextureFormat::Rgb32Float => PixelTransfer {
                layout: PixelLayout::Rgb,
                component: PixelComponent::F32,
            },
            TextureFormat::Float32 => PixelTransfer {
                layout: PixelLayout::Depth,
                component: PixelComponent::F32,
            },
        }
    }

    pub fn bytes_per_texel(self) -> usize {
        let t = self.transfer();
        t.layout.channel_count() * t.component.byte_size()
    }
}

/// What a texture is rendered into. Determines attachment slot and the
/// readback mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureUsage {
    ColorTarget,
    DepthTarget,
}

/// Intent a buffer was created with. Binding a buffer against a different
/// intent is a contract violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Vertex data with the given byte stride between vertices.
    Vertex { stride: u32 },
    /// 32-bit index data.
    Index32,
}

/// Generic buffer binding targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

/// Framebuffer binding targets. `Both` binds read and draw at once; state
/// queries against `Both` report the draw binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    Read,
    Draw,
    Both,
}

/// Attachment slot within a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    Color(u32),
    Depth,
}

/// Which planes a framebuffer blit transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlitMask {
    Color,
    Depth,
}

/// Texture sampling filter (applied to both minification and magnification;
/// wrap is always clamp-to-edge in this layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Depth comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Memory visibility fences issued before dependent reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Barrier {
    /// All prior writes visible.
    All,
    /// Buffer updates visible.
    BufferUpdate,
}

/// Channel layout of a CPU-side texel transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgba,
    Rgb,
    Depth,
}

impl PixelLayout {
    pub fn channel_count(self) -> usize {
        match self {
            PixelLayout::Rgba => 4,
            PixelLayout::Rgb => 3,
            PixelLayout::Depth => 1,
        }
    }
}

/// Component type of a CPU-side texel transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelComponent {
    U8,
    F16,
    F32,
}

impl PixelComponent {
    pub fn byte_size(self) -> usize {
        match self {
            PixelComponent::U8 => 1,
            PixelComponent::F16 => 2,
            PixelComponent::F32 => 4,
        }
    }
}

/// Fully resolved texel transfer description for readbacks and uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelTransfer {
    pub layout: PixelLayout,
    pub component: PixelComponent,
}

impl PixelTransfer {
    /// The fixed transfer used for depth-target readbacks.
    pub fn depth() -> Self {
        PixelTransfer {
            layout: PixelLayout::Depth,
            component: PixelComponent::F32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_sizes_match_formats() {
        assert_eq!(TextureFormat::Rgba8Unorm.bytes_per_texel(), 4);
        assert_eq!(TextureFormat::Rgba16Float.bytes_per_texel(), 8);
        assert_eq!(TextureFormat::Rgba32Float.bytes_per_texel(), 16);
        assert_eq!(TextureFormat::Rgb32Float.bytes_per_texel(), 12);
        assert_eq!(TextureFormat::Float32.bytes_per_texel(), 4);
    }

    #[test]
    fn depth_transfer_is_single_float_channel() {
        let t = PixelTransfer::depth();
        assert_eq!(t.layout, PixelLayout::Depth);
        assert_eq!(t.component, PixelComponent::F32);
    }
}
