//! Deferred GPU-operation layer over a stateful, global-state graphics API.
//!
//! The crate sits between a hardware-agnostic command model and the raw
//! API: descriptors are recorded as plain values ([`ops::GpuOp`]) and run
//! later against an explicit device context ([`device::GlApi`]), so the
//! API's ambient state never leaks into callers. Resource lifetimes follow
//! descriptor identity: create on first need, destroy-then-recreate on
//! mismatch, explicit teardown ([`cache`]).
//!
//! The production device is [`glow_backend::GlowDevice`]; tests run against
//! [`testing::RecordingGl`].

pub mod buffer;
pub mod cache;
pub mod conversions;
pub mod device;
pub mod framebuffer;
pub mod glow_backend;
pub mod ops;
pub mod pipeline;
pub mod program;
pub mod state;
pub mod testing;
pub mod texture;
pub mod types;

pub use buffer::{BufferDesc, BufferHandle, GpuBuffer};
pub use cache::{BufferSlot, FramebufferCache, TextureSlot};
pub use device::{GlApi, post_pending_errors};
pub use framebuffer::{
    AttachmentKey, BlendState, ColorAttachment, DepthAttachment, LoadOp, RenderPassDesc,
};
pub use glow_backend::GlowDevice;
pub use ops::{BufferUpload, ExecContext, GpuOp, MultisampleResolve, TextureReadback, submit};
pub use pipeline::{Pipeline, PipelineHandle, ResourceBindings, ResourceBindingsHandle};
pub use program::{Program, ProgramHandle, ShaderError};
pub use state::{DrawStateSnapshot, FramebufferBindings};
pub use texture::{Texture, TextureDesc, TextureHandle};
pub use types::{
    Attachment, Barrier, BlendFactor, BlendOp, BlitMask, BufferTarget, BufferUsage, CompareFunc,
    Filter, FramebufferTarget, PixelComponent, PixelLayout, PixelTransfer, ShaderStage,
    TextureFormat, TextureKind, TextureUsage,
};
