//! Deferred GPU operations.
//!
//! A [`GpuOp`] is an immutable descriptor owning only value types and
//! shared resource handles; it performs no API call until `execute` runs it
//! against an explicit [`ExecContext`]. Ordering is entirely the caller's:
//! an encoder records descriptors while walking its passes and flushes them
//! later with [`submit`].
//!
//! Contract violations (mismatched counts, wrong usage intent, exceeded
//! layer ranges) are reported and the offending operation becomes a no-op;
//! they never abort the surrounding frame.

use std::sync::{Arc, Mutex};

use glam::IVec4;

use crate::buffer::BufferHandle;
use crate::cache::FramebufferCache;
use crate::device::{GlApi, post_pending_errors};
use crate::framebuffer::{LoadOp, RenderPassDesc};
use crate::pipeline::{PipelineHandle, ResourceBindingsHandle};
use crate::state::FramebufferBindings;
use crate::texture::TextureHandle;
use crate::types::{
    Attachment, Barrier, BlitMask, BufferTarget, Filter, FramebufferTarget, PixelTransfer,
    TextureFormat, TextureKind, TextureUsage,
};

/// Texture → CPU readback descriptor.
#[derive(Debug, Clone)]
pub struct TextureReadback {
    pub source: Option<TextureHandle>,
    pub mip_level: i32,
    pub texel_offset: [i32; 3],
    pub start_layer: u32,
    pub layer_count: u32,
    /// Shared byte sink; its current length is the destination capacity.
    pub destination: Arc<Mutex<Vec<u8>>>,
}

/// CPU → buffer upload descriptor.
#[derive(Debug, Clone)]
pub struct BufferUpload {
    pub source: Option<Arc<Vec<u8>>>,
    pub source_offset: usize,
    pub destination: Option<BufferHandle>,
    pub destination_offset: i32,
    pub byte_size: usize,
}

/// Multisample → single-sample resolve descriptor. Regions are
/// `[x0, y0, x1, y1]`.
#[derive(Debug, Clone)]
pub struct MultisampleResolve {
    pub source: Option<TextureHandle>,
    pub destination: Option<TextureHandle>,
    pub usage: TextureUsage,
    pub source_region: IVec4,
    pub destination_region: IVec4,
}

/// Everything `execute` may touch besides the descriptor itself.
pub struct ExecContext<'a> {
    pub gl: &'a dyn GlApi,
    pub framebuffers: &'a mut FramebufferCache,
}

#[derive(Debug, Clone)]
pub enum GpuOp {
    PushDebugGroup {
        label: String,
    },
    PopDebugGroup,
    CopyTextureToHost(TextureReadback),
    CopyHostToBuffer(BufferUpload),
    ResolveMultisample(MultisampleResolve),
    SetViewport {
        rect: IVec4,
    },
    SetScissor {
        rect: IVec4,
    },
    BindPipeline {
        pipeline: Option<PipelineHandle>,
    },
    BindResources {
        bindings: Option<ResourceBindingsHandle>,
    },
    BindVertexBuffers {
        first_binding: u32,
        vertex_buffers: Vec<BufferHandle>,
        byte_offsets: Vec<u32>,
    },
    DrawIndexed {
        index_buffer: BufferHandle,
        index_count: u32,
        index_byte_offset: u32,
        base_vertex: u32,
        instance_count: u32,
        /// Carried for completeness; the draw entry point has no
        /// base-instance form.
        first_instance: u32,
    },
    BindFramebuffer {
        desc: RenderPassDesc,
    },
}

impl GpuOp {
    pub fn name(&self) -> &'static str {
        match self {
            GpuOp::PushDebugGroup { .. } => "push_debug_group",
            GpuOp::PopDebugGroup => "pop_debug_group",
            GpuOp::CopyTextureToHost(_) => "copy_texture_to_host",
            GpuOp::CopyHostToBuffer(_) => "copy_host_to_buffer",
            GpuOp::ResolveMultisample(_) => "resolve_multisample",
            GpuOp::SetViewport { .. } => "set_viewport",
            GpuOp::SetScissor { .. } => "set_scissor",
            GpuOp::BindPipeline { .. } => "bind_pipeline",
            GpuOp::BindResources { .. } => "bind_resources",
            GpuOp::BindVertexBuffers { .. } => "bind_vertex_buffers",
            GpuOp::DrawIndexed { .. } => "draw_indexed",
            GpuOp::BindFramebuffer { .. } => "bind_framebuffer",
        }
    }

    pub fn execute(&self, ctx: &mut ExecContext) {
        let gl = ctx.gl;
        match self {
            GpuOp::PushDebugGroup { label } => gl.push_debug_group(label),
            GpuOp::PopDebugGroup => gl.pop_debug_group(),
            GpuOp::CopyTextureToHost(op) => copy_texture_to_host(gl, op),
            GpuOp::CopyHostToBuffer(op) => copy_host_to_buffer(gl, op),
            GpuOp::ResolveMultisample(op) => resolve_multisample(gl, op),
            GpuOp::SetViewport { rect } => gl.set_viewport(rect.to_array()),
            GpuOp::SetScissor { rect } => gl.set_scissor(rect.to_array()),
            GpuOp::BindPipeline { pipeline } => {
                if let Some(pipeline) = pipeline {
                    pipeline.bind(gl);
                }
            }
            GpuOp::BindResources { bindings } => {
                if let Some(bindings) = bindings {
                    bindings.bind(gl);
                }
            }
            GpuOp::BindVertexBuffers {
                first_binding,
                vertex_buffers,
                byte_offsets,
            } => bind_vertex_buffers(gl, *first_binding, vertex_buffers, byte_offsets),
            GpuOp::DrawIndexed {
                index_buffer,
                index_count,
                index_byte_offset,
                base_vertex,
                instance_count,
                first_instance: _,
            } => draw_indexed(
                gl,
                index_buffer,
                *index_count,
                *index_byte_offset,
                *base_vertex,
                *instance_count,
            ),
            GpuOp::BindFramebuffer { desc } => bind_framebuffer(ctx, desc),
        }
    }
}

/// Run a recorded sequence in order, draining device errors after each
/// operation group.
pub fn submit(ops: &[GpuOp], ctx: &mut ExecContext) {
    for op in ops {
        op.execute(ctx);
        post_pending_errors(ctx.gl, op.name());
    }
}

fn copy_texture_to_host(gl: &dyn GlApi, op: &TextureReadback) {
    let Some(texture) = &op.source else {
        tracing::error!("invalid texture handle for readback");
        return;
    };
    if texture.id() == 0 {
        tracing::error!("invalid texture handle for readback");
        return;
    }
    let Ok(mut destination) = op.destination.lock() else {
        tracing::warn!("readback destination is poisoned (aborted)");
        return;
    };
    if destination.is_empty() {
        tracing::warn!("the size of the data to copy was zero (aborted)");
        return;
    }

    let desc = texture.desc();
    if desc.layer_count < op.start_layer + op.layer_count {
        tracing::error!(
            layer_count = desc.layer_count,
            requested = op.start_layer + op.layer_count,
            "texture has fewer layers than attempted to be copied"
        );
        return;
    }

    let transfer = match desc.usage {
        TextureUsage::ColorTarget => desc.format.transfer(),
        TextureUsage::DepthTarget => {
            if desc.format != TextureFormat::Float32 {
                tracing::error!(format = ?desc.format, "depth readback expects a 32-bit float target");
            }
            PixelTransfer::depth()
        }
    };

    // All prior writes must land before the device round-trip reads them.
    gl.memory_barrier(Barrier::All);
    gl.read_texture(
        texture.id(),
        op.mip_level,
        op.texel_offset,
        desc.dimensions,
        transfer,
        destination.as_mut_slice(),
    );
}

fn copy_host_to_buffer(gl: &dyn GlApi, op: &BufferUpload) {
    let (Some(source), Some(destination)) = (&op.source, &op.destination) else {
        return;
    };
    if op.byte_size == 0 {
        return;
    }
    let end = op.source_offset + op.byte_size;
    if end > source.len() {
        tracing::error!(
            end,
            available = source.len(),
            "host copy range exceeds source buffer"
        );
        return;
    }

    gl.buffer_sub_data(
        destination.id(),
        op.destination_offset,
        &source[op.source_offset..end],
    );
    // The copy must be visible before any read from the buffer.
    gl.memory_barrier(Barrier::BufferUpdate);
}

/// Wire both transient framebuffers for the resolve. Every attachment slot
/// must end up with a defined value, so the unused slot is explicitly
/// cleared on both sides.
fn configure_resolve(
    gl: &dyn GlApi,
    op: &MultisampleResolve,
    read_fb: u32,
    write_fb: u32,
) -> bool {
    let (Some(source), Some(destination)) = (&op.source, &op.destination) else {
        tracing::error!("no textures provided for resolve");
        return false;
    };

    if op.usage == TextureUsage::DepthTarget {
        gl.set_framebuffer_draw_targets(read_fb, &[None]);
        gl.set_framebuffer_draw_targets(write_fb, &[None]);
        gl.attach_framebuffer_texture(read_fb, Attachment::Color(0), TextureKind::TwoD, 0);
        gl.attach_framebuffer_texture(write_fb, Attachment::Color(0), TextureKind::TwoD, 0);
        gl.attach_framebuffer_texture(
            read_fb,
            Attachment::Depth,
            source.desc().kind(),
            source.id(),
        );
        gl.attach_framebuffer_texture(
            write_fb,
            Attachment::Depth,
            destination.desc().kind(),
            destination.id(),
        );
    } else {
        gl.set_framebuffer_draw_targets(read_fb, &[Some(0)]);
        gl.set_framebuffer_draw_targets(write_fb, &[Some(0)]);
        gl.attach_framebuffer_texture(read_fb, Attachment::Depth, TextureKind::TwoD, 0);
        gl.attach_framebuffer_texture(write_fb, Attachment::Depth, TextureKind::TwoD, 0);
        gl.attach_framebuffer_texture(
            read_fb,
            Attachment::Color(0),
            source.desc().kind(),
            source.id(),
        );
        gl.attach_framebuffer_texture(
            write_fb,
            Attachment::Color(0),
            destination.desc().kind(),
            destination.id(),
        );
    }

    if !gl.framebuffer_complete(read_fb) {
        tracing::error!("resolve read framebuffer is incomplete");
        return false;
    }
    if !gl.framebuffer_complete(write_fb) {
        tracing::error!("resolve write framebuffer is incomplete");
        return false;
    }
    true
}

fn resolve_multisample(gl: &dyn GlApi, op: &MultisampleResolve) {
    let read_fb = gl.create_framebuffer();
    let write_fb = gl.create_framebuffer();

    if configure_resolve(gl, op, read_fb, write_fb) {
        let mask = if op.usage == TextureUsage::DepthTarget {
            BlitMask::Depth
        } else {
            BlitMask::Color
        };

        let prior = FramebufferBindings::capture(gl);
        gl.bind_framebuffer(FramebufferTarget::Read, read_fb);
        gl.bind_framebuffer(FramebufferTarget::Draw, write_fb);
        gl.blit_framebuffer(
            op.source_region.to_array(),
            op.destination_region.to_array(),
            mask,
            Filter::Nearest,
        );
        prior.restore(gl);
    }

    // Transients go away on every path, verification failures included.
    gl.delete_framebuffer(read_fb);
    gl.delete_framebuffer(write_fb);
}

fn bind_vertex_buffers(
    gl: &dyn GlApi,
    first_binding: u32,
    vertex_buffers: &[BufferHandle],
    byte_offsets: &[u32],
) {
    if byte_offsets.len() != vertex_buffers.len() {
        tracing::error!(
            buffers = vertex_buffers.len(),
            offsets = byte_offsets.len(),
            "vertex buffer and byte offset counts differ"
        );
        return;
    }

    for (i, buffer) in vertex_buffers.iter().enumerate() {
        let Some(stride) = buffer.vertex_stride() else {
            tracing::error!(label = buffer.desc().label, "buffer was not created for vertex use");
            continue;
        };
        gl.bind_vertex_buffer(
            first_binding + i as u32,
            buffer.id(),
            byte_offsets[i] as i32,
            stride as i32,
        );
    }
}

fn draw_indexed(
    gl: &dyn GlApi,
    index_buffer: &BufferHandle,
    index_count: u32,
    index_byte_offset: u32,
    base_vertex: u32,
    instance_count: u32,
) {
    if instance_count == 0 {
        tracing::error!("indexed draw requires a positive instance count");
        return;
    }
    if index_buffer.desc().usage != crate::types::BufferUsage::Index32 {
        tracing::error!(
            label = index_buffer.desc().label,
            "index buffer was not created for 32-bit index use"
        );
        return;
    }

    gl.bind_buffer(BufferTarget::ElementArray, index_buffer.id());
    gl.draw_indexed(
        index_count as i32,
        index_byte_offset as i32,
        instance_count as i32,
        base_vertex as i32,
    );
}

fn bind_framebuffer(ctx: &mut ExecContext, desc: &RenderPassDesc) {
    if !desc.has_attachments() {
        tracing::error!(label = desc.label, "missing attachments");
        return;
    }

    let gl = ctx.gl;
    let framebuffer = ctx.framebuffers.acquire(gl, desc);
    gl.bind_framebuffer(FramebufferTarget::Both, framebuffer);

    let mut blend_enabled = false;
    for (slot, attachment) in desc.color_attachments.iter().enumerate() {
        if attachment.load == LoadOp::Clear {
            gl.clear_color_attachment(slot as u32, attachment.clear_value.to_array());
        }
        if let Some(blend) = &attachment.blend {
            blend_enabled = true;
            gl.set_blend_func(
                slot as u32,
                blend.src_color,
                blend.dst_color,
                blend.src_alpha,
                blend.dst_alpha,
            );
            gl.set_blend_equation(slot as u32, blend.color_op, blend.alpha_op);
        }
    }

    if let Some(depth) = &desc.depth_attachment {
        if depth.load == LoadOp::Clear {
            gl.clear_depth_attachment(depth.clear_value);
        }
    }

    gl.set_blend_enabled(blend_enabled);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BufferDesc, GpuBuffer};
    use crate::framebuffer::{BlendState, ColorAttachment, DepthAttachment};
    use crate::testing::RecordingGl;
    use crate::texture::{Texture, TextureDesc};
    use crate::types::BufferUsage;
    use glam::Vec4;

    fn color_texture(gl: &RecordingGl, width: i32, height: i32) -> TextureHandle {
        Arc::new(Texture::create(
            gl,
            TextureDesc::color_2d("op test color", width, height, TextureFormat::Rgba16Float),
        ))
    }

    fn vertex_buffer(gl: &RecordingGl) -> BufferHandle {
        Arc::new(GpuBuffer::create(
            gl,
            BufferDesc {
                label: "op test verts",
                usage: BufferUsage::Vertex { stride: 24 },
                byte_size: 96,
            },
        ))
    }

    fn index_buffer(gl: &RecordingGl) -> BufferHandle {
        Arc::new(GpuBuffer::create(
            gl,
            BufferDesc {
                label: "op test indices",
                usage: BufferUsage::Index32,
                byte_size: 96,
            },
        ))
    }

    fn run(gl: &RecordingGl, op: GpuOp) {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut framebuffers = FramebufferCache::new();
        let mut ctx = ExecContext { gl, framebuffers: &mut framebuffers };
        op.execute(&mut ctx);
    }

    #[test]
    fn zero_byte_host_copy_touches_no_device_state() {
        let gl = RecordingGl::new();
        let destination = index_buffer(&gl);
        gl.clear_calls();

        run(
            &gl,
            GpuOp::CopyHostToBuffer(BufferUpload {
                source: Some(Arc::new(vec![1, 2, 3])),
                source_offset: 0,
                destination: Some(destination),
                destination_offset: 0,
                byte_size: 0,
            }),
        );
        assert_eq!(gl.call_count(), 0);
    }

    #[test]
    fn host_copy_uploads_and_fences() {
        let gl = RecordingGl::new();
        let destination = vertex_buffer(&gl);
        let source: Vec<u8> = (0..64).collect();
        run(
            &gl,
            GpuOp::CopyHostToBuffer(BufferUpload {
                source: Some(Arc::new(source.clone())),
                source_offset: 16,
                destination: Some(destination.clone()),
                destination_offset: 8,
                byte_size: 32,
            }),
        );
        assert_eq!(gl.buffer_contents(destination.id(), 8, 32), source[16..48].to_vec());
        assert_eq!(gl.count_calls("memory_barrier"), 1);
    }

    #[test]
    fn readback_with_zero_capacity_is_a_warned_no_op() {
        let gl = RecordingGl::new();
        let source = color_texture(&gl, 4, 4);
        gl.clear_calls();

        run(
            &gl,
            GpuOp::CopyTextureToHost(TextureReadback {
                source: Some(source),
                mip_level: 0,
                texel_offset: [0; 3],
                start_layer: 0,
                layer_count: 1,
                destination: Arc::new(Mutex::new(Vec::new())),
            }),
        );
        assert_eq!(gl.count_calls("read_texture"), 0);
        assert_eq!(gl.count_calls("memory_barrier"), 0);
    }

    #[test]
    fn readback_rejects_excess_layer_range() {
        let gl = RecordingGl::new();
        let source = color_texture(&gl, 4, 4);

        run(
            &gl,
            GpuOp::CopyTextureToHost(TextureReadback {
                source: Some(source),
                mip_level: 0,
                texel_offset: [0; 3],
                start_layer: 1,
                layer_count: 1,
                destination: Arc::new(Mutex::new(vec![0u8; 256])),
            }),
        );
        assert_eq!(gl.count_calls("read_texture"), 0);
    }

    #[test]
    fn readback_fences_before_reading() {
        let gl = RecordingGl::new();
        let source = color_texture(&gl, 4, 4);

        run(
            &gl,
            GpuOp::CopyTextureToHost(TextureReadback {
                source: Some(source),
                mip_level: 0,
                texel_offset: [0; 3],
                start_layer: 0,
                layer_count: 1,
                destination: Arc::new(Mutex::new(vec![0u8; 4 * 4 * 8])),
            }),
        );
        let calls = gl.calls();
        let barrier = calls.iter().position(|c| c == "memory_barrier");
        let read = calls.iter().position(|c| c == "read_texture");
        assert!(barrier.is_some() && read.is_some());
        assert!(barrier < read);
    }

    #[test]
    fn draw_indexed_rejects_zero_instances() {
        let gl = RecordingGl::new();
        let indices = index_buffer(&gl);
        gl.clear_calls();

        run(
            &gl,
            GpuOp::DrawIndexed {
                index_buffer: indices,
                index_count: 6,
                index_byte_offset: 0,
                base_vertex: 0,
                instance_count: 0,
                first_instance: 0,
            },
        );
        assert_eq!(gl.count_calls("draw_indexed"), 0);
    }

    #[test]
    fn draw_indexed_requires_index_usage_intent() {
        let gl = RecordingGl::new();
        let not_indices = vertex_buffer(&gl);
        gl.clear_calls();

        run(
            &gl,
            GpuOp::DrawIndexed {
                index_buffer: not_indices,
                index_count: 6,
                index_byte_offset: 0,
                base_vertex: 0,
                instance_count: 1,
                first_instance: 0,
            },
        );
        assert_eq!(gl.count_calls("draw_indexed"), 0);
    }

    #[test]
    fn bind_vertex_buffers_rejects_count_mismatch() {
        let gl = RecordingGl::new();
        let buffer = vertex_buffer(&gl);
        gl.clear_calls();

        run(
            &gl,
            GpuOp::BindVertexBuffers {
                first_binding: 0,
                vertex_buffers: vec![buffer],
                byte_offsets: vec![0, 16],
            },
        );
        assert_eq!(gl.count_calls("bind_vertex_buffer"), 0);
    }

    #[test]
    fn bind_vertex_buffers_uses_sequential_bindings() {
        let gl = RecordingGl::new();
        let a = vertex_buffer(&gl);
        let b = vertex_buffer(&gl);

        run(
            &gl,
            GpuOp::BindVertexBuffers {
                first_binding: 2,
                vertex_buffers: vec![a.clone(), b.clone()],
                byte_offsets: vec![0, 48],
            },
        );
        assert_eq!(gl.vertex_binding(2), Some((a.id(), 0, 24)));
        assert_eq!(gl.vertex_binding(3), Some((b.id(), 48, 24)));
    }

    #[test]
    fn resolve_destroys_transients_and_restores_bindings() {
        let gl = RecordingGl::new();
        let mut source_desc =
            TextureDesc::color_2d("ms source", 64, 64, TextureFormat::Rgba16Float);
        source_desc.sample_count = 4;
        let source = Arc::new(Texture::create(&gl, source_desc));
        let destination = color_texture(&gl, 64, 64);

        let prior_read = gl.create_framebuffer();
        let prior_draw = gl.create_framebuffer();
        gl.bind_framebuffer(FramebufferTarget::Read, prior_read);
        gl.bind_framebuffer(FramebufferTarget::Draw, prior_draw);
        let live_before = gl.live_framebuffer_count();

        run(
            &gl,
            GpuOp::ResolveMultisample(MultisampleResolve {
                source: Some(source),
                destination: Some(destination),
                usage: TextureUsage::ColorTarget,
                source_region: IVec4::new(0, 0, 64, 64),
                destination_region: IVec4::new(0, 0, 64, 64),
            }),
        );

        assert_eq!(gl.count_calls("blit_framebuffer"), 1);
        assert_eq!(gl.live_framebuffer_count(), live_before);
        assert_eq!(gl.bound_framebuffer(FramebufferTarget::Read), prior_read);
        assert_eq!(gl.bound_framebuffer(FramebufferTarget::Draw), prior_draw);
    }

    #[test]
    fn resolve_without_textures_still_destroys_transients() {
        let gl = RecordingGl::new();
        let live_before = gl.live_framebuffer_count();

        run(
            &gl,
            GpuOp::ResolveMultisample(MultisampleResolve {
                source: None,
                destination: None,
                usage: TextureUsage::ColorTarget,
                source_region: IVec4::ZERO,
                destination_region: IVec4::ZERO,
            }),
        );
        assert_eq!(gl.count_calls("blit_framebuffer"), 0);
        assert_eq!(gl.live_framebuffer_count(), live_before);
    }

    #[test]
    fn bind_framebuffer_applies_clears_and_blend_union() {
        let gl = RecordingGl::new();
        let opaque = color_texture(&gl, 32, 32);
        let blended = color_texture(&gl, 32, 32);
        let depth = Arc::new(Texture::create(&gl, {
            let mut d = TextureDesc::color_2d("depth", 32, 32, TextureFormat::Float32);
            d.usage = TextureUsage::DepthTarget;
            d
        }));

        let desc = RenderPassDesc {
            label: "main pass",
            color_attachments: vec![
                ColorAttachment {
                    texture: opaque,
                    load: LoadOp::Clear,
                    clear_value: Vec4::new(0.1, 0.2, 0.3, 1.0),
                    blend: None,
                },
                ColorAttachment {
                    texture: blended,
                    load: LoadOp::Load,
                    clear_value: Vec4::ZERO,
                    blend: Some(BlendState::alpha()),
                },
            ],
            depth_attachment: Some(DepthAttachment {
                texture: depth,
                load: LoadOp::Clear,
                clear_value: 1.0,
            }),
        };

        let mut framebuffers = FramebufferCache::new();
        let mut ctx = ExecContext { gl: &gl, framebuffers: &mut framebuffers };
        GpuOp::BindFramebuffer { desc: desc.clone() }.execute(&mut ctx);

        assert!(gl.blend_enabled());
        assert_eq!(gl.count_calls("clear_color_attachment"), 1);
        assert_eq!(gl.count_calls("clear_depth_attachment"), 1);
        assert_eq!(gl.count_calls("set_blend_func"), 1);
        let first = gl.bound_framebuffer(FramebufferTarget::Draw);

        // Same attachment identity reuses the cached native framebuffer.
        GpuOp::BindFramebuffer { desc }.execute(&mut ctx);
        assert_eq!(gl.bound_framebuffer(FramebufferTarget::Draw), first);
        assert_eq!(framebuffers.len(), 1);
    }

    #[test]
    fn bind_framebuffer_without_attachments_is_rejected() {
        let gl = RecordingGl::new();
        gl.clear_calls();
        run(&gl, GpuOp::BindFramebuffer { desc: RenderPassDesc::default() });
        assert_eq!(gl.call_count(), 0);
    }

    #[test]
    fn debug_groups_delegate_to_the_device() {
        let gl = RecordingGl::new();
        run(&gl, GpuOp::PushDebugGroup { label: String::from("grade pass") });
        run(&gl, GpuOp::PopDebugGroup);
        assert_eq!(gl.count_calls("push_debug_group"), 1);
        assert_eq!(gl.count_calls("pop_debug_group"), 1);
    }

    #[test]
    fn delegate_ops_ignore_absent_handles() {
        let gl = RecordingGl::new();
        gl.clear_calls();
        run(&gl, GpuOp::BindPipeline { pipeline: None });
        run(&gl, GpuOp::BindResources { bindings: None });
        assert_eq!(gl.call_count(), 0);
    }

    #[test]
    fn submit_runs_in_caller_order() {
        let gl = RecordingGl::new();
        let mut framebuffers = FramebufferCache::new();
        let mut ctx = ExecContext { gl: &gl, framebuffers: &mut framebuffers };
        gl.clear_calls();

        submit(
            &[
                GpuOp::SetViewport { rect: IVec4::new(0, 0, 800, 600) },
                GpuOp::SetScissor { rect: IVec4::new(0, 0, 800, 600) },
            ],
            &mut ctx,
        );
        let calls = gl.calls();
        assert_eq!(calls[0], "set_viewport");
        assert_eq!(calls[1], "set_scissor");
        assert_eq!(gl.current_viewport(), [0, 0, 800, 600]);
        assert_eq!(gl.current_scissor(), [0, 0, 800, 600]);
    }
}
