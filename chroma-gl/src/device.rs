//! The explicit device-context seam.
//!
//! The underlying graphics API is one enormous piece of ambient state;
//! everything in this crate reaches it through [`GlApi`] so that each
//! operation's contract names exactly the state it touches. The production
//! implementation wraps a real context (`glow_backend`); tests substitute a
//! recording double (`testing`).
//!
//! Conventions: native object ids are `u32` with `0` meaning "none" (the
//! default framebuffer, an unbound texture). Methods never fail; a device
//! error is latched API-side and drained with [`post_pending_errors`].

use crate::types::{
    Attachment, Barrier, BlendFactor, BlendOp, BlitMask, BufferTarget, CompareFunc, Filter,
    FramebufferTarget, PixelTransfer, ShaderStage, TextureFormat, TextureKind,
};

pub trait GlApi {
    /// Oldest accumulated device error, or 0 when the error queue is empty.
    fn pending_error(&self) -> u32;

    fn push_debug_group(&self, label: &str);
    fn pop_debug_group(&self);

    // Ambient state queries.
    fn bound_framebuffer(&self, target: FramebufferTarget) -> u32;
    fn current_viewport(&self) -> [i32; 4];
    fn depth_write_mask(&self) -> bool;
    fn stencil_write_mask(&self) -> u32;
    fn depth_compare(&self) -> CompareFunc;
    fn blend_enabled(&self) -> bool;
    fn alpha_to_coverage_enabled(&self) -> bool;
    fn active_texture_unit(&self) -> u32;
    /// Texture bound to `kind` on the active unit.
    fn bound_texture(&self, kind: TextureKind) -> u32;

    // Ambient state setters.
    fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: u32);
    fn set_viewport(&self, rect: [i32; 4]);
    fn set_scissor(&self, rect: [i32; 4]);
    fn set_depth_write_mask(&self, enabled: bool);
    fn set_stencil_write_mask(&self, mask: u32);
    fn set_depth_compare(&self, func: CompareFunc);
    fn set_blend_enabled(&self, enabled: bool);
    fn set_alpha_to_coverage(&self, enabled: bool);
    fn set_active_texture_unit(&self, unit: u32);

    // Textures.
    fn create_texture(&self) -> u32;
    fn delete_texture(&self, texture: u32);
    fn bind_texture(&self, kind: TextureKind, texture: u32);
    /// Min+mag filter plus clamp-to-edge wrap on the texture bound to
    /// `kind` on the active unit.
    fn set_texture_sampling(&self, kind: TextureKind, filter: Filter);
    /// Allocate storage for the 2-D texture bound on the active unit.
    fn allocate_texture_2d(&self, format: TextureFormat, width: i32, height: i32);
    /// Allocate + fill the 3-D texture bound on the active unit with an
    /// `edge³` grid of float texels.
    fn upload_texture_3d(&self, format: TextureFormat, edge: i32, texels: &[f32]);
    /// Synchronous readback of `extent` texels from `texture` at
    /// `mip_level`, starting at `offset`.
    fn read_texture(
        &self,
        texture: u32,
        mip_level: i32,
        offset: [i32; 3],
        extent: [i32; 3],
        transfer: PixelTransfer,
        destination: &mut [u8],
    );

    // Framebuffers. Attachment configuration is framebuffer-scoped: the
    // backend may bind internally but must leave the ambient bindings as it
    // found them.
    fn create_framebuffer(&self) -> u32;
    fn delete_framebuffer(&self, framebuffer: u32);
    /// Attach `texture` (0 to detach) to a slot of `framebuffer`.
    fn attach_framebuffer_texture(
        &self,
        framebuffer: u32,
        attachment: Attachment,
        kind: TextureKind,
        texture: u32,
    );
    /// Map draw buffer i to color attachment `slots[i]`, or to none.
    fn set_framebuffer_draw_targets(&self, framebuffer: u32, slots: &[Option<u32>]);
    fn framebuffer_complete(&self, framebuffer: u32) -> bool;
    /// Region blit from the bound read framebuffer to the bound draw
    /// framebuffer. Rects are `[x0, y0, x1, y1]`.
    fn blit_framebuffer(&self, src: [i32; 4], dst: [i32; 4], mask: BlitMask, filter: Filter);
    /// Clear one color attachment of the bound draw framebuffer.
    fn clear_color_attachment(&self, slot: u32, value: [f32; 4]);
    /// Clear the depth attachment of the bound draw framebuffer.
    fn clear_depth_attachment(&self, value: f32);

    // Buffers.
    fn create_buffer(&self) -> u32;
    fn delete_buffer(&self, buffer: u32);
    fn bind_buffer(&self, target: BufferTarget, buffer: u32);
    /// (Re)allocate and fill the buffer bound to `target`.
    fn buffer_data(&self, target: BufferTarget, data: &[u8]);
    /// Write `data` into `buffer` at `destination_offset` without touching
    /// ambient bindings.
    fn buffer_sub_data(&self, buffer: u32, destination_offset: i32, data: &[u8]);
    /// Bind `buffer` to a vertex binding slot with the given stride.
    fn bind_vertex_buffer(&self, binding: u32, buffer: u32, offset: i32, stride: i32);
    fn memory_barrier(&self, barrier: Barrier);

    // Vertex attributes and draws. All draws are triangles.
    fn vertex_attrib_pointer(&self, index: u32, components: i32, stride: i32, offset: i32);
    fn enable_vertex_attrib(&self, index: u32);
    fn disable_vertex_attrib(&self, index: u32);
    fn draw_arrays(&self, first: i32, count: i32);
    /// Instanced, base-vertex indexed draw over the bound element buffer
    /// (32-bit indices).
    fn draw_indexed(
        &self,
        index_count: i32,
        index_byte_offset: i32,
        instance_count: i32,
        base_vertex: i32,
    );

    // Per-attachment blend configuration.
    fn set_blend_func(
        &self,
        slot: u32,
        src_color: BlendFactor,
        dst_color: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    );
    fn set_blend_equation(&self, slot: u32, color_op: BlendOp, alpha_op: BlendOp);

    // Programs.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<u32, String>;
    fn delete_shader(&self, shader: u32);
    /// Link the given compiled shaders into a program. The shaders are
    /// detached and deleted regardless of outcome.
    fn link_program(&self, shaders: &[u32]) -> Result<u32, String>;
    fn delete_program(&self, program: u32);
    fn use_program(&self, program: u32);
    fn uniform_location(&self, program: u32, name: &str) -> Option<i32>;
    fn attrib_location(&self, program: u32, name: &str) -> Option<u32>;
    /// Set an integer uniform in the program currently in use.
    fn set_uniform_i32(&self, location: i32, value: i32);
}

/// Drain every accumulated device error and report it, tagged with the
/// operation group that just ran. Device errors never become control flow.
pub fn post_pending_errors(gl: &dyn GlApi, scope: &str) {
    loop {
        let error = gl.pending_error();
        if error == 0 {
            return;
        }
        tracing::error!(scope, code = error, "device error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingGl;

    #[test]
    fn post_pending_errors_drains_the_queue() {
        let gl = RecordingGl::new();
        gl.inject_error(0x0502);
        gl.inject_error(0x0505);
        post_pending_errors(&gl, "test group");
        assert_eq!(gl.pending_error(), 0);
    }
}
