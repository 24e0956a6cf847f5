//! Scoped capture/restore of ambient device state.
//!
//! Each snapshot reads exactly the fields the surrounding operation will
//! mutate, nothing more. Restore is unconditional and per-field
//! order-independent; capture and restore never fail.

use crate::device::GlApi;
use crate::types::{CompareFunc, FramebufferTarget};

/// Read + draw framebuffer bindings, captured around blits and attachment
/// rewiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferBindings {
    pub read: u32,
    pub draw: u32,
}

impl FramebufferBindings {
    pub fn capture(gl: &dyn GlApi) -> Self {
        Self {
            read: gl.bound_framebuffer(FramebufferTarget::Read),
            draw: gl.bound_framebuffer(FramebufferTarget::Draw),
        }
    }

    pub fn restore(&self, gl: &dyn GlApi) {
        gl.bind_framebuffer(FramebufferTarget::Read, self.read);
        gl.bind_framebuffer(FramebufferTarget::Draw, self.draw);
    }
}

/// Everything a full-screen draw mutates besides framebuffer bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawStateSnapshot {
    pub viewport: [i32; 4],
    pub depth_write_mask: bool,
    pub stencil_write_mask: u32,
    pub depth_compare: CompareFunc,
    pub blend_enabled: bool,
    pub alpha_to_coverage: bool,
    pub active_texture_unit: u32,
}

impl DrawStateSnapshot {
    pub fn capture(gl: &dyn GlApi) -> Self {
        Self {
            viewport: gl.current_viewport(),
            depth_write_mask: gl.depth_write_mask(),
            stencil_write_mask: gl.stencil_write_mask(),
            depth_compare: gl.depth_compare(),
            blend_enabled: gl.blend_enabled(),
            alpha_to_coverage: gl.alpha_to_coverage_enabled(),
            active_texture_unit: gl.active_texture_unit(),
        }
    }

    pub fn restore(&self, gl: &dyn GlApi) {
        gl.set_viewport(self.viewport);
        gl.set_depth_write_mask(self.depth_write_mask);
        gl.set_stencil_write_mask(self.stencil_write_mask);
        gl.set_depth_compare(self.depth_compare);
        gl.set_blend_enabled(self.blend_enabled);
        gl.set_alpha_to_coverage(self.alpha_to_coverage);
        gl.set_active_texture_unit(self.active_texture_unit);
    }
}
