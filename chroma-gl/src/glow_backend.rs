//! Production [`GlApi`] implementation over a real `glow` context.
//!
//! This is the only module in the workspace that names a `glow` symbol and
//! the only one containing `unsafe`. The wrapper owns no GL objects itself;
//! callers remain responsible for deterministic teardown.

use std::num::NonZeroU32;

use glow::HasContext;

use crate::conversions;
use crate::device::GlApi;
use crate::types::{
    Attachment, Barrier, BlendFactor, BlendOp, BlitMask, BufferTarget, CompareFunc, Filter,
    FramebufferTarget, PixelLayout, PixelTransfer, ShaderStage, TextureFormat, TextureKind,
};

pub struct GlowDevice {
    gl: glow::Context,
}

impl GlowDevice {
    /// Wrap a context that is current on the calling thread.
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    fn texture(id: u32) -> Option<glow::NativeTexture> {
        NonZeroU32::new(id).map(glow::NativeTexture)
    }

    fn buffer(id: u32) -> Option<glow::NativeBuffer> {
        NonZeroU32::new(id).map(glow::NativeBuffer)
    }

    fn framebuffer(id: u32) -> Option<glow::NativeFramebuffer> {
        NonZeroU32::new(id).map(glow::NativeFramebuffer)
    }

    fn program(id: u32) -> Option<glow::NativeProgram> {
        NonZeroU32::new(id).map(glow::NativeProgram)
    }

    fn shader(id: u32) -> Option<glow::NativeShader> {
        NonZeroU32::new(id).map(glow::NativeShader)
    }

    /// Run `f` with `framebuffer` bound as the draw target, restoring the
    /// prior draw binding afterwards.
    fn with_draw_framebuffer<R>(&self, framebuffer: u32, f: impl FnOnce(&glow::Context) -> R) -> R {
        unsafe {
            let prior = self.gl.get_parameter_i32(glow::DRAW_FRAMEBUFFER_BINDING) as u32;
            self.gl
                .bind_framebuffer(glow::DRAW_FRAMEBUFFER, Self::framebuffer(framebuffer));
            let result = f(&self.gl);
            self.gl
                .bind_framebuffer(glow::DRAW_FRAMEBUFFER, Self::framebuffer(prior));
            result
        }
    }
}

impl GlApi for GlowDevice {
    fn pending_error(&self) -> u32 {
        unsafe { self.gl.get_error() }
    }

    fn push_debug_group(&self, label: &str) {
        unsafe {
            self.gl
                .push_debug_group(glow::DEBUG_SOURCE_THIRD_PARTY, 0, label);
        }
    }

    fn pop_debug_group(&self) {
        unsafe { self.gl.pop_debug_group() }
    }

    fn bound_framebuffer(&self, target: FramebufferTarget) -> u32 {
        let query = match target {
            FramebufferTarget::Read => glow::READ_FRAMEBUFFER_BINDING,
            FramebufferTarget::Draw | FramebufferTarget::Both => glow::DRAW_FRAMEBUFFER_BINDING,
        };
        unsafe { self.gl.get_parameter_i32(query) as u32 }
    }

    fn current_viewport(&self) -> [i32; 4] {
        let mut rect = [0i32; 4];
        unsafe { self.gl.get_parameter_i32_slice(glow::VIEWPORT, &mut rect) };
        rect
    }

    fn depth_write_mask(&self) -> bool {
        unsafe { self.gl.get_parameter_i32(glow::DEPTH_WRITEMASK) != 0 }
    }

    fn stencil_write_mask(&self) -> u32 {
        unsafe { self.gl.get_parameter_i32(glow::STENCIL_WRITEMASK) as u32 }
    }

    fn depth_compare(&self) -> CompareFunc {
        let func = unsafe { self.gl.get_parameter_i32(glow::DEPTH_FUNC) as u32 };
        conversions::compare_func_from_gl(func)
    }

    fn blend_enabled(&self) -> bool {
        unsafe { self.gl.is_enabled(glow::BLEND) }
    }

    fn alpha_to_coverage_enabled(&self) -> bool {
        unsafe { self.gl.is_enabled(glow::SAMPLE_ALPHA_TO_COVERAGE) }
    }

    fn active_texture_unit(&self) -> u32 {
        let unit = unsafe { self.gl.get_parameter_i32(glow::ACTIVE_TEXTURE) as u32 };
        unit - glow::TEXTURE0
    }

    fn bound_texture(&self, kind: TextureKind) -> u32 {
        unsafe {
            self.gl
                .get_parameter_i32(conversions::texture_binding_query(kind)) as u32
        }
    }

    fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: u32) {
        unsafe {
            self.gl.bind_framebuffer(
                conversions::framebuffer_target(target),
                Self::framebuffer(framebuffer),
            );
        }
    }

    fn set_viewport(&self, rect: [i32; 4]) {
        unsafe { self.gl.viewport(rect[0], rect[1], rect[2], rect[3]) }
    }

    fn set_scissor(&self, rect: [i32; 4]) {
        unsafe { self.gl.scissor(rect[0], rect[1], rect[2], rect[3]) }
    }

    fn set_depth_write_mask(&self, enabled: bool) {
        unsafe { self.gl.depth_mask(enabled) }
    }

    fn set_stencil_write_mask(&self, mask: u32) {
        unsafe { self.gl.stencil_mask(mask) }
    }

    fn set_depth_compare(&self, func: CompareFunc) {
        unsafe { self.gl.depth_func(conversions::compare_func(func)) }
    }

    fn set_blend_enabled(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::BLEND);
            } else {
                self.gl.disable(glow::BLEND);
            }
        }
    }

    fn set_alpha_to_coverage(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::SAMPLE_ALPHA_TO_COVERAGE);
            } else {
                self.gl.disable(glow::SAMPLE_ALPHA_TO_COVERAGE);
            }
        }
    }

    fn set_active_texture_unit(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn create_texture(&self) -> u32 {
        match unsafe { self.gl.create_texture() } {
            Ok(texture) => texture.0.get(),
            Err(error) => {
                tracing::error!(error, "create_texture failed");
                0
            }
        }
    }

    fn delete_texture(&self, texture: u32) {
        if let Some(texture) = Self::texture(texture) {
            unsafe { self.gl.delete_texture(texture) }
        }
    }

    fn bind_texture(&self, kind: TextureKind, texture: u32) {
        unsafe {
            self.gl
                .bind_texture(conversions::texture_target(kind), Self::texture(texture));
        }
    }

    fn set_texture_sampling(&self, kind: TextureKind, filter: Filter) {
        let target = conversions::texture_target(kind);
        let filter = conversions::filter(filter) as i32;
        unsafe {
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter);
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter);
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            if kind == TextureKind::ThreeD {
                self.gl
                    .tex_parameter_i32(target, glow::TEXTURE_WRAP_R, glow::CLAMP_TO_EDGE as i32);
            }
        }
    }

    fn allocate_texture_2d(&self, format: TextureFormat, width: i32, height: i32) {
        let transfer = format.transfer();
        unsafe {
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                conversions::internal_format(format) as i32,
                width,
                height,
                0,
                conversions::pixel_layout(transfer.layout),
                conversions::pixel_component(transfer.component),
                None,
            );
        }
    }

    fn upload_texture_3d(&self, format: TextureFormat, edge: i32, texels: &[f32]) {
        let transfer = format.transfer();
        unsafe {
            self.gl.tex_image_3d(
                glow::TEXTURE_3D,
                0,
                conversions::internal_format(format) as i32,
                edge,
                edge,
                edge,
                0,
                conversions::pixel_layout(transfer.layout),
                conversions::pixel_component(transfer.component),
                Some(bytemuck::cast_slice(texels)),
            );
        }
    }

    fn read_texture(
        &self,
        texture: u32,
        mip_level: i32,
        offset: [i32; 3],
        extent: [i32; 3],
        transfer: PixelTransfer,
        destination: &mut [u8],
    ) {
        let texel_bytes = transfer.layout.channel_count() * transfer.component.byte_size();
        let layer_bytes = extent[0] as usize * extent[1] as usize * texel_bytes;
        let needed = layer_bytes * extent[2] as usize;
        if destination.len() < needed {
            tracing::warn!(
                have = destination.len(),
                needed,
                "readback destination too small (aborted)"
            );
            return;
        }

        let attachment = match transfer.layout {
            PixelLayout::Depth => glow::DEPTH_ATTACHMENT,
            _ => glow::COLOR_ATTACHMENT0,
        };
        let layered = extent[2] > 1 || offset[2] > 0;

        unsafe {
            let prior = self.gl.get_parameter_i32(glow::READ_FRAMEBUFFER_BINDING) as u32;
            let scratch = match self.gl.create_framebuffer() {
                Ok(framebuffer) => framebuffer,
                Err(error) => {
                    tracing::error!(error, "readback framebuffer creation failed");
                    return;
                }
            };
            self.gl.bind_framebuffer(glow::READ_FRAMEBUFFER, Some(scratch));

            for layer in 0..extent[2] {
                if layered {
                    self.gl.framebuffer_texture_layer(
                        glow::READ_FRAMEBUFFER,
                        attachment,
                        Self::texture(texture),
                        mip_level,
                        offset[2] + layer,
                    );
                } else {
                    self.gl.framebuffer_texture_2d(
                        glow::READ_FRAMEBUFFER,
                        attachment,
                        glow::TEXTURE_2D,
                        Self::texture(texture),
                        mip_level,
                    );
                }
                let chunk = &mut destination
                    [layer as usize * layer_bytes..(layer as usize + 1) * layer_bytes];
                self.gl.read_pixels(
                    offset[0],
                    offset[1],
                    extent[0],
                    extent[1],
                    conversions::pixel_layout(transfer.layout),
                    conversions::pixel_component(transfer.component),
                    glow::PixelPackData::Slice(chunk),
                );
            }

            self.gl
                .bind_framebuffer(glow::READ_FRAMEBUFFER, Self::framebuffer(prior));
            self.gl.delete_framebuffer(scratch);
        }
    }

    fn create_framebuffer(&self) -> u32 {
        match unsafe { self.gl.create_framebuffer() } {
            Ok(framebuffer) => framebuffer.0.get(),
            Err(error) => {
                tracing::error!(error, "create_framebuffer failed");
                0
            }
        }
    }

    fn delete_framebuffer(&self, framebuffer: u32) {
        if let Some(framebuffer) = Self::framebuffer(framebuffer) {
            unsafe { self.gl.delete_framebuffer(framebuffer) }
        }
    }

    fn attach_framebuffer_texture(
        &self,
        framebuffer: u32,
        attachment: Attachment,
        kind: TextureKind,
        texture: u32,
    ) {
        let point = conversions::attachment_point(attachment);
        let target = conversions::texture_target(kind);
        self.with_draw_framebuffer(framebuffer, |gl| unsafe {
            gl.framebuffer_texture_2d(
                glow::DRAW_FRAMEBUFFER,
                point,
                target,
                Self::texture(texture),
                0,
            );
        });
    }

    fn set_framebuffer_draw_targets(&self, framebuffer: u32, slots: &[Option<u32>]) {
        let targets: Vec<u32> = slots
            .iter()
            .map(|slot| match slot {
                Some(attachment) => glow::COLOR_ATTACHMENT0 + attachment,
                None => glow::NONE,
            })
            .collect();
        self.with_draw_framebuffer(framebuffer, |gl| unsafe {
            gl.draw_buffers(&targets);
        });
    }

    fn framebuffer_complete(&self, framebuffer: u32) -> bool {
        self.with_draw_framebuffer(framebuffer, |gl| unsafe {
            gl.check_framebuffer_status(glow::DRAW_FRAMEBUFFER) == glow::FRAMEBUFFER_COMPLETE
        })
    }

    fn blit_framebuffer(&self, src: [i32; 4], dst: [i32; 4], mask: BlitMask, filter: Filter) {
        unsafe {
            self.gl.blit_framebuffer(
                src[0],
                src[1],
                src[2],
                src[3],
                dst[0],
                dst[1],
                dst[2],
                dst[3],
                conversions::blit_mask(mask),
                conversions::filter(filter),
            );
        }
    }

    fn clear_color_attachment(&self, slot: u32, value: [f32; 4]) {
        unsafe { self.gl.clear_buffer_f32_slice(glow::COLOR, slot, &value) }
    }

    fn clear_depth_attachment(&self, value: f32) {
        unsafe { self.gl.clear_buffer_f32_slice(glow::DEPTH, 0, &[value]) }
    }

    fn create_buffer(&self) -> u32 {
        match unsafe { self.gl.create_buffer() } {
            Ok(buffer) => buffer.0.get(),
            Err(error) => {
                tracing::error!(error, "create_buffer failed");
                0
            }
        }
    }

    fn delete_buffer(&self, buffer: u32) {
        if let Some(buffer) = Self::buffer(buffer) {
            unsafe { self.gl.delete_buffer(buffer) }
        }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: u32) {
        unsafe {
            self.gl
                .bind_buffer(conversions::buffer_target(target), Self::buffer(buffer));
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(conversions::buffer_target(target), data, glow::STATIC_DRAW);
        }
    }

    fn buffer_sub_data(&self, buffer: u32, destination_offset: i32, data: &[u8]) {
        unsafe {
            let prior = self.gl.get_parameter_i32(glow::ARRAY_BUFFER_BINDING) as u32;
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Self::buffer(buffer));
            self.gl
                .buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, destination_offset, data);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Self::buffer(prior));
        }
    }

    fn bind_vertex_buffer(&self, binding: u32, buffer: u32, offset: i32, stride: i32) {
        unsafe {
            self.gl
                .bind_vertex_buffer(binding, Self::buffer(buffer), offset, stride);
        }
    }

    fn memory_barrier(&self, barrier: Barrier) {
        unsafe { self.gl.memory_barrier(conversions::barrier_bits(barrier)) }
    }

    fn vertex_attrib_pointer(&self, index: u32, components: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, stride, offset);
        }
    }

    fn enable_vertex_attrib(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn disable_vertex_attrib(&self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) }
    }

    fn draw_arrays(&self, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLES, first, count) }
    }

    fn draw_indexed(
        &self,
        index_count: i32,
        index_byte_offset: i32,
        instance_count: i32,
        base_vertex: i32,
    ) {
        unsafe {
            self.gl.draw_elements_instanced_base_vertex(
                glow::TRIANGLES,
                index_count,
                glow::UNSIGNED_INT,
                index_byte_offset,
                instance_count,
                base_vertex,
            );
        }
    }

    fn set_blend_func(
        &self,
        slot: u32,
        src_color: BlendFactor,
        dst_color: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        unsafe {
            self.gl.blend_func_separate_draw_buffer(
                slot,
                conversions::blend_factor(src_color),
                conversions::blend_factor(dst_color),
                conversions::blend_factor(src_alpha),
                conversions::blend_factor(dst_alpha),
            );
        }
    }

    fn set_blend_equation(&self, slot: u32, color_op: BlendOp, alpha_op: BlendOp) {
        unsafe {
            self.gl.blend_equation_separate_draw_buffer(
                slot,
                conversions::blend_op(color_op),
                conversions::blend_op(alpha_op),
            );
        }
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<u32, String> {
        unsafe {
            let shader = self
                .gl
                .create_shader(conversions::shader_stage(stage))
                .map_err(|e| format!("create_shader failed: {e}"))?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(log);
            }
            Ok(shader.0.get())
        }
    }

    fn delete_shader(&self, shader: u32) {
        if let Some(shader) = Self::shader(shader) {
            unsafe { self.gl.delete_shader(shader) }
        }
    }

    fn link_program(&self, shaders: &[u32]) -> Result<u32, String> {
        unsafe {
            let program = self
                .gl
                .create_program()
                .map_err(|e| format!("create_program failed: {e}"))?;
            for &id in shaders {
                if let Some(shader) = Self::shader(id) {
                    self.gl.attach_shader(program, shader);
                }
            }
            self.gl.link_program(program);
            for &id in shaders {
                if let Some(shader) = Self::shader(id) {
                    self.gl.detach_shader(program, shader);
                    self.gl.delete_shader(shader);
                }
            }
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(log);
            }
            Ok(program.0.get())
        }
    }

    fn delete_program(&self, program: u32) {
        if let Some(program) = Self::program(program) {
            unsafe { self.gl.delete_program(program) }
        }
    }

    fn use_program(&self, program: u32) {
        unsafe { self.gl.use_program(Self::program(program)) }
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<i32> {
        let program = Self::program(program)?;
        unsafe {
            self.gl
                .get_uniform_location(program, name)
                .map(|location| location.0 as i32)
        }
    }

    fn attrib_location(&self, program: u32, name: &str) -> Option<u32> {
        let program = Self::program(program)?;
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn set_uniform_i32(&self, location: i32, value: i32) {
        unsafe {
            self.gl
                .uniform_1_i32(Some(&glow::NativeUniformLocation(location as u32)), value);
        }
    }
}
