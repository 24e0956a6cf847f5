//! The full-screen color-grade pass.
//!
//! Per frame the stage snapshots the current color pixels into a scratch
//! texture, then draws an over-sized triangle that samples the scratch copy
//! and writes transformed pixels back to the output, leaving every piece of
//! ambient device state exactly as it found it. GPU resources are created
//! lazily and rebuilt only when their defining parameters change; teardown
//! destroys them unconditionally.

use glam::IVec2;

use chroma_gl::{
    Attachment, BlitMask, BufferDesc, BufferSlot, BufferTarget, BufferUsage, CompareFunc,
    DrawStateSnapshot, Filter, FramebufferBindings, FramebufferTarget, GlApi, Program,
    TextureDesc, TextureFormat, TextureHandle, TextureKind, TextureSlot, post_pending_errors,
};

use crate::engine::{self, ColorTransformEngine, TransformProgram, TransformRequest};
use crate::params::{CorrectionMode, GradeParams, SOURCE_COLOR};
use crate::shader::{self, ShaderCatalog};

/// A larger-than-screen triangle with UVs made to fit the screen.
///                                  positions         uvs
const FULLSCREEN_TRIANGLE: [f32; 18] = [
    -1.0,  3.0, -1.0, 1.0,        0.0, 2.0,
    -1.0, -1.0, -1.0, 1.0,        0.0, 0.0,
     3.0, -1.0, -1.0, 1.0,        2.0, 0.0,
];

/// Interleaved position (4 floats) + uv (2 floats).
const VERTEX_STRIDE: i32 = 6 * 4;
const UV_BYTE_OFFSET: i32 = 4 * 4;

struct GradeProgram {
    program: Program,
    color_in: Option<i32>,
    position: Option<u32>,
    uv_in: Option<u32>,
    lut_in: Option<i32>,
    lut_active: bool,
}

struct LutTexture {
    id: u32,
    edge: i32,
}

pub struct ColorGradeStage {
    params: GradeParams,
    catalog: Box<dyn ShaderCatalog>,
    engine: Box<dyn ColorTransformEngine>,

    vertex_buffer: BufferSlot,
    program: Option<GradeProgram>,
    program_failed: bool,
    lut: Option<LutTexture>,
    scratch: TextureSlot,
    copy_framebuffer: u32,
    source_framebuffer: u32,
    source_texture: Option<TextureHandle>,
    attached_source: Option<u32>,
}

impl ColorGradeStage {
    pub fn new(catalog: Box<dyn ShaderCatalog>, engine: Box<dyn ColorTransformEngine>) -> Self {
        Self {
            params: GradeParams::default(),
            catalog,
            engine,
            vertex_buffer: BufferSlot::default(),
            program: None,
            program_failed: false,
            lut: None,
            scratch: TextureSlot::default(),
            copy_framebuffer: 0,
            source_framebuffer: 0,
            source_texture: None,
            attached_source: None,
        }
    }

    pub fn params(&self) -> &GradeParams {
        &self.params
    }

    /// Replace the parameters wholesale. Changes to the transform settings
    /// discard the cached shader so the next frame recomposes it (refilling
    /// the LUT); target-size and source changes leave the program alone.
    pub fn set_params(&mut self, gl: &dyn GlApi, params: GradeParams) {
        if params == self.params {
            return;
        }
        let shader_stale = params.mode != self.params.mode
            || params.display != self.params.display
            || params.view != self.params.view
            || params.colorspace != self.params.colorspace
            || params.looks != self.params.looks
            || params.lut3d_size != self.params.lut3d_size;
        tracing::debug!(%params, shader_stale, "grade parameters changed");
        self.params = params;

        if shader_stale {
            if let Some(grade) = self.program.take() {
                grade.program.destroy(gl);
            }
            // The LUT texture object survives; the next composition refills
            // it (or reallocates when the edge length changed).
            self.program_failed = false;
        }
    }

    /// Per-frame resolution of the named external source buffer. `None`
    /// means "grade whatever output is currently bound".
    pub fn prepare(&mut self, source: Option<TextureHandle>) {
        self.source_texture = source;
    }

    /// Run the pass. Failures stay local to this frame: composition errors
    /// skip the draw, contract violations are reported, and the next sync
    /// starts from a clean slate.
    pub fn execute(&mut self, gl: &dyn GlApi) {
        // Only color data is graded.
        if !self.params.source_name.is_empty() && self.params.source_name != SOURCE_COLOR {
            return;
        }

        self.ensure_vertex_buffer(gl);
        if !self.ensure_program(gl) {
            return;
        }
        self.ensure_targets(gl);
        self.copy_source(gl);

        // With an external source bound, graded pixels land back in that
        // source's framebuffer; otherwise they go to the caller's target.
        let swapped = if self.source_texture.is_some() {
            let prior = FramebufferBindings::capture(gl);
            gl.bind_framebuffer(FramebufferTarget::Draw, self.source_framebuffer);
            Some(prior)
        } else {
            None
        };

        self.apply(gl);

        if let Some(prior) = swapped {
            prior.restore(gl);
        }
        post_pending_errors(gl, "color grade");
    }

    /// Destroy every cached GPU resource, regardless of state.
    pub fn destroy(&mut self, gl: &dyn GlApi) {
        self.scratch.destroy(gl);
        self.vertex_buffer.destroy(gl);
        if let Some(grade) = self.program.take() {
            grade.program.destroy(gl);
        }
        if let Some(lut) = self.lut.take() {
            gl.delete_texture(lut.id);
        }
        if self.copy_framebuffer != 0 {
            gl.delete_framebuffer(self.copy_framebuffer);
            self.copy_framebuffer = 0;
        }
        if self.source_framebuffer != 0 {
            gl.delete_framebuffer(self.source_framebuffer);
            self.source_framebuffer = 0;
        }
        self.attached_source = None;
        self.program_failed = false;
        post_pending_errors(gl, "grade teardown");
    }

    fn ensure_vertex_buffer(&mut self, gl: &dyn GlApi) {
        if !self.vertex_buffer.is_empty() {
            return;
        }
        let desc = BufferDesc {
            label: "grade fullscreen triangle",
            usage: BufferUsage::Vertex {
                stride: VERTEX_STRIDE as u32,
            },
            byte_size: std::mem::size_of_val(&FULLSCREEN_TRIANGLE),
        };
        let buffer = self.vertex_buffer.ensure(gl, desc);
        buffer.upload(gl, bytemuck::cast_slice(&FULLSCREEN_TRIANGLE));
    }

    fn ensure_program(&mut self, gl: &dyn GlApi) -> bool {
        if self.program.is_some() {
            return true;
        }
        if self.program_failed {
            return false;
        }

        // Managed correction needs both the mode flag and an active
        // configuration; otherwise the passthrough variant is built.
        let lut_active =
            self.params.mode == CorrectionMode::Managed && self.engine.is_active();

        let Some(vertex_source) = self.catalog.source(shader::GRADE_VERTEX) else {
            tracing::error!(id = shader::GRADE_VERTEX, "missing packaged shader source");
            self.program_failed = true;
            return false;
        };
        let Some(fragment_base) = self.catalog.source(shader::GRADE_FRAGMENT) else {
            tracing::error!(id = shader::GRADE_FRAGMENT, "missing packaged shader source");
            self.program_failed = true;
            return false;
        };

        let mut engine_source = String::new();
        if lut_active {
            let request = TransformRequest {
                display: self.params.display.clone(),
                view: self.params.view.clone(),
                colorspace: self.params.colorspace.clone(),
                looks: self.params.looks.clone(),
                lut_edge: engine::resolve_lut_edge(self.params.lut3d_size),
            };
            match self.engine.gpu_transform(&request) {
                Ok(transform) if transform.lut_is_consistent() => {
                    self.upload_lut(gl, &transform);
                    engine_source = transform.shader_text;
                }
                Ok(transform) => {
                    tracing::error!(
                        edge = transform.lut_edge,
                        samples = transform.lut.len(),
                        "engine returned an inconsistent LUT"
                    );
                    self.program_failed = true;
                    return false;
                }
                Err(error) => {
                    tracing::error!(error = %error, "color transform generation failed");
                    self.program_failed = true;
                    return false;
                }
            }
        }

        let fragment_source = shader::compose_fragment(&fragment_base, lut_active, &engine_source);
        match Program::build(gl, &vertex_source, &fragment_source) {
            Ok(program) => {
                let color_in = program.uniform_location(gl, "colorIn");
                let position = program.attrib_location(gl, "position");
                let uv_in = program.attrib_location(gl, "uvIn");
                let lut_in = if lut_active {
                    program.uniform_location(gl, "lutIn")
                } else {
                    None
                };
                self.program = Some(GradeProgram {
                    program,
                    color_in,
                    position,
                    uv_in,
                    lut_in,
                    lut_active,
                });
                true
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to build color grade shader");
                self.program_failed = true;
                false
            }
        }
    }

    /// Upload the LUT into a 3-D texture: reused when the edge length
    /// matches, destroyed and reallocated otherwise.
    fn upload_lut(&mut self, gl: &dyn GlApi, transform: &TransformProgram) {
        let prior = gl.bound_texture(TextureKind::ThreeD);

        let reuse = self
            .lut
            .as_ref()
            .is_some_and(|lut| lut.edge == transform.lut_edge);
        if !reuse {
            if let Some(old) = self.lut.take() {
                gl.delete_texture(old.id);
            }
            self.lut = Some(LutTexture {
                id: gl.create_texture(),
                edge: transform.lut_edge,
            });
        }
        let Some(lut) = &self.lut else { return };

        gl.bind_texture(TextureKind::ThreeD, lut.id);
        gl.set_texture_sampling(TextureKind::ThreeD, Filter::Linear);
        gl.upload_texture_3d(TextureFormat::Rgb32Float, transform.lut_edge, &transform.lut);
        gl.bind_texture(TextureKind::ThreeD, prior);
    }

    /// Ensure the scratch texture and both framebuffers match the current
    /// target size, falling back to the ambient viewport when no explicit
    /// size was configured.
    fn ensure_targets(&mut self, gl: &dyn GlApi) {
        let mut size = self.params.framebuffer_size;
        if size.x <= 0 || size.y <= 0 {
            let viewport = gl.current_viewport();
            size = IVec2::new(viewport[2], viewport[3]);
            self.params.framebuffer_size = size;
        }

        let prior_scratch = self.scratch.get().map(|t| t.id());
        let desc = TextureDesc::color_2d(
            "grade scratch color",
            size.x,
            size.y,
            TextureFormat::Rgba16Float,
        );
        let scratch_id = self.scratch.ensure(gl, desc).id();
        let recreated = prior_scratch != Some(scratch_id);

        if self.copy_framebuffer == 0 {
            self.copy_framebuffer = gl.create_framebuffer();
        }
        if self.source_framebuffer == 0 {
            self.source_framebuffer = gl.create_framebuffer();
        }

        let source_id = self.source_texture.as_ref().map(|t| t.id());
        if recreated || source_id != self.attached_source {
            self.attached_source = source_id;
            gl.attach_framebuffer_texture(
                self.copy_framebuffer,
                Attachment::Color(0),
                TextureKind::TwoD,
                scratch_id,
            );
            if let Some(id) = source_id {
                gl.attach_framebuffer_texture(
                    self.source_framebuffer,
                    Attachment::Color(0),
                    TextureKind::TwoD,
                    id,
                );
            }
        }
    }

    /// Snapshot the current pixels into the scratch texture so the draw can
    /// read and write the same memory without hazards.
    fn copy_source(&self, gl: &dyn GlApi) {
        let Some(scratch) = self.scratch.get() else {
            return;
        };
        let [width, height, _] = scratch.desc().dimensions;

        let bindings = FramebufferBindings::capture(gl);
        if self.source_texture.is_some() {
            gl.bind_framebuffer(FramebufferTarget::Read, self.source_framebuffer);
        } else {
            // No external source: snapshot the currently bound output.
            gl.bind_framebuffer(FramebufferTarget::Read, bindings.draw);
        }
        gl.bind_framebuffer(FramebufferTarget::Draw, self.copy_framebuffer);

        let rect = [0, 0, width, height];
        gl.blit_framebuffer(rect, rect, BlitMask::Color, Filter::Nearest);

        bindings.restore(gl);
    }

    fn apply(&self, gl: &dyn GlApi) {
        let Some(grade) = &self.program else { return };
        let Some(scratch) = self.scratch.get() else { return };
        let Some(vertex_buffer) = self.vertex_buffer.get() else {
            return;
        };
        let size = self.params.framebuffer_size;

        let snapshot = DrawStateSnapshot::capture(gl);

        gl.use_program(grade.program.id());
        gl.set_active_texture_unit(0);
        gl.bind_texture(TextureKind::TwoD, scratch.id());
        if let Some(location) = grade.color_in {
            gl.set_uniform_i32(location, 0);
        }

        if grade.lut_active {
            if let Some(lut) = &self.lut {
                gl.set_active_texture_unit(1);
                gl.bind_texture(TextureKind::ThreeD, lut.id);
                if let Some(location) = grade.lut_in {
                    gl.set_uniform_i32(location, 1);
                }
            }
        }

        gl.bind_buffer(BufferTarget::Array, vertex_buffer.id());
        if let Some(position) = grade.position {
            gl.vertex_attrib_pointer(position, 4, VERTEX_STRIDE, 0);
            gl.enable_vertex_attrib(position);
        }
        if let Some(uv) = grade.uv_in {
            gl.vertex_attrib_pointer(uv, 2, VERTEX_STRIDE, UV_BYTE_OFFSET);
            gl.enable_vertex_attrib(uv);
        }

        // Depth compare stays ALWAYS rather than disabling the test: the
        // depth buffer must keep its contents while color still writes.
        gl.set_depth_write_mask(false);
        gl.set_stencil_write_mask(0);
        gl.set_depth_compare(CompareFunc::Always);
        gl.set_viewport([0, 0, size.x, size.y]);
        // Graded pixels must not be attenuated or discarded, even where the
        // cleared background has zero alpha.
        gl.set_blend_enabled(false);
        gl.set_alpha_to_coverage(false);

        gl.draw_arrays(0, 3);

        if let Some(uv) = grade.uv_in {
            gl.disable_vertex_attrib(uv);
        }
        if let Some(position) = grade.position {
            gl.disable_vertex_attrib(position);
        }
        gl.bind_buffer(BufferTarget::Array, 0);
        gl.use_program(0);

        if grade.lut_active {
            gl.set_active_texture_unit(1);
            gl.bind_texture(TextureKind::ThreeD, 0);
        }
        gl.set_active_texture_unit(0);
        gl.bind_texture(TextureKind::TwoD, 0);

        snapshot.restore(gl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{TransformError, TransformProgram};
    use crate::shader::BuiltinShaders;
    use chroma_gl::ShaderStage;
    use chroma_gl::testing::RecordingGl;
    use chroma_gl::{Texture, TextureDesc};
    use std::sync::Arc;

    struct StubEngine {
        active: bool,
    }

    impl ColorTransformEngine for StubEngine {
        fn is_active(&self) -> bool {
            self.active
        }

        fn gpu_transform(
            &self,
            request: &TransformRequest,
        ) -> Result<TransformProgram, TransformError> {
            let edge = request.lut_edge as usize;
            Ok(TransformProgram {
                shader_text: String::from(
                    "vec4 transformColor(vec4 inColor, sampler3D lut)\n{\n    return inColor;\n}\n",
                ),
                lut: vec![0.0; 3 * edge * edge * edge],
                lut_edge: request.lut_edge,
            })
        }
    }

    fn passthrough_stage() -> ColorGradeStage {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        ColorGradeStage::new(
            Box::new(BuiltinShaders),
            Box::new(StubEngine { active: false }),
        )
    }

    fn managed_stage() -> ColorGradeStage {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        ColorGradeStage::new(
            Box::new(BuiltinShaders),
            Box::new(StubEngine { active: true }),
        )
    }

    fn sized_params(width: i32, height: i32) -> GradeParams {
        GradeParams {
            framebuffer_size: IVec2::new(width, height),
            ..GradeParams::default()
        }
    }

    fn managed_params(width: i32, height: i32, lut3d_size: i32) -> GradeParams {
        GradeParams {
            framebuffer_size: IVec2::new(width, height),
            mode: CorrectionMode::Managed,
            lut3d_size,
            ..GradeParams::default()
        }
    }

    fn resource_ids(stage: &ColorGradeStage) -> (u32, u32, u32, u32) {
        (
            stage.program.as_ref().map(|p| p.program.id()).unwrap_or(0),
            stage.scratch.get().map(|t| t.id()).unwrap_or(0),
            stage.vertex_buffer.get().map(|b| b.id()).unwrap_or(0),
            stage.copy_framebuffer,
        )
    }

    #[test]
    fn consecutive_frames_reuse_every_native_id() {
        let gl = RecordingGl::new();
        let mut stage = passthrough_stage();
        stage.set_params(&gl, sized_params(800, 600));

        stage.execute(&gl);
        let first = resource_ids(&stage);
        assert_ne!(first.0, 0);

        stage.execute(&gl);
        assert_eq!(resource_ids(&stage), first);
        assert!(gl.deleted_textures().is_empty());
        assert!(gl.deleted_programs().is_empty());
        assert_eq!(gl.draws().len(), 2);
    }

    #[test]
    fn unchanged_params_do_not_invalidate_the_shader() {
        let gl = RecordingGl::new();
        let mut stage = passthrough_stage();
        stage.set_params(&gl, sized_params(800, 600));
        stage.execute(&gl);
        let program = stage.program.as_ref().map(|p| p.program.id());

        stage.set_params(&gl, sized_params(800, 600));
        stage.execute(&gl);
        assert_eq!(stage.program.as_ref().map(|p| p.program.id()), program);
        assert_eq!(gl.count_calls("link_program"), 1);
    }

    #[test]
    fn transform_change_invalidates_the_shader_exactly_once() {
        let gl = RecordingGl::new();
        let mut stage = passthrough_stage();
        stage.set_params(&gl, sized_params(800, 600));
        stage.execute(&gl);
        let first_program = stage.program.as_ref().map(|p| p.program.id()).unwrap();

        let mut changed = sized_params(800, 600);
        changed.looks = String::from("film");
        stage.set_params(&gl, changed);
        assert!(stage.program.is_none());
        assert_eq!(gl.deleted_programs(), vec![first_program]);

        stage.execute(&gl);
        stage.execute(&gl);
        let second_program = stage.program.as_ref().map(|p| p.program.id()).unwrap();
        assert_ne!(second_program, first_program);
        assert_eq!(gl.count_calls("link_program"), 2);
    }

    #[test]
    fn switching_to_managed_recomposes_with_lut() {
        let gl = RecordingGl::new();
        let mut stage = managed_stage();
        stage.set_params(&gl, sized_params(800, 600));
        stage.execute(&gl);
        let passthrough_program = stage.program.as_ref().map(|p| p.program.id()).unwrap();

        stage.set_params(&gl, managed_params(800, 600, 8));
        assert_eq!(gl.deleted_programs(), vec![passthrough_program]);

        stage.execute(&gl);
        let grade = stage.program.as_ref().unwrap();
        assert!(grade.lut_active);
        assert!(grade.lut_in.is_some());

        // The recomposed fragment source carries the feature marker and the
        // engine-provided transform.
        let fragment = gl
            .compiled_sources()
            .into_iter()
            .filter(|(kind, _)| *kind == ShaderStage::Fragment)
            .next_back()
            .unwrap()
            .1;
        assert!(fragment.contains(shader::LUT_DEFINE.trim()));
        assert!(fragment.contains("transformColor"));

        // One 3-D upload of exactly 3 * edge^3 floats.
        assert_eq!(gl.uploads_3d(), vec![(stage.lut.as_ref().unwrap().id, 8, 3 * 8 * 8 * 8)]);

        // Linked before the draw; the draw sees the LUT on unit 1.
        let draw = gl.draws().last().cloned().unwrap();
        assert_eq!(draw.unit1_texture_3d, stage.lut.as_ref().unwrap().id);
    }

    #[test]
    fn ambient_viewport_resize_recreates_target_only() {
        let gl = RecordingGl::new();
        gl.set_viewport([0, 0, 800, 600]);
        let mut stage = passthrough_stage();

        stage.execute(&gl);
        let (program, scratch, vertex_buffer, copy_fb) = resource_ids(&stage);
        assert_eq!(stage.params().framebuffer_size, IVec2::new(800, 600));
        assert_eq!(
            gl.framebuffer_attachment(copy_fb, Attachment::Color(0)),
            Some(scratch)
        );

        // A target-size change alone must not touch the shader.
        stage.set_params(&gl, sized_params(1920, 1080));
        stage.execute(&gl);

        let (program2, scratch2, vertex_buffer2, copy_fb2) = resource_ids(&stage);
        assert_eq!(program2, program);
        assert_eq!(vertex_buffer2, vertex_buffer);
        assert_eq!(copy_fb2, copy_fb);
        assert_ne!(scratch2, scratch);
        assert_eq!(gl.deleted_textures(), vec![scratch]);
        assert_eq!(
            gl.framebuffer_attachment(copy_fb, Attachment::Color(0)),
            Some(scratch2)
        );
    }

    #[test]
    fn draw_leaves_ambient_state_untouched() {
        let gl = RecordingGl::new();
        let mut stage = passthrough_stage();
        stage.set_params(&gl, sized_params(800, 600));

        gl.set_blend_enabled(true);
        gl.set_alpha_to_coverage(true);
        gl.set_viewport([5, 5, 640, 480]);
        gl.set_depth_compare(CompareFunc::LessOrEqual);

        stage.execute(&gl);

        // The draw itself ran with the pass's own fixed state.
        let draw = gl.draws().last().cloned().unwrap();
        assert!(!draw.blend_enabled);
        assert!(!draw.alpha_to_coverage);
        assert!(!draw.depth_write_mask);
        assert_eq!(draw.stencil_write_mask, 0);
        assert_eq!(draw.depth_compare, CompareFunc::Always);
        assert_eq!(draw.viewport, [0, 0, 800, 600]);
        assert_eq!(draw.vertex_count, 3);

        // Every touched field is back afterwards.
        assert!(gl.blend_enabled());
        assert!(gl.alpha_to_coverage_enabled());
        assert_eq!(gl.current_viewport(), [5, 5, 640, 480]);
        assert_eq!(gl.depth_compare(), CompareFunc::LessOrEqual);
        assert!(gl.depth_write_mask());
        assert_eq!(gl.active_texture_unit(), 0);
        assert!(!gl.attrib_enabled(0));
        assert!(!gl.attrib_enabled(1));
    }

    #[test]
    fn passthrough_copy_snapshots_the_bound_output() {
        let gl = RecordingGl::new();
        let mut stage = passthrough_stage();
        stage.set_params(&gl, sized_params(320, 240));

        let output = gl.create_framebuffer();
        gl.bind_framebuffer(FramebufferTarget::Both, output);
        stage.execute(&gl);

        let blit = gl.blits()[0];
        assert_eq!(blit.read_framebuffer, output);
        assert_eq!(blit.draw_framebuffer, stage.copy_framebuffer);
        assert_eq!(blit.mask, BlitMask::Color);

        // The graded draw went back into the caller's output.
        assert_eq!(gl.draws()[0].draw_framebuffer, output);
        assert_eq!(gl.bound_framebuffer(FramebufferTarget::Draw), output);
    }

    #[test]
    fn external_source_draws_into_its_framebuffer_and_restores() {
        let gl = RecordingGl::new();
        let mut stage = passthrough_stage();
        let mut params = sized_params(320, 240);
        params.source_path = Some(String::from("/render/color"));
        stage.set_params(&gl, params);

        let external = Arc::new(Texture::create(
            &gl,
            TextureDesc::color_2d("external color", 320, 240, TextureFormat::Rgba16Float),
        ));

        let output = gl.create_framebuffer();
        gl.bind_framebuffer(FramebufferTarget::Both, output);

        stage.prepare(Some(external.clone()));
        stage.execute(&gl);

        assert_eq!(
            gl.framebuffer_attachment(stage.source_framebuffer, Attachment::Color(0)),
            Some(external.id())
        );
        let blit = gl.blits()[0];
        assert_eq!(blit.read_framebuffer, stage.source_framebuffer);
        assert_eq!(blit.draw_framebuffer, stage.copy_framebuffer);

        assert_eq!(gl.draws()[0].draw_framebuffer, stage.source_framebuffer);
        assert_eq!(gl.bound_framebuffer(FramebufferTarget::Draw), output);
        assert_eq!(gl.bound_framebuffer(FramebufferTarget::Read), output);
    }

    #[test]
    fn non_color_source_kinds_are_skipped_entirely() {
        let gl = RecordingGl::new();
        let mut stage = passthrough_stage();
        let mut params = sized_params(320, 240);
        params.source_name = String::from("depth");
        stage.set_params(&gl, params);
        gl.clear_calls();

        stage.execute(&gl);
        assert_eq!(gl.call_count(), 0);
        assert!(gl.draws().is_empty());
    }

    #[test]
    fn failed_composition_skips_the_frame_and_latches() {
        let gl = RecordingGl::new();
        let mut stage = passthrough_stage();
        stage.set_params(&gl, sized_params(800, 600));

        gl.fail_next_compile(ShaderStage::Fragment);
        stage.execute(&gl);
        assert!(stage.program.is_none());
        assert!(stage.program_failed);
        assert!(gl.draws().is_empty());

        // No rebuild attempt until the next parameter change.
        let compiles = gl.count_calls("compile_shader");
        stage.execute(&gl);
        assert_eq!(gl.count_calls("compile_shader"), compiles);

        let mut changed = sized_params(800, 600);
        changed.looks = String::from("retry");
        stage.set_params(&gl, changed);
        stage.execute(&gl);
        assert!(stage.program.is_some());
        assert_eq!(gl.draws().len(), 1);
    }

    #[test]
    fn lut_texture_is_reused_for_matching_edge_and_rebuilt_otherwise() {
        let gl = RecordingGl::new();
        let mut stage = managed_stage();
        stage.set_params(&gl, managed_params(320, 240, 8));
        stage.execute(&gl);
        let first_lut = stage.lut.as_ref().unwrap().id;

        // Same edge: the rebuild refills the existing texture object.
        let mut same_edge = managed_params(320, 240, 8);
        same_edge.looks = String::from("film");
        stage.set_params(&gl, same_edge);
        stage.execute(&gl);
        assert_eq!(stage.lut.as_ref().unwrap().id, first_lut);
        assert_eq!(gl.uploads_3d().len(), 2);
        assert!(!gl.deleted_textures().contains(&first_lut));

        // Different edge: destroyed and reallocated at the new size.
        stage.set_params(&gl, managed_params(320, 240, 16));
        stage.execute(&gl);
        let second_lut = stage.lut.as_ref().unwrap().id;
        assert_ne!(second_lut, first_lut);
        assert!(gl.deleted_textures().contains(&first_lut));
        assert_eq!(stage.lut.as_ref().unwrap().edge, 16);
        let uploads = gl.uploads_3d();
        assert_eq!(uploads.last().unwrap().1, 16);
        assert_eq!(uploads.last().unwrap().2, 3 * 16 * 16 * 16);
    }

    #[test]
    fn teardown_destroys_every_cached_resource() {
        let gl = RecordingGl::new();
        let mut stage = managed_stage();
        stage.set_params(&gl, managed_params(800, 600, 8));
        stage.execute(&gl);

        let scratch = stage.scratch.get().map(|t| t.id()).unwrap();
        let lut = stage.lut.as_ref().map(|l| l.id).unwrap();
        let vertex_buffer = stage.vertex_buffer.get().map(|b| b.id()).unwrap();
        let program = stage.program.as_ref().map(|p| p.program.id()).unwrap();
        let copy_fb = stage.copy_framebuffer;
        let source_fb = stage.source_framebuffer;

        stage.destroy(&gl);

        assert!(gl.deleted_textures().contains(&scratch));
        assert!(gl.deleted_textures().contains(&lut));
        assert!(gl.deleted_buffers().contains(&vertex_buffer));
        assert!(gl.deleted_programs().contains(&program));
        assert!(gl.deleted_framebuffers().contains(&copy_fb));
        assert!(gl.deleted_framebuffers().contains(&source_fb));
        assert_eq!(stage.copy_framebuffer, 0);
        assert_eq!(stage.source_framebuffer, 0);
        assert!(stage.program.is_none());
        assert!(stage.lut.is_none());
    }

    #[test]
    fn fullscreen_triangle_covers_the_doubled_uv_range() {
        let uvs: Vec<(f32, f32)> = FULLSCREEN_TRIANGLE
            .chunks(6)
            .map(|v| (v[4], v[5]))
            .collect();
        assert_eq!(uvs, vec![(0.0, 2.0), (0.0, 0.0), (2.0, 0.0)]);
    }
}
