//! In-memory test double for [`GlApi`].
//!
//! `RecordingGl` simulates the device's ambient state (bindings, toggles,
//! id namespaces) and keeps an ordered log of every entry point hit, so
//! tests can assert both the calls an operation made and the state it left
//! behind. Interior mutability mirrors the `&self` receiver of the trait.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use crate::device::GlApi;
use crate::types::{
    Attachment, Barrier, BlendFactor, BlendOp, BlitMask, BufferTarget, CompareFunc, Filter,
    FramebufferTarget, PixelTransfer, ShaderStage, TextureFormat, TextureKind,
};

/// Ambient state observed at the moment of a draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: u32,
    pub viewport: [i32; 4],
    pub depth_write_mask: bool,
    pub stencil_write_mask: u32,
    pub depth_compare: CompareFunc,
    pub blend_enabled: bool,
    pub alpha_to_coverage: bool,
    pub draw_framebuffer: u32,
    pub unit0_texture_2d: u32,
    pub unit1_texture_3d: u32,
    pub vertex_count: i32,
}

/// Read/draw bindings observed at the moment of a blit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlitRecord {
    pub read_framebuffer: u32,
    pub draw_framebuffer: u32,
    pub mask: BlitMask,
}

#[derive(Debug, Default)]
struct IdSpace {
    next: u32,
    alive: HashSet<u32>,
    deleted: Vec<u32>,
}

impl IdSpace {
    fn allocate(&mut self) -> u32 {
        self.next += 1;
        self.alive.insert(self.next);
        self.next
    }

    fn delete(&mut self, id: u32) {
        if self.alive.remove(&id) {
            self.deleted.push(id);
        }
    }
}

#[derive(Debug, Default)]
struct ProgramRecord {
    uniforms: HashMap<String, i32>,
    attribs: HashMap<String, u32>,
}

#[derive(Debug)]
struct State {
    textures: IdSpace,
    buffers: IdSpace,
    framebuffers: IdSpace,
    shaders: IdSpace,
    programs: IdSpace,
    program_interfaces: HashMap<u32, ProgramRecord>,

    read_framebuffer: u32,
    draw_framebuffer: u32,
    viewport: [i32; 4],
    scissor: [i32; 4],
    depth_write_mask: bool,
    stencil_write_mask: u32,
    depth_compare: CompareFunc,
    blend_enabled: bool,
    alpha_to_coverage: bool,
    active_texture_unit: u32,
    bound_textures: HashMap<(u32, TextureKind), u32>,
    bound_array_buffer: u32,
    bound_element_buffer: u32,
    current_program: u32,

    buffer_contents: HashMap<u32, Vec<u8>>,
    framebuffer_attachments: HashMap<(u32, Attachment), u32>,
    vertex_bindings: HashMap<u32, (u32, i32, i32)>,
    enabled_attribs: HashSet<u32>,
    uploads_3d: Vec<(u32, i32, usize)>,
    draws: Vec<DrawRecord>,
    blits: Vec<BlitRecord>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            textures: IdSpace::default(),
            buffers: IdSpace::default(),
            framebuffers: IdSpace::default(),
            shaders: IdSpace::default(),
            programs: IdSpace::default(),
            program_interfaces: HashMap::new(),
            read_framebuffer: 0,
            draw_framebuffer: 0,
            viewport: [0, 0, 0, 0],
            scissor: [0, 0, 0, 0],
            depth_write_mask: true,
            stencil_write_mask: u32::MAX,
            depth_compare: CompareFunc::Less,
            blend_enabled: false,
            alpha_to_coverage: false,
            active_texture_unit: 0,
            bound_textures: HashMap::new(),
            bound_array_buffer: 0,
            bound_element_buffer: 0,
            current_program: 0,
            buffer_contents: HashMap::new(),
            framebuffer_attachments: HashMap::new(),
            vertex_bindings: HashMap::new(),
            enabled_attribs: HashSet::new(),
            uploads_3d: Vec::new(),
            draws: Vec::new(),
            blits: Vec::new(),
        }
    }
}

pub struct RecordingGl {
    state: RefCell<State>,
    calls: RefCell<Vec<String>>,
    errors: RefCell<Vec<u32>>,
    compiled_sources: RefCell<Vec<(ShaderStage, String)>>,
    fail_compile: Cell<Option<ShaderStage>>,
    fail_link: Cell<bool>,
}

impl Default for RecordingGl {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingGl {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State::default()),
            calls: RefCell::new(Vec::new()),
            errors: RefCell::new(Vec::new()),
            compiled_sources: RefCell::new(Vec::new()),
            fail_compile: Cell::new(None),
            fail_link: Cell::new(false),
        }
    }

    fn record(&self, name: &str) {
        self.calls.borrow_mut().push(name.to_owned());
    }

    // Test-side inspection.

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn count_calls(&self, name: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == name).count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn deleted_textures(&self) -> Vec<u32> {
        self.state.borrow().textures.deleted.clone()
    }

    pub fn deleted_framebuffers(&self) -> Vec<u32> {
        self.state.borrow().framebuffers.deleted.clone()
    }

    pub fn deleted_buffers(&self) -> Vec<u32> {
        self.state.borrow().buffers.deleted.clone()
    }

    pub fn deleted_programs(&self) -> Vec<u32> {
        self.state.borrow().programs.deleted.clone()
    }

    pub fn live_texture_count(&self) -> usize {
        self.state.borrow().textures.alive.len()
    }

    pub fn live_framebuffer_count(&self) -> usize {
        self.state.borrow().framebuffers.alive.len()
    }

    pub fn live_buffer_count(&self) -> usize {
        self.state.borrow().buffers.alive.len()
    }

    pub fn live_shader_count(&self) -> usize {
        self.state.borrow().shaders.alive.len()
    }

    pub fn live_program_count(&self) -> usize {
        self.state.borrow().programs.alive.len()
    }

    pub fn current_scissor(&self) -> [i32; 4] {
        self.state.borrow().scissor
    }

    pub fn bound_buffer(&self, target: BufferTarget) -> u32 {
        let state = self.state.borrow();
        match target {
            BufferTarget::Array => state.bound_array_buffer,
            BufferTarget::ElementArray => state.bound_element_buffer,
        }
    }

    pub fn buffer_contents(&self, buffer: u32, offset: usize, len: usize) -> Vec<u8> {
        let state = self.state.borrow();
        state
            .buffer_contents
            .get(&buffer)
            .map(|data| data[offset..offset + len].to_vec())
            .unwrap_or_default()
    }

    pub fn framebuffer_attachment(&self, framebuffer: u32, attachment: Attachment) -> Option<u32> {
        self.state
            .borrow()
            .framebuffer_attachments
            .get(&(framebuffer, attachment))
            .copied()
            .filter(|&id| id != 0)
    }

    pub fn vertex_binding(&self, binding: u32) -> Option<(u32, i32, i32)> {
        self.state.borrow().vertex_bindings.get(&binding).copied()
    }

    pub fn attrib_enabled(&self, index: u32) -> bool {
        self.state.borrow().enabled_attribs.contains(&index)
    }

    pub fn uploads_3d(&self) -> Vec<(u32, i32, usize)> {
        self.state.borrow().uploads_3d.clone()
    }

    pub fn draws(&self) -> Vec<DrawRecord> {
        self.state.borrow().draws.clone()
    }

    pub fn blits(&self) -> Vec<BlitRecord> {
        self.state.borrow().blits.clone()
    }

    /// Every source text handed to `compile_shader`, in call order.
    pub fn compiled_sources(&self) -> Vec<(ShaderStage, String)> {
        self.compiled_sources.borrow().clone()
    }

    // Failure injection.

    pub fn fail_next_compile(&self, stage: ShaderStage) {
        self.fail_compile.set(Some(stage));
    }

    pub fn fail_next_link(&self) {
        self.fail_link.set(true);
    }

    pub fn inject_error(&self, code: u32) {
        self.errors.borrow_mut().push(code);
    }

    fn draw_record(&self, vertex_count: i32) -> DrawRecord {
        let state = self.state.borrow();
        DrawRecord {
            program: state.current_program,
            viewport: state.viewport,
            depth_write_mask: state.depth_write_mask,
            stencil_write_mask: state.stencil_write_mask,
            depth_compare: state.depth_compare,
            blend_enabled: state.blend_enabled,
            alpha_to_coverage: state.alpha_to_coverage,
            draw_framebuffer: state.draw_framebuffer,
            unit0_texture_2d: state
                .bound_textures
                .get(&(0, TextureKind::TwoD))
                .copied()
                .unwrap_or(0),
            unit1_texture_3d: state
                .bound_textures
                .get(&(1, TextureKind::ThreeD))
                .copied()
                .unwrap_or(0),
            vertex_count,
        }
    }
}

impl GlApi for RecordingGl {
    fn pending_error(&self) -> u32 {
        let mut errors = self.errors.borrow_mut();
        if errors.is_empty() { 0 } else { errors.remove(0) }
    }

    fn push_debug_group(&self, _label: &str) {
        self.record("push_debug_group");
    }

    fn pop_debug_group(&self) {
        self.record("pop_debug_group");
    }

    fn bound_framebuffer(&self, target: FramebufferTarget) -> u32 {
        let state = self.state.borrow();
        match target {
            FramebufferTarget::Read => state.read_framebuffer,
            FramebufferTarget::Draw | FramebufferTarget::Both => state.draw_framebuffer,
        }
    }

    fn current_viewport(&self) -> [i32; 4] {
        self.state.borrow().viewport
    }

    fn depth_write_mask(&self) -> bool {
        self.state.borrow().depth_write_mask
    }

    fn stencil_write_mask(&self) -> u32 {
        self.state.borrow().stencil_write_mask
    }

    fn depth_compare(&self) -> CompareFunc {
        self.state.borrow().depth_compare
    }

    fn blend_enabled(&self) -> bool {
        self.state.borrow().blend_enabled
    }

    fn alpha_to_coverage_enabled(&self) -> bool {
        self.state.borrow().alpha_to_coverage
    }

    fn active_texture_unit(&self) -> u32 {
        self.state.borrow().active_texture_unit
    }

    fn bound_texture(&self, kind: TextureKind) -> u32 {
        let state = self.state.borrow();
        state
            .bound_textures
            .get(&(state.active_texture_unit, kind))
            .copied()
            .unwrap_or(0)
    }

    fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: u32) {
        self.record("bind_framebuffer");
        let mut state = self.state.borrow_mut();
        match target {
            FramebufferTarget::Read => state.read_framebuffer = framebuffer,
            FramebufferTarget::Draw => state.draw_framebuffer = framebuffer,
            FramebufferTarget::Both => {
                state.read_framebuffer = framebuffer;
                state.draw_framebuffer = framebuffer;
            }
        }
    }

    fn set_viewport(&self, rect: [i32; 4]) {
        self.record("set_viewport");
        self.state.borrow_mut().viewport = rect;
    }

    fn set_scissor(&self, rect: [i32; 4]) {
        self.record("set_scissor");
        self.state.borrow_mut().scissor = rect;
    }

    fn set_depth_write_mask(&self, enabled: bool) {
        self.record("set_depth_write_mask");
        self.state.borrow_mut().depth_write_mask = enabled;
    }

    fn set_stencil_write_mask(&self, mask: u32) {
        self.record("set_stencil_write_mask");
        self.state.borrow_mut().stencil_write_mask = mask;
    }

    fn set_depth_compare(&self, func: CompareFunc) {
        self.record("set_depth_compare");
        self.state.borrow_mut().depth_compare = func;
    }

    fn set_blend_enabled(&self, enabled: bool) {
        self.record("set_blend_enabled");
        self.state.borrow_mut().blend_enabled = enabled;
    }

    fn set_alpha_to_coverage(&self, enabled: bool) {
        self.record("set_alpha_to_coverage");
        self.state.borrow_mut().alpha_to_coverage = enabled;
    }

    fn set_active_texture_unit(&self, unit: u32) {
        self.record("set_active_texture_unit");
        self.state.borrow_mut().active_texture_unit = unit;
    }

    fn create_texture(&self) -> u32 {
        self.record("create_texture");
        self.state.borrow_mut().textures.allocate()
    }

    fn delete_texture(&self, texture: u32) {
        self.record("delete_texture");
        self.state.borrow_mut().textures.delete(texture);
    }

    fn bind_texture(&self, kind: TextureKind, texture: u32) {
        self.record("bind_texture");
        let mut state = self.state.borrow_mut();
        let unit = state.active_texture_unit;
        state.bound_textures.insert((unit, kind), texture);
    }

    fn set_texture_sampling(&self, _kind: TextureKind, _filter: Filter) {
        self.record("set_texture_sampling");
    }

    fn allocate_texture_2d(&self, _format: TextureFormat, _width: i32, _height: i32) {
        self.record("allocate_texture_2d");
    }

    fn upload_texture_3d(&self, _format: TextureFormat, edge: i32, texels: &[f32]) {
        self.record("upload_texture_3d");
        let mut state = self.state.borrow_mut();
        let unit = state.active_texture_unit;
        let bound = state
            .bound_textures
            .get(&(unit, TextureKind::ThreeD))
            .copied()
            .unwrap_or(0);
        state.uploads_3d.push((bound, edge, texels.len()));
    }

    fn read_texture(
        &self,
        _texture: u32,
        _mip_level: i32,
        _offset: [i32; 3],
        _extent: [i32; 3],
        _transfer: PixelTransfer,
        destination: &mut [u8],
    ) {
        self.record("read_texture");
        destination.fill(0);
    }

    fn create_framebuffer(&self) -> u32 {
        self.record("create_framebuffer");
        self.state.borrow_mut().framebuffers.allocate()
    }

    fn delete_framebuffer(&self, framebuffer: u32) {
        self.record("delete_framebuffer");
        self.state.borrow_mut().framebuffers.delete(framebuffer);
    }

    fn attach_framebuffer_texture(
        &self,
        framebuffer: u32,
        attachment: Attachment,
        _kind: TextureKind,
        texture: u32,
    ) {
        self.record("attach_framebuffer_texture");
        self.state
            .borrow_mut()
            .framebuffer_attachments
            .insert((framebuffer, attachment), texture);
    }

    fn set_framebuffer_draw_targets(&self, _framebuffer: u32, _slots: &[Option<u32>]) {
        self.record("set_framebuffer_draw_targets");
    }

    fn framebuffer_complete(&self, framebuffer: u32) -> bool {
        self.record("framebuffer_complete");
        self.state.borrow().framebuffers.alive.contains(&framebuffer)
    }

    fn blit_framebuffer(&self, _src: [i32; 4], _dst: [i32; 4], mask: BlitMask, _filter: Filter) {
        self.record("blit_framebuffer");
        let mut state = self.state.borrow_mut();
        let record = BlitRecord {
            read_framebuffer: state.read_framebuffer,
            draw_framebuffer: state.draw_framebuffer,
            mask,
        };
        state.blits.push(record);
    }

    fn clear_color_attachment(&self, _slot: u32, _value: [f32; 4]) {
        self.record("clear_color_attachment");
    }

    fn clear_depth_attachment(&self, _value: f32) {
        self.record("clear_depth_attachment");
    }

    fn create_buffer(&self) -> u32 {
        self.record("create_buffer");
        self.state.borrow_mut().buffers.allocate()
    }

    fn delete_buffer(&self, buffer: u32) {
        self.record("delete_buffer");
        self.state.borrow_mut().buffers.delete(buffer);
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: u32) {
        self.record("bind_buffer");
        let mut state = self.state.borrow_mut();
        match target {
            BufferTarget::Array => state.bound_array_buffer = buffer,
            BufferTarget::ElementArray => state.bound_element_buffer = buffer,
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        self.record("buffer_data");
        let mut state = self.state.borrow_mut();
        let buffer = match target {
            BufferTarget::Array => state.bound_array_buffer,
            BufferTarget::ElementArray => state.bound_element_buffer,
        };
        state.buffer_contents.insert(buffer, data.to_vec());
    }

    fn buffer_sub_data(&self, buffer: u32, destination_offset: i32, data: &[u8]) {
        self.record("buffer_sub_data");
        let mut state = self.state.borrow_mut();
        let contents = state.buffer_contents.entry(buffer).or_default();
        let end = destination_offset as usize + data.len();
        if contents.len() < end {
            contents.resize(end, 0);
        }
        contents[destination_offset as usize..end].copy_from_slice(data);
    }

    fn bind_vertex_buffer(&self, binding: u32, buffer: u32, offset: i32, stride: i32) {
        self.record("bind_vertex_buffer");
        self.state
            .borrow_mut()
            .vertex_bindings
            .insert(binding, (buffer, offset, stride));
    }

    fn memory_barrier(&self, _barrier: Barrier) {
        self.record("memory_barrier");
    }

    fn vertex_attrib_pointer(&self, _index: u32, _components: i32, _stride: i32, _offset: i32) {
        self.record("vertex_attrib_pointer");
    }

    fn enable_vertex_attrib(&self, index: u32) {
        self.record("enable_vertex_attrib");
        self.state.borrow_mut().enabled_attribs.insert(index);
    }

    fn disable_vertex_attrib(&self, index: u32) {
        self.record("disable_vertex_attrib");
        self.state.borrow_mut().enabled_attribs.remove(&index);
    }

    fn draw_arrays(&self, _first: i32, count: i32) {
        self.record("draw_arrays");
        let record = self.draw_record(count);
        self.state.borrow_mut().draws.push(record);
    }

    fn draw_indexed(
        &self,
        index_count: i32,
        _index_byte_offset: i32,
        _instance_count: i32,
        _base_vertex: i32,
    ) {
        self.record("draw_indexed");
        let record = self.draw_record(index_count);
        self.state.borrow_mut().draws.push(record);
    }

    fn set_blend_func(
        &self,
        _slot: u32,
        _src_color: BlendFactor,
        _dst_color: BlendFactor,
        _src_alpha: BlendFactor,
        _dst_alpha: BlendFactor,
    ) {
        self.record("set_blend_func");
    }

    fn set_blend_equation(&self, _slot: u32, _color_op: BlendOp, _alpha_op: BlendOp) {
        self.record("set_blend_equation");
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<u32, String> {
        self.record("compile_shader");
        self.compiled_sources
            .borrow_mut()
            .push((stage, source.to_owned()));
        if self.fail_compile.get() == Some(stage) {
            self.fail_compile.set(None);
            return Err(String::from("forced compile failure"));
        }
        Ok(self.state.borrow_mut().shaders.allocate())
    }

    fn delete_shader(&self, shader: u32) {
        self.record("delete_shader");
        self.state.borrow_mut().shaders.delete(shader);
    }

    fn link_program(&self, shaders: &[u32]) -> Result<u32, String> {
        self.record("link_program");
        let mut state = self.state.borrow_mut();
        for &shader in shaders {
            state.shaders.delete(shader);
        }
        if self.fail_link.get() {
            self.fail_link.set(false);
            return Err(String::from("forced link failure"));
        }
        let id = state.programs.allocate();
        state.program_interfaces.insert(id, ProgramRecord::default());
        Ok(id)
    }

    fn delete_program(&self, program: u32) {
        self.record("delete_program");
        self.state.borrow_mut().programs.delete(program);
    }

    fn use_program(&self, program: u32) {
        self.record("use_program");
        self.state.borrow_mut().current_program = program;
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<i32> {
        let mut state = self.state.borrow_mut();
        let interface = state.program_interfaces.get_mut(&program)?;
        let next = interface.uniforms.len() as i32;
        Some(*interface.uniforms.entry(name.to_owned()).or_insert(next))
    }

    fn attrib_location(&self, program: u32, name: &str) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        let interface = state.program_interfaces.get_mut(&program)?;
        let next = interface.attribs.len() as u32;
        Some(*interface.attribs.entry(name.to_owned()).or_insert(next))
    }

    fn set_uniform_i32(&self, _location: i32, _value: i32) {
        self.record("set_uniform_i32");
    }
}
