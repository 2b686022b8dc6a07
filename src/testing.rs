//! A stand-in `GlContext` for tests.

use gleam::gl::{self, GLbitfield, GLenum, GLint, GLintptr, GLsizei, GLuint};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::context::{self, GlContext, Parameter};
use crate::object::{Framebuffer, Program, Shader};

/// A `GlContext` that draws nothing, but remembers which methods were called,
/// and which program is current.
#[derive(Default)]
pub struct FakeGl {
    /// The WebGL names of the entry points called, in order.
    forwarded: RefCell<Vec<&'static str>>,
    next_name: Cell<GLuint>,
    current_program: RefCell<Option<Program>>,
    attached: RefCell<Vec<(Program, Vec<Shader>)>>,
    sources: RefCell<Vec<(Shader, String)>>,
    constants: RefCell<HashMap<String, GLenum>>,
    parameter_queries: Cell<usize>,
    lost: Cell<bool>,
}

impl FakeGl {
    pub fn new() -> FakeGl {
        FakeGl::default()
    }

    pub fn forwarded(&self) -> Vec<&'static str> {
        self.forwarded.borrow().clone()
    }

    /// Create a program with a single shader whose source is `source`.
    pub fn create_program(&self, source: &str) -> Program {
        let program = Program::new(self.gen_name());
        let shader = Shader::new(self.gen_name());
        self.sources.borrow_mut().push((shader.clone(), source.to_string()));
        self.attached.borrow_mut().push((program.clone(), vec![shader]));
        program
    }

    pub fn use_program(&self, program: Option<&Program>) {
        *self.current_program.borrow_mut() = program.cloned();
    }

    /// Give the constant `name` a nonstandard value.
    pub fn set_constant(&self, name: &str, value: GLenum) {
        self.constants.borrow_mut().insert(name.to_string(), value);
    }

    pub fn parameter_queries(&self) -> usize {
        self.parameter_queries.get()
    }

    /// Make `create_framebuffer` fail from now on.
    pub fn lose_context(&self) {
        self.lost.set(true);
    }

    fn gen_name(&self) -> GLuint {
        let name = self.next_name.get() + 1;
        self.next_name.set(name);
        name
    }

    fn forward(&self, method: &'static str) {
        self.forwarded.borrow_mut().push(method);
    }
}

#[allow(unused_variables)]
impl GlContext for FakeGl {
    fn clear(&self, mask: GLbitfield) {
        self.forward("clear");
    }

    fn bind_framebuffer(&self, target: GLenum, framebuffer: Option<&Framebuffer>) {
        self.forward("bindFramebuffer");
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, element_type: GLenum, offset: GLintptr) {
        self.forward("drawElements");
    }

    fn draw_elements_instanced(
        &self,
        mode: GLenum,
        count: GLsizei,
        element_type: GLenum,
        offset: GLintptr,
        instance_count: GLsizei,
    ) {
        self.forward("drawElementsInstanced");
    }

    fn multi_draw_elements(
        &self,
        mode: GLenum,
        counts: &[GLsizei],
        counts_offset: GLuint,
        element_type: GLenum,
        offsets: &[GLsizei],
        offsets_offset: GLuint,
        draw_count: GLsizei,
    ) {
        self.forward("multiDrawElementsWEBGL");
    }

    fn multi_draw_elements_instanced(
        &self,
        mode: GLenum,
        counts: &[GLsizei],
        counts_offset: GLuint,
        element_type: GLenum,
        offsets: &[GLsizei],
        offsets_offset: GLuint,
        instance_counts: &[GLsizei],
        instance_counts_offset: GLuint,
        draw_count: GLsizei,
    ) {
        self.forward("multiDrawElementsInstancedWEBGL");
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        self.forward("drawArrays");
    }

    fn draw_arrays_instanced(&self, mode: GLenum, first: GLint, count: GLsizei, instance_count: GLsizei) {
        self.forward("drawArraysInstanced");
    }

    fn multi_draw_arrays(
        &self,
        mode: GLenum,
        firsts: &[GLint],
        firsts_offset: GLuint,
        counts: &[GLsizei],
        counts_offset: GLuint,
        draw_count: GLsizei,
    ) {
        self.forward("multiDrawArraysWEBGL");
    }

    fn multi_draw_arrays_instanced(
        &self,
        mode: GLenum,
        firsts: &[GLint],
        firsts_offset: GLuint,
        counts: &[GLsizei],
        counts_offset: GLuint,
        instance_counts: &[GLsizei],
        instance_counts_offset: GLuint,
        draw_count: GLsizei,
    ) {
        self.forward("multiDrawArraysInstancedWEBGL");
    }

    fn create_framebuffer(&self) -> Option<Framebuffer> {
        self.forward("createFramebuffer");
        if self.lost.get() {
            return None;
        }
        Some(Framebuffer::new(self.gen_name()))
    }

    fn get_parameter(&self, pname: GLenum) -> Parameter {
        self.parameter_queries.set(self.parameter_queries.get() + 1);
        match (pname, &*self.current_program.borrow()) {
            (gl::CURRENT_PROGRAM, Some(program)) => Parameter::Program(program.clone()),
            _ => Parameter::Null,
        }
    }

    fn get_attached_shaders(&self, program: &Program) -> Vec<Shader> {
        self.attached
            .borrow()
            .iter()
            .find(|(attached_to, _)| attached_to == program)
            .map(|(_, shaders)| shaders.clone())
            .unwrap_or_default()
    }

    fn get_shader_source(&self, shader: &Shader) -> Option<String> {
        self.sources
            .borrow()
            .iter()
            .find(|(source_of, _)| source_of == shader)
            .map(|(_, source)| source.clone())
    }

    fn constant(&self, name: &str) -> Option<GLenum> {
        match self.constants.borrow().get(name) {
            Some(&value) => Some(value),
            None => context::standard_constant(name),
        }
    }
}
