//! The `GlContext` trait.

use gleam::gl::{self, GLbitfield, GLenum, GLint, GLintptr, GLsizei, GLuint};

use crate::object::{Framebuffer, Program, Shader};

/// A value returned by `GlContext::get_parameter`.
#[derive(Clone, Debug, PartialEq)]
pub enum Parameter {
    Null,
    Int(GLint),
    Program(Program),
}

/// The part of a WebGL rendering context that a `WebGlSpy` needs.
///
/// This covers the entry points we know how to intercept, and the queries the
/// decoder uses to describe them. The multi-draw methods are those of the
/// `WEBGL_multi_draw` extension, with the same argument lists.
pub trait GlContext {
    fn clear(&self, mask: GLbitfield);
    fn bind_framebuffer(&self, target: GLenum, framebuffer: Option<&Framebuffer>);

    fn draw_elements(&self, mode: GLenum, count: GLsizei, element_type: GLenum, offset: GLintptr);

    fn draw_elements_instanced(
        &self,
        mode: GLenum,
        count: GLsizei,
        element_type: GLenum,
        offset: GLintptr,
        instance_count: GLsizei,
    );

    fn multi_draw_elements(
        &self,
        mode: GLenum,
        counts: &[GLsizei],
        counts_offset: GLuint,
        element_type: GLenum,
        offsets: &[GLsizei],
        offsets_offset: GLuint,
        draw_count: GLsizei,
    );

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
    );

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei);
    fn draw_arrays_instanced(&self, mode: GLenum, first: GLint, count: GLsizei, instance_count: GLsizei);

    fn multi_draw_arrays(
        &self,
        mode: GLenum,
        firsts: &[GLint],
        firsts_offset: GLuint,
        counts: &[GLsizei],
        counts_offset: GLuint,
        draw_count: GLsizei,
    );

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
    );

    /// Returns `None` if the context is lost.
    fn create_framebuffer(&self) -> Option<Framebuffer>;

    fn get_parameter(&self, pname: GLenum) -> Parameter;
    fn get_attached_shaders(&self, program: &Program) -> Vec<Shader>;
    fn get_shader_source(&self, shader: &Shader) -> Option<String>;

    /// Look up one of the context's named constants, like `"TRIANGLES"`.
    ///
    /// The default implementation knows the standard values of the constants
    /// the decoder asks about.
    fn constant(&self, name: &str) -> Option<GLenum> {
        standard_constant(name)
    }
}

pub fn standard_constant(name: &str) -> Option<GLenum> {
    Some(match name {
        "POINTS" => gl::POINTS,
        "LINES" => gl::LINES,
        "LINE_LOOP" => gl::LINE_LOOP,
        "LINE_STRIP" => gl::LINE_STRIP,
        "TRIANGLES" => gl::TRIANGLES,
        "TRIANGLE_STRIP" => gl::TRIANGLE_STRIP,
        "TRIANGLE_FAN" => gl::TRIANGLE_FAN,
        "DEPTH_BUFFER_BIT" => gl::DEPTH_BUFFER_BIT,
        "STENCIL_BUFFER_BIT" => gl::STENCIL_BUFFER_BIT,
        "COLOR_BUFFER_BIT" => gl::COLOR_BUFFER_BIT,
        "CURRENT_PROGRAM" => gl::CURRENT_PROGRAM,
        "FRAMEBUFFER" => gl::FRAMEBUFFER,
        _ => return None,
    })
}

#[test]
fn test_standard_constants() {
    assert_eq!(standard_constant("POINTS"), Some(0));
    assert_eq!(standard_constant("TRIANGLES"), Some(4));
    assert_eq!(standard_constant("CURRENT_PROGRAM"), Some(35725));
    assert_eq!(standard_constant("DEPTH_BUFFER_BIT"), Some(256));
    assert_eq!(standard_constant("triangles"), None);
}
