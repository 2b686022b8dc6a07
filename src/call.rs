//! A representation for intercepted `GlContext` method calls.

use gleam::gl::{GLbitfield, GLenum, GLint, GLintptr, GLsizei, GLuint};
use std::fmt;

use crate::object::Framebuffer;

/// A `GlContext` method that `Intercepted` can hook.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Clear,
    BindFramebuffer,
    DrawElements,
    DrawElementsInstanced,
    MultiDrawElements,
    MultiDrawElementsInstanced,
    DrawArrays,
    DrawArraysInstanced,
    MultiDrawArrays,
    MultiDrawArraysInstanced,
    CreateFramebuffer,
}

impl Method {
    /// The methods whose calls a `WebGlSpy` records.
    ///
    /// These are the entry points three.js's buffer renderers issue draws
    /// through, plus the clears and framebuffer binds around them.
    pub const CAPTURED: [Method; 10] = [
        Method::Clear,
        Method::BindFramebuffer,
        Method::DrawElements,
        Method::DrawElementsInstanced,
        Method::MultiDrawElements,
        Method::MultiDrawElementsInstanced,
        Method::DrawArrays,
        Method::DrawArraysInstanced,
        Method::MultiDrawArrays,
        Method::MultiDrawArraysInstanced,
    ];

    /// The method's name in the WebGL API.
    pub fn name(self) -> &'static str {
        match self {
            Method::Clear => "clear",
            Method::BindFramebuffer => "bindFramebuffer",
            Method::DrawElements => "drawElements",
            Method::DrawElementsInstanced => "drawElementsInstanced",
            Method::MultiDrawElements => "multiDrawElementsWEBGL",
            Method::MultiDrawElementsInstanced => "multiDrawElementsInstancedWEBGL",
            Method::DrawArrays => "drawArrays",
            Method::DrawArraysInstanced => "drawArraysInstanced",
            Method::MultiDrawArrays => "multiDrawArraysWEBGL",
            Method::MultiDrawArraysInstanced => "multiDrawArraysInstancedWEBGL",
            Method::CreateFramebuffer => "createFramebuffer",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

/// A call to one of the `Method::CAPTURED` methods, with its arguments.
///
/// Variant and field names follow the `GlContext` methods and their
/// parameters.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug)]
#[rustfmt::skip]
pub enum Call<'a> {
    clear { mask: GLbitfield },
    bind_framebuffer { target: GLenum, framebuffer: Option<&'a Framebuffer> },
    draw_elements { mode: GLenum, count: GLsizei, element_type: GLenum, offset: GLintptr },
    draw_elements_instanced { mode: GLenum, count: GLsizei, element_type: GLenum, offset: GLintptr, instance_count: GLsizei },
    multi_draw_elements { mode: GLenum, counts: &'a [GLsizei], counts_offset: GLuint, element_type: GLenum, offsets: &'a [GLsizei], offsets_offset: GLuint, draw_count: GLsizei },
    multi_draw_elements_instanced { mode: GLenum, counts: &'a [GLsizei], counts_offset: GLuint, element_type: GLenum, offsets: &'a [GLsizei], offsets_offset: GLuint, instance_counts: &'a [GLsizei], instance_counts_offset: GLuint, draw_count: GLsizei },
    draw_arrays { mode: GLenum, first: GLint, count: GLsizei },
    draw_arrays_instanced { mode: GLenum, first: GLint, count: GLsizei, instance_count: GLsizei },
    multi_draw_arrays { mode: GLenum, firsts: &'a [GLint], firsts_offset: GLuint, counts: &'a [GLsizei], counts_offset: GLuint, draw_count: GLsizei },
    multi_draw_arrays_instanced { mode: GLenum, firsts: &'a [GLint], firsts_offset: GLuint, counts: &'a [GLsizei], counts_offset: GLuint, instance_counts: &'a [GLsizei], instance_counts_offset: GLuint, draw_count: GLsizei },
}

/// One positional argument of a `Call`.
///
/// The `Display` implementation renders the argument the way a browser
/// stringifies it: lists are comma-separated, and an absent object is `null`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Arg<'a> {
    Int(i64),
    List(&'a [GLint]),
    Framebuffer(Option<&'a Framebuffer>),
}

impl<'a> Call<'a> {
    pub fn method(&self) -> Method {
        use Call::*;
        match *self {
            clear { .. } => Method::Clear,
            bind_framebuffer { .. } => Method::BindFramebuffer,
            draw_elements { .. } => Method::DrawElements,
            draw_elements_instanced { .. } => Method::DrawElementsInstanced,
            multi_draw_elements { .. } => Method::MultiDrawElements,
            multi_draw_elements_instanced { .. } => Method::MultiDrawElementsInstanced,
            draw_arrays { .. } => Method::DrawArrays,
            draw_arrays_instanced { .. } => Method::DrawArraysInstanced,
            multi_draw_arrays { .. } => Method::MultiDrawArrays,
            multi_draw_arrays_instanced { .. } => Method::MultiDrawArraysInstanced,
        }
    }

    /// Return the call's `index`'th argument, counting from zero, or `None`
    /// if the method takes fewer arguments than that.
    pub fn arg(&self, index: usize) -> Option<Arg<'a>> {
        self.args().into_iter().nth(index)
    }

    /// Return all the call's arguments, in the order the method takes them.
    #[rustfmt::skip]
    pub fn args(&self) -> Vec<Arg<'a>> {
        use Call::*;
        use Arg::{Int, List};

        // `GLintptr` is the only argument type that could exceed `i64`, and
        // only on targets wider than 64 bits.
        match *self {
            clear { mask } => vec![Int(mask.into())],
            bind_framebuffer { target, framebuffer } => vec![Int(target.into()), Arg::Framebuffer(framebuffer)],
            draw_elements { mode, count, element_type, offset } =>
                vec![Int(mode.into()), Int(count.into()), Int(element_type.into()), Int(offset as i64)],
            draw_elements_instanced { mode, count, element_type, offset, instance_count } =>
                vec![Int(mode.into()), Int(count.into()), Int(element_type.into()), Int(offset as i64), Int(instance_count.into())],
            multi_draw_elements { mode, counts, counts_offset, element_type, offsets, offsets_offset, draw_count } =>
                vec![Int(mode.into()), List(counts), Int(counts_offset.into()), Int(element_type.into()),
                     List(offsets), Int(offsets_offset.into()), Int(draw_count.into())],
            multi_draw_elements_instanced { mode, counts, counts_offset, element_type, offsets, offsets_offset,
                                            instance_counts, instance_counts_offset, draw_count } =>
                vec![Int(mode.into()), List(counts), Int(counts_offset.into()), Int(element_type.into()),
                     List(offsets), Int(offsets_offset.into()), List(instance_counts), Int(instance_counts_offset.into()),
                     Int(draw_count.into())],
            draw_arrays { mode, first, count } => vec![Int(mode.into()), Int(first.into()), Int(count.into())],
            draw_arrays_instanced { mode, first, count, instance_count } =>
                vec![Int(mode.into()), Int(first.into()), Int(count.into()), Int(instance_count.into())],
            multi_draw_arrays { mode, firsts, firsts_offset, counts, counts_offset, draw_count } =>
                vec![Int(mode.into()), List(firsts), Int(firsts_offset.into()), List(counts),
                     Int(counts_offset.into()), Int(draw_count.into())],
            multi_draw_arrays_instanced { mode, firsts, firsts_offset, counts, counts_offset,
                                          instance_counts, instance_counts_offset, draw_count } =>
                vec![Int(mode.into()), List(firsts), Int(firsts_offset.into()), List(counts),
                     Int(counts_offset.into()), List(instance_counts), Int(instance_counts_offset.into()),
                     Int(draw_count.into())],
        }
    }
}

impl fmt::Display for Arg<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Arg::Int(value) => write!(fmt, "{}", value),
            Arg::List(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        fmt.write_str(",")?;
                    }
                    write!(fmt, "{}", value)?;
                }
                Ok(())
            }
            Arg::Framebuffer(None) => fmt.write_str("null"),
            Arg::Framebuffer(Some(_)) => fmt.write_str("[object WebGLFramebuffer]"),
        }
    }
}

#[test]
fn test_args() {
    let call = Call::draw_arrays { mode: 4, first: 0, count: 36 };
    assert_eq!(call.method(), Method::DrawArrays);
    assert_eq!(call.arg(0), Some(Arg::Int(4)));
    assert_eq!(call.arg(2), Some(Arg::Int(36)));
    assert_eq!(call.arg(3), None);

    let call = Call::multi_draw_arrays {
        mode: 4,
        firsts: &[0, 3],
        firsts_offset: 0,
        counts: &[3, 3],
        counts_offset: 0,
        draw_count: 2,
    };
    assert_eq!(call.method().name(), "multiDrawArraysWEBGL");
    assert_eq!(call.args().len(), 6);
    assert_eq!(call.arg(1).map(|arg| arg.to_string()), Some("0,3".to_string()));
}

#[test]
fn test_display_framebuffer_arg() {
    let framebuffer = Framebuffer::new(7);
    assert_eq!(Arg::Framebuffer(None).to_string(), "null");
    assert_eq!(Arg::Framebuffer(Some(&framebuffer)).to_string(), "[object WebGLFramebuffer]");
    assert_eq!(Arg::List(&[]).to_string(), "");
}
