//! Readable traces of the draw calls a WebGL context is asked to make.
//!
//! This crate's `Intercepted` type wraps a `GlContext`, passes every call
//! along to it, and lets hooks watch calls to particular methods. A
//! `WebGlSpy` installs hooks that describe each clear, framebuffer bind, and
//! draw call as a `CallRecord`: the draw mode and counts, the buffers
//! cleared, which framebuffer was bound, and the name of the shader program
//! in use. Call `start_capture`, render a frame, and `end_capture` returns
//! the frame's calls in order.
//!
//! Programs are named by a `#define SHADER_NAME` directive in their first
//! shader's source, as three.js and Babylon.js write them; see the
//! `shader_name` module. Framebuffers are numbered as they are created,
//! while a spy is watching.
//!
//! Recording only describes calls. It doesn't save buffer contents, uniform
//! values, or rendered pixels, and can't replay anything.

pub mod call;
pub mod context;
pub mod decode;
pub mod identity;
pub mod intercept;
pub mod object;
pub mod shader_name;
mod spy;

#[cfg(test)]
mod testing;

pub use call::{Call, Method};
pub use context::{GlContext, Parameter};
pub use decode::{CallRecord, CallType};
pub use intercept::Intercepted;
pub use object::{Framebuffer, Program, Shader};
pub use spy::WebGlSpy;
