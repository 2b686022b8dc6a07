//! Opaque objects handed out by a `GlContext`.

use gleam::gl::GLuint;
use std::sync::{Arc, Weak};

/// A framebuffer, program, or shader object.
///
/// An `Object` behaves like a browser's `WebGLFramebuffer` and friends: it is
/// a handle with identity. Clones refer to the same object, and two objects
/// are equal only if one is a clone of the other, whatever their names.
///
/// `K` is one of the marker types in the `kind` module.
pub struct Object<K> {
    name: Arc<GLuint>,
    _kind: std::marker::PhantomData<*const K>,
}

pub mod kind {
    pub enum Framebuffer {}
    pub enum Program {}
    pub enum Shader {}
}

pub type Framebuffer = Object<kind::Framebuffer>;
pub type Program = Object<kind::Program>;
pub type Shader = Object<kind::Shader>;

impl<K> Object<K> {
    /// Wrap the GL name `name` in a fresh object.
    pub fn new(name: GLuint) -> Object<K> {
        Object {
            name: Arc::new(name),
            _kind: Default::default(),
        }
    }

    /// The GL name the context gave this object. A `GlContext` backed by a
    /// native GL uses this to find the object it stands for.
    pub fn name(&self) -> GLuint {
        *self.name
    }

    /// An address identifying this object for as long as it, or any `Weak`
    /// from `downgrade`, is alive.
    pub(crate) fn address(&self) -> usize {
        Arc::as_ptr(&self.name) as usize
    }

    pub(crate) fn downgrade(&self) -> Weak<GLuint> {
        Arc::downgrade(&self.name)
    }
}

// We can't derive these, because of the `PhantomData`:
// https://github.com/rust-lang/rust/issues/26925
impl<K> Clone for Object<K> {
    fn clone(&self) -> Object<K> {
        Object {
            name: Arc::clone(&self.name),
            _kind: Default::default(),
        }
    }
}

impl<K> PartialEq for Object<K> {
    fn eq(&self, other: &Object<K>) -> bool {
        Arc::ptr_eq(&self.name, &other.name)
    }
}

impl<K> Eq for Object<K> { }

impl<K> std::fmt::Debug for Object<K> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        // `type_name` gives the full path of the marker type.
        let kind = std::any::type_name::<K>().rsplit("::").next().unwrap_or("Object");
        write!(fmt, "{} {}", kind, self.name())
    }
}

#[test]
fn test_identity() {
    let a = Framebuffer::new(1);
    let b = Framebuffer::new(1);
    assert_eq!(a, a.clone());
    assert_ne!(a, b);
    assert_eq!(a.name(), b.name());
    assert_eq!(format!("{:?}", a), "Framebuffer 1");
}
