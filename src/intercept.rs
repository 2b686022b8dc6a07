//! Hooking `GlContext` methods.
//!
//! An `Intercepted<G>` wraps some other `GlContext` implementation, and
//! implements `GlContext` itself by passing each call along. Hooks installed
//! on particular methods see each call after the inner context has handled
//! it. With no hooks installed, an `Intercepted` is a plain pass-through, so
//! an application can render through one all the time and only pay for
//! interception while something is watching.

use gleam::gl::{GLbitfield, GLenum, GLint, GLintptr, GLsizei, GLuint};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Deref;
use std::rc::Rc;

use crate::call::{Call, Method};
use crate::context::{GlContext, Parameter};
use crate::object::{Framebuffer, Program, Shader};

/// A hook called after each call to the methods it is installed on.
///
/// The first argument is the `Intercepted` context itself.
pub type CallHook = Rc<dyn Fn(&dyn GlContext, &Call<'_>)>;

/// A hook called with each framebuffer `create_framebuffer` returns.
pub type CreationHook = Rc<dyn Fn(&dyn GlContext, &Framebuffer)>;

/// Make a `CallHook` from a closure.
pub fn call_hook<F>(hook: F) -> CallHook
where
    F: Fn(&dyn GlContext, &Call<'_>) + 'static,
{
    Rc::new(hook)
}

/// Make a `CreationHook` from a closure.
pub fn creation_hook<F>(hook: F) -> CreationHook
where
    F: Fn(&dyn GlContext, &Framebuffer) + 'static,
{
    Rc::new(hook)
}

#[derive(Clone)]
enum Hook {
    Call(CallHook),
    Creation(CreationHook),
}

impl Hook {
    /// The address of the hook's closure, ignoring its vtable.
    fn address(&self) -> *const () {
        match self {
            Hook::Call(hook) => Rc::as_ptr(hook).cast(),
            Hook::Creation(hook) => Rc::as_ptr(hook).cast(),
        }
    }
}

/// A `GlContext` whose methods can be hooked.
pub struct Intercepted<G> {
    /// The context calls are passed along to.
    inner_gl: G,

    /// The hook installed on each method, if any.
    hooks: RefCell<BTreeMap<Method, Hook>>,
}

impl<G> Intercepted<G>
where
    G: Deref,
    G::Target: GlContext,
{
    pub fn new(inner_gl: G) -> Intercepted<G> {
        Intercepted {
            inner_gl,
            hooks: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn inner_gl(&self) -> &G {
        &self.inner_gl
    }

    /// Install `hook` on each of `methods`, replacing any hooks already
    /// installed there.
    ///
    /// `Method::CreateFramebuffer` doesn't produce a `Call`, so it is skipped
    /// here; use `install_creation` for that.
    pub fn install(&self, methods: &[Method], hook: CallHook) {
        let mut hooks = self.hooks.borrow_mut();
        let mut installed = 0;
        for &method in methods {
            if method == Method::CreateFramebuffer {
                log::warn!("call hooks can't be installed on {}; skipping it", method);
                continue;
            }
            hooks.insert(method, Hook::Call(Rc::clone(&hook)));
            installed += 1;
        }
        log::debug!("installed call hook on {} methods", installed);
    }

    /// Install `hook` on `create_framebuffer`, replacing any hook already
    /// installed there.
    pub fn install_creation(&self, hook: CreationHook) {
        self.hooks
            .borrow_mut()
            .insert(Method::CreateFramebuffer, Hook::Creation(hook));
        log::debug!("installed creation hook on {}", Method::CreateFramebuffer);
    }

    /// Remove every installed hook. Removing hooks when there are none is
    /// fine.
    pub fn uninstall(&self) {
        let removed = std::mem::take(&mut *self.hooks.borrow_mut());
        if !removed.is_empty() {
            log::debug!("uninstalled hooks from {} methods", removed.len());
        }
    }

    /// Remove `hook` from every method it is installed on, leaving other
    /// hooks in place.
    pub fn uninstall_hook(&self, hook: &CallHook) {
        self.remove_at(Rc::as_ptr(hook).cast());
    }

    /// Remove `hook` from `create_framebuffer`, if it is installed there.
    pub fn uninstall_creation_hook(&self, hook: &CreationHook) {
        self.remove_at(Rc::as_ptr(hook).cast());
    }

    /// Whether `hook` is still installed on at least one method.
    pub fn is_installed(&self, hook: &CallHook) -> bool {
        let address: *const () = Rc::as_ptr(hook).cast();
        self.hooks.borrow().values().any(|installed| installed.address() == address)
    }

    fn remove_at(&self, address: *const ()) {
        let mut hooks = self.hooks.borrow_mut();
        let before = hooks.len();
        hooks.retain(|_, installed| installed.address() != address);
        if hooks.len() != before {
            log::debug!("uninstalled a hook from {} methods", before - hooks.len());
        }
    }

    /// The methods that currently have hooks installed, in `Method` order.
    pub fn installed_methods(&self) -> Vec<Method> {
        self.hooks.borrow().keys().copied().collect()
    }

    /// Pass `call` to the hook for its method, if there is one.
    fn notify(&self, call: &Call) {
        // Don't hold the borrow while the hook runs: hooks may query the
        // context, or change what's installed.
        let hook = match self.hooks.borrow().get(&call.method()) {
            Some(Hook::Call(hook)) => Rc::clone(hook),
            _ => return,
        };
        log::trace!("intercepted {:?}", call);
        hook(self, call);
    }

    fn notify_creation(&self, framebuffer: &Framebuffer) {
        let hook = match self.hooks.borrow().get(&Method::CreateFramebuffer) {
            Some(Hook::Creation(hook)) => Rc::clone(hook),
            _ => return,
        };
        hook(self, framebuffer);
    }
}

/// Pass a call along to the inner context, then show it to any hook installed
/// on its method. Evaluates to whatever the inner context returned.
///
/// The argument names must match the fields of the method's `Call` variant.
macro_rules! intercepted {
    ($self:ident . $method:ident ( $( $arg:ident ),* )) => {
        {
            let returned = $self .inner_gl. $method ( $( $arg ),* );
            $self .notify(&Call:: $method { $( $arg ),* });
            returned
        }
    }
}

/// Pass a call along to the inner context, and nothing more.
macro_rules! pass_through {
    ($self:ident . $method:ident ( $( $arg:ident ),* )) => {
        {
            $self .inner_gl. $method ( $( $arg ),* )
        }
    }
}

impl<G> GlContext for Intercepted<G>
where
    G: Deref,
    G::Target: GlContext,
{
    fn clear(&self, mask: GLbitfield) {
        intercepted!(self.clear(mask))
    }

    fn bind_framebuffer(&self, target: GLenum, framebuffer: Option<&Framebuffer>) {
        intercepted!(self.bind_framebuffer(target, framebuffer))
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, element_type: GLenum, offset: GLintptr) {
        intercepted!(self.draw_elements(mode, count, element_type, offset))
    }

    fn draw_elements_instanced(
        &self,
        mode: GLenum,
        count: GLsizei,
        element_type: GLenum,
        offset: GLintptr,
        instance_count: GLsizei,
    ) {
        intercepted!(self.draw_elements_instanced(mode, count, element_type, offset, instance_count))
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
        intercepted!(self.multi_draw_elements(
            mode,
            counts,
            counts_offset,
            element_type,
            offsets,
            offsets_offset,
            draw_count
        ))
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
        intercepted!(self.multi_draw_elements_instanced(
            mode,
            counts,
            counts_offset,
            element_type,
            offsets,
            offsets_offset,
            instance_counts,
            instance_counts_offset,
            draw_count
        ))
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        intercepted!(self.draw_arrays(mode, first, count))
    }

    fn draw_arrays_instanced(&self, mode: GLenum, first: GLint, count: GLsizei, instance_count: GLsizei) {
        intercepted!(self.draw_arrays_instanced(mode, first, count, instance_count))
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
        intercepted!(self.multi_draw_arrays(mode, firsts, firsts_offset, counts, counts_offset, draw_count))
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
        intercepted!(self.multi_draw_arrays_instanced(
            mode,
            firsts,
            firsts_offset,
            counts,
            counts_offset,
            instance_counts,
            instance_counts_offset,
            draw_count
        ))
    }

    fn create_framebuffer(&self) -> Option<Framebuffer> {
        let returned = self.inner_gl.create_framebuffer();
        // A lost context has nothing to create; there is nothing to number.
        if let Some(framebuffer) = &returned {
            self.notify_creation(framebuffer);
        }
        returned
    }

    fn get_parameter(&self, pname: GLenum) -> Parameter {
        pass_through!(self.get_parameter(pname))
    }

    fn get_attached_shaders(&self, program: &Program) -> Vec<Shader> {
        pass_through!(self.get_attached_shaders(program))
    }

    fn get_shader_source(&self, shader: &Shader) -> Option<String> {
        pass_through!(self.get_shader_source(shader))
    }

    fn constant(&self, name: &str) -> Option<GLenum> {
        pass_through!(self.constant(name))
    }
}
