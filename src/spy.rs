//! Capture sessions.

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

use crate::call::Method;
use crate::context::GlContext;
use crate::decode::{decode, CallRecord};
use crate::identity;
use crate::intercept::{call_hook, creation_hook, CallHook, CreationHook, Intercepted};

/// A capture session on an `Intercepted` context.
///
/// The session installs its hooks the first time capture starts, and leaves
/// them in place until it is destroyed or dropped. While they are installed,
/// every call to a `Method::CAPTURED` method is decoded into a `CallRecord`
/// and appended to the session's log, and every framebuffer the context
/// creates is numbered in the process-wide `identity` table.
///
/// An `Intercepted` holds one hook per method, so if a second session starts
/// capturing on the same context, it takes over from the first. The first
/// session stops spying, and reinstalls its own hooks the next time its
/// `start_capture` is called.
pub struct WebGlSpy<G>
where
    G: Deref,
    G::Target: GlContext,
{
    context: Rc<Intercepted<G>>,

    /// Shared with the call hook, which appends to it.
    calls: Rc<RefCell<Vec<CallRecord>>>,

    /// The hooks this session has installed on `context`, once it has.
    hooks: Option<(CallHook, CreationHook)>,
}

impl<G> WebGlSpy<G>
where
    G: Deref,
    G::Target: GlContext,
{
    pub fn new(context: Rc<Intercepted<G>>) -> WebGlSpy<G> {
        WebGlSpy {
            context,
            calls: Rc::new(RefCell::new(vec![])),
            hooks: None,
        }
    }

    pub fn context(&self) -> &Rc<Intercepted<G>> {
        &self.context
    }

    /// Whether this session's hooks are installed on the context.
    pub fn is_spying(&self) -> bool {
        match &self.hooks {
            Some((on_call, _)) => self.context.is_installed(on_call),
            None => false,
        }
    }

    /// Start recording calls, installing hooks unless they are already in
    /// place. If `reset` is true, discard any calls recorded so far.
    pub fn start_capture(&mut self, reset: bool) {
        if !self.is_spying() {
            self.spy_context();
        }
        if reset {
            self.calls.borrow_mut().clear();
        }
    }

    /// Return the calls recorded since the log was last emptied, and empty it.
    ///
    /// If `only_draws` is true, return only the records whose descriptions
    /// contain `"draw"`. The log is emptied either way. Hooks stay installed,
    /// so recording carries on.
    pub fn end_capture(&mut self, only_draws: bool) -> Vec<CallRecord> {
        let mut calls = std::mem::take(&mut *self.calls.borrow_mut());
        if only_draws {
            calls.retain(|record| record.description().contains("draw"));
        }
        log::debug!("flushed {} recorded calls", calls.len());
        calls
    }

    /// Remove every hook from the context, whoever installed it, and release
    /// the context.
    pub fn destroy(mut self) {
        self.context.uninstall();
        self.hooks = None;
    }

    fn spy_context(&mut self) {
        let calls = Rc::clone(&self.calls);
        let on_call = call_hook(move |gl, call| {
            let record = decode(gl, call);
            calls.borrow_mut().push(record);
        });
        let on_create = creation_hook(|_gl, framebuffer| {
            identity::global().register(framebuffer);
        });

        self.context.install(&Method::CAPTURED, Rc::clone(&on_call));
        self.context.install_creation(Rc::clone(&on_create));
        self.hooks = Some((on_call, on_create));
        log::debug!("spying on context");
    }
}

/// Dropping a session removes only the hooks it installed. Other sessions'
/// hooks on the same context are left alone.
impl<G> Drop for WebGlSpy<G>
where
    G: Deref,
    G::Target: GlContext,
{
    fn drop(&mut self) {
        if let Some((on_call, on_create)) = self.hooks.take() {
            self.context.uninstall_hook(&on_call);
            self.context.uninstall_creation_hook(&on_create);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::CallType;
    use crate::testing::FakeGl;
    use gleam::gl;

    fn spy() -> WebGlSpy<Rc<FakeGl>> {
        WebGlSpy::new(Rc::new(Intercepted::new(Rc::new(FakeGl::new()))))
    }

    fn descriptions(records: &[CallRecord]) -> Vec<&str> {
        records.iter().map(CallRecord::description).collect()
    }

    #[test]
    fn test_nothing_recorded_before_start() {
        let mut spy = spy();
        let gl = Rc::clone(spy.context());
        gl.draw_arrays(gl::TRIANGLES, 0, 3);
        assert!(!spy.is_spying());
        assert!(gl.installed_methods().is_empty());
        assert!(spy.end_capture(false).is_empty());
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut spy = spy();
        let gl = Rc::clone(spy.context());
        spy.start_capture(true);
        spy.start_capture(true);
        assert!(spy.is_spying());

        gl.draw_arrays(gl::TRIANGLES, 0, 3);
        gl.draw_elements(gl::TRIANGLES, 6, gl::UNSIGNED_SHORT, 0);
        assert_eq!(spy.end_capture(false).len(), 2);
        assert_eq!(gl.inner_gl().forwarded(), vec!["drawArrays", "drawElements"]);
    }

    #[test]
    fn test_reset() {
        let mut spy = spy();
        let gl = Rc::clone(spy.context());
        spy.start_capture(true);
        gl.clear(gl::COLOR_BUFFER_BIT);

        // Keep what's been recorded.
        spy.start_capture(false);
        gl.clear(gl::DEPTH_BUFFER_BIT);
        assert_eq!(descriptions(&spy.end_capture(false)), vec!["clear: COLOR", "clear: DEPTH"]);

        gl.clear(gl::COLOR_BUFFER_BIT);
        spy.start_capture(true);
        gl.clear(gl::STENCIL_BUFFER_BIT);
        assert_eq!(descriptions(&spy.end_capture(false)), vec!["clear: STENCIL"]);
    }

    #[test]
    fn test_end_capture_empties_log() {
        let mut spy = spy();
        let gl = Rc::clone(spy.context());
        spy.start_capture(true);
        gl.clear(gl::COLOR_BUFFER_BIT);
        gl.draw_arrays(gl::LINES, 0, 2);

        assert_eq!(spy.end_capture(false).len(), 2);
        assert!(spy.end_capture(false).is_empty());

        // Recording continues after a flush.
        gl.draw_arrays(gl::LINES, 0, 2);
        assert_eq!(spy.end_capture(false).len(), 1);
    }

    #[test]
    fn test_only_draws() {
        let mut spy = spy();
        let gl = Rc::clone(spy.context());
        spy.start_capture(true);
        let framebuffer = gl.create_framebuffer();

        gl.clear(gl::COLOR_BUFFER_BIT);
        gl.draw_arrays(gl::TRIANGLES, 0, 3);
        gl.bind_framebuffer(gl::FRAMEBUFFER, framebuffer.as_ref());
        gl.draw_elements(gl::TRIANGLES, 6, gl::UNSIGNED_SHORT, 0);

        let draws = spy.end_capture(true);
        assert_eq!(descriptions(&draws),
                   vec!["drawArrays: TRIANGLES, 0 indices, 3 vertices",
                        "drawElements: TRIANGLES, 6 indices"]);
        assert!(draws.iter().all(|record| record.call_type() == CallType::Draw));

        // The non-draws were flushed too.
        assert!(spy.end_capture(false).is_empty());
    }

    #[test]
    fn test_only_draws_is_case_sensitive() {
        let mut spy = spy();
        let gl = Rc::clone(spy.context());
        spy.start_capture(true);
        gl.multi_draw_arrays(gl::TRIANGLES, &[0], 0, &[3], 0, 1);
        gl.draw_arrays_instanced(gl::TRIANGLES, 0, 3, 10);

        // "multiDrawArraysWEBGL" doesn't contain "draw", although it is
        // classified as a draw.
        let draws = spy.end_capture(true);
        assert_eq!(descriptions(&draws), vec!["drawArraysInstanced: TRIANGLES, 0 indices, 3 vertices"]);
    }

    #[test]
    fn test_clear_bits() {
        let mut spy = spy();
        let gl = Rc::clone(spy.context());
        spy.start_capture(true);
        gl.clear(256 | 16384);

        let records = spy.end_capture(false);
        let description = records[0].description();
        assert!(!description.contains("STENCIL"));
        let depth = description.find("DEPTH").expect("no DEPTH");
        let color = description.find("COLOR").expect("no COLOR");
        assert!(depth < color);
    }

    #[test]
    fn test_framebuffer_ids() {
        let mut spy = spy();
        let gl = Rc::clone(spy.context());

        // Created before spying: never numbered.
        let early = gl.create_framebuffer();

        spy.start_capture(true);
        let first = gl.create_framebuffer().expect("context lost");
        let second = gl.create_framebuffer().expect("context lost");
        gl.bind_framebuffer(gl::FRAMEBUFFER, Some(&second));
        gl.bind_framebuffer(gl::FRAMEBUFFER, Some(&first));
        gl.bind_framebuffer(gl::FRAMEBUFFER, early.as_ref());
        gl.bind_framebuffer(gl::FRAMEBUFFER, None);

        let first_id = identity::global().lookup(&first).expect("first not registered");
        let second_id = identity::global().lookup(&second).expect("second not registered");
        assert!(first_id < second_id);

        let records = spy.end_capture(false);
        let expected = vec![
            format!("bindFramebuffer ID - {}", second_id),
            format!("bindFramebuffer ID - {}", first_id),
            "bindFramebuffer ID - undefined".to_string(),
            "bindFramebuffer".to_string(),
        ];
        assert_eq!(descriptions(&records), expected);
        assert!(records.iter().all(|record| record.program_name().is_none()));
    }

    #[test]
    fn test_program_names() {
        let mut spy = spy();
        let gl = Rc::clone(spy.context());
        spy.start_capture(true);

        let sky = gl.inner_gl().create_program("#define SHADER_NAME Sky\nvoid main() {}\n");
        gl.draw_arrays(gl::TRIANGLES, 0, 3);
        gl.inner_gl().use_program(Some(&sky));
        gl.draw_arrays(gl::TRIANGLES, 0, 3);
        gl.clear(gl::COLOR_BUFFER_BIT);

        let records = spy.end_capture(false);
        let names: Vec<Option<&str>> = records.iter().map(CallRecord::program_name).collect();
        assert_eq!(names, vec![None, Some("Sky"), None]);
    }

    #[test]
    fn test_destroy() {
        let mut spy = spy();
        let gl = Rc::clone(spy.context());
        spy.start_capture(true);
        gl.draw_arrays(gl::TRIANGLES, 0, 3);
        spy.destroy();

        assert!(gl.installed_methods().is_empty());
        assert_eq!(Rc::strong_count(&gl), 1);

        // Calls still reach the context, and nothing is listening.
        gl.draw_arrays(gl::TRIANGLES, 0, 3);
        gl.create_framebuffer();
        assert_eq!(gl.inner_gl().forwarded(),
                   vec!["drawArrays", "drawArrays", "createFramebuffer"]);
    }

    #[test]
    fn test_drop_uninstalls() {
        let gl = {
            let mut spy = spy();
            spy.start_capture(true);
            Rc::clone(spy.context())
        };
        assert!(gl.installed_methods().is_empty());
    }

    #[test]
    fn test_drop_leaves_other_sessions() {
        let mut active = spy();
        let gl = Rc::clone(active.context());
        active.start_capture(true);

        {
            let _idle = WebGlSpy::new(Rc::clone(&gl));
        }
        {
            let mut finished = WebGlSpy::new(Rc::clone(&gl));
            finished.start_capture(true);
            assert!(!active.is_spying());
        }

        // The second session took over the hooks, so the first reinstalls
        // its own.
        active.start_capture(false);
        assert!(active.is_spying());
        gl.draw_arrays(gl::TRIANGLES, 0, 3);
        active.start_capture(false);
        gl.draw_arrays(gl::TRIANGLES, 0, 3);
        assert_eq!(active.end_capture(false).len(), 2);

        {
            let _idle = WebGlSpy::new(Rc::clone(&gl));
        }
        assert!(active.is_spying());
        assert_eq!(gl.installed_methods().len(), Method::CAPTURED.len() + 1);
    }

    #[test]
    fn test_destroy_removes_all_hooks() {
        let mut first = spy();
        let gl = Rc::clone(first.context());
        first.start_capture(true);
        let mut second = WebGlSpy::new(Rc::clone(&gl));
        second.start_capture(true);
        gl.install(&[Method::Clear], call_hook(|_gl, _call| ()));

        second.destroy();
        assert!(gl.installed_methods().is_empty());
        assert!(!first.is_spying());
    }

    #[test]
    fn test_destroy_without_start() {
        let spy = spy();
        let gl = Rc::clone(spy.context());
        spy.destroy();
        assert!(gl.installed_methods().is_empty());
        assert!(gl.inner_gl().forwarded().is_empty());
    }
}
