//! Small integer IDs for framebuffers, for use in call descriptions.
//!
//! GL objects don't print usefully: two framebuffers look the same. So we
//! number them as they are created, and describe `bindFramebuffer` calls by
//! that number.
//!
//! The table holds only weak references, so it never keeps an object alive.
//! Entries for dropped objects are discarded the next time something is
//! registered.

use gleam::gl::GLuint;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError, Weak};

use crate::object::Object;

/// A table assigning sequential IDs to objects.
pub struct BufferIds {
    next_id: usize,

    /// Map from object address to its ID. The `Weak` keeps the allocation,
    /// and hence the address, from being reused while the entry exists.
    entries: BTreeMap<usize, Entry>,
}

struct Entry {
    object: Weak<GLuint>,
    id: usize,
}

/// The table shared by every `WebGlSpy` in the process. IDs are never reused,
/// even across spies.
static GLOBAL: Mutex<BufferIds> = Mutex::new(BufferIds::new());

/// Lock the process-wide table.
pub fn global() -> MutexGuard<'static, BufferIds> {
    // Every update leaves the table consistent, so a panic elsewhere while
    // it was locked doesn't matter.
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BufferIds {
    pub const fn new() -> BufferIds {
        BufferIds {
            next_id: 0,
            entries: BTreeMap::new(),
        }
    }

    /// Assign `object` the next ID, and return it.
    ///
    /// If `object` already has an ID, return that instead.
    pub fn register<K>(&mut self, object: &Object<K>) -> usize {
        if let Some(id) = self.lookup(object) {
            return id;
        }

        self.entries.retain(|_, entry| entry.object.strong_count() > 0);

        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(
            object.address(),
            Entry {
                object: object.downgrade(),
                id,
            },
        );
        log::trace!("registered {:?} as ID {}", object, id);
        id
    }

    pub fn lookup<K>(&self, object: &Object<K>) -> Option<usize> {
        self.entries
            .get(&object.address())
            .filter(|entry| entry.object.strong_count() > 0)
            .map(|entry| entry.id)
    }

    /// The number of entries in the table, including any for objects that
    /// have been dropped but not yet discarded.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[test]
fn test_sequential_ids() {
    use crate::object::Framebuffer;

    let mut ids = BufferIds::new();
    let framebuffers: Vec<Framebuffer> = (0..4).map(|_| Framebuffer::new(1)).collect();
    let assigned: Vec<usize> = framebuffers.iter().map(|fb| ids.register(fb)).collect();
    assert_eq!(assigned, vec![0, 1, 2, 3]);

    for (fb, id) in framebuffers.iter().zip(assigned) {
        assert_eq!(ids.lookup(fb), Some(id));
        assert_eq!(ids.lookup(&fb.clone()), Some(id));
    }

    // Registering again doesn't assign a new ID.
    assert_eq!(ids.register(&framebuffers[2]), 2);
    assert_eq!(ids.register(&Framebuffer::new(9)), 4);
}

#[test]
fn test_unregistered() {
    use crate::object::Framebuffer;

    let mut ids = BufferIds::new();
    ids.register(&Framebuffer::new(1));
    assert_eq!(ids.lookup(&Framebuffer::new(1)), None);
}

#[test]
fn test_weak_entries() {
    use crate::object::Framebuffer;

    let mut ids = BufferIds::new();
    let kept = Framebuffer::new(1);
    let dropped = Framebuffer::new(2);
    let probe = dropped.downgrade();
    ids.register(&kept);
    ids.register(&dropped);
    drop(dropped);

    // The table didn't keep the object alive.
    assert_eq!(probe.strong_count(), 0);

    // The next registration sweeps out the dead entry, and doesn't reuse
    // its ID.
    assert_eq!(ids.register(&Framebuffer::new(3)), 2);
    assert_eq!(ids.len(), 2);
    assert_eq!(ids.lookup(&kept), Some(0));
}
