//! Instance Registry: the live players sharing one playback token
//!
//! Players register a weak reference at construction and unregister on
//! teardown. With the mutex option on, a player must hold the token to be
//! playing. `acquire` always succeeds: the caller takes the token and then
//! preempts every other live member, whatever their own mutex option. The
//! last caller wins, so two `play()` calls in the same turn leave exactly
//! the second one playing.

use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A player that can be told to stop by a peer taking the token
pub trait Preemptible {
    fn preempt(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InstanceId(u64);

impl InstanceId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

#[derive(Debug)]
struct Member {
    id: InstanceId,
    player: Weak<dyn Preemptible>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: u64,
    members: Vec<Member>,
    holder: Option<InstanceId>,
}

/// Shared by reference between every player of one host
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    inner: RefCell<RegistryInner>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for the usual `Rc` wrapping
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    pub fn register(&self, player: Weak<dyn Preemptible>) -> InstanceId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = InstanceId(inner.next_id);
        inner.members.push(Member { id, player });
        log::debug!("Registered {} ({} live)", id, inner.members.len());
        id
    }

    /// Removes a player and releases the token if it held it
    pub fn unregister(&self, id: InstanceId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.members.len();
        inner.members.retain(|m| m.id != id);
        if inner.holder == Some(id) {
            inner.holder = None;
        }
        let removed = inner.members.len() != before;
        if removed {
            log::debug!("Unregistered {} ({} live)", id, inner.members.len());
        }
        removed
    }

    /// Hands the token to `id` and returns the player that held it before
    ///
    /// The registry borrow is released before the caller touches the
    /// returned peer. Unknown ids leave the token where it is.
    pub fn acquire(&self, id: InstanceId) -> Option<Rc<dyn Preemptible>> {
        let mut inner = self.inner.borrow_mut();
        if !inner.members.iter().any(|m| m.id == id) {
            log::warn!("{} is not registered, token not granted", id);
            return None;
        }

        let previous = inner.holder.replace(id)?;
        if previous == id {
            return None;
        }

        log::debug!("Token moves from {} to {}", previous, id);
        inner
            .members
            .iter()
            .find(|m| m.id == previous)
            .and_then(|m| m.player.upgrade())
    }

    /// Every live member except `id`
    ///
    /// Collected up front so the registry is not borrowed while peers run.
    pub fn peers(&self, id: InstanceId) -> Vec<Rc<dyn Preemptible>> {
        self.inner
            .borrow()
            .members
            .iter()
            .filter(|m| m.id != id)
            .filter_map(|m| m.player.upgrade())
            .collect()
    }

    /// Gives the token back if `id` holds it
    pub fn release(&self, id: InstanceId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.holder == Some(id) {
            inner.holder = None;
            true
        } else {
            false
        }
    }

    pub fn holder(&self) -> Option<InstanceId> {
        self.inner.borrow().holder
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.inner.borrow().members.iter().any(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
