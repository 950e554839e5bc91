//! Auxiliary UI slot.
//!
//! One optional [`UiFragment`] shared between the shell (reader) and the
//! mounted scene (writer). The scene writes through a [`UiPublisher`] bound
//! to its mount epoch; advancing the epoch at a route switch revokes every
//! publisher handed out before it. Single-threaded, no locking.

use std::{cell::RefCell, rc::Rc};

use demo_shared::ui::UiFragment;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct SlotState {
    content: Option<UiFragment>,
    revision: u64,
    epoch: u64,
    /// Epoch of the publisher that made the last write.
    writer: Option<u64>,
    rejected: u64,
}

/// Result of a publisher write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Applied,
    /// The publisher's mount is gone; nothing was written.
    Revoked,
}

/// The shell side of the slot.
#[derive(Debug, Clone, Default)]
pub struct UiSlot {
    inner: Rc<RefCell<SlotState>>,
}

impl UiSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents.
    pub fn get(&self) -> Option<UiFragment> {
        self.inner.borrow().content.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().content.is_none()
    }

    /// Bumped by every accepted write.
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    pub fn epoch(&self) -> u64 {
        self.inner.borrow().epoch
    }

    /// Writes rejected from revoked publishers so far.
    pub fn rejected_writes(&self) -> u64 {
        self.inner.borrow().rejected
    }

    /// A publisher bound to the current epoch.
    pub fn publisher(&self) -> UiPublisher {
        UiPublisher {
            slot: Rc::clone(&self.inner),
            epoch: self.epoch(),
        }
    }

    /// Advances the epoch, revoking all outstanding publishers.
    pub fn revoke(&self) {
        let mut state = self.inner.borrow_mut();
        state.epoch += 1;
        debug!(epoch = state.epoch, "UI slot epoch advanced");
    }

    /// Empties the slot from the shell side.
    pub fn clear(&self) {
        let mut state = self.inner.borrow_mut();
        if state.content.take().is_some() {
            state.revision += 1;
            state.writer = None;
        }
    }

    /// Clears the slot if `publisher` made the last write, then revokes it.
    pub fn release(&self, publisher: &UiPublisher) {
        let written_by_publisher = self.inner.borrow().writer == Some(publisher.epoch);
        if written_by_publisher {
            self.clear();
        }
        if publisher.is_current() {
            self.revoke();
        }
    }
}

/// Write capability handed to a mounted scene.
#[derive(Debug, Clone)]
pub struct UiPublisher {
    slot: Rc<RefCell<SlotState>>,
    epoch: u64,
}

impl UiPublisher {
    /// Replaces the slot contents. Last write wins.
    pub fn set(&self, fragment: Option<UiFragment>) -> SetOutcome {
        let mut state = self.slot.borrow_mut();
        if state.epoch != self.epoch {
            state.rejected += 1;
            warn!(
                publisher_epoch = self.epoch,
                slot_epoch = state.epoch,
                "Rejected UI write from a torn-down scene"
            );
            return SetOutcome::Revoked;
        }
        state.content = fragment;
        state.revision += 1;
        state.writer = Some(self.epoch);
        SetOutcome::Applied
    }

    pub fn publish(&self, fragment: UiFragment) -> SetOutcome {
        self.set(Some(fragment))
    }

    pub fn clear(&self) -> SetOutcome {
        self.set(None)
    }

    /// Whether writes through this publisher are still accepted.
    pub fn is_current(&self) -> bool {
        self.slot.borrow().epoch == self.epoch
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demo_shared::ui::UiNode;

    fn frag(s: &str) -> UiFragment {
        UiFragment::new(UiNode::text(s))
    }

    #[test]
    fn last_write_wins() {
        let slot = UiSlot::new();
        assert!(slot.is_empty());
        let publisher = slot.publisher();
        assert_eq!(publisher.publish(frag("a")), SetOutcome::Applied);
        assert_eq!(publisher.publish(frag("b")), SetOutcome::Applied);
        assert_eq!(slot.get(), Some(frag("b")));
        assert_eq!(slot.revision(), 2);
        publisher.clear();
        assert_eq!(slot.get(), None);
        assert_eq!(slot.revision(), 3);
    }

    #[test]
    fn revoked_publisher_cannot_write() {
        let slot = UiSlot::new();
        let old = slot.publisher();
        old.publish(frag("old"));
        slot.revoke();
        let new = slot.publisher();
        assert!(!old.is_current());
        assert_eq!(old.publish(frag("stale")), SetOutcome::Revoked);
        assert_eq!(slot.get(), Some(frag("old")));
        assert_eq!(slot.rejected_writes(), 1);
        assert_eq!(new.publish(frag("new")), SetOutcome::Applied);
        assert_eq!(slot.get(), Some(frag("new")));
    }

    #[test]
    fn release_only_clears_own_writes() {
        let slot = UiSlot::new();
        let first = slot.publisher();
        first.publish(frag("first"));
        slot.revoke();

        let second = slot.publisher();
        slot.release(&second);
        assert_eq!(slot.get(), Some(frag("first")));
        assert!(!second.is_current());

        let third = slot.publisher();
        third.publish(frag("third"));
        slot.release(&third);
        assert!(slot.is_empty());
    }

    #[test]
    fn clear_on_empty_slot_keeps_revision() {
        let slot = UiSlot::new();
        slot.clear();
        assert_eq!(slot.revision(), 0);
    }
}
