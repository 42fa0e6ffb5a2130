//! Frame scheduling primitive.
//!
//! A run asks for at most one frame at a time. The host drains the queue once
//! per display refresh (see `Engine::frame`) and hands each handle back to the
//! run that requested it; a cancelled or superseded handle is simply ignored.

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

pub trait FrameScheduler {
    /// Register interest in the next frame.
    fn request_frame(&self) -> FrameHandle;
    /// Drop a registration. Unknown handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);
}

/// In-process frame queue shared by every run of an engine.
#[derive(Debug, Default)]
pub struct FrameQueue {
    next: Cell<u64>,
    pending: RefCell<Vec<FrameHandle>>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending handle, in request order.
    pub fn take_pending(&self) -> Vec<FrameHandle> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    pub fn is_pending(&self, handle: FrameHandle) -> bool {
        self.pending.borrow().contains(&handle)
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&self) -> FrameHandle {
        let handle = FrameHandle(self.next.get());
        self.next.set(self.next.get().wrapping_add(1));
        self.pending.borrow_mut().push(handle);
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.pending.borrow_mut().retain(|h| *h != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_cancel_take() {
        let q = FrameQueue::new();
        let a = q.request_frame();
        let b = q.request_frame();
        assert_ne!(a, b);
        assert_eq!(q.len(), 2);
        q.cancel_frame(a);
        assert!(!q.is_pending(a));
        assert!(q.is_pending(b));
        assert_eq!(q.take_pending(), vec![b]);
        assert!(q.is_empty());
        q.cancel_frame(b);
    }
}
