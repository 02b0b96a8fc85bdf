use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::gl::{RawHandle, ResourceKind};

pub(crate) type ReleaseQueue = Rc<RefCell<Vec<(ResourceKind, RawHandle)>>>;

/// Sole owner of one native object.
///
/// Not `Clone`. Dropping the guard schedules exactly one native delete on the
/// owning context; the delete is issued on the next `RenderContext::maintain`.
/// Holding an `Rc` keeps the guard (and every wrapper around it) `!Send`.
pub struct GpuHandle {
    kind: ResourceKind,
    raw: RawHandle,
    queue: ReleaseQueue,
}

impl GpuHandle {
    pub(crate) fn new(kind: ResourceKind, raw: RawHandle, queue: ReleaseQueue) -> Self {
        Self { kind, raw, queue }
    }

    #[inline]
    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    #[inline]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl fmt::Debug for GpuHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GpuHandle({} {})", self.kind, self.raw)
    }
}

impl Drop for GpuHandle {
    fn drop(&mut self) {
        log::trace!("release scheduled for {} {}", self.kind, self.raw);
        self.queue.borrow_mut().push((self.kind, self.raw));
    }
}
