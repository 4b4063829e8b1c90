use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::document::ElementId;

/// Identifier handed out when a change listener is attached.
///
/// Listeners are detached by id, so the same closure never needs to be
/// compared by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl ListenerId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Event delivered to change listeners of a boolean control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The control whose state changed.
    pub target: ElementId,
    /// Checked state of the control at dispatch time.
    pub checked: bool,
}

pub(crate) type ChangeListener = Rc<dyn Fn(&ChangeEvent)>;
