use crate::error::UiResult;
use crate::ui::{Event, EventKind, EventTypeId};
use crate::view::Panel;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenPhase {
    /// Capture phase on ancestors, plus the target itself.
    TrickleDown,
    BubbleUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

pub type EventCallback = Rc<RefCell<dyn FnMut(&mut Event, &mut Panel) -> UiResult<()>>>;

fn next_listener_id() -> u64 {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone)]
struct Listener {
    handle: ListenerHandle,
    type_id: EventTypeId,
    phase: ListenPhase,
    callback: EventCallback,
}

/// Per-element handler table, in registration order.
#[derive(Clone, Default)]
pub struct Listeners {
    entries: Vec<Listener>,
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.entries
                    .iter()
                    .map(|listener| (listener.handle, listener.type_id, listener.phase)),
            )
            .finish()
    }
}

impl Listeners {
    pub fn add<F>(&mut self, kind: EventKind, phase: ListenPhase, callback: F) -> ListenerHandle
    where
        F: FnMut(&mut Event, &mut Panel) -> UiResult<()> + 'static,
    {
        let handle = ListenerHandle(next_listener_id());
        self.entries.push(Listener {
            handle,
            type_id: kind.type_id(),
            phase,
            callback: Rc::new(RefCell::new(callback)),
        });
        handle
    }

    pub fn remove(&mut self, handle: ListenerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|listener| listener.handle != handle);
        self.entries.len() != before
    }

    pub fn has(&self, kind: EventKind, phase: ListenPhase) -> bool {
        let type_id = kind.type_id();
        self.entries
            .iter()
            .any(|listener| listener.type_id == type_id && listener.phase == phase)
    }

    /// Snapshot of the matching callbacks; later registrations do not join a running dispatch.
    pub fn collect(&self, kind: EventKind, phase: ListenPhase) -> Vec<EventCallback> {
        let type_id = kind.type_id();
        self.entries
            .iter()
            .filter(|listener| listener.type_id == type_id && listener.phase == phase)
            .map(|listener| listener.callback.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_query_and_remove() {
        let mut listeners = Listeners::default();
        let click = listeners.add(EventKind::Click, ListenPhase::BubbleUp, |_, _| Ok(()));
        listeners.add(EventKind::Click, ListenPhase::TrickleDown, |_, _| Ok(()));

        assert!(listeners.has(EventKind::Click, ListenPhase::BubbleUp));
        assert!(!listeners.has(EventKind::KeyDown, ListenPhase::BubbleUp));
        assert_eq!(listeners.collect(EventKind::Click, ListenPhase::BubbleUp).len(), 1);

        assert!(listeners.remove(click));
        assert!(!listeners.remove(click));
        assert!(!listeners.has(EventKind::Click, ListenPhase::BubbleUp));
        assert_eq!(listeners.len(), 1);
    }
}
