use crate::ui::{Event, EventKind, EventTypeId};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::{Rc, Weak};

struct PoolState {
    free: FxHashMap<EventTypeId, Vec<Event>>,
    capacity: usize,
}

/// Recycles events per kind. Cloning shares the same storage.
#[derive(Clone)]
pub struct EventPool {
    state: Rc<RefCell<PoolState>>,
}

impl fmt::Debug for EventPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventPool")
            .field("kinds", &state.free.len())
            .field("capacity", &state.capacity)
            .finish()
    }
}

impl EventPool {
    /// `capacity` is the number of idle events retained per kind.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(PoolState {
                free: FxHashMap::default(),
                capacity,
            })),
        }
    }

    pub fn acquire(&self, kind: EventKind) -> PooledEvent {
        let recycled = self
            .state
            .borrow_mut()
            .free
            .get_mut(&kind.type_id())
            .and_then(Vec::pop);
        PooledEvent {
            event: recycled.unwrap_or_else(|| Event::new(kind)),
            pool: Rc::downgrade(&self.state),
        }
    }

    pub fn available(&self, kind: EventKind) -> usize {
        self.state
            .borrow()
            .free
            .get(&kind.type_id())
            .map_or(0, Vec::len)
    }
}

/// An event on loan from an [`EventPool`]; goes back, reset, when dropped.
pub struct PooledEvent {
    event: Event,
    pool: Weak<RefCell<PoolState>>,
}

impl Deref for PooledEvent {
    type Target = Event;

    fn deref(&self) -> &Event {
        &self.event
    }
}

impl DerefMut for PooledEvent {
    fn deref_mut(&mut self) -> &mut Event {
        &mut self.event
    }
}

impl Drop for PooledEvent {
    fn drop(&mut self) {
        let Some(pool) = self.pool.upgrade() else {
            return;
        };
        let Ok(mut state) = pool.try_borrow_mut() else {
            return;
        };
        let kind = self.event.kind();
        let capacity = state.capacity;
        let free = state.free.entry(kind.type_id()).or_default();
        if free.len() < capacity {
            let mut event = std::mem::replace(&mut self.event, Event::new(kind));
            event.reset(kind);
            free.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_events_come_back_reset() {
        let pool = EventPool::new(4);
        {
            let mut event = pool.acquire(EventKind::Click);
            event.stop_propagation();
            event.pointer.click_count = 2;
        }
        assert_eq!(pool.available(EventKind::Click), 1);
        assert_eq!(pool.available(EventKind::KeyDown), 0);

        let event = pool.acquire(EventKind::Click);
        assert_eq!(pool.available(EventKind::Click), 0);
        assert!(!event.is_propagation_stopped());
        assert_eq!(event.pointer.click_count, 0);
    }

    #[test]
    fn capacity_bounds_retained_events() {
        let pool = EventPool::new(1);
        let a = pool.acquire(EventKind::PointerMove);
        let b = pool.acquire(EventKind::PointerMove);
        drop(a);
        drop(b);
        assert_eq!(pool.available(EventKind::PointerMove), 1);
    }

    #[test]
    fn events_outliving_the_pool_are_dropped_quietly() {
        let pool = EventPool::new(2);
        let event = pool.acquire(EventKind::Wheel);
        drop(pool);
        drop(event);
    }
}
