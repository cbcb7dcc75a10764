use std::sync::atomic::{AtomicU64, Ordering};

mod core;
mod element;

pub use self::core::*;
pub use element::*;

slotmap::new_key_type! {
    /// Handle to an element in its panel's arena. Stale after the element is destroyed.
    pub struct ElementId;
}

fn next_ui_node_id() -> u64 {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}
