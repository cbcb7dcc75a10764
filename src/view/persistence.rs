use rustc_hash::FxHashMap;

/// Opaque per-element data store addressed by string keys.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: FxHashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }
}

/// `"<view data key>/<field>"`.
pub fn view_data_path(view_data_key: &str, field: &str) -> String {
    format!("{view_data_key}/{field}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        let key = view_data_path("inbox", "scroll");
        assert_eq!(key, "inbox/scroll");
        assert_eq!(store.get(&key), None);
        store.set(&key, "12.5".to_string());
        assert_eq!(store.get(&key).as_deref(), Some("12.5"));
        assert_eq!(store.remove(&key).as_deref(), Some("12.5"));
        assert!(store.is_empty());
    }
}
