//! Request-scoped memoization.
//!
//! One [`RequestCache`] is created per inbound request, passed into the
//! content manager explicitly, and dropped when the request ends. It memoizes
//! child-id lists so repeated `get_content` calls within one request hit
//! storage once; it is not shared across requests.

use std::collections::HashMap;

use parking_lot::Mutex;
use uuid::Uuid;

/// Per-request memo of child-id lists.
#[derive(Debug, Default)]
pub struct RequestCache {
    entries: Mutex<HashMap<String, Vec<Uuid>>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<Uuid>> {
        self.entries.lock().get(key).cloned()
    }

    pub fn set(&self, key: &str, ids: Vec<Uuid>) {
        self.entries.lock().insert(key.to_string(), ids);
    }

    pub fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}
