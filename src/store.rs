//! Result Store
//!
//! Bounded, thread-safe storage for raw φ dumps, keyed by opaque random
//! identifiers. The transport layer puts each solve's bytes here and hands
//! the id to the client for later retrieval; once more than `capacity`
//! results are live, the oldest is evicted (FIFO).
//!
//! The store is an explicitly constructed object; there are no ambient
//! singletons. Blobs are shared out as `Arc<[u8]>` so retrieval never
//! copies the field.

#![forbid(unsafe_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use rand::RngCore;

/// Bounded FIFO map from opaque ids to raw result bytes.
#[derive(Debug)]
pub struct ResultStore {
    capacity: usize,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    order: VecDeque<String>,
    blobs: HashMap<String, Arc<[u8]>>,
}

impl ResultStore {
    /// Create a store retaining at most `capacity` results (floored at 1).
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), inner: Mutex::new(Inner::default()) }
    }

    /// Store a result and return its freshly minted id, evicting the oldest
    /// entry when the bound is exceeded.
    pub fn put(&self, bytes: Vec<u8>) -> String {
        let id = mint_id();
        let blob: Arc<[u8]> = bytes.into();
        let mut inner = self.inner.lock().expect("result store mutex poisoned");
        inner.order.push_back(id.clone());
        inner.blobs.insert(id.clone(), blob);
        while inner.order.len() > self.capacity {
            if let Some(old) = inner.order.pop_front() {
                inner.blobs.remove(&old);
            }
        }
        id
    }

    /// Retrieve a stored result; `None` once evicted or never present.
    pub fn get(&self, id: &str) -> Option<Arc<[u8]>> {
        let inner = self.inner.lock().expect("result store mutex poisoned");
        inner.blobs.get(id).cloned()
    }

    /// Number of currently retained results.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("result store mutex poisoned").order.len()
    }

    /// Whether the store holds no results.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Opaque id: 16 random bytes, hex-encoded.
fn mint_id() -> String {
    let mut raw = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut raw);
    hex::encode(raw)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;
    use std::thread;

    #[test]
    fn put_then_get_round_trips() {
        let store = ResultStore::new(4);
        let id = store.put(vec![1, 2, 3, 4]);
        let blob = store.get(&id).expect("blob present");
        assert_eq!(&blob[..], &[1, 2, 3, 4]);
        assert!(store.get("no-such-id").is_none());
    }

    #[test]
    fn eviction_is_fifo_beyond_capacity() {
        let store = ResultStore::new(2);
        let a = store.put(vec![0xaa]);
        let b = store.put(vec![0xbb]);
        let c = store.put(vec![0xcc]);
        assert_eq!(store.len(), 2);
        assert!(store.get(&a).is_none(), "oldest entry survives eviction");
        assert!(store.get(&b).is_some());
        assert!(store.get(&c).is_some());
    }

    #[test]
    fn capacity_floors_at_one() {
        let store = ResultStore::new(0);
        let a = store.put(vec![1]);
        let b = store.put(vec![2]);
        assert!(store.get(&a).is_none());
        assert_eq!(&store.get(&b).unwrap()[..], &[2]);
    }

    #[test]
    fn ids_are_opaque_and_unique() {
        let store = ResultStore::new(64);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..32 {
            let id = store.put(Vec::new());
            assert_eq!(id.len(), 32);
            assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
            assert!(seen.insert(id), "duplicate id minted");
        }
    }

    #[test]
    fn concurrent_puts_and_gets_stay_bounded() {
        let store = StdArc::new(ResultStore::new(8));
        let mut handles = Vec::new();
        for t in 0..4 {
            let store = StdArc::clone(&store);
            handles.push(thread::spawn(move || {
                for k in 0..50u8 {
                    let id = store.put(vec![t, k]);
                    // Freshly inserted entries are retrievable until evicted.
                    let _ = store.get(&id);
                }
            }));
        }
        for h in handles {
            h.join().expect("worker panicked");
        }
        assert!(store.len() <= 8);
    }
}
