//! Append-only registry of connection records.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::record::ConnectionRecord;

/// Connection records in subscribe-arrival order.
///
/// Appends and snapshots are each a single critical section, so a snapshot
/// either contains a concurrently registered record or it does not; it
/// never sees it twice or half-written.
pub struct ConnectionRegistry {
    records: RwLock<Vec<Arc<ConnectionRecord>>>,
    next_slot: AtomicU64,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_slot: AtomicU64::new(0),
        }
    }

    /// Reserve the next slot number.
    pub fn next_slot(&self) -> u64 {
        self.next_slot.fetch_add(1, Ordering::Relaxed)
    }

    /// Append a record.
    pub fn register(&self, record: Arc<ConnectionRecord>) {
        self.records.write().push(record);
    }

    /// All records, active or not, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<ConnectionRecord>> {
        self.records.read().clone()
    }

    /// Active records in registration order.
    pub fn active(&self) -> Vec<Arc<ConnectionRecord>> {
        self.records
            .read()
            .iter()
            .filter(|r| r.is_active())
            .cloned()
            .collect()
    }

    /// Total records held, including inactive ones not yet compacted.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the registry holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Number of active records.
    pub fn active_count(&self) -> usize {
        self.records.read().iter().filter(|r| r.is_active()).count()
    }

    /// Drop inactive records. Returns how many were removed.
    ///
    /// Best-effort: a record that goes inactive during the pass is picked up
    /// by the next one. In-flight rounds keep their own snapshot.
    pub fn compact(&self) -> usize {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.is_active());
        let removed = before - records.len();
        if removed > 0 {
            debug!(removed, remaining = records.len(), "compacted connection registry");
        }
        removed
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::Message;
    use tokio::sync::mpsc;

    fn make_record(registry: &ConnectionRegistry, id: &str) -> Arc<ConnectionRecord> {
        let (tx, _rx) = mpsc::channel::<Message>(1);
        let (record, _signal) = ConnectionRecord::new(id, registry.next_slot(), Box::new(tx));
        Arc::new(record)
    }

    #[test]
    fn empty_registry() {
        let registry = ConnectionRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn register_preserves_arrival_order() {
        let registry = ConnectionRegistry::new();
        for id in ["a", "b", "c"] {
            registry.register(make_record(&registry, id));
        }
        let ids: Vec<_> = registry.snapshot().iter().map(|r| r.id().to_owned()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn slots_are_unique_and_increasing() {
        let registry = ConnectionRegistry::new();
        let a = make_record(&registry, "a");
        let b = make_record(&registry, "b");
        assert!(b.slot() > a.slot());
    }

    #[test]
    fn same_user_registered_twice_keeps_both() {
        let registry = ConnectionRegistry::new();
        registry.register(make_record(&registry, "same"));
        registry.register(make_record(&registry, "same"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn active_filters_inactive() {
        let registry = ConnectionRegistry::new();
        let a = make_record(&registry, "a");
        let b = make_record(&registry, "b");
        registry.register(Arc::clone(&a));
        registry.register(Arc::clone(&b));
        let _ = a.deactivate();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.active_count(), 1);
        let active = registry.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id(), "b");
    }

    #[test]
    fn snapshot_is_detached_from_later_registrations() {
        let registry = ConnectionRegistry::new();
        registry.register(make_record(&registry, "a"));
        let snapshot = registry.snapshot();
        registry.register(make_record(&registry, "b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn compact_removes_only_inactive() {
        let registry = ConnectionRegistry::new();
        let a = make_record(&registry, "a");
        registry.register(Arc::clone(&a));
        registry.register(make_record(&registry, "b"));
        let _ = a.deactivate();

        assert_eq!(registry.compact(), 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot()[0].id(), "b");
        assert_eq!(registry.compact(), 0);
    }

    #[test]
    fn concurrent_register_and_snapshot() {
        let registry = Arc::new(ConnectionRegistry::new());
        let writers: Vec<_> = (0..4)
            .map(|t| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        registry.register(make_record(&registry, &format!("{t}-{i}")));
                    }
                })
            })
            .collect();

        for _ in 0..50 {
            let snapshot = registry.snapshot();
            let mut slots: Vec<_> = snapshot.iter().map(|r| r.slot()).collect();
            slots.sort_unstable();
            slots.dedup();
            assert_eq!(slots.len(), snapshot.len());
        }
        for w in writers {
            w.join().unwrap();
        }
        assert_eq!(registry.len(), 200);
    }
}
