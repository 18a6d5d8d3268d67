use crate::types::IncidentRecord;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Append-only access to incident records. Readers get owned snapshots so
/// scoring never holds the lock.
pub trait IncidentRepository: Send + Sync {
    fn append(&self, record: IncidentRecord);

    /// Every record, in insertion order.
    fn list(&self) -> Vec<IncidentRecord>;

    /// The first `limit` records, in insertion order.
    fn list_bounded(&self, limit: usize) -> Vec<IncidentRecord> {
        let mut records = self.list();
        records.truncate(limit);
        records
    }

    fn get(&self, id: &str) -> Option<IncidentRecord>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-lifetime store backed by a vector.
#[derive(Debug, Default)]
pub struct MemoryIncidentStore {
    records: RwLock<Vec<IncidentRecord>>,
}

impl MemoryIncidentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<IncidentRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    // A poisoned lock still holds only complete records.
    fn read(&self) -> RwLockReadGuard<'_, Vec<IncidentRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<IncidentRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IncidentRepository for MemoryIncidentStore {
    fn append(&self, record: IncidentRecord) {
        tracing::debug!("Storing incident {} ({})", record.id, record.category);
        self.write().push(record);
    }

    fn list(&self) -> Vec<IncidentRecord> {
        self.read().clone()
    }

    fn list_bounded(&self, limit: usize) -> Vec<IncidentRecord> {
        self.read().iter().take(limit).cloned().collect()
    }

    fn get(&self, id: &str) -> Option<IncidentRecord> {
        self.read().iter().find(|r| r.id == id).cloned()
    }

    fn len(&self) -> usize {
        self.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::incident_at;
    use std::sync::Arc;

    #[test]
    fn test_append_and_list_in_order() {
        let store = MemoryIncidentStore::new();
        assert!(store.is_empty());

        store.append(incident_at("b", "26.85", "80.95"));
        store.append(incident_at("a", "26.86", "80.96"));
        store.append(incident_at("c", "26.87", "80.97"));

        let ids: Vec<_> = store.list().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_bounded_read() {
        let store = MemoryIncidentStore::with_records(vec![
            incident_at("1", "26.85", "80.95"),
            incident_at("2", "26.85", "80.95"),
            incident_at("3", "26.85", "80.95"),
        ]);
        let ids: Vec<_> = store.list_bounded(2).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(store.list_bounded(10).len(), 3);
        assert!(store.list_bounded(0).is_empty());
    }

    #[test]
    fn test_get() {
        let store = MemoryIncidentStore::new();
        store.append(incident_at("x", "26.85", "80.95"));
        assert_eq!(store.get("x").map(|r| r.id), Some("x".to_string()));
        assert!(store.get("y").is_none());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = MemoryIncidentStore::new();
        store.append(incident_at("1", "26.85", "80.95"));
        let snapshot = store.list();
        store.append(incident_at("2", "26.85", "80.95"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_concurrent_appends() {
        let store: Arc<dyn IncidentRepository> = Arc::new(MemoryIncidentStore::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.append(incident_at(&format!("{}-{}", t, i), "26.85", "80.95"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 100);
    }
}
