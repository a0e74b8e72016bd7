//! Serialized access to one collection
//!
//! Every load-modify-save cycle holds the store's async mutex from the load to
//! the save, so concurrent handlers never interleave on the same file.

use super::{KeyedRecordStore, Record};
use crate::logger::{self, LogTag};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

pub struct SharedStore<R: Record> {
    backing: Arc<dyn KeyedRecordStore<R>>,
    lock: Mutex<()>,
}

impl<R: Record> SharedStore<R> {
    pub fn new(backing: Arc<dyn KeyedRecordStore<R>>) -> Self {
        Self {
            backing,
            lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        self.backing.name()
    }

    /// Lock the collection and load it
    ///
    /// Changes made through the guard are written by `commit`; dropping the
    /// guard without committing discards them.
    pub async fn begin(&self) -> StoreGuard<'_, R> {
        let lock = self.lock.lock().await;
        let records = self.backing.load().await;
        StoreGuard {
            store: self,
            _lock: lock,
            records,
            dirty: false,
        }
    }

    /// Run `f` over a consistent copy of the collection
    pub async fn read<T>(&self, f: impl FnOnce(&[R]) -> T) -> T {
        let guard = self.begin().await;
        f(guard.records())
    }

    /// Current contents
    pub async fn snapshot(&self) -> Vec<R> {
        self.read(|records| records.to_vec()).await
    }

    /// Load, apply `f`, and save if `f` reports a change
    ///
    /// `f` returns its result and whether the collection was modified.
    pub async fn mutate<T>(&self, f: impl FnOnce(&mut Vec<R>) -> (T, bool)) -> T {
        let mut guard = self.begin().await;
        let (result, changed) = f(&mut guard.records);
        if changed {
            guard.mark_dirty();
        }
        guard.commit().await;
        result
    }
}

/// Exclusive, loaded view of a collection
pub struct StoreGuard<'a, R: Record> {
    store: &'a SharedStore<R>,
    _lock: MutexGuard<'a, ()>,
    records: Vec<R>,
    dirty: bool,
}

impl<'a, R: Record> StoreGuard<'a, R> {
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Mutable access; marks the collection for saving
    pub fn records_mut(&mut self) -> &mut Vec<R> {
        self.dirty = true;
        &mut self.records
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Save if anything changed, then release the lock
    ///
    /// Save failures are logged; the in-memory change is lost with the guard.
    pub async fn commit(self) -> bool {
        if !self.dirty {
            return true;
        }
        match self.store.backing.save(&self.records).await {
            Ok(()) => true,
            Err(e) => {
                logger::error(
                    LogTag::Storage,
                    &format!("Failed to save {}: {}", self.store.name(), e),
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::Item;
    use crate::storage::MemoryStore;

    fn shared(items: Vec<Item>) -> (Arc<MemoryStore<Item>>, Arc<SharedStore<Item>>) {
        let memory = Arc::new(MemoryStore::with_records("items", items));
        let store = Arc::new(SharedStore::new(memory.clone()));
        (memory, store)
    }

    #[tokio::test]
    async fn test_mutate_saves_only_when_changed() {
        let (memory, store) = shared(vec![Item::new(1, "a")]);

        let found = store.mutate(|items| (items.len(), false)).await;
        assert_eq!(found, 1);
        assert_eq!(memory.save_count(), 0);

        store
            .mutate(|items| {
                items.push(Item::new(2, "b"));
                ((), true)
            })
            .await;
        assert_eq!(memory.save_count(), 1);
        assert_eq!(store.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_uncommitted_guard_discards_changes() {
        let (memory, store) = shared(vec![]);
        {
            let mut guard = store.begin().await;
            guard.records_mut().push(Item::new(1, "a"));
        }
        assert!(store.snapshot().await.is_empty());
        assert_eq!(memory.save_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let (_memory, store) = shared(vec![Item::new(1, "0")]);

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .mutate(|items| {
                        let next = items[0].label.parse::<u32>().unwrap() + 1;
                        items[0].label = next.to_string();
                        ((), true)
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.snapshot().await[0].label, "50");
    }
}
