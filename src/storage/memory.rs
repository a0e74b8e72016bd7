use super::{KeyedRecordStore, Record};
use crate::errors::BotResult;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Collection kept in process memory
pub struct MemoryStore<R: Record> {
    name: String,
    records: Mutex<Vec<R>>,
    saves: AtomicUsize,
}

impl<R: Record> MemoryStore<R> {
    pub fn new(name: &str) -> Self {
        Self::with_records(name, Vec::new())
    }

    pub fn with_records(name: &str, records: Vec<R>) -> Self {
        Self {
            name: name.to_string(),
            records: Mutex::new(records),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of completed saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<R: Record> KeyedRecordStore<R> for MemoryStore<R> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Vec<R> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    async fn save(&self, records: &[R]) -> BotResult<()> {
        match self.records.lock() {
            Ok(mut stored) => *stored = records.to_vec(),
            Err(poisoned) => *poisoned.into_inner() = records.to_vec(),
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
