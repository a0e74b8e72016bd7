//! Record collections persisted as whole files
//!
//! - `KeyedRecordStore`: load/save of one named collection
//! - `JsonFileStore`: JSON array on disk
//! - `MemoryStore`: in-process collection for tests and ephemeral runs
//! - `SharedStore`: serializes read-modify-write cycles on one collection
//!
//! Loading never fails: a missing or unreadable collection degrades to the
//! store's fallback records and the problem is logged.

mod json_file;
mod memory;
mod shared;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use shared::{SharedStore, StoreGuard};

use crate::errors::BotResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// A record identified by a key within its collection
pub trait Keyed {
    type Key: PartialEq + Debug;

    fn key(&self) -> &Self::Key;
}

/// Bounds shared by every persisted record type
pub trait Record: Keyed + Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {}

impl<T> Record for T where
    T: Keyed + Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static
{
}

/// Durable backing for one collection
#[async_trait]
pub trait KeyedRecordStore<R: Record>: Send + Sync {
    /// Collection name used in log lines
    fn name(&self) -> &str;

    /// Current contents, or the fallback when the collection is missing or unreadable
    async fn load(&self) -> Vec<R>;

    /// Replace the whole collection
    async fn save(&self, records: &[R]) -> BotResult<()>;
}

pub fn find_by_key<'a, R: Keyed>(records: &'a [R], key: &R::Key) -> Option<&'a R> {
    records.iter().find(|r| r.key() == key)
}

pub fn contains_key<R: Keyed>(records: &[R], key: &R::Key) -> bool {
    records.iter().any(|r| r.key() == key)
}

/// Remove every record with `key`, returning how many were dropped
pub fn remove_by_key<R: Keyed>(records: &mut Vec<R>, key: &R::Key) -> usize {
    let before = records.len();
    records.retain(|r| r.key() != key);
    before - records.len()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Keyed;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Item {
        pub id: u32,
        pub label: String,
    }

    impl Item {
        pub fn new(id: u32, label: &str) -> Self {
            Self {
                id,
                label: label.to_string(),
            }
        }
    }

    impl Keyed for Item {
        type Key = u32;

        fn key(&self) -> &u32 {
            &self.id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::Item;
    use super::*;

    #[test]
    fn test_key_helpers() {
        let mut items = vec![Item::new(1, "a"), Item::new(2, "b"), Item::new(1, "c")];
        assert_eq!(find_by_key(&items, &2).map(|i| i.label.as_str()), Some("b"));
        assert!(contains_key(&items, &1));
        assert_eq!(remove_by_key(&mut items, &1), 2);
        assert_eq!(items, vec![Item::new(2, "b")]);
        assert_eq!(remove_by_key(&mut items, &9), 0);
    }
}
