//! Abuse record repository implementation
//!
//! Entries are held behind per-identity mutexes so admission checks for
//! unrelated identities never serialize against each other; the outer map
//! lock only guards entry creation and snapshots.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::models::AbuseRecord;

#[derive(Debug, Default)]
pub struct AbuseRepository {
    records: RwLock<HashMap<i64, Arc<Mutex<AbuseRecord>>>>,
}

impl AbuseRepository {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the in-memory collection with freshly loaded entries.
    pub fn load_from(&self, entries: HashMap<i64, AbuseRecord>) {
        let wrapped = entries
            .into_iter()
            .map(|(id, record)| (id, Arc::new(Mutex::new(record))))
            .collect();
        *self.records.write().unwrap() = wrapped;
    }

    /// Fetch the record handle for an identity, creating a fully-populated
    /// default lazily on first request.
    pub fn entry(&self, user_id: i64) -> Arc<Mutex<AbuseRecord>> {
        if let Some(record) = self.records.read().unwrap().get(&user_id) {
            return Arc::clone(record);
        }
        let mut records = self.records.write().unwrap();
        Arc::clone(
            records
                .entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(AbuseRecord::new()))),
        )
    }

    /// Clone the current record for an identity, if one exists.
    pub fn get(&self, user_id: i64) -> Option<AbuseRecord> {
        self.records
            .read()
            .unwrap()
            .get(&user_id)
            .map(|record| record.lock().unwrap().clone())
    }

    pub fn contains(&self, user_id: i64) -> bool {
        self.records.read().unwrap().contains_key(&user_id)
    }

    pub fn snapshot(&self) -> HashMap<i64, AbuseRecord> {
        self.records
            .read()
            .unwrap()
            .iter()
            .map(|(id, record)| (*id, record.lock().unwrap().clone()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.records.read().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creates_default_record() {
        let repo = AbuseRepository::new();
        assert!(!repo.contains(1));

        let entry = repo.entry(1);
        assert_eq!(entry.lock().unwrap().block_level, 0);
        assert!(repo.contains(1));
    }

    #[test]
    fn test_mutation_visible_through_snapshot() {
        let repo = AbuseRepository::new();
        repo.entry(5).lock().unwrap().block_level = 2;

        let snapshot = repo.snapshot();
        assert_eq!(snapshot[&5].block_level, 2);
    }

    #[test]
    fn test_load_from_replaces_contents() {
        let repo = AbuseRepository::new();
        repo.entry(1);

        let mut fresh = HashMap::new();
        let mut record = AbuseRecord::new();
        record.warning_level = 2;
        fresh.insert(9, record);
        repo.load_from(fresh);

        assert!(!repo.contains(1));
        assert_eq!(repo.get(9).unwrap().warning_level, 2);
    }
}
