//! Whole-file JSON persistence
//!
//! Each entity kind lives in one JSON file mapping identity keys to entity
//! values. Saves go through a temp file in the same directory followed by a
//! rename, so readers only ever observe a complete file.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::debug;

use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Create the data directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }

    fn path_for(&self, kind: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", kind))
    }

    /// Load the whole collection for a kind; a missing file is an empty map.
    pub async fn load<T>(&self, kind: &str) -> Result<HashMap<i64, T>>
    where
        T: DeserializeOwned,
    {
        let path = self.path_for(kind);
        match fs::read(&path).await {
            Ok(bytes) => {
                let entries: HashMap<i64, T> = serde_json::from_slice(&bytes)?;
                debug!(kind = kind, count = entries.len(), "Loaded collection");
                Ok(entries)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(kind = kind, "No data file yet, starting empty");
                Ok(HashMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically replace the whole collection for a kind.
    pub async fn save<T>(&self, kind: &str, entries: &HashMap<i64, T>) -> Result<()>
    where
        T: Serialize,
    {
        let path = self.path_for(kind);
        let tmp = self.data_dir.join(format!("{}.json.tmp", kind));

        let bytes = serde_json::to_vec_pretty(entries)?;
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &path).await?;

        debug!(kind = kind, count = entries.len(), "Saved collection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;
    use chrono::Utc;

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        let loaded: HashMap<i64, UserRecord> = store.load("users").await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        store.ensure_dir().await.unwrap();

        let mut users = HashMap::new();
        let mut user = UserRecord::new(123, Utc::now());
        user.username = Some("alice".to_string());
        user.is_premium = true;
        users.insert(123, user);

        store.save("users", &users).await.unwrap();
        let loaded: HashMap<i64, UserRecord> = store.load("users").await.unwrap();
        assert_eq!(loaded, users);
    }

    #[tokio::test]
    async fn test_save_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        store.ensure_dir().await.unwrap();

        let mut first = HashMap::new();
        first.insert(1, UserRecord::new(1, Utc::now()));
        first.insert(2, UserRecord::new(2, Utc::now()));
        store.save("users", &first).await.unwrap();

        let mut second = HashMap::new();
        second.insert(3, UserRecord::new(3, Utc::now()));
        store.save("users", &second).await.unwrap();

        let loaded: HashMap<i64, UserRecord> = store.load("users").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key(&3));
    }
}
