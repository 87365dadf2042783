//! A small key-value string store and the functions that keep the ledger in it.
//!
//! The whole ledger lives under a single key and is rewritten in full after every change.

use crate::model::Ledger;
use crate::{utils, Result};
use anyhow::Context;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// The key the serialized ledger is stored under.
pub const EXPENSES: &str = "expenses";

/// A key-value store holding string values.
#[async_trait::async_trait]
pub trait Store {
    /// Returns `None` when nothing has been stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces whatever is stored under `key` with `value`.
    async fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<key>.json` in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait::async_trait]
impl Store for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.is_file() {
            trace!("No value stored at {}", path.display());
            return Ok(None);
        }
        utils::read(&path).await.map(Some)
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path(key);
        // Write next to the destination and swap it in, so a failed write never leaves a
        // truncated ledger behind.
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        utils::write(&tmp, value).await?;
        utils::rename(&tmp, &path).await
    }
}

/// Holds values in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new(data: HashMap<String, String>) -> Self {
        Self { data }
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.get(key).cloned())
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads the ledger from `store`. A missing value gives an empty ledger, and so does a value
/// that cannot be read or parsed, after logging a warning.
pub async fn load_ledger(store: &(dyn Store + Send + Sync)) -> Ledger {
    let raw = match store.get(EXPENSES).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No stored expenses, starting with an empty ledger");
            return Ledger::default();
        }
        Err(e) => {
            warn!("Unable to read stored expenses, starting with an empty ledger: {e:#}");
            return Ledger::default();
        }
    };
    match parse_ledger(&raw) {
        Ok(ledger) => {
            debug!("Loaded {} stored expenses", ledger.len());
            ledger
        }
        Err(e) => {
            warn!("Stored expenses are malformed, starting with an empty ledger: {e:#}");
            Ledger::default()
        }
    }
}

/// Serializes `ledger` and replaces the stored value with it.
pub async fn save_ledger(store: &mut (dyn Store + Send + Sync), ledger: &Ledger) -> Result<()> {
    let json = serde_json::to_string(ledger).context("Unable to serialize the ledger")?;
    store
        .set(EXPENSES, &json)
        .await
        .context("Unable to save the ledger")?;
    trace!("Saved {} expenses", ledger.len());
    Ok(())
}

/// A stored `null` is treated the same as nothing stored.
fn parse_ledger(raw: &str) -> Result<Ledger> {
    let value: Option<Ledger> =
        serde_json::from_str(raw).context("Stored expenses are not a JSON array of expenses")?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, CategoryLabel, Expense};
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;
    use tempfile::TempDir;

    fn ledger() -> Ledger {
        Ledger::new(vec![
            Expense::new(
                "Coffee",
                Amount::from_str("5.50").unwrap(),
                CategoryLabel::Food,
                Utc.with_ymd_and_hms(2025, 3, 2, 8, 0, 0).unwrap(),
            ),
            Expense::new(
                "Bus",
                Amount::from_str("2").unwrap(),
                CategoryLabel::Transport,
                Utc.with_ymd_and_hms(2025, 4, 9, 17, 45, 0).unwrap(),
            ),
        ])
    }

    fn memory_with(raw: &str) -> MemoryStore {
        let mut data = HashMap::new();
        data.insert(EXPENSES.to_string(), raw.to_string());
        MemoryStore::new(data)
    }

    #[tokio::test]
    async fn test_missing_key_is_empty() {
        let store = MemoryStore::default();
        assert!(load_ledger(&store).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_is_empty() {
        for raw in ["", "not json", "{\"a\": 1}", "[{\"description\": 5}]", "null"] {
            let store = memory_with(raw);
            assert!(load_ledger(&store).await.is_empty(), "'{raw}'");
        }
    }

    #[tokio::test]
    async fn test_reads_browser_style_records() {
        let raw = r#"[
            {"description":"Coffee","amount":"3.50","category":"Food","date":"2025-03-02T08:00:00.000Z"},
            {"description":"Bus","amount":2,"category":"Transport","date":"2025-03-03T08:00:00.000Z"}
        ]"#;
        let ledger = load_ledger(&memory_with(raw)).await;
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get(1).unwrap().amount(), Amount::from_str("2").unwrap());
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let mut store = MemoryStore::default();
        let original = ledger();
        save_ledger(&mut store, &original).await.unwrap();
        assert_eq!(load_ledger(&store).await, original);
    }

    #[tokio::test]
    async fn test_file_store() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path());
        assert!(store.get(EXPENSES).await.unwrap().is_none());

        let original = ledger();
        save_ledger(&mut store, &original).await.unwrap();
        assert!(dir.path().join("expenses.json").is_file());
        assert!(!dir.path().join(".expenses.json.tmp").exists());

        // A second save replaces the first in full.
        let mut shorter = original.clone();
        shorter.remove(0).unwrap();
        save_ledger(&mut store, &shorter).await.unwrap();

        let reopened = FileStore::new(dir.path());
        assert_eq!(load_ledger(&reopened).await, shorter);
    }
}
