//! Append-only history log mirrored to a key-value store.
//!
//! Every mutation rewrites the whole log under one key, so the in-memory copy
//! and the durable copy never diverge after an operation returns.

use crate::model::HistoryRecord;
use crate::storage::KeyValueStore;
use crate::surface::FormSurface;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const HISTORY_KEY: &str = "history";
pub const HISTORY_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct PersistedHistoryRef<'a> {
    version: u32,
    records: &'a [HistoryRecord],
}

#[derive(Deserialize)]
struct PersistedHistory {
    version: u32,
    records: Vec<HistoryRecord>,
}

/// Accepted shapes of the stored value. A bare array is the unversioned
/// format written by the browser form.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    Versioned(PersistedHistory),
    Legacy(Vec<HistoryRecord>),
}

pub struct HistoryStore {
    store: Box<dyn KeyValueStore>,
    records: Vec<HistoryRecord>,
}

impl HistoryStore {
    /// Open the store and hydrate the in-memory log from it.
    pub fn open(store: Box<dyn KeyValueStore>) -> Self {
        let mut history = Self {
            store,
            records: Vec::new(),
        };
        history.records = history.load();
        tracing::debug!(records = history.records.len(), "history hydrated");
        history
    }

    /// Read the durable log. Missing or unreadable content yields an empty log.
    pub fn load(&self) -> Vec<HistoryRecord> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("history storage unreadable, starting empty: {e:#}");
                return Vec::new();
            }
        };
        match serde_json::from_str::<StoredHistory>(&raw) {
            Ok(StoredHistory::Versioned(p)) if p.version == HISTORY_FORMAT_VERSION => p.records,
            Ok(StoredHistory::Versioned(p)) => {
                tracing::warn!(version = p.version, "unsupported history version, starting empty");
                Vec::new()
            }
            Ok(StoredHistory::Legacy(records)) => records,
            Err(e) => {
                tracing::warn!("history storage corrupt, starting empty: {e}");
                Vec::new()
            }
        }
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append one record and persist the whole log. On a failed write the
    /// record is dropped again and the error returned.
    pub fn append(&mut self, record: HistoryRecord) -> Result<()> {
        self.records.push(record);
        if let Err(e) = self.persist() {
            self.records.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Remove the durable key, then empty the in-memory log.
    pub fn clear(&mut self) -> Result<()> {
        self.store
            .remove(HISTORY_KEY)
            .context("failed to clear stored history")?;
        self.records.clear();
        tracing::info!("history cleared");
        Ok(())
    }

    /// Project the log into the visible history surface.
    pub fn render(&self, surface: &mut dyn FormSurface) {
        surface.clear_history_rows();
        for record in &self.records {
            surface.append_history_row(record);
        }
    }

    fn persist(&mut self) -> Result<()> {
        let body = serde_json::to_string(&PersistedHistoryRef {
            version: HISTORY_FORMAT_VERSION,
            records: &self.records,
        })
        .context("serialize history")?;
        self.store
            .set(HISTORY_KEY, &body)
            .context("failed to save history")
    }
}

/// Write the log as pretty JSON.
pub fn export_json(path: &Path, records: &[HistoryRecord]) -> Result<()> {
    let body = serde_json::to_string_pretty(records)?;
    std::fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the log as CSV with a header row.
pub fn export_csv(path: &Path, records: &[HistoryRecord]) -> Result<()> {
    std::fs::write(path, history_to_csv(records))
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn history_to_csv(records: &[HistoryRecord]) -> String {
    let mut out = String::from("x,y,r,hit,time,exec_time\n");
    for r in records {
        let row = [&r.x, &r.y, &r.r, &r.hit, &r.timestamp, &r.exec_time]
            .iter()
            .map(|f| csv_field(f))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&row);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::surface::tests::RecordingSurface;

    fn record(x: &str) -> HistoryRecord {
        HistoryRecord {
            x: x.into(),
            y: "2.00".into(),
            r: "3".into(),
            hit: "Да".into(),
            timestamp: "01.10.2025, 12:00:00".into(),
            exec_time: "12 нс".into(),
        }
    }

    fn store_with(raw: &str) -> Box<dyn KeyValueStore> {
        let mut store = MemoryStore::default();
        store.set(HISTORY_KEY, raw).expect("seed");
        Box::new(store)
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            anyhow::bail!("disk full")
        }
        fn remove(&mut self, _key: &str) -> Result<()> {
            anyhow::bail!("read-only")
        }
    }

    #[test]
    fn load_returns_appended_records_in_order() {
        let mut history = HistoryStore::open(Box::new(MemoryStore::default()));
        assert!(history.is_empty());
        history.append(record("1.00")).expect("append");
        history.append(record("2.00")).expect("append");
        assert_eq!(history.load(), vec![record("1.00"), record("2.00")]);
        assert_eq!(history.records(), history.load().as_slice());
    }

    #[test]
    fn clear_is_idempotent() {
        let mut history = HistoryStore::open(Box::new(MemoryStore::default()));
        history.append(record("1.00")).expect("append");
        history.clear().expect("clear");
        assert!(history.is_empty());
        assert!(history.load().is_empty());
        history.clear().expect("clear again");
        assert!(history.is_empty());
        assert!(history.load().is_empty());
    }

    #[test]
    fn corrupt_storage_loads_empty() {
        for raw in ["{not json", "42", r#"{"version":99,"records":[]}"#, r#"[{"x":1}]"#] {
            let history = HistoryStore::open(store_with(raw));
            assert!(history.is_empty(), "raw {raw:?}");
        }
    }

    #[test]
    fn legacy_array_format_is_accepted() {
        let raw = r#"[{"x":"1.00","y":"2.00","r":"3","hit":"Да","now":"01.10.2025, 12:00:00","execTime":"12 нс"}]"#;
        let history = HistoryStore::open(store_with(raw));
        assert_eq!(history.records(), &[record("1.00")]);
    }

    #[test]
    fn failed_write_rolls_back_append() {
        let mut history = HistoryStore::open(Box::new(FailingStore));
        assert!(history.append(record("1.00")).is_err());
        assert!(history.is_empty());
    }

    #[test]
    fn failed_clear_keeps_memory() {
        let mut history = HistoryStore {
            store: Box::new(FailingStore),
            records: vec![record("1.00")],
        };
        assert!(history.clear().is_err());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn render_replaces_rows_without_mutating_log() {
        let mut history = HistoryStore::open(Box::new(MemoryStore::default()));
        history.append(record("1.00")).expect("append");
        history.append(record("2.00")).expect("append");
        let mut surface = RecordingSurface::default();
        surface.rows.push(record("9.00"));
        history.render(&mut surface);
        assert_eq!(surface.rows, vec![record("1.00"), record("2.00")]);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn csv_quotes_timestamps() {
        let csv = history_to_csv(&[record("1.00")]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("x,y,r,hit,time,exec_time"));
        assert_eq!(
            lines.next(),
            Some("1.00,2.00,3,Да,\"01.10.2025, 12:00:00\",12 нс")
        );
    }
}
