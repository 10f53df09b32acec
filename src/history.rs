//! Conversation and upload history — bounded, best-effort persistence.
//!
//! One JSON file per key under the store directory, newest records last.
//! Capacity is enforced on every append (FIFO — the oldest records go
//! first, never the newest), an opportunistic sweep drops records past the
//! retention window, and write failures are recovered by evicting and
//! retrying exactly once. History is never load-bearing: a failed write is
//! logged and swallowed, a corrupt file reads as empty.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Per-key byte budget — the quota analog for a disk-backed store.
const DEFAULT_QUOTA_BYTES: usize = 256 * 1024;

/// One logged interaction: a chat turn, an upload, whatever the caller
/// records. The payload is opaque to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub recorded_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl HistoryRecord {
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            recorded_at: Utc::now(),
            payload,
        }
    }
}

/// Key-value log store, one JSON file per key.
pub struct HistoryStore {
    dir: PathBuf,
    quota_bytes: usize,
}

impl HistoryStore {
    /// Store rooted at `dir` (created lazily on first write).
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }

    /// Override the per-key byte budget.
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// All records for `key`, oldest first. Missing or corrupt files read
    /// as empty — history never blocks the caller.
    pub fn load(&self, key: &str) -> Vec<HistoryRecord> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_slice(&bytes) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(key, error = %e, "Corrupt history file, treating as empty");
                Vec::new()
            }
        }
    }

    /// Append a record, enforcing `max_records` (oldest dropped first).
    pub fn append(&self, key: &str, payload: serde_json::Value, max_records: usize) {
        self.append_record(key, HistoryRecord::new(payload), max_records);
    }

    /// Append a pre-built record — callers that stamp their own time.
    pub fn append_record(&self, key: &str, record: HistoryRecord, max_records: usize) {
        let mut records = self.load(key);
        records.push(record);
        trim_oldest(&mut records, max_records);
        self.persist(key, records);
    }

    /// Re-apply the capacity bound to an existing key.
    pub fn evict_if_over_capacity(&self, key: &str, max_records: usize) {
        let mut records = self.load(key);
        if records.len() > max_records {
            trim_oldest(&mut records, max_records);
            self.persist(key, records);
        }
    }

    /// Drop records older than `retention` across every key, removing
    /// files that end up empty. Maintenance only — run opportunistically
    /// (app start, profile switch), never on a timer.
    pub fn sweep_expired(&self, retention: Duration) {
        let cutoff = Utc::now() - retention;
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return, // nothing persisted yet
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            let Ok(bytes) = fs::read(&path) else { continue };
            let Ok(records) = serde_json::from_slice::<Vec<HistoryRecord>>(&bytes) else {
                continue;
            };
            let kept: Vec<HistoryRecord> = records
                .iter()
                .filter(|r| r.recorded_at >= cutoff)
                .cloned()
                .collect();
            if kept.len() == records.len() {
                continue;
            }
            tracing::debug!(
                file = %path.display(),
                removed = records.len() - kept.len(),
                "Swept expired history records"
            );
            if kept.is_empty() {
                let _ = fs::remove_file(&path);
            } else if let Err(e) = self.write_records(&path, &kept) {
                tracing::warn!(file = %path.display(), error = %e, "History sweep write failed");
            }
        }
    }

    // ── Internal ────────────────────────────────────────────

    /// Write with quota recovery: on failure, evict the oldest half and
    /// retry exactly once; a second failure is logged and swallowed.
    fn persist(&self, key: &str, mut records: Vec<HistoryRecord>) {
        let path = self.path_for(key);
        match self.write_records(&path, &records) {
            Ok(()) => {}
            Err(first) => {
                let evict = (records.len() / 2).max(1).min(records.len());
                records.drain(..evict);
                tracing::warn!(key, error = %first, evicted = evict, "History write failed, evicting and retrying");
                if let Err(second) = self.write_records(&path, &records) {
                    tracing::warn!(key, error = %second, "History write failed after eviction, dropping");
                }
            }
        }
    }

    fn write_records(&self, path: &Path, records: &[HistoryRecord]) -> Result<(), ApiError> {
        let bytes = serde_json::to_vec(records)
            .map_err(|e| ApiError::StorageQuota(e.to_string()))?;
        if bytes.len() > self.quota_bytes {
            return Err(ApiError::StorageQuota(format!(
                "{} bytes exceeds {}-byte budget",
                bytes.len(),
                self.quota_bytes
            )));
        }
        fs::create_dir_all(&self.dir).map_err(|e| ApiError::StorageQuota(e.to_string()))?;
        fs::write(path, bytes).map_err(|e| ApiError::StorageQuota(e.to_string()))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

/// Keys become file names; anything outside `[A-Za-z0-9._-]` maps to `_`.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn trim_oldest(records: &mut Vec<HistoryRecord>, max_records: usize) {
    if records.len() > max_records {
        let excess = records.len() - max_records;
        records.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, HistoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history"));
        (dir, store)
    }

    #[test]
    fn load_missing_key_is_empty() {
        let (_dir, store) = store();
        assert!(store.load("chat:profile-1").is_empty());
    }

    #[test]
    fn append_then_load_round_trips() {
        let (_dir, store) = store();
        store.append("chat:profile-1", json!({"role": "user", "text": "hi"}), 100);
        store.append("chat:profile-1", json!({"role": "assistant", "text": "hello"}), 100);
        let records = store.load("chat:profile-1");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payload["role"], "user");
        assert_eq!(records[1].payload["role"], "assistant");
    }

    #[test]
    fn keys_are_isolated() {
        let (_dir, store) = store();
        store.append("uploads:a", json!({"file": "1.pdf"}), 10);
        store.append("uploads:b", json!({"file": "2.pdf"}), 10);
        assert_eq!(store.load("uploads:a").len(), 1);
        assert_eq!(store.load("uploads:b").len(), 1);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let (_dir, store) = store();
        for i in 0..5 {
            store.append("uploads:p1", json!({"n": i}), 3);
        }
        let records = store.load("uploads:p1");
        assert_eq!(records.len(), 3);
        let ns: Vec<i64> = records.iter().map(|r| r.payload["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![2, 3, 4]);
    }

    #[test]
    fn evict_if_over_capacity_trims_existing_key() {
        let (_dir, store) = store();
        for i in 0..10 {
            store.append("chat:p1", json!({"n": i}), 100);
        }
        store.evict_if_over_capacity("chat:p1", 4);
        let records = store.load("chat:p1");
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].payload["n"], 6);
    }

    #[test]
    fn quota_failure_evicts_and_retries_once() {
        let (_dir, store) = store();
        let store = store.with_quota(600);
        // Each record is ~80 bytes; the budget forces eviction well before
        // ten records fit.
        for i in 0..10 {
            store.append("chat:p1", json!({"n": i, "pad": "xxxxxxxxxxxxxxxx"}), 100);
        }
        let records = store.load("chat:p1");
        assert!(!records.is_empty());
        // Newest record always survives.
        assert_eq!(records.last().unwrap().payload["n"], 9);
    }

    #[test]
    fn sweep_removes_expired_records() {
        let (_dir, store) = store();
        let old = HistoryRecord {
            recorded_at: Utc::now() - Duration::days(45),
            payload: json!({"n": "old"}),
        };
        store.append_record("chat:p1", old, 100);
        store.append("chat:p1", json!({"n": "fresh"}), 100);

        store.sweep_expired(Duration::days(30));

        let records = store.load("chat:p1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload["n"], "fresh");
    }

    #[test]
    fn sweep_removes_files_left_empty() {
        let (_dir, store) = store();
        let old = HistoryRecord {
            recorded_at: Utc::now() - Duration::days(45),
            payload: json!({}),
        };
        store.append_record("chat:stale", old, 100);
        store.sweep_expired(Duration::days(30));
        assert!(store.load("chat:stale").is_empty());
    }

    #[test]
    fn sweep_on_empty_store_is_a_no_op() {
        let (_dir, store) = store();
        store.sweep_expired(Duration::days(30));
    }

    #[test]
    fn corrupt_file_reads_as_empty_and_recovers() {
        let (_dir, store) = store();
        store.append("chat:p1", json!({"n": 1}), 100);
        fs::write(store.path_for("chat:p1"), b"not json").unwrap();
        assert!(store.load("chat:p1").is_empty());
        store.append("chat:p1", json!({"n": 2}), 100);
        assert_eq!(store.load("chat:p1").len(), 1);
    }

    #[test]
    fn sanitize_key_maps_separators() {
        assert_eq!(sanitize_key("chat:profile/1"), "chat_profile_1");
        assert_eq!(sanitize_key("uploads.p-1_x"), "uploads.p-1_x");
    }
}
