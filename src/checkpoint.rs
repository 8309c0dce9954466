//! Durable ingestion progress, one JSON file per script invocation.
//!
//! The file is read at startup so a re-run skips completed work, written
//! every few items while running, and deleted on clean completion so the
//! next invocation starts fresh. A run that ends with errors (or dies)
//! leaves the file behind for resume. This is deliberately a flat file and
//! not a work queue: one operator, one run per series at a time.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Persist after this many newly processed items.
const DEFAULT_FLUSH_EVERY: usize = 5;

/// On-disk document shape (camelCase, matching the historical files so old
/// checkpoints keep resuming).
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckpointFile {
    started_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    processed: u64,
    success: u64,
    errors: u64,
    not_found: u64,
    processed_ids: Vec<String>,
}

impl CheckpointFile {
    fn fresh() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            last_updated: now,
            processed: 0,
            success: 0,
            errors: 0,
            not_found: 0,
            processed_ids: Vec::new(),
        }
    }
}

/// Per-item result recorded against the checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Success,
    Error,
    NotFound,
}

pub struct Checkpoint {
    path: PathBuf,
    state: CheckpointFile,
    seen: HashSet<String>,
    dirty: usize,
    flush_every: usize,
}

impl Checkpoint {
    /// Load an existing checkpoint for resume, or start fresh. A corrupt
    /// file is logged and replaced rather than aborting the run.
    pub fn load_or_new(path: &Path) -> Result<Self> {
        let state = match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<CheckpointFile>(&raw) {
                Ok(existing) => {
                    info!(
                        path = %path.display(),
                        processed = existing.processed,
                        "resuming from checkpoint"
                    );
                    existing
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable checkpoint; starting fresh");
                    CheckpointFile::fresh()
                }
            },
            Err(_) => CheckpointFile::fresh(),
        };
        let seen = state.processed_ids.iter().cloned().collect();
        Ok(Self {
            path: path.to_path_buf(),
            state,
            seen,
            dirty: 0,
            flush_every: DEFAULT_FLUSH_EVERY,
        })
    }

    /// Already processed in this or a prior run.
    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Record one item and persist every `flush_every` items.
    pub fn record(&mut self, key: &str, outcome: ItemOutcome) -> Result<()> {
        if !self.seen.insert(key.to_string()) {
            return Ok(());
        }
        self.state.processed_ids.push(key.to_string());
        self.state.processed += 1;
        match outcome {
            ItemOutcome::Success => self.state.success += 1,
            ItemOutcome::Error => self.state.errors += 1,
            ItemOutcome::NotFound => self.state.not_found += 1,
        }
        self.dirty += 1;
        if self.dirty >= self.flush_every {
            self.save()?;
        }
        Ok(())
    }

    /// Flush the current state to disk.
    pub fn save(&mut self) -> Result<()> {
        self.state.last_updated = Utc::now();
        let raw = serde_json::to_string_pretty(&self.state)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("writing checkpoint {}", self.path.display()))?;
        self.dirty = 0;
        Ok(())
    }

    pub fn success_count(&self) -> u64 {
        self.state.success
    }

    pub fn error_count(&self) -> u64 {
        self.state.errors
    }

    pub fn processed_count(&self) -> u64 {
        self.state.processed
    }

    /// Clean completion deletes the file; completion with errors flushes it
    /// so the next run resumes past the completed items.
    pub fn finish(mut self) -> Result<()> {
        if self.state.errors == 0 {
            if self.path.exists() {
                fs::remove_file(&self.path)
                    .with_context(|| format!("removing checkpoint {}", self.path.display()))?;
            }
            info!("run clean; checkpoint removed");
        } else {
            self.save()?;
            info!(
                path = %self.path.display(),
                errors = self.state.errors,
                "run finished with errors; checkpoint kept for resume"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resume_skips_processed_and_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");

        let mut cp = Checkpoint::load_or_new(&path).unwrap();
        cp.record("a", ItemOutcome::Success).unwrap();
        cp.record("b", ItemOutcome::Error).unwrap();
        cp.save().unwrap();
        drop(cp);

        let mut resumed = Checkpoint::load_or_new(&path).unwrap();
        assert!(resumed.contains("a"));
        assert!(resumed.contains("b"));
        assert!(!resumed.contains("c"));
        resumed.record("c", ItemOutcome::Success).unwrap();
        resumed.save().unwrap();
        assert_eq!(resumed.processed_count(), 3);
        assert_eq!(resumed.success_count(), 2);
        assert_eq!(resumed.error_count(), 1);
    }

    #[test]
    fn duplicate_records_count_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut cp = Checkpoint::load_or_new(&path).unwrap();
        cp.record("a", ItemOutcome::Success).unwrap();
        cp.record("a", ItemOutcome::Success).unwrap();
        assert_eq!(cp.processed_count(), 1);
    }

    #[test]
    fn clean_finish_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut cp = Checkpoint::load_or_new(&path).unwrap();
        cp.record("a", ItemOutcome::Success).unwrap();
        cp.save().unwrap();
        assert!(path.exists());
        cp.finish().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn errored_finish_keeps_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut cp = Checkpoint::load_or_new(&path).unwrap();
        cp.record("a", ItemOutcome::Error).unwrap();
        cp.finish().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn corrupt_file_starts_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(&path, "{ not json").unwrap();
        let cp = Checkpoint::load_or_new(&path).unwrap();
        assert_eq!(cp.processed_count(), 0);
    }

    #[test]
    fn periodic_flush_writes_every_n_items() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut cp = Checkpoint::load_or_new(&path).unwrap();
        for i in 0..4 {
            cp.record(&format!("k{i}"), ItemOutcome::Success).unwrap();
        }
        assert!(!path.exists(), "below the flush threshold nothing is written");
        cp.record("k4", ItemOutcome::Success).unwrap();
        assert!(path.exists(), "fifth item triggers the periodic flush");
    }
}
