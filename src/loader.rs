use std::{fs, path::Path};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::models::SeedRecord;
use crate::store::{Store, StoreError};

const PROGRESS_INTERVAL: usize = 50;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub created: usize,
    pub skipped: usize,
}

/// Replay a batch through the same write path the API uses. Each record is
/// its own transaction; a record whose email already exists is skipped, so
/// re-running a batch never duplicates people.
pub fn load_records(store: &Store, records: &[SeedRecord]) -> Result<LoadSummary, StoreError> {
    let total = records.len();
    let mut summary = LoadSummary::default();

    for (idx, record) in records.iter().enumerate() {
        match store.create_person(record)? {
            Some(_) => summary.created += 1,
            None => {
                summary.skipped += 1;
                debug!(email = %record.email, "Skipping existing person");
            }
        }

        let loaded = idx + 1;
        if loaded % PROGRESS_INTERVAL == 0 || loaded == total {
            info!(
                loaded,
                total,
                created = summary.created,
                skipped = summary.skipped,
                "Bulk load progress"
            );
        }
    }

    Ok(summary)
}

pub fn load_file(store: &Store, path: &Path) -> Result<LoadSummary> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed reading batch file {}", path.display()))?;
    let records: Vec<SeedRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed parsing batch file {}", path.display()))?;

    info!(records = records.len(), file = %path.display(), "Loading batch");
    load_records(store, &records).context("Bulk load failed")
}
