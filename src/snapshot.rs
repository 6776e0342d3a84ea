//! JSON checkpoints written between pipeline stages
//!
//! `links_<ts>.json` holds the collected posting URLs and `jobs_<ts>.json` the
//! assembled records. A jobs snapshot can be fed back in to rerun enrichment
//! and persistence without touching the browser.

use crate::error::{Error, Result};
use crate::scrape::JobRecord;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Timestamp format used in snapshot and log file names
pub const FILE_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot<T> {
    created_at: DateTime<Utc>,
    items: Vec<T>,
}

/// Timestamp suffix for files written by one run
pub fn run_stamp(at: DateTime<Utc>) -> String {
    at.format(FILE_TIMESTAMP).to_string()
}

pub fn links_path(dir: &Path, stamp: &str) -> PathBuf {
    dir.join(format!("links_{}.json", stamp))
}

pub fn jobs_path(dir: &Path, stamp: &str) -> PathBuf {
    dir.join(format!("jobs_{}.json", stamp))
}

pub fn write_links(dir: &Path, stamp: &str, links: &[String]) -> Result<PathBuf> {
    let path = links_path(dir, stamp);
    write(&path, links)?;
    info!("Saved {} links to {:?}", links.len(), path);
    Ok(path)
}

pub fn write_jobs(dir: &Path, stamp: &str, records: &[JobRecord]) -> Result<PathBuf> {
    let path = jobs_path(dir, stamp);
    write(&path, records)?;
    info!("Saved {} records to {:?}", records.len(), path);
    Ok(path)
}

pub fn read_links(path: &Path) -> Result<Vec<String>> {
    read(path)
}

pub fn read_jobs(path: &Path) -> Result<Vec<JobRecord>> {
    read(path)
}

fn write<T: Serialize + Clone>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let snapshot = Snapshot {
        created_at: Utc::now(),
        items: items.to_vec(),
    };
    let content = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(path, content)?;
    Ok(())
}

fn read<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Snapshot(format!("Cannot read {:?}: {}", path, e)))?;
    let snapshot: Snapshot<T> = serde_json::from_str(&content)
        .map_err(|e| Error::Snapshot(format!("Malformed snapshot {:?}: {}", path, e)))?;
    Ok(snapshot.items)
}
