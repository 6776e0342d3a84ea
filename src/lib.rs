//! jobtrawl: scrape job postings into a normalized SQLite database
//!
//! The pipeline runs in stages:
//! - Link collection over paginated search results
//! - Field extraction and record assembly per posting
//! - Enrichment with countries, country metadata and coordinates
//! - Skill tagging against a reference vocabulary
//! - Normalized, idempotent persistence

pub mod browser;
pub mod commands;
pub mod config;
pub mod enrich;
pub mod error;
pub mod progress;
pub mod scrape;
pub mod skills;
pub mod snapshot;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
