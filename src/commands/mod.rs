//! CLI commands implementation

pub mod scrape;

pub use scrape::*;
