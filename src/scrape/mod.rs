//! Browser-driven scraping stages
//!
//! This module provides:
//! - Link collection over paginated search results
//! - Per-posting field extraction with bounded reload retries
//! - Assembly of extracted fields into fixed-shape records
//! - Randomized pacing between page interactions

mod fields;
mod links;
mod pace;
mod record;

pub use fields::*;
pub use links::*;
pub use pace::*;
pub use record::*;

use crate::browser::{Browser, Locator};
use tracing::debug;

/// Close a blocking overlay if one is showing
pub async fn dismiss_overlay(browser: &dyn Browser, close: &Locator) {
    match browser.find_element(close).await {
        Ok(Some(button)) => {
            if let Err(e) = browser.click(&button).await {
                debug!("Overlay close button not clickable: {}", e);
            }
        }
        Ok(None) => debug!("No pop-up"),
        Err(e) => debug!("Overlay lookup failed: {}", e),
    }
}
