//! Browser automation boundary
//!
//! The scraping stages only need a handful of operations: navigate, query
//! elements, read attributes, click, and wait for a control to become
//! clickable. They are expressed by the [`Browser`] trait so the pipeline can
//! run against headless Chrome in production and a static fixture in tests.

mod chrome;
#[cfg(test)]
pub(crate) mod fixture;

pub use chrome::*;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How to find an element: a CSS selector, optionally narrowed to elements
/// whose trimmed text equals `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub css: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Locator {
    pub fn css(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            text: None,
        }
    }

    pub fn with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            text: Some(text.into()),
        }
    }

    /// Whether an element's visible text satisfies the text filter
    pub fn matches_text(&self, element_text: &str) -> bool {
        match &self.text {
            Some(expected) => element_text.trim() == expected,
            None => true,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{} [text={:?}]", self.css, text),
            None => write!(f, "{}", self.css),
        }
    }
}

/// A located element, captured at query time.
///
/// `index` is the element's position among all matches of `locator.css`
/// on the page, which lets a browser re-resolve it for clicks and
/// attribute reads.
#[derive(Debug, Clone, PartialEq)]
pub struct DomElement {
    pub locator: Locator,
    pub index: usize,
    pub text: String,
}

/// Operations the pipeline consumes from a browser session.
///
/// Element absence is reported as `Ok(None)` or an empty list; `Err` is kept
/// for failures of the session itself.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Load a URL in the session's page
    async fn navigate(&self, url: &str) -> Result<()>;

    /// First element matching the locator
    async fn find_element(&self, locator: &Locator) -> Result<Option<DomElement>> {
        Ok(self.find_elements(locator).await?.into_iter().next())
    }

    /// All elements matching the locator, in document order
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<DomElement>>;

    /// Read an attribute of a previously located element
    async fn attribute(&self, element: &DomElement, name: &str) -> Result<Option<String>>;

    /// Click a previously located element
    async fn click(&self, element: &DomElement) -> Result<()>;

    /// Poll until an element matching the locator is clickable, or give up
    /// after `timeout`
    async fn wait_until_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<DomElement>>;

    /// URL currently loaded, if any
    async fn current_url(&self) -> Result<Option<String>>;

    /// Shut the session down
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_text_filter() {
        let tab = Locator::with_text("span.link", "Company");
        assert!(tab.matches_text("  Company \n"));
        assert!(!tab.matches_text("Rating"));
        assert!(Locator::css("span.link").matches_text("anything"));
    }

    #[test]
    fn test_locator_display() {
        assert_eq!(Locator::css("li.next a").to_string(), "li.next a");
        assert_eq!(
            Locator::with_text("span.link", "Rating").to_string(),
            "span.link [text=\"Rating\"]"
        );
    }
}
