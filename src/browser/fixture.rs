//! Static-HTML browser for exercising the scraping stages offline.
//!
//! Pages are registered per URL; registering several versions of the same URL
//! serves them in order on successive loads (the last one repeats), which is
//! how reload behaviour is simulated. Clicking an element with an `href`
//! navigates to it; any other click is only recorded.

use super::{Browser, DomElement, Locator};
use crate::error::{Error, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

#[derive(Default)]
struct FixtureState {
    current: Option<String>,
    loads: HashMap<String, usize>,
    navigations: Vec<String>,
    clicks: Vec<String>,
}

#[derive(Default)]
pub(crate) struct FixtureBrowser {
    pages: HashMap<String, Vec<String>>,
    state: Mutex<FixtureState>,
}

struct Match {
    index: usize,
    text: String,
    attributes: HashMap<String, String>,
}

impl FixtureBrowser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a page; repeated calls for one URL queue reload versions
    pub(crate) fn page(mut self, url: &str, html: &str) -> Self {
        self.pages
            .entry(url.to_string())
            .or_default()
            .push(html.to_string());
        self
    }

    pub(crate) fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub(crate) fn loads_of(&self, url: &str) -> usize {
        self.state.lock().unwrap().loads.get(url).copied().unwrap_or(0)
    }

    pub(crate) fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    fn current_html(&self) -> Option<(String, String)> {
        let state = self.state.lock().unwrap();
        let url = state.current.clone()?;
        let versions = self.pages.get(&url)?;
        let load = state.loads.get(&url).copied().unwrap_or(1).max(1);
        let html = versions.get(load - 1).or_else(|| versions.last())?.clone();
        Some((url, html))
    }

    fn matches(&self, locator: &Locator) -> Vec<Match> {
        let Some((_, html)) = self.current_html() else {
            return Vec::new();
        };
        let Ok(selector) = Selector::parse(&locator.css) else {
            return Vec::new();
        };

        let document = Html::parse_document(&html);
        document
            .select(&selector)
            .enumerate()
            .map(|(index, el)| Match {
                index,
                text: el.text().collect::<String>().trim().to_string(),
                attributes: el
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            })
            .filter(|m| locator.matches_text(&m.text))
            .collect()
    }

    fn resolve(&self, element: &DomElement) -> Result<Match> {
        let unfiltered = Locator::css(element.locator.css.clone());
        self.matches(&unfiltered)
            .into_iter()
            .find(|m| m.index == element.index)
            .ok_or_else(|| Error::Browser(format!("stale element {}", element.locator)))
    }

    fn load(&self, url: &str) -> Result<()> {
        if !self.pages.contains_key(url) {
            return Err(Error::Browser(format!("no fixture for {}", url)));
        }
        let mut state = self.state.lock().unwrap();
        *state.loads.entry(url.to_string()).or_default() += 1;
        state.navigations.push(url.to_string());
        state.current = Some(url.to_string());
        Ok(())
    }
}

#[async_trait]
impl Browser for FixtureBrowser {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.load(url)
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<DomElement>> {
        Ok(self
            .matches(locator)
            .into_iter()
            .map(|m| DomElement {
                locator: locator.clone(),
                index: m.index,
                text: m.text,
            })
            .collect())
    }

    async fn attribute(&self, element: &DomElement, name: &str) -> Result<Option<String>> {
        Ok(self.resolve(element)?.attributes.get(name).cloned())
    }

    async fn click(&self, element: &DomElement) -> Result<()> {
        let target = self.resolve(element)?;
        self.state
            .lock()
            .unwrap()
            .clicks
            .push(element.locator.to_string());

        if let Some(href) = target.attributes.get("href") {
            let base = self.current_html().map(|(url, _)| url).unwrap_or_default();
            let next = Url::parse(&base)
                .and_then(|b| b.join(href))
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.clone());
            self.load(&next)?;
        }
        Ok(())
    }

    async fn wait_until_clickable(
        &self,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<Option<DomElement>> {
        self.find_element(locator).await
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().current.clone())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
