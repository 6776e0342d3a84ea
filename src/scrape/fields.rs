//! Field extraction from a loaded posting page
//!
//! Every field fails independently. The posting id and title are retried by
//! reloading the page a bounded number of times; everything else gets one
//! lookup and is left empty when missing.

use super::{dismiss_overlay, DelayRange};
use crate::browser::{Browser, DomElement, Locator};
use crate::config::{ExtractConfig, Selectors};
use tracing::{debug, warn};

/// Fields read from the main tab of a posting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MainTab {
    pub job_id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Label/value pairs from the company tab
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyInfo {
    pub headquarters: Option<String>,
    pub size: Option<String>,
    pub company_type: Option<String>,
    pub revenue: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub founded: Option<String>,
    pub competitors: Option<String>,
}

impl CompanyInfo {
    /// Build from label/value pairs; unknown labels are ignored
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut info = Self::default();
        for (label, value) in pairs {
            let value = non_empty(value);
            match label.trim() {
                "Headquarters" => info.headquarters = value,
                "Size" => info.size = value,
                "Type" => info.company_type = value,
                "Revenue" => info.revenue = value,
                "Industry" => info.industry = value,
                "Sector" => info.sector = value,
                "Founded" => info.founded = value,
                "Competitors" => info.competitors = value,
                other => debug!("Ignoring company field '{}'", other),
            }
        }
        info
    }
}

/// Everything extracted from one posting page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingFields {
    pub main: MainTab,
    pub company_info: CompanyInfo,
    pub rating: Option<f64>,
}

/// Reads posting fields from the page loaded in a browser
pub struct FieldExtractor<'a> {
    browser: &'a dyn Browser,
    selectors: Selectors,
    reload_trials: u32,
    page_delay: DelayRange,
    retry_delay: DelayRange,
    tab_delay: DelayRange,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(browser: &'a dyn Browser, config: &ExtractConfig) -> Self {
        Self {
            browser,
            selectors: config.selectors.clone(),
            reload_trials: config.reload_trials,
            page_delay: config.page_delay,
            retry_delay: config.retry_delay,
            tab_delay: config.tab_delay,
        }
    }

    /// Load a posting page and close any overlay on it.
    ///
    /// Returns `false` when the page did not load. The browser then still
    /// shows the previous page, so the posting must not be extracted.
    pub async fn open(&self, url: &str) -> bool {
        if let Err(e) = self.browser.navigate(url).await {
            warn!("Posting page {} failed to load: {}", url, e);
            return false;
        }
        self.page_delay.pause().await;
        dismiss_overlay(self.browser, &self.selectors.overlay_close).await;
        true
    }

    /// Extract all fields of the posting at `url`, which must already be open
    pub async fn extract(&self, url: &str) -> PostingFields {
        let main = self.main_tab(url).await;
        let company_info = self.company_tab().await;
        let rating = self.rating().await;
        PostingFields {
            main,
            company_info,
            rating,
        }
    }

    /// Id, title, company, location and description
    pub async fn main_tab(&self, url: &str) -> MainTab {
        let job_id = self
            .with_reload(url, "ID", &self.selectors.job_id, |el| async move {
                let id_attr = self.browser.attribute(&el, "id").await.ok().flatten()?;
                parse_job_id(&id_attr)
            })
            .await;

        let title = self
            .with_reload(url, "Title", &self.selectors.title, |el| async move {
                non_empty(el.text)
            })
            .await;

        let company = self
            .best_effort("Company", &self.selectors.company)
            .await
            .and_then(|text| text.split_whitespace().next().map(str::to_string));

        let location = self.best_effort("Location", &self.selectors.location).await;

        let description = self
            .best_effort("Description", &self.selectors.description)
            .await
            .map(|text| text.replace(['\r', '\n'], " "));

        debug!("Main tab fetched");
        MainTab {
            job_id,
            title,
            company,
            location,
            description,
        }
    }

    /// Switch to the company tab and read its label/value pairs
    pub async fn company_tab(&self) -> CompanyInfo {
        if !self.switch_tab(&self.selectors.company_tab).await {
            debug!("No company tab, company details left empty");
            return CompanyInfo::default();
        }

        let labels = self.texts(&self.selectors.info_label).await;
        let values = self.texts(&self.selectors.info_value).await;
        if labels.len() != values.len() {
            debug!(
                "Partial data collected from company tab ({} labels, {} values)",
                labels.len(),
                values.len()
            );
        }

        debug!("Company tab fetched");
        CompanyInfo::from_pairs(labels.into_iter().zip(values))
    }

    /// Switch to the rating tab and read the company rating
    pub async fn rating(&self) -> Option<f64> {
        if !self.switch_tab(&self.selectors.rating_tab).await {
            warn!("Rating was not found on page, and not collected");
            return None;
        }

        let rating = self
            .best_effort("Rating", &self.selectors.rating)
            .await
            .and_then(|text| text.trim().parse::<f64>().ok());
        debug!("Rating tab fetched");
        rating
    }

    /// Look a field up, reloading the page between failed attempts.
    /// Makes at most `reload_trials` attempts and as many reloads.
    async fn with_reload<F, Fut>(
        &self,
        url: &str,
        name: &str,
        locator: &Locator,
        read: F,
    ) -> Option<String>
    where
        F: Fn(DomElement) -> Fut,
        Fut: std::future::Future<Output = Option<String>>,
    {
        for trial in 0..self.reload_trials {
            if let Ok(Some(element)) = self.browser.find_element(locator).await {
                if let Some(value) = read(element).await {
                    return Some(value);
                }
            }

            warn!("{} not collected on {} trial", name, trial);
            self.retry_delay.pause().await;
            if let Err(e) = self.browser.navigate(url).await {
                warn!("Reload of {} failed: {}", url, e);
            }
            self.page_delay.pause().await;
        }
        None
    }

    async fn best_effort(&self, name: &str, locator: &Locator) -> Option<String> {
        match self.browser.find_element(locator).await {
            Ok(Some(element)) => non_empty(element.text),
            Ok(None) => {
                warn!("{} was not collected", name);
                None
            }
            Err(e) => {
                warn!("{} was not collected: {}", name, e);
                None
            }
        }
    }

    async fn texts(&self, locator: &Locator) -> Vec<String> {
        self.browser
            .find_elements(locator)
            .await
            .map(|els| els.into_iter().map(|el| el.text).collect())
            .unwrap_or_default()
    }

    async fn switch_tab(&self, tab: &Locator) -> bool {
        let Ok(Some(element)) = self.browser.find_element(tab).await else {
            return false;
        };
        if let Err(e) = self.browser.click(&element).await {
            debug!("Tab {} not clickable: {}", tab, e);
            return false;
        }
        self.tab_delay.pause().await;
        true
    }
}

/// Posting ids are carried in the job view node's id, e.g. `JobView_3571`
fn parse_job_id(id_attr: &str) -> Option<String> {
    id_attr
        .split('_')
        .nth(1)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
