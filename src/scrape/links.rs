//! Link collection across paginated search results

use super::{dismiss_overlay, DelayRange};
use crate::browser::{Browser, Locator};
use crate::config::{BrowserConfig, ExtractConfig};
use crate::error::Result;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Walks search result pages and accumulates posting URLs
pub struct LinkCollector<'a> {
    browser: &'a dyn Browser,
    job_link: Locator,
    next_page: Locator,
    overlay_close: Locator,
    page_delay: DelayRange,
    next_page_timeout: Duration,
}

impl<'a> LinkCollector<'a> {
    pub fn new(
        browser: &'a dyn Browser,
        extract: &ExtractConfig,
        browser_config: &BrowserConfig,
    ) -> Self {
        Self {
            browser,
            job_link: extract.selectors.job_link.clone(),
            next_page: extract.selectors.next_page.clone(),
            overlay_close: extract.selectors.overlay_close.clone(),
            page_delay: extract.page_delay,
            next_page_timeout: Duration::from_millis(browser_config.next_page_timeout_ms),
        }
    }

    /// Collect posting links from every search, visiting at most `max_pages`
    /// result pages per search. Order follows the searches, then the pages,
    /// then the document order of links on each page.
    pub async fn collect(&self, search_urls: &[String], max_pages: u32) -> Result<Vec<String>> {
        let mut links = Vec::new();

        for search_url in search_urls {
            if let Err(e) = self.browser.navigate(search_url).await {
                warn!("Search page {} could not be loaded, skipping: {}", search_url, e);
                continue;
            }
            self.page_delay.pause().await;
            dismiss_overlay(self.browser, &self.overlay_close).await;

            let mut page = 0u32;
            loop {
                let found = self.page_links(search_url).await?;
                debug!("{} links on page {} of {}", found.len(), page + 1, search_url);
                links.extend(found);

                page += 1;
                info!("Page {} of {} is done", page, search_url);
                if page >= max_pages {
                    break;
                }

                if !self.advance().await? {
                    warn!("Next page couldn't be clicked, last page assumed");
                    break;
                }
                self.page_delay.pause().await;
                dismiss_overlay(self.browser, &self.overlay_close).await;
            }
        }

        info!("Total of {} links were gathered", links.len());
        Ok(links)
    }

    /// Posting links on the currently loaded results page
    async fn page_links(&self, search_url: &str) -> Result<Vec<String>> {
        let base = self
            .browser
            .current_url()
            .await?
            .and_then(|u| Url::parse(&u).ok())
            .or_else(|| Url::parse(search_url).ok());

        let mut links = Vec::new();
        for element in self.browser.find_elements(&self.job_link).await? {
            match self.browser.attribute(&element, "href").await {
                Ok(Some(href)) => links.push(absolutize(base.as_ref(), &href)),
                Ok(None) => debug!("Job link #{} has no href", element.index),
                Err(e) => debug!("Job link #{} vanished: {}", element.index, e),
            }
        }
        Ok(links)
    }

    /// Activate the next-page control. `false` means there is no further page.
    async fn advance(&self) -> Result<bool> {
        let Some(next) = self
            .browser
            .wait_until_clickable(&self.next_page, self.next_page_timeout)
            .await?
        else {
            return Ok(false);
        };

        match self.browser.click(&next).await {
            Ok(()) => Ok(true),
            Err(e) => {
                debug!("Next page click failed: {}", e);
                Ok(false)
            }
        }
    }
}

fn absolutize(base: Option<&Url>, href: &str) -> String {
    base.and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fixture::FixtureBrowser;
    use crate::config::Config;

    const SEARCH: &str = "https://jobs.example.com/search/data";
    const PAGE_2: &str = "https://jobs.example.com/search/data/2";
    const PAGE_3: &str = "https://jobs.example.com/search/data/3";

    fn results_page(ids: &[u32], next: Option<&str>) -> String {
        let mut html = String::from("<html><body>");
        for id in ids {
            html.push_str(&format!(
                "<div class=\"jobHeader\"><a href=\"/job/{id}\">Job {id}</a></div>"
            ));
        }
        if let Some(next) = next {
            html.push_str(&format!("<ul><li class=\"next\"><a href=\"{next}\">Next</a></li></ul>"));
        }
        html.push_str("</body></html>");
        html
    }

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.extract.page_delay = DelayRange::none();
        config
    }

    #[tokio::test]
    async fn test_collects_until_last_page() {
        let browser = FixtureBrowser::new()
            .page(SEARCH, &results_page(&[1, 2], Some(PAGE_2)))
            .page(PAGE_2, &results_page(&[3], Some(PAGE_3)))
            .page(PAGE_3, &results_page(&[4], None));
        let config = quiet_config();
        let collector = LinkCollector::new(&browser, &config.extract, &config.browser);

        let links = collector.collect(&[SEARCH.to_string()], 30).await.unwrap();

        assert_eq!(
            links,
            vec![
                "https://jobs.example.com/job/1",
                "https://jobs.example.com/job/2",
                "https://jobs.example.com/job/3",
                "https://jobs.example.com/job/4",
            ]
        );
        assert_eq!(browser.navigations(), vec![SEARCH, PAGE_2, PAGE_3]);
    }

    #[tokio::test]
    async fn test_page_limit_stops_pagination() {
        let browser = FixtureBrowser::new()
            .page(SEARCH, &results_page(&[1], Some(PAGE_2)))
            .page(PAGE_2, &results_page(&[2], Some(PAGE_3)))
            .page(PAGE_3, &results_page(&[3], None));
        let config = quiet_config();
        let collector = LinkCollector::new(&browser, &config.extract, &config.browser);

        let links = collector.collect(&[SEARCH.to_string()], 2).await.unwrap();

        assert_eq!(links.len(), 2);
        assert_eq!(browser.loads_of(PAGE_3), 0);
    }

    #[tokio::test]
    async fn test_unloadable_search_is_skipped() {
        let other = "https://jobs.example.com/search/uk";
        let browser = FixtureBrowser::new().page(other, &results_page(&[7], None));
        let config = quiet_config();
        let collector = LinkCollector::new(&browser, &config.extract, &config.browser);

        let links = collector
            .collect(&[SEARCH.to_string(), other.to_string()], 5)
            .await
            .unwrap();

        assert_eq!(links, vec!["https://jobs.example.com/job/7"]);
    }

    #[tokio::test]
    async fn test_overlay_is_dismissed() {
        let html = "<html><body><button id=\"prefix__icon-close-1\">x</button>\
                    <div class=\"jobHeader\"><a href=\"/job/9\">Job</a></div></body></html>";
        let browser = FixtureBrowser::new().page(SEARCH, html);
        let config = quiet_config();
        let collector = LinkCollector::new(&browser, &config.extract, &config.browser);

        collector.collect(&[SEARCH.to_string()], 1).await.unwrap();

        assert_eq!(browser.clicks(), vec!["#prefix__icon-close-1"]);
    }
}
