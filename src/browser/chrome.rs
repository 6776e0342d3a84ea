//! Headless Chrome session for scraping
//!
//! Uses Chrome DevTools Protocol via chromiumoxide. One browser, one page:
//! every navigation reuses the same tab so cookies and dismissed overlays
//! carry over between postings.

use super::{Browser, DomElement, Locator};
use crate::config::BrowserConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

#[cfg(feature = "chrome")]
mod browser_impl {
    use super::*;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::element::Element;
    use chromiumoxide::Page;
    use futures::StreamExt;
    use tokio::sync::Mutex;
    use tokio::time::{timeout, Instant};
    use tracing::{debug, info, warn};

    const CLICKABLE_POLL: Duration = Duration::from_millis(250);

    /// Chrome-backed browser session
    pub struct ChromeBrowser {
        browser: Mutex<Option<CdpBrowser>>,
        handler_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
        page: Page,
        page_load_timeout: Duration,
    }

    impl ChromeBrowser {
        /// Launch Chrome and open the working tab
        pub async fn launch(config: &BrowserConfig) -> Result<Self> {
            info!("Launching Chrome browser...");

            let mut builder = CdpConfig::builder();

            // chromiumoxide defaults to headless; with_head() adds UI
            if !config.headless {
                builder = builder.with_head();
            }

            if config.no_sandbox {
                builder = builder.no_sandbox();
            }

            if config.incognito {
                builder = builder.arg("--incognito");
            }

            if let Some(executable) = &config.executable {
                builder = builder.chrome_executable(executable);
            }

            builder = builder
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .arg("--no-first-run")
                .arg("--disable-extensions");

            let browser_config = builder
                .build()
                .map_err(|e| Error::Browser(format!("Failed to build browser config: {}", e)))?;

            let (browser, mut handler) = CdpBrowser::launch(browser_config)
                .await
                .map_err(|e| Error::Browser(format!("Failed to launch browser: {}", e)))?;

            let handle = tokio::spawn(async move {
                while let Some(result) = handler.next().await {
                    if result.is_err() {
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| Error::Browser(format!("Failed to create page: {}", e)))?;

            info!("Chrome browser launched");

            Ok(Self {
                browser: Mutex::new(Some(browser)),
                handler_handle: Mutex::new(Some(handle)),
                page,
                page_load_timeout: Duration::from_millis(config.page_load_timeout_ms),
            })
        }

        /// All CSS matches paired with their visible text
        async fn css_matches(&self, css: &str) -> Vec<(Element, String)> {
            let elements = match self.page.find_elements(css).await {
                Ok(elements) => elements,
                Err(e) => {
                    debug!("No elements for {}: {}", css, e);
                    return Vec::new();
                }
            };

            let mut matches = Vec::with_capacity(elements.len());
            for element in elements {
                let text = element.inner_text().await.ok().flatten().unwrap_or_default();
                matches.push((element, text));
            }
            matches
        }

        /// Re-resolve a previously captured element
        async fn resolve(&self, element: &DomElement) -> Result<Element> {
            self.css_matches(&element.locator.css)
                .await
                .into_iter()
                .nth(element.index)
                .map(|(el, _)| el)
                .ok_or_else(|| {
                    Error::Browser(format!(
                        "Element {} #{} is no longer on the page",
                        element.locator, element.index
                    ))
                })
        }
    }

    #[async_trait]
    impl Browser for ChromeBrowser {
        async fn navigate(&self, url: &str) -> Result<()> {
            debug!("Navigating to {}", url);
            timeout(self.page_load_timeout, self.page.goto(url))
                .await
                .map_err(|_| Error::Browser(format!("Page load timeout: {}", url)))?
                .map_err(|e| Error::Browser(format!("Navigation failed: {}", e)))?;
            Ok(())
        }

        async fn find_elements(&self, locator: &Locator) -> Result<Vec<DomElement>> {
            Ok(self
                .css_matches(&locator.css)
                .await
                .into_iter()
                .enumerate()
                .filter(|(_, (_, text))| locator.matches_text(text))
                .map(|(index, (_, text))| DomElement {
                    locator: locator.clone(),
                    index,
                    text: text.trim().to_string(),
                })
                .collect())
        }

        async fn attribute(&self, element: &DomElement, name: &str) -> Result<Option<String>> {
            let el = self.resolve(element).await?;
            el.attribute(name)
                .await
                .map_err(|e| Error::Browser(format!("Failed to read attribute {}: {}", name, e)))
        }

        async fn click(&self, element: &DomElement) -> Result<()> {
            let el = self.resolve(element).await?;
            el.click()
                .await
                .map_err(|e| Error::Browser(format!("Click on {} failed: {}", element.locator, e)))?;
            Ok(())
        }

        async fn wait_until_clickable(
            &self,
            locator: &Locator,
            timeout: Duration,
        ) -> Result<Option<DomElement>> {
            let deadline = Instant::now() + timeout;
            loop {
                let matches = self.css_matches(&locator.css).await;
                for (index, (el, text)) in matches.into_iter().enumerate() {
                    if locator.matches_text(&text) && el.clickable_point().await.is_ok() {
                        return Ok(Some(DomElement {
                            locator: locator.clone(),
                            index,
                            text: text.trim().to_string(),
                        }));
                    }
                }

                if Instant::now() >= deadline {
                    debug!("{} not clickable within {:?}", locator, timeout);
                    return Ok(None);
                }
                tokio::time::sleep(CLICKABLE_POLL).await;
            }
        }

        async fn current_url(&self) -> Result<Option<String>> {
            self.page
                .url()
                .await
                .map_err(|e| Error::Browser(format!("Failed to get URL: {}", e)))
        }

        async fn close(&self) -> Result<()> {
            let mut browser_guard = self.browser.lock().await;
            if let Some(mut browser) = browser_guard.take() {
                if let Err(e) = browser.close().await {
                    warn!("Failed to close browser cleanly: {}", e);
                }
            }

            if let Some(handle) = self.handler_handle.lock().await.take() {
                handle.abort();
            }

            Ok(())
        }
    }
}

#[cfg(feature = "chrome")]
pub use browser_impl::ChromeBrowser;

/// Stub browser when the chrome feature is disabled
#[cfg(not(feature = "chrome"))]
pub struct ChromeBrowser {
    _private: (),
}

#[cfg(not(feature = "chrome"))]
impl ChromeBrowser {
    pub async fn launch(_config: &BrowserConfig) -> Result<Self> {
        Err(Error::Browser(
            "Chrome support not available. Compile with --features chrome to enable it."
                .to_string(),
        ))
    }
}

#[cfg(not(feature = "chrome"))]
#[async_trait]
impl Browser for ChromeBrowser {
    async fn navigate(&self, url: &str) -> Result<()> {
        Err(Error::Browser(format!("Chrome support not available for {}", url)))
    }

    async fn find_elements(&self, _locator: &Locator) -> Result<Vec<DomElement>> {
        Ok(Vec::new())
    }

    async fn attribute(&self, _element: &DomElement, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn click(&self, element: &DomElement) -> Result<()> {
        Err(Error::Browser(format!("Chrome support not available to click {}", element.locator)))
    }

    async fn wait_until_clickable(
        &self,
        _locator: &Locator,
        _timeout: Duration,
    ) -> Result<Option<DomElement>> {
        Ok(None)
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
