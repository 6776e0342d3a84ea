//! Configuration management for jobtrawl
//!
//! Handles loading and validating configuration from TOML files.
//! A single `Config` value is built at startup and each pipeline component
//! receives the section it needs at construction time.

mod defaults;

pub use defaults::*;

use crate::browser::Locator;
use crate::error::{Error, Result};
use crate::scrape::DelayRange;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "JOBTRAWL_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Predefined search targets and pagination limit
    #[serde(default)]
    pub search: SearchConfig,

    /// Browser session settings
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Field extraction settings
    #[serde(default)]
    pub extract: ExtractConfig,

    /// External lookup services
    #[serde(default)]
    pub lookup: LookupConfig,

    /// Relational storage settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Snapshot and log output
    #[serde(default)]
    pub output: OutputConfig,
}

/// Search result pages to collect postings from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_israel")]
    pub israel: String,

    #[serde(default = "default_search_data_scientists_us")]
    pub data_scientists_us: String,

    #[serde(default = "default_search_uk")]
    pub uk: String,

    /// Upper bound for result pages visited per search
    #[serde(default = "default_max_search_pages")]
    pub max_pages: u32,
}

/// Which predefined searches a run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchTarget {
    Israel,
    DataScientistsUs,
    Uk,
    #[default]
    All,
}

impl SearchConfig {
    /// Resolve the search URLs for a target, in a stable order
    pub fn urls(&self, target: SearchTarget) -> Vec<String> {
        match target {
            SearchTarget::Israel => vec![self.israel.clone()],
            SearchTarget::DataScientistsUs => vec![self.data_scientists_us.clone()],
            SearchTarget::Uk => vec![self.uk.clone()],
            SearchTarget::All => vec![
                self.israel.clone(),
                self.data_scientists_us.clone(),
                self.uk.clone(),
            ],
        }
    }
}

/// Browser session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Disable browser sandbox (required in some Docker/CI environments)
    #[serde(default)]
    pub no_sandbox: bool,

    #[serde(default = "default_incognito")]
    pub incognito: bool,

    /// Explicit Chrome/Chromium executable; autodetected when unset
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Time to wait for page load (milliseconds)
    #[serde(default = "default_page_load_timeout")]
    pub page_load_timeout_ms: u64,

    /// Time to wait for the next-page control to become clickable (milliseconds)
    #[serde(default = "default_next_page_timeout")]
    pub next_page_timeout_ms: u64,
}

/// Field extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Attempts for retry-eligible fields (posting id, title)
    #[serde(default = "default_reload_trials")]
    pub reload_trials: u32,

    #[serde(default = "default_page_delay")]
    pub page_delay: DelayRange,

    #[serde(default = "default_retry_delay")]
    pub retry_delay: DelayRange,

    #[serde(default = "default_tab_delay")]
    pub tab_delay: DelayRange,

    #[serde(default)]
    pub selectors: Selectors,
}

/// Element locators used on search and posting pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selectors {
    #[serde(default = "default_job_link_selector")]
    pub job_link: Locator,
    #[serde(default = "default_next_page_selector")]
    pub next_page: Locator,
    #[serde(default = "default_overlay_close_selector")]
    pub overlay_close: Locator,
    #[serde(default = "default_job_id_selector")]
    pub job_id: Locator,
    #[serde(default = "default_title_selector")]
    pub title: Locator,
    #[serde(default = "default_company_selector")]
    pub company: Locator,
    #[serde(default = "default_location_selector")]
    pub location: Locator,
    #[serde(default = "default_description_selector")]
    pub description: Locator,
    #[serde(default = "default_company_tab_selector")]
    pub company_tab: Locator,
    #[serde(default = "default_info_label_selector")]
    pub info_label: Locator,
    #[serde(default = "default_info_value_selector")]
    pub info_value: Locator,
    #[serde(default = "default_rating_tab_selector")]
    pub rating_tab: Locator,
    #[serde(default = "default_rating_selector")]
    pub rating: Locator,
}

/// External lookup service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Location-to-country endpoint
    #[serde(default = "default_country_lookup_url")]
    pub country_lookup_url: String,

    /// Host header expected by the location-to-country endpoint
    #[serde(default = "default_country_lookup_host")]
    pub country_lookup_host: String,

    /// Environment variable name for the location-to-country API key
    #[serde(default = "default_country_lookup_key_env")]
    pub country_lookup_key_env: String,

    /// Country-metadata endpoint; the country name is appended
    #[serde(default = "default_country_info_url")]
    pub country_info_url: String,

    /// Geocoding endpoint
    #[serde(default = "default_geocoder_url")]
    pub geocoder_url: String,

    #[serde(default = "default_lookup_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,
}

/// Relational storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database
    #[serde(default = "default_database_file")]
    pub file: PathBuf,

    /// Rows written between commits
    #[serde(default = "default_commit_interval")]
    pub commit_interval: usize,

    /// Skill vocabulary, one term per line; seeds an empty skills table
    #[serde(default)]
    pub vocabulary_file: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for snapshots and run logs
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Jobs snapshot to resume from instead of scraping
    #[serde(default)]
    pub resume_from: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            israel: default_search_israel(),
            data_scientists_us: default_search_data_scientists_us(),
            uk: default_search_uk(),
            max_pages: default_max_search_pages(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            no_sandbox: false,
            incognito: default_incognito(),
            executable: None,
            page_load_timeout_ms: default_page_load_timeout(),
            next_page_timeout_ms: default_next_page_timeout(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            reload_trials: default_reload_trials(),
            page_delay: default_page_delay(),
            retry_delay: default_retry_delay(),
            tab_delay: default_tab_delay(),
            selectors: Selectors::default(),
        }
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            job_link: default_job_link_selector(),
            next_page: default_next_page_selector(),
            overlay_close: default_overlay_close_selector(),
            job_id: default_job_id_selector(),
            title: default_title_selector(),
            company: default_company_selector(),
            location: default_location_selector(),
            description: default_description_selector(),
            company_tab: default_company_tab_selector(),
            info_label: default_info_label_selector(),
            info_value: default_info_value_selector(),
            rating_tab: default_rating_tab_selector(),
            rating: default_rating_selector(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            country_lookup_url: default_country_lookup_url(),
            country_lookup_host: default_country_lookup_host(),
            country_lookup_key_env: default_country_lookup_key_env(),
            country_info_url: default_country_info_url(),
            geocoder_url: default_geocoder_url(),
            user_agent: default_lookup_user_agent(),
            timeout_secs: default_lookup_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file: default_database_file(),
            commit_interval: default_commit_interval(),
            vocabulary_file: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            resume_from: None,
        }
    }
}

impl LookupConfig {
    /// Get the location-to-country API key from environment
    pub fn country_lookup_key(&self) -> Option<String> {
        std::env::var(&self.country_lookup_key_env).ok()
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_base_dir().join("config.toml"))
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location, falling back to defaults
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_config_path();
        if path.exists() {
            return Self::load(&path);
        }

        debug!("No config file at {:?}, using defaults", path);
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("search.israel", &self.search.israel),
            ("search.data_scientists_us", &self.search.data_scientists_us),
            ("search.uk", &self.search.uk),
        ] {
            url::Url::parse(url)
                .map_err(|e| Error::Config(format!("{} is not a valid URL: {}", name, e)))?;
        }

        if self.search.max_pages == 0 {
            return Err(Error::Config("search.max_pages must be positive".to_string()));
        }

        if self.extract.reload_trials == 0 {
            return Err(Error::Config(
                "extract.reload_trials must be positive".to_string(),
            ));
        }

        for (name, range) in [
            ("extract.page_delay", &self.extract.page_delay),
            ("extract.retry_delay", &self.extract.retry_delay),
            ("extract.tab_delay", &self.extract.tab_delay),
        ] {
            if range.min_ms > range.max_ms {
                return Err(Error::Config(format!("{}.min_ms must be <= max_ms", name)));
            }
        }

        if self.browser.page_load_timeout_ms == 0 || self.browser.next_page_timeout_ms == 0 {
            return Err(Error::Config("browser timeouts must be positive".to_string()));
        }

        if self.lookup.timeout_secs == 0 {
            return Err(Error::Config("lookup.timeout_secs must be positive".to_string()));
        }

        if self.database.commit_interval == 0 {
            return Err(Error::Config(
                "database.commit_interval must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.max_pages, 30);
        assert_eq!(config.extract.reload_trials, 3);
        assert_eq!(config.database.commit_interval, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_search_target_urls() {
        let search = SearchConfig::default();
        assert_eq!(search.urls(SearchTarget::All).len(), 3);
        assert_eq!(search.urls(SearchTarget::Uk), vec![search.uk.clone()]);
        assert_eq!(search.urls(SearchTarget::All)[1], search.data_scientists_us);
    }

    #[test]
    fn test_load_selector_override() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        let mut config = Config::default();
        config.extract.selectors.title = Locator::css("h1.job-title");
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.extract.selectors.title.css, "h1.job-title");
        assert_eq!(loaded.extract.selectors.title.text, None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(Config::load(&tmp.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[database]\ncommit_interval = 10\n").unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.database.commit_interval, 10);
        assert_eq!(loaded.extract.reload_trials, 3);
        assert_eq!(loaded.extract.selectors.company_tab.text.as_deref(), Some("Company"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.extract.reload_trials = 0;
        assert!(config.validate().is_err());

        config.extract.reload_trials = 3;
        config.extract.retry_delay = DelayRange::new(500, 100);
        assert!(config.validate().is_err());

        config.extract.retry_delay = DelayRange::new(0, 0);
        assert!(config.validate().is_ok());

        config.search.uk = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
