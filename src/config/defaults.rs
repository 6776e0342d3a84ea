//! Default values for configuration

use crate::browser::Locator;
use crate::scrape::DelayRange;
use std::path::PathBuf;

/// Base directory for jobtrawl data (~/.jobtrawl)
pub fn default_base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".jobtrawl")
}

/// Jobs in Israel posted in the last day
pub fn default_search_israel() -> String {
    "https://www.glassdoor.com/Job/israel-jobs-SRCH_IL.0,6_IN119.htm?fromAge=1&radius=25".to_string()
}

/// Data scientist jobs in the US posted in the last day
pub fn default_search_data_scientists_us() -> String {
    "https://www.glassdoor.com/Job/us-data-scientist-jobs-SRCH_IL.0,2_IN1_KO3,17.htm?fromAge=1&radius=25"
        .to_string()
}

/// Jobs in the UK posted in the last day
pub fn default_search_uk() -> String {
    "https://www.glassdoor.com/Job/uk-jobs-SRCH_IL.0,2_IN2.htm?fromAge=1&radius=25".to_string()
}

/// Default maximum result pages per search
pub fn default_max_search_pages() -> u32 {
    30
}

/// Default: run the browser headless
pub fn default_headless() -> bool {
    true
}

/// Default: open the session incognito
pub fn default_incognito() -> bool {
    true
}

/// Default page load timeout (30 seconds)
pub fn default_page_load_timeout() -> u64 {
    30_000
}

/// Default wait for the next-page control to become clickable (20 seconds)
pub fn default_next_page_timeout() -> u64 {
    20_000
}

/// Default number of reloads for retry-eligible fields
pub fn default_reload_trials() -> u32 {
    3
}

/// Default pause after a page load
pub fn default_page_delay() -> DelayRange {
    DelayRange::new(2_000, 4_000)
}

/// Default pause before reloading a page whose field was missing
pub fn default_retry_delay() -> DelayRange {
    DelayRange::new(6_000, 8_000)
}

/// Default pause after switching tabs on a posting page
pub fn default_tab_delay() -> DelayRange {
    DelayRange::new(2_000, 4_000)
}

pub fn default_job_link_selector() -> Locator {
    Locator::css(".jobHeader a")
}

pub fn default_next_page_selector() -> Locator {
    Locator::css("li.next a")
}

pub fn default_overlay_close_selector() -> Locator {
    Locator::css("#prefix__icon-close-1")
}

pub fn default_job_id_selector() -> Locator {
    Locator::css("#JobView > div.jobViewNodeContainer")
}

pub fn default_title_selector() -> Locator {
    Locator::css(".css-17x2pwl.e11nt52q5")
}

pub fn default_company_selector() -> Locator {
    Locator::css(".css-16nw49e.e11nt52q1")
}

pub fn default_location_selector() -> Locator {
    Locator::css(".css-13et3b1.e11nt52q2")
}

pub fn default_description_selector() -> Locator {
    Locator::css(".desc.css-58vpdc.ecgq1xb3")
}

pub fn default_company_tab_selector() -> Locator {
    Locator::with_text("span.link", "Company")
}

pub fn default_info_label_selector() -> Locator {
    Locator::css("label[for='InfoFields']")
}

pub fn default_info_value_selector() -> Locator {
    Locator::css(".value")
}

pub fn default_rating_tab_selector() -> Locator {
    Locator::with_text("span.link", "Rating")
}

pub fn default_rating_selector() -> Locator {
    Locator::css(".mr-sm.css-16h0h8a.e1dyssh91")
}

/// Default location-to-country endpoint
pub fn default_country_lookup_url() -> String {
    "https://devru-latitude-longitude-find-v1.p.rapidapi.com/latlon.php".to_string()
}

/// Default API host header for the location-to-country endpoint
pub fn default_country_lookup_host() -> String {
    "devru-latitude-longitude-find-v1.p.rapidapi.com".to_string()
}

/// Default environment variable name for the location-to-country API key
pub fn default_country_lookup_key_env() -> String {
    "JOBTRAWL_RAPIDAPI_KEY".to_string()
}

/// Default country-metadata endpoint (country name is appended)
pub fn default_country_info_url() -> String {
    "https://restcountries.com/v3.1/name/".to_string()
}

/// Default geocoding endpoint
pub fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

/// Default user agent for lookup services
pub fn default_lookup_user_agent() -> String {
    format!("jobtrawl/{} (job posting enrichment)", env!("CARGO_PKG_VERSION"))
}

/// Default lookup request timeout in seconds
pub fn default_lookup_timeout() -> u64 {
    20
}

/// Default SQLite database file
pub fn default_database_file() -> PathBuf {
    default_base_dir().join("jobs.db")
}

/// Default rows per commit
pub fn default_commit_interval() -> usize {
    1000
}

/// Default directory for snapshots and run logs
pub fn default_output_dir() -> PathBuf {
    default_base_dir().join("runs")
}
