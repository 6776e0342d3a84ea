//! Per-country metadata (population, capital, region)

use crate::config::LookupConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Metadata for one country; every field is absent when the country is unknown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryInfo {
    pub population: Option<i64>,
    pub capital: Option<String>,
    pub region: Option<String>,
}

/// Country metadata service
#[async_trait]
pub trait CountryInfoLookup: Send + Sync {
    async fn lookup(&self, country: &str) -> Result<CountryInfo>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Capital {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct CountryEntry {
    population: Option<i64>,
    capital: Option<Capital>,
    region: Option<String>,
}

/// Interpret a country-metadata response body.
///
/// Only a non-empty list whose first entry is a country object counts as a
/// hit. A bare object (the service's error shape) or anything else yields
/// empty metadata.
pub fn parse_country_info(body: &Value) -> CountryInfo {
    let Value::Array(entries) = body else {
        return CountryInfo::default();
    };
    let Some(first) = entries.first() else {
        return CountryInfo::default();
    };

    match CountryEntry::deserialize(first) {
        Ok(entry) => CountryInfo {
            population: entry.population,
            capital: entry.capital.and_then(|c| match c {
                Capital::One(name) => Some(name),
                Capital::Many(names) => names.into_iter().next(),
            }),
            region: entry.region.filter(|r| !r.is_empty()),
        },
        Err(e) => {
            debug!("Unexpected country entry shape: {}", e);
            CountryInfo::default()
        }
    }
}

/// HTTP client for a REST Countries style service
pub struct RestCountriesClient {
    client: Client,
    base_url: Url,
}

impl RestCountriesClient {
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Lookup(format!("Failed to create HTTP client: {}", e)))?;

        let mut base = config.country_info_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
        })
    }
}

#[async_trait]
impl CountryInfoLookup for RestCountriesClient {
    async fn lookup(&self, country: &str) -> Result<CountryInfo> {
        let mut url = self.base_url.join(country)?;
        url.query_pairs_mut().append_pair("fullText", "true");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Country info for '{}' is not JSON (HTTP {}): {}", country, status, e);
                return Ok(CountryInfo::default());
            }
        };

        let info = parse_country_info(&body);
        if info == CountryInfo::default() {
            debug!("Country '{}' not found (HTTP {})", country, status);
        }
        Ok(info)
    }
}
