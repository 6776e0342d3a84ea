//! Location-to-country resolution
//!
//! Free-text locations ("Austin, TX", "Tel Aviv-Yafo, Israel", "Leeds") are
//! sent to a place search service whose matches carry a two-letter country
//! code and a display name ending in the country.

use crate::config::LookupConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Country code the service uses for the United States
pub const US_CODE: &str = "US";

/// Country name stored for United States matches
pub const USA: &str = "USA";

/// One place returned by the location-to-country service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaceMatch {
    #[serde(rename = "c")]
    pub country_code: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Results")]
    results: Vec<PlaceMatch>,
}

/// Place search used to resolve countries
#[async_trait]
pub trait CountryLookup: Send + Sync {
    /// Matches for a free-text location, best first; empty when nothing matches
    async fn search(&self, query: &str) -> Result<Vec<PlaceMatch>>;
}

/// HTTP client for the latitude/longitude place search API
pub struct PlaceSearchClient {
    client: Client,
    url: String,
    host: String,
    api_key: Option<String>,
}

impl PlaceSearchClient {
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Lookup(format!("Failed to create HTTP client: {}", e)))?;

        let api_key = config.country_lookup_key();
        if api_key.is_none() {
            warn!(
                "{} is not set; country lookups will likely be rejected",
                config.country_lookup_key_env
            );
        }

        Ok(Self {
            client,
            url: config.country_lookup_url.clone(),
            host: config.country_lookup_host.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl CountryLookup for PlaceSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<PlaceMatch>> {
        let mut request = self
            .client
            .get(&self.url)
            .query(&[("location", query)])
            .header("x-rapidapi-host", &self.host);
        if let Some(key) = &self.api_key {
            request = request.header("x-rapidapi-key", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::Lookup(format!(
                "Place search returned HTTP {} for '{}'",
                response.status(),
                query
            )));
        }

        let body = response.text().await?;
        match serde_json::from_str::<SearchResponse>(&body) {
            Ok(parsed) => Ok(parsed.results),
            Err(e) => {
                debug!("Unexpected place search body for '{}': {}", query, e);
                Ok(Vec::new())
            }
        }
    }
}

/// Resolve the country of a free-text location.
///
/// The first match decides: a US match becomes `USA`, anything else the last
/// comma-separated part of the match name. Without matches the query is
/// repeated with its last two characters dropped, and failing that the text
/// after the last comma of the location is taken as the country name.
pub async fn resolve_country(lookup: &dyn CountryLookup, location: &str) -> Option<String> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }

    if let Some(top) = search_or_empty(lookup, location).await.first() {
        return country_of(top);
    }

    if location.chars().count() <= 2 {
        return None;
    }

    let truncated: String = {
        let keep = location.chars().count() - 2;
        location.chars().take(keep).collect()
    };
    if let Some(top) = search_or_empty(lookup, &truncated).await.first() {
        return country_of(top);
    }

    let heuristic = last_comma_part(location);
    debug!("Country of '{}' guessed as {:?}", location, heuristic);
    heuristic
}

async fn search_or_empty(lookup: &dyn CountryLookup, query: &str) -> Vec<PlaceMatch> {
    match lookup.search(query).await {
        Ok(matches) => matches,
        Err(e) => {
            warn!("Country lookup for '{}' failed: {}", query, e);
            Vec::new()
        }
    }
}

fn country_of(place: &PlaceMatch) -> Option<String> {
    if place.country_code == US_CODE {
        return Some(USA.to_string());
    }
    place
        .name
        .rsplit(',')
        .next()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

fn last_comma_part(location: &str) -> Option<String> {
    let (_, tail) = location.rsplit_once(',')?;
    let tail = tail.trim();
    (!tail.is_empty()).then(|| tail.to_string())
}
