//! Geocoding of free-text locations

use crate::config::LookupConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

/// Geocoding service
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Coordinates of the best match, `None` when nothing matches.
    /// `Err` means the service itself could not be reached.
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>>;
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Nominatim search API client
pub struct NominatimGeocoder {
    client: Client,
    url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Lookup(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.geocoder_url.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Lookup(format!(
                "Geocoder returned HTTP {} for '{}'",
                response.status(),
                query
            )));
        }

        let body = response.text().await?;
        let places: Vec<Place> = match serde_json::from_str(&body) {
            Ok(places) => places,
            Err(e) => {
                debug!("Unexpected geocoder body for '{}': {}", query, e);
                return Ok(None);
            }
        };

        Ok(places.first().and_then(|place| {
            Some(Coordinates {
                longitude: place.lon.trim().parse().ok()?,
                latitude: place.lat.trim().parse().ok()?,
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_nominatim_geocoder() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Austin, TX"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"place_id":1,"lat":"30.2711286","lon":"-97.7436995","display_name":"Austin"}]"#,
            ))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Atlantis"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Overload"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let config = LookupConfig {
            geocoder_url: format!("{}/search", mock_server.uri()),
            ..LookupConfig::default()
        };
        let geocoder = NominatimGeocoder::new(&config).unwrap();

        let austin = geocoder.geocode("Austin, TX").await.unwrap().unwrap();
        assert!((austin.longitude + 97.7436995).abs() < 1e-9);
        assert!((austin.latitude - 30.2711286).abs() < 1e-9);

        assert_eq!(geocoder.geocode("Atlantis").await.unwrap(), None);
        assert!(geocoder.geocode("Overload").await.is_err());
    }
}
