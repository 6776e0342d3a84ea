//! Enrichment stage
//!
//! Turns assembled [`JobRecord`]s into the normalized rows the store writes:
//! locations with country metadata and coordinates, companies and postings.
//! Every lookup is cached per distinct input, so a run queries each external
//! service at most once per location string or country.

mod country;
mod country_info;
mod geocode;

pub use country::*;
pub use country_info::*;
pub use geocode::*;

#[cfg(test)]
pub(crate) use country::tests::StaticLookup;

use crate::config::LookupConfig;
use crate::error::Result;
use crate::scrape::JobRecord;
use crate::store::{CompanyRow, Dataset, LocationRow, PostingRow};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Stored in place of an absent text value
pub const MISSING_TEXT: &str = "None";

/// Stored in place of an absent integer value
pub const MISSING_NUMBER: i64 = -99;

/// Stored in place of an absent rating
pub const MISSING_RATING: f64 = -99.0;

pub struct Enricher {
    countries: Box<dyn CountryLookup>,
    country_info: Box<dyn CountryInfoLookup>,
    geocoder: Box<dyn Geocoder>,
}

/// Resolved place of one location string
#[derive(Debug, Clone)]
struct Place {
    label: String,
    country: String,
    city: String,
}

impl Enricher {
    pub fn new(
        countries: Box<dyn CountryLookup>,
        country_info: Box<dyn CountryInfoLookup>,
        geocoder: Box<dyn Geocoder>,
    ) -> Self {
        Self {
            countries,
            country_info,
            geocoder,
        }
    }

    /// Enricher backed by the HTTP services named in the configuration
    pub fn from_config(config: &LookupConfig) -> Result<Self> {
        Ok(Self::new(
            Box::new(PlaceSearchClient::new(config)?),
            Box::new(RestCountriesClient::new(config)?),
            Box::new(NominatimGeocoder::new(config)?),
        ))
    }

    /// Build location, company and posting rows for `records`.
    ///
    /// Skill links are left empty; the skill tagger fills them in.
    pub async fn enrich(&self, records: &[JobRecord]) -> Dataset {
        let labels = distinct(
            records
                .iter()
                .flat_map(|r| [r.location.as_deref(), r.headquarters.as_deref()])
                .flatten(),
        );
        info!("Resolving countries for {} distinct locations", labels.len());

        let mut country_of: HashMap<String, Option<String>> = HashMap::new();
        for label in &labels {
            let country = resolve_country(self.countries.as_ref(), label).await;
            debug!("'{}' -> {:?}", label, country);
            country_of.insert(label.clone(), country);
        }

        let countries = distinct(
            labels
                .iter()
                .filter_map(|l| country_of.get(l))
                .flatten()
                .map(String::as_str),
        );
        info!("Looking up metadata for {} countries", countries.len());

        let mut info_of: HashMap<String, CountryInfo> = HashMap::new();
        for country in &countries {
            let info = match self.country_info.lookup(country).await {
                Ok(info) => info,
                Err(e) => {
                    warn!("Country metadata for '{}' unavailable: {}", country, e);
                    CountryInfo::default()
                }
            };
            info_of.insert(country.clone(), info);
        }

        let queries = distinct(labels.iter().chain(countries.iter()).map(String::as_str));
        info!("Geocoding {} locations and countries", queries.len());

        let mut coordinates_of: HashMap<String, Coordinates> = HashMap::new();
        for query in &queries {
            match self.geocoder.geocode(query).await {
                Ok(Some(coordinates)) => {
                    coordinates_of.insert(query.clone(), coordinates);
                }
                Ok(None) => debug!("No coordinates for '{}'", query),
                Err(e) => warn!("Geocoding '{}' failed: {}", query, e),
            }
        }

        let place = |label: Option<&str>| -> Place {
            let country = label
                .and_then(|l| country_of.get(l).cloned().flatten())
                .unwrap_or_else(|| MISSING_TEXT.to_string());
            Place {
                label: label.unwrap_or(MISSING_TEXT).to_string(),
                city: label.map(city_of).unwrap_or_else(|| MISSING_TEXT.to_string()),
                country,
            }
        };

        let mut dataset = Dataset::default();
        let mut seen_locations = HashSet::new();

        for record in records {
            let job = place(record.location.as_deref());
            let hq = place(record.headquarters.as_deref());

            for p in [&job, &hq] {
                if !seen_locations.insert((p.country.clone(), p.city.clone())) {
                    continue;
                }
                let info = info_of.get(&p.country).cloned().unwrap_or_default();
                let coordinates = coordinates_of
                    .get(&p.label)
                    .or_else(|| coordinates_of.get(&p.country))
                    .copied();

                dataset.locations.push(LocationRow {
                    label: p.label.clone(),
                    country: p.country.clone(),
                    city: p.city.clone(),
                    longitude: coordinates.map(|c| c.longitude),
                    latitude: coordinates.map(|c| c.latitude),
                    region: text(info.region),
                    population: info.population.unwrap_or(MISSING_NUMBER),
                    capital: text(info.capital),
                });
            }

            let company = text(record.company.clone());

            dataset.companies.push(CompanyRow {
                name: company.clone(),
                size: text(record.size.clone()),
                founded: text(record.founded.clone()),
                company_type: text(record.company_type.clone()),
                industry: text(record.industry.clone()),
                sector: text(record.sector.clone()),
                revenue: text(record.revenue.clone()),
                rating: record.rating.unwrap_or(MISSING_RATING),
                country: hq.country.clone(),
                city: hq.city.clone(),
            });

            dataset.postings.push(PostingRow {
                job_id: text(record.job_id.clone()),
                title: text(record.title.clone()),
                description: text(record.description.clone()),
                scraped_at: record.scraped_at.to_rfc3339(),
                company,
                country: job.country,
                city: job.city,
            });
        }

        info!(
            "Enriched {} records into {} locations",
            records.len(),
            dataset.locations.len()
        );
        dataset
    }
}

/// City part of a location string: the text before the first comma
pub fn city_of(location: &str) -> String {
    let city = location.split(',').next().unwrap_or_default().trim();
    if city.is_empty() {
        MISSING_TEXT.to_string()
    } else {
        city.to_string()
    }
}

fn text(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| MISSING_TEXT.to_string())
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| !v.trim().is_empty())
        .filter(|v| seen.insert(v.to_string()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::scrape::{assemble, CompanyInfo, MainTab, PostingFields};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FixedInfo {
        known: HashMap<String, CountryInfo>,
        asked: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CountryInfoLookup for FixedInfo {
        async fn lookup(&self, country: &str) -> Result<CountryInfo> {
            self.asked.lock().unwrap().push(country.to_string());
            Ok(self.known.get(country).cloned().unwrap_or_default())
        }
    }

    struct FixedGeocoder(HashMap<String, Coordinates>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
            Ok(self.0.get(query).copied())
        }
    }

    struct DownGeocoder;

    #[async_trait]
    impl Geocoder for DownGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<Coordinates>> {
            Err(Error::Lookup("geocoder offline".to_string()))
        }
    }

    fn record(location: &str, headquarters: &str) -> JobRecord {
        assemble(
            PostingFields {
                main: MainTab {
                    job_id: Some("1001".to_string()),
                    title: Some("Data Scientist".to_string()),
                    company: Some("Globex".to_string()),
                    location: Some(location.to_string()),
                    description: Some("Python".to_string()),
                },
                company_info: CompanyInfo {
                    headquarters: Some(headquarters.to_string()),
                    founded: Some("1998".to_string()),
                    ..Default::default()
                },
                rating: None,
            },
            Utc::now(),
        )
    }

    fn usa_info() -> FixedInfo {
        let mut known = HashMap::new();
        known.insert(
            "USA".to_string(),
            CountryInfo {
                population: Some(331_000_000),
                capital: Some("Washington, D.C.".to_string()),
                region: Some("Americas".to_string()),
            },
        );
        FixedInfo {
            known,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_central_posting_resolves_through_headquarters() {
        let lookup = StaticLookup::default().with("Austin, TX", "US", "Austin, Texas, US");
        let mut coords = HashMap::new();
        coords.insert(
            "Austin, TX".to_string(),
            Coordinates {
                longitude: -97.74,
                latitude: 30.27,
            },
        );
        let enricher = Enricher::new(
            Box::new(lookup),
            Box::new(usa_info()),
            Box::new(FixedGeocoder(coords)),
        );

        let dataset = enricher.enrich(&[record("Central", "Austin, TX")]).await;

        assert_eq!(dataset.locations.len(), 1);
        let location = &dataset.locations[0];
        assert_eq!(location.label, "Austin, TX");
        assert_eq!(location.country, "USA");
        assert_eq!(location.city, "Austin");
        assert_eq!(location.longitude, Some(-97.74));
        assert_eq!(location.population, 331_000_000);
        assert_eq!(location.region, "Americas");

        let company = &dataset.companies[0];
        assert_eq!(company.name, "Globex");
        assert_eq!(company.founded, "1998");
        assert_eq!(company.rating, MISSING_RATING);
        assert_eq!((company.country.as_str(), company.city.as_str()), ("USA", "Austin"));

        let posting = &dataset.postings[0];
        assert_eq!(posting.job_id, "1001");
        assert_eq!((posting.country.as_str(), posting.city.as_str()), ("USA", "Austin"));
        assert!(dataset.skill_links.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_country_gets_sentinels() {
        let enricher = Enricher::new(
            Box::new(StaticLookup::default()),
            Box::new(FixedInfo::default()),
            Box::new(DownGeocoder),
        );

        let dataset = enricher
            .enrich(&[record("Springfield, Atlantis", "Springfield, Atlantis")])
            .await;

        assert_eq!(dataset.locations.len(), 1);
        let location = &dataset.locations[0];
        assert_eq!(location.country, "Atlantis");
        assert_eq!(location.population, MISSING_NUMBER);
        assert_eq!(location.capital, MISSING_TEXT);
        assert_eq!(location.region, MISSING_TEXT);
        assert_eq!(location.longitude, None);
        assert_eq!(location.latitude, None);
    }

    #[tokio::test]
    async fn test_country_coordinates_fallback() {
        let lookup = StaticLookup::default()
            .with("Austin, TX", "US", "Austin, Texas, US")
            .with("Boston, MA", "US", "Boston, Massachusetts, US");
        let info = usa_info();
        let mut coords = HashMap::new();
        coords.insert(
            "USA".to_string(),
            Coordinates {
                longitude: -98.5,
                latitude: 39.8,
            },
        );
        let enricher = Enricher::new(
            Box::new(lookup),
            Box::new(info),
            Box::new(FixedGeocoder(coords)),
        );

        let records = vec![
            record("Austin, TX", "Boston, MA"),
            record("Boston, MA", "Austin, TX"),
        ];
        let dataset = enricher.enrich(&records).await;

        assert_eq!(dataset.locations.len(), 2);
        for location in &dataset.locations {
            assert_eq!(location.longitude, Some(-98.5));
            assert_eq!(location.latitude, Some(39.8));
        }
        assert_eq!(dataset.companies.len(), 2);
        assert_eq!(dataset.postings.len(), 2);
    }

    #[tokio::test]
    async fn test_absent_fields_become_none_marker() {
        let enricher = Enricher::new(
            Box::new(StaticLookup::default()),
            Box::new(FixedInfo::default()),
            Box::new(DownGeocoder),
        );
        let dataset = enricher.enrich(&[JobRecord::empty(Utc::now())]).await;

        let location = &dataset.locations[0];
        assert_eq!(location.label, MISSING_TEXT);
        assert_eq!(location.country, MISSING_TEXT);
        assert_eq!(location.city, MISSING_TEXT);

        let company = &dataset.companies[0];
        assert_eq!(company.name, MISSING_TEXT);
        assert_eq!(company.founded, MISSING_TEXT);

        assert_eq!(dataset.postings[0].job_id, MISSING_TEXT);
    }

    #[tokio::test]
    async fn test_founded_is_kept_as_text() {
        let enricher = Enricher::new(
            Box::new(StaticLookup::default()),
            Box::new(FixedInfo::default()),
            Box::new(DownGeocoder),
        );
        let mut unknown = record("Leeds", "Leeds");
        unknown.founded = Some("Unknown".to_string());
        let mut absent = record("Leeds", "Leeds");
        absent.founded = None;

        let dataset = enricher.enrich(&[unknown, absent]).await;
        assert_eq!(dataset.companies[0].founded, "Unknown");
        assert_eq!(dataset.companies[1].founded, MISSING_TEXT);
    }

    #[test]
    fn test_city_of() {
        assert_eq!(city_of("Tel Aviv-Yafo, Israel"), "Tel Aviv-Yafo");
        assert_eq!(city_of("Leeds"), "Leeds");
        assert_eq!(city_of(", Nowhere"), MISSING_TEXT);
    }
}
