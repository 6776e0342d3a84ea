//! Fixed-shape posting records

use super::{CompanyInfo, PostingFields};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Location labels that name a sub-national region rather than a city.
/// Postings carrying one of these are located at the company headquarters.
pub const AMBIGUOUS_REGIONS: [&str; 2] = ["Central", "Southern"];

/// One scraped posting, merged from every tab of its page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub headquarters: Option<String>,
    pub size: Option<String>,
    pub company_type: Option<String>,
    pub revenue: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub rating: Option<f64>,
    pub founded: Option<String>,
    pub competitors: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

#[cfg(test)]
impl JobRecord {
    /// An empty record captured at `scraped_at`
    pub(crate) fn empty(scraped_at: DateTime<Utc>) -> Self {
        Self {
            job_id: None,
            title: None,
            company: None,
            location: None,
            description: None,
            headquarters: None,
            size: None,
            company_type: None,
            revenue: None,
            industry: None,
            sector: None,
            rating: None,
            founded: None,
            competitors: None,
            scraped_at,
        }
    }
}

/// Merge the extracted fields of one posting into a record
pub fn assemble(fields: PostingFields, scraped_at: DateTime<Utc>) -> JobRecord {
    let PostingFields {
        main,
        company_info,
        rating,
    } = fields;
    let CompanyInfo {
        headquarters,
        size,
        company_type,
        revenue,
        industry,
        sector,
        founded,
        competitors,
    } = company_info;

    let location = match main.location {
        Some(loc) if AMBIGUOUS_REGIONS.contains(&loc.as_str()) => {
            debug!(
                "Location '{}' is a region, using headquarters {:?}",
                loc, headquarters
            );
            headquarters.clone()
        }
        other => other,
    };

    JobRecord {
        job_id: main.job_id,
        title: main.title,
        company: main.company,
        location,
        description: main.description,
        headquarters,
        size,
        company_type,
        revenue,
        industry,
        sector,
        rating,
        founded,
        competitors,
        scraped_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::MainTab;

    fn fields(location: &str, headquarters: Option<&str>) -> PostingFields {
        PostingFields {
            main: MainTab {
                job_id: Some("3571".to_string()),
                title: Some("Data Engineer".to_string()),
                company: Some("Initech".to_string()),
                location: Some(location.to_string()),
                description: Some("Pipelines".to_string()),
            },
            company_info: CompanyInfo {
                headquarters: headquarters.map(str::to_string),
                size: Some("51 to 200 Employees".to_string()),
                ..Default::default()
            },
            rating: Some(4.1),
        }
    }

    #[test]
    fn test_ambiguous_regions_use_headquarters() {
        for region in AMBIGUOUS_REGIONS {
            let record = assemble(fields(region, Some("Austin, TX")), Utc::now());
            assert_eq!(record.location.as_deref(), Some("Austin, TX"));
            assert_eq!(record.headquarters.as_deref(), Some("Austin, TX"));
        }
    }

    #[test]
    fn test_region_without_headquarters_becomes_absent() {
        let record = assemble(fields("Southern", None), Utc::now());
        assert_eq!(record.location, None);
    }

    #[test]
    fn test_city_location_is_kept() {
        let captured = Utc::now();
        let record = assemble(fields("Haifa", Some("Tel Aviv, Israel")), captured);
        assert_eq!(record.location.as_deref(), Some("Haifa"));
        assert_eq!(record.job_id.as_deref(), Some("3571"));
        assert_eq!(record.size.as_deref(), Some("51 to 200 Employees"));
        assert_eq!(record.rating, Some(4.1));
        assert_eq!(record.scraped_at, captured);
    }

    #[test]
    fn test_region_match_is_exact() {
        let record = assemble(fields("Central London", Some("Leeds")), Utc::now());
        assert_eq!(record.location.as_deref(), Some("Central London"));
    }
}
