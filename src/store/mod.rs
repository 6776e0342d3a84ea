//! Normalized persistence using SQLite
//!
//! Rows are written parents first: locations, companies, postings and then
//! posting-skill links. Every insert is `INSERT OR IGNORE`, so writing the
//! same dataset twice leaves the database unchanged. Writes are committed in
//! batches of `commit_interval` rows.

mod schema;

pub use schema::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Text stored for an absent coordinate
const MISSING_COORDINATE: &str = "None";

/// A location row, keyed by (country, city)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    pub label: String,
    pub country: String,
    pub city: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub region: String,
    pub population: i64,
    pub capital: String,
}

/// A company row, located by its headquarters (country, city)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRow {
    pub name: String,
    pub size: String,
    pub founded: String,
    pub company_type: String,
    pub industry: String,
    pub sector: String,
    pub revenue: String,
    pub rating: f64,
    pub country: String,
    pub city: String,
}

/// A posting row, located by the job (country, city)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingRow {
    /// Raw posting id; rows whose id is not numeric are not stored
    pub job_id: String,
    pub title: String,
    pub description: String,
    pub scraped_at: String,
    pub company: String,
    pub country: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillLink {
    pub job_id: String,
    pub skill_id: i64,
}

/// Everything one run writes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub locations: Vec<LocationRow>,
    pub companies: Vec<CompanyRow>,
    pub postings: Vec<PostingRow>,
    pub skill_links: Vec<SkillLink>,
}

/// Write counts for one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub attempted: usize,
    pub inserted: usize,
    pub skipped: usize,
}

impl TableStats {
    /// Rows that were already present
    pub fn ignored(&self) -> usize {
        self.attempted - self.inserted - self.skipped
    }
}

impl fmt::Display for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} already present, {} skipped",
            self.inserted,
            self.ignored(),
            self.skipped
        )
    }
}

/// Result of [`Store::persist`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStats {
    pub locations: TableStats,
    pub companies: TableStats,
    pub postings: TableStats,
    pub skill_links: TableStats,
    pub commits: usize,
}

/// Rows written since the last commit, committed every `interval` rows.
/// A transaction is opened on the first write after a commit.
struct Batch<'a> {
    pool: &'a SqlitePool,
    tx: Option<Transaction<'static, Sqlite>>,
    interval: usize,
    pending: usize,
    commits: usize,
}

impl<'a> Batch<'a> {
    fn new(pool: &'a SqlitePool, interval: usize) -> Batch<'a> {
        Self {
            pool,
            tx: None,
            interval: interval.max(1),
            pending: 0,
            commits: 0,
        }
    }

    async fn conn(&mut self) -> Result<&mut SqliteConnection> {
        if self.tx.is_none() {
            self.tx = Some(self.pool.begin().await?);
        }
        self.tx
            .as_deref_mut()
            .ok_or_else(|| Error::Other("Write batch has no open transaction".to_string()))
    }

    async fn row_written(&mut self) -> Result<()> {
        self.pending += 1;
        if self.pending >= self.interval {
            self.commit().await?;
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
            if self.pending > 0 {
                debug!("Committed {} rows", self.pending);
                self.pending = 0;
                self.commits += 1;
            }
        }
        Ok(())
    }
}

/// Jobs database
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the database at `db_path` and make sure the
    /// schema exists
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write order guarantees parents exist; references are not enforced
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(false)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create any missing tables
    pub async fn init_schema(&self) -> Result<()> {
        debug!("Ensuring database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Seed the skill vocabulary from a file with one term per line.
    ///
    /// Does nothing when the table already holds skills. Terms are
    /// lower-cased and numbered from 0 in file order. Returns the number of
    /// skills inserted.
    pub async fn seed_skills(&self, path: &Path) -> Result<usize> {
        let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM skills")
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            debug!("Skill vocabulary already holds {} terms", existing);
            return Ok(0);
        }

        let content = std::fs::read_to_string(path)?;
        let terms: Vec<String> = content
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|line| !line.is_empty())
            .collect();

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for (id, term) in terms.iter().enumerate() {
            let result = sqlx::query("INSERT OR IGNORE INTO skills (skill_id, skill_name) VALUES (?, ?)")
                .bind(id as i64)
                .bind(term)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected() as usize;
        }
        tx.commit().await?;

        info!("Seeded {} skills from {:?}", inserted, path);
        Ok(inserted)
    }

    /// Skill vocabulary as term -> skill id
    pub async fn vocabulary(&self) -> Result<HashMap<String, i64>> {
        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT skill_id, skill_name FROM skills")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id, name)| (name, id)).collect())
    }

    /// Write `dataset`, committing every `commit_interval` rows.
    ///
    /// Postings without a numeric id are skipped with a warning, as are the
    /// skill links that point at them. A company or posting whose
    /// (country, city) has no location row fails the whole call with
    /// [`Error::MissingLocation`]; rows committed before that stay committed.
    pub async fn persist(&self, dataset: &Dataset, commit_interval: usize) -> Result<PersistStats> {
        let mut stats = PersistStats::default();
        let mut batch = Batch::new(&self.pool, commit_interval);

        for location in &dataset.locations {
            stats.locations.attempted += 1;
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO locations
                    (location, country, city, longitude, latitude, region, population, capital)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&location.label)
            .bind(&location.country)
            .bind(&location.city)
            .bind(coordinate(location.longitude))
            .bind(coordinate(location.latitude))
            .bind(&location.region)
            .bind(location.population)
            .bind(&location.capital)
            .execute(batch.conn().await?)
            .await?;
            stats.locations.inserted += result.rows_affected() as usize;
            batch.row_written().await?;
        }

        for company in &dataset.companies {
            stats.companies.attempted += 1;
            let location_id = location_id(batch.conn().await?, &company.country, &company.city).await?;
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO companies
                    (company_name, size, founded, company_type, industry, sector, revenue, rating, location_id)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&company.name)
            .bind(&company.size)
            .bind(&company.founded)
            .bind(&company.company_type)
            .bind(&company.industry)
            .bind(&company.sector)
            .bind(&company.revenue)
            .bind(company.rating)
            .bind(location_id)
            .execute(batch.conn().await?)
            .await?;
            stats.companies.inserted += result.rows_affected() as usize;
            batch.row_written().await?;
        }

        let mut stored_ids = HashSet::new();
        for posting in &dataset.postings {
            stats.postings.attempted += 1;
            let Some(job_id) = parse_job_id(&posting.job_id) else {
                warn!(
                    "Skipping posting '{}' at {}: missing job id {:?}",
                    posting.title, posting.company, posting.job_id
                );
                stats.postings.skipped += 1;
                continue;
            };

            let location_id = location_id(batch.conn().await?, &posting.country, &posting.city).await?;
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO job_reqs
                    (job_id, title, description, scraped_at, company_name, location_id)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(job_id)
            .bind(&posting.title)
            .bind(&posting.description)
            .bind(&posting.scraped_at)
            .bind(&posting.company)
            .bind(location_id)
            .execute(batch.conn().await?)
            .await?;
            stats.postings.inserted += result.rows_affected() as usize;
            stored_ids.insert(job_id);
            batch.row_written().await?;
        }

        for link in &dataset.skill_links {
            stats.skill_links.attempted += 1;
            let job_id = match parse_job_id(&link.job_id) {
                Some(id) if stored_ids.contains(&id) => id,
                _ => {
                    stats.skill_links.skipped += 1;
                    continue;
                }
            };

            let result = sqlx::query("INSERT OR IGNORE INTO skills_in_job (job_id, skill_id) VALUES (?, ?)")
                .bind(job_id)
                .bind(link.skill_id)
                .execute(batch.conn().await?)
                .await?;
            stats.skill_links.inserted += result.rows_affected() as usize;
            batch.row_written().await?;
        }

        batch.commit().await?;
        stats.commits = batch.commits;

        info!(
            "Persisted {} locations, {} companies, {} postings, {} skill links",
            stats.locations.inserted,
            stats.companies.inserted,
            stats.postings.inserted,
            stats.skill_links.inserted
        );
        Ok(stats)
    }

    /// Number of rows in `table`
    pub async fn count(&self, table: &str) -> Result<i64> {
        if !TABLES.contains(&table) {
            return Err(Error::Other(format!("Unknown table: {}", table)));
        }
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// First location id stored for (country, city)
async fn location_id(conn: &mut SqliteConnection, country: &str, city: &str) -> Result<i64> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT location_id FROM locations WHERE country = ? AND city = ? LIMIT 1")
            .bind(country)
            .bind(city)
            .fetch_optional(conn)
            .await?;

    row.map(|(id,)| id).ok_or_else(|| Error::MissingLocation {
        country: country.to_string(),
        city: city.to_string(),
    })
}

/// Numeric posting id, `None` for empty, marker or malformed ids
fn parse_job_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Coordinates are bound as text so an absent one can be stored as the
/// marker; SQLite converts numeric text back to REAL on insert.
fn coordinate(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| MISSING_COORDINATE.to_string())
}
