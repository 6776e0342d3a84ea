//! SQLite schema definition

/// SQL schema for the jobs database
///
/// Columns are NOT NULL throughout; absent values arrive as the `None`
/// marker or the -99 sentinel.
pub const SCHEMA_SQL: &str = r#"
-- Locations: one row per (country, city)
CREATE TABLE IF NOT EXISTS locations (
    location_id INTEGER PRIMARY KEY AUTOINCREMENT,
    location TEXT NOT NULL,
    country TEXT NOT NULL,
    city TEXT NOT NULL,
    longitude REAL NOT NULL,
    latitude REAL NOT NULL,
    region TEXT NOT NULL,
    population INTEGER NOT NULL,
    capital TEXT NOT NULL,
    UNIQUE(country, city)
);

-- Companies: keyed by name, located at their headquarters
CREATE TABLE IF NOT EXISTS companies (
    company_name TEXT PRIMARY KEY,
    size TEXT NOT NULL,
    founded TEXT NOT NULL,
    company_type TEXT NOT NULL,
    industry TEXT NOT NULL,
    sector TEXT NOT NULL,
    revenue TEXT NOT NULL,
    rating REAL NOT NULL,
    location_id INTEGER NOT NULL REFERENCES locations(location_id)
);

-- Job requisitions: one row per posting
CREATE TABLE IF NOT EXISTS job_reqs (
    job_id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    scraped_at TEXT NOT NULL,
    company_name TEXT NOT NULL REFERENCES companies(company_name),
    location_id INTEGER NOT NULL REFERENCES locations(location_id)
);

-- Skills: reference vocabulary
CREATE TABLE IF NOT EXISTS skills (
    skill_id INTEGER PRIMARY KEY,
    skill_name TEXT NOT NULL UNIQUE
);

-- Skills mentioned by each posting
CREATE TABLE IF NOT EXISTS skills_in_job (
    job_id INTEGER NOT NULL REFERENCES job_reqs(job_id),
    skill_id INTEGER NOT NULL REFERENCES skills(skill_id),
    PRIMARY KEY (job_id, skill_id)
);

CREATE INDEX IF NOT EXISTS idx_companies_location ON companies(location_id);
CREATE INDEX IF NOT EXISTS idx_job_reqs_location ON job_reqs(location_id);
CREATE INDEX IF NOT EXISTS idx_skills_in_job_skill ON skills_in_job(skill_id);
"#;

/// Tables created by [`SCHEMA_SQL`]
pub const TABLES: [&str; 5] = ["locations", "companies", "job_reqs", "skills", "skills_in_job"];
