//! Scrape command: the end-to-end pipeline
//!
//! links -> fields -> records -> jobs snapshot -> enrichment -> skills -> database

use crate::browser::{Browser, ChromeBrowser};
use crate::config::{Config, SearchTarget};
use crate::enrich::Enricher;
use crate::error::Result;
use crate::progress::posting_bar;
use crate::scrape::{assemble, FieldExtractor, JobRecord, LinkCollector};
use crate::skills::SkillTagger;
use crate::snapshot;
use crate::store::{PersistStats, Store};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{info, warn};

/// Options for a scrape run
#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    pub target: SearchTarget,
    /// Result pages per search; defaults to `search.max_pages`
    pub max_pages: Option<u32>,
    /// Postings to extract, taken from the start of the collected links
    pub max_postings: Option<usize>,
}

/// Statistics from a scrape run
#[derive(Debug, Clone, Default)]
pub struct ScrapeStats {
    pub links_collected: usize,
    pub records: usize,
    pub jobs_snapshot: Option<PathBuf>,
    pub resumed: bool,
    pub persist: PersistStats,
}

/// Run the whole pipeline against a real browser, or from the configured
/// jobs snapshot when `output.resume_from` is set
pub async fn cmd_scrape(config: &Config, options: &ScrapeOptions) -> Result<ScrapeStats> {
    let stamp = snapshot::run_stamp(Utc::now());
    let mut stats = ScrapeStats::default();

    let records = match &config.output.resume_from {
        Some(path) => {
            info!("Resuming from {:?}", path);
            stats.resumed = true;
            snapshot::read_jobs(path)?
        }
        None => {
            let browser = ChromeBrowser::launch(&config.browser).await?;
            let scraped = scrape_postings(&browser, config, options, &stamp).await;
            if let Err(e) = browser.close().await {
                warn!("Browser did not shut down cleanly: {}", e);
            }
            let (links, records) = scraped?;
            stats.links_collected = links;
            stats.jobs_snapshot = Some(snapshot::write_jobs(&config.output.dir, &stamp, &records)?);
            records
        }
    };
    stats.records = records.len();

    let enricher = Enricher::from_config(&config.lookup)?;
    let store = Store::open(&config.database.file).await?;
    let persisted = store_records(config, &enricher, &store, &records).await;
    store.close().await;
    stats.persist = persisted?;

    Ok(stats)
}

/// Collect links and extract every posting behind them.
///
/// Writes the links snapshot as soon as collection is done. Returns the
/// number of links collected and the assembled records.
pub async fn scrape_postings(
    browser: &dyn Browser,
    config: &Config,
    options: &ScrapeOptions,
    stamp: &str,
) -> Result<(usize, Vec<JobRecord>)> {
    let search_urls = config.search.urls(options.target);
    let max_pages = options
        .max_pages
        .unwrap_or(config.search.max_pages)
        .min(config.search.max_pages);

    info!(
        "Collecting links from {} searches, up to {} pages each",
        search_urls.len(),
        max_pages
    );
    let collector = LinkCollector::new(browser, &config.extract, &config.browser);
    let mut links = collector.collect(&search_urls, max_pages).await?;
    snapshot::write_links(&config.output.dir, stamp, &links)?;

    let collected = links.len();
    if let Some(limit) = options.max_postings {
        links.truncate(limit);
    }

    let extractor = FieldExtractor::new(browser, &config.extract);
    let pb = posting_bar(links.len(), "Extracting postings");
    let mut records = Vec::with_capacity(links.len());

    for link in &links {
        if !extractor.open(link).await {
            warn!("Skipping posting {}", link);
            pb.inc(1);
            continue;
        }
        let fields = extractor.extract(link).await;
        records.push(assemble(fields, Utc::now()));
        pb.inc(1);
    }
    pb.finish_with_message("Postings extracted");

    info!("Assembled {} records from {} links", records.len(), collected);
    Ok((collected, records))
}

/// Enrich, tag and persist assembled records
pub async fn store_records(
    config: &Config,
    enricher: &Enricher,
    store: &Store,
    records: &[JobRecord],
) -> Result<PersistStats> {
    let mut dataset = enricher.enrich(records).await;

    if let Some(vocabulary_file) = &config.database.vocabulary_file {
        store.seed_skills(vocabulary_file).await?;
    }
    let tagger = SkillTagger::new(store.vocabulary().await?)?;
    if tagger.vocabulary_len() == 0 {
        warn!("Skill vocabulary is empty, postings will not be tagged");
    }
    dataset.skill_links = tagger.links(&dataset.postings);

    store.persist(&dataset, config.database.commit_interval).await
}

pub fn print_scrape_stats(stats: &ScrapeStats) {
    println!("\nScrape Complete\n");
    if stats.resumed {
        println!("Resumed from snapshot");
    } else {
        println!("Links collected: {}", stats.links_collected);
    }
    println!("Records: {}", stats.records);
    if let Some(path) = &stats.jobs_snapshot {
        println!("Snapshot: {}", path.display());
    }
    println!("\nLocations: {}", stats.persist.locations);
    println!("Companies: {}", stats.persist.companies);
    println!("Postings: {}", stats.persist.postings);
    println!("Skill links: {}", stats.persist.skill_links);
}
