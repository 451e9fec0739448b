//! Backup coordinator - main run loop
//!
//! This module ties the components of a backup run together:
//! - Choosing between explicit ad links and a full crawl of the user listing
//! - Extracting, writing and downloading the images of each ad in turn
//! - Tracking directory names produced in this run
//! - Counting ads and images for the final report
//!
//! Ads are processed one after another in link order. The first error stops
//! the run.

use crate::ad::extract_ad;
use crate::config::Config;
use crate::crawler::fetcher::Transport;
use crate::crawler::listing::ListingCrawler;
use crate::images::ImagePipeline;
use crate::output::{BackupStats, BackupWriter, RunDate};
use crate::state::{Claim, VisitedRegistry};
use crate::{AdkeepError, Result};
use std::path::Path;

/// Main backup coordinator structure
pub struct Coordinator {
    config: Config,
    transport: Transport,
    writer: BackupWriter,
    pipeline: ImagePipeline,
    visited: VisitedRegistry,
    stats: BackupStats,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// The output directory template is rendered against today's date.
    ///
    /// # Arguments
    ///
    /// * `config` - The validated run configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(AdkeepError)` - The HTTP client or a template could not be built
    pub fn new(config: Config) -> Result<Self> {
        Self::with_date(config, RunDate::today())
    }

    /// Creates a coordinator for an explicit run date
    pub fn with_date(config: Config, date: RunDate) -> Result<Self> {
        let transport = Transport::new(&config)?;
        let writer = BackupWriter::from_config(&config, date)?;
        let pipeline = ImagePipeline::new(transport.clone(), config.throttle, config.force);

        Ok(Self {
            config,
            transport,
            writer,
            pipeline,
            visited: VisitedRegistry::new(),
            stats: BackupStats::new(),
        })
    }

    /// Directory that receives the ad directories of this run
    pub fn outdir(&self) -> &Path {
        self.writer.outdir()
    }

    pub fn stats(&self) -> BackupStats {
        self.stats
    }

    /// Determines the ads to back up
    ///
    /// Explicit ad links take precedence and are used as given. Otherwise the
    /// listing of the configured user is crawled completely and then cut to
    /// the configured limit.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - Ad URLs in processing order
    /// * `Err(AdkeepError::NothingToDo)` - Neither ad links nor a user id
    /// * `Err(AdkeepError)` - The listing could not be crawled
    pub async fn ad_links(&self) -> Result<Vec<String>> {
        if !self.config.adlinks.is_empty() {
            return Ok(self.config.adlinks.clone());
        }

        if self.config.user == 0 {
            return Err(AdkeepError::NothingToDo);
        }

        tracing::info!(user = self.config.user, "fetching ad pages");
        let crawler =
            ListingCrawler::new(self.transport.clone(), &self.config.site, self.config.user);
        let mut links = crawler.collect().await?;

        if self.config.limit > 0 && links.len() > self.config.limit {
            tracing::debug!(
                found = links.len(),
                limit = self.config.limit,
                "limiting number of ads"
            );
            links.truncate(self.config.limit);
        }

        Ok(links)
    }

    /// Runs the backup
    ///
    /// # Returns
    ///
    /// * `Ok(BackupStats)` - Every ad was backed up
    /// * `Err(AdkeepError)` - The first failure; ads before it stay on disk
    pub async fn run(&mut self) -> Result<BackupStats> {
        let links = self.ad_links().await?;
        self.writer.prepare()?;

        tracing::info!(
            ads = links.len(),
            outdir = %self.outdir().display(),
            "starting backup"
        );

        for link in &links {
            self.backup_ad(link).await?;
        }

        tracing::info!(
            ads = self.stats.ads,
            images = self.stats.images,
            "backup completed"
        );

        Ok(self.stats)
    }

    /// Backs up a single ad: listing text first, then its images
    ///
    /// An ad already written in this run is skipped, unless forcing, in
    /// which case it is written again into the same directory.
    pub async fn backup_ad(&mut self, url: &str) -> Result<()> {
        let ad = extract_ad(&self.transport, url).await?;

        let name = match self.visited.claim(&self.writer.ad_dir_name(&ad)?, &ad.id) {
            Claim::Fresh(name) => name,
            Claim::Repeat(name) if self.config.force => {
                tracing::debug!(url, dir = %name, "ad already written in this run, rewriting");
                name
            }
            Claim::Repeat(name) => {
                tracing::warn!(url, dir = %name, "ad already written in this run, skipping");
                return Ok(());
            }
        };

        let dir = self.writer.write_ad(&name, &ad)?;
        let report = self.pipeline.run(&ad, &dir).await?;

        tracing::debug!(
            ad = %ad.slug,
            written = report.written,
            duplicates = report.duplicates,
            ignored = report.ignored,
            "processed ad images"
        );

        self.stats.incr_ads();
        self.stats.incr_images(ad.images.len());
        Ok(())
    }
}

/// Runs a complete backup
///
/// This is the main entry point for a backup run. It will:
/// 1. Build the HTTP transport and the output writer
/// 2. Collect the ad links (explicit or crawled)
/// 3. Extract and write each ad
/// 4. Download the images of each ad, skipping those already on disk
///
/// # Arguments
///
/// * `config` - The validated run configuration
///
/// # Returns
///
/// * `Ok(BackupStats)` - Backup completed successfully
/// * `Err(AdkeepError)` - Backup stopped at the first error
///
/// # Example
///
/// ```no_run
/// use adkeep::config::load_config;
/// use adkeep::crawler::run_backup;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("adkeep.conf"))?;
/// let stats = run_backup(config).await?;
/// println!("{} ads", stats.ads);
/// # Ok(())
/// # }
/// ```
pub async fn run_backup(config: Config) -> Result<BackupStats> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
