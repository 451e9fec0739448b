//! Concurrent, deduplicating image download
//!
//! Every image of an ad is handled by its own task. Filenames are fixed by the
//! image's position before the tasks start, so the result on disk does not
//! depend on completion order. All tasks run to completion even if one of
//! them fails; the first failure is reported afterwards and files written by
//! the others stay on disk.

use crate::ad::AdRecord;
use crate::config::ThrottleConfig;
use crate::crawler::Transport;
use crate::images::cache::ImageHashCache;
use crate::images::hash::ImageHash;
use crate::{AdkeepError, Result};
use bytes::Bytes;
use image::ImageFormat;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// One downloaded and decoded image
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub source_url: String,
    pub data: Bytes,
    pub format: ImageFormat,
    /// `<index>.<ext>`, without directory
    pub filename: String,
    pub hash: ImageHash,
}

impl ImageRecord {
    /// Sniffs, decodes and hashes downloaded image data
    ///
    /// # Arguments
    ///
    /// * `data` - The raw image bytes
    /// * `base_name` - File name without extension, e.g. `"3"`
    /// * `source_url` - Where the data came from, used in errors
    ///
    /// # Returns
    ///
    /// * `Ok(ImageRecord)` - The decoded image with its hash
    /// * `Err(AdkeepError::Image)` - Unknown, unsupported or corrupt data
    pub fn decode(data: Bytes, base_name: &str, source_url: &str) -> Result<Self> {
        let image_error = |message: String| AdkeepError::Image {
            name: source_url.to_string(),
            message,
        };

        let format = image::guess_format(&data)
            .map_err(|e| image_error(format!("failed to detect image format: {}", e)))?;

        let ext = extension(format).ok_or_else(|| {
            image_error(format!(
                "unsupported image format {:?} (supported: jpg, png, gif, webp)",
                format
            ))
        })?;

        let decoded = image::load_from_memory_with_format(&data, format)
            .map_err(|e| image_error(format!("failed to decode image: {}", e)))?;

        let hash = ImageHash::difference(&decoded);
        tracing::debug!(url = source_url, format = ext, hash = %hash, "decoded image");

        Ok(Self {
            source_url: source_url.to_string(),
            data,
            format,
            filename: format!("{}.{}", base_name, ext),
            hash,
        })
    }
}

/// File extension for a supported format, None for everything else
pub fn extension(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::Png => Some("png"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::WebP => Some("webp"),
        _ => None,
    }
}

/// Picks a random politeness delay within the configured bounds
pub fn throttle_delay(throttle: &ThrottleConfig) -> Duration {
    if throttle.max_ms <= throttle.min_ms {
        return Duration::from_millis(throttle.min_ms);
    }

    Duration::from_millis(rand::rng().random_range(throttle.min_ms..=throttle.max_ms))
}

/// What happened to a single image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    /// Written to disk
    Written,
    /// An equivalent image is already on disk
    Duplicate,
    /// Download failed and errors are ignored
    Ignored,
}

/// Per-ad summary of the image step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageReport {
    pub written: usize,
    pub duplicates: usize,
    pub ignored: usize,
}

impl ImageReport {
    fn record(&mut self, outcome: ImageOutcome) {
        match outcome {
            ImageOutcome::Written => self.written += 1,
            ImageOutcome::Duplicate => self.duplicates += 1,
            ImageOutcome::Ignored => self.ignored += 1,
        }
    }
}

/// Downloads the images of one ad into its directory
#[derive(Debug, Clone)]
pub struct ImagePipeline {
    transport: Transport,
    throttle: ThrottleConfig,
    force: bool,
}

impl ImagePipeline {
    /// Creates a pipeline
    ///
    /// # Arguments
    ///
    /// * `transport` - Shared HTTP transport
    /// * `throttle` - Bounds of the delay before each download
    /// * `force` - Skip the duplicate check and rewrite every image
    pub fn new(transport: Transport, throttle: ThrottleConfig, force: bool) -> Self {
        Self {
            transport,
            throttle,
            force,
        }
    }

    /// Downloads, deduplicates and writes all images of `ad` into `dir`
    ///
    /// # Returns
    ///
    /// * `Ok(ImageReport)` - Every image was written, skipped as duplicate
    ///   or ignored
    /// * `Err(AdkeepError)` - The first failure among the image tasks
    pub async fn run(&self, ad: &AdRecord, dir: &Path) -> Result<ImageReport> {
        let cache = if self.force {
            ImageHashCache::empty()
        } else {
            let scan_dir = dir.to_path_buf();
            tokio::task::spawn_blocking(move || ImageHashCache::scan(&scan_dir)).await??
        };
        let cache = Arc::new(cache);

        let handles: Vec<_> = ad
            .images
            .iter()
            .enumerate()
            .map(|(idx, url)| {
                let job = ImageJob {
                    transport: self.transport.clone(),
                    cache: Arc::clone(&cache),
                    throttle: self.throttle,
                    force: self.force,
                    dir: dir.to_path_buf(),
                    base_name: (idx + 1).to_string(),
                    url: url.clone(),
                };
                tokio::spawn(job.run())
            })
            .collect();

        let mut report = ImageReport::default();
        let mut first_error = None;

        for handle in handles {
            match handle.await {
                Ok(Ok(outcome)) => report.record(outcome),
                Ok(Err(e)) => {
                    tracing::error!(ad = %ad.slug, error = %e, "image failed");
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    first_error.get_or_insert(AdkeepError::Task(e));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}

/// Everything one image task needs, owned so the task can be spawned
struct ImageJob {
    transport: Transport,
    cache: Arc<ImageHashCache>,
    throttle: ThrottleConfig,
    force: bool,
    dir: PathBuf,
    base_name: String,
    url: String,
}

impl ImageJob {
    async fn run(self) -> Result<ImageOutcome> {
        tokio::time::sleep(throttle_delay(&self.throttle)).await;

        let Some(data) = self.transport.get_image(&self.url).await? else {
            return Ok(ImageOutcome::Ignored);
        };

        let base_name = self.base_name;
        let url = self.url;
        let record =
            tokio::task::spawn_blocking(move || ImageRecord::decode(data, &base_name, &url))
                .await??;

        if !self.force && self.cache.contains_similar(&record.hash) {
            tracing::debug!(
                url = %record.source_url,
                hash = %record.hash,
                "image already exists, not writing"
            );
            return Ok(ImageOutcome::Duplicate);
        }

        let path = self.dir.join(&record.filename);
        tokio::fs::write(&path, &record.data)
            .await
            .map_err(|source| AdkeepError::Write {
                path: path.clone(),
                source,
            })?;

        tracing::info!(image = %path.display(), "wrote ad image");
        Ok(ImageOutcome::Written)
    }
}
