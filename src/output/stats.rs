//! Run statistics
//!
//! Counters kept by the run loop and reported when a backup finishes.

use std::fmt;
use std::path::Path;

/// Ads and images processed in one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackupStats {
    /// Number of ads written
    pub ads: usize,

    /// Number of image links processed, duplicates included
    pub images: usize,
}

impl BackupStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr_ads(&mut self) {
        self.ads += 1;
    }

    pub fn incr_images(&mut self, count: usize) {
        self.images += count;
    }

    /// One-line summary of a finished run
    ///
    /// # Arguments
    ///
    /// * `outdir` - The output directory of the run
    pub fn summary(&self, outdir: &Path) -> String {
        format!(
            "Successfully downloaded {} ad(s) with {} image(s) to {}",
            self.ads,
            self.images,
            outdir.display()
        )
    }
}

impl fmt::Display for BackupStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ad(s), {} image(s)", self.ads, self.images)
    }
}

/// Prints the summary of a finished run to stdout
pub fn print_statistics(stats: &BackupStats, outdir: &Path) {
    println!("{}", stats.summary(outdir));
}
