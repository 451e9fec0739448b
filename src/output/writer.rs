//! Backup writer: ad directories and `Adlisting.txt`

use crate::ad::AdRecord;
use crate::config::Config;
use crate::output::template::{RunDate, Template, TemplateFields};
use crate::{AdkeepError, Result};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Name of the rendered listing inside each ad directory
pub const LISTING_FILE: &str = "Adlisting.txt";

#[cfg(windows)]
const NEWLINE: &str = "\r\n";
#[cfg(not(windows))]
const NEWLINE: &str = "\n";

const LINE_BREAK_TAGS: [&str; 3] = ["<br/>", "<br />", "<br>"];

/// Replaces HTML line breaks with the platform newline
pub fn normalize_line_breaks(text: &str) -> String {
    LINE_BREAK_TAGS
        .iter()
        .fold(text.to_string(), |acc, tag| acc.replace(tag, NEWLINE))
}

/// Makes a rendered directory name safe to use as a single path component
fn sanitize_dir_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect()
}

/// Template fields of an ad with its body prepared for a text file
struct ListingFields<'a> {
    ad: &'a AdRecord,
    text: String,
}

impl TemplateFields for ListingFields<'_> {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "Text" => Some(Cow::Borrowed(self.text.as_str())),
            _ => self.ad.field(name),
        }
    }
}

/// Writes ads below an output directory
#[derive(Debug, Clone)]
pub struct BackupWriter {
    outdir: PathBuf,
    listing: Template,
    ad_name: Template,
}

impl BackupWriter {
    /// Creates a writer for an already resolved output directory
    ///
    /// # Arguments
    ///
    /// * `outdir` - Directory that receives one subdirectory per ad
    /// * `listing_template` - Template rendered into `Adlisting.txt`
    /// * `ad_name_template` - Template for the name of each ad directory
    pub fn new(outdir: PathBuf, listing_template: &str, ad_name_template: &str) -> Result<Self> {
        Ok(Self {
            outdir,
            listing: Template::parse(listing_template)?,
            ad_name: Template::parse(ad_name_template)?,
        })
    }

    /// Creates a writer from the configuration, rendering the output
    /// directory template against the run date
    pub fn from_config(config: &Config, date: RunDate) -> Result<Self> {
        let outdir = Template::parse(&config.outdir)?.render(&date)?;
        Self::new(
            PathBuf::from(outdir),
            &config.template,
            &config.ad_name_template,
        )
    }

    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Creates the output directory if it does not exist yet
    pub fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.outdir).map_err(|source| AdkeepError::Write {
            path: self.outdir.clone(),
            source,
        })
    }

    /// Renders the directory name of an ad
    pub fn ad_dir_name(&self, ad: &AdRecord) -> Result<String> {
        let name = sanitize_dir_name(&self.ad_name.render(ad)?);

        if name.is_empty() || name == "." || name == ".." {
            return Err(AdkeepError::Write {
                path: self.outdir.join(&name),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("ad name template gives unusable directory name for ad {}", ad.id),
                ),
            });
        }

        Ok(name)
    }

    /// Writes the listing of an ad into `<outdir>/<dir_name>/Adlisting.txt`
    ///
    /// The directory is created if needed; an existing listing is replaced.
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - The ad directory
    /// * `Err(AdkeepError)` - Rendering or writing failed
    pub fn write_ad(&self, dir_name: &str, ad: &AdRecord) -> Result<PathBuf> {
        let dir = self.outdir.join(dir_name);
        std::fs::create_dir_all(&dir).map_err(|source| AdkeepError::Write {
            path: dir.clone(),
            source,
        })?;

        let fields = ListingFields {
            ad,
            text: normalize_line_breaks(&ad.text),
        };
        let listing = self.listing.render(&fields)?;

        let listing_file = dir.join(LISTING_FILE);
        std::fs::write(&listing_file, listing).map_err(|source| AdkeepError::Write {
            path: listing_file.clone(),
            source,
        })?;

        tracing::info!(listingfile = %listing_file.display(), "wrote ad listing");
        Ok(dir)
    }
}
