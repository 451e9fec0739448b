//! Output module for writing the backup to disk
//!
//! This module handles:
//! - Rendering the `{{.Field}}` templates for listings and directory names
//! - Writing each ad's directory and `Adlisting.txt`
//! - Recording run statistics

pub mod stats;
mod template;
mod writer;

pub use stats::{print_statistics, BackupStats};
pub use template::{
    RunDate, Template, TemplateError, TemplateFields, AD_FIELDS, RUN_DATE_FIELDS,
};
pub use writer::{normalize_line_breaks, BackupWriter, LISTING_FILE};
