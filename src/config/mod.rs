//! Configuration module for Adkeep
//!
//! This module handles locating, parsing and validating the TOML
//! configuration file and merging command-line overrides into it.
//!
//! # Example
//!
//! ```no_run
//! use adkeep::config::{load_effective_config, ConfigOverrides};
//!
//! let (config, _source) = load_effective_config(None, ConfigOverrides::default()).unwrap();
//! println!("Writing backups to {}", config.outdir);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_template, Config, RetryConfig, SiteConfig, ThrottleConfig, DEFAULT_AD_NAME_TEMPLATE,
    DEFAULT_BASE_URL, DEFAULT_LISTING_PATH, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{
    config_candidates, find_config_file, load_config, load_effective_config, parse_config_file,
    ConfigOverrides,
};
pub use validation::validate;
