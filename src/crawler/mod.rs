//! Crawler module for fetching and processing marketplace pages
//!
//! This module contains the core backup logic, including:
//! - HTTP fetching with retry logic and a shared cookie jar
//! - HTML parsing of listing pages and ad pages
//! - Pagination over a user's ad listing
//! - Overall backup coordination

mod coordinator;
mod fetcher;
mod listing;
mod parser;

pub use coordinator::{run_backup, Coordinator};
pub use fetcher::{
    build_http_client, correlation_id, FetchError, RetryPolicy, Transport, RETRYABLE_STATUSES,
};
pub use listing::ListingCrawler;
pub use parser::{extract_ad_links, parse_ad_page};
