//! Link crawler for a user's ad listing
//!
//! The listing has no known page count. Pages are requested one after another
//! starting at page 1, and the first page without ad links ends the crawl.

use crate::config::SiteConfig;
use crate::crawler::fetcher::Transport;
use crate::crawler::parser::extract_ad_links;
use crate::url::{listing_page_url, parse_base_url};
use crate::{AdkeepError, Result};
use futures::stream::{self, Stream, TryStreamExt};

/// Crawls the ad listing of one user
#[derive(Debug, Clone)]
pub struct ListingCrawler {
    transport: Transport,
    base_url: String,
    listing_path: String,
    user: u64,
}

impl ListingCrawler {
    /// Creates a crawler
    ///
    /// # Arguments
    ///
    /// * `transport` - Shared HTTP transport
    /// * `site` - Base URL and listing path of the marketplace
    /// * `user` - The user whose ads are listed
    pub fn new(transport: Transport, site: &SiteConfig, user: u64) -> Self {
        Self {
            transport,
            base_url: site.base_url.clone(),
            listing_path: site.listing_path.clone(),
            user,
        }
    }

    /// Fetches one listing page and returns its ad links
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<String>> {
        let page_url = listing_page_url(&self.base_url, &self.listing_path, self.user, page);
        let base = parse_base_url(&page_url)?;

        let body = self.transport.get(&page_url).await?;
        let links = extract_ad_links(&String::from_utf8_lossy(&body), &base);

        tracing::debug!(page, url = %page_url, links = links.len(), "fetched listing page");
        Ok(links)
    }

    /// Lazily yields the ad links of each listing page
    ///
    /// The stream ends before the first page without links. A failed page
    /// is yielded as an error and ends the stream.
    pub fn pages(&self) -> impl Stream<Item = Result<Vec<String>>> + '_ {
        stream::try_unfold(1u32, move |page| async move {
            let links = self.fetch_page(page).await?;

            if links.is_empty() {
                tracing::debug!(page, "listing page is empty, crawl finished");
                return Ok(None);
            }

            Ok::<_, AdkeepError>(Some((links, page + 1)))
        })
    }

    /// Lazily yields every ad link of the listing in page order
    pub fn links(&self) -> impl Stream<Item = Result<String>> + '_ {
        self.pages()
            .map_ok(|links| stream::iter(links.into_iter().map(Ok::<_, AdkeepError>)))
            .try_flatten()
    }

    /// Crawls the whole listing
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - All ad links, possibly empty
    /// * `Err(AdkeepError)` - A listing page could not be fetched
    pub async fn collect(&self) -> Result<Vec<String>> {
        let links: Vec<String> = self.pages().try_concat().await?;
        tracing::info!(user = self.user, ads = links.len(), "crawled ad listing");
        Ok(links)
    }
}
