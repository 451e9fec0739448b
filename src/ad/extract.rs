//! Ad extractor: one ad URL in, one validated record out

use crate::ad::AdRecord;
use crate::crawler::{parse_ad_page, Transport};
use crate::url::parse_ad_url;
use crate::{AdkeepError, Result};
use url::Url;

/// Fetches an ad page and turns it into a complete record
///
/// Slug and id are taken from the URL before anything is fetched, so a
/// malformed URL never causes network traffic.
///
/// # Returns
///
/// * `Ok(AdRecord)` - A complete record with derived fields filled in
/// * `Err(AdkeepError::UrlError)` - The URL has too few segments
/// * `Err(AdkeepError::Fetch)` - The page could not be retrieved
/// * `Err(AdkeepError::IncompleteAd)` - Mandatory fields are missing, the
///   page markup has most likely changed
pub async fn extract_ad(transport: &Transport, url: &str) -> Result<AdRecord> {
    let (slug, id) = parse_ad_url(url)?;
    let page_url = Url::parse(url)?;

    tracing::debug!(url, "fetching ad page");
    let body = transport.get(url).await?;
    let html = String::from_utf8_lossy(&body);

    let mut ad = AdRecord::new(slug, id);
    parse_ad_page(&html, &page_url, &mut ad);

    ad.join_category();
    ad.decode_attributes();

    if ad.incomplete() {
        tracing::debug!(
            url,
            category = %ad.category,
            created = %ad.created,
            body_size = ad.text.len(),
            "ad page lacks mandatory fields"
        );
        return Err(AdkeepError::IncompleteAd {
            url: url.to_string(),
        });
    }

    ad.calculate_expire();

    tracing::debug!(ad = %ad, "extracted ad listing");
    Ok(ad)
}
