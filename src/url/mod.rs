//! URL handling module for Adkeep
//!
//! This module knows the marketplace's URL shapes: where a user's ad listing
//! lives, how its pages are numbered, and where slug and id sit in an ad URL.

use crate::{UrlError, UrlResult};
use url::Url;

/// Minimum number of `/`-separated segments of an ad URL
///
/// `https://host/s-anzeige/<slug>/<id>` splits into
/// `["https:", "", "host", "s-anzeige", slug, id]`.
const MIN_AD_URL_SEGMENTS: usize = 6;

/// Extracts slug and id from an ad URL
///
/// # Arguments
///
/// * `url` - The full ad URL, e.g. `https://www.kleinanzeigen.de/s-anzeige/chair/123`
///
/// # Returns
///
/// * `Ok((slug, id))` - The URL-derived identity of the ad
/// * `Err(UrlError::InvalidUri)` - The URL has too few path segments
///
/// # Example
///
/// ```
/// use adkeep::url::parse_ad_url;
///
/// let (slug, id) = parse_ad_url("https://example.com/s-anzeige/chair/123").unwrap();
/// assert_eq!(slug, "chair");
/// assert_eq!(id, "123");
/// ```
pub fn parse_ad_url(url: &str) -> UrlResult<(String, String)> {
    let parts: Vec<&str> = url.split('/').collect();
    if parts.len() < MIN_AD_URL_SEGMENTS {
        return Err(UrlError::InvalidUri(url.to_string()));
    }

    let slug = parts[4];
    let id = parts[5]
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    if slug.is_empty() || id.is_empty() {
        return Err(UrlError::InvalidUri(url.to_string()));
    }

    Ok((slug.to_string(), id.to_string()))
}

/// Builds the URL of one page of a user's ad listing
///
/// Page 1 carries only the user id; later pages append `&pageNum=<n>`.
pub fn listing_page_url(base_url: &str, listing_path: &str, user: u64, page: u32) -> String {
    let first = format!(
        "{}{}?userId={}",
        base_url.trim_end_matches('/'),
        listing_path,
        user
    );

    if page <= 1 {
        first
    } else {
        format!("{}&pageNum={}", first, page)
    }
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for empty hrefs, fragment-only links, special schemes
/// (`javascript:`, `mailto:`, `tel:`, `data:`) and anything that does not
/// resolve to http or https.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Parses a base URL, mapping failures to [`UrlError::Parse`]
pub fn parse_base_url(url: &str) -> UrlResult<Url> {
    Url::parse(url).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))
}
