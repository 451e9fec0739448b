//! HTML parser for ad listing pages and ad pages
//!
//! This module maps marketplace markup onto plain values:
//! - Ad links from a page of a user's ad listing
//! - Title, price, dates, body, breadcrumbs, details and images of an ad
//!
//! Selectors that match nothing yield empty values, never errors. Turning an
//! all-empty result into a failure is up to the caller.

use crate::ad::AdRecord;
use crate::url::resolve_link;
use scraper::{ElementRef, Html, Selector};
use url::Url;

const AD_LINK_SELECTOR: &str = ".text-module-begin a[href]";
const TITLE_SELECTOR: &str = "h1";
const PRICE_SELECTOR: &str = "h2#viewad-price";
const CREATED_SELECTOR: &str = "#viewad-extra-info";
const CREATED_DATE_SELECTOR: &str = "#viewad-extra-info span";
const TEXT_SELECTOR: &str = "p#viewad-description-text";
const BREADCRUMB_SELECTOR: &str = ".breadcrump-link";
const DETAILS_SELECTOR: &str = ".addetailslist--detail";
const SHIPPING_SELECTOR: &str = ".boxedarticle--details--shipping";
const IMAGE_SELECTOR: &str = ".galleryimage-element img[src]";

/// Extracts the ad links from one page of a user's ad listing
///
/// # Arguments
///
/// * `html` - The listing page content
/// * `base_url` - The base URL for resolving relative links
///
/// # Returns
///
/// Absolute ad URLs in page order; empty if the page lists no ads
///
/// # Example
///
/// ```
/// use adkeep::crawler::extract_ad_links;
/// use url::Url;
///
/// let html = r#"<h2 class="text-module-begin"><a href="/s-anzeige/chair/1">Chair</a></h2>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// assert_eq!(extract_ad_links(html, &base), vec!["https://example.com/s-anzeige/chair/1"]);
/// ```
pub fn extract_ad_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse(AD_LINK_SELECTOR) {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Populates the content fields of an ad from its page
///
/// Identity fields (`slug`, `id`) are left untouched. Derived fields are
/// computed later by the extractor.
///
/// # Arguments
///
/// * `html` - The ad page content
/// * `page_url` - URL of the ad page, used to resolve relative image URLs
/// * `ad` - The record to fill
pub fn parse_ad_page(html: &str, page_url: &Url, ad: &mut AdRecord) {
    let document = Html::parse_document(html);

    ad.title = first_text(&document, TITLE_SELECTOR).unwrap_or_default();
    ad.price = first_text(&document, PRICE_SELECTOR).unwrap_or_default();
    ad.created = first_text(&document, CREATED_DATE_SELECTOR)
        .or_else(|| first_text(&document, CREATED_SELECTOR))
        .unwrap_or_default();
    ad.text = first_inner_html(&document, TEXT_SELECTOR).unwrap_or_default();
    ad.category_path = all_texts(&document, BREADCRUMB_SELECTOR);
    ad.details = detail_block(&document);
    ad.shipping = first_text(&document, SHIPPING_SELECTOR).unwrap_or_default();
    ad.images = image_sources(&document, page_url);
}

/// Trimmed text of the first element matching `selector` that has any
fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// Trimmed inner HTML of the first element matching `selector`
fn first_inner_html(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.inner_html().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Trimmed, non-empty texts of all elements matching `selector`
fn all_texts(document: &Html, selector: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Flattens the detail list into one text block, one text node per line
///
/// Keys and values end up on alternating non-blank lines, which is what the
/// attribute decoder expects.
fn detail_block(document: &Html) -> String {
    let Ok(selector) = Selector::parse(DETAILS_SELECTOR) else {
        return String::new();
    };

    document
        .select(&selector)
        .flat_map(|element| element.text())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn image_sources(document: &Html, page_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse(IMAGE_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .filter_map(|src| resolve_link(src, page_url))
        .collect()
}
