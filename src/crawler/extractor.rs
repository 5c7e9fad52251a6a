//! Outlink and asset extraction from HTML documents
//!
//! Relative references are resolved against the base URL of the response
//! they came from. Only http/https results are kept.

use scraper::{Html, Selector};
use url::Url;

/// Extracts anchor-like references that will become new seeds
///
/// Covers `<a href>` and canonical link elements. Download links and
/// non-navigational schemes are skipped.
pub fn extract_outlinks(base: &Url, html: &str) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut outlinks = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_reference(base, href) {
                    outlinks.push(url);
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_reference(base, href) {
                    outlinks.push(url);
                }
            }
        }
    }

    outlinks
}

/// Extracts subresource references to capture inline
///
/// Covers images, scripts, stylesheets, icons, media sources, embeds, and
/// objects.
pub fn extract_assets(base: &Url, html: &str) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut assets = Vec::new();

    let src_selectors = [
        "img[src]",
        "script[src]",
        "source[src]",
        "audio[src]",
        "video[src]",
        "embed[src]",
        "iframe[src]",
    ];
    for selector_str in src_selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            for element in document.select(&selector) {
                if let Some(src) = element.value().attr("src") {
                    if let Some(url) = resolve_reference(base, src) {
                        assets.push(url);
                    }
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("link[rel='stylesheet'][href], link[rel='icon'][href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_reference(base, href) {
                    assets.push(url);
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("object[data]") {
        for element in document.select(&selector) {
            if let Some(data) = element.value().attr("data") {
                if let Some(url) = resolve_reference(base, data) {
                    assets.push(url);
                }
            }
        }
    }

    assets
}

/// Resolves a reference to an absolute URL and filters out non-fetchable ones
///
/// Returns None for:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only references
/// - URLs that fail to resolve or are not http/https
fn resolve_reference(base: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();

    if reference.is_empty() {
        return None;
    }

    if reference.starts_with("javascript:")
        || reference.starts_with("mailto:")
        || reference.starts_with("tel:")
        || reference.starts_with("data:")
    {
        return None;
    }

    if reference.starts_with('#') {
        return None;
    }

    match base.join(reference) {
        Ok(mut url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                return None;
            }
            url.set_fragment(None);
            Some(url)
        }
        Err(_) => None,
    }
}
