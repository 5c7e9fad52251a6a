//! URL normalization and hashing
//!
//! Every URL entering the crawl engine is normalized here so that the
//! seencheck store and the frontier dedup gate operate on a canonical form.

use crate::UrlError;
use sha2::{Digest, Sha256};
use url::Url;

/// Normalizes a URL for crawling
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than http/https
/// 3. Lowercase the host
/// 4. Remove the fragment (everything after #)
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use driftnet::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.COM/page#section").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) => {
            let lowered = host.to_lowercase();
            if lowered != host {
                url.set_host(Some(&lowered))
                    .map_err(|e| UrlError::Parse(e.to_string()))?;
            }
        }
        None => return Err(UrlError::MissingHost),
    }

    url.set_fragment(None);

    Ok(url)
}

/// Computes the deterministic 64-bit hash of a normalized URL
///
/// The hash is the leading 8 bytes of the SHA-256 digest of the URL string,
/// interpreted big-endian. Its decimal rendering is the seencheck key.
pub fn url_hash(url: &Url) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(url.as_str().as_bytes());
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_host() {
        let url = normalize_url("https://EXAMPLE.com/Path").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        // Path case is preserved
        assert_eq!(url.path(), "/Path");
    }

    #[test]
    fn test_normalize_strips_fragment() {
        let url = normalize_url("https://example.com/page#top").unwrap();
        assert_eq!(url.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_normalize_rejects_non_http_schemes() {
        assert!(matches!(
            normalize_url("ftp://example.com/file"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(matches!(
            normalize_url("mailto:admin@example.com"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_normalize_rejects_malformed() {
        assert!(matches!(
            normalize_url("not a url at all"),
            Err(UrlError::Parse(_))
        ));
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = normalize_url("https://example.com/page").unwrap();
        let b = normalize_url("https://EXAMPLE.com/page#frag").unwrap();
        assert_eq!(url_hash(&a), url_hash(&b));
    }

    #[test]
    fn test_hash_differs_for_distinct_urls() {
        let a = normalize_url("https://example.com/a").unwrap();
        let b = normalize_url("https://example.com/b").unwrap();
        assert_ne!(url_hash(&a), url_hash(&b));
    }
}
