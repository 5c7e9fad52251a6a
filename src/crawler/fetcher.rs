//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the direct and proxied HTTP clients
//! - GET execution with transport selection per request host
//! - Manual redirect following with a hard chain cap

use crate::config::HttpConfig;
use crate::item::Item;
use reqwest::header::{HeaderValue, ACCEPT_ENCODING, LOCATION, REFERER, USER_AGENT};
use reqwest::{redirect::Policy, Client, Method, Request, Response};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with the crawler's transport configuration
///
/// Redirects are handled manually by [`HttpFetcher::execute_get`] so the
/// client's own redirect policy is disabled.
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the proxied variant of the HTTP client, if a proxy is configured
pub fn build_proxied_client(config: &HttpConfig) -> Result<Option<Client>, reqwest::Error> {
    let Some(proxy_url) = &config.proxy else {
        return Ok(None);
    };

    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .proxy(reqwest::Proxy::all(proxy_url)?)
        .build()?;

    Ok(Some(client))
}

/// Executes GET requests through a direct or proxied transport
///
/// Both clients are shared and own their connection pools; the fetcher is
/// cheap to share behind the crawl context.
pub struct HttpFetcher {
    client: Client,
    client_proxied: Option<Client>,
    bypass_proxy: Vec<String>,
    user_agent: String,
    max_redirect: u8,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig, max_redirect: u8) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            client_proxied: build_proxied_client(config)?,
            bypass_proxy: config.bypass_proxy.clone(),
            user_agent: config.user_agent.clone(),
            max_redirect,
        })
    }

    /// Picks the transport for a request URL
    ///
    /// The direct client is used when no proxy is configured or when the
    /// host matches any bypass substring.
    fn client_for(&self, url: &Url) -> &Client {
        match &self.client_proxied {
            Some(proxied) if !self.host_bypasses_proxy(url) => proxied,
            _ => &self.client,
        }
    }

    fn host_bypasses_proxy(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("");
        self.bypass_proxy
            .iter()
            .any(|entry| host.contains(entry.as_str()))
    }

    /// Issues a GET request and follows its redirect chain
    ///
    /// On a 3xx response with a `Location` header, a child item is built
    /// with the same kind and hop and an incremented redirect count, and
    /// the fetch recurses with fresh headers on the new request. The chain
    /// stops, returning the current response as-is, when the Location
    /// points back at the request URL, the chain length reaches the cap,
    /// or the Location cannot be resolved.
    pub async fn execute_get(
        &self,
        item: Arc<Item>,
        req: Request,
    ) -> Result<Response, reqwest::Error> {
        let req_url = req.url().clone();
        let resp = self.client_for(&req_url).execute(req).await?;

        if !resp.status().is_redirection() {
            return Ok(resp);
        }

        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let Some(location) = location else {
            return Ok(resp);
        };

        if location == req_url.as_str() || item.redirect >= self.max_redirect {
            return Ok(resp);
        }

        // Absolute Location, or relative resolved against the request URL
        let target = match Url::parse(&location).or_else(|_| req_url.join(&location)) {
            Ok(url) => url,
            Err(_) => return Ok(resp),
        };
        if target == req_url {
            return Ok(resp);
        }

        let next = Item::redirected(target, &item);

        let mut new_req = Request::new(Method::GET, next.url.clone());
        let headers = new_req.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, value);
        }
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("*/*"));
        if let Some(parent_url) = next.parent_url() {
            if let Ok(value) = HeaderValue::from_str(parent_url.as_str()) {
                headers.insert(REFERER, value);
            }
        }

        Box::pin(self.execute_get(next, new_req)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> HttpConfig {
        HttpConfig {
            user_agent: "driftnet-test/0.3".to_string(),
            proxy: None,
            bypass_proxy: vec!["internal.example.com".to_string()],
            request_timeout: 5,
        }
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&test_config()).is_ok());
    }

    #[test]
    fn test_no_proxy_configured_yields_none() {
        assert!(build_proxied_client(&test_config()).unwrap().is_none());
    }

    #[test]
    fn test_proxied_client_built_when_configured() {
        let mut config = test_config();
        config.proxy = Some("http://proxy.example.com:8080".to_string());
        assert!(build_proxied_client(&config).unwrap().is_some());
    }

    #[test]
    fn test_bypass_matches_host_substring() {
        let fetcher = HttpFetcher::new(&test_config(), 5).unwrap();

        let bypassed = Url::parse("https://internal.example.com/page").unwrap();
        let external = Url::parse("https://other.example.org/page").unwrap();

        assert!(fetcher.host_bypasses_proxy(&bypassed));
        assert!(!fetcher.host_bypasses_proxy(&external));
    }
}
