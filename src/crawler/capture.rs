//! Capture engine: fetch, log, extract, enqueue, archive assets
//!
//! `capture` is the top-level work function executed by the worker pool.
//! Outlink enqueueing runs concurrently with asset capture so the asset
//! loop is never blocked by frontier backpressure; assets themselves are
//! captured inline and serially so the parent page's cookies and referer
//! propagate to every subresource request.

use crate::crawler::extractor;
use crate::crawler::Crawl;
use crate::frontier::Frontier;
use crate::item::{Item, ItemType};
use reqwest::header::{HeaderValue, CONTENT_TYPE, COOKIE, REFERER};
use reqwest::{Method, Request};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use url::Url;

impl Crawl {
    /// Captures one item: fetch, log, enqueue outlinks, capture assets
    ///
    /// All failures are handled here; nothing propagates past the capture
    /// boundary.
    pub async fn capture(&self, item: Arc<Item>) {
        let started = Instant::now();

        let mut req = Request::new(Method::GET, item.url.clone());
        let referer = match (item.hop > 0, item.parent_url()) {
            (true, Some(parent_url)) => parent_url.as_str().to_string(),
            _ => item.url.host_str().unwrap_or_default().to_string(),
        };
        if let Ok(value) = HeaderValue::from_str(&referer) {
            req.headers_mut().insert(REFERER, value);
        }

        let resp = match self.fetcher.execute_get(Arc::clone(&item), req).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = %e, url = %item.url, "request failed");
                return;
            }
        };

        let status = resp.status().as_u16();
        self.stats.incr_crawled();
        self.log_crawl_success(started, status, &item);

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("text/") {
            return;
        }

        // Base URL for resolving relative references, and the cookies to
        // forward to asset requests, both taken before the body consumes
        // the response.
        let base = resp.url().clone();
        let cookies: Vec<(String, String)> = resp
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, url = %item.url, "failed to read response body");
                return;
            }
        };

        if item.hop < self.max_hops {
            let outlinks = extractor::extract_outlinks(&base, &body);
            let frontier = Arc::clone(&self.frontier);
            let outlinks_tx = self.outlink_sender();
            let parent = Arc::clone(&item);
            tokio::spawn(async move {
                queue_outlinks(outlinks, parent, frontier, outlinks_tx).await;
            });
        }

        let assets = extractor::extract_assets(&base, &body);

        // Assets in flight are counted as queued even though they bypass
        // the frontier.
        self.stats.add_queued(assets.len() as i64);
        for asset_url in assets {
            self.stats.add_queued(-1);

            if asset_url == item.url {
                continue;
            }

            let asset = Item::asset_of(asset_url, &item);
            if let Err(e) = self.capture_asset(Arc::clone(&asset), &cookies).await {
                tracing::warn!(
                    error = %e,
                    queued = self.stats.queued(),
                    crawled = self.stats.crawled(),
                    rate = self.stats.uri_rate(),
                    active_workers = self.stats.active_workers(),
                    parent_hop = item.hop,
                    parent_url = %item.url,
                    kind = "asset",
                    "{}", asset.url
                );
                continue;
            }
        }
    }

    /// Captures a single asset in the context of its parent page
    ///
    /// The parent's cookies are attached and the Referer points at the
    /// parent URL. Every asset item carries a parent by construction.
    pub(crate) async fn capture_asset(
        &self,
        item: Arc<Item>,
        cookies: &[(String, String)],
    ) -> Result<(), reqwest::Error> {
        let started = Instant::now();

        if self.asset_seencheck {
            let key = item.hash_key();
            match self.seencheck.is_seen(&key) {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(error = %e, url = %item.url, "seencheck probe failed, treating as unseen");
                }
            }
            if let Err(e) = self.seencheck.mark(&key, item.kind.as_str()) {
                tracing::warn!(error = %e, url = %item.url, "failed to mark asset as seen");
            }
        }

        let mut req = Request::new(Method::GET, item.url.clone());
        if let Some(parent_url) = item.parent_url() {
            if let Ok(value) = HeaderValue::from_str(parent_url.as_str()) {
                req.headers_mut().insert(REFERER, value);
            }
        }
        if !cookies.is_empty() {
            let header = cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            if let Ok(value) = HeaderValue::from_str(&header) {
                req.headers_mut().insert(COOKIE, value);
            }
        }

        let resp = self.fetcher.execute_get(Arc::clone(&item), req).await?;

        let status = resp.status().as_u16();
        self.stats.incr_crawled();
        self.log_crawl_success(started, status, &item);

        Ok(())
    }

    /// Emits the single success record for a completed fetch
    fn log_crawl_success(&self, started: Instant, status_code: u16, item: &Item) {
        tracing::info!(
            queued = self.stats.queued(),
            crawled = self.stats.crawled(),
            rate = self.stats.uri_rate(),
            status_code,
            active_workers = self.stats.active_workers(),
            hop = item.hop,
            kind = item.kind.as_str(),
            execution_time_ms = started.elapsed().as_millis() as u64,
            "{}", item.url
        );
    }
}

/// Enqueues discovered outlinks as new seeds
///
/// Each outlink goes to the Kafka producer channel when the bridge is up,
/// otherwise to the local frontier. A closed channel falls back to the
/// frontier so no outlink is dropped during shutdown.
async fn queue_outlinks(
    outlinks: Vec<Url>,
    parent: Arc<Item>,
    frontier: Arc<Frontier>,
    outlinks_tx: Option<mpsc::Sender<Arc<Item>>>,
) {
    for url in outlinks {
        let child = Item::new(url, Some(Arc::clone(&parent)), ItemType::Seed, parent.hop + 1);
        match &outlinks_tx {
            Some(tx) => {
                if let Err(e) = tx.send(child).await {
                    frontier.push(e.0).await;
                }
            }
            None => frontier.push(child).await,
        }
    }
}
