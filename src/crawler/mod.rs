//! Crawl engine: context aggregate, capture workers, orchestration
//!
//! This module contains the core crawling logic, including:
//! - The `Crawl` context shared by all workers
//! - HTTP fetching with bounded redirect following
//! - Outlink and asset extraction
//! - The capture engine and worker pool
//! - Overall crawl orchestration

mod capture;
mod extractor;
mod fetcher;
mod worker;

pub use extractor::{extract_assets, extract_outlinks};
pub use fetcher::{build_http_client, HttpFetcher};
pub use worker::WorkerPool;

use crate::config::Config;
use crate::frontier::Frontier;
use crate::item::{Item, ItemType};
use crate::kafka::{KafkaConsumer, KafkaProducer};
use crate::seencheck::{Seencheck, SqliteSeencheck};
use crate::stats::CrawlStats;
use crate::url::normalize_url;
use crate::DriftnetError;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Shared context for one crawl engine instance
///
/// Everything the workers, the capture engine, and the Kafka bridge need
/// hangs off this aggregate; tests can instantiate several engines side
/// by side since nothing here is process-global.
pub struct Crawl {
    /// Number of capture workers; the Kafka admission check is relative
    /// to this
    pub workers: usize,

    /// Items at this hop are fetched but their outlinks are discarded
    pub max_hops: u8,

    /// Whether asset captures consult the seencheck store
    pub asset_seencheck: bool,

    pub fetcher: HttpFetcher,
    pub frontier: Arc<Frontier>,
    pub seencheck: Arc<dyn Seencheck>,
    pub stats: Arc<CrawlStats>,

    finished: AtomicBool,
    outlinks_tx: Mutex<Option<mpsc::Sender<Arc<Item>>>>,
}

impl Crawl {
    /// Builds a crawl context from configuration
    pub fn new(
        config: &Config,
        seencheck: Arc<dyn Seencheck>,
        outlinks_tx: Option<mpsc::Sender<Arc<Item>>>,
    ) -> Result<Self, DriftnetError> {
        let stats = Arc::new(CrawlStats::new());
        let frontier = Arc::new(Frontier::new(Arc::clone(&seencheck), Arc::clone(&stats)));
        let fetcher = HttpFetcher::new(&config.http, config.crawler.max_redirect)?;

        Ok(Self {
            workers: config.crawler.workers,
            max_hops: config.crawler.max_hops,
            asset_seencheck: config.crawler.asset_seencheck,
            fetcher,
            frontier,
            seencheck,
            stats,
            finished: AtomicBool::new(false),
            outlinks_tx: Mutex::new(outlinks_tx),
        })
    }

    /// Whether orderly shutdown has been requested
    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Requests orderly shutdown
    ///
    /// Workers drain their current item; the frontier wakes all waiters;
    /// the outlink channel closes so the Kafka producer can flush and
    /// exit.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Release);
        self.frontier.shutdown();
        if let Ok(mut tx) = self.outlinks_tx.lock() {
            tx.take();
        }
    }

    /// Clone of the outlink channel sender, if the Kafka bridge is up
    pub(crate) fn outlink_sender(&self) -> Option<mpsc::Sender<Arc<Item>>> {
        self.outlinks_tx.lock().ok().and_then(|tx| tx.clone())
    }

    /// Normalizes and enqueues the configured seed URLs at hop zero
    pub async fn load_seeds(&self, seeds: &[String]) {
        for seed in seeds {
            match normalize_url(seed) {
                Ok(url) => {
                    let item = Item::new(url, None, ItemType::Seed, 0);
                    self.frontier.push(item).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, seed = %seed, "skipping invalid seed URL");
                }
            }
        }
    }
}

/// Runs a complete crawl from configuration
///
/// Builds the seencheck store and the crawl context, wires up the Kafka
/// bridge when configured, loads the seeds, and runs the worker pool
/// until the work dries up (local mode) or shutdown is signalled.
///
/// Kafka client construction failures are fatal here, before any worker
/// starts; once the engine is running no single item failure can stop it.
pub async fn crawl(config: Config) -> Result<(), DriftnetError> {
    let seencheck: Arc<dyn Seencheck> = Arc::new(SqliteSeencheck::new(Path::new(
        &config.seencheck.database_path,
    ))?);

    let mut kafka_handles = Vec::new();

    let crawl = match &config.kafka {
        Some(kafka_config) => {
            let producer = KafkaProducer::new(kafka_config)?;
            let consumer = KafkaConsumer::new(kafka_config)?;
            let (outlinks_tx, outlinks_rx) = mpsc::channel(1024);

            let crawl = Arc::new(Crawl::new(&config, seencheck, Some(outlinks_tx))?);

            kafka_handles.push(tokio::spawn({
                let crawl = Arc::clone(&crawl);
                async move { producer.run(crawl, outlinks_rx).await }
            }));
            kafka_handles.push(tokio::spawn({
                let crawl = Arc::clone(&crawl);
                async move { consumer.run(crawl).await }
            }));

            crawl
        }
        None => Arc::new(Crawl::new(&config, seencheck, None)?),
    };

    crawl.load_seeds(&config.seeds).await;

    let pool = WorkerPool::spawn(&crawl, crawl.workers);

    // Ctrl-C triggers orderly shutdown in either mode.
    tokio::spawn({
        let crawl = Arc::clone(&crawl);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received, draining workers");
                crawl.finish();
            }
        }
    });

    // Without a Kafka feed there is no external work source, so the crawl
    // ends once the frontier drains and every worker goes idle.
    if config.kafka.is_none() {
        let crawl = Arc::clone(&crawl);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(250)).await;
                if crawl.stats.queued() == 0 && crawl.stats.active_workers() == 0 {
                    // Confirm idleness on a second look before finishing
                    tokio::time::sleep(Duration::from_millis(250)).await;
                    if crawl.stats.queued() == 0 && crawl.stats.active_workers() == 0 {
                        crawl.finish();
                        break;
                    }
                }
            }
        });
    }

    pool.wait().await;
    crawl.finish();

    for handle in kafka_handles {
        let _ = handle.await;
    }

    Ok(())
}
