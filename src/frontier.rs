//! Frontier queue: deduplicated, multi-producer/multi-consumer
//!
//! Seeds from the loader, the capture engine, and the Kafka consumer all
//! pass through here. The frontier is the sole serialization point for
//! seed dedup; asset items never enter it.

use crate::item::{Item, ItemType};
use crate::seencheck::Seencheck;
use crate::stats::CrawlStats;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

/// FIFO-ish queue of pending items with a seencheck dedup gate
///
/// Ordering is eventual-delivery only; items may be reordered across
/// producers.
pub struct Frontier {
    queue: Mutex<VecDeque<Arc<Item>>>,
    notify: Notify,
    seencheck: Arc<dyn Seencheck>,
    stats: Arc<CrawlStats>,
    shutdown: AtomicBool,
}

impl Frontier {
    pub fn new(seencheck: Arc<dyn Seencheck>, stats: Arc<CrawlStats>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            seencheck,
            stats,
            shutdown: AtomicBool::new(false),
        }
    }

    /// Enqueues an item, deduplicating seeds against the seencheck store
    ///
    /// A seed whose hash is already recorded is dropped; otherwise it is
    /// marked and admitted. A probe error is treated as "not seen" so
    /// storage trouble never drops work. Asset items are admitted without
    /// consulting the store (they are normally captured inline and only
    /// pass through here in unusual configurations).
    pub async fn push(&self, item: Arc<Item>) {
        if item.kind == ItemType::Seed {
            let key = item.hash_key();
            match self.seencheck.is_seen(&key) {
                Ok(true) => {
                    tracing::trace!(url = %item.url, "seed already seen, skipping");
                    return;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(error = %e, url = %item.url, "seencheck probe failed, treating as unseen");
                }
            }
            if let Err(e) = self.seencheck.mark(&key, item.kind.as_str()) {
                tracing::warn!(error = %e, url = %item.url, "failed to mark seed as seen");
            }
        }

        self.queue.lock().await.push_back(item);
        self.stats.add_queued(1);
        self.notify.notify_one();
    }

    /// Waits for the next item
    ///
    /// Returns `None` once the frontier is shut down and drained.
    pub async fn pop(&self) -> Option<Arc<Item>> {
        loop {
            if let Some(item) = self.queue.lock().await.pop_front() {
                self.stats.add_queued(-1);
                return Some(item);
            }

            if self.shutdown.load(Ordering::Acquire) {
                return None;
            }

            self.notify.notified().await;
        }
    }

    /// Number of items currently queued
    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }

    /// Signals shutdown and wakes all waiting consumers
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }
}
