//! Shared crawl counters
//!
//! One `CrawlStats` aggregate is shared by the frontier, the capture
//! workers, and the Kafka consumer's admission check. Counters are plain
//! atomics; the URI rate is a sliding one-second window.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Atomic counters shared across the crawl engine
#[derive(Debug)]
pub struct CrawlStats {
    queued: AtomicI64,
    crawled: AtomicU64,
    active_workers: AtomicI64,
    rate: RateWindow,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            queued: AtomicI64::new(0),
            crawled: AtomicU64::new(0),
            active_workers: AtomicI64::new(0),
            rate: RateWindow::new(Duration::from_secs(1)),
        }
    }

    /// Adjusts the queue-depth gauge by `delta`
    pub fn add_queued(&self, delta: i64) {
        self.queued.fetch_add(delta, Ordering::Relaxed);
    }

    /// Current queue depth, including in-flight assets
    pub fn queued(&self) -> i64 {
        self.queued.load(Ordering::Relaxed)
    }

    /// Records one successful capture
    pub fn incr_crawled(&self) {
        self.crawled.fetch_add(1, Ordering::Relaxed);
        self.rate.record();
    }

    /// Total successful captures so far
    pub fn crawled(&self) -> u64 {
        self.crawled.load(Ordering::Relaxed)
    }

    pub fn worker_started(&self) {
        self.active_workers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn worker_finished(&self) {
        self.active_workers.fetch_sub(1, Ordering::Relaxed);
    }

    /// Number of workers currently inside a capture
    pub fn active_workers(&self) -> i64 {
        self.active_workers.load(Ordering::Relaxed)
    }

    /// URIs captured in the last second
    pub fn uri_rate(&self) -> usize {
        self.rate.rate()
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Sliding-window event rate
///
/// Stores the timestamp of each recorded event and counts those younger
/// than the window on read.
#[derive(Debug)]
struct RateWindow {
    window: Duration,
    samples: Mutex<VecDeque<Instant>>,
}

impl RateWindow {
    fn new(window: Duration) -> Self {
        Self {
            window,
            samples: Mutex::new(VecDeque::new()),
        }
    }

    fn record(&self) {
        let now = Instant::now();
        if let Ok(mut samples) = self.samples.lock() {
            Self::prune(&mut samples, now, self.window);
            samples.push_back(now);
        }
    }

    fn rate(&self) -> usize {
        match self.samples.lock() {
            Ok(mut samples) => {
                Self::prune(&mut samples, Instant::now(), self.window);
                samples.len()
            }
            Err(_) => 0,
        }
    }

    fn prune(samples: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(front) = samples.front() {
            if now.duration_since(*front) > window {
                samples.pop_front();
            } else {
                break;
            }
        }
    }
}
