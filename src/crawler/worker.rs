//! Worker pool dispatching frontier items to the capture engine

use crate::crawler::Crawl;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A fixed-size pool of capture workers
///
/// Each worker pops items from the frontier until the crawl finishes or
/// the frontier shuts down. In-flight captures always run to completion.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `workers` capture tasks against the shared crawl context
    pub fn spawn(crawl: &Arc<Crawl>, workers: usize) -> Self {
        let handles = (0..workers)
            .map(|worker_id| {
                let crawl = Arc::clone(crawl);
                tokio::spawn(async move {
                    worker_loop(crawl, worker_id).await;
                })
            })
            .collect();

        Self { handles }
    }

    /// Waits for every worker to exit
    pub async fn wait(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn worker_loop(crawl: Arc<Crawl>, worker_id: usize) {
    loop {
        if crawl.finished() {
            break;
        }

        let Some(item) = crawl.frontier.pop().await else {
            break;
        };

        crawl.stats.worker_started();
        crawl.capture(item).await;
        crawl.stats.worker_finished();
    }

    tracing::trace!(worker = worker_id, "worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, HttpConfig, SeencheckConfig};
    use crate::seencheck::SqliteSeencheck;

    fn test_crawl() -> Arc<Crawl> {
        let config = crate::config::Config {
            crawler: CrawlerConfig {
                workers: 2,
                max_hops: 1,
                max_redirect: 5,
                asset_seencheck: false,
            },
            http: HttpConfig {
                user_agent: "driftnet-test/0.3".to_string(),
                proxy: None,
                bypass_proxy: vec![],
                request_timeout: 5,
            },
            seencheck: SeencheckConfig {
                database_path: ":memory:".to_string(),
            },
            kafka: None,
            seeds: vec![],
        };
        let seencheck = Arc::new(SqliteSeencheck::new_in_memory().unwrap());
        Arc::new(Crawl::new(&config, seencheck, None).unwrap())
    }

    #[tokio::test]
    async fn test_workers_exit_on_shutdown() {
        let crawl = test_crawl();
        let pool = WorkerPool::spawn(&crawl, 2);

        crawl.finish();
        pool.wait().await;

        assert_eq!(crawl.stats.active_workers(), 0);
    }
}
