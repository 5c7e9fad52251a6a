//! Seed feed consumer
//!
//! Polls the feed topic and pushes received seeds into the frontier.
//! Ingestion is admission-controlled against the local worker pool: when
//! fewer than a tenth of the workers are idle, the consumer pauses so
//! remote work cannot overwhelm a saturated instance.

use crate::config::KafkaConfig;
use crate::crawler::Crawl;
use crate::kafka::FeedMessage;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Upper bound on Kafka reads in flight, independent of the crawl worker
/// count
const KAFKA_WORKERS: usize = 16;

/// How long one read waits for a message
const READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Pause after a failed or empty read
const READ_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Kafka consumer feeding remote seeds into the frontier
pub struct KafkaConsumer {
    consumer: Arc<StreamConsumer>,
    brokers: String,
    group: String,
    topic: String,
}

impl KafkaConsumer {
    /// Creates the consumer client and subscribes to the feed topic
    ///
    /// Failure here is fatal to engine startup.
    pub fn new(config: &KafkaConfig) -> Result<Self, KafkaError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", config.brokers.join(","))
            .set("group.id", &config.consumer_group)
            .set("auto.offset.reset", "earliest")
            .create()?;

        consumer.subscribe(&[config.feed_topic.as_str()])?;

        Ok(Self {
            consumer: Arc::new(consumer),
            brokers: config.brokers.join(","),
            group: config.consumer_group.clone(),
            topic: config.feed_topic.clone(),
        })
    }

    /// Runs the ingestion loop until shutdown
    pub async fn run(self, crawl: Arc<Crawl>) {
        tracing::info!(
            brokers = %self.brokers,
            group = %self.group,
            topic = %self.topic,
            "Kafka consumer started, it may take some time to actually start pulling messages"
        );

        let pool = Arc::new(Semaphore::new(KAFKA_WORKERS));

        loop {
            if crawl.finished() {
                // Wait for in-flight reads before closing
                let _ = pool.acquire_many(KAFKA_WORKERS as u32).await;
                break;
            }

            if workers_saturated(crawl.stats.active_workers(), crawl.workers) {
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }

            let Ok(permit) = Arc::clone(&pool).acquire_owned().await else {
                break;
            };
            let consumer = Arc::clone(&self.consumer);
            let crawl = Arc::clone(&crawl);

            tokio::spawn(async move {
                let _permit = permit;

                let message = match tokio::time::timeout(READ_TIMEOUT, consumer.recv()).await {
                    Ok(Ok(message)) => message.detach(),
                    Ok(Err(e)) => {
                        tracing::debug!(error = %e, "unable to read message from Kafka");
                        tokio::time::sleep(READ_RETRY_DELAY).await;
                        return;
                    }
                    Err(_) => {
                        tracing::debug!("no message from Kafka within read deadline");
                        tokio::time::sleep(READ_RETRY_DELAY).await;
                        return;
                    }
                };

                let payload = message.payload().unwrap_or_default();
                tracing::debug!(
                    value = %String::from_utf8_lossy(payload),
                    "new message received from Kafka"
                );

                let decoded: FeedMessage = match serde_json::from_slice(payload) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        tracing::warn!(error = %e, "unable to decode message from Kafka");
                        return;
                    }
                };

                let item = match decoded.into_item() {
                    Ok(item) => item,
                    Err(e) => {
                        tracing::warn!(error = %e, "unable to parse URL from Kafka message");
                        return;
                    }
                };

                crawl.frontier.push(item).await;
            });
        }
    }
}

/// Admission-control predicate: true when fewer than a tenth of the
/// workers are idle
fn workers_saturated(active_workers: i64, workers: usize) -> bool {
    active_workers >= (workers - workers / 10) as i64
}
