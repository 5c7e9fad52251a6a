//! Outlink producer
//!
//! Drains the in-process outlink channel into the outlinks topic. A
//! produce failure pushes the item back onto the local frontier so work
//! is never dropped when the broker is unreachable.

use crate::config::KafkaConfig;
use crate::crawler::Crawl;
use crate::item::Item;
use crate::kafka::FeedMessage;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Kafka producer for discovered outlinks
pub struct KafkaProducer {
    producer: FutureProducer,
    topic: String,
    delivery_timeout: Duration,
}

impl KafkaProducer {
    /// Creates the producer client
    ///
    /// Failure here is fatal to engine startup.
    pub fn new(config: &KafkaConfig) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", config.brokers.join(","))
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .create()?;

        Ok(Self {
            producer,
            topic: config.outlinks_topic.clone(),
            delivery_timeout: Duration::from_millis(config.message_timeout_ms),
        })
    }

    /// Drains the outlink channel until it closes, then flushes
    ///
    /// The delivery result is awaited per message; an error, including a
    /// broker outage surfacing as a delivery timeout, falls back to the
    /// local frontier.
    pub async fn run(self, crawl: Arc<Crawl>, mut outlinks: mpsc::Receiver<Arc<Item>>) {
        while let Some(item) = outlinks.recv().await {
            if crawl.finished() {
                break;
            }
            self.produce(&crawl, item).await;
        }

        // Wait for outstanding deliveries before shutting down
        if let Err(e) = self.producer.flush(Timeout::After(Duration::from_secs(15))) {
            tracing::warn!(error = %e, "Kafka producer flush failed during shutdown");
        }
    }

    /// Produces one outlink record, falling back to the frontier on error
    pub async fn produce(&self, crawl: &Arc<Crawl>, item: Arc<Item>) {
        let message = FeedMessage::from_item(&item);
        let payload = match serde_json::to_vec(&message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, url = %item.url, "unable to serialize outlink message");
                return;
            }
        };

        let record = FutureRecord::to(&self.topic)
            .payload(&payload)
            .key(item.url.as_str());

        match self
            .producer
            .send(record, Timeout::After(self.delivery_timeout))
            .await
        {
            Ok((partition, offset)) => {
                tracing::debug!(partition, offset, url = %item.url, "outlink delivered");
            }
            Err((e, _)) => {
                tracing::warn!(
                    error = %e,
                    url = %item.url,
                    "failed to produce outlink, pushing the seed to the local queue instead"
                );
                crawl.frontier.push(item).await;
            }
        }
    }
}
