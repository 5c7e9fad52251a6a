//! Kafka bridge: outlink producer and seed feed consumer
//!
//! The bridge externalizes outlink emission and ingests seed work from
//! other crawler instances. The wire schema is a compact JSON record:
//!
//! ```json
//! { "u": "<absolute-url>", "hop": 2, "parent_url": "<absolute-url>|\"\"" }
//! ```

mod consumer;
mod producer;

pub use consumer::KafkaConsumer;
pub use producer::KafkaProducer;

use crate::item::{Item, ItemType};
use crate::url::normalize_url;
use crate::UrlError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One record on the feed or outlinks topic
#[derive(Debug, Serialize, Deserialize)]
pub struct FeedMessage {
    /// Absolute URL of the seed
    #[serde(rename = "u")]
    pub url: String,

    /// Hop count of the seed
    pub hop: u8,

    /// URL of the page that discovered the seed; empty when unknown
    #[serde(rename = "parent_url", default)]
    pub parent_url: String,
}

impl FeedMessage {
    /// Builds the wire record for an outlink item
    pub fn from_item(item: &Item) -> Self {
        Self {
            url: item.url.to_string(),
            hop: item.hop,
            parent_url: item
                .parent_url()
                .map(|url| url.to_string())
                .unwrap_or_default(),
        }
    }

    /// Materializes a seed item from a received record
    ///
    /// A non-empty `parent_url` is parsed best-effort into a parent item
    /// one hop above the seed; a parent that fails to parse is dropped
    /// with a warning while the seed itself is kept.
    pub fn into_item(self) -> Result<Arc<Item>, UrlError> {
        let url = normalize_url(&self.url)?;

        let parent = if self.parent_url.is_empty() {
            None
        } else {
            match normalize_url(&self.parent_url) {
                Ok(parent_url) => Some(Item::new(
                    parent_url,
                    None,
                    ItemType::Seed,
                    self.hop.saturating_sub(1),
                )),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        parent_url = %self.parent_url,
                        "unable to parse parent URL from feed message"
                    );
                    None
                }
            }
        };

        Ok(Item::new(url, parent, ItemType::Seed, self.hop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let message = FeedMessage {
            url: "http://c.example/".to_string(),
            hop: 2,
            parent_url: "http://b.example/".to_string(),
        };

        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(
            json,
            r#"{"u":"http://c.example/","hop":2,"parent_url":"http://b.example/"}"#
        );
    }

    #[test]
    fn test_missing_parent_url_decodes_as_empty() {
        let message: FeedMessage = serde_json::from_str(r#"{"u":"http://a.example/","hop":0}"#).unwrap();
        assert_eq!(message.parent_url, "");

        let item = message.into_item().unwrap();
        assert!(item.parent.is_none());
        assert_eq!(item.hop, 0);
    }

    #[test]
    fn test_into_item_builds_parent_one_hop_above() {
        let message: FeedMessage = serde_json::from_str(
            r#"{"u":"http://c.example/","hop":2,"parent_url":"http://b.example/"}"#,
        )
        .unwrap();

        let item = message.into_item().unwrap();
        assert_eq!(item.hop, 2);
        assert_eq!(item.kind, ItemType::Seed);

        let parent = item.parent.as_ref().unwrap();
        assert_eq!(parent.url.as_str(), "http://b.example/");
        assert_eq!(parent.hop, 1);
    }

    #[test]
    fn test_parent_hop_saturates_at_zero() {
        let message: FeedMessage = serde_json::from_str(
            r#"{"u":"http://c.example/","hop":0,"parent_url":"http://b.example/"}"#,
        )
        .unwrap();

        let item = message.into_item().unwrap();
        assert_eq!(item.parent.as_ref().unwrap().hop, 0);
    }

    #[test]
    fn test_unparseable_parent_is_dropped() {
        let message: FeedMessage = serde_json::from_str(
            r#"{"u":"http://c.example/","hop":1,"parent_url":"::not a url::"}"#,
        )
        .unwrap();

        let item = message.into_item().unwrap();
        assert!(item.parent.is_none());
        assert_eq!(item.hop, 1);
    }

    #[test]
    fn test_unparseable_url_is_an_error() {
        let message: FeedMessage =
            serde_json::from_str(r#"{"u":"not a url","hop":1}"#).unwrap();
        assert!(message.into_item().is_err());
    }

    #[test]
    fn test_from_item_round_trip() {
        let parent = Item::new(
            normalize_url("http://b.example/").unwrap(),
            None,
            ItemType::Seed,
            1,
        );
        let child = Item::new(
            normalize_url("http://c.example/").unwrap(),
            Some(parent),
            ItemType::Seed,
            2,
        );

        let message = FeedMessage::from_item(&child);
        assert_eq!(message.url, "http://c.example/");
        assert_eq!(message.hop, 2);
        assert_eq!(message.parent_url, "http://b.example/");
    }

    #[test]
    fn test_from_item_without_parent_emits_empty_string() {
        let item = Item::new(
            normalize_url("http://a.example/").unwrap(),
            None,
            ItemType::Seed,
            0,
        );

        let json = serde_json::to_string(&FeedMessage::from_item(&item)).unwrap();
        assert!(json.contains(r#""parent_url":"""#));
    }
}
