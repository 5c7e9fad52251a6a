//! The unit of work flowing through the crawl engine
//!
//! Items are created by the seed loader, the Kafka consumer, the capture
//! engine (outlinks and assets), and the redirect follower. The parent
//! pointer forms a short-lived reference-counted chain used for `Referer`
//! headers and Kafka parent-URL emission.

use crate::url::url_hash;
use std::sync::Arc;
use url::Url;

/// Classification of a work item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    /// A page to be fetched for outlink extraction
    Seed,
    /// A subresource of a page, fetched but never extracted
    Asset,
}

impl ItemType {
    /// String form used as the seencheck record kind and in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Asset => "asset",
        }
    }
}

/// A single URL to capture, with its discovery context
#[derive(Debug)]
pub struct Item {
    /// Absolute, normalized URL (http or https)
    pub url: Url,

    /// The item that discovered this one, if any
    pub parent: Option<Arc<Item>>,

    /// Seed or asset
    pub kind: ItemType,

    /// Number of seed-to-seed link traversals from the originating seed
    pub hop: u8,

    /// Current length of the redirect chain for this item
    pub redirect: u8,

    /// 64-bit hash of the normalized URL, the seencheck key
    pub hash: u64,
}

impl Item {
    /// Creates a new item
    pub fn new(url: Url, parent: Option<Arc<Item>>, kind: ItemType, hop: u8) -> Arc<Item> {
        let hash = url_hash(&url);
        Arc::new(Self {
            url,
            parent,
            kind,
            hop,
            redirect: 0,
            hash,
        })
    }

    /// Creates an asset item for a subresource of `parent`
    ///
    /// Assets inherit the parent's hop unchanged and always carry a parent.
    pub fn asset_of(url: Url, parent: &Arc<Item>) -> Arc<Item> {
        let hash = url_hash(&url);
        Arc::new(Self {
            url,
            parent: Some(Arc::clone(parent)),
            kind: ItemType::Asset,
            hop: parent.hop,
            redirect: 0,
            hash,
        })
    }

    /// Creates the ephemeral item for one hop of a redirect chain
    ///
    /// Redirect items keep the kind and hop of the item being followed and
    /// never enter the frontier.
    pub fn redirected(url: Url, from: &Arc<Item>) -> Arc<Item> {
        let hash = url_hash(&url);
        Arc::new(Self {
            url,
            parent: Some(Arc::clone(from)),
            kind: from.kind,
            hop: from.hop,
            redirect: from.redirect + 1,
            hash,
        })
    }

    /// Decimal rendering of the URL hash, used as the seencheck key
    pub fn hash_key(&self) -> String {
        self.hash.to_string()
    }

    /// URL of the parent item, if any
    pub fn parent_url(&self) -> Option<&Url> {
        self.parent.as_deref().map(|p| &p.url)
    }
}
