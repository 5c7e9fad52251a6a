//! Persistent seen-URL tracking
//!
//! The seencheck store is the only persistent artifact of the crawl engine:
//! a durable set of URL hashes that have already been captured or queued.
//! The frontier consults it to deduplicate seeds; asset captures may
//! optionally consult it as well.

mod sqlite;

pub use sqlite::SqliteSeencheck;

use thiserror::Error;

/// Errors that can occur during seencheck operations
#[derive(Debug, Error)]
pub enum SeencheckError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Seencheck store lock poisoned")]
    Poisoned,
}

/// Result type for seencheck operations
pub type SeencheckResult<T> = Result<T, SeencheckError>;

/// Trait for seencheck backends
///
/// Implementations must be safe for many concurrent readers and writers
/// and must persist marks durably across process exit. Callers treat a
/// probe error as "not seen" so that storage trouble never silently drops
/// work.
pub trait Seencheck: Send + Sync {
    /// Probes whether a URL hash has been recorded
    fn is_seen(&self, hash: &str) -> SeencheckResult<bool>;

    /// Records a URL hash with its item kind
    ///
    /// Idempotent: marking an existing hash again, even with a different
    /// kind, leaves the stored record unchanged.
    fn mark(&self, hash: &str, kind: &str) -> SeencheckResult<()>;
}
