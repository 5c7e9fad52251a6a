use serde::Deserialize;

/// Main configuration structure for Driftnet
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub seencheck: SeencheckConfig,
    #[serde(default)]
    pub kafka: Option<KafkaConfig>,
    #[serde(default)]
    pub seeds: Vec<String>,
}

/// Crawl engine behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent capture workers
    pub workers: usize,

    /// Maximum number of seed-to-seed link traversals from an origin seed
    #[serde(rename = "max-hops")]
    pub max_hops: u8,

    /// Maximum length of an HTTP redirect chain
    #[serde(rename = "max-redirect")]
    pub max_redirect: u8,

    /// Whether asset captures consult the seencheck store
    ///
    /// Seed dedup is always on through the frontier gate.
    #[serde(rename = "asset-seencheck", default)]
    pub asset_seencheck: bool,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent on every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Optional proxy URL for the proxied transport
    #[serde(default)]
    pub proxy: Option<String>,

    /// Host substrings that bypass the proxy and use the direct transport
    #[serde(rename = "bypass-proxy", default)]
    pub bypass_proxy: Vec<String>,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_request_timeout() -> u64 {
    30
}

/// Seencheck store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SeencheckConfig {
    /// Path to the SQLite database holding seen URL hashes
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Kafka bridge configuration
///
/// When this section is absent the crawler runs purely on its local queue.
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    /// Broker bootstrap list
    pub brokers: Vec<String>,

    /// Topic that discovered outlinks are produced to
    #[serde(rename = "outlinks-topic")]
    pub outlinks_topic: String,

    /// Topic that seed work is consumed from
    #[serde(rename = "feed-topic")]
    pub feed_topic: String,

    /// Consumer group identifier
    #[serde(rename = "consumer-group")]
    pub consumer_group: String,

    /// Produce delivery deadline in milliseconds
    #[serde(rename = "message-timeout-ms", default = "default_message_timeout_ms")]
    pub message_timeout_ms: u64,
}

fn default_message_timeout_ms() -> u64 {
    15_000
}
