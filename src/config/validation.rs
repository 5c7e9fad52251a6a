use crate::config::types::{Config, CrawlerConfig, HttpConfig, KafkaConfig, SeencheckConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_seencheck_config(&config.seencheck)?;
    if let Some(kafka) = &config.kafka {
        validate_kafka_config(kafka)?;
    }
    validate_seeds(config)?;
    Ok(())
}

/// Validates crawl engine configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 1024 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 1024, got {}",
            config.workers
        )));
    }

    if config.max_redirect < 1 {
        return Err(ConfigError::Validation(format!(
            "max-redirect must be >= 1, got {}",
            config.max_redirect
        )));
    }

    Ok(())
}

/// Validates HTTP transport configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if let Some(proxy) = &config.proxy {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy URL '{}': {}", proxy, e)))?;
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be >= 1 second, got {}",
            config.request_timeout
        )));
    }

    Ok(())
}

/// Validates seencheck store configuration
fn validate_seencheck_config(config: &SeencheckConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates Kafka bridge configuration
fn validate_kafka_config(config: &KafkaConfig) -> Result<(), ConfigError> {
    if config.brokers.is_empty() {
        return Err(ConfigError::Validation(
            "kafka brokers cannot be empty".to_string(),
        ));
    }

    for field in [
        ("outlinks-topic", &config.outlinks_topic),
        ("feed-topic", &config.feed_topic),
        ("consumer-group", &config.consumer_group),
    ] {
        if field.1.is_empty() {
            return Err(ConfigError::Validation(format!(
                "kafka {} cannot be empty",
                field.0
            )));
        }
    }

    Ok(())
}

/// Validates the seed list
///
/// Seeds may be empty only when the Kafka bridge is configured, since a
/// bridged crawler receives its work from the feed topic.
fn validate_seeds(config: &Config) -> Result<(), ConfigError> {
    if config.seeds.is_empty() && config.kafka.is_none() {
        return Err(ConfigError::Validation(
            "at least one seed is required when kafka is not configured".to_string(),
        ));
    }

    for seed in &config.seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use the http or https scheme",
                seed
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            crawler: CrawlerConfig {
                workers: 8,
                max_hops: 2,
                max_redirect: 20,
                asset_seencheck: false,
            },
            http: HttpConfig {
                user_agent: "driftnet/0.3".to_string(),
                proxy: None,
                bypass_proxy: vec![],
                request_timeout: 30,
            },
            seencheck: SeencheckConfig {
                database_path: "./seen.db".to_string(),
            },
            kafka: None,
            seeds: vec!["https://example.com/".to_string()],
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = base_config();
        config.crawler.workers = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_user_agent_rejected() {
        let mut config = base_config();
        config.http.user_agent = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let mut config = base_config();
        config.http.proxy = Some("not a proxy url".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_non_http_seed_rejected() {
        let mut config = base_config();
        config.seeds = vec!["ftp://example.com/".to_string()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_seeds_require_kafka() {
        let mut config = base_config();
        config.seeds = vec![];
        assert!(validate(&config).is_err());

        config.kafka = Some(KafkaConfig {
            brokers: vec!["localhost:9092".to_string()],
            outlinks_topic: "outlinks".to_string(),
            feed_topic: "feed".to_string(),
            consumer_group: "driftnet".to_string(),
            message_timeout_ms: 15_000,
        });
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_kafka_without_brokers_rejected() {
        let mut config = base_config();
        config.kafka = Some(KafkaConfig {
            brokers: vec![],
            outlinks_topic: "outlinks".to_string(),
            feed_topic: "feed".to_string(),
            consumer_group: "driftnet".to_string(),
            message_timeout_ms: 15_000,
        });
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
