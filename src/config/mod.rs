//! Application configuration, loaded from a TOML file with environment
//! overrides for secrets — writes defaults on first run, then reads
//! them back on every subsequent start.

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub health: HealthConfig,
    pub ingestion: IngestionConfig,
    pub matching: MatchingConfig,
    pub upstream: UpstreamConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    pub interval_seconds: u64,
    pub concurrency: usize,
    pub samples_per_source: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    pub max_channels_per_source: usize,
    pub channel_matcher_interval_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub index_threshold: f64,
    pub store_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub sports_api_base_url: String,
    pub sports_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub score_poll_interval_seconds: u64,
    pub schedule_sync_interval_hours: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://./roost-sports.db".to_string(),
                max_connections: 15,
            },
            web: WebConfig {
                host: "0.0.0.0".to_string(),
                port: 8090,
            },
            health: HealthConfig {
                interval_seconds: 300,
                concurrency: 20,
                samples_per_source: 5,
            },
            ingestion: IngestionConfig {
                max_channels_per_source: 10_000,
                channel_matcher_interval_hours: 24,
            },
            matching: MatchingConfig {
                index_threshold: 0.70,
                store_threshold: 0.82,
            },
            upstream: UpstreamConfig {
                sports_api_base_url: "https://www.thesportsdb.com/api/v1/json/3".to_string(),
                sports_api_key: None,
            },
            schedule: ScheduleConfig {
                score_poll_interval_seconds: 30,
                schedule_sync_interval_hours: 24,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if std::path::Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(path, contents)?;
            Ok(default_config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.health.interval_seconds, config.health.interval_seconds);
        assert_eq!(parsed.matching.store_threshold, config.matching.store_threshold);
    }
}
