// store config
// consistency config
// log config

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub consistency: ConsistencyConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    pub mongodb: MongoDbConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MongoDbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsistencyConfig {
    /// how often a versioned write is retried after losing a race
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub reject_duplicate_requests: bool,
}

fn default_retries() -> u32 {
    3
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            max_retries: default_retries(),
            reject_duplicate_requests: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// directory for the rolling log file; stdout when absent
    #[serde(default)]
    pub output: Option<String>,
}

fn default_level() -> String {
    "debug".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            output: None,
        }
    }
}

impl Config {
    pub fn load(filename: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(filename.as_ref()).map_err(|e| {
            Error::new(
                crate::errors::ErrorKind::ConfigReadError,
                format!("{}: {}", filename.as_ref().display(), e),
                e,
            )
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

impl MongoDbConfig {
    pub fn server_url(&self) -> String {
        match (self.user.is_empty(), self.password.is_empty()) {
            (true, _) => format!("mongodb://{}:{}", self.host, self.port),
            (false, true) => format!("mongodb://{}@{}:{}", self.user, self.host, self.port),
            (false, false) => format!(
                "mongodb://{}:{}@{}:{}",
                self.user, self.password, self.host, self.port
            ),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/{}", self.server_url(), self.database)
    }
}

impl LogConfig {
    pub fn level(&self) -> tracing::Level {
        self.level.parse().unwrap_or(tracing::Level::DEBUG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load() {
        let config = Config::load("./fixtures/social.yml").unwrap();
        println!("{:?}", config);
        assert_eq!(config.store.kind, StoreKind::Memory);
        assert_eq!(config.store.mongodb.host, "localhost");
        assert_eq!(config.store.mongodb.port, 27017);
        assert_eq!(config.store.mongodb.database, "social");
        assert_eq!(config.consistency.max_retries, 3);
        assert!(!config.consistency.reject_duplicate_requests);
        assert_eq!(config.log.level(), tracing::Level::DEBUG);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let yaml = "store:\n  mongodb:\n    host: db\n    port: 27018\n    user: root\n    password: ''\n    database: s\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.store.kind, StoreKind::Memory);
        assert_eq!(config.consistency.max_retries, 3);
        assert!(config.log.output.is_none());
        assert_eq!(config.store.mongodb.url(), "mongodb://root@db:27018/s");
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::load("./fixtures/absent.yml").unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::ConfigReadError);
    }
}
