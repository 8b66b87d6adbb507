//! Server configuration from the environment.

use raidplan_core::FileStorage;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_ADDR: &str = "0.0.0.0:3030";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid RAIDPLAN_ADDR {value:?}: {source}")]
    Addr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("no data directory: {0}")]
    DataDir(String),
}

/// Where plans are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    Files(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub storage: StorageConfig,
}

impl ServerConfig {
    /// Read `RAIDPLAN_ADDR`, `RAIDPLAN_DATA_DIR` and `RAIDPLAN_IN_MEMORY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_addr = lookup("RAIDPLAN_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = raw_addr.parse().map_err(|source| ConfigError::Addr {
            value: raw_addr.clone(),
            source,
        })?;

        let in_memory = lookup("RAIDPLAN_IN_MEMORY")
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
        let storage = if in_memory {
            StorageConfig::Memory
        } else {
            match lookup("RAIDPLAN_DATA_DIR") {
                Some(dir) if !dir.is_empty() => StorageConfig::Files(PathBuf::from(dir)),
                _ => StorageConfig::Files(
                    FileStorage::default_path().map_err(|e| ConfigError::DataDir(e.to_string()))?,
                ),
            }
        };
        Ok(Self { addr, storage })
    }
}
