//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:6200").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Public address of this service (`host:port`).
    ///
    /// Used as the event URL in notifications and, when set, COPY
    /// destinations carrying an authority must name this service.
    #[serde(default)]
    pub service_url: Option<String>,
    /// Compression applied to uploaded chunk bodies.
    #[serde(default)]
    pub compression: CompressionConfig,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:6200".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            service_url: None,
            compression: CompressionConfig::default(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl ServerConfig {
    /// URL reported in notifications: the configured service URL, or the
    /// bind address when none is set.
    pub fn advertised_url(&self) -> &str {
        self.service_url.as_deref().unwrap_or(&self.bind)
    }
}

/// Compression algorithm configuration.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompressionConfig {
    /// Store bodies as received.
    #[default]
    None,
    /// Zlib-deflate bodies before they reach the repository.
    Zlib,
}

impl CompressionConfig {
    /// Tag persisted in the compression attribute, if any.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Zlib => Some(crate::metadata::COMPRESSION_ZLIB),
        }
    }

    pub fn is_enabled(self) -> bool {
        self != Self::None
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for chunks.
        path: PathBuf,
        /// Hex characters per directory level.
        #[serde(default = "default_hash_width")]
        hash_width: usize,
        /// Number of directory levels above each chunk.
        #[serde(default = "default_hash_depth")]
        hash_depth: usize,
        /// Flush data and attribute files to disk on commit.
        #[serde(default = "default_fsync")]
        fsync: bool,
    },
}

fn default_hash_width() -> usize {
    3
}

fn default_hash_depth() -> usize {
    1
}

fn default_fsync() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/rawx"),
            hash_width: default_hash_width(),
            hash_depth: default_hash_depth(),
            fsync: default_fsync(),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::Filesystem {
                hash_width,
                hash_depth,
                ..
            } => {
                if *hash_width == 0 && *hash_depth > 0 {
                    return Err("hash_width must be positive when hash_depth is set".to_string());
                }
                if hash_width.saturating_mul(*hash_depth) > crate::CHUNK_ID_LEN {
                    return Err(format!(
                        "hash_width * hash_depth must not exceed {} characters",
                        crate::CHUNK_ID_LEN
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Chunk event notification configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotifyConfig {
    /// Discard events.
    None,
    /// Emit events as structured log lines.
    #[default]
    Log,
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Notification configuration.
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Notifications are discarded and files are not
    /// fsynced.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::Filesystem {
                path: PathBuf::from("./data/rawx-test"),
                hash_width: default_hash_width(),
                hash_depth: default_hash_depth(),
                fsync: false,
            },
            notify: NotifyConfig::None,
        }
    }
}
