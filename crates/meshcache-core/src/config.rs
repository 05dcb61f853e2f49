//! Node configuration.
//!
//! Configuration file support via `meshcache.toml`, environment variables
//! and programmatic defaults.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`MESHCACHE_*`)
//! 2. Configuration file (`meshcache.toml`)
//! 3. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Error;
use crate::ring::DEFAULT_REPLICAS;

/// Cache section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// LRU ceiling in bytes. 0 disables eviction.
    pub max_bytes: u64,
    /// Cache values fetched from remote owners (passive replication).
    pub cache_remote: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: 2 << 10,
            cache_remote: true,
        }
    }
}

/// Ring section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Virtual nodes per real peer.
    pub replicas: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
        }
    }
}

/// Cluster membership section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// This node's own base address, e.g. `http://localhost:8001`.
    pub self_addr: String,
    /// Static peer list, own address included.
    pub peers: Vec<String>,
    /// URL prefix for node-to-node fetches.
    pub base_path: String,
    /// Deadline for one peer fetch, in milliseconds.
    pub peer_timeout_ms: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            self_addr: "http://localhost:8001".to_owned(),
            peers: Vec::new(),
            base_path: "/_mesh".to_owned(),
            peer_timeout_ms: 2_000,
        }
    }
}

impl ClusterConfig {
    /// Peer-fetch deadline as a [`Duration`].
    #[must_use]
    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }
}

/// Sentinel section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    /// Whether this node probes its peers.
    pub enabled: bool,
    /// Probe cadence in milliseconds.
    pub probe_interval_ms: u64,
    /// Per-probe deadline in milliseconds.
    pub probe_timeout_ms: u64,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            probe_interval_ms: 2_000,
            probe_timeout_ms: 3_000,
        }
    }
}

impl SentinelConfig {
    /// Probe cadence as a [`Duration`].
    #[must_use]
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Per-probe deadline as a [`Duration`].
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Top-level node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Group name served by this node.
    pub group: String,
    /// Optional client-facing API listener, e.g. `http://localhost:9999`.
    pub api_addr: Option<String>,
    /// Cache section.
    pub cache: CacheConfig,
    /// Ring section.
    pub ring: RingConfig,
    /// Cluster section.
    pub cluster: ClusterConfig,
    /// Sentinel section.
    pub sentinel: SentinelConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            group: "scores".to_owned(),
            api_addr: None,
            cache: CacheConfig::default(),
            ring: RingConfig::default(),
            cluster: ClusterConfig::default(),
            sentinel: SentinelConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Loads configuration from the default sources.
    ///
    /// # Errors
    ///
    /// Returns `Config` if extraction or validation fails.
    pub fn load() -> Result<Self, Error> {
        Self::load_from_path("meshcache.toml")
    }

    /// Loads configuration with an explicit file path.
    ///
    /// # Errors
    ///
    /// Returns `Config` if extraction or validation fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("MESHCACHE_").split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `Config` if parsing or validation fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, Error> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Config` naming the offending key.
    pub fn validate(&self) -> Result<(), Error> {
        if self.group.is_empty() {
            return Err(Error::Config("group: name must not be empty".to_owned()));
        }
        if self.ring.replicas == 0 {
            return Err(Error::Config(
                "ring.replicas: must be at least 1".to_owned(),
            ));
        }
        if !self.cluster.base_path.starts_with('/') {
            return Err(Error::Config(format!(
                "cluster.base_path: '{}' must start with '/'",
                self.cluster.base_path
            )));
        }
        if self.cluster.peer_timeout_ms == 0 {
            return Err(Error::Config(
                "cluster.peer_timeout_ms: must be positive".to_owned(),
            ));
        }
        if self.sentinel.enabled && self.sentinel.probe_interval_ms == 0 {
            return Err(Error::Config(
                "sentinel.probe_interval_ms: must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}
