//! Configuration Module
//!
//! Handles loading and managing worker configuration from environment variables.

use std::env;

/// Worker configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP port the worker listens on
    pub server_port: u16,
    /// Origin requests are forwarded to when their URL is relative
    pub upstream_origin: String,
    /// Name of the cache holding navigated documents
    pub document_cache: String,
    /// Name of the cache holding route loader data
    pub data_cache: String,
    /// Name of the cache holding static assets
    pub asset_cache: String,
    /// TTL in seconds for entries in the data cache
    pub data_ttl: u64,
    /// Maximum number of entries per cache
    pub max_items: usize,
    /// Deadline in seconds for the network-first strategy
    pub network_timeout: u64,
    /// URL path prefixes classified as asset requests
    pub asset_prefixes: Vec<String>,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP port (default: 3000)
    /// - `UPSTREAM_ORIGIN` - forward origin (default: <http://localhost:8080>)
    /// - `DOCUMENT_CACHE` / `DATA_CACHE` / `ASSET_CACHE` - cache names
    /// - `DATA_TTL` - data cache TTL in seconds (default: 7 days)
    /// - `MAX_ITEMS` - per-cache entry cap (default: 100)
    /// - `NETWORK_TIMEOUT` - network-first deadline in seconds (default: 10)
    /// - `ASSET_PREFIXES` - comma-separated path prefixes (default: `/build/,/icons`)
    /// - `CLEANUP_INTERVAL` - sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            upstream_origin: env::var("UPSTREAM_ORIGIN").unwrap_or(defaults.upstream_origin),
            document_cache: env::var("DOCUMENT_CACHE").unwrap_or(defaults.document_cache),
            data_cache: env::var("DATA_CACHE").unwrap_or(defaults.data_cache),
            asset_cache: env::var("ASSET_CACHE").unwrap_or(defaults.asset_cache),
            data_ttl: env::var("DATA_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.data_ttl),
            max_items: env::var("MAX_ITEMS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_items),
            network_timeout: env::var("NETWORK_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.network_timeout),
            asset_prefixes: env::var("ASSET_PREFIXES")
                .map(|v| {
                    v.split(',')
                        .map(|p| p.trim().to_string())
                        .filter(|p| !p.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.asset_prefixes),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            upstream_origin: "http://localhost:8080".to_string(),
            document_cache: "page-cache".to_string(),
            data_cache: "data-cache".to_string(),
            asset_cache: "assets-cache".to_string(),
            data_ttl: 60 * 60 * 24 * 7, // 7 days
            max_items: 100,
            network_timeout: 10,
            asset_prefixes: vec!["/build/".to_string(), "/icons".to_string()],
            cleanup_interval: 60,
        }
    }
}
