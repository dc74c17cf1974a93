//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default cache budget: 1 GiB
pub const DEFAULT_CAPACITY_BYTES: u64 = 1024 * 1024 * 1024;
/// Default fraction of the budget eviction drains down to
pub const DEFAULT_EVICTION_TARGET_RATIO: f64 = 0.8;
/// Default DRM license host suffix excluded from caching
pub const DEFAULT_DRM_LICENSE_DOMAIN: &str = "ezdrm.com";

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Byte budget that triggers eviction when exceeded
    pub capacity_bytes: u64,
    /// Eviction drains usage down to `capacity_bytes * eviction_target_ratio`
    pub eviction_target_ratio: f64,
    /// HTTP server port
    pub server_port: u16,
    /// Directory for the disk blob store; `None` keeps blobs in memory
    pub cache_dir: Option<PathBuf>,
    /// Host suffixes of DRM license servers, never cached
    pub drm_license_domains: Vec<String>,
    /// Upstream request timeout in seconds
    pub fetch_timeout: u64,
    /// Interval in seconds between usage log lines
    pub stats_log_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY_BYTES` - Byte budget (default: 1 GiB)
    /// - `EVICTION_TARGET_RATIO` - Drain target in (0, 1] (default: 0.8)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_DIR` - Disk store directory (default: unset, in-memory store)
    /// - `DRM_LICENSE_DOMAINS` - Comma-separated host suffixes (default: ezdrm.com)
    /// - `FETCH_TIMEOUT_SECS` - Upstream timeout in seconds (default: 30)
    /// - `STATS_LOG_INTERVAL` - Usage log frequency in seconds (default: 2)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let eviction_target_ratio = parse_var("EVICTION_TARGET_RATIO")
            .filter(|ratio: &f64| ratio.is_finite() && *ratio > 0.0 && *ratio <= 1.0)
            .unwrap_or(defaults.eviction_target_ratio);

        let drm_license_domains = env::var("DRM_LICENSE_DOMAINS")
            .ok()
            .map(|raw| parse_domain_list(&raw))
            .filter(|domains| !domains.is_empty())
            .unwrap_or(defaults.drm_license_domains);

        Self {
            capacity_bytes: parse_var("CACHE_CAPACITY_BYTES").unwrap_or(defaults.capacity_bytes),
            eviction_target_ratio,
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            drm_license_domains,
            fetch_timeout: parse_var("FETCH_TIMEOUT_SECS").unwrap_or(defaults.fetch_timeout),
            stats_log_interval: parse_var("STATS_LOG_INTERVAL")
                .unwrap_or(defaults.stats_log_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            eviction_target_ratio: DEFAULT_EVICTION_TARGET_RATIO,
            server_port: 3000,
            cache_dir: None,
            drm_license_domains: vec![DEFAULT_DRM_LICENSE_DOMAIN.to_string()],
            fetch_timeout: 30,
            stats_log_interval: 2,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_domain_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|domain| domain.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|domain| !domain.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.capacity_bytes, 1024 * 1024 * 1024);
        assert_eq!(config.eviction_target_ratio, 0.8);
        assert_eq!(config.server_port, 3000);
        assert!(config.cache_dir.is_none());
        assert_eq!(config.drm_license_domains, vec!["ezdrm.com".to_string()]);
        assert_eq!(config.fetch_timeout, 30);
        assert_eq!(config.stats_log_interval, 2);
    }

    #[test]
    fn test_parse_domain_list() {
        let domains = parse_domain_list(" EZDRM.com, .widevine.example ,,");
        assert_eq!(domains, vec!["ezdrm.com", "widevine.example"]);
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the environment to avoid races between tests
        env::remove_var("CACHE_CAPACITY_BYTES");
        env::remove_var("SERVER_PORT");
        env::remove_var("CACHE_DIR");
        env::remove_var("DRM_LICENSE_DOMAINS");
        env::remove_var("FETCH_TIMEOUT_SECS");
        env::remove_var("STATS_LOG_INTERVAL");
        env::set_var("EVICTION_TARGET_RATIO", "1.5");

        let config = Config::from_env();
        assert_eq!(config.capacity_bytes, DEFAULT_CAPACITY_BYTES);
        assert_eq!(config.eviction_target_ratio, DEFAULT_EVICTION_TARGET_RATIO);
        assert_eq!(config.server_port, 3000);
        assert!(config.cache_dir.is_none());

        env::set_var("EVICTION_TARGET_RATIO", "0.5");
        env::set_var("CACHE_CAPACITY_BYTES", "4096");
        let config = Config::from_env();
        assert_eq!(config.eviction_target_ratio, 0.5);
        assert_eq!(config.capacity_bytes, 4096);

        env::remove_var("EVICTION_TARGET_RATIO");
        env::remove_var("CACHE_CAPACITY_BYTES");
    }
}
