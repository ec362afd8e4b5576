//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway
//! and its client. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};

/// Browser user agents rotated per outbound request.
pub const DEFAULT_USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:90.0) Gecko/20100101 Firefox/90.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
];

/// Root configuration for the relay gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Per-client and per-domain admission windows.
    pub admission: AdmissionConfig,

    /// Short-lived response cache.
    pub cache: CacheConfig,

    /// Outbound request shaping.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Client navigation engine settings.
    pub navigation: NavigationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
        }
    }
}

/// Admission control configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Enable admission control.
    pub enabled: bool,

    /// Window length shared by both counters, in milliseconds.
    pub window_ms: u64,

    /// Requests allowed per client per window.
    pub client_max: u32,

    /// Requests allowed per (client, target domain) per window.
    pub domain_max: u32,

    /// Chance that an admitted request also sweeps stale windows.
    pub sweep_probability: f64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 60_000,
            client_max: 30,
            domain_max: 10,
            sweep_probability: 0.01,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable response caching.
    pub enabled: bool,

    /// Entry lifetime in milliseconds.
    pub ttl_ms: u64,

    /// Soft ceiling on entry count before an expiry sweep runs.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_ms: 30_000,
            max_entries: 100,
        }
    }
}

/// Outbound request configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Total time allowed for one upstream fetch, in seconds.
    pub timeout_secs: u64,

    /// Redirects followed before giving up.
    pub max_redirects: usize,

    /// Pool of user agents, one picked at random per request.
    pub user_agents: Vec<String>,

    /// `Accept` header sent upstream.
    pub accept: String,

    /// `Accept-Language` header sent upstream.
    pub accept_language: String,

    /// `Referer` header sent upstream.
    pub referer: String,

    /// Cooldown reported when an upstream 429 carries no usable `Retry-After`.
    pub default_retry_after_secs: u64,

    /// Honor `HTTP_PROXY`/`HTTPS_PROXY` for outbound requests.
    pub use_system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_redirects: 5,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            referer: "https://www.google.com/".to_string(),
            default_retry_after_secs: 60,
            use_system_proxy: false,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Client navigation engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Base URL of the gateway the client talks to.
    pub gateway_url: String,

    /// Path of the proxy endpoint on the gateway.
    pub proxy_path: String,

    /// Page loaded by `home()`.
    pub home_url: String,

    /// Prefix for free-text searches; the encoded query is appended.
    pub search_url: String,

    /// Automatic retries after a transport failure before giving up.
    pub max_retries: u32,

    /// First backoff delay in milliseconds; doubles per attempt.
    pub base_delay_ms: u64,

    /// Ceiling for the exponential backoff, in milliseconds.
    pub max_delay_ms: u64,

    /// Ceiling for a server-provided rate-limit cooldown, in milliseconds.
    pub rate_limit_max_delay_ms: u64,

    /// Total time allowed for one load through the gateway, in seconds.
    pub load_timeout_secs: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://localhost:3001".to_string(),
            proxy_path: "/api/proxy".to_string(),
            home_url: "https://www.google.com".to_string(),
            search_url: "https://www.google.com/search?q=".to_string(),
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            rate_limit_max_delay_ms: 60_000,
            load_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [admission]
            client_max = 50

            [navigation]
            max_retries = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.admission.client_max, 50);
        assert_eq!(config.admission.domain_max, 10);
        assert_eq!(config.admission.window_ms, 60_000);
        assert_eq!(config.navigation.max_retries, 5);
        assert_eq!(config.cache.ttl_ms, 30_000);
        assert_eq!(config.upstream.user_agents.len(), 4);
    }
}
