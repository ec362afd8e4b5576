//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows, TTLs and timeouts > 0)
//! - Keep the per-domain budget below the per-client budget
//! - Check that addresses, URLs and header values parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint on `config`.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let admission = &config.admission;
    if admission.window_ms == 0 {
        errors.push(ValidationError::new("admission.window_ms", "must be greater than 0"));
    }
    if admission.client_max == 0 {
        errors.push(ValidationError::new("admission.client_max", "must be greater than 0"));
    }
    if admission.domain_max == 0 {
        errors.push(ValidationError::new("admission.domain_max", "must be greater than 0"));
    }
    if admission.domain_max >= admission.client_max {
        errors.push(ValidationError::new(
            "admission.domain_max",
            format!(
                "must be lower than admission.client_max ({} >= {})",
                admission.domain_max, admission.client_max
            ),
        ));
    }
    if !(0.0..=1.0).contains(&admission.sweep_probability) {
        errors.push(ValidationError::new(
            "admission.sweep_probability",
            "must be between 0 and 1",
        ));
    }

    if config.cache.ttl_ms == 0 {
        errors.push(ValidationError::new("cache.ttl_ms", "must be greater than 0"));
    }
    if config.cache.max_entries == 0 {
        errors.push(ValidationError::new("cache.max_entries", "must be greater than 0"));
    }

    let upstream = &config.upstream;
    if upstream.timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.timeout_secs", "must be greater than 0"));
    }
    if upstream.user_agents.is_empty() {
        errors.push(ValidationError::new("upstream.user_agents", "must not be empty"));
    }
    for agent in &upstream.user_agents {
        if HeaderValue::from_str(agent).is_err() {
            errors.push(ValidationError::new(
                "upstream.user_agents",
                format!("'{agent}' is not a valid header value"),
            ));
        }
    }
    for (field, value) in [
        ("upstream.accept", &upstream.accept),
        ("upstream.accept_language", &upstream.accept_language),
        ("upstream.referer", &upstream.referer),
    ] {
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::new(field, "not a valid header value"));
        }
    }

    if config.timeouts.request_secs <= upstream.timeout_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be longer than upstream.timeout_secs",
        ));
    }

    let navigation = &config.navigation;
    if Url::parse(&navigation.gateway_url).is_err() {
        errors.push(ValidationError::new(
            "navigation.gateway_url",
            format!("'{}' is not a URL", navigation.gateway_url),
        ));
    }
    if !navigation.proxy_path.starts_with('/') {
        errors.push(ValidationError::new("navigation.proxy_path", "must start with '/'"));
    }
    if navigation.base_delay_ms == 0 {
        errors.push(ValidationError::new("navigation.base_delay_ms", "must be greater than 0"));
    }
    if navigation.max_delay_ms < navigation.base_delay_ms {
        errors.push(ValidationError::new(
            "navigation.max_delay_ms",
            "must not be lower than navigation.base_delay_ms",
        ));
    }

    if navigation.load_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "navigation.load_timeout_secs",
            "must be greater than 0",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        config.admission.window_ms = 0;
        config.cache.ttl_ms = 0;
        config.upstream.user_agents.clear();
        config.navigation.proxy_path = "api/proxy".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();

        assert!(fields.contains(&"admission.window_ms"));
        assert!(fields.contains(&"cache.ttl_ms"));
        assert!(fields.contains(&"upstream.user_agents"));
        assert!(fields.contains(&"navigation.proxy_path"));
    }

    #[test]
    fn domain_budget_must_be_below_client_budget() {
        let mut config = GatewayConfig::default();
        config.admission.domain_max = config.admission.client_max;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "admission.domain_max");
    }

    #[test]
    fn request_timeout_must_outlast_upstream_timeout() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = config.upstream.timeout_secs;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");

        config.timeouts.request_secs = config.upstream.timeout_secs + 1;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn rejects_header_breaking_user_agent() {
        let mut config = GatewayConfig::default();
        config.upstream.user_agents = vec!["bad\nagent".into()];

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "upstream.user_agents"));
    }
}
