//! Admission control with per-client and per-domain fixed windows.
//!
//! # Responsibilities
//! - Count requests per client address within a window
//! - Count requests per (client, target domain) within the same window
//! - Report which scope denied a request and when its window resets
//! - Reclaim stale windows without a background task
//!
//! # Design Decisions
//! - A window resets the first time it is touched after `window_ms` has
//!   elapsed since it started; bursts of up to twice the budget are possible
//!   across a boundary
//! - Denied requests still count against their window
//! - The domain window is only consulted when the client window admits and
//!   the target URL yields a host
//! - Stale windows are swept inline on a small fraction of admitted requests

use std::sync::Arc;

use url::Url;

use crate::clock::Clock;
use crate::config::AdmissionConfig;
use crate::observability::metrics;
use crate::store::{MemoryStore, Store};

/// Request counter for one client or one (client, domain) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub window_start_ms: u64,
}

impl RateWindow {
    /// Count one more request, starting a fresh window when the old one lapsed.
    fn touch(previous: Option<&RateWindow>, now_ms: u64, window_ms: u64) -> RateWindow {
        match previous {
            Some(w) if now_ms.saturating_sub(w.window_start_ms) <= window_ms => RateWindow {
                count: w.count.saturating_add(1),
                window_start_ms: w.window_start_ms,
            },
            _ => RateWindow {
                count: 1,
                window_start_ms: now_ms,
            },
        }
    }

    /// Whole seconds until this window resets, never less than one.
    pub fn retry_after_secs(&self, now_ms: u64, window_ms: u64) -> u64 {
        let reset_at = self.window_start_ms.saturating_add(window_ms);
        reset_at.saturating_sub(now_ms).div_ceil(1000).max(1)
    }

    fn is_stale(&self, now_ms: u64, window_ms: u64) -> bool {
        self.window_start_ms < now_ms.saturating_sub(window_ms)
    }
}

/// Key of a per-domain window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainKey {
    pub client: String,
    pub domain: String,
}

/// Which window rejected a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionScope {
    Client,
    Domain(String),
}

impl AdmissionScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionScope::Client => "client",
            AdmissionScope::Domain(_) => "domain",
        }
    }
}

/// Why and for how long a request is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub scope: AdmissionScope,
    pub retry_after_secs: u64,
}

/// Admission decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny(Denial),
}

/// Extract the host of `target`, if it parses as a URL with one.
pub fn target_domain(target: &str) -> Option<String> {
    let url = Url::parse(target).ok()?;
    url.host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_owned)
}

/// Gate in front of every proxied request.
pub struct AdmissionController {
    config: AdmissionConfig,
    clients: Arc<dyn Store<String, RateWindow>>,
    domains: Arc<dyn Store<DomainKey, RateWindow>>,
    clock: Arc<dyn Clock>,
}

impl AdmissionController {
    pub fn new(config: AdmissionConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_stores(
            config,
            clock,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    pub fn with_stores(
        config: AdmissionConfig,
        clock: Arc<dyn Clock>,
        clients: Arc<dyn Store<String, RateWindow>>,
        domains: Arc<dyn Store<DomainKey, RateWindow>>,
    ) -> Self {
        Self {
            config,
            clients,
            domains,
            clock,
        }
    }

    /// Decide whether `client_id` may fetch `target` now.
    pub fn admit(&self, client_id: &str, target: Option<&str>) -> Admission {
        if !self.config.enabled {
            return Admission::Allow;
        }

        let now = self.clock.now_ms();
        let window_ms = self.config.window_ms;

        let client_window = self.clients.update(client_id.to_string(), &mut |previous| {
            RateWindow::touch(previous, now, window_ms)
        });

        if client_window.count > self.config.client_max {
            let retry_after_secs = client_window.retry_after_secs(now, window_ms);
            tracing::warn!(
                client = %client_id,
                count = client_window.count,
                retry_after_secs,
                "Client rate limit exceeded"
            );
            metrics::record_rate_limited("client");
            return Admission::Deny(Denial {
                scope: AdmissionScope::Client,
                retry_after_secs,
            });
        }

        if let Some(domain) = target.and_then(target_domain) {
            let key = DomainKey {
                client: client_id.to_string(),
                domain,
            };
            let domain_window = self.domains.update(key.clone(), &mut |previous| {
                RateWindow::touch(previous, now, window_ms)
            });

            if domain_window.count > self.config.domain_max {
                let retry_after_secs = domain_window.retry_after_secs(now, window_ms);
                tracing::warn!(
                    client = %client_id,
                    domain = %key.domain,
                    count = domain_window.count,
                    retry_after_secs,
                    "Domain rate limit exceeded"
                );
                metrics::record_rate_limited("domain");
                return Admission::Deny(Denial {
                    scope: AdmissionScope::Domain(key.domain),
                    retry_after_secs,
                });
            }
        }

        if self.config.sweep_probability > 0.0 && fastrand::f64() < self.config.sweep_probability {
            self.sweep();
        }

        Admission::Allow
    }

    /// Drop every window that started more than one window length ago.
    pub fn sweep(&self) {
        let now = self.clock.now_ms();
        let window_ms = self.config.window_ms;
        let before = self.clients.len() + self.domains.len();

        self.clients
            .retain(&mut |_, window| !window.is_stale(now, window_ms));
        self.domains
            .retain(&mut |_, window| !window.is_stale(now, window_ms));

        let after = self.clients.len() + self.domains.len();
        tracing::debug!(removed = before.saturating_sub(after), remaining = after, "Swept rate windows");
    }
}

impl std::fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionController")
            .field("config", &self.config)
            .field("clients", &self.clients.len())
            .field("domains", &self.domains.len())
            .finish()
    }
}
