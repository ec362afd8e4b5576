//! The proxy pipeline: admission, cache, fetch, cache write.
//!
//! # Responsibilities
//! - Reject a missing target before touching any budget
//! - Check admission before the cache, and the cache before the network
//! - Store successful fetches for later replay
//!
//! # Design Decisions
//! - Each request runs the pipeline independently; there is no cross-request
//!   lock beyond the per-key atomicity of the stores
//! - Concurrent fetches of one URL may both write; the later write wins with
//!   equivalent data

use std::sync::Arc;

use crate::cache::{CacheEntry, ResponseCache};
use crate::clock::Clock;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, StartupError};
use crate::security::rate_limit::{Admission, AdmissionController};
use crate::upstream::{Fetcher, HttpFetcher, UpstreamResponse};

/// Terminal outcome of one proxy request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    CacheHit(CacheEntry),
    Fetched(UpstreamResponse),
    Failed(GatewayError),
}

impl GatewayOutcome {
    /// Short label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            GatewayOutcome::CacheHit(_) => "cache_hit",
            GatewayOutcome::Fetched(_) => "fetched",
            GatewayOutcome::Failed(_) => "failed",
        }
    }
}

#[derive(Clone)]
pub struct Gateway {
    admission: Arc<AdmissionController>,
    cache: Arc<ResponseCache>,
    fetcher: Arc<dyn Fetcher>,
}

impl Gateway {
    pub fn new(
        admission: Arc<AdmissionController>,
        cache: Arc<ResponseCache>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            admission,
            cache,
            fetcher,
        }
    }

    /// Assemble the pipeline from configuration with in-memory stores.
    pub fn from_config(config: &GatewayConfig, clock: Arc<dyn Clock>) -> Result<Self, StartupError> {
        let admission = AdmissionController::new(config.admission.clone(), clock.clone());
        let cache = ResponseCache::new(&config.cache, clock);
        let fetcher = HttpFetcher::new(&config.upstream)?;

        Ok(Self::new(
            Arc::new(admission),
            Arc::new(cache),
            Arc::new(fetcher),
        ))
    }

    /// Run one request for `target` on behalf of `client_id`.
    pub async fn handle(&self, target: Option<&str>, client_id: &str) -> GatewayOutcome {
        let target = match target.filter(|t| !t.trim().is_empty()) {
            Some(target) => target,
            None => return GatewayOutcome::Failed(GatewayError::MissingTarget),
        };

        if let Admission::Deny(denial) = self.admission.admit(client_id, Some(target)) {
            return GatewayOutcome::Failed(denial.into());
        }

        if let Some(entry) = self.cache.lookup(target) {
            tracing::debug!(client = %client_id, url = %target, "Cache hit");
            return GatewayOutcome::CacheHit(entry);
        }

        match self.fetcher.fetch(target).await {
            Ok(response) => {
                self.cache.store(
                    target,
                    response.status,
                    response.payload.clone(),
                    response.content_type.clone(),
                );
                GatewayOutcome::Fetched(response)
            }
            Err(failure) => GatewayOutcome::Failed(failure.into()),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("admission", &self.admission)
            .field("cache", &self.cache)
            .finish()
    }
}
