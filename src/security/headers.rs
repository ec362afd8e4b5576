//! Outbound header shaping.
//!
//! # Responsibilities
//! - Make upstream requests look like they come from a generic browser
//! - Rotate the user agent per request from a fixed pool
//!
//! # Design Decisions
//! - Rotation is per request, not per client, so one client's requests do
//!   not share a fingerprint
//! - The selection function is injectable so tests can pin it
//! - Best-effort evasion of naive bot filters, not a security boundary

use std::sync::Arc;

use axum::http::header::{InvalidHeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use axum::http::{HeaderMap, HeaderValue};
use rand::Rng;

use crate::config::UpstreamConfig;

/// Given the pool size, returns the index to use.
pub type Picker = Arc<dyn Fn(usize) -> usize + Send + Sync>;

/// Fixed pool of user agents with a pluggable selection function.
#[derive(Clone)]
pub struct UserAgentPool {
    agents: Arc<[HeaderValue]>,
    picker: Picker,
}

impl UserAgentPool {
    /// Pool that picks uniformly at random.
    pub fn new<S: AsRef<str>>(agents: &[S]) -> Result<Self, InvalidHeaderValue> {
        Self::with_picker(
            agents,
            Arc::new(|len: usize| rand::thread_rng().gen_range(0..len)),
        )
    }

    pub fn with_picker<S: AsRef<str>>(
        agents: &[S],
        picker: Picker,
    ) -> Result<Self, InvalidHeaderValue> {
        let agents = agents
            .iter()
            .map(|a| HeaderValue::from_str(a.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            agents: agents.into(),
            picker,
        })
    }

    /// Select the user agent for the next request.
    pub fn pick(&self) -> Option<&HeaderValue> {
        if self.agents.is_empty() {
            return None;
        }
        let index = (self.picker)(self.agents.len()) % self.agents.len();
        self.agents.get(index)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl std::fmt::Debug for UserAgentPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAgentPool")
            .field("agents", &self.agents.len())
            .finish()
    }
}

/// The complete browser-like header set sent with every upstream fetch.
#[derive(Debug, Clone)]
pub struct BrowserHeaders {
    user_agents: UserAgentPool,
    accept: HeaderValue,
    accept_language: HeaderValue,
    referer: HeaderValue,
}

impl BrowserHeaders {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, InvalidHeaderValue> {
        Self::with_pool(config, UserAgentPool::new(&config.user_agents)?)
    }

    pub fn with_pool(
        config: &UpstreamConfig,
        user_agents: UserAgentPool,
    ) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            user_agents,
            accept: HeaderValue::from_str(&config.accept)?,
            accept_language: HeaderValue::from_str(&config.accept_language)?,
            referer: HeaderValue::from_str(&config.referer)?,
        })
    }

    /// Build the headers for one request.
    pub fn build(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(4);
        if let Some(agent) = self.user_agents.pick() {
            headers.insert(USER_AGENT, agent.clone());
        }
        headers.insert(ACCEPT, self.accept.clone());
        headers.insert(ACCEPT_LANGUAGE, self.accept_language.clone());
        headers.insert(REFERER, self.referer.clone());
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn pinned_picker_selects_agent() {
        let pool = UserAgentPool::with_picker(&["a", "b", "c"], Arc::new(|_: usize| 1)).unwrap();
        assert_eq!(pool.pick().unwrap(), "b");
    }

    #[test]
    fn rotates_per_request() {
        let next = Arc::new(AtomicUsize::new(0));
        let counter = next.clone();
        let pool = UserAgentPool::with_picker(
            &["a", "b"],
            Arc::new(move |_: usize| counter.fetch_add(1, Ordering::SeqCst)),
        )
        .unwrap();
        let headers = BrowserHeaders::with_pool(&UpstreamConfig::default(), pool).unwrap();

        assert_eq!(headers.build()[USER_AGENT], "a");
        assert_eq!(headers.build()[USER_AGENT], "b");
        assert_eq!(headers.build()[USER_AGENT], "a");
    }

    #[test]
    fn random_pick_stays_in_pool() {
        let config = UpstreamConfig::default();
        let pool = UserAgentPool::new(&config.user_agents).unwrap();
        for _ in 0..50 {
            let agent = pool.pick().unwrap().to_str().unwrap().to_string();
            assert!(config.user_agents.contains(&agent));
        }
    }

    #[test]
    fn builds_generic_browser_headers() {
        let config = UpstreamConfig::default();
        let headers = BrowserHeaders::from_config(&config).unwrap().build();

        assert_eq!(headers[ACCEPT], config.accept.as_str());
        assert_eq!(headers[ACCEPT_LANGUAGE], "en-US,en;q=0.5");
        assert_eq!(headers[REFERER], "https://www.google.com/");
        assert!(headers.contains_key(USER_AGENT));
    }

    #[test]
    fn rejects_invalid_agent() {
        assert!(UserAgentPool::new(&["ok", "bad\r\nagent"]).is_err());
    }
}
