//! Content loading through the gateway.
//!
//! # Responsibilities
//! - Issue the load for a target URL through the gateway's proxy endpoint
//! - Report completion or transport failure tagged with the load's token
//! - Recognize gateway error bodies among delivered pages
//!
//! # Design Decisions
//! - Starting a load aborts the previous in-flight one
//! - Results are delivered as events; the engine decides what is stale

use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::NavigationConfig;
use crate::error::{ErrorBody, NavigationError};
use crate::http::response::X_RELAY_CACHE;
use crate::navigation::driver::BrowserEvent;
use crate::navigation::state::LoadToken;

/// Something that can start loading a URL and later signal the outcome.
pub trait LoadSurface {
    fn load(&mut self, url: &str, token: LoadToken);

    /// Abandon the in-flight load, if any.
    fn abort(&mut self) {}
}

/// Response delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPage {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
    /// The gateway marked this as relayed upstream content.
    pub relayed: bool,
}

impl LoadedPage {
    /// The gateway's own error body, if this page is one.
    pub fn gateway_error(&self) -> Option<ErrorBody> {
        if self.relayed || self.status < 400 {
            return None;
        }
        let is_json = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/json"));
        if !is_json {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }
}

/// [`LoadSurface`] that fetches through the gateway with `reqwest`.
#[derive(Debug)]
pub struct HttpSurface {
    client: reqwest::Client,
    proxy_base: Url,
    events: mpsc::UnboundedSender<BrowserEvent>,
    in_flight: Option<JoinHandle<()>>,
}

impl HttpSurface {
    pub fn new(
        config: &NavigationConfig,
        events: mpsc::UnboundedSender<BrowserEvent>,
    ) -> Result<Self, NavigationError> {
        let proxy_base = Url::parse(&config.gateway_url)?.join(&config.proxy_path)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.load_timeout_secs))
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            proxy_base,
            events,
            in_flight: None,
        })
    }

    /// Gateway URL that fetches `target`.
    pub fn proxy_url(&self, target: &str) -> Url {
        let mut url = self.proxy_base.clone();
        url.query_pairs_mut().clear().append_pair("url", target);
        url
    }
}

impl LoadSurface for HttpSurface {
    fn load(&mut self, url: &str, token: LoadToken) {
        self.abort();

        let client = self.client.clone();
        let events = self.events.clone();
        let request_url = self.proxy_url(url);

        self.in_flight = Some(tokio::spawn(async move {
            let event = match fetch_page(&client, request_url).await {
                Ok(page) => BrowserEvent::Loaded { token, page },
                Err(e) => BrowserEvent::LoadFailed {
                    token,
                    error: e.to_string(),
                },
            };
            let _ = events.send(event);
        }));
    }

    fn abort(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

impl Drop for HttpSurface {
    fn drop(&mut self) {
        self.abort();
    }
}

async fn fetch_page(client: &reqwest::Client, url: Url) -> Result<LoadedPage, reqwest::Error> {
    let response = client.get(url).send().await?;
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let relayed = response.headers().contains_key(X_RELAY_CACHE);
    let body = response.bytes().await?;

    Ok(LoadedPage {
        status,
        content_type,
        body,
        relayed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, GatewayError};

    fn page(status: u16, content_type: Option<&str>, body: Vec<u8>, relayed: bool) -> LoadedPage {
        LoadedPage {
            status,
            content_type: content_type.map(str::to_owned),
            body: Bytes::from(body),
            relayed,
        }
    }

    #[test]
    fn recognizes_gateway_error_body() {
        let body = serde_json::to_vec(&GatewayError::Timeout.to_body()).unwrap();
        let page = page(504, Some("application/json"), body, false);

        assert_eq!(page.gateway_error().unwrap().kind, ErrorKind::Timeout);
    }

    #[test]
    fn relayed_json_is_content() {
        let body = serde_json::to_vec(&GatewayError::Timeout.to_body()).unwrap();
        let page = page(404, Some("application/json"), body, true);

        assert!(page.gateway_error().is_none());
    }

    #[test]
    fn unrelated_json_is_content() {
        let page = page(500, Some("application/json"), br#"{"message":"x"}"#.to_vec(), false);
        assert!(page.gateway_error().is_none());
    }

    #[test]
    fn success_is_never_an_error() {
        let body = serde_json::to_vec(&GatewayError::Timeout.to_body()).unwrap();
        let page = page(200, Some("application/json"), body, false);
        assert!(page.gateway_error().is_none());
    }

    #[test]
    fn builds_proxy_url() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let surface = HttpSurface::new(&NavigationConfig::default(), tx).unwrap();

        let url = surface.proxy_url("https://example.com/a?b=c&d=e");
        assert_eq!(url.path(), "/api/proxy");
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "url");
        assert_eq!(value, "https://example.com/a?b=c&d=e");
    }
}
