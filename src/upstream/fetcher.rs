//! Outbound HTTP fetch with browser-like headers.
//!
//! # Responsibilities
//! - Reject targets that are not absolute http(s) URLs
//! - Send one GET with the shaped header set
//! - Bound the fetch by a total timeout and a redirect limit
//! - Buffer the payload and report the upstream content type verbatim
//!
//! # Design Decisions
//! - The body is buffered so it can be cached and replayed
//! - System proxy variables are ignored unless explicitly enabled

use std::time::Duration;

use async_trait::async_trait;
use axum::http::header::CONTENT_TYPE;
use bytes::Bytes;
use reqwest::redirect::Policy;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::StartupError;
use crate::observability::metrics;
use crate::security::headers::BrowserHeaders;
use crate::upstream::classify::{classify_status, classify_transport, FetchFailure};

/// A deliverable upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub payload: Bytes,
    pub content_type: Option<String>,
}

/// Performs one outbound fetch and classifies the outcome.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, target: &str) -> Result<UpstreamResponse, FetchFailure>;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    headers: BrowserHeaders,
    default_retry_after_secs: u64,
}

impl HttpFetcher {
    pub fn new(config: &UpstreamConfig) -> Result<Self, StartupError> {
        let headers = BrowserHeaders::from_config(config)?;
        Self::with_headers(config, headers)
    }

    pub fn with_headers(
        config: &UpstreamConfig,
        headers: BrowserHeaders,
    ) -> Result<Self, StartupError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::limited(config.max_redirects));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            headers,
            default_retry_after_secs: config.default_retry_after_secs,
        })
    }

    async fn send(&self, url: Url) -> Result<UpstreamResponse, FetchFailure> {
        let response = self
            .client
            .get(url)
            .headers(self.headers.build())
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        if let Some(failure) =
            classify_status(status, response.headers(), self.default_retry_after_secs)
        {
            return Err(failure);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let payload = response.bytes().await.map_err(|e| classify_transport(&e))?;

        Ok(UpstreamResponse {
            status: status.as_u16(),
            payload,
            content_type,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, target: &str) -> Result<UpstreamResponse, FetchFailure> {
        let url = Url::parse(target)
            .map_err(|e| FetchFailure::RequestSetupFailed(format!("invalid target URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchFailure::RequestSetupFailed(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let result = self.send(url).await;
        match &result {
            Ok(response) => tracing::debug!(
                url = %target,
                status = response.status,
                bytes = response.payload.len(),
                "Upstream responded"
            ),
            Err(failure) => {
                tracing::warn!(url = %target, kind = failure.kind(), error = %failure, "Upstream fetch failed");
                metrics::record_upstream_failure(failure.kind());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `raw` verbatim to every connection after reading the request head.
    async fn raw_origin(raw: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(raw.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        addr
    }

    fn fetcher(timeout_secs: u64) -> HttpFetcher {
        let config = UpstreamConfig {
            timeout_secs,
            ..UpstreamConfig::default()
        };
        HttpFetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn passes_client_errors_through() {
        let addr = raw_origin(
            "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nContent-Length: 4\r\nConnection: close\r\n\r\ngone",
        )
        .await;

        let response = fetcher(5).fetch(&format!("http://{addr}/")).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.payload, Bytes::from_static(b"gone"));
        assert_eq!(response.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn missing_content_type_stays_absent() {
        let addr =
            raw_origin("HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok").await;

        let response = fetcher(5).fetch(&format!("http://{addr}/")).await.unwrap();
        assert_eq!(response.content_type, None);
    }

    #[tokio::test]
    async fn upstream_429_is_rate_limited() {
        let addr = raw_origin(
            "HTTP/1.1 429 Too Many Requests\r\nRetry-After: 5\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let failure = fetcher(5).fetch(&format!("http://{addr}/")).await.unwrap_err();
        assert_eq!(failure, FetchFailure::RateLimitedUpstream { retry_after_secs: 5 });
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let failure = fetcher(5).fetch(&format!("http://{addr}/")).await.unwrap_err();
        assert!(
            matches!(failure, FetchFailure::GatewayUnreachable { connected: false, .. }),
            "{failure:?}"
        );
    }

    #[tokio::test]
    async fn dropped_connection_is_unreachable() {
        let addr = raw_origin("").await;

        let failure = fetcher(5).fetch(&format!("http://{addr}/")).await.unwrap_err();
        assert!(
            matches!(failure, FetchFailure::GatewayUnreachable { connected: true, .. }),
            "{failure:?}"
        );
    }

    #[tokio::test]
    async fn silent_origin_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let failure = fetcher(1).fetch(&format!("http://{addr}/")).await.unwrap_err();
        assert_eq!(failure, FetchFailure::Timeout);
    }

    #[tokio::test]
    async fn malformed_target_fails_setup() {
        let failure = fetcher(5).fetch("not a url").await.unwrap_err();
        assert!(matches!(failure, FetchFailure::RequestSetupFailed(_)));

        let failure = fetcher(5).fetch("ftp://example.com/file").await.unwrap_err();
        assert!(matches!(failure, FetchFailure::RequestSetupFailed(_)));
    }
}
