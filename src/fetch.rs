//! Fetch Primitive
//!
//! The network seam the strategies, the orchestrator and the `add`
//! combinator consume. Production uses the reqwest-backed [`HttpFetcher`];
//! tests substitute their own implementations.

use async_trait::async_trait;
use url::Url;

use crate::error::{Result, WorkerError};
use crate::models::{WorkerRequest, WorkerResponse};

// == Fetcher Trait ==
/// Performs a network fetch for the worker.
///
/// An HTTP error status resolves to a response like any other; only
/// transport-level failures are errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &WorkerRequest) -> Result<WorkerResponse>;
}

// == HTTP Fetcher ==
/// Fetcher backed by a reqwest client. Relative URLs are resolved against
/// the configured upstream origin.
pub struct HttpFetcher {
    client: reqwest::Client,
    origin: Url,
}

impl HttpFetcher {
    /// Creates a fetcher forwarding to the given origin.
    pub fn new(upstream_origin: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            origin: Url::parse(upstream_origin)?,
        })
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        let resolved = if url.starts_with("http") {
            Url::parse(url)
        } else {
            self.origin.join(url)
        };
        resolved.map_err(|err| WorkerError::Network(format!("invalid URL {url}: {err}")))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &WorkerRequest) -> Result<WorkerResponse> {
        let url = self.resolve(&request.url)?;
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|err| WorkerError::Network(format!("invalid method: {err}")))?;

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            // Hop-by-hop headers are the client's concern
            if name.eq_ignore_ascii_case("host") || name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            builder = builder.header(name, value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|err| WorkerError::Network(err.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|err| WorkerError::Network(err.to_string()))?
            .to_vec();

        Ok(WorkerResponse::new(status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_against_origin() {
        let fetcher = HttpFetcher::new("http://localhost:8080").unwrap();
        let url = fetcher.resolve("/docs?q=1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/docs?q=1");
    }

    #[test]
    fn test_resolve_absolute_passes_through() {
        let fetcher = HttpFetcher::new("http://localhost:8080").unwrap();
        let url = fetcher.resolve("https://example.com/a").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a");
    }

    #[test]
    fn test_invalid_origin_is_rejected() {
        assert!(HttpFetcher::new("not a url").is_err());
    }
}
