//! One-shot fetch of the remote property source.

use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;
use url::Url;

use crate::observability::metrics::{SharedMetrics, FETCH_DURATION, FETCH_TOTAL};
use crate::source::format::parse_json;
use crate::source::{PropertyMap, SourceOrigin};

/// Default per-request timeout for remote fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a fetch produced no snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure, timeout, or non-success HTTP status.
    #[error("remote config fetch failed: network error: {0}")]
    Network(String),

    /// The response arrived but was not a JSON object of properties.
    #[error("remote config fetch failed: parse error: {0}")]
    Parse(String),
}

impl FetchError {
    /// Metric label for the failure kind.
    pub fn label(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network_error",
            FetchError::Parse(_) => "parse_error",
        }
    }
}

/// Outcome of a single fetch.
pub type FetchResult = Result<PropertyMap, FetchError>;

/// Something that can produce a fresh property snapshot on demand.
///
/// Each call is independent; implementations keep no state between calls
/// that affects the result.
pub trait SnapshotFetcher: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = FetchResult> + Send;

    /// Origin recorded on every snapshot built from this fetcher's results.
    fn origin(&self) -> SourceOrigin;
}

/// Fetches properties over HTTP as a JSON object.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: reqwest::Client,
    url: Url,
    metrics: SharedMetrics,
}

impl RemoteFetcher {
    pub fn new(url: Url, timeout: Duration, metrics: SharedMetrics) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            url,
            metrics,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn fetch_once(&self) -> FetchResult {
        let response = self
            .client
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("unexpected status {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let pairs = parse_json(&body).map_err(FetchError::Parse)?;
        Ok(pairs.into_iter().collect())
    }
}

impl SnapshotFetcher for RemoteFetcher {
    async fn fetch(&self) -> FetchResult {
        let start = Instant::now();
        let result = self.fetch_once().await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.label(),
        };
        let labels = [("outcome", outcome)];
        self.metrics.increment(FETCH_TOTAL, &labels);
        self.metrics.record(FETCH_DURATION, start.elapsed(), &labels);

        match &result {
            Ok(values) => {
                tracing::debug!(url = %self.url, keys = values.len(), "remote config fetched")
            }
            Err(e) => tracing::debug!(url = %self.url, error = %e, "remote config fetch failed"),
        }
        result
    }

    fn origin(&self) -> SourceOrigin {
        SourceOrigin::Remote(self.url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_labels() {
        assert_eq!(FetchError::Network("x".into()).label(), "network_error");
        assert_eq!(FetchError::Parse("x".into()).label(), "parse_error");
        assert_eq!(
            FetchError::Parse("expected a JSON object".into()).to_string(),
            "remote config fetch failed: parse error: expected a JSON object"
        );
    }

    #[tokio::test]
    async fn test_unreachable_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let url = Url::parse("http://127.0.0.1:9/props").unwrap();
        let fetcher =
            RemoteFetcher::new(url, Duration::from_secs(2), SharedMetrics::default()).unwrap();

        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[test]
    fn test_origin_names_the_url() {
        let url = Url::parse("http://config.local:8080/props").unwrap();
        let fetcher =
            RemoteFetcher::new(url, Duration::from_secs(1), SharedMetrics::default()).unwrap();
        assert_eq!(
            fetcher.origin(),
            SourceOrigin::Remote("http://config.local:8080/props".to_string())
        );
    }
}
