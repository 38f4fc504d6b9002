use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::normalize::Normalizer;
use super::source::MetricSource;
use crate::error::{DataError, FetchError};
use crate::types::MetricSeries;

/// Raw HTTP answer handed to the normalizer
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal GET capability the fetcher needs from an HTTP client.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// [`HttpTransport`] backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("civicstats/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout { url: url.to_string() }
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let response = self.client.get(url).send().await.map_err(map_err)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_err)?;
        Ok(HttpResponse { status, body })
    }
}

/// Outcome of one source, kept separate from every other source.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: MetricSource,
    pub result: Result<MetricSeries, DataError>,
}

impl SourceOutcome {
    /// The endpoint answered with a success status, whether or not the body was usable
    pub fn reachable(&self) -> bool {
        !matches!(self.result, Err(DataError::Fetch(_)))
    }
}

/// Fetches sources concurrently and normalizes each response.
#[derive(Clone)]
pub struct MetricFetcher {
    transport: Arc<dyn HttpTransport>,
    normalizer: Normalizer,
}

impl MetricFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, normalizer: Normalizer) -> Self {
        Self {
            transport,
            normalizer,
        }
    }

    /// Fetch and normalize a single source.
    pub async fn fetch(&self, source: &MetricSource) -> Result<MetricSeries, DataError> {
        debug!(metric = %source.key, url = %source.url, "fetching source");
        let response = self.transport.get(&source.url).await?;
        if !response.is_success() {
            return Err(FetchError::Status {
                url: source.url.clone(),
                status: response.status,
            }
            .into());
        }
        let series = self.normalizer.normalize_body(&response.body, source)?;
        debug!(metric = %source.key, points = series.len(), "source normalized");
        Ok(series)
    }

    /// Whether `url` answers with a success status. The body is ignored.
    pub async fn check(&self, url: &str) -> bool {
        match self.transport.get(url).await {
            Ok(response) => response.is_success(),
            Err(err) => {
                debug!(url, error = %err, "health check failed");
                false
            }
        }
    }

    /// Fetch every source at once. The output keeps the input order and one
    /// failing source never affects the others.
    pub async fn fetch_all(&self, sources: &[MetricSource]) -> Vec<SourceOutcome> {
        let attempts = sources.iter().map(|source| async move {
            SourceOutcome {
                source: source.clone(),
                result: self.fetch(source).await,
            }
        });
        join_all(attempts).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubTransport;
    use super::*;
    use crate::error::ParseError;
    use crate::types::MetricKey;
    use pretty_assertions::assert_eq;

    fn source(key: MetricKey, url: &str) -> MetricSource {
        MetricSource {
            key,
            name: url.to_string(),
            url: url.to_string(),
            path: vec![],
            shape: Default::default(),
        }
    }

    fn fetcher(transport: StubTransport) -> MetricFetcher {
        MetricFetcher::new(Arc::new(transport), Normalizer::default())
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let fetcher = fetcher(StubTransport::default().ok("http://a/pop", r#"{"2022": "440962"}"#));
        let series = fetcher
            .fetch(&source(MetricKey::Population, "http://a/pop"))
            .await
            .unwrap();
        assert_eq!(series.values, vec![440962.0]);
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_error() {
        let fetcher = fetcher(StubTransport::default().status("http://a/pop", 503));
        let err = fetcher
            .fetch(&source(MetricKey::Population, "http://a/pop"))
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Fetch(FetchError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_bad_body_is_parse_error() {
        let fetcher = fetcher(StubTransport::default().ok("http://a/pop", "not json"));
        let err = fetcher
            .fetch(&source(MetricKey::Population, "http://a/pop"))
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Parse(ParseError::InvalidJson(_))));
    }

    #[tokio::test]
    async fn test_fetch_all_isolates_failures() {
        let transport = StubTransport::default()
            .ok("http://a/pop", r#"{"2022": 1}"#)
            .refuse("http://a/density")
            .ok("http://a/wage", r#"{"SJM": "1.7"}"#);
        let fetcher = fetcher(transport);
        let sources = vec![
            source(MetricKey::Population, "http://a/pop"),
            source(MetricKey::Density, "http://a/density"),
            source(MetricKey::AverageWage, "http://a/wage"),
        ];

        let outcomes = fetcher.fetch_all(&sources).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[1].result.is_err());
        assert!(!outcomes[1].reachable());
        assert_eq!(outcomes[2].result.as_ref().unwrap().values, vec![1.7]);
        assert_eq!(outcomes[2].source.key, MetricKey::AverageWage);
    }

    #[test]
    fn test_parse_failure_counts_as_reachable() {
        let outcome = SourceOutcome {
            source: source(MetricKey::Population, "http://a/pop"),
            result: Err(ParseError::InvalidJson("x".to_string()).into()),
        };
        assert!(outcome.reachable());
    }
}
