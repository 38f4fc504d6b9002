use chrono::{DateTime, Local};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::fallback::FallbackTable;
use super::fetch::{MetricFetcher, SourceOutcome};
use super::source::{HealthCheck, MetricSource};
use crate::error::DataError;
use crate::types::{MetricKey, MetricSeries, ResolvedMetric, SeriesOrigin};

/// Reachability of one configured endpoint during the last sync
#[derive(Debug, Clone, PartialEq)]
pub struct SourceStatus {
    pub name: String,
    pub url: String,
    pub online: bool,
}

impl SourceStatus {
    pub fn describe(&self) -> String {
        format!("{}: {}", self.name, if self.online { "Online" } else { "Offline" })
    }
}

/// Everything one sync produced: a series for every requested metric plus
/// the health of the sources behind them.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub metrics: Vec<ResolvedMetric>,
    pub sources: Vec<SourceStatus>,
    pub synced_at: DateTime<Local>,
}

impl SyncReport {
    pub fn metric(&self, key: MetricKey) -> Option<&ResolvedMetric> {
        self.metrics.iter().find(|m| m.key == key)
    }

    /// Metrics that ended up on bundled data
    pub fn degraded(&self) -> Vec<MetricKey> {
        self.metrics
            .iter()
            .filter(|m| !m.origin.is_live())
            .map(|m| m.key)
            .collect()
    }

    pub fn is_degraded(&self) -> bool {
        self.metrics.iter().any(|m| !m.origin.is_live())
    }

    /// Short origin label for the status banner
    pub fn origin_summary(&self) -> &'static str {
        if self.sources.iter().any(|s| s.online) {
            "Multi-Base Verificada"
        } else {
            "Base Local Protegida"
        }
    }

    pub fn summary(&self) -> SyncSummary {
        SyncSummary {
            synced_at: self.synced_at,
            origin: self.origin_summary().to_string(),
            sources: self.sources.iter().map(SourceStatus::describe).collect(),
        }
    }
}

/// The part of a sync that is persisted and shown again on the next launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub synced_at: DateTime<Local>,
    pub origin: String,
    pub sources: Vec<String>,
}

impl SyncSummary {
    pub fn describe(&self) -> String {
        format!(
            "{} · última sincronização em {}",
            self.origin,
            self.synced_at.format("%d/%m/%Y %H:%M")
        )
    }
}

/// Resolves every metric to a series, substituting bundled data per metric
/// whenever its live attempt fails.
pub struct FallbackResolver {
    fetcher: MetricFetcher,
    table: &'static FallbackTable,
}

impl FallbackResolver {
    pub fn new(fetcher: MetricFetcher) -> Self {
        Self::with_table(fetcher, FallbackTable::global())
    }

    pub fn with_table(fetcher: MetricFetcher, table: &'static FallbackTable) -> Self {
        Self { fetcher, table }
    }

    /// Turn one attempt into a resolved metric. Never fails.
    pub fn resolve(&self, key: MetricKey, attempt: Result<(MetricSeries, String), DataError>) -> ResolvedMetric {
        match attempt {
            Ok((mut series, url)) => {
                info!(metric = %key, points = series.len(), "using live data");
                if key.merges_with_bundled() {
                    series = self.table.get(key).merged_with(&series);
                }
                ResolvedMetric {
                    key,
                    series,
                    origin: SeriesOrigin::Live { url },
                }
            }
            Err(err) => {
                warn!(metric = %key, error = %err, "falling back to bundled data");
                ResolvedMetric {
                    key,
                    series: self.table.get(key),
                    origin: SeriesOrigin::Fallback {
                        reason: err.to_string(),
                    },
                }
            }
        }
    }

    /// Fetch all `sources` concurrently and resolve each of `keys`. For a key
    /// with several sources the first successful one in configuration order
    /// wins. Keys without a source resolve to bundled data.
    pub async fn resolve_all(&self, keys: &[MetricKey], sources: &[MetricSource]) -> SyncReport {
        self.sync(keys, sources, &[]).await
    }

    /// [`resolve_all`](Self::resolve_all) plus a reachability check of every
    /// `checks` endpoint, run alongside the metric fetches. Checked endpoints
    /// are listed after the metric sources in the report.
    pub async fn sync(&self, keys: &[MetricKey], sources: &[MetricSource], checks: &[HealthCheck]) -> SyncReport {
        let wanted: Vec<MetricSource> = sources
            .iter()
            .filter(|s| keys.contains(&s.key))
            .cloned()
            .collect();
        let checked = join_all(checks.iter().map(|check| async move {
            SourceStatus {
                name: check.name.clone(),
                url: check.url.clone(),
                online: self.fetcher.check(&check.url).await,
            }
        }));
        let (outcomes, checked) = futures::join!(self.fetcher.fetch_all(&wanted), checked);

        let statuses = outcomes
            .iter()
            .map(|o| SourceStatus {
                name: o.source.name.clone(),
                url: o.source.url.clone(),
                online: o.reachable(),
            })
            .chain(checked)
            .collect();

        let metrics = keys
            .iter()
            .map(|&key| self.resolve(key, pick_attempt(key, &outcomes)))
            .collect();

        SyncReport {
            metrics,
            sources: statuses,
            synced_at: Local::now(),
        }
    }
}

fn pick_attempt(key: MetricKey, outcomes: &[SourceOutcome]) -> Result<(MetricSeries, String), DataError> {
    let mut last_err = DataError::NoSource;
    for outcome in outcomes.iter().filter(|o| o.source.key == key) {
        match &outcome.result {
            Ok(series) => return Ok((series.clone(), outcome.source.url.clone())),
            Err(err) => last_err = err.clone(),
        }
    }
    Err(last_err)
}
