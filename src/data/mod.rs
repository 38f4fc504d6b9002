//! Live data pipeline: fetch sources concurrently, normalize their JSON into
//! [`MetricSeries`](crate::types::MetricSeries) and fall back to bundled
//! series per metric when anything goes wrong.

mod fallback;
pub mod fetch;
pub mod normalize;
mod resolver;
pub mod source;


pub use fallback::FallbackTable;
pub use fetch::{HttpResponse, HttpTransport, MetricFetcher, ReqwestTransport, SourceOutcome};
pub use normalize::{Normalizer, DEFAULT_PLACEHOLDERS};
pub use resolver::{FallbackResolver, SourceStatus, SyncReport, SyncSummary};
pub use source::{default_health_checks, default_sources, HealthCheck, MetricSource, PathSegment, SeriesShape};
