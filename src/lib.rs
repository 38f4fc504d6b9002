//! # Municipal Statistics Dashboard
//!
//! `civicstats` fetches municipal indicators from public statistics APIs,
//! normalizes them into labelled series and shows them as theme-aware charts.
//! Every indicator always renders: when a source is down, slow or returns
//! something unexpected, bundled figures take its place.
//!
//! ## Features
//!
//! - Concurrent fetching of all configured sources
//! - Lenient normalization of IBGE-style JSON (placeholder tokens become `0`)
//! - Per-metric fallback to bundled data
//! - Light/dark theme persisted across runs and broadcast to every chart
//! - Persisted accessibility toggles
//!
//! ## Example
//!
//! ```no_run
//! use civicstats::app::{App, AppWrapper, DashboardSession, ThemeHooks};
//! use civicstats::DashboardConfig;
//! use std::sync::{Arc, Mutex};
//! use eframe::NativeOptions;
//!
//! let session = DashboardSession::from_config(DashboardConfig::default(), ThemeHooks::default());
//! let app_wrapper = AppWrapper { app: Arc::new(Mutex::new(App::new(session))) };
//!
//! eframe::run_native(
//!     "civicstats",
//!     NativeOptions::default(),
//!     Box::new(|_cc| Ok(Box::new(app_wrapper))),
//! ).unwrap();
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod plotting;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use app::DashboardSession;
pub use config::DashboardConfig;
pub use error::{DataError, FetchError, ParseError};
pub use types::{MetricKey, MetricSeries, ResolvedMetric, SeriesOrigin, ThemeState};
