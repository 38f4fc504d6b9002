//! # Common Types
//!
//! This module contains the common types used throughout the application for
//! representing metric series, their keys and the theme state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// A labeled numeric time series used to populate one chart dataset.
///
/// `labels` and `values` always have the same length and every value is
/// finite. Use [`MetricSeries::new`] to build one from untrusted input.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct MetricSeries {
    /// Period identifiers (years, categories), in display order
    pub labels: Vec<String>,
    /// One value per label
    pub values: Vec<f64>,
}

impl MetricSeries {
    /// Build a series, checking the length and finiteness invariants.
    pub fn new(labels: Vec<String>, values: Vec<f64>) -> Result<Self, ParseError> {
        if labels.len() != values.len() {
            return Err(ParseError::LengthMismatch {
                labels: labels.len(),
                values: values.len(),
            });
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(ParseError::NonFinite { index: idx });
        }
        Ok(Self { labels, values })
    }

    /// Build a series from static pairs. Used by the bundled fallback table.
    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self {
            labels: pairs.iter().map(|(l, _)| l.to_string()).collect(),
            values: pairs.iter().map(|(_, v)| *v).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Value for a given label, if present
    pub fn value_for(&self, label: &str) -> Option<f64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|idx| self.values[idx])
    }

    /// Last (most recent) value of the series
    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Iterate over `(label, value)` pairs
    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Overlay `newer` on this series by label. Points only present here are
    /// kept; the result is ordered by label.
    pub fn merged_with(&self, newer: &MetricSeries) -> MetricSeries {
        let mut points: BTreeMap<&str, f64> = self.points().collect();
        points.extend(newer.points());
        MetricSeries {
            labels: points.keys().map(|l| l.to_string()).collect(),
            values: points.values().copied().collect(),
        }
    }
}

#[derive(Deserialize)]
struct RawSeries {
    labels: Vec<String>,
    values: Vec<f64>,
}

impl TryFrom<RawSeries> for MetricSeries {
    type Error = ParseError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        MetricSeries::new(raw.labels, raw.values)
    }
}

/// The metrics shown on the dashboard.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Population,
    Enrollment,
    EconomySectors,
    Mortality,
    Sanitation,
    Density,
    AverageWage,
    GdpPerCapita,
    IdebEarlyYears,
    IdebLateYears,
    DistortionFundamental,
    DistortionHighSchool,
    DropoutFundamental,
    DropoutHighSchool,
    PreschoolShare,
    DaycareShare,
    FundamentalEarlyShare,
    FundamentalLateShare,
    EnemMale,
    EnemFemale,
    EnemFederal,
    EnemMunicipal,
    EnemBrazil,
    EnemState,
    EnemMunicipality,
}

impl MetricKey {
    pub const ALL: [MetricKey; 25] = [
        MetricKey::Population,
        MetricKey::Enrollment,
        MetricKey::EconomySectors,
        MetricKey::Mortality,
        MetricKey::Sanitation,
        MetricKey::Density,
        MetricKey::AverageWage,
        MetricKey::GdpPerCapita,
        MetricKey::IdebEarlyYears,
        MetricKey::IdebLateYears,
        MetricKey::DistortionFundamental,
        MetricKey::DistortionHighSchool,
        MetricKey::DropoutFundamental,
        MetricKey::DropoutHighSchool,
        MetricKey::PreschoolShare,
        MetricKey::DaycareShare,
        MetricKey::FundamentalEarlyShare,
        MetricKey::FundamentalLateShare,
        MetricKey::EnemMale,
        MetricKey::EnemFemale,
        MetricKey::EnemFederal,
        MetricKey::EnemMunicipal,
        MetricKey::EnemBrazil,
        MetricKey::EnemState,
        MetricKey::EnemMunicipality,
    ];

    /// Stable identifier used in config files and logs
    pub fn id(&self) -> &'static str {
        match self {
            MetricKey::Population => "population",
            MetricKey::Enrollment => "enrollment",
            MetricKey::EconomySectors => "economy_sectors",
            MetricKey::Mortality => "mortality",
            MetricKey::Sanitation => "sanitation",
            MetricKey::Density => "density",
            MetricKey::AverageWage => "average_wage",
            MetricKey::GdpPerCapita => "gdp_per_capita",
            MetricKey::IdebEarlyYears => "ideb_early_years",
            MetricKey::IdebLateYears => "ideb_late_years",
            MetricKey::DistortionFundamental => "distortion_fundamental",
            MetricKey::DistortionHighSchool => "distortion_high_school",
            MetricKey::DropoutFundamental => "dropout_fundamental",
            MetricKey::DropoutHighSchool => "dropout_high_school",
            MetricKey::PreschoolShare => "preschool_share",
            MetricKey::DaycareShare => "daycare_share",
            MetricKey::FundamentalEarlyShare => "fundamental_early_share",
            MetricKey::FundamentalLateShare => "fundamental_late_share",
            MetricKey::EnemMale => "enem_male",
            MetricKey::EnemFemale => "enem_female",
            MetricKey::EnemFederal => "enem_federal",
            MetricKey::EnemMunicipal => "enem_municipal",
            MetricKey::EnemBrazil => "enem_brazil",
            MetricKey::EnemState => "enem_state",
            MetricKey::EnemMunicipality => "enem_municipality",
        }
    }

    /// Human readable title
    pub fn title(&self) -> &'static str {
        match self {
            MetricKey::Population => "População",
            MetricKey::Enrollment => "Matrículas",
            MetricKey::EconomySectors => "Setores da Economia",
            MetricKey::Mortality => "Óbitos por mil",
            MetricKey::Sanitation => "Cobertura (%)",
            MetricKey::Density => "Hab/km²",
            MetricKey::AverageWage => "Salários Mínimos",
            MetricKey::GdpPerCapita => "PIB per capita",
            MetricKey::IdebEarlyYears => "IDEB Anos Iniciais",
            MetricKey::IdebLateYears => "IDEB Anos Finais",
            MetricKey::DistortionFundamental | MetricKey::DropoutFundamental => "Fundamental",
            MetricKey::DistortionHighSchool | MetricKey::DropoutHighSchool => "Médio",
            MetricKey::PreschoolShare => "Pré-escola",
            MetricKey::DaycareShare => "Creche",
            MetricKey::FundamentalEarlyShare => "Anos Iniciais",
            MetricKey::FundamentalLateShare => "Anos Finais",
            MetricKey::EnemMale => "Masculino",
            MetricKey::EnemFemale => "Feminino",
            MetricKey::EnemFederal => "Federal",
            MetricKey::EnemMunicipal => "Municipal",
            MetricKey::EnemBrazil => "Brasil",
            MetricKey::EnemState => "Rio de Janeiro",
            MetricKey::EnemMunicipality => "São João de Meriti",
        }
    }

    /// Census-style metrics whose live answer may cover only the latest
    /// period. Live points are laid over the bundled history instead of
    /// replacing it.
    pub fn merges_with_bundled(&self) -> bool {
        matches!(self, MetricKey::Population)
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for MetricKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKey::ALL
            .iter()
            .find(|k| k.id() == s)
            .copied()
            .ok_or_else(|| format!("unknown metric key: {}", s))
    }
}

/// Where a resolved series came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesOrigin {
    /// Fetched and normalized from the given endpoint
    Live { url: String },
    /// Substituted from the bundled table; `reason` is the failure that caused it
    Fallback { reason: String },
}

impl SeriesOrigin {
    pub fn is_live(&self) -> bool {
        matches!(self, SeriesOrigin::Live { .. })
    }
}

/// A metric resolved by the data layer, always carrying a usable series.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMetric {
    pub key: MetricKey,
    pub series: MetricSeries,
    pub origin: SeriesOrigin,
}

/// Light/dark visual mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThemeState {
    Light,
    #[default]
    Dark,
}

impl ThemeState {
    pub fn is_light(self) -> bool {
        matches!(self, ThemeState::Light)
    }

    pub fn from_is_light(is_light: bool) -> Self {
        if is_light {
            ThemeState::Light
        } else {
            ThemeState::Dark
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeState::Light => ThemeState::Dark,
            ThemeState::Dark => ThemeState::Light,
        }
    }

    /// Value written to storage
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeState::Light => "light",
            ThemeState::Dark => "dark",
        }
    }

    /// Parse a persisted value. Anything unrecognized yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemeState::Light),
            "dark" => Some(ThemeState::Dark),
            _ => None,
        }
    }
}

impl fmt::Display for ThemeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
