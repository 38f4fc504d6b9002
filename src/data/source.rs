use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::MetricKey;

/// One step into a JSON document: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(idx) => write!(f, "[{}]", idx),
            PathSegment::Key(key) => write!(f, ".{}", key),
        }
    }
}

/// How the series is laid out once the path has been walked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeriesShape {
    /// An object keyed by period, e.g. `{"2010": "458673", "2022": "440962"}`
    #[default]
    PeriodMap,
    /// An array of records, e.g. `[{"ano": "2022", "valor": 1.7}]`
    Records {
        label_field: String,
        value_field: String,
    },
}

/// An endpoint that is only checked for reachability during a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthCheck {
    pub name: String,
    pub url: String,
}

impl HealthCheck {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// An upstream endpoint for one metric and where its series lives in the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricSource {
    pub key: MetricKey,
    /// Provider name, shown in the source status list
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub path: Vec<PathSegment>,
    #[serde(default)]
    pub shape: SeriesShape,
}

impl MetricSource {
    /// Source for an IBGE "agregados" v3 query: the series sits at
    /// `[0].resultados[0].series[0].serie` as a period map.
    pub fn ibge_aggregate(key: MetricKey, name: &str, url: &str) -> Self {
        Self {
            key,
            name: name.to_string(),
            url: url.to_string(),
            path: vec![
                PathSegment::Index(0),
                PathSegment::Key("resultados".to_string()),
                PathSegment::Index(0),
                PathSegment::Key("series".to_string()),
                PathSegment::Index(0),
                PathSegment::Key("serie".to_string()),
            ],
            shape: SeriesShape::PeriodMap,
        }
    }

    /// Render the path as `$[0].resultados[0]...` for log and error messages
    pub fn path_display(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.path {
            out.push_str(&segment.to_string());
        }
        out
    }
}

/// Default sources for São João de Meriti (IBGE code 3305109).
pub fn default_sources() -> Vec<MetricSource> {
    vec![
        MetricSource::ibge_aggregate(
            MetricKey::Population,
            "SIDRA/IBGE (Censo 2022)",
            "https://servicodados.ibge.gov.br/api/v3/agregados/4714/periodos/2022/variaveis/93?localidades=N6[3305109]",
        ),
        MetricSource::ibge_aggregate(
            MetricKey::Density,
            "SIDRA/IBGE (Densidade)",
            "https://servicodados.ibge.gov.br/api/v3/agregados/4714/periodos/2022/variaveis/614?localidades=N6[3305109]",
        ),
    ]
}

/// Portals that publish municipal indicators without a machine-readable series.
pub fn default_health_checks() -> Vec<HealthCheck> {
    vec![
        HealthCheck::new(
            "API Localidades/IBGE",
            "https://servicodados.ibge.gov.br/api/v1/localidades/municipios/3305109",
        ),
        HealthCheck::new("QEdu", "https://qedu.org.br/municipio/3305109-sao-joao-de-meriti"),
        HealthCheck::new(
            "Dados.gov.br",
            "https://dados.gov.br/api/publico/indicadores/educacao/municipio/3305109",
        ),
    ]
}
