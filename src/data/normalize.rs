use serde_json::Value;
use tracing::warn;

use super::source::{MetricSource, PathSegment, SeriesShape};
use crate::error::ParseError;
use crate::types::MetricSeries;

/// Markers IBGE uses for suppressed or unavailable data points.
pub const DEFAULT_PLACEHOLDERS: [&str; 4] = ["...", "..", "-", "X"];

/// Turns raw upstream JSON into a [`MetricSeries`].
#[derive(Debug, Clone)]
pub struct Normalizer {
    placeholders: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDERS.iter().map(|s| s.to_string()).collect())
    }
}

impl Normalizer {
    pub fn new(placeholders: Vec<String>) -> Self {
        Self { placeholders }
    }

    /// Parse a response body and extract the series described by `source`.
    pub fn normalize_body(&self, body: &str, source: &MetricSource) -> Result<MetricSeries, ParseError> {
        let root: Value =
            serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
        self.normalize(&root, source)
    }

    /// Walk the source path and read the series in the configured shape.
    pub fn normalize(&self, root: &Value, source: &MetricSource) -> Result<MetricSeries, ParseError> {
        let target = walk_path(root, &source.path)?;
        let at = source.path_display();

        let (labels, values) = match &source.shape {
            SeriesShape::PeriodMap => {
                let map = target.as_object().ok_or(ParseError::UnexpectedShape {
                    expected: "object keyed by period",
                    at: at.clone(),
                    found: kind_of(target),
                })?;
                let mut pairs = map
                    .iter()
                    .map(|(period, raw)| {
                        self.coerce_value(raw, &format!("{}.{}", at, period))
                            .map(|value| (period.clone(), value))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                // object key order depends on serde_json features, periods are sorted here
                pairs.sort_by(|a, b| a.0.cmp(&b.0));
                pairs.into_iter().unzip()
            }
            SeriesShape::Records {
                label_field,
                value_field,
            } => {
                let records = target.as_array().ok_or(ParseError::UnexpectedShape {
                    expected: "array of records",
                    at: at.clone(),
                    found: kind_of(target),
                })?;
                let mut labels = Vec::with_capacity(records.len());
                let mut values = Vec::with_capacity(records.len());
                for (idx, record) in records.iter().enumerate() {
                    let record_at = format!("{}[{}]", at, idx);
                    let label = record.get(label_field).ok_or_else(|| ParseError::MissingPath {
                        segment: format!("{}.{}", record_at, label_field),
                    })?;
                    labels.push(label_text(label, &record_at)?);

                    // A record without a value field is a missing data point, not a shape error
                    let raw = record.get(value_field).unwrap_or(&Value::Null);
                    values.push(self.coerce_value(raw, &format!("{}.{}", record_at, value_field))?);
                }
                (labels, values)
            }
        };

        MetricSeries::new(labels, values)
    }

    pub fn is_placeholder(&self, text: &str) -> bool {
        let trimmed = text.trim();
        trimmed.is_empty() || self.placeholders.iter().any(|p| p == trimmed)
    }

    /// Coerce one upstream entry to a number. Placeholders, `null` and
    /// unparseable text become 0; nested containers are a shape error.
    fn coerce_value(&self, raw: &Value, at: &str) -> Result<f64, ParseError> {
        match raw {
            Value::Number(n) => Ok(n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0)),
            Value::Null => Ok(0.0),
            Value::String(text) => {
                if self.is_placeholder(text) {
                    return Ok(0.0);
                }
                match text.trim().parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(v),
                    _ => {
                        warn!(at, value = %text, "non-numeric upstream value, using 0");
                        Ok(0.0)
                    }
                }
            }
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => Err(ParseError::UnexpectedShape {
                expected: "number or numeric string",
                at: at.to_string(),
                found: kind_of(raw),
            }),
        }
    }
}

fn walk_path<'a>(root: &'a Value, path: &[PathSegment]) -> Result<&'a Value, ParseError> {
    let mut current = root;
    let mut walked = String::from("$");
    for segment in path {
        walked.push_str(&segment.to_string());
        current = match segment {
            PathSegment::Key(key) => current.get(key.as_str()),
            PathSegment::Index(idx) => current.get(*idx),
        }
        .ok_or_else(|| ParseError::MissingPath {
            segment: walked.clone(),
        })?;
    }
    Ok(current)
}

fn label_text(label: &Value, at: &str) -> Result<String, ParseError> {
    match label {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ParseError::UnexpectedShape {
            expected: "string or number label",
            at: at.to_string(),
            found: kind_of(other),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetricKey;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn flat_source() -> MetricSource {
        MetricSource {
            key: MetricKey::Population,
            name: "test".to_string(),
            url: "http://localhost/pop".to_string(),
            path: vec![],
            shape: SeriesShape::PeriodMap,
        }
    }

    fn ibge_body(serie: Value) -> Value {
        json!([{
            "id": "93",
            "variavel": "População residente",
            "unidade": "Pessoas",
            "resultados": [{
                "classificacoes": [],
                "series": [{
                    "localidade": {"id": "3305109", "nome": "São João de Meriti - RJ"},
                    "serie": serie
                }]
            }]
        }])
    }

    #[test]
    fn test_numeric_string_becomes_number() {
        let series = Normalizer::default()
            .normalize(&json!({"2022": "440962"}), &flat_source())
            .unwrap();
        assert_eq!(series.labels, vec!["2022"]);
        assert_eq!(series.values, vec![440962.0]);
    }

    #[test]
    fn test_ibge_aggregate_shape() {
        let source = MetricSource::ibge_aggregate(MetricKey::Population, "ibge", "http://x");
        let body = ibge_body(json!({"2010": "458673", "2022": "440962"}));
        let series = Normalizer::default().normalize(&body, &source).unwrap();
        assert_eq!(series, MetricSeries::from_pairs(&[("2010", 458673.0), ("2022", 440962.0)]));
    }

    #[test]
    fn test_placeholder_at_index_two_is_zero() {
        let body = json!({"2019": "10", "2020": "11", "2021": "...", "2022": "13"});
        let series = Normalizer::default().normalize(&body, &flat_source()).unwrap();
        assert_eq!(series.values[2], 0.0);
        assert_eq!(series.values, vec![10.0, 11.0, 0.0, 13.0]);
    }

    #[test]
    fn test_every_placeholder_token_is_zero() {
        let normalizer = Normalizer::default();
        for token in DEFAULT_PLACEHOLDERS.iter().copied().chain(["", "  "]) {
            let body = json!({"2022": token});
            let series = normalizer.normalize(&body, &flat_source()).unwrap();
            assert_eq!(series.values, vec![0.0], "token {:?}", token);
        }
        let series = normalizer.normalize(&json!({"2022": null}), &flat_source()).unwrap();
        assert_eq!(series.values, vec![0.0]);
    }

    #[test]
    fn test_custom_placeholders() {
        let normalizer = Normalizer::new(vec!["n/d".to_string()]);
        assert!(normalizer.is_placeholder("n/d"));
        assert!(!normalizer.is_placeholder("..."));
    }

    #[test]
    fn test_missing_path_is_parse_error() {
        let source = MetricSource::ibge_aggregate(MetricKey::Population, "ibge", "http://x");
        let err = Normalizer::default().normalize(&json!([]), &source).unwrap_err();
        match err {
            ParseError::MissingPath { segment } => assert_eq!(segment, "$[0]"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_wrong_shape_is_parse_error() {
        let err = Normalizer::default()
            .normalize(&json!(["2022", 1]), &flat_source())
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedShape { found: "array", .. }));

        let err = Normalizer::default()
            .normalize(&json!({"2022": {"nested": 1}}), &flat_source())
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedShape { found: "object", .. }));
    }

    #[test]
    fn test_invalid_json_body() {
        let err = Normalizer::default()
            .normalize_body("<html>maintenance</html>", &flat_source())
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson(_)));
    }

    #[test]
    fn test_records_shape() {
        let source = MetricSource {
            shape: SeriesShape::Records {
                label_field: "ano".to_string(),
                value_field: "valor".to_string(),
            },
            path: vec![PathSegment::Key("dados".to_string())],
            ..flat_source()
        };
        let body = json!({"dados": [
            {"ano": 2019, "valor": 4.3},
            {"ano": "2021", "valor": "-"},
            {"ano": "2023"}
        ]});
        let series = Normalizer::default().normalize(&body, &source).unwrap();
        assert_eq!(series.labels, vec!["2019", "2021", "2023"]);
        assert_eq!(series.values, vec![4.3, 0.0, 0.0]);
    }

    #[test]
    fn test_records_without_label_fail() {
        let source = MetricSource {
            shape: SeriesShape::Records {
                label_field: "ano".to_string(),
                value_field: "valor".to_string(),
            },
            ..flat_source()
        };
        let err = Normalizer::default()
            .normalize(&json!([{"valor": 1}]), &source)
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingPath { .. }));
    }

    #[test]
    fn test_lengths_always_match() {
        let normalizer = Normalizer::default();
        let bodies = [
            json!({}),
            json!({"2010": 1}),
            json!({"a": "1", "b": "...", "c": null, "d": "abc", "e": 2.5}),
        ];
        for body in bodies {
            let series = normalizer.normalize(&body, &flat_source()).unwrap();
            assert_eq!(series.labels.len(), series.values.len());
        }
    }

    #[test]
    fn test_periods_come_out_in_order() {
        let series = Normalizer::default()
            .normalize_body(r#"{"2022": "440962", "2000": "449476", "2010": "458673"}"#, &flat_source())
            .unwrap();
        assert_eq!(series.labels, vec!["2000", "2010", "2022"]);
        assert_eq!(series.values, vec![449476.0, 458673.0, 440962.0]);
    }
}
