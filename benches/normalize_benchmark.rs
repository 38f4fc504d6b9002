/// Benchmarks for the data pipeline and chart rasterization.
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use civicstats::data::{MetricSource, Normalizer, SeriesShape};
use civicstats::plotting::{render_chart, ChartHandle, ChartKind, ChartStyle};
use civicstats::{MetricKey, MetricSeries};
use serde_json::json;

/// IBGE aggregate body with `years` periods, every tenth one a placeholder
fn ibge_body(years: usize) -> String {
    let serie: serde_json::Map<String, serde_json::Value> = (0..years)
        .map(|i| {
            let value = if i % 10 == 0 {
                json!("...")
            } else {
                json!(format!("{}", 400_000 + i * 37))
            };
            (format!("{}", 1900 + i), value)
        })
        .collect();
    json!([{
        "id": "93",
        "resultados": [{ "series": [{ "serie": serie }] }]
    }])
    .to_string()
}

fn records_body(rows: usize) -> String {
    let rows: Vec<_> = (0..rows)
        .map(|i| json!({ "ano": format!("{}", 2000 + i), "valor": i as f64 * 1.5 }))
        .collect();
    serde_json::Value::Array(rows).to_string()
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalization");
    let normalizer = Normalizer::default();

    let ibge = MetricSource::ibge_aggregate(MetricKey::Population, "IBGE", "http://bench.test/ibge");
    for years in [10, 120] {
        let body = ibge_body(years);
        group.bench_function(format!("ibge_period_map_{}", years), |b| {
            b.iter(|| normalizer.normalize_body(black_box(&body), &ibge).unwrap())
        });
    }

    let records = MetricSource {
        key: MetricKey::Enrollment,
        name: "records".to_string(),
        url: "http://bench.test/records".to_string(),
        path: Vec::new(),
        shape: SeriesShape::Records {
            label_field: "ano".to_string(),
            value_field: "valor".to_string(),
        },
    };
    let body = records_body(200);
    group.bench_function("records_200", |b| {
        b.iter(|| normalizer.normalize_body(black_box(&body), &records).unwrap())
    });

    group.finish();
}

fn bench_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendering");
    let style = ChartStyle::default();

    let bars = ChartHandle::new(
        "Matrículas",
        ChartKind::Bar,
        MetricKey::Enrollment,
        MetricSeries::from_pairs(&[
            ("2019", 38500.0),
            ("2020", 39100.0),
            ("2021", 38800.0),
            ("2022", 39500.0),
            ("2023", 40100.0),
        ]),
    );
    group.bench_function("bar_chart", |b| b.iter(|| render_chart(&bars, &style, false).unwrap()));

    let doughnut = ChartHandle::new(
        "Economia",
        ChartKind::Doughnut,
        MetricKey::EconomySectors,
        MetricSeries::from_pairs(&[("Serviços", 65.0), ("Indústria", 15.0), ("Adm. Pública", 19.9), ("Agro", 0.1)]),
    );
    group.bench_function("doughnut_chart", |b| {
        b.iter(|| render_chart(&doughnut, &style, true).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_rendering);
criterion_main!(benches);
