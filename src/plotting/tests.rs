use pretty_assertions::assert_eq;

use super::*;
use crate::types::{MetricKey, MetricSeries, ThemeState};

fn setup_registry() -> ChartRegistry {
    let mut registry = ChartRegistry::new(ThemeState::Dark);
    registry.register(
        ChartHandle::new(
            "População",
            ChartKind::Bar,
            MetricKey::Population,
            MetricSeries::from_pairs(&[("2010", 458673.0), ("2022", 440962.0)]),
        )
        .with_value_floor(400_000.0),
    );
    registry.register(ChartHandle::new(
        "Salário médio",
        ChartKind::HorizontalBar,
        MetricKey::AverageWage,
        MetricSeries::from_pairs(&[("SJM", 1.7), ("Estado RJ", 2.4), ("Brasil", 2.2)]),
    ));
    registry.register(ChartHandle::new(
        "Saúde",
        ChartKind::Line,
        MetricKey::Mortality,
        MetricSeries::from_pairs(&[("2018", 15.2), ("2019", 14.9), ("2020", 14.88), ("2021", 14.1)]),
    ));
    registry.register(ChartHandle::new(
        "Economia",
        ChartKind::Doughnut,
        MetricKey::EconomySectors,
        MetricSeries::from_pairs(&[("Serviços", 65.0), ("Indústria", 15.0), ("Agro", 0.1)]),
    ));
    registry
}

#[test]
fn test_render_every_kind() {
    let registry = setup_registry();
    let style = ChartStyle::default();
    for chart in registry.iter() {
        let image = render_chart(chart, &style, false).unwrap();
        assert_eq!(image.rgb.len(), (image.width * image.height * 3) as usize);
        assert!(image.rgb.iter().any(|b| *b != 0), "{} rendered blank", chart.title);
    }
}

#[test]
fn test_theme_changes_background() {
    let mut registry = setup_registry();
    let style = ChartStyle::default();
    let dark = render_chart(registry.get(0).unwrap(), &style, false).unwrap();
    registry.broadcast_theme_change(true);
    let light = render_chart(registry.get(0).unwrap(), &style, false).unwrap();

    // Top-left corner is background in both themes
    assert_eq!(&dark.rgb[..3], &[17, 17, 17]);
    assert_eq!(&light.rgb[..3], &[255, 255, 255]);
}

#[test]
fn test_empty_series_renders() {
    let chart = ChartHandle::new("Vazio", ChartKind::Bar, MetricKey::Density, MetricSeries::default());
    assert!(render_chart(&chart, &ChartStyle::default(), false).is_ok());

    let doughnut = ChartHandle::new(
        "Vazio",
        ChartKind::Doughnut,
        MetricKey::EconomySectors,
        MetricSeries::from_pairs(&[("a", 0.0)]),
    );
    assert!(render_chart(&doughnut, &ChartStyle::default(), true).is_ok());
}

#[test]
fn test_value_range() {
    assert_eq!(value_range(&[], None), (0.0, 1.0));
    assert_eq!(value_range(&[0.0, 0.0], None), (0.0, 1.0));

    let (min, max) = value_range(&[458673.0, 440962.0], Some(400_000.0));
    assert_eq!(min, 400_000.0);
    assert!(max > 458673.0);

    // A floor above the data is ignored
    let (min, _) = value_range(&[10.0], Some(50.0));
    assert_eq!(min, 0.0);
}

#[test]
fn test_axis_value_format() {
    assert_eq!(format_axis_value(440962.0), "441.0K");
    assert_eq!(format_axis_value(1_500_000.0), "1.5M");
    assert_eq!(format_axis_value(4.9), "4.9");
    assert_eq!(format_axis_value(98.0), "98");
}

fn comparison_chart() -> ChartHandle {
    let years = |values: [f64; 3]| MetricSeries::from_pairs(&[("2021", values[0]), ("2022", values[1]), ("2023", values[2])]);
    ChartHandle::grouped(
        "ENEM comparativo",
        ChartKind::Line,
        vec![
            Dataset::new(MetricKey::EnemBrazil, "Brasil", years([339.7, 349.8, 354.1])),
            Dataset::new(MetricKey::EnemState, "Rio de Janeiro", years([374.5, 387.2, 360.6])),
            Dataset::new(MetricKey::EnemMunicipality, "São João de Meriti", years([333.5, 349.2, 332.8])),
        ],
    )
    .with_toggles()
}

#[test]
fn test_grouped_bars_render() {
    let chart = ChartHandle::grouped(
        "Taxas",
        ChartKind::Bar,
        vec![
            Dataset::new(MetricKey::DropoutFundamental, "Fundamental", MetricSeries::from_pairs(&[("2023", 1.2), ("2024", 1.1)])),
            Dataset::new(MetricKey::DropoutHighSchool, "Médio", MetricSeries::from_pairs(&[("2023", 3.4), ("2024", 3.16)])),
        ],
    );
    let image = render_chart(&chart, &ChartStyle::default(), false).unwrap();
    assert!(image.rgb.iter().any(|b| *b != 0));
}

#[test]
fn test_hidden_dataset_is_not_drawn() {
    let mut chart = comparison_chart();
    let style = ChartStyle::default();
    let all = render_chart(&chart, &style, false).unwrap();
    chart.set_visible("Rio de Janeiro", false);
    let fewer = render_chart(&chart, &style, false).unwrap();
    assert_ne!(all.rgb, fewer.rgb);
}

#[test]
fn test_every_dataset_hidden_still_renders() {
    let mut chart = comparison_chart();
    for label in ["Brasil", "Rio de Janeiro", "São João de Meriti"] {
        chart.set_visible(label, false);
    }
    assert!(chart.visible_datasets().is_empty());
    assert!(render_chart(&chart, &ChartStyle::default(), true).is_ok());
}

#[test]
fn test_points_follow_their_labels() {
    let labels = vec!["2021".to_string(), "2022".to_string(), "2023".to_string()];
    let partial = Dataset::new(MetricKey::EnemBrazil, "Brasil", MetricSeries::from_pairs(&[("2023", 354.1), ("1999", 1.0)]));
    assert_eq!(super::chart::placed(&partial, &labels), vec![(2, 354.1)]);
}
