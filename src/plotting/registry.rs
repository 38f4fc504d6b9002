use std::collections::BTreeSet;
use tracing::debug;

use super::styles::StyleAttrs;
use crate::types::{MetricKey, MetricSeries, ThemeState};

pub type ChartId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Line,
    Doughnut,
}

/// One named dataset a chart can display.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub key: MetricKey,
    pub label: String,
    pub series: MetricSeries,
}

impl Dataset {
    pub fn new(key: MetricKey, label: &str, series: MetricSeries) -> Self {
        Self {
            key,
            label: label.to_string(),
            series,
        }
    }

    /// Dataset labelled with the metric's own title
    pub fn titled(key: MetricKey, series: MetricSeries) -> Self {
        Self::new(key, key.title(), series)
    }
}

/// A dropdown that filters what a chart shows, e.g. "Ano" or "Categoria".
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub name: String,
    pub options: Vec<String>,
    chosen: usize,
    fallback: Option<usize>,
}

impl Selector {
    pub fn chosen_index(&self) -> usize {
        self.chosen
    }

    pub fn chosen(&self) -> &str {
        &self.options[self.chosen]
    }
}

/// Datasets drawn for one combination of selector options
#[derive(Debug, Clone)]
struct View {
    facets: Vec<String>,
    datasets: Vec<Dataset>,
}

impl View {
    fn matches(&self, chosen: &[&str]) -> bool {
        self.facets.len() == chosen.len() && self.facets.iter().zip(chosen).all(|(f, c)| f == c)
    }
}

/// A chart living for the whole session. Owns its data and its
/// theme-dependent style; the registry rewrites the style on theme changes.
///
/// Data is organised in views. A chart without selectors has exactly one
/// view; a filtered chart has one view per selector combination that has
/// data. When the chosen combination has no view, each selector with a
/// fallback option is tried in turn, then the first view is shown.
#[derive(Debug, Clone)]
pub struct ChartHandle {
    id: ChartId,
    pub title: String,
    pub kind: ChartKind,
    views: Vec<View>,
    selectors: Vec<Selector>,
    hidden: BTreeSet<String>,
    toggleable: bool,
    style: StyleAttrs,
    /// Lower bound for the value axis, e.g. to zoom population bars
    pub value_floor: Option<f64>,
    dirty: bool,
    redraws: u64,
}

impl ChartHandle {
    pub fn new(title: &str, kind: ChartKind, key: MetricKey, series: MetricSeries) -> Self {
        Self::grouped(title, kind, vec![Dataset::titled(key, series)])
    }

    /// Several datasets drawn together, as grouped bars or several lines
    pub fn grouped(title: &str, kind: ChartKind, datasets: Vec<Dataset>) -> Self {
        Self::filtered(title, kind).with_view(&[], datasets)
    }

    /// A chart whose data is picked by selectors. Add them with
    /// [`with_selector`](Self::with_selector) and the data with
    /// [`with_view`](Self::with_view).
    pub fn filtered(title: &str, kind: ChartKind) -> Self {
        Self {
            id: 0,
            title: title.to_string(),
            kind,
            views: Vec::new(),
            selectors: Vec::new(),
            hidden: BTreeSet::new(),
            toggleable: false,
            style: StyleAttrs::default(),
            value_floor: None,
            dirty: true,
            redraws: 0,
        }
    }

    /// Add a selector. The first option starts chosen. `fallback` names the
    /// option to show when the chosen one has no data.
    pub fn with_selector(mut self, name: &str, options: &[&str], fallback: Option<&str>) -> Self {
        let fallback = fallback.and_then(|f| options.iter().position(|o| *o == f));
        self.selectors.push(Selector {
            name: name.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            chosen: 0,
            fallback,
        });
        self
    }

    /// Add the datasets shown for one option per selector, in selector order
    pub fn with_view(mut self, facets: &[&str], datasets: Vec<Dataset>) -> Self {
        self.views.push(View {
            facets: facets.iter().map(|f| f.to_string()).collect(),
            datasets,
        });
        self
    }

    /// Let the user hide and show individual datasets
    pub fn with_toggles(mut self) -> Self {
        self.toggleable = true;
        self
    }

    pub fn with_value_floor(mut self, floor: f64) -> Self {
        self.value_floor = Some(floor);
        self
    }

    pub fn id(&self) -> ChartId {
        self.id
    }

    pub fn style(&self) -> StyleAttrs {
        self.style
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    pub fn is_toggleable(&self) -> bool {
        self.toggleable
    }

    fn chosen(&self) -> Vec<&str> {
        self.selectors.iter().map(Selector::chosen).collect()
    }

    fn find_view(&self, chosen: &[&str]) -> Option<usize> {
        self.views.iter().position(|v| v.matches(chosen))
    }

    fn current_view(&self) -> Option<usize> {
        let chosen = self.chosen();
        if let Some(idx) = self.find_view(&chosen) {
            return Some(idx);
        }
        for (axis, selector) in self.selectors.iter().enumerate() {
            if let Some(fallback) = selector.fallback {
                let mut substituted = chosen.clone();
                substituted[axis] = selector.options[fallback].as_str();
                if let Some(idx) = self.find_view(&substituted) {
                    return Some(idx);
                }
            }
        }
        (!self.views.is_empty()).then_some(0)
    }

    /// The chosen selector options have no data of their own
    pub fn showing_substitute(&self) -> bool {
        self.find_view(&self.chosen()).is_none()
    }

    /// Every dataset of the current view, hidden ones included
    pub fn datasets(&self) -> &[Dataset] {
        self.current_view()
            .map(|idx| self.views[idx].datasets.as_slice())
            .unwrap_or(&[])
    }

    pub fn visible_datasets(&self) -> Vec<&Dataset> {
        self.datasets()
            .iter()
            .filter(|d| !self.hidden.contains(&d.label))
            .collect()
    }

    /// The first visible dataset, used by single-series renderings
    pub fn primary_dataset(&self) -> Option<&Dataset> {
        self.datasets().iter().find(|d| !self.hidden.contains(&d.label))
    }

    pub fn is_visible(&self, label: &str) -> bool {
        !self.hidden.contains(label)
    }

    /// Hide or show the dataset labelled `label`. Returns whether anything changed.
    pub fn set_visible(&mut self, label: &str, visible: bool) -> bool {
        let changed = if visible {
            self.hidden.remove(label)
        } else {
            self.hidden.insert(label.to_string())
        };
        if changed {
            self.request_redraw();
        }
        changed
    }

    /// Choose `option` on selector `axis`. Out-of-range indices are ignored.
    /// Returns whether the displayed data changed.
    pub fn select(&mut self, axis: usize, option: usize) -> bool {
        let before = self.current_view();
        match self.selectors.get_mut(axis) {
            Some(selector) if option < selector.options.len() => selector.chosen = option,
            _ => return false,
        }
        let changed = self.current_view() != before;
        if changed {
            self.request_redraw();
        }
        changed
    }

    /// Data behind `key` in any view
    pub fn series_for(&self, key: MetricKey) -> Option<&MetricSeries> {
        self.views
            .iter()
            .flat_map(|v| &v.datasets)
            .find(|d| d.key == key)
            .map(|d| &d.series)
    }

    /// Replace the data of every dataset backed by `key`. Returns whether anything changed.
    pub fn update_series(&mut self, key: MetricKey, series: &MetricSeries) -> bool {
        let mut changed = false;
        for dataset in self
            .views
            .iter_mut()
            .flat_map(|v| v.datasets.iter_mut())
            .filter(|d| d.key == key)
        {
            if dataset.series != *series {
                dataset.series = series.clone();
                changed = true;
            }
        }
        if changed {
            self.request_redraw();
        }
        changed
    }

    pub fn apply_style(&mut self, style: StyleAttrs) {
        self.style = style;
    }

    pub fn request_redraw(&mut self) {
        self.dirty = true;
        self.redraws += 1;
    }

    pub fn needs_redraw(&self) -> bool {
        self.dirty
    }

    /// Called by the renderer once the chart has been rasterized
    pub fn mark_drawn(&mut self) {
        self.dirty = false;
    }

    /// Number of redraws requested since creation
    pub fn redraw_requests(&self) -> u64 {
        self.redraws
    }
}

/// Ordered collection of every chart in the session.
#[derive(Debug, Default)]
pub struct ChartRegistry {
    charts: Vec<ChartHandle>,
    theme: ThemeState,
    grayscale: bool,
}

impl ChartRegistry {
    pub fn new(theme: ThemeState) -> Self {
        Self {
            charts: Vec::new(),
            theme,
            grayscale: false,
        }
    }

    /// Add a chart. It picks up the current theme immediately.
    pub fn register(&mut self, mut handle: ChartHandle) -> ChartId {
        let id = self.charts.len();
        handle.id = id;
        handle.apply_style(StyleAttrs::for_theme(self.theme.is_light()));
        handle.dirty = true;
        debug!(chart = %handle.title, id, "chart registered");
        self.charts.push(handle);
        id
    }

    /// Restyle every chart for the given theme and ask each one to redraw.
    pub fn broadcast_theme_change(&mut self, is_light: bool) {
        self.theme = ThemeState::from_is_light(is_light);
        let style = StyleAttrs::for_theme(is_light);
        for chart in &mut self.charts {
            chart.apply_style(style);
            chart.request_redraw();
        }
        debug!(charts = self.charts.len(), theme = %self.theme, "theme broadcast");
    }

    /// Push fresh data for `key` into every chart that shows it
    pub fn update_metric(&mut self, key: MetricKey, series: &MetricSeries) -> usize {
        self.charts
            .iter_mut()
            .map(|chart| chart.update_series(key, series))
            .filter(|changed| *changed)
            .count()
    }

    pub fn set_grayscale(&mut self, enabled: bool) {
        if self.grayscale != enabled {
            self.grayscale = enabled;
            self.charts.iter_mut().for_each(ChartHandle::request_redraw);
        }
    }

    pub fn grayscale(&self) -> bool {
        self.grayscale
    }

    pub fn theme(&self) -> ThemeState {
        self.theme
    }

    pub fn get(&self, id: ChartId) -> Option<&ChartHandle> {
        self.charts.get(id)
    }

    pub fn get_mut(&mut self, id: ChartId) -> Option<&mut ChartHandle> {
        self.charts.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartHandle> {
        self.charts.iter()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pop_chart() -> ChartHandle {
        ChartHandle::new(
            "População",
            ChartKind::Bar,
            MetricKey::Population,
            MetricSeries::from_pairs(&[("2010", 458673.0), ("2022", 440962.0)]),
        )
    }

    fn registry_with(n: usize) -> ChartRegistry {
        let mut registry = ChartRegistry::new(ThemeState::Dark);
        for _ in 0..n {
            registry.register(pop_chart());
        }
        registry
    }

    #[test]
    fn test_register_assigns_ids_in_order_without_dedup() {
        let registry = registry_with(3);
        assert_eq!(registry.len(), 3);
        let ids: Vec<ChartId> = registry.iter().map(ChartHandle::id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_register_applies_current_theme() {
        let mut registry = ChartRegistry::new(ThemeState::Light);
        let id = registry.register(pop_chart());
        assert_eq!(registry.get(id).unwrap().style(), StyleAttrs::for_theme(true));
    }

    #[test]
    fn test_broadcast_restyles_every_chart() {
        let mut registry = registry_with(4);
        registry.broadcast_theme_change(true);
        for chart in registry.iter() {
            assert_eq!(chart.style().grid_color, StyleAttrs::for_theme(true).grid_color);
            assert_eq!(chart.style().text_color, StyleAttrs::for_theme(true).text_color);
            assert!(chart.needs_redraw());
        }
        assert_eq!(registry.theme(), ThemeState::Light);
    }

    #[test]
    fn test_broadcast_is_idempotent() {
        let mut registry = registry_with(3);
        registry.broadcast_theme_change(true);
        let first: Vec<StyleAttrs> = registry.iter().map(ChartHandle::style).collect();
        registry.broadcast_theme_change(true);
        let second: Vec<StyleAttrs> = registry.iter().map(ChartHandle::style).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_broadcast_triggers_redraw() {
        let mut registry = registry_with(2);
        for id in 0..2 {
            registry.get_mut(id).unwrap().mark_drawn();
        }
        let before = registry.get(0).unwrap().redraw_requests();
        registry.broadcast_theme_change(false);
        let chart = registry.get(0).unwrap();
        assert!(chart.needs_redraw());
        assert_eq!(chart.redraw_requests(), before + 1);
    }

    #[test]
    fn test_update_metric_only_touches_matching_charts() {
        let mut registry = registry_with(1);
        registry.register(ChartHandle::new(
            "Saúde",
            ChartKind::Line,
            MetricKey::Mortality,
            MetricSeries::from_pairs(&[("2021", 14.1)]),
        ));
        registry.get_mut(0).unwrap().mark_drawn();
        registry.get_mut(1).unwrap().mark_drawn();

        let live = MetricSeries::from_pairs(&[("2022", 440962.0)]);
        assert_eq!(registry.update_metric(MetricKey::Population, &live), 1);
        assert_eq!(registry.get(0).unwrap().series_for(MetricKey::Population), Some(&live));
        assert!(registry.get(0).unwrap().needs_redraw());
        assert!(!registry.get(1).unwrap().needs_redraw());

        // Same data again changes nothing
        assert_eq!(registry.update_metric(MetricKey::Population, &live), 0);
    }

    fn ideb_chart() -> ChartHandle {
        ChartHandle::filtered("IDEB", ChartKind::Bar)
            .with_selector("Etapa", &["Anos Iniciais", "Anos Finais"], None)
            .with_view(
                &["Anos Iniciais"],
                vec![Dataset::titled(MetricKey::IdebEarlyYears, MetricSeries::from_pairs(&[("2023", 4.9)]))],
            )
            .with_view(
                &["Anos Finais"],
                vec![Dataset::titled(MetricKey::IdebLateYears, MetricSeries::from_pairs(&[("2023", 4.2)]))],
            )
    }

    fn enem_chart() -> ChartHandle {
        let scores = |key, values: [f64; 2]| {
            Dataset::titled(key, MetricSeries::from_pairs(&[("Matemática", values[0]), ("Linguagens", values[1])]))
        };
        ChartHandle::filtered("ENEM", ChartKind::Bar)
            .with_selector("Ano", &["2022", "2023"], Some("2023"))
            .with_selector("Categoria", &["Gênero", "Administração"], None)
            .with_view(
                &["2023", "Gênero"],
                vec![
                    scores(MetricKey::EnemMale, [344.0, 349.0]),
                    scores(MetricKey::EnemFemale, [315.0, 349.0]),
                ],
            )
            .with_view(
                &["2023", "Administração"],
                vec![
                    scores(MetricKey::EnemFederal, [529.0, 507.0]),
                    scores(MetricKey::EnemMunicipal, [101.0, 141.0]),
                ],
            )
    }

    #[test]
    fn test_select_switches_view() {
        let mut chart = ideb_chart();
        chart.mark_drawn();
        assert_eq!(chart.primary_dataset().unwrap().key, MetricKey::IdebEarlyYears);

        assert!(chart.select(0, 1));
        assert_eq!(chart.primary_dataset().unwrap().key, MetricKey::IdebLateYears);
        assert_eq!(chart.selectors()[0].chosen(), "Anos Finais");
        assert!(chart.needs_redraw());

        chart.mark_drawn();
        assert!(!chart.select(0, 7));
        assert!(!chart.select(3, 0));
        assert_eq!(chart.selectors()[0].chosen_index(), 1);
        assert!(!chart.needs_redraw());
    }

    #[test]
    fn test_missing_year_uses_fallback_year() {
        let mut chart = enem_chart();
        // "2022" is chosen first and has no data
        assert_eq!(chart.selectors()[0].chosen(), "2022");
        assert!(chart.showing_substitute());
        assert_eq!(chart.datasets()[0].key, MetricKey::EnemMale);

        assert!(chart.select(1, 1));
        assert_eq!(chart.datasets()[0].key, MetricKey::EnemFederal);

        // picking the fallback year explicitly shows the same data
        chart.mark_drawn();
        assert!(!chart.select(0, 1));
        assert!(!chart.showing_substitute());
        assert!(!chart.needs_redraw());
    }

    #[test]
    fn test_grouped_chart_hides_and_shows_datasets() {
        let series = MetricSeries::from_pairs(&[("2022", 1.0)]);
        let mut chart = ChartHandle::grouped(
            "Comparativo",
            ChartKind::Line,
            vec![
                Dataset::new(MetricKey::EnemBrazil, "Brasil", series.clone()),
                Dataset::new(MetricKey::EnemState, "Rio de Janeiro", series.clone()),
                Dataset::new(MetricKey::EnemMunicipality, "São João de Meriti", series),
            ],
        )
        .with_toggles();
        chart.mark_drawn();
        assert!(chart.is_toggleable());

        assert!(chart.set_visible("Brasil", false));
        assert!(chart.needs_redraw());
        assert!(!chart.is_visible("Brasil"));
        let labels: Vec<&str> = chart.visible_datasets().iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["Rio de Janeiro", "São João de Meriti"]);
        assert_eq!(chart.primary_dataset().unwrap().label, "Rio de Janeiro");
        assert_eq!(chart.datasets().len(), 3);

        chart.mark_drawn();
        assert!(!chart.set_visible("Brasil", false));
        assert!(!chart.needs_redraw());
        assert!(chart.set_visible("Brasil", true));
        assert_eq!(chart.visible_datasets().len(), 3);
    }

    #[test]
    fn test_update_reaches_views_not_on_screen() {
        let mut chart = ideb_chart();
        let late = MetricSeries::from_pairs(&[("2023", 4.5)]);
        assert!(chart.update_series(MetricKey::IdebLateYears, &late));
        // still showing the first view
        assert_eq!(chart.primary_dataset().unwrap().key, MetricKey::IdebEarlyYears);
        assert_eq!(chart.series_for(MetricKey::IdebLateYears), Some(&late));
    }

    #[test]
    fn test_filtered_chart_without_views_is_empty() {
        let chart = ChartHandle::filtered("Vazio", ChartKind::Bar).with_selector("Ano", &["2023"], None);
        assert!(chart.datasets().is_empty());
        assert!(chart.primary_dataset().is_none());
    }

    #[test]
    fn test_grayscale_toggle_requests_redraw_once() {
        let mut registry = registry_with(1);
        registry.get_mut(0).unwrap().mark_drawn();
        registry.set_grayscale(true);
        assert!(registry.grayscale());
        assert!(registry.get(0).unwrap().needs_redraw());

        registry.get_mut(0).unwrap().mark_drawn();
        registry.set_grayscale(true);
        assert!(!registry.get(0).unwrap().needs_redraw());
    }
}
