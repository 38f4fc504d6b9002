use eframe::App as EApp;
use egui::TextureHandle;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::error;

use super::accessibility::AccessibilitySettings;
use super::session::{DashboardSession, Section};
use crate::error::PlotError;
use crate::plotting::{render_chart, ChartId, ChartImage, ChartStyle};
use crate::types::ThemeState;

/// Main application state
pub struct App {
    pub session: DashboardSession,
    pub nav_open: bool,
    pub section: Section,
    pub show_accessibility: bool,
    pub textures: HashMap<ChartId, TextureHandle>,
    /// When each chart card first scrolled into view
    pub first_seen: HashMap<ChartId, Instant>,
    pub chart_style: ChartStyle,
    /// Theme and settings the egui style was last built from
    pub applied_style: Option<(ThemeState, AccessibilitySettings)>,
    /// Charts whose last render failed; retried on their next redraw request
    pub failed: HashSet<ChartId>,
}

impl App {
    pub fn new(session: DashboardSession) -> Self {
        let chart_style = ChartStyle::default().scaled(session.accessibility().font_scale());
        Self {
            session,
            nav_open: false,
            section: Section::Overview,
            show_accessibility: false,
            textures: HashMap::new(),
            first_seen: HashMap::new(),
            chart_style,
            applied_style: None,
            failed: HashSet::new(),
        }
    }

    /// Switch section; the nav menu closes after a choice
    pub fn select_section(&mut self, section: Section) {
        self.section = section;
        self.nav_open = false;
    }

    /// Record that a chart card is on screen. True the first time only.
    pub fn mark_visible(&mut self, id: ChartId, now: Instant) -> bool {
        if self.first_seen.contains_key(&id) {
            return false;
        }
        self.first_seen.insert(id, now);
        true
    }

    /// A seen card stays behind its loader for the configured delay
    pub fn is_revealed(&self, id: ChartId, now: Instant) -> bool {
        let delay = if self.session.accessibility().reduce_motion {
            std::time::Duration::ZERO
        } else {
            self.session.config().reveal_delay()
        };
        self.first_seen
            .get(&id)
            .map(|seen| now.saturating_duration_since(*seen) >= delay)
            .unwrap_or(false)
    }

    /// Rebuild the chart raster size when the font scale changes
    pub fn sync_chart_style(&mut self) {
        let style = ChartStyle::default().scaled(self.session.accessibility().font_scale());
        if style != self.chart_style {
            self.chart_style = style;
            let registry = self.session.registry_mut();
            for id in 0..registry.len() {
                if let Some(chart) = registry.get_mut(id) {
                    chart.request_redraw();
                }
            }
        }
    }

    /// Seen charts that are dirty, or that have no image and have not failed
    pub fn pending_charts(&self) -> Vec<ChartId> {
        self.session
            .registry()
            .iter()
            .filter(|c| self.first_seen.contains_key(&c.id()))
            .filter(|c| {
                c.needs_redraw() || (!self.textures.contains_key(&c.id()) && !self.failed.contains(&c.id()))
            })
            .map(|c| c.id())
            .collect()
    }

    /// Record the outcome of one render. The chart counts as drawn either way.
    pub fn finish_render(&mut self, id: ChartId, result: Result<ChartImage, PlotError>) -> Option<ChartImage> {
        if let Some(chart) = self.session.registry_mut().get_mut(id) {
            chart.mark_drawn();
        }
        match result {
            Ok(image) => {
                self.failed.remove(&id);
                Some(image)
            }
            Err(e) => {
                error!(error = %e, "chart rendering failed");
                self.failed.insert(id);
                None
            }
        }
    }

    /// Rasterize every pending chart
    pub fn render_pending(&mut self) -> Vec<(ChartId, ChartImage)> {
        let grayscale = self.session.registry().grayscale();
        let mut images = Vec::new();
        for id in self.pending_charts() {
            let Some(chart) = self.session.registry().get(id) else {
                continue;
            };
            let result = render_chart(chart, &self.chart_style, grayscale);
            if let Some(image) = self.finish_render(id, result) {
                images.push((id, image));
            }
        }
        images
    }
}

/// Thread-safe wrapper around App for use with eframe
pub struct AppWrapper {
    pub app: Arc<Mutex<App>>,
}

impl EApp for AppWrapper {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Ok(mut app) = self.app.lock() {
            super::ui::draw_ui(&mut app, ctx);
        } else {
            error!("failed to acquire app lock in update");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::storage::MemoryStore;
    use crate::app::theme::ThemeHooks;
    use crate::app::Feature;
    use crate::config::DashboardConfig;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn app() -> App {
        let session = DashboardSession::new(
            DashboardConfig {
                sources: Vec::new(),
                ..Default::default()
            },
            Box::new(MemoryStore::new()),
            ThemeHooks::default(),
        );
        App::new(session)
    }

    #[test]
    fn test_nav_closes_on_selection() {
        let mut app = app();
        app.nav_open = true;
        app.select_section(Section::Health);
        assert_eq!(app.section, Section::Health);
        assert!(!app.nav_open);
    }

    #[test]
    fn test_charts_render_only_after_first_visibility() {
        let mut app = app();
        assert!(app.render_pending().is_empty());

        let now = Instant::now();
        assert!(app.mark_visible(0, now));
        assert!(!app.mark_visible(0, now));
        let rendered = app.render_pending();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].0, 0);
        assert!(!app.session.registry().get(0).unwrap().needs_redraw());
    }

    #[test]
    fn test_theme_toggle_marks_seen_charts_dirty() {
        let mut app = app();
        app.mark_visible(0, Instant::now());
        app.render_pending();

        app.session.toggle_theme();
        assert!(app.session.registry().get(0).unwrap().needs_redraw());
    }

    #[test]
    fn test_reveal_delay() {
        let mut app = app();
        let now = Instant::now();
        assert!(!app.is_revealed(0, now));
        app.mark_visible(0, now);
        assert!(!app.is_revealed(0, now));
        assert!(app.is_revealed(0, now + app.session.config().reveal_delay()));

        app.session.toggle_feature(Feature::ReduceMotion);
        assert!(app.is_revealed(0, now + Duration::ZERO));
    }

    #[test]
    fn test_large_font_enlarges_charts() {
        let mut app = app();
        app.session.toggle_feature(Feature::LargeFont);
        app.sync_chart_style();
        assert_eq!(app.chart_style, ChartStyle::default().scaled(1.2));
        assert!(app.session.registry().iter().all(|c| c.needs_redraw()));
    }

    fn render_failure() -> PlotError {
        PlotError {
            chart: "População".to_string(),
            message: "font unavailable".to_string(),
        }
    }

    #[test]
    fn test_failed_chart_waits_for_next_redraw() {
        let mut app = app();
        app.mark_visible(0, Instant::now());
        assert_eq!(app.pending_charts(), vec![0]);

        assert!(app.finish_render(0, Err(render_failure())).is_none());
        assert!(app.failed.contains(&0));
        // no texture, yet it is not retried every frame
        assert!(app.pending_charts().is_empty());
        assert!(app.render_pending().is_empty());

        app.session.toggle_theme();
        assert_eq!(app.pending_charts(), vec![0]);
        assert_eq!(app.render_pending().len(), 1);
        assert!(!app.failed.contains(&0));
    }
}
