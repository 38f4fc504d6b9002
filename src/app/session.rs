//! Everything one dashboard run owns: storage, charts, theme, accessibility
//! and the most recent sync.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::accessibility::{AccessibilitySettings, Feature};
use super::storage::{open_storage, Storage};
use super::theme::{ThemeController, ThemeHooks};
use crate::config::DashboardConfig;
use crate::data::{
    FallbackResolver, FallbackTable, HealthCheck, HttpTransport, MetricFetcher, MetricSource, Normalizer,
    ReqwestTransport, SyncReport, SyncSummary,
};
use crate::plotting::{ChartHandle, ChartId, ChartKind, ChartRegistry, Dataset};
use crate::types::{MetricKey, MetricSeries, ThemeState};
use crate::utils::animation::COUNT_UP_DURATION;
use crate::utils::{CounterAnimation, KpiFormat};

/// Dashboard sections, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Overview,
    Education,
    Health,
    Economy,
    Infrastructure,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Overview,
        Section::Education,
        Section::Health,
        Section::Economy,
        Section::Infrastructure,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Overview => "Visão geral",
            Section::Education => "Educação",
            Section::Health => "Saúde",
            Section::Economy => "Economia",
            Section::Infrastructure => "Infraestrutura",
        }
    }
}

/// A headline number with its count-up animation
#[derive(Debug, Clone)]
pub struct Kpi {
    pub key: MetricKey,
    pub label: &'static str,
    pub format: KpiFormat,
    pub counter: CounterAnimation,
}

impl Kpi {
    pub fn text_at(&self, now: Instant) -> String {
        self.format.format(self.counter.current(now))
    }

    /// Final text, shown once the animation is over
    pub fn final_text(&self) -> String {
        self.format.format(self.counter.target())
    }
}

fn kpi_value(key: MetricKey, series: &MetricSeries) -> f64 {
    let value = match key {
        // First entry is the municipality, the rest are comparisons
        MetricKey::AverageWage => series.values.first().copied(),
        _ => series.latest(),
    };
    value.unwrap_or(0.0)
}

/// Storage key of the persisted [`SyncSummary`]
pub const LAST_SYNC_KEY: &str = "last_sync";

const ENEM_YEARS: [&str; 7] = ["2023", "2022", "2021", "2020", "2019", "2018", "2017"];

const KPI_SPECS: [(MetricKey, &str, KpiFormat); 4] = [
    (MetricKey::Population, "População (Censo 2022)", KpiFormat::Count),
    (MetricKey::GdpPerCapita, "PIB per capita", KpiFormat::Currency),
    (MetricKey::Density, "Densidade demográfica", KpiFormat::Density),
    (MetricKey::AverageWage, "Salário médio mensal", KpiFormat::Wages),
];

pub struct DashboardSession {
    config: DashboardConfig,
    storage: Box<dyn Storage>,
    registry: ChartRegistry,
    theme: ThemeController,
    accessibility: AccessibilitySettings,
    sections: Vec<(Section, ChartId)>,
    kpis: Vec<Kpi>,
    report: Option<SyncReport>,
    last_sync: Option<SyncSummary>,
    sync_rx: Option<mpsc::Receiver<SyncReport>>,
}

impl DashboardSession {
    /// Open the configured storage and build the session
    pub fn from_config(config: DashboardConfig, hooks: ThemeHooks) -> Self {
        let storage = open_storage(config.resolved_storage_path());
        Self::new(config, storage, hooks)
    }

    /// Charts start on bundled data until the first sync lands.
    pub fn new(config: DashboardConfig, storage: Box<dyn Storage>, hooks: ThemeHooks) -> Self {
        let theme = ThemeController::load(storage.as_ref(), hooks);
        let accessibility = AccessibilitySettings::load(storage.as_ref());
        let last_sync = load_last_sync(storage.as_ref());

        let mut registry = ChartRegistry::new(theme.state());
        accessibility.apply_to_registry(&mut registry);
        let sections = register_charts(&mut registry, FallbackTable::global());

        let duration = if accessibility.reduce_motion {
            std::time::Duration::ZERO
        } else {
            COUNT_UP_DURATION
        };
        let kpis = KPI_SPECS
            .iter()
            .map(|&(key, label, format)| Kpi {
                key,
                label,
                format,
                counter: CounterAnimation::new(kpi_value(key, &FallbackTable::global().get(key)), duration),
            })
            .collect();

        info!(charts = registry.len(), theme = %theme.state(), "session ready");
        Self {
            config,
            storage,
            registry,
            theme,
            accessibility,
            sections,
            kpis,
            report: None,
            last_sync,
            sync_rx: None,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn registry(&self) -> &ChartRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ChartRegistry {
        &mut self.registry
    }

    pub fn theme(&self) -> &ThemeController {
        &self.theme
    }

    pub fn accessibility(&self) -> &AccessibilitySettings {
        &self.accessibility
    }

    pub fn kpis(&self) -> &[Kpi] {
        &self.kpis
    }

    pub fn kpis_mut(&mut self) -> &mut [Kpi] {
        &mut self.kpis
    }

    pub fn report(&self) -> Option<&SyncReport> {
        self.report.as_ref()
    }

    /// Summary of the most recent sync, from this run or a previous one
    pub fn last_sync(&self) -> Option<&SyncSummary> {
        self.last_sync.as_ref()
    }

    pub fn is_syncing(&self) -> bool {
        self.sync_rx.is_some()
    }

    /// Charts shown in `section`
    pub fn charts_in(&self, section: Section) -> impl Iterator<Item = ChartId> + '_ {
        self.sections
            .iter()
            .filter(move |(s, _)| *s == section)
            .map(|(_, id)| *id)
    }

    pub fn toggle_theme(&mut self) -> ThemeState {
        self.theme.toggle(self.storage.as_mut(), &mut self.registry)
    }

    pub fn toggle_feature(&mut self, feature: Feature) -> bool {
        let enabled = self
            .accessibility
            .toggle(feature, self.storage.as_mut(), &mut self.registry);
        if feature == Feature::ReduceMotion {
            let duration = if enabled {
                std::time::Duration::ZERO
            } else {
                COUNT_UP_DURATION
            };
            for kpi in &mut self.kpis {
                kpi.counter = CounterAnimation::new(kpi.counter.target(), duration);
            }
        }
        enabled
    }

    /// Push a finished sync into the charts and KPI cards. Returns how many
    /// charts changed.
    pub fn apply_report(&mut self, report: SyncReport) -> usize {
        let mut changed = 0;
        for metric in &report.metrics {
            changed += self.registry.update_metric(metric.key, &metric.series);
            for kpi in self.kpis.iter_mut().filter(|k| k.key == metric.key) {
                kpi.counter.retarget(kpi_value(metric.key, &metric.series));
            }
        }
        for status in &report.sources {
            info!("{}", status.describe());
        }
        info!(
            summary = report.origin_summary(),
            degraded = report.degraded().len(),
            charts_changed = changed,
            "sync applied"
        );
        let summary = report.summary();
        match serde_json::to_string(&summary) {
            Ok(json) => {
                if let Err(e) = self.storage.set(LAST_SYNC_KEY, &json) {
                    warn!(error = %e, "failed to persist sync summary");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode sync summary"),
        }
        self.last_sync = Some(summary);
        self.report = Some(report);
        changed
    }

    /// Start a background sync over HTTP. Must be called inside a tokio runtime.
    pub fn start_sync(&mut self) {
        match ReqwestTransport::new(self.config.request_timeout()) {
            Ok(transport) => self.start_sync_with(Arc::new(transport)),
            Err(e) => warn!(error = %e, "cannot build HTTP client, staying on bundled data"),
        }
    }

    pub fn start_sync_with(&mut self, transport: Arc<dyn HttpTransport>) {
        if self.sync_rx.is_some() {
            return;
        }
        let normalizer = Normalizer::new(self.config.placeholder_tokens.clone());
        let resolver = FallbackResolver::new(MetricFetcher::new(transport, normalizer));
        let sources = self.config.sources.clone();
        let checks = self.config.health_checks.clone();
        let (tx, rx) = mpsc::channel(1);
        self.sync_rx = Some(rx);
        tokio::spawn(run_sync(resolver, sources, checks, tx));
    }

    /// Apply a finished sync, if any. Called once per frame.
    pub fn poll_sync(&mut self) -> bool {
        let Some(rx) = self.sync_rx.as_mut() else {
            return false;
        };
        match rx.try_recv() {
            Ok(report) => {
                self.sync_rx = None;
                self.apply_report(report);
                true
            }
            Err(mpsc::error::TryRecvError::Empty) => false,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                warn!("sync task ended without a report");
                self.sync_rx = None;
                false
            }
        }
    }

    /// One-line sync status for the banner
    pub fn status_line(&self) -> String {
        let Some(report) = &self.report else {
            return if self.is_syncing() {
                "Sincronizando dados...".to_string()
            } else if let Some(previous) = &self.last_sync {
                previous.describe()
            } else {
                "Dados locais".to_string()
            };
        };
        let synced = report.synced_at.format("%d/%m/%Y %H:%M:%S");
        let degraded = report.degraded().len();
        if degraded == 0 {
            format!("{} · atualizado em {}", report.origin_summary(), synced)
        } else {
            format!(
                "{} · {} de {} indicadores em dados locais · atualizado em {}",
                report.origin_summary(),
                degraded,
                report.metrics.len(),
                synced
            )
        }
    }
}

/// Resolve every metric and hand the report back to the UI thread.
pub async fn run_sync(
    resolver: FallbackResolver,
    sources: Vec<MetricSource>,
    checks: Vec<HealthCheck>,
    tx: mpsc::Sender<SyncReport>,
) {
    let report = resolver.sync(&MetricKey::ALL, &sources, &checks).await;
    if tx.send(report).await.is_err() {
        warn!("dashboard closed before sync finished");
    }
}

fn load_last_sync(storage: &dyn Storage) -> Option<SyncSummary> {
    let raw = storage.get(LAST_SYNC_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(summary) => Some(summary),
        Err(e) => {
            warn!(error = %e, "ignoring unreadable sync summary");
            None
        }
    }
}

fn education_charts(table: &FallbackTable) -> Vec<ChartHandle> {
    let titled = |key: MetricKey| Dataset::titled(key, table.get(key));
    vec![
        ChartHandle::filtered("IDEB", ChartKind::Bar)
            .with_selector("Etapa", &["Anos Iniciais", "Anos Finais"], None)
            .with_view(&["Anos Iniciais"], vec![titled(MetricKey::IdebEarlyYears)])
            .with_view(&["Anos Finais"], vec![titled(MetricKey::IdebLateYears)]),
        ChartHandle::filtered("Taxas de rendimento (%)", ChartKind::Bar)
            .with_selector("Indicador", &["Distorção idade-série", "Abandono"], None)
            .with_view(
                &["Distorção idade-série"],
                vec![titled(MetricKey::DistortionFundamental), titled(MetricKey::DistortionHighSchool)],
            )
            .with_view(
                &["Abandono"],
                vec![titled(MetricKey::DropoutFundamental), titled(MetricKey::DropoutHighSchool)],
            ),
        ChartHandle::filtered("Distribuição de matrículas (%)", ChartKind::Bar)
            .with_selector("Etapa", &["Educação Infantil", "Ensino Fundamental"], None)
            .with_view(
                &["Educação Infantil"],
                vec![titled(MetricKey::PreschoolShare), titled(MetricKey::DaycareShare)],
            )
            .with_view(
                &["Ensino Fundamental"],
                vec![titled(MetricKey::FundamentalEarlyShare), titled(MetricKey::FundamentalLateShare)],
            ),
        // only 2023 is broken down by area
        ChartHandle::filtered("ENEM por área", ChartKind::Bar)
            .with_selector("Ano", &ENEM_YEARS, Some("2023"))
            .with_selector("Categoria", &["Gênero", "Administração"], None)
            .with_view(&["2023", "Gênero"], vec![titled(MetricKey::EnemMale), titled(MetricKey::EnemFemale)])
            .with_view(
                &["2023", "Administração"],
                vec![titled(MetricKey::EnemFederal), titled(MetricKey::EnemMunicipal)],
            ),
        ChartHandle::grouped(
            "ENEM: comparativo de médias",
            ChartKind::Line,
            vec![
                titled(MetricKey::EnemBrazil),
                titled(MetricKey::EnemState),
                titled(MetricKey::EnemMunicipality),
            ],
        )
        .with_toggles(),
    ]
}

fn register_charts(registry: &mut ChartRegistry, table: &FallbackTable) -> Vec<(Section, ChartId)> {
    let chart = |kind, key: MetricKey| ChartHandle::new(key.title(), kind, key, table.get(key));
    let mut sections = vec![
        (
            Section::Overview,
            registry.register(chart(ChartKind::Bar, MetricKey::Population).with_value_floor(400_000.0)),
        ),
        (Section::Education, registry.register(chart(ChartKind::Bar, MetricKey::Enrollment))),
    ];
    for handle in education_charts(table) {
        sections.push((Section::Education, registry.register(handle)));
    }
    sections.extend([
        (Section::Health, registry.register(chart(ChartKind::Line, MetricKey::Mortality))),
        (Section::Economy, registry.register(chart(ChartKind::Doughnut, MetricKey::EconomySectors))),
        (
            Section::Economy,
            registry.register(chart(ChartKind::HorizontalBar, MetricKey::AverageWage)),
        ),
        (
            Section::Infrastructure,
            registry.register(chart(ChartKind::HorizontalBar, MetricKey::Sanitation)),
        ),
    ]);
    sections
}
