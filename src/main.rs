//! Municipal statistics dashboard
//!
//! A GUI application showing live municipal indicators with bundled fallbacks.

use anyhow::Context;
use eframe::egui;
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use civicstats::app::{App, AppWrapper, DashboardSession, ThemeHooks};
use civicstats::DashboardConfig;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("civicstats=info")))
        .with_target(false)
        .init();

    let config = DashboardConfig::load().context("failed to load configuration")?;
    let title = format!("{} em números", config.municipality_name);
    let window_size = config.window_size;

    let rt = Runtime::new().context("failed to start tokio runtime")?;
    rt.block_on(async move {
        let mut session = DashboardSession::from_config(config, ThemeHooks::default());
        session.start_sync();
        info!("starting dashboard");

        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size(window_size)
                .with_min_inner_size([800.0, 600.0])
                .with_title(&title),
            ..Default::default()
        };

        let app = Arc::new(Mutex::new(App::new(session)));
        if let Err(e) = eframe::run_native(
            &title,
            options,
            Box::new(move |_cc| Ok(Box::new(AppWrapper { app }) as Box<dyn eframe::App>)),
        ) {
            error!(error = %e, "dashboard exited with an error");
            return Err(anyhow::anyhow!("failed to run dashboard: {}", e));
        }
        Ok(())
    })
}
