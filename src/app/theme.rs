//! Light/dark theme state, persisted under `site_theme`.

use std::fmt;
use tokio::sync::watch;
use tracing::{info, warn};

use super::storage::Storage;
use crate::plotting::ChartRegistry;
use crate::types::ThemeState;

pub const THEME_KEY: &str = "site_theme";

/// Indicator shown on the toggle button. It names the theme a click switches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeIcon {
    Sun,
    Moon,
}

impl ThemeIcon {
    pub fn for_state(state: ThemeState) -> Self {
        match state {
            ThemeState::Dark => ThemeIcon::Sun,
            ThemeState::Light => ThemeIcon::Moon,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            ThemeIcon::Sun => "☀",
            ThemeIcon::Moon => "🌙",
        }
    }
}

/// Optional callbacks for consumers outside the chart registry
#[derive(Default)]
pub struct ThemeHooks {
    pub on_theme_changed: Option<Box<dyn Fn(ThemeState) + Send>>,
}

impl fmt::Debug for ThemeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeHooks")
            .field("on_theme_changed", &self.on_theme_changed.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub struct ThemeController {
    state: ThemeState,
    icon: ThemeIcon,
    notifier: watch::Sender<ThemeState>,
    hooks: ThemeHooks,
}

impl ThemeController {
    /// Restore the persisted theme. Absent or unreadable values mean dark.
    pub fn load(storage: &dyn Storage, hooks: ThemeHooks) -> Self {
        let state = match storage.get(THEME_KEY) {
            Some(raw) => ThemeState::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "ignoring unknown stored theme");
                ThemeState::Dark
            }),
            None => ThemeState::Dark,
        };
        let (notifier, _) = watch::channel(state);
        Self {
            state,
            icon: ThemeIcon::for_state(state),
            notifier,
            hooks,
        }
    }

    pub fn state(&self) -> ThemeState {
        self.state
    }

    pub fn icon(&self) -> ThemeIcon {
        self.icon
    }

    /// Receive every future theme change
    pub fn subscribe(&self) -> watch::Receiver<ThemeState> {
        self.notifier.subscribe()
    }

    /// Flip the theme unconditionally and propagate it.
    pub fn toggle(&mut self, storage: &mut dyn Storage, registry: &mut ChartRegistry) -> ThemeState {
        self.set(self.state.toggled(), storage, registry);
        self.state
    }

    pub fn set(&mut self, state: ThemeState, storage: &mut dyn Storage, registry: &mut ChartRegistry) {
        self.state = state;
        if let Err(e) = storage.set(THEME_KEY, state.as_str()) {
            warn!(error = %e, "failed to persist theme");
        }
        self.icon = ThemeIcon::for_state(state);
        registry.broadcast_theme_change(state.is_light());
        self.notifier.send_replace(state);
        if let Some(hook) = &self.hooks.on_theme_changed {
            hook(state);
        }
        info!(theme = %state, "theme changed");
    }
}
