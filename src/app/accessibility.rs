//! Accessibility toggles. Each one is persisted under its own key.

use egui::{Color32, Stroke, Style};
use tracing::{debug, warn};

use super::storage::{get_flag, set_flag, Storage};
use crate::plotting::ChartRegistry;

const FONT_SCALE: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    HighContrast,
    Grayscale,
    LargeFont,
    ReduceMotion,
    FocusVisible,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::HighContrast,
        Feature::Grayscale,
        Feature::LargeFont,
        Feature::ReduceMotion,
        Feature::FocusVisible,
    ];

    pub fn storage_key(self) -> &'static str {
        match self {
            Feature::HighContrast => "high-contrast",
            Feature::Grayscale => "grayscale-mode",
            Feature::LargeFont => "font-large",
            Feature::ReduceMotion => "reduce-motion",
            Feature::FocusVisible => "focus-visible",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Feature::HighContrast => "Alto contraste",
            Feature::Grayscale => "Escala de cinza",
            Feature::LargeFont => "Fonte grande",
            Feature::ReduceMotion => "Reduzir movimento",
            Feature::FocusVisible => "Destacar foco",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessibilitySettings {
    pub high_contrast: bool,
    pub grayscale: bool,
    pub large_font: bool,
    pub reduce_motion: bool,
    pub focus_visible: bool,
}

impl AccessibilitySettings {
    pub fn load(storage: &dyn Storage) -> Self {
        let mut settings = Self::default();
        for feature in Feature::ALL {
            if let Some(enabled) = get_flag(storage, feature.storage_key()) {
                *settings.flag_mut(feature) = enabled;
            }
        }
        settings
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::HighContrast => self.high_contrast,
            Feature::Grayscale => self.grayscale,
            Feature::LargeFont => self.large_font,
            Feature::ReduceMotion => self.reduce_motion,
            Feature::FocusVisible => self.focus_visible,
        }
    }

    fn flag_mut(&mut self, feature: Feature) -> &mut bool {
        match feature {
            Feature::HighContrast => &mut self.high_contrast,
            Feature::Grayscale => &mut self.grayscale,
            Feature::LargeFont => &mut self.large_font,
            Feature::ReduceMotion => &mut self.reduce_motion,
            Feature::FocusVisible => &mut self.focus_visible,
        }
    }

    /// Flip one feature, persist it and push chart-facing state to the registry
    pub fn toggle(&mut self, feature: Feature, storage: &mut dyn Storage, registry: &mut ChartRegistry) -> bool {
        let flag = self.flag_mut(feature);
        *flag = !*flag;
        let enabled = *flag;
        if let Err(e) = set_flag(storage, feature.storage_key(), enabled) {
            warn!(feature = feature.storage_key(), error = %e, "failed to persist accessibility flag");
        }
        self.apply_to_registry(registry);
        debug!(feature = feature.storage_key(), enabled, "accessibility toggled");
        enabled
    }

    pub fn apply_to_registry(&self, registry: &mut ChartRegistry) {
        registry.set_grayscale(self.grayscale);
    }

    pub fn font_scale(&self) -> f32 {
        if self.large_font {
            FONT_SCALE
        } else {
            1.0
        }
    }

    /// Derive the UI style from `base`
    pub fn styled(&self, base: &Style) -> Style {
        let mut style = base.clone();
        if self.large_font {
            for font in style.text_styles.values_mut() {
                font.size *= FONT_SCALE;
            }
        }
        if self.reduce_motion {
            style.animation_time = 0.0;
        }
        if self.high_contrast {
            let visuals = &mut style.visuals;
            let (fg, bg) = if visuals.dark_mode {
                (Color32::WHITE, Color32::BLACK)
            } else {
                (Color32::BLACK, Color32::WHITE)
            };
            visuals.override_text_color = Some(fg);
            visuals.panel_fill = bg;
            visuals.window_fill = bg;
            visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, fg);
            visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, fg);
        }
        if self.focus_visible {
            let focus = Stroke::new(3.0, Color32::from_rgb(0xFD, 0xC8, 0x06));
            style.visuals.selection.stroke = focus;
            style.visuals.widgets.hovered.bg_stroke = focus;
            style.visuals.widgets.active.bg_stroke = focus;
        }
        style
    }
}
