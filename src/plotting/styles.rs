use plotters::style::RGBAColor;

use crate::types::ThemeState;

/// Chart theme configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartTheme {
    pub background_color: RGBAColor,
    pub text_color: RGBAColor,
    pub grid_color: RGBAColor,
}

impl ChartTheme {
    pub fn dark() -> Self {
        Self {
            background_color: RGBAColor(17, 17, 17, 1.0),
            text_color: RGBAColor(0xAA, 0xAA, 0xAA, 1.0),
            grid_color: RGBAColor(255, 255, 255, 0.05),
        }
    }

    pub fn light() -> Self {
        Self {
            background_color: RGBAColor(255, 255, 255, 1.0),
            text_color: RGBAColor(0, 0, 0, 1.0),
            grid_color: RGBAColor(0x44, 0x44, 0x44, 1.0),
        }
    }

    pub fn for_state(theme: ThemeState) -> Self {
        match theme {
            ThemeState::Light => Self::light(),
            ThemeState::Dark => Self::dark(),
        }
    }
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self::dark()
    }
}

/// The theme-dependent attributes every chart carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleAttrs {
    pub text_color: RGBAColor,
    pub grid_color: RGBAColor,
}

impl StyleAttrs {
    pub fn for_theme(is_light: bool) -> Self {
        let theme = ChartTheme::for_state(ThemeState::from_is_light(is_light));
        Self {
            text_color: theme.text_color,
            grid_color: theme.grid_color,
        }
    }

    /// Background behind the plot; follows the text color's theme
    pub fn background(&self) -> RGBAColor {
        if *self == Self::for_theme(true) {
            ChartTheme::light().background_color
        } else {
            ChartTheme::dark().background_color
        }
    }
}

impl Default for StyleAttrs {
    fn default() -> Self {
        Self::for_theme(false)
    }
}

/// Chart style configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartStyle {
    pub line_width: u32,
    pub font_size: u32,
    pub margin: u32,
    pub label_area_size: u32,
    pub size: (u32, u32),
}

impl ChartStyle {
    /// Scale fonts, e.g. for the large-font accessibility mode
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            font_size: ((self.font_size as f32) * factor).round() as u32,
            label_area_size: ((self.label_area_size as f32) * factor).round() as u32,
            ..self
        }
    }
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            line_width: 3,
            font_size: 15,
            margin: 10,
            label_area_size: 50,
            size: (560, 320),
        }
    }
}

/// Series colors.
pub mod palette {
    use plotters::style::RGBAColor;

    pub const GREEN: RGBAColor = RGBAColor(0x00, 0x90, 0x39, 1.0);
    pub const YELLOW: RGBAColor = RGBAColor(0xFD, 0xC8, 0x06, 1.0);
    pub const BLUE: RGBAColor = RGBAColor(0x00, 0x56, 0xB3, 1.0);
    pub const LIGHT_BLUE: RGBAColor = RGBAColor(0x00, 0xA8, 0xE8, 1.0);
    pub const RED: RGBAColor = RGBAColor(0xFF, 0x44, 0x44, 1.0);
    pub const GRAY: RGBAColor = RGBAColor(0x99, 0x99, 0x99, 1.0);

    pub const SERIES: [RGBAColor; 5] = [BLUE, GREEN, YELLOW, GRAY, LIGHT_BLUE];

    /// Luminance-preserving gray for the grayscale accessibility mode
    pub fn grayscale(color: RGBAColor) -> RGBAColor {
        let RGBAColor(r, g, b, a) = color;
        let luma = (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64).round() as u8;
        RGBAColor(luma, luma, luma, a)
    }

    pub fn nth(idx: usize, grayscale_mode: bool) -> RGBAColor {
        let color = SERIES[idx % SERIES.len()];
        if grayscale_mode {
            grayscale(color)
        } else {
            color
        }
    }
}
