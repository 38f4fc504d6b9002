//! Brazilian Portuguese number formatting for KPI cards.

use num_format::{Locale, ToFormattedString};

const LOCALE: &Locale = &Locale::pt;

/// Whole number with pt-BR grouping, e.g. `440.962`. Rounds to nearest.
pub fn format_integer(value: f64) -> String {
    let rounded = value.round();
    let digits = (rounded.abs() as u64).to_formatted_string(LOCALE);
    if rounded < 0.0 {
        format!("-{}", digits)
    } else {
        digits
    }
}

/// Decimal with pt-BR separators, keeping between `min_frac` and `max_frac`
/// fraction digits: `format_decimal(18935.5, 1, 2)` gives `18.935,5`.
pub fn format_decimal(value: f64, min_frac: usize, max_frac: usize) -> String {
    let max_frac = max_frac.max(min_frac);
    let scale = 10u64.pow(max_frac as u32);
    let scaled = (value.abs() * scale as f64).round() as u64;
    let whole = (scaled / scale).to_formatted_string(LOCALE);

    let mut fraction = format!("{:0width$}", scaled % scale, width = max_frac);
    while fraction.len() > min_frac && fraction.ends_with('0') {
        fraction.pop();
    }

    let sign = if value < 0.0 && scaled > 0 { "-" } else { "" };
    if fraction.is_empty() {
        format!("{}{}", sign, whole)
    } else {
        format!("{}{}{}{}", sign, whole, LOCALE.decimal(), fraction)
    }
}

/// How a KPI value is written on its card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiFormat {
    Count,
    Currency,
    Density,
    Wages,
}

impl KpiFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            KpiFormat::Count => format_integer(value),
            KpiFormat::Currency => format!("R$ {}", format_decimal(value, 1, 2)),
            KpiFormat::Density => format!("{} hab/km²", format_decimal(value, 0, 2)),
            KpiFormat::Wages => format!("{} salários", format_decimal(value, 0, 2)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_integer_grouping() {
        assert_eq!(format_integer(440962.0), "440.962");
        assert_eq!(format_integer(458673.4), "458.673");
        assert_eq!(format_integer(12.0), "12");
        assert_eq!(format_integer(-1500.0), "-1.500");
    }

    #[test]
    fn test_decimal_trims_to_minimum() {
        assert_eq!(format_decimal(18935.50, 1, 2), "18.935,5");
        assert_eq!(format_decimal(12521.64, 0, 2), "12.521,64");
        assert_eq!(format_decimal(1.7, 0, 2), "1,7");
        assert_eq!(format_decimal(2.0, 0, 2), "2");
        assert_eq!(format_decimal(2.0, 2, 2), "2,00");
    }

    #[test]
    fn test_kpi_formats() {
        assert_eq!(KpiFormat::Count.format(440962.0), "440.962");
        assert_eq!(KpiFormat::Currency.format(18935.50), "R$ 18.935,5");
        assert_eq!(KpiFormat::Density.format(12521.64), "12.521,64 hab/km²");
        assert_eq!(KpiFormat::Wages.format(1.7), "1,7 salários");
    }
}
