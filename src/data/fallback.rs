use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::types::{MetricKey, MetricSeries};

/// Bundled series used when a metric cannot be fetched or parsed.
pub struct FallbackTable {
    entries: HashMap<MetricKey, MetricSeries>,
}

static FALLBACK_TABLE: Lazy<FallbackTable> = Lazy::new(FallbackTable::bundled);

impl FallbackTable {
    /// The process-wide table
    pub fn global() -> &'static FallbackTable {
        &FALLBACK_TABLE
    }

    fn bundled() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            MetricKey::Population,
            MetricSeries::from_pairs(&[("2010", 458673.0), ("2022", 440962.0)]),
        );
        entries.insert(
            MetricKey::Enrollment,
            MetricSeries::from_pairs(&[
                ("2019", 38500.0),
                ("2020", 39100.0),
                ("2021", 38800.0),
                ("2022", 39500.0),
                ("2023", 40100.0),
            ]),
        );
        entries.insert(
            MetricKey::EconomySectors,
            MetricSeries::from_pairs(&[
                ("Serviços", 65.0),
                ("Indústria", 15.0),
                ("Adm. Pública", 19.9),
                ("Agro", 0.1),
            ]),
        );
        entries.insert(
            MetricKey::Mortality,
            MetricSeries::from_pairs(&[
                ("2018", 15.2),
                ("2019", 14.9),
                ("2020", 14.88),
                ("2021", 14.1),
            ]),
        );
        entries.insert(
            MetricKey::Sanitation,
            MetricSeries::from_pairs(&[("Coleta Lixo", 98.7), ("Água", 91.2), ("Esgoto", 64.1)]),
        );
        entries.insert(MetricKey::Density, MetricSeries::from_pairs(&[("2022", 12521.64)]));
        entries.insert(
            MetricKey::AverageWage,
            MetricSeries::from_pairs(&[("SJM", 1.7), ("Estado RJ", 2.4), ("Brasil", 2.2)]),
        );
        entries.insert(MetricKey::GdpPerCapita, MetricSeries::from_pairs(&[("2021", 18935.50)]));

        let ideb_years = ["2005", "2007", "2009", "2011", "2013", "2015", "2017", "2019", "2021", "2023"];
        let early = [3.7, 3.6, 4.0, 4.2, 4.5, 4.5, 4.6, 4.9, 4.6, 4.9];
        let late = [2.6, 2.5, 3.5, 3.5, 3.2, 3.8, 3.5, 3.6, 4.1, 4.2];
        entries.insert(
            MetricKey::IdebEarlyYears,
            MetricSeries {
                labels: ideb_years.iter().map(|y| y.to_string()).collect(),
                values: early.to_vec(),
            },
        );
        entries.insert(
            MetricKey::IdebLateYears,
            MetricSeries {
                labels: ideb_years.iter().map(|y| y.to_string()).collect(),
                values: late.to_vec(),
            },
        );

        let school_years = ["2018", "2019", "2020", "2021", "2022", "2023", "2024"];
        let by_year = |values: [f64; 7]| MetricSeries {
            labels: school_years.iter().map(|y| y.to_string()).collect(),
            values: values.to_vec(),
        };
        entries.insert(
            MetricKey::DistortionFundamental,
            by_year([29.8, 29.1, 28.4, 27.6, 26.9, 26.1, 25.4]),
        );
        entries.insert(
            MetricKey::DistortionHighSchool,
            by_year([24.9, 24.3, 23.7, 23.1, 22.5, 21.9, 21.3]),
        );
        entries.insert(
            MetricKey::DropoutFundamental,
            by_year([2.04, 1.88, 1.72, 1.56, 1.40, 1.25, 1.10]),
        );
        entries.insert(
            MetricKey::DropoutHighSchool,
            by_year([3.08, 3.09, 3.10, 3.11, 3.13, 3.14, 3.16]),
        );
        entries.insert(MetricKey::PreschoolShare, by_year([68.0, 68.5, 69.0, 69.5, 70.0, 70.4, 70.8]));
        entries.insert(MetricKey::DaycareShare, by_year([32.0, 31.5, 31.0, 30.5, 30.0, 29.6, 29.2]));
        entries.insert(
            MetricKey::FundamentalEarlyShare,
            by_year([56.8, 56.8, 56.3, 56.9, 57.9, 57.9, 58.5]),
        );
        entries.insert(
            MetricKey::FundamentalLateShare,
            by_year([43.2, 43.2, 43.7, 43.1, 42.1, 42.1, 41.5]),
        );

        // ENEM 2023 mean scores per area
        let areas = ["Matemática", "Linguagens", "Humanas", "Natureza"];
        let by_area = |values: [f64; 4]| MetricSeries {
            labels: areas.iter().map(|a| a.to_string()).collect(),
            values: values.to_vec(),
        };
        entries.insert(MetricKey::EnemMale, by_area([344.0, 349.0, 313.0, 355.0]));
        entries.insert(MetricKey::EnemFemale, by_area([315.0, 349.0, 301.0, 350.0]));
        entries.insert(MetricKey::EnemFederal, by_area([529.0, 507.0, 435.0, 510.0]));
        entries.insert(MetricKey::EnemMunicipal, by_area([101.0, 141.0, 100.0, 130.0]));

        let enem_years = ["2017", "2018", "2019", "2020", "2021", "2022", "2023"];
        let enem_trend = |values: [f64; 7]| MetricSeries {
            labels: enem_years.iter().map(|y| y.to_string()).collect(),
            values: values.to_vec(),
        };
        entries.insert(
            MetricKey::EnemBrazil,
            enem_trend([500.4, 514.4, 491.2, 232.8, 339.7, 349.8, 354.1]),
        );
        entries.insert(
            MetricKey::EnemState,
            enem_trend([542.5, 557.8, 534.1, 261.2, 374.5, 387.2, 360.6]),
        );
        entries.insert(
            MetricKey::EnemMunicipality,
            enem_trend([511.7, 529.1, 503.2, 218.9, 333.5, 349.2, 332.8]),
        );

        Self { entries }
    }

    /// Fallback series for a metric. Every [`MetricKey`] has one.
    pub fn get(&self, key: MetricKey) -> MetricSeries {
        self.entries.get(&key).cloned().unwrap_or_default()
    }
}
