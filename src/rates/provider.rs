//! Reference-rate providers: in-memory fixings and CSV rate files
//!
//! CSV files carry one fixing per row:
//!
//! ```text
//! date,tenor,rate
//! 2024-03-01,3M,3.921
//! 2024-03-01,12M,3.718
//! ```

use super::{RateProvider, ReferenceRate, Tenor};
use crate::error::{EngineResult, MortgageError};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default rate file location
pub const DEFAULT_RATES_PATH: &str = "data/euribor.csv";

/// Fixed set of latest fixings, one per tenor
#[derive(Debug, Clone, Default)]
pub struct StaticRateProvider {
    rates: HashMap<Tenor, ReferenceRate>,
}

impl StaticRateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a fixing
    pub fn with_rate(mut self, tenor: Tenor, annual_rate_percent: f64, as_of: NaiveDate) -> Self {
        self.insert(ReferenceRate { tenor, annual_rate_percent, as_of });
        self
    }

    pub fn insert(&mut self, rate: ReferenceRate) {
        self.rates.insert(rate.tenor, rate);
    }
}

impl RateProvider for StaticRateProvider {
    fn latest_rate(&self, tenor: Tenor) -> EngineResult<Option<ReferenceRate>> {
        Ok(self.rates.get(&tenor).cloned())
    }

    fn historical_rates(
        &self,
        tenor: Tenor,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ReferenceRate>> {
        check_range(from, to)?;
        Ok(self
            .rates
            .get(&tenor)
            .filter(|r| r.as_of >= from && r.as_of <= to)
            .cloned()
            .into_iter()
            .collect())
    }
}

/// Raw CSV row of a rate file
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    date: String,
    tenor: String,
    rate: f64,
}

impl CsvRow {
    fn to_rate(self) -> EngineResult<ReferenceRate> {
        let as_of = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|e| MortgageError::Data(format!("bad date {:?}: {}", self.date, e)))?;
        let tenor: Tenor = self.tenor.parse()?;
        if !self.rate.is_finite() {
            return Err(MortgageError::Data(format!(
                "non-finite rate for {} on {}",
                tenor, as_of
            )));
        }
        Ok(ReferenceRate {
            tenor,
            annual_rate_percent: self.rate,
            as_of,
        })
    }
}

/// Historical fixings loaded from a CSV rate file, sorted by date per tenor
#[derive(Debug, Clone, Default)]
pub struct CsvRateProvider {
    series: HashMap<Tenor, Vec<ReferenceRate>>,
}

impl CsvRateProvider {
    /// Load from the default location
    pub fn load_default() -> EngineResult<Self> {
        Self::load(Path::new(DEFAULT_RATES_PATH))
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let file = File::open(path)?;
        let provider = Self::from_reader(file)?;
        log::info!(
            "Loaded {} reference-rate fixings from {}",
            provider.len(),
            path.display()
        );
        Ok(provider)
    }

    pub fn from_reader<R: Read>(reader: R) -> EngineResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut series: HashMap<Tenor, Vec<ReferenceRate>> = HashMap::new();

        for result in csv_reader.deserialize() {
            let row: CsvRow = result?;
            let rate = row.to_rate()?;
            series.entry(rate.tenor).or_default().push(rate);
        }

        for fixings in series.values_mut() {
            fixings.sort_by_key(|r| r.as_of);
            // A later row for the same date replaces the earlier one
            fixings.reverse();
            fixings.dedup_by_key(|r| r.as_of);
            fixings.reverse();
        }

        Ok(Self { series })
    }

    /// Number of fixings across all tenors
    pub fn len(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RateProvider for CsvRateProvider {
    fn latest_rate(&self, tenor: Tenor) -> EngineResult<Option<ReferenceRate>> {
        Ok(self.series.get(&tenor).and_then(|s| s.last()).cloned())
    }

    fn historical_rates(
        &self,
        tenor: Tenor,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ReferenceRate>> {
        check_range(from, to)?;
        Ok(self
            .series
            .get(&tenor)
            .map(|s| {
                s.iter()
                    .filter(|r| r.as_of >= from && r.as_of <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn check_range(from: NaiveDate, to: NaiveDate) -> EngineResult<()> {
    if from > to {
        return Err(MortgageError::invalid(
            "from_date",
            format!("{from} is after {to}"),
        ));
    }
    Ok(())
}
