//! Reference rates (EURIBOR) and effective-rate composition
//!
//! The rate source itself is an external collaborator behind [`RateProvider`].
//! The engine only reads immutable [`ReferenceRate`] values from it, through a
//! [`RateCache`] that lives for exactly one calculation request.

mod provider;
mod cache;
mod composer;

pub use provider::{StaticRateProvider, CsvRateProvider, DEFAULT_RATES_PATH};
pub use cache::RateCache;
pub use composer::{compose_rate, EffectiveRate, RateComposer};

use crate::error::{EngineResult, MortgageError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maturity label of a reference rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tenor {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "12M")]
    TwelveMonths,
}

impl Tenor {
    pub const ALL: [Tenor; 4] = [
        Tenor::OneMonth,
        Tenor::ThreeMonths,
        Tenor::SixMonths,
        Tenor::TwelveMonths,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tenor::OneMonth => "1M",
            Tenor::ThreeMonths => "3M",
            Tenor::SixMonths => "6M",
            Tenor::TwelveMonths => "12M",
        }
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tenor {
    type Err = MortgageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1M" => Ok(Tenor::OneMonth),
            "3M" => Ok(Tenor::ThreeMonths),
            "6M" => Ok(Tenor::SixMonths),
            "12M" => Ok(Tenor::TwelveMonths),
            other => Err(MortgageError::invalid(
                "tenor",
                format!("unknown tenor {other:?}, expected one of 1M, 3M, 6M, 12M"),
            )),
        }
    }
}

/// A published reference-rate fixing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRate {
    pub tenor: Tenor,

    /// Annual rate in percent (3.1 = 3.1%)
    pub annual_rate_percent: f64,

    pub as_of: NaiveDate,
}

/// Source of reference rates
///
/// `Ok(None)` means the provider answered but has no fixing for the tenor.
pub trait RateProvider: Send + Sync {
    fn latest_rate(&self, tenor: Tenor) -> EngineResult<Option<ReferenceRate>>;

    fn historical_rates(
        &self,
        tenor: Tenor,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ReferenceRate>>;
}
