//! Engine configuration
//!
//! Everything the solvers need is passed in explicitly; nothing here is global.
//! Binaries may overlay environment variables with [`EngineConfig::from_env`].

use crate::error::{EngineResult, MortgageError};
use crate::rates::Tenor;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Numeric policy for the iterative rate solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Absolute payment tolerance in currency units
    pub tolerance: f64,

    /// Bisection iteration cap (bracket growth shares the same cap)
    pub max_iterations: u32,

    /// Initial upper bracket for the monthly rate (1.0 = 100% per month)
    pub initial_upper_rate: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 200,
            initial_upper_rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub solver: SolverConfig,

    /// Spread applied when a request does not name one
    pub default_bank_spread_percent: f64,

    /// Reference tenor for adjustable loans
    pub adjustable_tenor: Tenor,

    /// Reference tenor for full-variable loans
    pub variable_tenor: Tenor,

    /// Hard stop for schedule simulation
    pub max_schedule_months: u32,

    /// Half-width of the rate sensitivity band, in percentage points
    pub sensitivity_span_percent: f64,

    /// Step of the rate sensitivity band, in percentage points
    pub sensitivity_step_percent: f64,

    /// Budget the service gives one calculation, rate lookup included
    pub rate_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            default_bank_spread_percent: 0.0,
            adjustable_tenor: Tenor::TwelveMonths,
            variable_tenor: Tenor::ThreeMonths,
            max_schedule_months: 1000,
            sensitivity_span_percent: 2.0,
            sensitivity_step_percent: 0.25,
            rate_timeout_ms: 5000,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `MORTGAGE_*` environment variables
    pub fn from_env() -> EngineResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overlaid with values from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "MORTGAGE_TOLERANCE")? {
            config.solver.tolerance = v;
        }
        if let Some(v) = parse_var(&lookup, "MORTGAGE_MAX_ITERATIONS")? {
            config.solver.max_iterations = v;
        }
        if let Some(v) = parse_var(&lookup, "MORTGAGE_DEFAULT_SPREAD")? {
            config.default_bank_spread_percent = v;
        }
        if let Some(v) = parse_var(&lookup, "MORTGAGE_ADJUSTABLE_TENOR")? {
            config.adjustable_tenor = v;
        }
        if let Some(v) = parse_var(&lookup, "MORTGAGE_VARIABLE_TENOR")? {
            config.variable_tenor = v;
        }
        if let Some(v) = parse_var(&lookup, "MORTGAGE_MAX_SCHEDULE_MONTHS")? {
            config.max_schedule_months = v;
        }
        if let Some(v) = parse_var(&lookup, "MORTGAGE_RATE_TIMEOUT_MS")? {
            config.rate_timeout_ms = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(self.solver.tolerance > 0.0 && self.solver.tolerance.is_finite()) {
            return Err(MortgageError::Config("solver tolerance must be positive".to_string()));
        }
        if self.solver.max_iterations == 0 {
            return Err(MortgageError::Config("max_iterations must be at least 1".to_string()));
        }
        if !(self.solver.initial_upper_rate > 0.0) {
            return Err(MortgageError::Config("initial_upper_rate must be positive".to_string()));
        }
        if self.default_bank_spread_percent < 0.0 {
            return Err(MortgageError::Config("default spread must be non-negative".to_string()));
        }
        if self.max_schedule_months == 0 {
            return Err(MortgageError::Config("max_schedule_months must be at least 1".to_string()));
        }
        if !(self.sensitivity_step_percent > 0.0) || self.sensitivity_span_percent < 0.0 {
            return Err(MortgageError::Config("sensitivity band must have a positive step".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> EngineResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| MortgageError::Config(format!("{key}={raw:?}: {e}"))),
        None => Ok(None),
    }
}
