//! Calculation entry point
//!
//! Holds the engine configuration once, then answers any number of requests.
//! Each request composes its effective rate through a fresh rate cache, runs
//! the field resolver, and optionally attaches a schedule and a rate
//! sensitivity band.

use crate::amortization::{
    rate_sensitivity, simulate_schedule, RateReset, ScheduleOptions, ScheduleRow, ScheduleSummary,
    SensitivityPoint,
};
use crate::config::EngineConfig;
use crate::error::{EngineResult, MortgageError};
use crate::loan::{CalculationRequest, LoanField, LoanParameters, LoanType};
use crate::rates::{RateCache, RateComposer, RateProvider, ReferenceRate};
use crate::resolver::{resolve, CalculationResult};
use serde::{Deserialize, Serialize};

/// Everything returned for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageReport {
    #[serde(flatten)]
    pub result: CalculationResult,

    /// Annual rate in percent the loan was calculated at
    pub effective_rate_percent: f64,

    /// Reference fixing behind a variable rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_rate: Option<ReferenceRate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amortization: Option<Vec<ScheduleRow>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_summary: Option<ScheduleSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<Vec<SensitivityPoint>>,
}

/// Mortgage calculator bound to one engine configuration
///
/// # Example
/// ```ignore
/// let calculator = MortgageCalculator::new(EngineConfig::default());
/// let provider = StaticRateProvider::new();
/// let report = calculator.calculate(&request, &provider)?;
/// println!("{} = {:.2}", report.result.calculated_field, report.result.calculated_value);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MortgageCalculator {
    config: EngineConfig,
}

impl MortgageCalculator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one request against `provider`
    pub fn calculate(
        &self,
        request: &CalculationRequest,
        provider: &dyn RateProvider,
    ) -> EngineResult<MortgageReport> {
        request.validate_extras()?;
        let params = request.parameters();
        params.validate()?;
        check_unknowns(&params, request.loan_type)?;

        let spread = self.spread_for(request);
        let mut composer = RateComposer::new(&self.config, RateCache::new(provider));

        // A fixed loan without a rate is the rate solve; nothing to compose
        let (params, reference_rate) =
            if request.loan_type == LoanType::Fixed && params.annual_rate_percent.is_none() {
                (params, None)
            } else {
                let effective = composer.effective_rate(
                    request.loan_type,
                    params.annual_rate_percent,
                    spread,
                    request.tenor,
                )?;
                (params.with_rate(effective.annual_rate_percent), effective.reference)
            };

        let cache = composer.cache();
        if !cache.is_empty() {
            log::debug!(
                "Rate cache: {} tenors, {} hits, {} misses (hit rate {:.2})",
                cache.len(),
                cache.hits,
                cache.misses,
                cache.hit_rate()
            );
        }

        let result = resolve(&params, &self.config.solver)?;
        let loan = result.loan;

        let (amortization, schedule_summary) = if request.include_schedule {
            let options = self.schedule_options(request, spread);
            let schedule = simulate_schedule(&loan, &options, self.config.max_schedule_months);
            (Some(schedule.rows), Some(schedule.summary))
        } else {
            (None, None)
        };

        let sensitivity = request.include_sensitivity.then(|| {
            rate_sensitivity(
                loan.principal(),
                loan.annual_rate_percent,
                loan.term_months,
                self.config.sensitivity_span_percent,
                self.config.sensitivity_step_percent,
            )
        });

        Ok(MortgageReport {
            effective_rate_percent: loan.annual_rate_percent,
            result,
            reference_rate,
            amortization,
            schedule_summary,
            sensitivity,
        })
    }

    /// Spread over the reference rate; fixed loans carry none
    fn spread_for(&self, request: &CalculationRequest) -> f64 {
        if request.loan_type.is_variable() {
            request.bank_spread.unwrap_or(self.config.default_bank_spread_percent)
        } else {
            0.0
        }
    }

    /// Reset fields are paired by `validate_extras`
    fn schedule_options(&self, request: &CalculationRequest, spread: f64) -> ScheduleOptions {
        let rate_reset = request
            .fixed_period_months
            .zip(request.adjusted_interest_rate)
            .map(|(after_months, adjusted)| RateReset {
                after_months,
                annual_rate_percent: adjusted + spread,
            });

        ScheduleOptions {
            extra_monthly: request.extra_monthly,
            extra_annual: request.extra_annual,
            extra_fee_rate_percent: request.extra_fee_rate,
            bank_insurance_monthly: request.bank_insurances,
            rate_reset,
            view: request.table_view,
        }
    }
}

/// Exactly one field must be unknown. For variable loans the rate slot is
/// always filled from the reference rate, so it does not count.
fn check_unknowns(params: &LoanParameters, loan_type: LoanType) -> EngineResult<()> {
    let mut missing = params.missing_fields();
    if loan_type.is_variable() {
        missing.retain(|f| *f != LoanField::AnnualRatePercent);
    }

    match missing.len() {
        1 => Ok(()),
        0 => Err(MortgageError::Overspecified),
        _ => Err(MortgageError::Underspecified {
            missing: missing.iter().map(|f| f.as_str().to_string()).collect(),
        }),
    }
}
