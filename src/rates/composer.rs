//! Effective-rate composition for the three loan regimes

use super::{RateCache, ReferenceRate, Tenor};
use crate::config::EngineConfig;
use crate::error::{EngineResult, MortgageError};
use crate::loan::LoanType;
use serde::{Deserialize, Serialize};

/// Effective nominal annual rate in percent.
///
/// Fixed loans use the user rate as given; the spread is not added.
/// Adjustable and full-variable loans use `reference + spread` and ignore any
/// user rate. A missing reference rate is an error, never a zero rate, and so
/// is a composed rate below zero.
pub fn compose_rate(
    loan_type: LoanType,
    user_rate_percent: Option<f64>,
    spread_percent: f64,
    reference: Option<&ReferenceRate>,
) -> EngineResult<f64> {
    match loan_type {
        LoanType::Fixed => user_rate_percent.ok_or(MortgageError::MissingRate),
        LoanType::Adjustable | LoanType::FullVariable => match reference {
            Some(rate) => {
                let composed = rate.annual_rate_percent + spread_percent;
                if composed < 0.0 {
                    return Err(MortgageError::invalid(
                        "bank_spread",
                        format!(
                            "{} reference {:.4}% plus spread {:.4}% gives a negative rate ({:.4}%)",
                            rate.tenor, rate.annual_rate_percent, spread_percent, composed
                        ),
                    ));
                }
                Ok(composed)
            }
            None => Err(MortgageError::RateUnavailable {
                tenor: "unknown".to_string(),
                reason: "no reference rate supplied".to_string(),
            }),
        },
    }
}

/// Effective rate together with the fixing it was built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveRate {
    pub annual_rate_percent: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceRate>,
}

/// Resolves effective rates for one request
pub struct RateComposer<'c, 'p> {
    config: &'c EngineConfig,
    cache: RateCache<'p>,
}

impl<'c, 'p> RateComposer<'c, 'p> {
    pub fn new(config: &'c EngineConfig, cache: RateCache<'p>) -> Self {
        Self { config, cache }
    }

    /// Tenor used for a variable loan type, unless the request names one
    pub fn tenor_for(&self, loan_type: LoanType, requested: Option<Tenor>) -> Option<Tenor> {
        match loan_type {
            LoanType::Fixed => None,
            LoanType::Adjustable => Some(requested.unwrap_or(self.config.adjustable_tenor)),
            LoanType::FullVariable => Some(requested.unwrap_or(self.config.variable_tenor)),
        }
    }

    pub fn effective_rate(
        &mut self,
        loan_type: LoanType,
        user_rate_percent: Option<f64>,
        spread_percent: f64,
        requested_tenor: Option<Tenor>,
    ) -> EngineResult<EffectiveRate> {
        let reference = match self.tenor_for(loan_type, requested_tenor) {
            Some(tenor) => {
                if user_rate_percent.is_some() {
                    log::debug!("Ignoring user rate for {:?} loan; using {} reference", loan_type, tenor);
                }
                Some(self.cache.latest(tenor)?)
            }
            None => None,
        };

        let annual_rate_percent =
            compose_rate(loan_type, user_rate_percent, spread_percent, reference.as_ref())?;
        log::debug!(
            "Effective rate {:.4}% ({:?}, spread {:.4}%)",
            annual_rate_percent,
            loan_type,
            spread_percent
        );

        Ok(EffectiveRate { annual_rate_percent, reference })
    }

    pub fn cache(&self) -> &RateCache<'p> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{RateProvider, StaticRateProvider};
    use chrono::NaiveDate;

    fn fixing(tenor: Tenor, rate: f64) -> ReferenceRate {
        ReferenceRate {
            tenor,
            annual_rate_percent: rate,
            as_of: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    #[test]
    fn test_fixed_returns_user_rate_unchanged() {
        let rate = compose_rate(LoanType::Fixed, Some(2.5), 0.75, None).unwrap();
        assert_eq!(rate, 2.5);
    }

    #[test]
    fn test_fixed_without_rate_is_missing_rate() {
        let err = compose_rate(LoanType::Fixed, None, 0.0, None).unwrap_err();
        assert_eq!(err.kind(), "MissingRateError");
    }

    #[test]
    fn test_variable_adds_spread_and_ignores_user_rate() {
        let reference = fixing(Tenor::TwelveMonths, 3.2);
        for loan_type in [LoanType::Adjustable, LoanType::FullVariable] {
            let rate = compose_rate(loan_type, Some(9.9), 0.5, Some(&reference)).unwrap();
            assert!((rate - 3.7).abs() < 1e-12);
        }
    }

    #[test]
    fn test_negative_composed_rate_is_invalid() {
        let reference = fixing(Tenor::ThreeMonths, -0.5);
        let err = compose_rate(LoanType::FullVariable, None, 0.2, Some(&reference)).unwrap_err();
        assert_eq!(err.kind(), "InvalidInputError");
        assert!(err.to_string().contains("-0.5000%"));

        // A negative fixing is fine while the spread lifts it to zero or above
        let rate = compose_rate(LoanType::Adjustable, None, 0.5, Some(&reference)).unwrap();
        assert_eq!(rate, 0.0);
    }

    #[test]
    fn test_variable_without_reference_is_unavailable() {
        let err = compose_rate(LoanType::Adjustable, Some(2.0), 0.5, None).unwrap_err();
        assert_eq!(err.kind(), "RateUnavailableError");
    }

    #[test]
    fn test_composer_picks_tenor_by_loan_type() {
        let config = EngineConfig::default();
        let provider = StaticRateProvider::new()
            .with_rate(Tenor::TwelveMonths, 3.6, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .with_rate(Tenor::ThreeMonths, 3.9, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let mut composer = RateComposer::new(&config, RateCache::new(&provider));

        let adjustable = composer.effective_rate(LoanType::Adjustable, None, 0.5, None).unwrap();
        assert!((adjustable.annual_rate_percent - 4.1).abs() < 1e-12);
        assert_eq!(adjustable.reference.unwrap().tenor, Tenor::TwelveMonths);

        let variable = composer.effective_rate(LoanType::FullVariable, None, 0.0, None).unwrap();
        assert!((variable.annual_rate_percent - 3.9).abs() < 1e-12);

        let overridden = composer
            .effective_rate(LoanType::Adjustable, None, 0.0, Some(Tenor::ThreeMonths))
            .unwrap();
        assert!((overridden.annual_rate_percent - 3.9).abs() < 1e-12);
        assert_eq!(composer.cache().hits, 1);
    }

    #[test]
    fn test_fixed_loan_never_touches_provider() {
        struct PanickingProvider;
        impl RateProvider for PanickingProvider {
            fn latest_rate(&self, _tenor: Tenor) -> EngineResult<Option<ReferenceRate>> {
                panic!("fixed loans must not fetch reference rates");
            }
            fn historical_rates(
                &self,
                _tenor: Tenor,
                _from: NaiveDate,
                _to: NaiveDate,
            ) -> EngineResult<Vec<ReferenceRate>> {
                Ok(Vec::new())
            }
        }

        let config = EngineConfig::default();
        let provider = PanickingProvider;
        let mut composer = RateComposer::new(&config, RateCache::new(&provider));
        let rate = composer.effective_rate(LoanType::Fixed, Some(4.0), 1.0, None).unwrap();
        assert_eq!(rate.annual_rate_percent, 4.0);
        assert!(rate.reference.is_none());
    }

    #[test]
    fn test_composer_surfaces_unavailable_rate() {
        let config = EngineConfig::default();
        let provider = StaticRateProvider::new();
        let mut composer = RateComposer::new(&config, RateCache::new(&provider));
        let err = composer
            .effective_rate(LoanType::Adjustable, None, 0.5, None)
            .unwrap_err();
        match err {
            MortgageError::RateUnavailable { tenor, .. } => assert_eq!(tenor, "12M"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
