//! Field resolver: works out which loan quantity is missing and solves for it
//!
//! Each missing field has its own strategy. Four are closed form; the interest
//! rate has no closed form and is found by bisection.

use crate::amortization::{
    annual_rate_percent as to_annual_percent, monthly_rate, payment_for, principal_for, solve_monthly_rate, summarize,
    term_for, ResolvedLoan,
};
use crate::config::SolverConfig;
use crate::error::{EngineResult, MortgageError};
use crate::loan::{LoanField, LoanParameters};
use serde::{Deserialize, Serialize};

/// Outcome of a calculation: the solved field plus the loan totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub calculated_field: LoanField,
    pub calculated_value: f64,
    pub total_borrowed: f64,
    pub total_interest: f64,
    pub total_cost: f64,
    #[serde(rename = "duration")]
    pub duration_months: u32,

    /// All five quantities after solving
    pub loan: ResolvedLoan,
}

/// Solving strategy, keyed by the missing field and carrying the known ones
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolvePlan {
    MonthlyPayment { house_price: f64, down_payment: f64, term_months: u32, annual_rate_percent: f64 },
    HousePrice { down_payment: f64, term_months: u32, annual_rate_percent: f64, payment: f64 },
    DownPayment { house_price: f64, term_months: u32, annual_rate_percent: f64, payment: f64 },
    TermMonths { house_price: f64, down_payment: f64, annual_rate_percent: f64, payment: f64 },
    AnnualRate { house_price: f64, down_payment: f64, term_months: u32, payment: f64 },
}

impl SolvePlan {
    /// Pick the strategy; exactly one field must be unknown
    pub fn from_params(params: &LoanParameters) -> EngineResult<Self> {
        let LoanParameters {
            house_price,
            down_payment,
            term_months,
            annual_rate_percent,
            monthly_payment,
        } = *params;

        match (house_price, down_payment, term_months, annual_rate_percent, monthly_payment) {
            (Some(house_price), Some(down_payment), Some(term_months), Some(annual_rate_percent), None) => {
                Ok(SolvePlan::MonthlyPayment { house_price, down_payment, term_months, annual_rate_percent })
            }
            (None, Some(down_payment), Some(term_months), Some(annual_rate_percent), Some(payment)) => {
                Ok(SolvePlan::HousePrice { down_payment, term_months, annual_rate_percent, payment })
            }
            (Some(house_price), None, Some(term_months), Some(annual_rate_percent), Some(payment)) => {
                Ok(SolvePlan::DownPayment { house_price, term_months, annual_rate_percent, payment })
            }
            (Some(house_price), Some(down_payment), None, Some(annual_rate_percent), Some(payment)) => {
                Ok(SolvePlan::TermMonths { house_price, down_payment, annual_rate_percent, payment })
            }
            (Some(house_price), Some(down_payment), Some(term_months), None, Some(payment)) => {
                Ok(SolvePlan::AnnualRate { house_price, down_payment, term_months, payment })
            }
            (Some(_), Some(_), Some(_), Some(_), Some(_)) => Err(MortgageError::Overspecified),
            _ => Err(MortgageError::Underspecified {
                missing: params
                    .missing_fields()
                    .iter()
                    .map(|f| f.as_str().to_string())
                    .collect(),
            }),
        }
    }

    pub fn field(&self) -> LoanField {
        match self {
            SolvePlan::MonthlyPayment { .. } => LoanField::MonthlyPayment,
            SolvePlan::HousePrice { .. } => LoanField::HousePrice,
            SolvePlan::DownPayment { .. } => LoanField::DownPayment,
            SolvePlan::TermMonths { .. } => LoanField::TermMonths,
            SolvePlan::AnnualRate { .. } => LoanField::AnnualRatePercent,
        }
    }

    /// Solve the missing field; returns its value and the completed loan
    pub fn solve(self, solver: &SolverConfig) -> EngineResult<(f64, ResolvedLoan)> {
        match self {
            SolvePlan::MonthlyPayment { house_price, down_payment, term_months, annual_rate_percent } => {
                let rate = monthly_rate(annual_rate_percent);
                let payment = payment_for(house_price - down_payment, rate, term_months);
                let loan = ResolvedLoan {
                    house_price,
                    down_payment,
                    term_months,
                    annual_rate_percent,
                    monthly_payment: payment,
                };
                Ok((payment, loan))
            }

            SolvePlan::HousePrice { down_payment, term_months, annual_rate_percent, payment } => {
                let rate = monthly_rate(annual_rate_percent);
                let house_price = principal_for(payment, rate, term_months) + down_payment;
                let loan = ResolvedLoan {
                    house_price,
                    down_payment,
                    term_months,
                    annual_rate_percent,
                    monthly_payment: payment,
                };
                Ok((house_price, loan))
            }

            SolvePlan::DownPayment { house_price, term_months, annual_rate_percent, payment } => {
                let rate = monthly_rate(annual_rate_percent);
                let down_payment = house_price - principal_for(payment, rate, term_months);
                if down_payment < -solver.tolerance {
                    return Err(MortgageError::NegativeValue {
                        field: LoanField::DownPayment.as_str().to_string(),
                        value: down_payment,
                    });
                }
                let down_payment = down_payment.max(0.0);
                let loan = ResolvedLoan {
                    house_price,
                    down_payment,
                    term_months,
                    annual_rate_percent,
                    monthly_payment: payment,
                };
                Ok((down_payment, loan))
            }

            SolvePlan::TermMonths { house_price, down_payment, annual_rate_percent, payment } => {
                let rate = monthly_rate(annual_rate_percent);
                let term_months = term_for(house_price - down_payment, payment, rate)?;
                let loan = ResolvedLoan {
                    house_price,
                    down_payment,
                    term_months,
                    annual_rate_percent,
                    monthly_payment: payment,
                };
                Ok((term_months as f64, loan))
            }

            SolvePlan::AnnualRate { house_price, down_payment, term_months, payment } => {
                let rate = solve_monthly_rate(house_price - down_payment, payment, term_months, solver)?;
                let annual = to_annual_percent(rate);
                let loan = ResolvedLoan {
                    house_price,
                    down_payment,
                    term_months,
                    annual_rate_percent: annual,
                    monthly_payment: payment,
                };
                Ok((annual, loan))
            }
        }
    }
}

/// Validate, dispatch on the missing field, solve, and total up the loan.
///
/// The rate slot of `params` must already hold the effective rate (or be the
/// missing field).
pub fn resolve(params: &LoanParameters, solver: &SolverConfig) -> EngineResult<CalculationResult> {
    params.validate()?;
    let plan = SolvePlan::from_params(params)?;
    let field = plan.field();
    log::debug!("Solving for {}", field);

    let (calculated_value, loan) = plan.solve(solver)?;
    let totals = summarize(&loan);
    log::info!(
        "Solved {} = {:.6} (borrowed {:.2}, {} months)",
        field,
        calculated_value,
        totals.total_borrowed,
        totals.duration_months
    );

    Ok(CalculationResult {
        calculated_field: field,
        calculated_value,
        total_borrowed: totals.total_borrowed,
        total_interest: totals.total_interest,
        total_cost: totals.total_cost,
        duration_months: totals.duration_months,
        loan,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const PAYMENT: f64 = 948.290_157_162_525;

    fn scenario() -> LoanParameters {
        LoanParameters {
            house_price: Some(300_000.0),
            down_payment: Some(60_000.0),
            term_months: Some(360),
            annual_rate_percent: Some(2.5),
            monthly_payment: Some(PAYMENT),
        }
    }

    fn solve(params: LoanParameters) -> EngineResult<CalculationResult> {
        resolve(&params, &SolverConfig::default())
    }

    #[test]
    fn test_solve_monthly_payment() {
        let result = solve(LoanParameters { monthly_payment: None, ..scenario() }).unwrap();
        assert_eq!(result.calculated_field, LoanField::MonthlyPayment);
        assert_abs_diff_eq!(result.calculated_value, 948.29, epsilon = 0.01);
        assert_eq!(result.total_borrowed, 240_000.0);
        assert_abs_diff_eq!(result.total_interest, 101_384.46, epsilon = 0.01);
        assert_abs_diff_eq!(result.total_cost, 341_384.46, epsilon = 0.01);
        assert_eq!(result.duration_months, 360);
    }

    #[test]
    fn test_solve_house_price() {
        let result = solve(LoanParameters { house_price: None, ..scenario() }).unwrap();
        assert_eq!(result.calculated_field, LoanField::HousePrice);
        assert_abs_diff_eq!(result.calculated_value, 300_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.total_borrowed, 240_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_solve_down_payment() {
        let result = solve(LoanParameters { down_payment: None, ..scenario() }).unwrap();
        assert_eq!(result.calculated_field, LoanField::DownPayment);
        assert_abs_diff_eq!(result.calculated_value, 60_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_down_payment_negative_when_payment_too_high() {
        // A 2000/month payment supports far more than a 300k house
        let params = LoanParameters {
            down_payment: None,
            monthly_payment: Some(2_000.0),
            ..scenario()
        };
        let err = solve(params).unwrap_err();
        match err {
            MortgageError::NegativeValue { field, value } => {
                assert_eq!(field, "down_payment");
                assert!(value < 0.0);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_solve_term() {
        let result = solve(LoanParameters { term_months: None, ..scenario() }).unwrap();
        assert_eq!(result.calculated_field, LoanField::TermMonths);
        assert_eq!(result.calculated_value, 360.0);
        assert_eq!(result.duration_months, 360);
    }

    #[test]
    fn test_solve_term_zero_rate() {
        let params = LoanParameters {
            term_months: None,
            annual_rate_percent: Some(0.0),
            monthly_payment: Some(1_000.0),
            ..scenario()
        };
        let result = solve(params).unwrap();
        assert_eq!(result.duration_months, 240);
        assert_abs_diff_eq!(result.total_interest, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_solved_term_covers_principal() {
        let params = LoanParameters {
            house_price: Some(1_000.0),
            down_payment: Some(0.0),
            term_months: None,
            annual_rate_percent: Some(0.0),
            monthly_payment: Some(700.0),
        };
        let result = solve(params).unwrap();
        assert_eq!(result.duration_months, 2);
        assert_abs_diff_eq!(result.total_cost, 1_400.0, epsilon = 1e-9);
        assert!(result.total_interest >= 0.0);

        for (rate, payment) in [(3.0, 1_111.0), (5.5, 2_345.67), (0.0, 999.0)] {
            let result = solve(LoanParameters {
                term_months: None,
                annual_rate_percent: Some(rate),
                monthly_payment: Some(payment),
                ..scenario()
            })
            .unwrap();
            assert!(result.total_interest >= 0.0, "rate={rate} payment={payment}");
        }
    }

    #[test]
    fn test_divergent_term() {
        let params = LoanParameters {
            term_months: None,
            annual_rate_percent: Some(5.0),
            monthly_payment: Some(100.0),
            ..scenario()
        };
        assert_eq!(solve(params).unwrap_err().kind(), "DivergentLoanError");
    }

    #[test]
    fn test_solve_rate() {
        let params = LoanParameters {
            annual_rate_percent: None,
            monthly_payment: Some(948.69),
            ..scenario()
        };
        let result = solve(params).unwrap();
        assert_eq!(result.calculated_field, LoanField::AnnualRatePercent);
        assert_abs_diff_eq!(result.calculated_value, 2.5, epsilon = 0.01);
        assert_abs_diff_eq!(result.loan.annual_rate_percent, result.calculated_value, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_rate_unreachable_payment() {
        let params = LoanParameters {
            annual_rate_percent: None,
            monthly_payment: Some(100.0),
            ..scenario()
        };
        assert_eq!(solve(params).unwrap_err().kind(), "NoConvergenceError");
    }

    #[test]
    fn test_wrong_unknown_counts() {
        let err = solve(scenario()).unwrap_err();
        assert_eq!(err.kind(), "OverspecifiedError");

        let two_missing = LoanParameters {
            house_price: None,
            annual_rate_percent: None,
            ..scenario()
        };
        match solve(two_missing).unwrap_err() {
            MortgageError::Underspecified { missing } => {
                assert_eq!(missing, vec!["house_price", "annual_rate_percent"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_invalid_input_checked_before_count() {
        let params = LoanParameters {
            house_price: Some(-5.0),
            down_payment: None,
            monthly_payment: None,
            ..scenario()
        };
        assert_eq!(solve(params).unwrap_err().kind(), "InvalidInputError");
    }

    #[test]
    fn test_plan_field_mapping() {
        let plan = SolvePlan::from_params(&LoanParameters { annual_rate_percent: None, ..scenario() }).unwrap();
        assert_eq!(plan.field(), LoanField::AnnualRatePercent);
        assert!(matches!(plan, SolvePlan::AnnualRate { term_months: 360, .. }));
    }

    #[test]
    fn test_result_json_shape() {
        let result = solve(LoanParameters { monthly_payment: None, ..scenario() }).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["calculated_field"], "monthly_payment");
        assert_eq!(json["duration"], 360);
        assert!(json.get("total_borrowed").is_some());
    }
}
