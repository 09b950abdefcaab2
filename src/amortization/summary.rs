//! Fully determined loans and their closed-form totals

use super::annuity::monthly_rate;
use serde::{Deserialize, Serialize};

/// A loan with all five quantities known
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLoan {
    pub house_price: f64,
    pub down_payment: f64,
    pub term_months: u32,
    pub annual_rate_percent: f64,
    pub monthly_payment: f64,
}

impl ResolvedLoan {
    /// Amount borrowed: house price less down payment
    pub fn principal(&self) -> f64 {
        self.house_price - self.down_payment
    }

    pub fn monthly_rate(&self) -> f64 {
        monthly_rate(self.annual_rate_percent)
    }

    pub fn totals(&self) -> LoanTotals {
        summarize(self)
    }
}

/// Closed-form totals of a level-payment loan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTotals {
    pub total_borrowed: f64,
    pub total_interest: f64,
    pub total_cost: f64,
    pub duration_months: u32,
}

pub fn summarize(loan: &ResolvedLoan) -> LoanTotals {
    let total_borrowed = loan.principal();
    let total_cost = loan.monthly_payment * loan.term_months as f64;
    LoanTotals {
        total_borrowed,
        total_interest: total_cost - total_borrowed,
        total_cost,
        duration_months: loan.term_months,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::annuity::payment_for;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_scenario_totals() {
        let loan = ResolvedLoan {
            house_price: 300_000.0,
            down_payment: 60_000.0,
            term_months: 360,
            annual_rate_percent: 2.5,
            monthly_payment: payment_for(240_000.0, monthly_rate(2.5), 360),
        };
        let totals = loan.totals();
        assert_eq!(totals.total_borrowed, 240_000.0);
        assert_abs_diff_eq!(totals.total_interest, 101_384.46, epsilon = 0.01);
        assert_abs_diff_eq!(totals.total_cost, 341_384.46, epsilon = 0.01);
        assert_abs_diff_eq!(
            totals.total_cost,
            totals.total_borrowed + totals.total_interest,
            epsilon = 1e-9
        );
        assert_eq!(totals.duration_months, 360);
    }
}
