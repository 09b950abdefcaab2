//! Month-by-month amortization schedule
//!
//! Walks a resolved loan forward from its level payment, with optional extra
//! principal payments, fees on those extras, bank insurance, and a single rate
//! reset (two-stage adjustable loan). The payment stays level across the reset,
//! so a reset lengthens or shortens the loan rather than changing the payment.

use super::annuity::monthly_rate;
use super::summary::ResolvedLoan;
use serde::{Deserialize, Serialize};

/// Balance at or below which the loan counts as repaid
const PAID_OFF: f64 = 0.01;

/// Row granularity of the returned schedule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableView {
    #[default]
    Monthly,
    Yearly,
}

/// Switch to a new annual rate after the initial fixed period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateReset {
    /// Months at the loan's own rate; the reset rate applies from the next month
    pub after_months: u32,

    /// Effective annual rate in percent after the reset
    pub annual_rate_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOptions {
    /// Extra principal paid every month
    pub extra_monthly: f64,

    /// Extra principal paid every 12th month
    pub extra_annual: f64,

    /// Fee charged on extra payments, percent of the extra amount
    pub extra_fee_rate_percent: f64,

    /// Insurance premium added to every month's cost
    pub bank_insurance_monthly: f64,

    pub rate_reset: Option<RateReset>,

    pub view: TableView,
}

/// One schedule period (a month, or a year when aggregated)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub period: u32,
    pub payment: f64,
    pub extra: f64,
    pub fee: f64,
    pub interest: f64,
    /// Principal repaid, extra included
    pub principal: f64,
    pub balance: f64,
}

impl ScheduleRow {
    pub fn new(period: u32) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    fn accumulate(&mut self, month: &ScheduleRow) {
        self.payment += month.payment;
        self.extra += month.extra;
        self.fee += month.fee;
        self.interest += month.interest;
        self.principal += month.principal;
        self.balance = month.balance;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub months: u32,
    pub total_interest: f64,
    pub total_principal: f64,
    pub total_extra: f64,
    pub total_fees: f64,
    pub total_insurance: f64,
    /// Payments, extras, fees and insurance
    pub total_cost: f64,
    /// Simulation hit the month cap with balance outstanding
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub rows: Vec<ScheduleRow>,
    pub summary: ScheduleSummary,
}

/// Simulate the loan until repaid or `max_months` have elapsed
pub fn simulate_schedule(loan: &ResolvedLoan, options: &ScheduleOptions, max_months: u32) -> Schedule {
    let initial_rate = loan.monthly_rate();
    let (fixed_months, reset_rate) = match options.rate_reset {
        Some(reset) => (reset.after_months, monthly_rate(reset.annual_rate_percent)),
        None => (u32::MAX, initial_rate),
    };

    let mut balance = loan.principal();
    let mut month = 0;
    let mut monthly_rows = Vec::new();

    while balance > PAID_OFF && month < max_months {
        month += 1;
        let rate = if month <= fixed_months { initial_rate } else { reset_rate };

        let mut row = ScheduleRow::new(month);
        row.interest = balance * rate;

        let mut principal_part = loan.monthly_payment - row.interest;
        let mut extra = options.extra_monthly;
        if month % 12 == 0 {
            extra += options.extra_annual;
        }

        if principal_part + extra > balance {
            // Final month: settle the exact balance, no extra
            principal_part = balance;
            extra = 0.0;
            row.payment = balance + row.interest;
        } else {
            row.payment = loan.monthly_payment;
        }

        row.extra = extra;
        row.fee = extra * options.extra_fee_rate_percent / 100.0;
        row.principal = principal_part + extra;
        balance -= row.principal;
        row.balance = balance.max(0.0);

        monthly_rows.push(row);
    }

    let truncated = balance > PAID_OFF;
    if truncated {
        log::warn!(
            "Schedule stopped at {} months with {:.2} outstanding; payment does not amortize the loan",
            month,
            balance
        );
    }

    let summary = summarize_rows(&monthly_rows, options.bank_insurance_monthly, truncated);
    let rows = match options.view {
        TableView::Monthly => monthly_rows,
        TableView::Yearly => aggregate_yearly(&monthly_rows),
    };

    Schedule { rows, summary }
}

fn summarize_rows(rows: &[ScheduleRow], insurance_monthly: f64, truncated: bool) -> ScheduleSummary {
    let months = rows.len() as u32;
    let total_payments: f64 = rows.iter().map(|r| r.payment).sum();
    let total_interest: f64 = rows.iter().map(|r| r.interest).sum();
    let total_principal: f64 = rows.iter().map(|r| r.principal).sum();
    let total_extra: f64 = rows.iter().map(|r| r.extra).sum();
    let total_fees: f64 = rows.iter().map(|r| r.fee).sum();
    let total_insurance = insurance_monthly * months as f64;

    ScheduleSummary {
        months,
        total_interest,
        total_principal,
        total_extra,
        total_fees,
        total_insurance,
        total_cost: total_payments + total_extra + total_fees + total_insurance,
        truncated,
    }
}

/// Sum monthly rows into loan years; a trailing partial year is kept
fn aggregate_yearly(monthly: &[ScheduleRow]) -> Vec<ScheduleRow> {
    monthly
        .chunks(12)
        .enumerate()
        .map(|(i, months)| {
            let mut year = ScheduleRow::new(i as u32 + 1);
            for m in months {
                year.accumulate(m);
            }
            year
        })
        .collect()
}
