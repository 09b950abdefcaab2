//! Amortization engine: annuity primitives, loan totals and schedules

pub mod annuity;
mod summary;
mod schedule;

pub use annuity::{
    payment_for, principal_for, term_for, solve_monthly_rate, rate_sensitivity,
    monthly_rate, annual_rate_percent, SensitivityPoint,
};
pub use summary::{ResolvedLoan, LoanTotals, summarize};
pub use schedule::{
    simulate_schedule, Schedule, ScheduleOptions, ScheduleRow, ScheduleSummary, RateReset, TableView,
};
