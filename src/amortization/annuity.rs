//! Annuity formula primitives
//!
//! All rates here are monthly decimals (0.0025 = 0.25% per month) and all terms
//! are whole months. Every solve branch goes through these functions so the
//! `r = 0` case and the sign conventions live in exactly one place.

use crate::config::SolverConfig;
use crate::error::{EngineResult, MortgageError};
use serde::{Deserialize, Serialize};

/// Below this monthly rate the linear (zero-interest) formulas are used
const ZERO_RATE: f64 = 1e-12;

/// Slack for float noise when rounding a solved term up to whole months
const TERM_SLACK: f64 = 1e-6;

/// Convert a nominal annual percentage to a monthly decimal rate
pub fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 100.0 / 12.0
}

/// Convert a monthly decimal rate back to a nominal annual percentage
pub fn annual_rate_percent(monthly_rate: f64) -> f64 {
    monthly_rate * 12.0 * 100.0
}

/// Level monthly payment that amortizes `principal` over `n` months.
///
/// `M = P r / (1 - (1 + r)^-n)`, equivalent to `P r (1+r)^n / ((1+r)^n - 1)`
/// but free of overflow for large `r`. `n` is treated as at least 1.
pub fn payment_for(principal: f64, rate: f64, n: u32) -> f64 {
    let n = n.max(1) as f64;
    if rate.abs() < ZERO_RATE {
        return principal / n;
    }
    principal * rate / (1.0 - (1.0 + rate).powf(-n))
}

/// Principal that a level payment of `payment` amortizes over `n` months
pub fn principal_for(payment: f64, rate: f64, n: u32) -> f64 {
    let n = n.max(1) as f64;
    if rate.abs() < ZERO_RATE {
        return payment * n;
    }
    payment * (1.0 - (1.0 + rate).powf(-n)) / rate
}

/// Number of whole months for `payment` to amortize `principal`.
///
/// Rounded up to whole months, minimum 1, so `payment * n` always covers the
/// principal. Fails with `DivergentLoan` when the payment does not exceed the
/// first month's interest.
pub fn term_for(principal: f64, payment: f64, rate: f64) -> EngineResult<u32> {
    if principal <= 0.0 {
        return Ok(1);
    }

    let interest = principal * rate;
    if payment <= interest {
        return Err(MortgageError::DivergentLoan { payment, interest });
    }

    let n = if rate.abs() < ZERO_RATE {
        principal / payment
    } else {
        (payment / (payment - interest)).ln() / (1.0 + rate).ln()
    };

    Ok((n - TERM_SLACK).ceil().clamp(1.0, u32::MAX as f64) as u32)
}

/// Monthly rate at which `payment_for(principal, r, n) == payment`.
///
/// Bisection on `r >= 0`: the payment is strictly increasing in `r`. The upper
/// bracket starts at `initial_upper_rate` and doubles until it overshoots the
/// target. Bracket growth and bisection share the `max_iterations` budget.
pub fn solve_monthly_rate(
    principal: f64,
    payment: f64,
    n: u32,
    solver: &SolverConfig,
) -> EngineResult<f64> {
    let tolerance = solver.tolerance;
    let max_iterations = solver.max_iterations;

    let zero_rate_payment = payment_for(principal, 0.0, n);
    if (zero_rate_payment - payment).abs() <= tolerance {
        return Ok(0.0);
    }
    if zero_rate_payment > payment {
        // Even an interest-free loan needs a larger payment
        return Err(MortgageError::NoConvergence {
            iterations: 0,
            last_delta: zero_rate_payment - payment,
        });
    }

    let mut iterations = 0;
    let mut low = 0.0_f64;
    let mut high = solver.initial_upper_rate;

    while payment_for(principal, high, n) < payment {
        if iterations >= max_iterations {
            return Err(MortgageError::NoConvergence {
                iterations,
                last_delta: payment - payment_for(principal, high, n),
            });
        }
        low = high;
        high *= 2.0;
        iterations += 1;
    }

    let mut previous = f64::NAN;
    let mut last_delta = f64::INFINITY;

    while iterations < max_iterations {
        iterations += 1;
        let mid = (low + high) / 2.0;
        let estimate = payment_for(principal, mid, n);
        last_delta = estimate - payment;

        if last_delta.abs() <= tolerance || (estimate - previous).abs() < tolerance {
            log::debug!("Rate solve converged after {} iterations (r = {:.10})", iterations, mid);
            return Ok(mid);
        }

        if estimate > payment {
            high = mid;
        } else {
            low = mid;
        }
        previous = estimate;
    }

    Err(MortgageError::NoConvergence { iterations, last_delta })
}

/// One point of the payment-versus-rate curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub annual_rate_percent: f64,
    pub monthly_payment: f64,
}

/// Monthly payment across a band of annual rates around `annual_rate_percent`.
///
/// Rates run from `rate - span` to `rate + span` in `step` increments;
/// negative rates are skipped.
pub fn rate_sensitivity(
    principal: f64,
    annual_rate_percent: f64,
    n: u32,
    span_percent: f64,
    step_percent: f64,
) -> Vec<SensitivityPoint> {
    if !(step_percent > 0.0) {
        return Vec::new();
    }
    let steps = (span_percent / step_percent).round() as i64;

    (-steps..=steps)
        .map(|k| annual_rate_percent + k as f64 * step_percent)
        .filter(|rate| *rate >= 0.0)
        .map(|rate| SensitivityPoint {
            annual_rate_percent: rate,
            monthly_payment: payment_for(principal, monthly_rate(rate), n),
        })
        .collect()
}
