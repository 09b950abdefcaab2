//! Mortgage Engine - loan calculator with EURIBOR-linked rates
//!
//! This library provides:
//! - Field resolution: give any four of house price, down payment, term,
//!   rate and monthly payment, and the fifth is solved
//! - Annuity primitives and a bisection rate solver
//! - Effective rates for fixed, adjustable and full-variable loans
//!   (reference rate plus bank spread)
//! - Month-by-month amortization schedules with extras, fees and insurance
//! - Payment sensitivity to the interest rate

pub mod error;
pub mod config;
pub mod loan;
pub mod rates;
pub mod amortization;
pub mod resolver;
pub mod calculator;

// Re-export commonly used types
pub use error::{EngineResult, ErrorBody, MortgageError};
pub use config::{EngineConfig, SolverConfig};
pub use loan::{CalculationRequest, LoanField, LoanParameters, LoanType};
pub use rates::{CsvRateProvider, RateProvider, ReferenceRate, StaticRateProvider, Tenor};
pub use amortization::{ResolvedLoan, Schedule, ScheduleOptions, TableView};
pub use resolver::{resolve, CalculationResult, SolvePlan};
pub use calculator::{MortgageCalculator, MortgageReport};
