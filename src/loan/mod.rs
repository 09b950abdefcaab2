//! Loan parameters, calculation requests and batch loading

mod data;
pub mod loader;

pub use data::{LoanField, LoanType, LoanParameters, CalculationRequest};
pub use loader::{load_loans, load_loans_from_reader, LoanRecord};
