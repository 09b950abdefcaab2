//! Load batches of calculation requests from CSV
//!
//! One loan per row; an empty cell marks the field to be calculated.
//!
//! ```text
//! id,house_price,down_payment,term_months,annual_rate_percent,monthly_payment,loan_type,bank_spread,tenor
//! a1,300000,60000,360,2.5,,fixed,,
//! a2,,60000,360,,948.29,adjustable,0.5,12M
//! ```

use super::{CalculationRequest, LoanType};
use crate::error::{EngineResult, MortgageError};
use crate::rates::Tenor;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A request tagged with its row identifier
#[derive(Debug, Clone)]
pub struct LoanRecord {
    pub id: String,
    pub request: CalculationRequest,
}

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    id: String,
    house_price: Option<f64>,
    down_payment: Option<f64>,
    term_months: Option<u32>,
    annual_rate_percent: Option<f64>,
    monthly_payment: Option<f64>,
    #[serde(default)]
    loan_type: Option<String>,
    #[serde(default)]
    bank_spread: Option<f64>,
    #[serde(default)]
    tenor: Option<String>,
}

impl CsvRow {
    fn to_record(self) -> EngineResult<LoanRecord> {
        let loan_type = match self.loan_type.as_deref() {
            Some(s) => s.parse::<LoanType>()?,
            None => LoanType::Fixed,
        };
        let tenor = match self.tenor.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Some(s.parse::<Tenor>()?),
            _ => None,
        };

        Ok(LoanRecord {
            id: self.id,
            request: CalculationRequest {
                house_price: self.house_price,
                down_payment: self.down_payment,
                term_months: self.term_months,
                annual_rate_percent: self.annual_rate_percent,
                monthly_payment: self.monthly_payment,
                loan_type,
                bank_spread: self.bank_spread,
                tenor,
                ..Default::default()
            },
        })
    }
}

/// Load loan requests from a CSV file
pub fn load_loans(path: &Path) -> EngineResult<Vec<LoanRecord>> {
    let file = File::open(path)?;
    load_loans_from_reader(file)
}

/// Load loan requests from any reader
pub fn load_loans_from_reader<R: Read>(reader: R) -> EngineResult<Vec<LoanRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for (line, result) in csv_reader.deserialize().enumerate() {
        let row: CsvRow = result?;
        let record = row
            .to_record()
            .map_err(|e| MortgageError::Data(format!("row {}: {}", line + 1, e)))?;
        records.push(record);
    }

    Ok(records)
}
