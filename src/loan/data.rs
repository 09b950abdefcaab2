//! Loan parameter and request structures as submitted by the calculator form

use crate::amortization::TableView;
use crate::error::{EngineResult, MortgageError};
use crate::rates::Tenor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five interdependent loan quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanField {
    HousePrice,
    DownPayment,
    TermMonths,
    AnnualRatePercent,
    MonthlyPayment,
}

impl LoanField {
    pub const ALL: [LoanField; 5] = [
        LoanField::HousePrice,
        LoanField::DownPayment,
        LoanField::TermMonths,
        LoanField::AnnualRatePercent,
        LoanField::MonthlyPayment,
    ];

    /// Wire name, as used in requests and `calculated_field`
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanField::HousePrice => "house_price",
            LoanField::DownPayment => "down_payment",
            LoanField::TermMonths => "term_months",
            LoanField::AnnualRatePercent => "annual_rate_percent",
            LoanField::MonthlyPayment => "monthly_payment",
        }
    }
}

impl fmt::Display for LoanField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interest rate regime of the loan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    /// User-supplied rate for the whole term
    #[default]
    Fixed,
    /// Reference rate + spread, re-fixed on the adjustable tenor
    Adjustable,
    /// Reference rate + spread, re-fixed on the variable tenor
    FullVariable,
}

impl LoanType {
    /// Whether the rate comes from the reference rate rather than the user
    pub fn is_variable(&self) -> bool {
        !matches!(self, LoanType::Fixed)
    }
}

impl FromStr for LoanType {
    type Err = MortgageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "fixed" => Ok(LoanType::Fixed),
            "adjustable" => Ok(LoanType::Adjustable),
            "full_variable" | "variable" => Ok(LoanType::FullVariable),
            other => Err(MortgageError::invalid(
                "loan_type",
                format!("unknown loan type {other:?}"),
            )),
        }
    }
}

/// Loan quantities; `None` marks the field to be calculated
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    pub house_price: Option<f64>,
    pub down_payment: Option<f64>,
    pub term_months: Option<u32>,
    pub annual_rate_percent: Option<f64>,
    pub monthly_payment: Option<f64>,
}

impl LoanParameters {
    pub fn is_known(&self, field: LoanField) -> bool {
        match field {
            LoanField::HousePrice => self.house_price.is_some(),
            LoanField::DownPayment => self.down_payment.is_some(),
            LoanField::TermMonths => self.term_months.is_some(),
            LoanField::AnnualRatePercent => self.annual_rate_percent.is_some(),
            LoanField::MonthlyPayment => self.monthly_payment.is_some(),
        }
    }

    /// Fields left unknown, in canonical order
    pub fn missing_fields(&self) -> Vec<LoanField> {
        LoanField::ALL
            .into_iter()
            .filter(|f| !self.is_known(*f))
            .collect()
    }

    /// Replace the rate slot with an effective rate
    pub fn with_rate(mut self, annual_rate_percent: f64) -> Self {
        self.annual_rate_percent = Some(annual_rate_percent);
        self
    }

    /// Field-level checks on the known values; run before any solving
    pub fn validate(&self) -> EngineResult<()> {
        check_amount(LoanField::HousePrice, self.house_price)?;
        check_amount(LoanField::DownPayment, self.down_payment)?;
        check_amount(LoanField::AnnualRatePercent, self.annual_rate_percent)?;
        check_amount(LoanField::MonthlyPayment, self.monthly_payment)?;

        if self.term_months == Some(0) {
            return Err(MortgageError::invalid(
                LoanField::TermMonths.as_str(),
                "must be at least 1 month",
            ));
        }

        if let (Some(price), Some(down)) = (self.house_price, self.down_payment) {
            if down > price {
                return Err(MortgageError::invalid(
                    LoanField::DownPayment.as_str(),
                    format!("down payment {down:.2} exceeds house price {price:.2}"),
                ));
            }
        }

        Ok(())
    }
}

fn check_amount(field: LoanField, value: Option<f64>) -> EngineResult<()> {
    match value {
        Some(v) if !v.is_finite() => Err(MortgageError::invalid(field.as_str(), "must be a finite number")),
        Some(v) if v < 0.0 => Err(MortgageError::invalid(field.as_str(), "must be non-negative")),
        _ => Ok(()),
    }
}

/// A calculation request as posted by the form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationRequest {
    pub house_price: Option<f64>,
    pub down_payment: Option<f64>,
    pub term_months: Option<u32>,
    #[serde(alias = "interest_rate")]
    pub annual_rate_percent: Option<f64>,
    pub monthly_payment: Option<f64>,

    pub loan_type: LoanType,

    /// Spread over the reference rate, percent; engine default when absent
    pub bank_spread: Option<f64>,

    /// Reference tenor override for variable loans
    pub tenor: Option<Tenor>,

    /// Months at the initial rate before the adjusted rate applies
    pub fixed_period_months: Option<u32>,

    /// Reference rate after the fixed period, percent (spread is added)
    pub adjusted_interest_rate: Option<f64>,

    pub extra_monthly: f64,
    pub extra_annual: f64,

    /// Fee on extra payments, percent of the extra amount
    pub extra_fee_rate: f64,

    /// Monthly bank insurance premiums
    pub bank_insurances: f64,

    pub table_view: TableView,
    pub include_schedule: bool,
    pub include_sensitivity: bool,
}

impl CalculationRequest {
    pub fn parameters(&self) -> LoanParameters {
        LoanParameters {
            house_price: self.house_price,
            down_payment: self.down_payment,
            term_months: self.term_months,
            annual_rate_percent: self.annual_rate_percent,
            monthly_payment: self.monthly_payment,
        }
    }

    /// Checks on the optional, non-solved inputs
    pub fn validate_extras(&self) -> EngineResult<()> {
        match (self.fixed_period_months, self.adjusted_interest_rate) {
            (Some(_), None) => {
                return Err(MortgageError::invalid(
                    "adjusted_interest_rate",
                    "required when fixed_period_months is given",
                ))
            }
            (None, Some(_)) => {
                return Err(MortgageError::invalid(
                    "fixed_period_months",
                    "required when adjusted_interest_rate is given",
                ))
            }
            _ => {}
        }

        let extras = [
            ("bank_spread", self.bank_spread.unwrap_or(0.0)),
            ("adjusted_interest_rate", self.adjusted_interest_rate.unwrap_or(0.0)),
            ("extra_monthly", self.extra_monthly),
            ("extra_annual", self.extra_annual),
            ("extra_fee_rate", self.extra_fee_rate),
            ("bank_insurances", self.bank_insurances),
        ];
        for (name, value) in extras {
            if !value.is_finite() {
                return Err(MortgageError::invalid(name, "must be a finite number"));
            }
            if value < 0.0 {
                return Err(MortgageError::invalid(name, "must be non-negative"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> LoanParameters {
        LoanParameters {
            house_price: Some(300_000.0),
            down_payment: Some(60_000.0),
            term_months: Some(360),
            annual_rate_percent: Some(2.5),
            monthly_payment: Some(948.29),
        }
    }

    #[test]
    fn test_missing_fields_in_order() {
        let params = LoanParameters {
            house_price: None,
            monthly_payment: None,
            ..full()
        };
        assert_eq!(
            params.missing_fields(),
            vec![LoanField::HousePrice, LoanField::MonthlyPayment]
        );
        assert!(full().missing_fields().is_empty());
    }

    #[test]
    fn test_validate_rejects_negative_and_zero_term() {
        let negative = LoanParameters { down_payment: Some(-1.0), ..full() };
        let err = negative.validate().unwrap_err();
        assert!(err.to_string().contains("down_payment"));

        let zero_term = LoanParameters { term_months: Some(0), ..full() };
        assert_eq!(zero_term.validate().unwrap_err().kind(), "InvalidInputError");

        let nan_rate = LoanParameters { annual_rate_percent: Some(f64::NAN), ..full() };
        assert_eq!(nan_rate.validate().unwrap_err().kind(), "InvalidInputError");
    }

    #[test]
    fn test_validate_rejects_down_payment_above_price() {
        let params = LoanParameters {
            down_payment: Some(400_000.0),
            ..full()
        };
        assert_eq!(params.validate().unwrap_err().kind(), "InvalidInputError");
    }

    #[test]
    fn test_request_json_nulls_and_alias() {
        let json = r#"{
            "house_price": 300000,
            "down_payment": 60000,
            "term_months": 360,
            "interest_rate": 2.5,
            "monthly_payment": null,
            "loan_type": "full_variable",
            "tenor": "6M"
        }"#;
        let request: CalculationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.annual_rate_percent, Some(2.5));
        assert_eq!(request.loan_type, LoanType::FullVariable);
        assert_eq!(request.tenor, Some(Tenor::SixMonths));
        assert_eq!(request.table_view, TableView::Monthly);
        assert_eq!(request.parameters().missing_fields(), vec![LoanField::MonthlyPayment]);
    }

    #[test]
    fn test_loan_type_parse() {
        assert_eq!("".parse::<LoanType>().unwrap(), LoanType::Fixed);
        assert_eq!("Adjustable".parse::<LoanType>().unwrap(), LoanType::Adjustable);
        assert!("balloon".parse::<LoanType>().is_err());
        assert!(LoanType::FullVariable.is_variable());
    }

    #[test]
    fn test_validate_extras() {
        let request = CalculationRequest { extra_monthly: -5.0, ..Default::default() };
        assert_eq!(request.validate_extras().unwrap_err().kind(), "InvalidInputError");
        assert!(CalculationRequest::default().validate_extras().is_ok());
    }

    #[test]
    fn test_rate_reset_fields_come_in_pairs() {
        let period_only = CalculationRequest { fixed_period_months: Some(60), ..Default::default() };
        let err = period_only.validate_extras().unwrap_err();
        assert!(err.to_string().contains("adjusted_interest_rate"));

        let rate_only = CalculationRequest { adjusted_interest_rate: Some(3.0), ..Default::default() };
        let err = rate_only.validate_extras().unwrap_err();
        assert!(err.to_string().contains("fixed_period_months"));

        let both = CalculationRequest {
            fixed_period_months: Some(60),
            adjusted_interest_rate: Some(3.0),
            ..Default::default()
        };
        assert!(both.validate_extras().is_ok());
    }
}
