//! Run calculations for a whole CSV of loans
//!
//! One request per input row, solved in parallel. Every row produces one
//! output row, either the solved values or the error kind and message.

use anyhow::{Context, Result};
use clap::Parser;
use mortgage_engine::loan::{load_loans, LoanRecord};
use mortgage_engine::{
    CsvRateProvider, EngineConfig, EngineResult, MortgageCalculator, MortgageReport, RateProvider,
    StaticRateProvider,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "run_batch", about = "Solve a CSV of mortgage requests")]
struct Args {
    /// Loans CSV; an empty cell marks the field to solve
    #[arg(long)]
    input: PathBuf,

    #[arg(long, default_value = "batch_results.csv")]
    output: PathBuf,

    /// EURIBOR history CSV, needed for adjustable and variable loans
    #[arg(long)]
    rates_file: Option<PathBuf>,
}

/// One output row
#[derive(Debug, Default, Serialize)]
struct ResultRow {
    id: String,
    status: &'static str,
    calculated_field: String,
    calculated_value: Option<f64>,
    house_price: Option<f64>,
    down_payment: Option<f64>,
    term_months: Option<u32>,
    annual_rate_percent: Option<f64>,
    monthly_payment: Option<f64>,
    total_borrowed: Option<f64>,
    total_interest: Option<f64>,
    total_cost: Option<f64>,
    error_kind: String,
    error_message: String,
}

impl ResultRow {
    fn from_outcome(id: &str, outcome: &EngineResult<MortgageReport>) -> Self {
        match outcome {
            Ok(report) => {
                let result = &report.result;
                let loan = &result.loan;
                ResultRow {
                    id: id.to_string(),
                    status: "ok",
                    calculated_field: result.calculated_field.to_string(),
                    calculated_value: Some(result.calculated_value),
                    house_price: Some(loan.house_price),
                    down_payment: Some(loan.down_payment),
                    term_months: Some(loan.term_months),
                    annual_rate_percent: Some(loan.annual_rate_percent),
                    monthly_payment: Some(loan.monthly_payment),
                    total_borrowed: Some(result.total_borrowed),
                    total_interest: Some(result.total_interest),
                    total_cost: Some(result.total_cost),
                    ..Default::default()
                }
            }
            Err(e) => ResultRow {
                id: id.to_string(),
                status: "error",
                error_kind: e.kind().to_string(),
                error_message: e.to_string(),
                ..Default::default()
            },
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start = Instant::now();
    println!("Loading loans from {}...", args.input.display());
    let loans: Vec<LoanRecord> = load_loans(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    println!("Loaded {} loans in {:?}", loans.len(), start.elapsed());

    let provider: Box<dyn RateProvider> = match &args.rates_file {
        Some(path) => Box::new(
            CsvRateProvider::load(path)
                .with_context(|| format!("loading EURIBOR rates from {}", path.display()))?,
        ),
        None => Box::new(StaticRateProvider::new()),
    };
    let provider = provider.as_ref();

    let calculator = MortgageCalculator::new(EngineConfig::from_env()?);

    println!("Running calculations...");
    let calc_start = Instant::now();

    let rows: Vec<ResultRow> = loans
        .par_iter()
        .map(|loan| ResultRow::from_outcome(&loan.id, &calculator.calculate(&loan.request, provider)))
        .collect();

    println!("Calculations complete in {:?}", calc_start.elapsed());

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!("Output written to {}", args.output.display());

    let failed = rows.iter().filter(|r| r.status == "error").count();
    println!("\nBatch Summary:");
    println!("  Loans:  {}", rows.len());
    println!("  Solved: {}", rows.len() - failed);
    println!("  Failed: {}", failed);

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
