//! Mortgage Engine CLI
//!
//! Command-line interface for a single mortgage calculation. Leave out exactly
//! one of the five loan quantities and it is solved.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use mortgage_engine::rates::DEFAULT_RATES_PATH;
use mortgage_engine::{
    CalculationRequest, CsvRateProvider, EngineConfig, LoanField, LoanType, MortgageCalculator,
    MortgageReport, RateProvider, StaticRateProvider, TableView, Tenor,
};
use std::path::PathBuf;
use std::process;

/// Rows of the schedule printed before eliding the rest
const SCHEDULE_PREVIEW_ROWS: usize = 24;

/// Mortgage calculator: solves the missing loan parameter
#[derive(Parser, Debug)]
#[command(name = "mortgage_engine", version, about = "Solve the missing mortgage parameter")]
struct Cli {
    #[arg(long)]
    house_price: Option<f64>,

    #[arg(long)]
    down_payment: Option<f64>,

    /// Loan term in months
    #[arg(long)]
    term_months: Option<u32>,

    /// Nominal annual interest rate, percent (fixed loans)
    #[arg(long, visible_alias = "rate")]
    annual_rate: Option<f64>,

    #[arg(long)]
    monthly_payment: Option<f64>,

    /// fixed, adjustable or full_variable
    #[arg(long, default_value = "fixed")]
    loan_type: LoanType,

    /// Bank spread over EURIBOR, percent
    #[arg(long)]
    spread: Option<f64>,

    /// EURIBOR tenor (1M, 3M, 6M, 12M)
    #[arg(long)]
    tenor: Option<Tenor>,

    /// Use this EURIBOR value (percent) instead of a rates file
    #[arg(long, conflicts_with = "rates_file")]
    euribor: Option<f64>,

    /// EURIBOR history CSV (date,tenor,rate)
    #[arg(long)]
    rates_file: Option<PathBuf>,

    /// Print the amortization schedule
    #[arg(long)]
    schedule: bool,

    /// Aggregate the schedule by year
    #[arg(long)]
    yearly: bool,

    #[arg(long, default_value_t = 0.0)]
    extra_monthly: f64,

    #[arg(long, default_value_t = 0.0)]
    extra_annual: f64,

    /// Fee on extra payments, percent
    #[arg(long, default_value_t = 0.0)]
    extra_fee_rate: f64,

    /// Monthly bank insurance premiums
    #[arg(long, default_value_t = 0.0)]
    insurance: f64,

    /// Months before the adjusted rate applies
    #[arg(long, requires = "adjusted_rate")]
    fixed_period_months: Option<u32>,

    /// Reference rate after the fixed period, percent
    #[arg(long, requires = "fixed_period_months")]
    adjusted_rate: Option<f64>,

    /// Print payment sensitivity to the rate
    #[arg(long)]
    sensitivity: bool,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn request(&self) -> CalculationRequest {
        CalculationRequest {
            house_price: self.house_price,
            down_payment: self.down_payment,
            term_months: self.term_months,
            annual_rate_percent: self.annual_rate,
            monthly_payment: self.monthly_payment,
            loan_type: self.loan_type,
            bank_spread: self.spread,
            tenor: self.tenor,
            fixed_period_months: self.fixed_period_months,
            adjusted_interest_rate: self.adjusted_rate,
            extra_monthly: self.extra_monthly,
            extra_annual: self.extra_annual,
            extra_fee_rate: self.extra_fee_rate,
            bank_insurances: self.insurance,
            table_view: if self.yearly { TableView::Yearly } else { TableView::Monthly },
            include_schedule: self.schedule,
            include_sensitivity: self.sensitivity,
        }
    }

    fn provider(&self) -> Result<Box<dyn RateProvider>> {
        if let Some(rate) = self.euribor {
            let today = Local::now().date_naive();
            let provider = Tenor::ALL
                .into_iter()
                .fold(StaticRateProvider::new(), |p, tenor| p.with_rate(tenor, rate, today));
            return Ok(Box::new(provider));
        }

        if !self.loan_type.is_variable() {
            return Ok(Box::new(StaticRateProvider::new()));
        }

        let provider = match &self.rates_file {
            Some(path) => CsvRateProvider::load(path)
                .with_context(|| format!("loading EURIBOR rates from {}", path.display()))?,
            None => CsvRateProvider::load_default()
                .with_context(|| format!("loading EURIBOR rates from {}", DEFAULT_RATES_PATH))?,
        };
        Ok(Box::new(provider))
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = EngineConfig::from_env().context("reading MORTGAGE_* settings")?;
    let provider = cli.provider()?;
    let calculator = MortgageCalculator::new(config);

    let report = calculator.calculate(&cli.request(), provider.as_ref())?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &MortgageReport) {
    let result = &report.result;
    let loan = &result.loan;

    println!("Mortgage Engine v{}", env!("CARGO_PKG_VERSION"));
    println!("======================\n");

    match result.calculated_field {
        LoanField::TermMonths => println!("Solved {}: {} months", result.calculated_field, result.duration_months),
        LoanField::AnnualRatePercent => println!("Solved {}: {:.4}%", result.calculated_field, result.calculated_value),
        _ => println!("Solved {}: {:.2}", result.calculated_field, result.calculated_value),
    }
    println!();

    println!("Loan:");
    println!("  House Price:     {:>14.2}", loan.house_price);
    println!("  Down Payment:    {:>14.2}", loan.down_payment);
    println!("  Term:            {:>14} months", loan.term_months);
    println!("  Annual Rate:     {:>14.4}%", loan.annual_rate_percent);
    println!("  Monthly Payment: {:>14.2}", loan.monthly_payment);
    if let Some(reference) = &report.reference_rate {
        println!(
            "  EURIBOR {}:     {:>14.4}% (as of {})",
            reference.tenor, reference.annual_rate_percent, reference.as_of
        );
    }

    println!("\nSummary:");
    println!("  Total Borrowed:  {:>14.2}", result.total_borrowed);
    println!("  Total Interest:  {:>14.2}", result.total_interest);
    println!("  Total Cost:      {:>14.2}", result.total_cost);
    println!("  Duration:        {:>14} months", result.duration_months);

    if let (Some(rows), Some(summary)) = (&report.amortization, &report.schedule_summary) {
        println!("\nAmortization ({} months):", summary.months);
        println!(
            "{:>6} {:>12} {:>10} {:>8} {:>12} {:>12} {:>14}",
            "Period", "Payment", "Extra", "Fee", "Interest", "Principal", "Balance"
        );
        println!("{}", "-".repeat(80));
        for row in rows.iter().take(SCHEDULE_PREVIEW_ROWS) {
            println!(
                "{:>6} {:>12.2} {:>10.2} {:>8.2} {:>12.2} {:>12.2} {:>14.2}",
                row.period, row.payment, row.extra, row.fee, row.interest, row.principal, row.balance
            );
        }
        if rows.len() > SCHEDULE_PREVIEW_ROWS {
            println!("... ({} more rows)", rows.len() - SCHEDULE_PREVIEW_ROWS);
        }

        println!("\nSchedule Totals:");
        println!("  Interest:        {:>14.2}", summary.total_interest);
        println!("  Extra Payments:  {:>14.2}", summary.total_extra);
        println!("  Fees:            {:>14.2}", summary.total_fees);
        println!("  Insurance:       {:>14.2}", summary.total_insurance);
        println!("  Total Cost:      {:>14.2}", summary.total_cost);
        if summary.truncated {
            println!("  (stopped at the month cap; the loan does not amortize)");
        }
    }

    if let Some(points) = &report.sensitivity {
        println!("\nRate Sensitivity:");
        println!("{:>10} {:>14}", "Rate %", "Payment");
        for point in points {
            println!("{:>10.2} {:>14.2}", point.annual_rate_percent, point.monthly_payment);
        }
    }
}
