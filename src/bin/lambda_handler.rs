//! AWS Lambda handler for the mortgage calculator form
//!
//! Routes:
//! - `POST /api/calc` with a `CalculationRequest` JSON body
//! - `GET /api/euribor/latest?tenor=3M`
//! - `GET /api/euribor/history?tenor=3M&from_date=YYYY-MM-DD&to_date=YYYY-MM-DD`
//! - `GET /health`
//!
//! Supports Lambda Function URLs for direct HTTP access. EURIBOR fixings come
//! from the CSV named by `EURIBOR_RATES_PATH`; without it only fixed loans
//! can be calculated.

use chrono::NaiveDate;
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use mortgage_engine::{
    CalculationRequest, CsvRateProvider, EngineConfig, ErrorBody, MortgageCalculator, MortgageError,
    RateProvider, StaticRateProvider, Tenor,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const RATES_PATH_VAR: &str = "EURIBOR_RATES_PATH";

/// Shared across invocations of a warm Lambda
struct AppState {
    calculator: MortgageCalculator,
    provider: Arc<dyn RateProvider>,
}

impl AppState {
    fn from_env() -> Result<Self, Error> {
        let config = EngineConfig::from_env()?;
        let provider: Arc<dyn RateProvider> = match std::env::var(RATES_PATH_VAR) {
            Ok(path) => {
                let provider = CsvRateProvider::load(Path::new(&path))?;
                log::info!("Loaded {} EURIBOR fixings from {}", provider.len(), path);
                Arc::new(provider)
            }
            Err(_) => {
                log::warn!("{} not set; variable-rate loans will report RateUnavailableError", RATES_PATH_VAR);
                Arc::new(StaticRateProvider::new())
            }
        };

        Ok(Self {
            calculator: MortgageCalculator::new(config),
            provider,
        })
    }
}

fn with_cors(builder: lambda_http::http::response::Builder) -> lambda_http::http::response::Builder {
    builder
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
}

fn json_response<T: Serialize>(status: u16, body: &T) -> Result<Response<Body>, Error> {
    let response = with_cors(Response::builder())
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::Text(serde_json::to_string(body)?))?;
    Ok(response)
}

fn error_response(status: u16, error: &MortgageError) -> Result<Response<Body>, Error> {
    log::warn!("Request failed ({}): {}", status, error);
    json_response(status, &ErrorBody::from(error))
}

/// HTTP status for an engine failure
fn status_for(error: &MortgageError) -> u16 {
    match error {
        MortgageError::RateUnavailable { .. } => 503,
        e if e.is_client_error() => 400,
        _ => 500,
    }
}

fn body_text(event: &Request) -> String {
    match event.body() {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => "{}".to_string(),
    }
}

fn tenor_param(event: &Request, default: Tenor) -> Result<Tenor, MortgageError> {
    match event.query_string_parameters().first("tenor") {
        Some(s) => s.parse(),
        None => Ok(default),
    }
}

fn date_param(event: &Request, name: &str) -> Result<NaiveDate, MortgageError> {
    let params = event.query_string_parameters();
    let raw = params
        .first(name)
        .ok_or_else(|| MortgageError::invalid(name, "required (YYYY-MM-DD)"))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| MortgageError::invalid(name, format!("{raw:?} is not a YYYY-MM-DD date: {e}")))
}

async fn calculate(state: Arc<AppState>, event: &Request) -> Result<Response<Body>, Error> {
    let request: CalculationRequest = match serde_json::from_str(&body_text(event)) {
        Ok(r) => r,
        Err(e) => {
            return error_response(400, &MortgageError::invalid("body", format!("invalid JSON: {e}")));
        }
    };

    let timeout_ms = state.calculator.config().rate_timeout_ms;
    let task = tokio::task::spawn_blocking(move || {
        state.calculator.calculate(&request, state.provider.as_ref())
    });

    match tokio::time::timeout(Duration::from_millis(timeout_ms), task).await {
        Ok(Ok(Ok(report))) => json_response(200, &report),
        Ok(Ok(Err(e))) => error_response(status_for(&e), &e),
        Ok(Err(join_error)) => error_response(500, &MortgageError::Data(join_error.to_string())),
        Err(_) => {
            let e = MortgageError::RateUnavailable {
                tenor: "-".to_string(),
                reason: format!("calculation timed out after {} ms", timeout_ms),
            };
            error_response(503, &e)
        }
    }
}

fn latest_rate(state: &AppState, event: &Request) -> Result<Response<Body>, Error> {
    let tenor = match tenor_param(event, state.calculator.config().variable_tenor) {
        Ok(t) => t,
        Err(e) => return error_response(400, &e),
    };

    match state.provider.latest_rate(tenor) {
        Ok(Some(rate)) => json_response(200, &rate),
        Ok(None) => {
            let e = MortgageError::RateUnavailable {
                tenor: tenor.to_string(),
                reason: "no fixing available".to_string(),
            };
            error_response(404, &e)
        }
        Err(e) => error_response(status_for(&e), &e),
    }
}

fn rate_history(state: &AppState, event: &Request) -> Result<Response<Body>, Error> {
    let query = tenor_param(event, state.calculator.config().variable_tenor).and_then(|tenor| {
        Ok((tenor, date_param(event, "from_date")?, date_param(event, "to_date")?))
    });
    let (tenor, from, to) = match query {
        Ok(q) => q,
        Err(e) => return error_response(400, &e),
    };

    match state.provider.historical_rates(tenor, from, to) {
        Ok(rates) => json_response(200, &rates),
        Err(e) => error_response(status_for(&e), &e),
    }
}

/// Lambda handler function
async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str().to_string();
    let path = event.uri().path().trim_end_matches('/').to_string();
    log::debug!("{} {}", method, path);

    // Handle CORS preflight
    if method == "OPTIONS" {
        return Ok(with_cors(Response::builder()).status(200).body(Body::Empty)?);
    }

    match (method.as_str(), path.as_str()) {
        ("POST", "/api/calc") => calculate(state, &event).await,
        ("GET", "/api/euribor/latest") => latest_rate(&state, &event),
        ("GET", "/api/euribor/history") => rate_history(&state, &event),
        ("GET", "/health") => json_response(
            200,
            &serde_json::json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
        ),
        _ => json_response(
            404,
            &serde_json::json!({ "kind": "NotFound", "message": format!("no route for {} {}", method, path) }),
        ),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let state = Arc::new(AppState::from_env()?);

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
