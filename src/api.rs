//! HTTP API for the EWA engine.
//!
//! This module exposes the calculator over a small REST API using the
//! [`axum`](https://crates.io/crates/axum) framework.  Clients post a
//! calculation request and get back the full breakdown in JSON, or an
//! error object of the form `{ "success": false, "error": "..." }`.

use crate::country::CountryRegistry;
use crate::engine::{quote, quote_batch};
use crate::error::CalcError;
use crate::models::{CalculationRequest, CalculationResult};
use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across requests.  The registry is
/// read-only, so no locking is needed.
pub struct AppState {
    pub registry: CountryRegistry,
}

/// Build the API router around a country registry.
pub fn build_router(registry: CountryRegistry) -> Router {
    let state = Arc::new(AppState { registry });
    Router::new()
        .route("/api/calc", post(calculate_handler))
        .route("/api/calc/batch", post(batch_handler))
        .route("/api/countries", get(countries_handler))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct CalculatedBody {
    success: bool,
    #[serde(flatten)]
    result: CalculationResult,
}

impl From<CalculationResult> for CalculatedBody {
    fn from(result: CalculationResult) -> Self {
        Self {
            success: true,
            result,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl ErrorBody {
    fn new(error: String) -> Self {
        Self {
            success: false,
            error,
        }
    }
}

/// Errors surfaced to HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    Calc(CalcError),
    BadRequest(String),
    Internal(String),
}

impl From<CalcError> for ApiError {
    fn from(value: CalcError) -> Self {
        Self::Calc(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Calc(err @ CalcError::UnknownCountry { .. }) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            ApiError::Calc(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        warn!(%status, error = %message, "request rejected");
        (status, Json(ErrorBody::new(message))).into_response()
    }
}

/// Handler for POST /api/calc
async fn calculate_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<CalculationRequest>, JsonRejection>,
) -> Result<Json<CalculatedBody>, ApiError> {
    let Json(request) = payload?;
    let result = quote(&request, &app_state.registry)?;
    Ok(Json(result.into()))
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    requests: Vec<CalculationRequest>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum BatchOutcome {
    Calculated(CalculatedBody),
    Failed(ErrorBody),
}

#[derive(Debug, Serialize)]
struct BatchResponse {
    results: Vec<BatchOutcome>,
}

/// Handler for POST /api/calc/batch.  The batch is computed on the
/// blocking pool so the rayon fan-out does not stall the async runtime.
async fn batch_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Json(batch) = payload?;
    let state = app_state.clone();
    let outcomes =
        tokio::task::spawn_blocking(move || quote_batch(&batch.requests, &state.registry))
            .await
            .map_err(|err| ApiError::Internal(format!("batch calculation failed: {err}")))?;
    let results = outcomes
        .into_iter()
        .map(|outcome| match outcome {
            Ok(result) => BatchOutcome::Calculated(result.into()),
            Err(err) => BatchOutcome::Failed(ErrorBody::new(err.to_string())),
        })
        .collect();
    Ok(Json(BatchResponse { results }))
}

#[derive(Debug, Serialize)]
struct CountrySummary {
    code: String,
    name: String,
    currency: String,
}

#[derive(Debug, Serialize)]
struct CountriesResponse {
    countries: Vec<CountrySummary>,
}

/// Handler for GET /api/countries
async fn countries_handler(State(app_state): State<Arc<AppState>>) -> Json<CountriesResponse> {
    let registry = &app_state.registry;
    let countries = registry
        .codes()
        .into_iter()
        .filter_map(|code| registry.get(&code).ok())
        .map(|config| CountrySummary {
            code: config.code.clone(),
            name: config.name.clone(),
            currency: config.currency.clone(),
        })
        .collect();
    Json(CountriesResponse { countries })
}

/// Launch the API server on `addr`.  Runs until the server terminates.
pub async fn serve(addr: SocketAddr, registry: CountryRegistry) -> Result<()> {
    let router = build_router(registry);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "EWA calculator listening");
    axum::serve(listener, router)
        .await
        .context("server terminated unexpectedly")
}
