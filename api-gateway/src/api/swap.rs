//! Swap API handlers
//!
//! Handlers for the quote lifecycle:
//! - Request a quote for a pair and volume
//! - Execute a quote on one side
//! - Query the execution log by quote or venue order
//! - Query the execution state of a quote
//! - Reload quote defaults

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use common::decimal::{Quantity, Rate};
use common::model::{ExecutionLeg, ExecutionLog, ExecutionState, QuoteDefaults, Side};
use serde::{Deserialize, Serialize};
use swap_engine::{ExecutionReceipt, QuoteRequest, StatusLookup, SwapQuote};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::response::{
    ApiResponse, DefaultsResponse, ExecutionLogResponse, LegsResponse, PairsResponse,
    QuoteResponse, ReceiptResponse, StateResponse,
};
use crate::error::{ApiError, ErrorResponse};
use crate::AppState;

/// Quote request parameters
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SwapQuoteQuery {
    /// Instrument pair, e.g. BTC-USDT
    pub pair: String,
    /// Base asset volume
    #[param(value_type = String, example = "0.5")]
    pub volume: Quantity,
    /// Spread fraction, falls back to the configured default
    #[param(value_type = Option<String>, example = "0.0001")]
    pub spread: Option<Rate>,
    /// Fee fraction, falls back to the configured default
    #[param(value_type = Option<String>, example = "0.08")]
    pub fee: Option<Rate>,
}

/// Execution request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExecuteSwapRequest {
    /// "buy" or "sell"
    #[schema(example = "buy")]
    pub side: String,
}

/// Execution state of a quote
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExecutionStateView {
    pub quote_id: Uuid,
    pub state: ExecutionState,
}

/// Pairs that can be quoted
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListedPairs {
    #[schema(example = json!(["BTC-USDT", "AAVE-USDC"]))]
    pub pairs: Vec<String>,
}

/// Legs recorded for quotes without an execution log
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DanglingLegs {
    pub legs: Vec<ExecutionLeg>,
}

fn quote_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::BadRequest(format!("Invalid quote id: {}", rejection.body_text())))
}

/// Request a quote
#[utoipa::path(
    get,
    path = "/api/v1/swap",
    params(SwapQuoteQuery),
    responses(
        (status = 200, description = "Quote created", body = QuoteResponse),
        (status = 400, description = "Invalid quote request", body = ErrorResponse),
        (status = 404, description = "Pair not listed on the venue", body = ErrorResponse),
        (status = 503, description = "Venue unavailable", body = ErrorResponse)
    ),
    tag = "swap"
)]
pub async fn create_quote(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SwapQuoteQuery>, QueryRejection>,
) -> Result<ApiResponse<SwapQuote>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let quote = state
        .engine
        .quotes
        .create_quote(QuoteRequest {
            pair: query.pair,
            volume: query.volume,
            spread: query.spread,
            fee: query.fee,
        })
        .await?;

    Ok(ApiResponse::new(quote))
}

/// Execute a quote
#[utoipa::path(
    post,
    path = "/api/v1/swap/{id}",
    params(
        ("id" = Uuid, Path, description = "Quote ID")
    ),
    request_body = ExecuteSwapRequest,
    responses(
        (status = 200, description = "Quote executed", body = ReceiptResponse),
        (status = 404, description = "Quote not found", body = ErrorResponse),
        (status = 409, description = "Quote expired or already executed", body = ErrorResponse),
        (status = 422, description = "Insufficient venue balance", body = ErrorResponse),
        (status = 502, description = "Venue rejected an order", body = ErrorResponse)
    ),
    tag = "swap"
)]
pub async fn execute_quote(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ExecuteSwapRequest>, JsonRejection>,
) -> Result<ApiResponse<ExecutionReceipt>, ApiError> {
    let id = quote_id(id)?;
    let Json(body) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let side: Side = body.side.parse()?;
    debug!(quote_id = %id, side = %side, "Execution requested");

    let receipt = state.engine.executions.execute_quote(id, side).await?;
    Ok(ApiResponse::new(receipt))
}

/// Execution log of a quote
#[utoipa::path(
    get,
    path = "/api/v1/swap/{id}/order",
    params(
        ("id" = Uuid, Path, description = "Quote ID")
    ),
    responses(
        (status = 200, description = "Execution log, refreshed while the order is open", body = ExecutionLogResponse),
        (status = 404, description = "Quote or execution not found", body = ErrorResponse)
    ),
    tag = "swap"
)]
pub async fn quote_order_status(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<ExecutionLog>, ApiError> {
    let id = quote_id(id)?;
    let log = state
        .engine
        .executions
        .execution_status(StatusLookup::Quote(id))
        .await?;
    Ok(ApiResponse::new(log))
}

/// Execution log of a venue order
#[utoipa::path(
    get,
    path = "/api/v1/swap/order/{order_id}",
    params(
        ("order_id" = String, Path, description = "Venue order ID")
    ),
    responses(
        (status = 200, description = "Execution log, refreshed while the order is open", body = ExecutionLogResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    tag = "swap"
)]
pub async fn order_status(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<ApiResponse<ExecutionLog>, ApiError> {
    let log = state
        .engine
        .executions
        .execution_status(StatusLookup::Order(order_id))
        .await?;
    Ok(ApiResponse::new(log))
}

/// Execution state of a quote
#[utoipa::path(
    get,
    path = "/api/v1/swap/{id}/state",
    params(
        ("id" = Uuid, Path, description = "Quote ID")
    ),
    responses(
        (status = 200, description = "Execution state", body = StateResponse),
        (status = 404, description = "Quote not found", body = ErrorResponse)
    ),
    tag = "swap"
)]
pub async fn execution_state(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<ExecutionStateView>, ApiError> {
    let quote_id = quote_id(id)?;
    let execution_state = state.engine.executions.execution_state(quote_id).await?;
    Ok(ApiResponse::new(ExecutionStateView {
        quote_id,
        state: execution_state,
    }))
}

/// Pairs that can be quoted
#[utoipa::path(
    get,
    path = "/api/v1/swap/pairs",
    responses(
        (status = 200, description = "Listed pairs", body = PairsResponse)
    ),
    tag = "swap"
)]
pub async fn listed_pairs(State(state): State<Arc<AppState>>) -> ApiResponse<ListedPairs> {
    let pairs = state
        .engine
        .quotes
        .listed_pairs()
        .into_iter()
        .map(|pair| pair.to_string())
        .collect();
    ApiResponse::new(ListedPairs { pairs })
}

/// Legs placed for quotes that never completed
#[utoipa::path(
    get,
    path = "/api/v1/swap/legs/dangling",
    responses(
        (status = 200, description = "Dangling execution legs", body = LegsResponse)
    ),
    tag = "operations"
)]
pub async fn dangling_legs(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<DanglingLegs>, ApiError> {
    let legs = state.engine.executions.dangling_legs().await?;
    Ok(ApiResponse::new(DanglingLegs { legs }))
}

/// Reload quote defaults from the store
#[utoipa::path(
    post,
    path = "/api/v1/config/reload",
    responses(
        (status = 200, description = "Defaults now in effect", body = DefaultsResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse)
    ),
    tag = "operations"
)]
pub async fn reload_defaults(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<QuoteDefaults>, ApiError> {
    let defaults = state.engine.defaults.reload().await?;
    Ok(ApiResponse::new(defaults))
}
