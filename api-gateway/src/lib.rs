//! HTTP surface of the swap desk

pub mod api;
pub mod config;
pub mod error;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use swap_engine::SwapEngine;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::swap::{
    create_quote, dangling_legs, execute_quote, execution_state, listed_pairs, order_status,
    quote_order_status, reload_defaults,
};

/// App state shared across handlers
pub struct AppState {
    /// Quote and execution services
    pub engine: SwapEngine,
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        api::swap::create_quote,
        api::swap::execute_quote,
        api::swap::quote_order_status,
        api::swap::order_status,
        api::swap::execution_state,
        api::swap::listed_pairs,
        api::swap::dangling_legs,
        api::swap::reload_defaults,
    ),
    components(
        schemas(
            // Swap API
            api::swap::ExecuteSwapRequest,
            api::swap::ExecutionStateView,
            api::swap::ListedPairs,
            api::swap::DanglingLegs,
            swap_engine::SwapQuote,
            swap_engine::BuyTerms,
            swap_engine::SellTerms,
            swap_engine::ExecutionReceipt,
            common::model::ExecutionLog,
            common::model::ExecutionLeg,
            common::model::ExecutionState,
            common::model::LegState,
            common::model::QuoteDefaults,
            common::model::Side,
            common::model::OrderType,
            common::model::OrderStatus,

            // Response models
            api::response::QuoteResponse,
            api::response::ReceiptResponse,
            api::response::ExecutionLogResponse,
            api::response::StateResponse,
            api::response::DefaultsResponse,
            api::response::PairsResponse,
            api::response::LegsResponse,
            error::ErrorResponse,
            error::ErrorInfo
        )
    ),
    tags(
        (name = "swap", description = "Quote and execution endpoints"),
        (name = "operations", description = "Operator endpoints")
    ),
    info(
        title = "Swap Desk API",
        version = "1.0.0",
        description = "API for requesting swap quotes, executing them against the venue and tracking their fills"
    )
)]
pub struct ApiDoc;

/// Build the application router with API routes and Swagger UI
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/swap", get(create_quote))
        .route("/swap/pairs", get(listed_pairs))
        .route("/swap/legs/dangling", get(dangling_legs))
        .route("/swap/order/:order_id", get(order_status))
        .route("/swap/:id", post(execute_quote))
        .route("/swap/:id/order", get(quote_order_status))
        .route("/swap/:id/state", get(execution_state))
        .route("/config/reload", post(reload_defaults));

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(swagger_ui)
        .with_state(state)
}
