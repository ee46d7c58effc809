//! Standardized API response format

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use utoipa::ToSchema;

/// A standardized API response wrapper for single resource responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(
    QuoteResponse = ApiResponse<swap_engine::SwapQuote>,
    ReceiptResponse = ApiResponse<swap_engine::ExecutionReceipt>,
    ExecutionLogResponse = ApiResponse<common::model::ExecutionLog>,
    StateResponse = ApiResponse<crate::api::swap::ExecutionStateView>,
    DefaultsResponse = ApiResponse<common::model::QuoteDefaults>,
    PairsResponse = ApiResponse<crate::api::swap::ListedPairs>,
    LegsResponse = ApiResponse<crate::api::swap::DanglingLegs>
)]
pub struct ApiResponse<T> {
    /// The response data
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize + Debug,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
