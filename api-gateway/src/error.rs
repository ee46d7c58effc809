//! Error handling for the API gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::Error;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error information
    pub error: ErrorInfo,
    /// Request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Detailed error information
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorInfo {
    /// Error code (string identifier for the error type)
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Common(#[from] Error),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, Option<serde_json::Value>) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", None),
            ApiError::Common(e) => match e {
                // Client errors (4xx)
                Error::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation_error", None),
                Error::QuoteNotFound(_) => (StatusCode::NOT_FOUND, "quote_not_found", None),
                Error::OrderNotFound(_) => (StatusCode::NOT_FOUND, "order_not_found", None),
                Error::PairNotListed(_) => (StatusCode::NOT_FOUND, "pair_not_listed", None),
                Error::QuoteExpired(_) => (StatusCode::CONFLICT, "quote_expired", None),
                Error::AlreadyExecuted(_) => (StatusCode::CONFLICT, "already_executed", None),
                Error::InsufficientBalance(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "insufficient_balance",
                    None,
                ),

                // Venue errors
                Error::VenueRejected {
                    code,
                    s_code,
                    s_msg,
                    order_id,
                    ..
                } => (
                    StatusCode::BAD_GATEWAY,
                    "venue_rejected",
                    Some(serde_json::json!({
                        "venue_code": code,
                        "s_code": s_code,
                        "s_msg": s_msg,
                        "order_id": order_id,
                    })),
                ),
                Error::LegIncomplete(_) => (StatusCode::BAD_GATEWAY, "leg_incomplete", None),
                Error::GatewayUnavailable(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "gateway_unavailable",
                    Some(serde_json::json!({ "retryable": true })),
                ),

                // Server errors (5xx)
                Error::ConfigurationError(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    None,
                ),
                Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
                Error::Database(db) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    Some(serde_json::json!({
                        "code": db.as_database_error().and_then(|dbe| dbe.code().map(|c| c.to_string())),
                    })),
                ),
                Error::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "migration_error", None),
                Error::Serialization(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "serialization_error",
                    None,
                ),
                Error::DecimalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "decimal_error", None),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Generate a request ID for tracking errors
        let request_id = Uuid::new_v4().to_string();

        tracing::error!(request_id = %request_id, "API Error: {:?}", &self);

        let (status, code, details) = self.parts();
        let error_response = ErrorResponse {
            error: ErrorInfo {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
            request_id: Some(request_id),
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: Error) -> StatusCode {
        ApiError::from(error).into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(status_of(Error::ValidationError("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(Error::QuoteNotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(Error::PairNotListed("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(Error::QuoteExpired("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(Error::AlreadyExecuted("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_of(Error::InsufficientBalance("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(Error::venue_rejected("1", "x")), StatusCode::BAD_GATEWAY);
        assert_eq!(status_of(Error::LegIncomplete("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(Error::GatewayUnavailable("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(Error::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_venue_rejection_carries_details() {
        let error = ApiError::from(Error::VenueRejected {
            code: "1".into(),
            message: "All operations failed".into(),
            s_code: "51008".into(),
            s_msg: "Insufficient balance".into(),
            order_id: String::new(),
        });
        let (_, code, details) = error.parts();
        assert_eq!(code, "venue_rejected");
        let details = details.unwrap();
        assert_eq!(details["s_code"], "51008");
        assert_eq!(details["s_msg"], "Insufficient balance");
    }
}
