//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, OrderError, QuoteError, ValidationError};
use render::RenderError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Domain logic error.
    Domain(DomainError),
    /// PDF generation failed.
    Render(RenderError),
    /// Internal server error.
    Internal(String),
}

/// Body key of the JSON error document.
enum Kind {
    Error,
    Warning,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Render(err) => {
                tracing::error!(error = %err, "failed to render PDF");
                (StatusCode::INTERNAL_SERVER_ERROR, Kind::Error, err.to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, Kind::Error, msg)
            }
        };

        let body = match kind {
            Kind::Error => serde_json::json!({ "error": message }),
            Kind::Warning => serde_json::json!({ "warning": message }),
        };
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, Kind, String) {
    match &err {
        DomainError::Quote(quote_err) => match quote_err {
            QuoteError::Locked { .. } => (StatusCode::CONFLICT, Kind::Warning, quote_err.to_string()),
            QuoteError::InvalidStateTransition { .. } | QuoteError::NumberExhausted { .. } => {
                (StatusCode::CONFLICT, Kind::Error, err.to_string())
            }
            QuoteError::ItemNotFound { .. } => (StatusCode::NOT_FOUND, Kind::Error, err.to_string()),
            QuoteError::CompanyInactive { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, Kind::Error, err.to_string())
            }
        },
        DomainError::Order(order_err) => match order_err {
            OrderError::InvalidStateTransition { .. } | OrderError::Closed { .. } => {
                (StatusCode::CONFLICT, Kind::Error, err.to_string())
            }
        },
        DomainError::Validation(validation) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Kind::Error,
            validation.to_string(),
        ),
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, Kind::Error, err.to_string()),
        DomainError::Protected { .. } => (StatusCode::CONFLICT, Kind::Error, err.to_string()),
        DomainError::Store(store_err) => {
            tracing::error!(error = %store_err, "store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Kind::Error,
                "Internal storage error".to_string(),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Domain(DomainError::Validation(err))
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        ApiError::Render(err)
    }
}
