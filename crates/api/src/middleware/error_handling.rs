//! # Error Handling Middleware
//!
//! Maps booking errors to HTTP status codes and a uniform JSON body:
//!
//! ```json
//! { "error": "...", "code": "slot_unavailable", "retryable": false }
//! ```
//!
//! Insufficient balance responses also carry the balance and the required
//! amount so that clients can show them without another round trip.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coachslot_core::errors::BookingError;
use serde_json::json;

/// Application error wrapper that provides HTTP status code mapping.
///
/// Handlers return `Result<_, AppError>` and use `?` on any
/// `BookingResult`.
#[derive(Debug)]
pub struct AppError(pub BookingError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::Authentication(_) => StatusCode::UNAUTHORIZED,
            BookingError::Authorization(_) => StatusCode::FORBIDDEN,
            BookingError::SlotUnavailable(_)
            | BookingError::AlreadyCancelled(_)
            | BookingError::Conflict(_) => StatusCode::CONFLICT,
            BookingError::InsufficientPoints { .. } => StatusCode::PAYMENT_REQUIRED,
            BookingError::Policy(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            BookingError::Database(_) | BookingError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine readable code. Conflicts are split so clients can tell a taken
    /// slot from a reservation that was already cancelled.
    pub fn code(&self) -> &'static str {
        match &self.0 {
            BookingError::SlotUnavailable(_) => "slot_unavailable",
            BookingError::AlreadyCancelled(_) => "already_cancelled",
            other => other.kind().as_str(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage internals stay in the logs
        let message = match &self.0 {
            BookingError::Database(report) => {
                tracing::error!(error = ?report, "Request failed with a database error");
                "Internal database error".to_string()
            }
            BookingError::Internal(err) => {
                tracing::error!(error = %err, "Request failed with an internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut body = json!({
            "error": message,
            "code": self.code(),
            "retryable": self.0.is_retryable(),
        });
        if let BookingError::InsufficientPoints {
            point_type,
            balance,
            required,
        } = &self.0
        {
            body["point_type"] = json!(point_type);
            body["balance"] = json!(balance);
            body["required"] = json!(required);
        }

        (status, Json(body)).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(BookingError::Database(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(BookingError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError(BookingError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError(BookingError::Validation(rejection.body_text()))
    }
}

/// Maps a BookingError straight to an HTTP response.
pub fn map_error(err: BookingError) -> Response {
    AppError(err).into_response()
}
