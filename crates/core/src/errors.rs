use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::points::PointType;

/// Reasons the cancellation policy refuses a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyRejection {
    /// The session has already started or is over.
    PastSession,
    /// A client tried to cancel inside the minimum lead time.
    WithinCutoffWindow,
}

impl std::fmt::Display for PolicyRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyRejection::PastSession => write!(f, "session is in the past"),
            PolicyRejection::WithinCutoffWindow => {
                write!(f, "session is within the cancellation cutoff window")
            }
        }
    }
}

/// Coarse classification used by callers to decide how to react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Authentication,
    Authorization,
    Conflict,
    InsufficientPoints,
    PolicyRejection,
    StorageFailure,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation_error",
            ErrorKind::Authentication => "authentication_error",
            ErrorKind::Authorization => "authorization_error",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InsufficientPoints => "insufficient_points",
            ErrorKind::PolicyRejection => "policy_rejection",
            ErrorKind::StorageFailure => "storage_failure",
            ErrorKind::Internal => "internal_error",
        }
    }
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    #[error("Reservation {0} is already cancelled")]
    AlreadyCancelled(Uuid),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient {point_type} points: balance {balance}, required {required}")]
    InsufficientPoints {
        point_type: PointType,
        balance: i32,
        required: i32,
    },

    #[error("Cancellation rejected: {0}")]
    Policy(PolicyRejection),

    #[error("Storage temporarily unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::NotFound(_) => ErrorKind::NotFound,
            BookingError::Validation(_) => ErrorKind::Validation,
            BookingError::Authentication(_) => ErrorKind::Authentication,
            BookingError::Authorization(_) => ErrorKind::Authorization,
            BookingError::SlotUnavailable(_)
            | BookingError::AlreadyCancelled(_)
            | BookingError::Conflict(_) => ErrorKind::Conflict,
            BookingError::InsufficientPoints { .. } => ErrorKind::InsufficientPoints,
            BookingError::Policy(_) => ErrorKind::PolicyRejection,
            BookingError::StorageUnavailable(_) => ErrorKind::StorageFailure,
            BookingError::Database(_) | BookingError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Only transient storage failures are worth retrying with the same input.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::StorageFailure
    }
}

impl From<PolicyRejection> for BookingError {
    fn from(rejection: PolicyRejection) -> Self {
        BookingError::Policy(rejection)
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
