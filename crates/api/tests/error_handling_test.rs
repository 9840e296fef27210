use axum::{body::to_bytes, http::StatusCode, response::Response};
use coachslot_api::middleware::error_handling::{map_error, AppError};
use coachslot_core::{
    errors::{BookingError, PolicyRejection},
    models::points::PointType,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::Value;
use uuid::Uuid;

async fn body_of(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[rstest]
#[case(BookingError::NotFound("missing".into()), StatusCode::NOT_FOUND, "not_found")]
#[case(BookingError::Validation("bad".into()), StatusCode::BAD_REQUEST, "validation_error")]
#[case(BookingError::Authentication("who".into()), StatusCode::UNAUTHORIZED, "authentication_error")]
#[case(BookingError::Authorization("no".into()), StatusCode::FORBIDDEN, "authorization_error")]
#[case(BookingError::SlotUnavailable("taken".into()), StatusCode::CONFLICT, "slot_unavailable")]
#[case(BookingError::AlreadyCancelled(Uuid::nil()), StatusCode::CONFLICT, "already_cancelled")]
#[case(BookingError::Conflict("booked".into()), StatusCode::CONFLICT, "conflict")]
#[case(
    BookingError::Policy(PolicyRejection::WithinCutoffWindow),
    StatusCode::UNPROCESSABLE_ENTITY,
    "policy_rejection"
)]
#[case(
    BookingError::StorageUnavailable("lock timeout".into()),
    StatusCode::SERVICE_UNAVAILABLE,
    "storage_failure"
)]
#[case(
    BookingError::Database(eyre::eyre!("relation does not exist")),
    StatusCode::INTERNAL_SERVER_ERROR,
    "internal_error"
)]
#[tokio::test]
async fn test_error_status_and_code(
    #[case] error: BookingError,
    #[case] status: StatusCode,
    #[case] code: &str,
) {
    let retryable = error.is_retryable();

    let response = map_error(error);

    assert_eq!(response.status(), status);
    let body = body_of(response).await;
    assert_eq!(body["code"], code);
    assert_eq!(body["retryable"], retryable);
}

#[tokio::test]
async fn test_insufficient_points_carries_balance() {
    let error = BookingError::InsufficientPoints {
        point_type: PointType::Team,
        balance: 0,
        required: 1,
    };

    let response = map_error(error);

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = body_of(response).await;
    assert_eq!(body["code"], "insufficient_points");
    assert_eq!(body["point_type"], "team");
    assert_eq!(body["balance"], 0);
    assert_eq!(body["required"], 1);
}

#[tokio::test]
async fn test_database_details_are_not_exposed() {
    let response = map_error(BookingError::Database(eyre::eyre!(
        "duplicate key value violates unique constraint"
    )));

    let body = body_of(response).await;
    assert_eq!(body["error"], "Internal database error");
}

#[tokio::test]
async fn test_eyre_reports_become_database_errors() {
    let error: AppError = eyre::eyre!("connection reset").into();

    assert!(matches!(error.0, BookingError::Database(_)));
    assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
