mod test_utils;

use axum::http::StatusCode;
use axum_test::TestRequest;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};
use uuid::Uuid;

use test_utils::{identity, test_server};

fn as_user(request: TestRequest, user_id: i64, role: &str) -> TestRequest {
    identity(user_id, role)
        .into_iter()
        .fold(request, |request, (name, value)| request.add_header(name, value))
}

fn booking(session_type: &str, user_id: i64) -> Value {
    json!({
        "coach_id": 24,
        "date": "2030-07-22",
        "time": "08:00:00",
        "session_type": session_type,
        "user_id": user_id,
    })
}

#[tokio::test]
async fn test_health_reports_database_down() {
    let server = test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "down");
}

#[tokio::test]
async fn test_version() {
    let server = test_server();

    let body: Value = server.get("/version").await.json();

    assert_eq!(body["name"], "coachslot-api");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_missing_identity_is_unauthenticated() {
    let server = test_server();

    let response = server
        .post("/api/reservations")
        .json(&booking("bilan", 7))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "authentication_error");
    assert_eq!(body["retryable"], false);
}

#[rstest]
#[case("7", "superuser")]
#[case("seven", "client")]
#[case("-3", "client")]
#[tokio::test]
async fn test_malformed_identity_is_unauthenticated(#[case] user_id: &str, #[case] role: &str) {
    let server = test_server();

    let response = server
        .get("/api/users/7/points")
        .add_header(
            axum::http::HeaderName::from_static("x-user-id"),
            axum::http::HeaderValue::from_str(user_id).unwrap(),
        )
        .add_header(
            axum::http::HeaderName::from_static("x-user-role"),
            axum::http::HeaderValue::from_str(role).unwrap(),
        )
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[rstest]
#[case::generate("/api/coaches/24/slots/generate")]
#[case::bulk_delete("/api/slots/bulk-delete")]
#[case::bulk_reservations("/api/reservations/bulk")]
#[tokio::test]
async fn test_admin_routes_reject_clients(#[case] path: &str) {
    let server = test_server();

    let response = as_user(server.post(path), 7, "client").json(&json!({})).await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["code"], "authorization_error");
}

#[tokio::test]
async fn test_clients_cannot_patch_points() {
    let server = test_server();

    let response = as_user(server.patch("/api/users/7/points"), 7, "client")
        .json(&json!({ "solo": { "add": 3 } }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_clients_cannot_read_other_balances() {
    let server = test_server();

    let response = as_user(server.get("/api/users/8/points"), 7, "client").await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_clients_cannot_book_for_someone_else() {
    let server = test_server();

    let response = as_user(server.post("/api/reservations"), 7, "client")
        .json(&booking("normal", 8))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[rstest]
#[case::unknown_session_type(booking("yoga", 7))]
#[case::past_session(json!({
    "coach_id": 24,
    "date": "2030-06-30",
    "time": "08:00:00",
    "session_type": "normal",
    "user_id": 7,
}))]
#[case::no_booker(json!({
    "coach_id": 24,
    "date": "2030-07-22",
    "time": "08:00:00",
    "session_type": "bilan",
}))]
#[case::guest_paid_session(json!({
    "coach_id": 24,
    "date": "2030-07-22",
    "time": "08:00:00",
    "session_type": "normal",
    "guest": { "name": "Guest", "email": "guest@example.com", "phone": null },
}))]
#[tokio::test]
async fn test_invalid_bookings_are_rejected_before_storage(#[case] payload: Value) {
    let server = test_server();

    let response = as_user(server.post("/api/reservations"), 7, "client")
        .json(&payload)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let server = test_server();

    let response = as_user(server.post("/api/reservations"), 7, "client")
        .json(&json!({ "coach_id": "twenty-four" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn test_malformed_reservation_id_is_a_validation_error() {
    let server = test_server();

    let response = as_user(server.get("/api/reservations/not-a-uuid"), 7, "client").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inverted_generation_window_is_rejected() {
    let server = test_server();

    let response = as_user(server.post("/api/coaches/24/slots/generate"), 1, "admin")
        .json(&json!({
            "start_date": "2030-07-22",
            "start_time": "11:00:00",
            "end_time": "07:00:00",
            "session_types": ["normal", "bilan"],
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn test_storage_outage_is_retryable() {
    let server = test_server();

    let response = as_user(
        server.post(&format!("/api/reservations/{}/cancel", Uuid::new_v4())),
        7,
        "client",
    )
    .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["code"], "storage_failure");
    assert_eq!(body["retryable"], true);
}
