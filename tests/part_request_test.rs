mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::{json_body, TestApp, OFFICE_TOKEN, TECH2_TOKEN, TECH_ID, TECH_TOKEN};

async fn seed_catalog(app: &TestApp) {
    app.seed_part("P100", "Door gasket", dec!(30)).await;
    app.seed_part("P200", "Drain pump", dec!(12.5)).await;
}

async fn submit_request(app: &TestApp) -> String {
    let response = app
        .request(
            Method::POST,
            "/api/v1/part-requests",
            Some(json!({
                "parts": [
                    { "partId": "P100", "quantity": 3 },
                    { "partId": "P200", "quantity": 1 }
                ]
            })),
            Some(TECH_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    body["requestId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn submitting_creates_a_pending_request_for_the_caller() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/part-requests",
            Some(json!({
                "parts": [{ "partId": "P100", "quantity": 3 }]
            })),
            Some(TECH_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert!(body["requestId"].as_str().unwrap().starts_with("PR-"));
    assert_eq!(body["requestedFor"], TECH_ID);
    assert_eq!(body["requestedForName"], "Marek Nowak");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["parts"][0]["partId"], "P100");
    assert_eq!(body["parts"][0]["quantity"], 3);
}

#[tokio::test]
async fn submitting_for_another_technician_requires_logistics() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let payload = json!({
        "requestedFor": TECH_ID,
        "parts": [{ "partId": "P100", "quantity": 1 }]
    });
    let response = app
        .request(
            Method::POST,
            "/api/v1/part-requests",
            Some(payload.clone()),
            Some(TECH2_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::POST,
            "/api/v1/part-requests",
            Some(payload),
            Some(OFFICE_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn unknown_parts_cannot_be_requested() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/part-requests",
            Some(json!({
                "parts": [{ "partId": "P404", "quantity": 1 }]
            })),
            Some(TECH_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn approval_moves_pending_to_approved_exactly_once() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;
    let request_id = submit_request(&app).await;

    // Technicians cannot approve.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/part-requests/{}/approve", request_id),
            None,
            Some(TECH_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/part-requests/{}/approve", request_id),
            None,
            Some(OFFICE_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "approved");
    assert!(body["approvedAt"].is_string());

    // Approving again is a status violation.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/part-requests/{}/approve", request_id),
            None,
            Some(OFFICE_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejection_is_terminal_and_keeps_the_reason() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;
    let request_id = submit_request(&app).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/part-requests/{}/reject", request_id),
            Some(json!({ "reason": "duplicate of last week's request" })),
            Some(OFFICE_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["rejectionReason"], "duplicate of last week's request");

    // A rejected request can never be approved.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/part-requests/{}/approve", request_id),
            None,
            Some(OFFICE_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejecting_without_a_reason_fails_validation() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;
    let request_id = submit_request(&app).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/part-requests/{}/reject", request_id),
            Some(json!({ "reason": "" })),
            Some(OFFICE_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn technicians_only_see_their_own_requests() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;
    let request_id = submit_request(&app).await;

    let response = app
        .request(Method::GET, "/api/v1/part-requests", None, Some(TECH2_TOKEN))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/part-requests/{}", request_id),
            None,
            Some(TECH2_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(Method::GET, "/api/v1/part-requests", None, Some(OFFICE_TOKEN))
        .await;
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = app
        .request(
            Method::GET,
            "/api/v1/part-requests?status=pending",
            None,
            Some(OFFICE_TOKEN),
        )
        .await;
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}
