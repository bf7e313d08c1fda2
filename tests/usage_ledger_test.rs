mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;

use common::{json_body, TestApp, OFFICE_TOKEN, TECH2_TOKEN, TECH_ID, TECH_TOKEN};
use fieldstock_api::entities::part;

fn decimal_field(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::String(s) => s.parse().expect("decimal string"),
        serde_json::Value::Number(n) => n.as_f64().expect("decimal number"),
        other => panic!("unexpected decimal encoding: {:?}", other),
    }
}

async fn seed_standard_stock(app: &TestApp) {
    app.seed_part("P100", "Door gasket", dec!(30)).await;
    app.seed_part("P200", "Drain pump", dec!(12.5)).await;
    app.seed_inventory(TECH_ID, "P100", 5).await;
    app.seed_inventory(TECH_ID, "P200", 2).await;
}

#[tokio::test]
async fn recording_usage_decrements_stock_and_snapshots_prices() {
    let app = TestApp::new().await;
    seed_standard_stock(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/personal/use",
            Some(json!({
                "employeeId": TECH_ID,
                "orderId": "ZL-2031",
                "parts": [
                    { "partId": "P100", "quantity": 2, "installationNotes": "rear seal" },
                    { "partId": "P200", "quantity": 1 }
                ],
                "addToInvoice": true,
                "invoiceId": "FV-2031",
                "customerInfo": { "name": "J. Kowalczyk" }
            })),
            Some(TECH_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;

    let usage = &body["usage"];
    assert!(usage["usageId"].as_str().unwrap().starts_with("PU-"));
    assert_eq!(usage["employeeId"], TECH_ID);
    assert_eq!(usage["orderId"], "ZL-2031");
    assert_eq!(usage["invoiceId"], "FV-2031");
    assert_eq!(decimal_field(&usage["totalValue"]), 72.5);
    let lines = usage["parts"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["partId"], "P100");
    assert_eq!(decimal_field(&lines[0]["unitPrice"]), 30.0);
    assert_eq!(decimal_field(&lines[0]["totalPrice"]), 60.0);
    assert_eq!(lines[0]["installationNotes"], "rear seal");
    assert_eq!(lines[0]["warrantyMonths"], 12);

    let inventory = &body["inventory"];
    let entries = inventory["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["partId"], "P100");
    assert_eq!(entries[0]["quantity"], 3);
    assert!(entries[0]["lastUsed"].is_string());
    assert_eq!(entries[1]["partId"], "P200");
    assert_eq!(entries[1]["quantity"], 1);
    assert_eq!(inventory["statistics"]["totalParts"], 4);
    assert_eq!(decimal_field(&inventory["statistics"]["totalValue"]), 102.5);

    assert_eq!(body["lowStockAlert"], false);
    assert_eq!(body["outOfStockParts"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn insufficient_stock_rejects_the_whole_batch() {
    let app = TestApp::new().await;
    seed_standard_stock(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/personal/use",
            Some(json!({
                "employeeId": TECH_ID,
                "orderId": "ZL-2032",
                "parts": [
                    { "partId": "P100", "quantity": 10 },
                    { "partId": "P200", "quantity": 1 }
                ]
            })),
            Some(TECH_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let unavailable = body["details"]["unavailableParts"].as_array().unwrap();
    assert_eq!(unavailable.len(), 1);
    assert_eq!(unavailable[0]["partId"], "P100");
    assert_eq!(unavailable[0]["requested"], 10);
    assert_eq!(unavailable[0]["available"], 5);

    // Nothing moved, including the line that was coverable on its own.
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/inventory/personal/{}", TECH_ID),
            None,
            Some(TECH_TOKEN),
        )
        .await;
    let body = json_body(response).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries[0]["quantity"], 5);
    assert_eq!(entries[1]["quantity"], 2);
    assert!(entries[0]["lastUsed"].is_null());
}

#[tokio::test]
async fn exhausting_a_part_removes_the_row_and_raises_the_alert() {
    let app = TestApp::new().await;
    seed_standard_stock(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/personal/use",
            Some(json!({
                "employeeId": TECH_ID,
                "orderId": "ZL-2033",
                "parts": [{ "partId": "P200", "quantity": 2 }]
            })),
            Some(TECH_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["lowStockAlert"], true);
    assert_eq!(body["outOfStockParts"], json!(["P200"]));

    let entries = body["inventory"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["partId"], "P100");
}

#[tokio::test]
async fn technicians_cannot_record_usage_for_each_other() {
    let app = TestApp::new().await;
    seed_standard_stock(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/personal/use",
            Some(json!({
                "employeeId": TECH_ID,
                "orderId": "ZL-2034",
                "parts": [{ "partId": "P100", "quantity": 1 }]
            })),
            Some(TECH2_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_employee_and_unknown_part_are_not_found() {
    let app = TestApp::new().await;
    seed_standard_stock(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/personal/use",
            Some(json!({
                "employeeId": "EMP404",
                "orderId": "ZL-2035",
                "parts": [{ "partId": "P100", "quantity": 1 }]
            })),
            Some(OFFICE_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/personal/use",
            Some(json!({
                "employeeId": TECH_ID,
                "orderId": "ZL-2035",
                "parts": [{ "partId": "P404", "quantity": 1 }]
            })),
            Some(TECH_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/inventory/personal/{}", TECH_ID),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/inventory/personal/{}", TECH_ID),
            None,
            Some("no-such-token"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ledger_prices_survive_catalog_changes() {
    let app = TestApp::new().await;
    seed_standard_stock(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/personal/use",
            Some(json!({
                "employeeId": TECH_ID,
                "orderId": "ZL-2036",
                "parts": [{ "partId": "P100", "quantity": 1 }]
            })),
            Some(TECH_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Reprice the catalog part after the fact.
    let existing = part::Entity::find_by_id("P100")
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    let mut active: part::ActiveModel = existing.into();
    active.pricing = Set(Some(json!({ "retailPrice": "99" })));
    active.update(app.state.db.as_ref()).await.unwrap();

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/inventory/personal/{}/usage", TECH_ID),
            None,
            Some(TECH_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    let line = &records[0]["parts"][0];
    assert_eq!(decimal_field(&line["unitPrice"]), 30.0);
}

#[tokio::test]
async fn usage_ledger_pages_newest_first() {
    let app = TestApp::new().await;
    seed_standard_stock(&app).await;

    for order in ["ZL-1", "ZL-2"] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/inventory/personal/use",
                Some(json!({
                    "employeeId": TECH_ID,
                    "orderId": order,
                    "parts": [{ "partId": "P100", "quantity": 1 }]
                })),
                Some(TECH_TOKEN),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request(
            Method::GET,
            &format!(
                "/api/v1/inventory/personal/{}/usage?page=1&per_page=1",
                TECH_ID
            ),
            None,
            Some(TECH_TOKEN),
        )
        .await;
    let body = json_body(response).await;
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn degenerate_pagination_values_do_not_break_the_ledger() {
    let app = TestApp::new().await;
    seed_standard_stock(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/personal/use",
            Some(json!({
                "employeeId": TECH_ID,
                "orderId": "ZL-2038",
                "parts": [{ "partId": "P100", "quantity": 1 }]
            })),
            Some(TECH_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // A zero page size is clamped instead of reaching the paginator.
    let response = app
        .request(
            Method::GET,
            &format!(
                "/api/v1/inventory/personal/{}/usage?page=0&per_page=0",
                TECH_ID
            ),
            None,
            Some(TECH_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["pagination"]["per_page"], 1);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // An oversized page size is capped rather than passed through.
    let response = app
        .request(
            Method::GET,
            &format!(
                "/api/v1/inventory/personal/{}/usage?per_page=10000",
                TECH_ID
            ),
            None,
            Some(TECH_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["pagination"]["per_page"], 100);
}

#[tokio::test]
async fn recorded_usages_are_exposed_on_the_metrics_endpoint() {
    let app = TestApp::new().await;
    seed_standard_stock(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/personal/use",
            Some(json!({
                "employeeId": TECH_ID,
                "orderId": "ZL-2039",
                "parts": [{ "partId": "P100", "quantity": 1 }]
            })),
            Some(TECH_TOKEN),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.request(Method::GET, "/metrics", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let exposition = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(exposition.contains("parts_usages_recorded_total"));
}

#[tokio::test]
async fn zero_and_negative_quantities_are_rejected() {
    let app = TestApp::new().await;
    seed_standard_stock(&app).await;

    for quantity in [0, -3] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/inventory/personal/use",
                Some(json!({
                    "employeeId": TECH_ID,
                    "orderId": "ZL-2037",
                    "parts": [{ "partId": "P100", "quantity": quantity }]
                })),
                Some(TECH_TOKEN),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
