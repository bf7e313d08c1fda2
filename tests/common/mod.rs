use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use fieldstock_api::{
    config::AppConfig,
    db,
    entities::{
        employee, employee_session, part, part_request, part_request_line,
        personal_inventory_entry, supplier, technician_session,
    },
    events::{self, EventSender},
    AppState,
};

pub const TECH_TOKEN: &str = "tech-token";
pub const TECH2_TOKEN: &str = "tech2-token";
pub const OFFICE_TOKEN: &str = "office-token";

pub const TECH_ID: &str = "EMP1";
pub const TECH2_ID: &str = "EMP2";
pub const OFFICE_ID: &str = "EMP9";

/// Test harness backed by an in-memory SQLite database with a single pooled
/// connection, so every query sees the same schema.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Fresh application with migrations applied and a standard cast:
    /// two technicians, one logistics user, and sessions for each.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx, None));

        let state = AppState::new(db_arc, cfg, event_sender);
        let router = fieldstock_api::app_router().with_state(state.clone());

        let app = Self {
            router,
            state,
            _event_task: event_task,
        };

        app.seed_employee(TECH_ID, "Marek Nowak", "technician", Some("PACZ-WAW-014"))
            .await;
        app.seed_employee(TECH2_ID, "Piotr Wisniewski", "technician", None)
            .await;
        app.seed_employee(OFFICE_ID, "Anna Kowalska", "logistics", None)
            .await;
        app.seed_technician_session(TECH_TOKEN, TECH_ID).await;
        app.seed_technician_session(TECH2_TOKEN, TECH2_ID).await;
        app.seed_employee_session(OFFICE_TOKEN, OFFICE_ID).await;
        app
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };
        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_employee(
        &self,
        id: &str,
        name: &str,
        role: &str,
        delivery_point: Option<&str>,
    ) {
        employee::ActiveModel {
            id: Set(id.to_string()),
            name: Set(name.to_string()),
            role: Set(role.to_string()),
            delivery_point: Set(delivery_point.map(String::from)),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed employee");
    }

    pub async fn seed_technician_session(&self, token: &str, employee_id: &str) {
        technician_session::ActiveModel {
            token: Set(token.to_string()),
            employee_id: Set(employee_id.to_string()),
            expires_at: Set(Utc::now() + Duration::hours(1)),
            created_at: Set(Utc::now()),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed technician session");
    }

    pub async fn seed_employee_session(&self, token: &str, employee_id: &str) {
        employee_session::ActiveModel {
            token: Set(token.to_string()),
            employee_id: Set(employee_id.to_string()),
            expires_at: Set(Utc::now() + Duration::hours(1)),
            created_at: Set(Utc::now()),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed employee session");
    }

    /// Seed a catalog part priced through the structured pricing blob.
    pub async fn seed_part(&self, id: &str, name: &str, retail_price: Decimal) {
        part::ActiveModel {
            id: Set(id.to_string()),
            name: Set(name.to_string()),
            part_number: Set(format!("PN-{}", id)),
            unit_price: Set(None),
            pricing: Set(Some(
                serde_json::json!({ "retailPrice": retail_price.to_string() }),
            )),
            warranty_months: Set(Some(12)),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed part");
    }

    /// Seed a legacy catalog part priced only through the flat field.
    pub async fn seed_flat_priced_part(&self, id: &str, name: &str, unit_price: Decimal) {
        part::ActiveModel {
            id: Set(id.to_string()),
            name: Set(name.to_string()),
            part_number: Set(format!("PN-{}", id)),
            unit_price: Set(Some(unit_price)),
            pricing: Set(None),
            warranty_months: Set(None),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed part");
    }

    pub async fn seed_supplier(&self, id: &str, name: &str, free_shipping_threshold: Decimal) {
        supplier::ActiveModel {
            id: Set(id.to_string()),
            name: Set(name.to_string()),
            contact_email: Set(format!("orders@{}.example.com", id.to_lowercase())),
            free_shipping_threshold: Set(free_shipping_threshold),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed supplier");
    }

    pub async fn seed_inventory(&self, employee_id: &str, part_id: &str, quantity: i32) {
        personal_inventory_entry::ActiveModel {
            employee_id: Set(employee_id.to_string()),
            part_id: Set(part_id.to_string()),
            quantity: Set(quantity),
            last_used: Set(None),
            location: Set(Some("van".to_string())),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed inventory entry");
    }

    /// Seed a part request directly in the given status.
    pub async fn seed_part_request(
        &self,
        request_id: &str,
        employee_id: &str,
        employee_name: &str,
        status: part_request::PartRequestStatus,
        lines: &[(&str, i32)],
    ) {
        let approved = status != part_request::PartRequestStatus::Pending;
        part_request::ActiveModel {
            request_id: Set(request_id.to_string()),
            requested_for: Set(employee_id.to_string()),
            requested_for_name: Set(employee_name.to_string()),
            status: Set(status),
            supplier_order_id: Set(None),
            consolidated_with: Set(None),
            rejection_reason: Set(None),
            created_at: Set(Utc::now()),
            approved_at: Set(approved.then(Utc::now)),
            rejected_at: Set(None),
            ordered_at: Set(None),
            delivered_at: Set(None),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed part request");

        for (part_id, quantity) in lines {
            part_request_line::ActiveModel {
                request_id: Set(request_id.to_string()),
                part_id: Set(part_id.to_string()),
                quantity: Set(*quantity),
                ..Default::default()
            }
            .insert(self.state.db.as_ref())
            .await
            .expect("seed part request line");
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Read a response body as JSON.
pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse response body as json")
}
