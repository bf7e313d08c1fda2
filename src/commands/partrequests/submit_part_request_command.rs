use crate::{
    commands::{dated_id, Command, ID_GENERATION_ATTEMPTS},
    db::DbPool,
    entities::{
        employee::Entity as Employee,
        part_request::{self, Entity as PartRequest, PartRequestStatus},
        part_request_line,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog,
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

lazy_static! {
    static ref PART_REQUESTS_SUBMITTED: IntCounter = register_int_counter!(
        "part_requests_submitted_total",
        "Total number of part requests submitted"
    )
    .expect("metric can be registered");
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestedLine {
    #[validate(length(min = 1))]
    pub part_id: String,
    pub quantity: i32,
}

/// Opens a pending part request on behalf of a technician.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitPartRequestCommand {
    #[validate(length(min = 1))]
    pub requested_for: String,
    #[validate(length(min = 1, message = "At least one part line is required"))]
    pub parts: Vec<RequestedLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestLineView {
    pub part_id: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartRequestView {
    pub request_id: String,
    pub requested_for: String,
    pub requested_for_name: String,
    pub parts: Vec<RequestLineView>,
    pub status: PartRequestStatus,
    pub supplier_order_id: Option<String>,
    pub consolidated_with: Vec<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub ordered_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl PartRequestView {
    pub fn from_models(
        request: part_request::Model,
        lines: Vec<part_request_line::Model>,
    ) -> Self {
        let consolidated_with = request
            .consolidated_with
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        Self {
            request_id: request.request_id,
            requested_for: request.requested_for,
            requested_for_name: request.requested_for_name,
            parts: lines
                .into_iter()
                .map(|l| RequestLineView {
                    part_id: l.part_id,
                    quantity: l.quantity,
                })
                .collect(),
            status: request.status,
            supplier_order_id: request.supplier_order_id,
            consolidated_with,
            rejection_reason: request.rejection_reason,
            created_at: request.created_at,
            approved_at: request.approved_at,
            rejected_at: request.rejected_at,
            ordered_at: request.ordered_at,
            delivered_at: request.delivered_at,
        }
    }
}

#[async_trait::async_trait]
impl Command for SubmitPartRequestCommand {
    type Result = PartRequestView;

    #[instrument(skip(self, db_pool, event_sender), fields(requested_for = %self.requested_for))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()
            .map_err(|e| ServiceError::ValidationError(format!("Invalid input: {}", e)))?;
        for line in &self.parts {
            if line.quantity < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "Quantity for part {} must be at least 1",
                    line.part_id
                )));
            }
        }

        let db = db_pool.as_ref();
        let employee = Employee::find_by_id(&self.requested_for)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Employee {} not found", self.requested_for))
            })?;

        let part_ids: Vec<String> = self.parts.iter().map(|l| l.part_id.clone()).collect();
        catalog::load_parts(db, &part_ids).await?;

        let requested_for = self.requested_for.clone();
        let requested_for_name = employee.name.clone();
        let parts = self.parts.clone();
        let (request, lines) = db
            .transaction::<_, (part_request::Model, Vec<part_request_line::Model>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let now = Utc::now();
                        let request_id = generate_request_id(txn, now).await?;
                        let request = part_request::ActiveModel {
                            request_id: Set(request_id.clone()),
                            requested_for: Set(requested_for),
                            requested_for_name: Set(requested_for_name),
                            status: Set(PartRequestStatus::Pending),
                            supplier_order_id: Set(None),
                            consolidated_with: Set(None),
                            rejection_reason: Set(None),
                            created_at: Set(now),
                            approved_at: Set(None),
                            rejected_at: Set(None),
                            ordered_at: Set(None),
                            delivered_at: Set(None),
                        }
                        .insert(txn)
                        .await?;

                        let mut lines = Vec::with_capacity(parts.len());
                        for line in &parts {
                            lines.push(
                                part_request_line::ActiveModel {
                                    request_id: Set(request_id.clone()),
                                    part_id: Set(line.part_id.clone()),
                                    quantity: Set(line.quantity),
                                    ..Default::default()
                                }
                                .insert(txn)
                                .await?,
                            );
                        }
                        Ok((request, lines))
                    })
                },
            )
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        PART_REQUESTS_SUBMITTED.inc();
        info!(request_id = %request.request_id, "part request submitted");
        event_sender
            .send_or_log(Event::PartRequestSubmitted {
                request_id: request.request_id.clone(),
                employee_id: employee.id.clone(),
                employee_name: employee.name.clone(),
            })
            .await;

        Ok(PartRequestView::from_models(request, lines))
    }
}

async fn generate_request_id<C: ConnectionTrait>(
    txn: &C,
    now: DateTime<Utc>,
) -> Result<String, ServiceError> {
    for _ in 0..ID_GENERATION_ATTEMPTS {
        let suffix: u32 = { rand::thread_rng().gen_range(0..10_000) };
        let candidate = dated_id("PR", now, suffix);
        if PartRequest::find_by_id(&candidate).one(txn).await?.is_none() {
            return Ok(candidate);
        }
    }
    error!("exhausted part request id generation attempts");
    Err(ServiceError::InternalError(
        "Could not allocate a unique request id".to_string(),
    ))
}
