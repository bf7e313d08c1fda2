use crate::{
    commands::{dated_id, Command, ID_GENERATION_ATTEMPTS},
    db::DbPool,
    entities::{
        employee::Entity as Employee,
        personal_inventory_entry::{self, Entity as PersonalInventoryEntry},
        usage_line,
        usage_record::{self, Entity as UsageRecord},
    },
    errors::{ServiceError, UnavailablePart},
    events::{Event, EventSender},
    services::catalog,
    services::inventory::{build_inventory_view, InventoryView},
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

lazy_static! {
    static ref PARTS_USAGES_RECORDED: IntCounter = register_int_counter!(
        "parts_usages_recorded_total",
        "Total number of recorded parts usages"
    )
    .expect("metric can be registered");
    static ref PARTS_USAGE_FAILURES: IntCounterVec = register_int_counter_vec!(
        "parts_usage_failures_total",
        "Total number of failed parts usage attempts",
        &["error_type"]
    )
    .expect("metric can be registered");
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestedPart {
    #[validate(length(min = 1))]
    pub part_id: String,
    pub quantity: i32,
    #[validate(length(max = 500))]
    pub installation_notes: Option<String>,
}

/// Records parts consumed on a job against the technician's personal stock,
/// decrementing every line or none of them.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UsePartsCommand {
    #[validate(length(min = 1))]
    pub employee_id: String,
    #[validate(length(min = 1))]
    pub order_id: String,
    #[validate(length(min = 1, message = "At least one part line is required"))]
    pub parts: Vec<RequestedPart>,
    pub add_to_invoice: bool,
    pub invoice_id: Option<String>,
    pub customer_info: Option<serde_json::Value>,
    /// Warranty granted on this job; falls back to the catalog warranty per part.
    pub warranty_months: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageLineView {
    pub part_id: String,
    pub part_name: String,
    pub part_number: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub installation_notes: Option<String>,
    pub warranty_months: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecordView {
    pub usage_id: String,
    pub employee_id: String,
    pub order_id: String,
    pub usage_date: DateTime<Utc>,
    pub parts: Vec<UsageLineView>,
    pub total_value: Decimal,
    pub invoice_id: Option<String>,
    pub customer_info: Option<serde_json::Value>,
}

impl UsageRecordView {
    pub fn from_models(record: usage_record::Model, lines: Vec<usage_line::Model>) -> Self {
        Self {
            usage_id: record.usage_id,
            employee_id: record.employee_id,
            order_id: record.order_id,
            usage_date: record.usage_date,
            parts: lines
                .into_iter()
                .map(|l| UsageLineView {
                    part_id: l.part_id,
                    part_name: l.part_name,
                    part_number: l.part_number,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                    total_price: l.total_price,
                    installation_notes: l.installation_notes,
                    warranty_months: l.warranty_months,
                })
                .collect(),
            total_value: record.total_value,
            invoice_id: record.invoice_id,
            customer_info: record.customer_info,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsePartsResult {
    pub usage: UsageRecordView,
    pub inventory: InventoryView,
    /// Part ids whose stock line reached zero and was removed.
    pub out_of_stock_parts: Vec<String>,
}

#[async_trait::async_trait]
impl Command for UsePartsCommand {
    type Result = UsePartsResult;

    #[instrument(skip(self, db_pool, event_sender), fields(employee_id = %self.employee_id, order_id = %self.order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            PARTS_USAGE_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            ServiceError::ValidationError(format!("Invalid input: {}", e))
        })?;
        for line in &self.parts {
            if line.quantity < 1 {
                PARTS_USAGE_FAILURES
                    .with_label_values(&["validation_error"])
                    .inc();
                return Err(ServiceError::ValidationError(format!(
                    "Quantity for part {} must be at least 1",
                    line.part_id
                )));
            }
        }

        let db = db_pool.as_ref();
        let employee = Employee::find_by_id(&self.employee_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                PARTS_USAGE_FAILURES.with_label_values(&["not_found"]).inc();
                ServiceError::NotFound(format!("Employee {} not found", self.employee_id))
            })?;

        let employee_id = self.employee_id.clone();
        let order_id = self.order_id.clone();
        let parts = self.parts.clone();
        let invoice_id = if self.add_to_invoice {
            self.invoice_id.clone()
        } else {
            None
        };
        let customer_info = self.customer_info.clone();
        let warranty_months = self.warranty_months;

        let (usage, inventory, exhausted) = db
            .transaction::<_, (UsageRecordView, InventoryView, Vec<(String, String)>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        apply_usage(
                            txn,
                            &employee_id,
                            &order_id,
                            &parts,
                            invoice_id,
                            customer_info,
                            warranty_months,
                        )
                        .await
                    })
                },
            )
            .await
            .map_err(|e| {
                let err = match e {
                    TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                    TransactionError::Transaction(service_err) => service_err,
                };
                PARTS_USAGE_FAILURES
                    .with_label_values(&[match &err {
                        ServiceError::InsufficientStock { .. } => "insufficient_stock",
                        ServiceError::NotFound(_) => "not_found",
                        ServiceError::ValidationError(_) => "validation_error",
                        _ => "internal_error",
                    }])
                    .inc();
                err
            })?;

        PARTS_USAGES_RECORDED.inc();
        info!(
            usage_id = %usage.usage_id,
            total_value = %usage.total_value,
            exhausted = exhausted.len(),
            "parts usage recorded"
        );

        event_sender
            .send_or_log(Event::PartsUsed {
                usage_id: usage.usage_id.clone(),
                employee_id: usage.employee_id.clone(),
                order_id: usage.order_id.clone(),
                total_value: usage.total_value,
            })
            .await;
        for (part_id, part_name) in &exhausted {
            event_sender
                .send_or_log(Event::PartExhausted {
                    employee_id: employee.id.clone(),
                    employee_name: employee.name.clone(),
                    part_id: part_id.clone(),
                    part_name: part_name.clone(),
                })
                .await;
        }

        Ok(UsePartsResult {
            usage,
            inventory,
            out_of_stock_parts: exhausted.into_iter().map(|(id, _)| id).collect(),
        })
    }
}

async fn apply_usage<C: ConnectionTrait>(
    txn: &C,
    employee_id: &str,
    order_id: &str,
    parts: &[RequestedPart],
    invoice_id: Option<String>,
    customer_info: Option<serde_json::Value>,
    warranty_months: Option<i32>,
) -> Result<(UsageRecordView, InventoryView, Vec<(String, String)>), ServiceError> {
    let now = Utc::now();

    let mut entries: std::collections::HashMap<String, personal_inventory_entry::Model> =
        PersonalInventoryEntry::find()
            .filter(personal_inventory_entry::Column::EmployeeId.eq(employee_id))
            .all(txn)
            .await?
            .into_iter()
            .map(|e| (e.part_id.clone(), e))
            .collect();

    let mut totals: BTreeMap<String, i32> = BTreeMap::new();
    for line in parts {
        *totals.entry(line.part_id.clone()).or_insert(0) += line.quantity;
    }

    // Catalog membership first: a part the company does not stock at all is
    // a different failure than one the technician has run out of.
    let part_ids: Vec<String> = totals.keys().cloned().collect();
    let catalog = catalog::load_parts(txn, &part_ids).await?;

    // Whole-batch stock check; any shortfall rejects every line.
    let mut unavailable = Vec::new();
    for (part_id, requested) in &totals {
        let available = entries.get(part_id).map(|e| e.quantity).unwrap_or(0);
        if available < *requested {
            unavailable.push(UnavailablePart {
                part_id: part_id.clone(),
                requested: *requested,
                available,
            });
        }
    }
    if !unavailable.is_empty() {
        return Err(ServiceError::insufficient_stock(unavailable));
    }

    let usage_id = generate_usage_id(txn, now).await?;

    // All lines are covered; decrement each stock row, dropping rows that hit
    // zero instead of keeping zero-quantity lines around.
    let mut exhausted = Vec::new();
    for (part_id, consumed) in &totals {
        let entry = entries.remove(part_id).ok_or_else(|| {
            ServiceError::InternalError(format!("Stock line for {} vanished mid-check", part_id))
        })?;
        let part = catalog.get(part_id).ok_or_else(|| {
            ServiceError::InternalError(format!("Catalog row for {} vanished mid-check", part_id))
        })?;
        let remaining = entry.quantity - consumed;
        if remaining == 0 {
            exhausted.push((part_id.clone(), part.name.clone()));
            entry.delete(txn).await?;
        } else {
            let mut active: personal_inventory_entry::ActiveModel = entry.into();
            active.quantity = Set(remaining);
            active.last_used = Set(Some(now));
            active.update(txn).await?;
        }
    }

    let mut total_value = Decimal::ZERO;
    let mut line_models = Vec::with_capacity(parts.len());
    for line in parts {
        let part = catalog.get(&line.part_id).ok_or_else(|| {
            ServiceError::InternalError(format!(
                "Catalog row for {} vanished mid-check",
                line.part_id
            ))
        })?;
        let unit_price = catalog::normalized_unit_price(part);
        let total_price = unit_price * Decimal::from(line.quantity);
        total_value += total_price;
        line_models.push(usage_line::ActiveModel {
            usage_id: Set(usage_id.clone()),
            part_id: Set(line.part_id.clone()),
            part_name: Set(part.name.clone()),
            part_number: Set(part.part_number.clone()),
            quantity: Set(line.quantity),
            unit_price: Set(unit_price),
            total_price: Set(total_price),
            installation_notes: Set(line.installation_notes.clone()),
            warranty_months: Set(warranty_months.or(part.warranty_months)),
            ..Default::default()
        });
    }

    let record = usage_record::ActiveModel {
        usage_id: Set(usage_id.clone()),
        employee_id: Set(employee_id.to_string()),
        order_id: Set(order_id.to_string()),
        usage_date: Set(now),
        total_value: Set(total_value),
        invoice_id: Set(invoice_id),
        customer_info: Set(customer_info),
    }
    .insert(txn)
    .await?;

    let mut lines = Vec::with_capacity(line_models.len());
    for model in line_models {
        lines.push(model.insert(txn).await?);
    }

    let inventory = build_inventory_view(txn, employee_id).await?;
    Ok((
        UsageRecordView::from_models(record, lines),
        inventory,
        exhausted,
    ))
}

async fn generate_usage_id<C: ConnectionTrait>(
    txn: &C,
    now: DateTime<Utc>,
) -> Result<String, ServiceError> {
    for _ in 0..ID_GENERATION_ATTEMPTS {
        let suffix: u32 = { rand::thread_rng().gen_range(0..10_000) };
        let candidate = dated_id("PU", now, suffix);
        if UsageRecord::find_by_id(&candidate).one(txn).await?.is_none() {
            return Ok(candidate);
        }
    }
    error!("exhausted usage id generation attempts");
    Err(ServiceError::InternalError(
        "Could not allocate a unique usage id".to_string(),
    ))
}
