use crate::{
    commands::{dated_id, Command, ID_GENERATION_ATTEMPTS},
    db::DbPool,
    entities::{
        employee::{self, Entity as Employee},
        part_request::{self, Entity as PartRequest, PartRequestStatus},
        part_request_line::{self, Entity as PartRequestLine},
        supplier::Entity as Supplier,
        supplier_order::{self, DeliveryMethod, Entity as SupplierOrder, SupplierOrderStatus},
        supplier_order_item,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog,
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// Flat fee charged per shipment below the supplier's free-shipping threshold.
const FLAT_SHIPPING_FEE: Decimal = dec!(15);
/// Fixed surcharge for express-priority orders.
const EXPRESS_SURCHARGE: Decimal = dec!(25);
/// Destination used for a technician with no registered delivery point.
const DEFAULT_DESTINATION: &str = "office";

lazy_static! {
    static ref SUPPLIER_ORDERS_CREATED: IntCounter = register_int_counter!(
        "supplier_orders_created_total",
        "Total number of supplier orders created"
    )
    .expect("metric can be registered");
    static ref SUPPLIER_ORDER_FAILURES: IntCounterVec = register_int_counter_vec!(
        "supplier_order_failures_total",
        "Total number of failed supplier order attempts",
        &["error_type"]
    )
    .expect("metric can be registered");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderPriority {
    #[default]
    Normal,
    Express,
}

impl std::fmt::Display for OrderPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Express => "express",
        })
    }
}

impl OrderPriority {
    fn from_stored(value: &str) -> Self {
        if value == "express" {
            Self::Express
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationInfo {
    /// Savings the caller computed when proposing the consolidation.
    /// Stored for reporting, never recomputed here.
    pub savings: Option<Decimal>,
    /// Destination serving the whole batch for consolidated delivery.
    pub shared_destination: Option<String>,
}

/// Merges a batch of approved part requests into one order against a single
/// supplier, with per-part aggregation and per-technician attribution.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSupplierOrderCommand {
    #[validate(length(min = 1))]
    pub supplier_id: String,
    #[validate(length(min = 1))]
    pub created_by: String,
    #[validate(length(min = 1, message = "At least one part request is required"))]
    pub part_request_ids: Vec<String>,
    pub delivery_method: DeliveryMethod,
    pub priority: OrderPriority,
    pub consolidation_info: Option<ConsolidationInfo>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
    pub request_id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub part_id: String,
    pub part_name: String,
    pub unit_price: Decimal,
    pub total_quantity: i32,
    pub assign_to: Vec<AssignmentView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddressView {
    /// Absent for a shared consolidated destination.
    pub employee_id: Option<String>,
    pub destination: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderPricingView {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub express_charge: Decimal,
    pub total: Decimal,
    pub savings: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierOrderView {
    pub order_id: String,
    pub supplier_id: String,
    pub created_by: String,
    pub part_request_ids: Vec<String>,
    pub items: Vec<OrderItemView>,
    pub delivery_method: DeliveryMethod,
    pub delivery_addresses: Vec<DeliveryAddressView>,
    pub pricing: OrderPricingView,
    pub priority: OrderPriority,
    pub notes: Option<String>,
    pub status: SupplierOrderStatus,
    pub created_at: DateTime<Utc>,
}

impl SupplierOrderView {
    pub fn from_models(
        order: supplier_order::Model,
        item_rows: Vec<supplier_order_item::Model>,
    ) -> Result<Self, ServiceError> {
        let decode = |ctx: &str, e: serde_json::Error| {
            ServiceError::InternalError(format!("Corrupt {} on order: {}", ctx, e))
        };
        let part_request_ids: Vec<String> = serde_json::from_value(order.part_request_ids)
            .map_err(|e| decode("part request ids", e))?;
        let delivery_addresses: Vec<DeliveryAddressView> =
            serde_json::from_value(order.delivery_addresses)
                .map_err(|e| decode("delivery addresses", e))?;
        let items = item_rows
            .into_iter()
            .map(|row| {
                Ok(OrderItemView {
                    part_id: row.part_id,
                    part_name: row.part_name,
                    unit_price: row.unit_price,
                    total_quantity: row.total_quantity,
                    assign_to: serde_json::from_value(row.assign_to)
                        .map_err(|e| decode("item assignments", e))?,
                })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        Ok(Self {
            order_id: order.order_id,
            supplier_id: order.supplier_id,
            created_by: order.created_by,
            part_request_ids,
            items,
            delivery_method: order.delivery_method,
            delivery_addresses,
            pricing: OrderPricingView {
                subtotal: order.subtotal,
                shipping_cost: order.shipping_cost,
                express_charge: order.express_charge,
                total: order.total,
                savings: order.savings,
            },
            priority: OrderPriority::from_stored(&order.priority),
            notes: order.notes,
            status: order.status,
            created_at: order.created_at,
        })
    }
}

#[async_trait::async_trait]
impl Command for CreateSupplierOrderCommand {
    type Result = SupplierOrderView;

    #[instrument(skip(self, db_pool, event_sender), fields(supplier_id = %self.supplier_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.execute_inner(db_pool).await;
        match &result {
            Ok(view) => {
                SUPPLIER_ORDERS_CREATED.inc();
                info!(
                    order_id = %view.order_id,
                    requests = view.part_request_ids.len(),
                    total = %view.pricing.total,
                    "supplier order created"
                );
                event_sender
                    .send_or_log(Event::SupplierOrderCreated {
                        order_id: view.order_id.clone(),
                        supplier_id: view.supplier_id.clone(),
                        request_count: view.part_request_ids.len(),
                        total: view.pricing.total,
                    })
                    .await;
                let mut seen = Vec::new();
                for item in &view.items {
                    for assignment in &item.assign_to {
                        if !seen.contains(&assignment.employee_id) {
                            seen.push(assignment.employee_id.clone());
                            event_sender
                                .send_or_log(Event::PartsOrderedForTechnician {
                                    order_id: view.order_id.clone(),
                                    employee_id: assignment.employee_id.clone(),
                                    savings: view.pricing.savings,
                                })
                                .await;
                        }
                    }
                }
            }
            Err(err) => {
                SUPPLIER_ORDER_FAILURES
                    .with_label_values(&[match err {
                        ServiceError::ValidationError(_) => "validation_error",
                        ServiceError::NotFound(_) => "not_found",
                        ServiceError::RequestConflict { .. } => "request_conflict",
                        _ => "internal_error",
                    }])
                    .inc();
            }
        }
        result
    }
}

struct ItemAggregate {
    part_name: String,
    unit_price: Decimal,
    total_quantity: i32,
    assign_to: Vec<AssignmentView>,
}

impl CreateSupplierOrderCommand {
    async fn execute_inner(&self, db_pool: Arc<DbPool>) -> Result<SupplierOrderView, ServiceError> {
        self.validate()
            .map_err(|e| ServiceError::ValidationError(format!("Invalid input: {}", e)))?;
        if let Some(info) = &self.consolidation_info {
            if matches!(info.savings, Some(s) if s < Decimal::ZERO) {
                return Err(ServiceError::ValidationError(
                    "Consolidation savings cannot be negative".to_string(),
                ));
            }
        }

        let db = db_pool.as_ref();
        let supplier = Supplier::find_by_id(&self.supplier_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", self.supplier_id))
            })?;

        // Deduplicate while preserving the caller's batch order.
        let mut request_ids: Vec<String> = Vec::new();
        for id in &self.part_request_ids {
            if !request_ids.contains(id) {
                request_ids.push(id.clone());
            }
        }

        let requests = load_approved_requests(db, &request_ids).await?;
        let lines = PartRequestLine::find()
            .filter(part_request_line::Column::RequestId.is_in(request_ids.clone()))
            .all(db)
            .await?;

        let mut lines_by_request: HashMap<String, Vec<part_request_line::Model>> = HashMap::new();
        for line in lines {
            lines_by_request
                .entry(line.request_id.clone())
                .or_default()
                .push(line);
        }

        let part_ids: Vec<String> = lines_by_request
            .values()
            .flatten()
            .map(|l| l.part_id.clone())
            .collect();
        let parts = catalog::load_parts(db, &part_ids).await?;

        // Merge every request line into one item per distinct part, keeping
        // per-request attribution alongside.
        let mut items: BTreeMap<String, ItemAggregate> = BTreeMap::new();
        let mut requested_total: i64 = 0;
        for request_id in &request_ids {
            let request = &requests[request_id];
            for line in lines_by_request.get(request_id).into_iter().flatten() {
                requested_total += i64::from(line.quantity);
                let part = parts.get(&line.part_id).ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Catalog row for {} vanished mid-check",
                        line.part_id
                    ))
                })?;
                let aggregate = items
                    .entry(line.part_id.clone())
                    .or_insert_with(|| ItemAggregate {
                        part_name: part.name.clone(),
                        unit_price: catalog::normalized_unit_price(part),
                        total_quantity: 0,
                        assign_to: Vec::new(),
                    });
                aggregate.total_quantity += line.quantity;
                aggregate.assign_to.push(AssignmentView {
                    request_id: request_id.clone(),
                    employee_id: request.requested_for.clone(),
                    employee_name: request.requested_for_name.clone(),
                    quantity: line.quantity,
                });
            }
        }
        if items.is_empty() {
            return Err(ServiceError::ValidationError(
                "The selected part requests contain no part lines".to_string(),
            ));
        }

        // Quantity conservation: what technicians asked for must equal what
        // gets ordered, both in the item totals and in the attributions.
        let item_total: i64 = items.values().map(|i| i64::from(i.total_quantity)).sum();
        let assigned_total: i64 = items
            .values()
            .flat_map(|i| &i.assign_to)
            .map(|a| i64::from(a.quantity))
            .sum();
        if requested_total != item_total || requested_total != assigned_total {
            return Err(ServiceError::InternalError(format!(
                "Quantity conservation violated: requested {} aggregated {} assigned {}",
                requested_total, item_total, assigned_total
            )));
        }

        let delivery_addresses =
            self.resolve_addresses(db, &request_ids, &requests).await?;

        let subtotal: Decimal = items
            .values()
            .map(|i| i.unit_price * Decimal::from(i.total_quantity))
            .sum();
        let shipping_cost = if subtotal >= supplier.free_shipping_threshold {
            Decimal::ZERO
        } else {
            FLAT_SHIPPING_FEE * Decimal::from(delivery_addresses.len() as i64)
        };
        let express_charge = match self.priority {
            OrderPriority::Express => EXPRESS_SURCHARGE,
            OrderPriority::Normal => Decimal::ZERO,
        };
        let total = subtotal + shipping_cost + express_charge;
        let savings = self
            .consolidation_info
            .as_ref()
            .and_then(|c| c.savings)
            .unwrap_or(Decimal::ZERO);

        let command = self.clone();
        let ids_for_txn = request_ids.clone();
        let (order, item_rows) = db
            .transaction::<_, (supplier_order::Model, Vec<supplier_order_item::Model>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        persist_order(
                            txn,
                            &command,
                            &ids_for_txn,
                            items,
                            delivery_addresses,
                            subtotal,
                            shipping_cost,
                            express_charge,
                            total,
                            savings,
                        )
                        .await
                    })
                },
            )
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        SupplierOrderView::from_models(order, item_rows)
    }

    async fn resolve_addresses<C: ConnectionTrait>(
        &self,
        conn: &C,
        request_ids: &[String],
        requests: &HashMap<String, part_request::Model>,
    ) -> Result<Vec<DeliveryAddressView>, ServiceError> {
        match self.delivery_method {
            // Express is a legacy alias still sent by older clients; it is
            // addressed exactly like a consolidated shipment.
            DeliveryMethod::Consolidated | DeliveryMethod::Express => {
                let destination = self
                    .consolidation_info
                    .as_ref()
                    .and_then(|c| c.shared_destination.clone())
                    .ok_or_else(|| {
                        ServiceError::ValidationError(
                            "sharedDestination is required for consolidated delivery".to_string(),
                        )
                    })?;
                Ok(vec![DeliveryAddressView {
                    employee_id: None,
                    destination,
                }])
            }
            DeliveryMethod::MultiAddress => {
                let mut employee_ids: Vec<String> = Vec::new();
                for request_id in request_ids {
                    let employee_id = &requests[request_id].requested_for;
                    if !employee_ids.contains(employee_id) {
                        employee_ids.push(employee_id.clone());
                    }
                }
                let employees: HashMap<String, employee::Model> = Employee::find()
                    .filter(employee::Column::Id.is_in(employee_ids.clone()))
                    .all(conn)
                    .await?
                    .into_iter()
                    .map(|e| (e.id.clone(), e))
                    .collect();
                Ok(employee_ids
                    .into_iter()
                    .map(|employee_id| {
                        let destination = employees
                            .get(&employee_id)
                            .and_then(|e| e.delivery_point.clone())
                            .unwrap_or_else(|| DEFAULT_DESTINATION.to_string());
                        DeliveryAddressView {
                            employee_id: Some(employee_id),
                            destination,
                        }
                    })
                    .collect())
            }
        }
    }
}

/// Loads the named requests, failing on unknown ids and on requests that are
/// not sitting in `approved`.
async fn load_approved_requests<C: ConnectionTrait>(
    conn: &C,
    request_ids: &[String],
) -> Result<HashMap<String, part_request::Model>, ServiceError> {
    let rows = PartRequest::find()
        .filter(part_request::Column::RequestId.is_in(request_ids.to_vec()))
        .all(conn)
        .await?;
    let map: HashMap<String, part_request::Model> =
        rows.into_iter().map(|r| (r.request_id.clone(), r)).collect();

    let missing: Vec<String> = request_ids
        .iter()
        .filter(|id| !map.contains_key(*id))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(ServiceError::NotFound(format!(
            "Part request(s) not found: {}",
            missing.join(", ")
        )));
    }

    let offending: Vec<String> = request_ids
        .iter()
        .filter(|id| map[*id].status != PartRequestStatus::Approved)
        .cloned()
        .collect();
    if !offending.is_empty() {
        return Err(ServiceError::RequestConflict {
            message: "Only approved part requests can be ordered".to_string(),
            offending_requests: offending,
        });
    }
    Ok(map)
}

#[allow(clippy::too_many_arguments)]
async fn persist_order<C: ConnectionTrait>(
    txn: &C,
    command: &CreateSupplierOrderCommand,
    request_ids: &[String],
    items: BTreeMap<String, ItemAggregate>,
    delivery_addresses: Vec<DeliveryAddressView>,
    subtotal: Decimal,
    shipping_cost: Decimal,
    express_charge: Decimal,
    total: Decimal,
    savings: Decimal,
) -> Result<(supplier_order::Model, Vec<supplier_order_item::Model>), ServiceError> {
    let now = Utc::now();

    // The status may have moved since the pre-checks; re-verify before the
    // requests are marked ordered.
    let fresh = load_approved_requests(txn, request_ids).await?;

    let order_id = generate_order_id(txn, now).await?;

    let to_json = |ctx: &str, e: serde_json::Error| {
        ServiceError::InternalError(format!("Could not encode {}: {}", ctx, e))
    };
    let order = supplier_order::ActiveModel {
        order_id: Set(order_id.clone()),
        supplier_id: Set(command.supplier_id.clone()),
        created_by: Set(command.created_by.clone()),
        part_request_ids: Set(serde_json::to_value(request_ids)
            .map_err(|e| to_json("part request ids", e))?),
        delivery_method: Set(command.delivery_method),
        delivery_addresses: Set(serde_json::to_value(&delivery_addresses)
            .map_err(|e| to_json("delivery addresses", e))?),
        subtotal: Set(subtotal),
        shipping_cost: Set(shipping_cost),
        express_charge: Set(express_charge),
        total: Set(total),
        savings: Set(savings),
        priority: Set(command.priority.to_string()),
        notes: Set(command.notes.clone()),
        status: Set(SupplierOrderStatus::Pending),
        created_at: Set(now),
    }
    .insert(txn)
    .await?;

    let mut item_rows = Vec::with_capacity(items.len());
    for (part_id, aggregate) in items {
        let row = supplier_order_item::ActiveModel {
            order_id: Set(order_id.clone()),
            part_id: Set(part_id),
            part_name: Set(aggregate.part_name),
            unit_price: Set(aggregate.unit_price),
            total_quantity: Set(aggregate.total_quantity),
            assign_to: Set(serde_json::to_value(&aggregate.assign_to)
                .map_err(|e| to_json("item assignments", e))?),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        item_rows.push(row);
    }

    for request_id in request_ids {
        let siblings: Vec<&String> = request_ids.iter().filter(|id| *id != request_id).collect();
        let request = fresh[request_id].clone();
        let mut active: part_request::ActiveModel = request.into();
        active.status = Set(PartRequestStatus::Ordered);
        active.supplier_order_id = Set(Some(order_id.clone()));
        active.consolidated_with = Set(Some(
            serde_json::to_value(&siblings).map_err(|e| to_json("consolidation siblings", e))?,
        ));
        active.ordered_at = Set(Some(now));
        active.update(txn).await?;
    }

    Ok((order, item_rows))
}

async fn generate_order_id<C: ConnectionTrait>(
    txn: &C,
    now: DateTime<Utc>,
) -> Result<String, ServiceError> {
    for _ in 0..ID_GENERATION_ATTEMPTS {
        let suffix: u32 = { rand::thread_rng().gen_range(0..10_000) };
        let candidate = dated_id("SO", now, suffix);
        if SupplierOrder::find_by_id(&candidate)
            .one(txn)
            .await?
            .is_none()
        {
            return Ok(candidate);
        }
    }
    error!("exhausted supplier order id generation attempts");
    Err(ServiceError::InternalError(
        "Could not allocate a unique order id".to_string(),
    ))
}
