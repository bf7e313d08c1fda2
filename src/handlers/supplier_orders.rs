use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::commands::procurement::{
    ConsolidationInfo, CreateSupplierOrderCommand, OrderPriority, SupplierOrderView,
};
use crate::entities::supplier_order::{DeliveryMethod, SupplierOrderStatus};
use crate::errors::{ApiError, ServiceError};
use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input,
};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplierOrderRequest {
    #[validate(length(min = 1))]
    pub supplier_id: String,
    #[validate(length(min = 1, message = "At least one part request is required"))]
    pub part_request_ids: Vec<String>,
    pub delivery_method: DeliveryMethod,
    pub priority: Option<OrderPriority>,
    pub consolidation_info: Option<ConsolidationInfo>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplierOrderResponse {
    pub order: SupplierOrderView,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SupplierOrderFilter {
    pub status: Option<String>,
}

fn parse_status(status: &str) -> Result<SupplierOrderStatus, ApiError> {
    match status.to_ascii_lowercase().as_str() {
        "pending" => Ok(SupplierOrderStatus::Pending),
        "confirmed" => Ok(SupplierOrderStatus::Confirmed),
        "shipped" => Ok(SupplierOrderStatus::Shipped),
        "delivered" => Ok(SupplierOrderStatus::Delivered),
        other => Err(ApiError::BadRequest(format!(
            "Unknown supplier order status: {}",
            other
        ))),
    }
}

/// Consolidate approved part requests into one supplier order.
#[utoipa::path(
    post,
    path = "/api/v1/supplier-orders",
    request_body = CreateSupplierOrderRequest,
    responses(
        (status = 201, description = "Supplier order created", body = CreateSupplierOrderResponse),
        (status = 400, description = "Validation failure or non-approved requests"),
        (status = 403, description = "Caller is not logistics"),
        (status = 404, description = "Unknown supplier or part request"),
    ),
    security(("bearer_auth" = [])),
    tag = "supplier-orders"
)]
pub async fn create_supplier_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateSupplierOrderRequest>,
) -> Result<Response, ApiError> {
    require_logistics(&user)?;
    validate_input(&payload)?;

    let command = CreateSupplierOrderCommand {
        supplier_id: payload.supplier_id,
        created_by: user.employee_id.clone(),
        part_request_ids: payload.part_request_ids,
        delivery_method: payload.delivery_method,
        priority: payload.priority.unwrap_or_default(),
        consolidation_info: payload.consolidation_info,
        notes: payload.notes,
    };
    let order = state
        .services
        .procurement
        .create_supplier_order(command)
        .await
        .map_err(map_service_error)?;

    let message = format!(
        "Supplier order {} created from {} part request(s)",
        order.order_id,
        order.part_request_ids.len()
    );
    Ok(created_response(CreateSupplierOrderResponse {
        order,
        message,
    }))
}

/// Fetch one supplier order with its consolidated items.
#[utoipa::path(
    get,
    path = "/api/v1/supplier-orders/{id}",
    params(("id" = String, Path, description = "Supplier order id")),
    responses(
        (status = 200, description = "Supplier order", body = SupplierOrderView),
        (status = 404, description = "Unknown supplier order"),
    ),
    security(("bearer_auth" = [])),
    tag = "supplier-orders"
)]
pub async fn get_supplier_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<String>,
) -> Result<Response, ApiError> {
    require_logistics(&user)?;
    let view = state
        .services
        .procurement
        .get_supplier_order(&order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// List supplier orders, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/api/v1/supplier-orders",
    params(("status" = Option<String>, Query, description = "Filter by status")),
    responses((status = 200, description = "Supplier orders")),
    security(("bearer_auth" = [])),
    tag = "supplier-orders"
)]
pub async fn list_supplier_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<SupplierOrderFilter>,
) -> Result<Response, ApiError> {
    require_logistics(&user)?;
    let status = filter.status.as_deref().map(parse_status).transpose()?;
    let views = state
        .services
        .procurement
        .list_supplier_orders(status)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(views))
}

fn require_logistics(user: &AuthenticatedUser) -> Result<(), ApiError> {
    if user.is_logistics() {
        Ok(())
    } else {
        Err(ApiError::ServiceError(ServiceError::Forbidden(
            "Requires the logistics role".to_string(),
        )))
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_supplier_order).get(list_supplier_orders))
        .route("/:id", get(get_supplier_order))
}
