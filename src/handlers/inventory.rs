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
use crate::commands::inventory::use_parts_command::{RequestedPart, UsageRecordView};
use crate::commands::inventory::UsePartsCommand;
use crate::errors::{ApiError, ServiceError};
use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::services::inventory::InventoryView;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsePartsRequest {
    #[validate(length(min = 1))]
    pub employee_id: String,
    /// The service order the parts were installed on.
    #[validate(length(min = 1))]
    pub order_id: String,
    #[validate(length(min = 1, message = "At least one part line is required"))]
    pub parts: Vec<RequestedPart>,
    #[serde(default)]
    pub add_to_invoice: bool,
    pub invoice_id: Option<String>,
    pub customer_info: Option<serde_json::Value>,
    pub warranty_months: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsePartsResponse {
    pub usage: UsageRecordView,
    pub inventory: InventoryView,
    pub low_stock_alert: bool,
    pub out_of_stock_parts: Vec<String>,
    pub message: String,
}

/// Record parts consumed on a job against the caller's personal stock.
#[utoipa::path(
    post,
    path = "/api/v1/inventory/personal/use",
    request_body = UsePartsRequest,
    responses(
        (status = 201, description = "Usage recorded", body = UsePartsResponse),
        (status = 400, description = "Validation failure or insufficient stock"),
        (status = 403, description = "Recording usage for another technician"),
        (status = 404, description = "Unknown employee or part"),
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn use_parts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<UsePartsRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    if user.employee_id != payload.employee_id && !user.is_logistics() {
        return Err(ApiError::ServiceError(ServiceError::Forbidden(
            "Cannot record usage for another technician".to_string(),
        )));
    }

    let command = UsePartsCommand {
        employee_id: payload.employee_id,
        order_id: payload.order_id,
        parts: payload.parts,
        add_to_invoice: payload.add_to_invoice,
        invoice_id: payload.invoice_id,
        customer_info: payload.customer_info,
        warranty_months: payload.warranty_months,
    };
    let result = state
        .services
        .inventory
        .use_parts(command)
        .await
        .map_err(map_service_error)?;

    let message = if result.out_of_stock_parts.is_empty() {
        "Parts usage recorded".to_string()
    } else {
        format!(
            "Parts usage recorded; {} part(s) now out of stock",
            result.out_of_stock_parts.len()
        )
    };
    Ok(created_response(UsePartsResponse {
        low_stock_alert: !result.out_of_stock_parts.is_empty(),
        usage: result.usage,
        inventory: result.inventory,
        out_of_stock_parts: result.out_of_stock_parts,
        message,
    }))
}

/// Current inventory snapshot for one technician.
#[utoipa::path(
    get,
    path = "/api/v1/inventory/personal/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Inventory snapshot", body = InventoryView),
        (status = 404, description = "Unknown employee"),
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn get_personal_inventory(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(employee_id): Path<String>,
) -> Result<Response, ApiError> {
    if user.employee_id != employee_id && !user.is_logistics() {
        return Err(ApiError::ServiceError(ServiceError::Forbidden(
            "Cannot view another technician's inventory".to_string(),
        )));
    }
    let view = state
        .services
        .inventory
        .get_inventory(&employee_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Usage ledger for one technician, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/inventory/personal/{employee_id}/usage",
    params(
        ("employee_id" = String, Path, description = "Employee id"),
        PaginationParams,
    ),
    responses(
        (status = 200, description = "Usage records"),
        (status = 404, description = "Unknown employee"),
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn list_usage(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(employee_id): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    if user.employee_id != employee_id && !user.is_logistics() {
        return Err(ApiError::ServiceError(ServiceError::Forbidden(
            "Cannot view another technician's usage history".to_string(),
        )));
    }
    let (page, per_page) = (pagination.page(), pagination.per_page());
    let (records, total) = state
        .services
        .inventory
        .list_usage(&employee_id, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        records, page, per_page, total,
    )))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/use", post(use_parts))
        .route("/:employee_id", get(get_personal_inventory))
        .route("/:employee_id/usage", get(list_usage))
}
