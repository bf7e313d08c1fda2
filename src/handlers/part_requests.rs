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
use crate::commands::partrequests::{
    submit_part_request_command::RequestedLine, ApprovePartRequestCommand,
    RejectPartRequestCommand, SubmitPartRequestCommand,
};
use crate::entities::part_request::PartRequestStatus;
use crate::errors::{ApiError, ServiceError};
use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input,
};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPartRequestRequest {
    /// Defaults to the caller when omitted.
    pub requested_for: Option<String>,
    #[validate(length(min = 1, message = "At least one part line is required"))]
    pub parts: Vec<RequestedLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectPartRequestRequest {
    #[validate(length(min = 1, max = 500, message = "A rejection reason is required"))]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartRequestFilter {
    pub status: Option<String>,
    pub employee_id: Option<String>,
}

fn parse_status(status: &str) -> Result<PartRequestStatus, ApiError> {
    match status.to_ascii_lowercase().as_str() {
        "pending" => Ok(PartRequestStatus::Pending),
        "approved" => Ok(PartRequestStatus::Approved),
        "rejected" => Ok(PartRequestStatus::Rejected),
        "ordered" => Ok(PartRequestStatus::Ordered),
        "delivered" => Ok(PartRequestStatus::Delivered),
        other => Err(ApiError::BadRequest(format!(
            "Unknown part request status: {}",
            other
        ))),
    }
}

/// Open a pending part request.
#[utoipa::path(
    post,
    path = "/api/v1/part-requests",
    request_body = SubmitPartRequestRequest,
    responses(
        (status = 201, description = "Part request submitted"),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Unknown employee or part"),
    ),
    security(("bearer_auth" = [])),
    tag = "part-requests"
)]
pub async fn submit_part_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<SubmitPartRequestRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    let requested_for = payload
        .requested_for
        .unwrap_or_else(|| user.employee_id.clone());
    if requested_for != user.employee_id && !user.is_logistics() {
        return Err(ApiError::ServiceError(ServiceError::Forbidden(
            "Cannot submit a part request for another technician".to_string(),
        )));
    }

    let view = state
        .services
        .procurement
        .submit_part_request(SubmitPartRequestCommand {
            requested_for,
            parts: payload.parts,
        })
        .await
        .map_err(map_service_error)?;
    Ok(created_response(view))
}

/// List part requests, optionally filtered by status and technician.
#[utoipa::path(
    get,
    path = "/api/v1/part-requests",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("employeeId" = Option<String>, Query, description = "Filter by technician"),
    ),
    responses((status = 200, description = "Part requests")),
    security(("bearer_auth" = [])),
    tag = "part-requests"
)]
pub async fn list_part_requests(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<PartRequestFilter>,
) -> Result<Response, ApiError> {
    let status = filter.status.as_deref().map(parse_status).transpose()?;
    // Technicians only see their own requests; logistics sees everything.
    let employee_id = if user.is_logistics() {
        filter.employee_id
    } else {
        Some(user.employee_id.clone())
    };
    let views = state
        .services
        .procurement
        .list_part_requests(status, employee_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(views))
}

/// Fetch one part request.
#[utoipa::path(
    get,
    path = "/api/v1/part-requests/{id}",
    params(("id" = String, Path, description = "Part request id")),
    responses(
        (status = 200, description = "Part request"),
        (status = 404, description = "Unknown part request"),
    ),
    security(("bearer_auth" = [])),
    tag = "part-requests"
)]
pub async fn get_part_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(request_id): Path<String>,
) -> Result<Response, ApiError> {
    let view = state
        .services
        .procurement
        .get_part_request(&request_id)
        .await
        .map_err(map_service_error)?;
    if view.requested_for != user.employee_id && !user.is_logistics() {
        return Err(ApiError::ServiceError(ServiceError::Forbidden(
            "Cannot view another technician's part request".to_string(),
        )));
    }
    Ok(success_response(view))
}

/// Approve a pending part request.
#[utoipa::path(
    post,
    path = "/api/v1/part-requests/{id}/approve",
    params(("id" = String, Path, description = "Part request id")),
    responses(
        (status = 200, description = "Part request approved"),
        (status = 400, description = "Request is not pending"),
        (status = 403, description = "Caller is not logistics"),
        (status = 404, description = "Unknown part request"),
    ),
    security(("bearer_auth" = [])),
    tag = "part-requests"
)]
pub async fn approve_part_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(request_id): Path<String>,
) -> Result<Response, ApiError> {
    require_logistics(&user)?;
    let view = state
        .services
        .procurement
        .approve_part_request(ApprovePartRequestCommand { request_id })
        .await
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Reject a pending part request with a reason.
#[utoipa::path(
    post,
    path = "/api/v1/part-requests/{id}/reject",
    params(("id" = String, Path, description = "Part request id")),
    request_body = RejectPartRequestRequest,
    responses(
        (status = 200, description = "Part request rejected"),
        (status = 400, description = "Request is not pending or reason missing"),
        (status = 403, description = "Caller is not logistics"),
        (status = 404, description = "Unknown part request"),
    ),
    security(("bearer_auth" = [])),
    tag = "part-requests"
)]
pub async fn reject_part_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(request_id): Path<String>,
    Json(payload): Json<RejectPartRequestRequest>,
) -> Result<Response, ApiError> {
    require_logistics(&user)?;
    validate_input(&payload)?;
    let view = state
        .services
        .procurement
        .reject_part_request(RejectPartRequestCommand {
            request_id,
            reason: payload.reason,
        })
        .await
        .map_err(map_service_error)?;
    Ok(success_response(view))
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
        .route("/", post(submit_part_request).get(list_part_requests))
        .route("/:id", get(get_part_request))
        .route("/:id/approve", post(approve_part_request))
        .route("/:id/reject", post(reject_part_request))
}
