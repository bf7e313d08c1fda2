use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};

use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, success_response};
use crate::services::catalog::PartView;
use crate::AppState;

/// Fetch one catalog part with its normalized price.
#[utoipa::path(
    get,
    path = "/api/v1/parts/{id}",
    params(("id" = String, Path, description = "Part id")),
    responses(
        (status = 200, description = "Catalog part", body = PartView),
        (status = 404, description = "Unknown part"),
    ),
    security(("bearer_auth" = [])),
    tag = "parts"
)]
pub async fn get_part(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(part_id): Path<String>,
) -> Result<Response, ApiError> {
    let view = state
        .services
        .catalog
        .get_part(&part_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/:id", get(get_part))
}
