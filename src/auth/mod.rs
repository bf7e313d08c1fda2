use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::entities::{
    employee::Entity as Employee, employee_session::Entity as EmployeeSession,
    technician_session::Entity as TechnicianSession,
};
use crate::errors::ErrorResponse;
use crate::AppState;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization token")]
    MissingToken,
    #[error("Invalid authorization token")]
    InvalidToken,
    #[error("Authorization token expired")]
    ExpiredToken,
    #[error("Authentication backend error: {0}")]
    Internal(#[from] sea_orm::error::DbErr),
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Internal(e) => {
                tracing::error!(error = %e, "authentication lookup failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        };
        (status, Json(body)).into_response()
    }
}

/// Identity resolved from a bearer token. Tokens live in two session stores
/// (technician app and office app); the technician store is consulted first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub employee_id: String,
    pub name: String,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn is_logistics(&self) -> bool {
        self.role == "logistics"
    }
}

pub async fn authenticate(db: &DbPool, token: &str) -> Result<AuthenticatedUser, AuthError> {
    let session = match TechnicianSession::find_by_id(token).one(db).await? {
        Some(s) => (s.employee_id, s.expires_at),
        None => {
            let s = EmployeeSession::find_by_id(token)
                .one(db)
                .await?
                .ok_or(AuthError::InvalidToken)?;
            (s.employee_id, s.expires_at)
        }
    };
    let (employee_id, expires_at) = session;
    if expires_at <= Utc::now() {
        return Err(AuthError::ExpiredToken);
    }

    let employee = Employee::find_by_id(&employee_id)
        .one(db)
        .await?
        .ok_or(AuthError::InvalidToken)?;
    Ok(AuthenticatedUser {
        employee_id: employee.id,
        name: employee.name,
        role: employee.role,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let state = AppState::from_ref(state);
        authenticate(state.db.as_ref(), token).await
    }
}
