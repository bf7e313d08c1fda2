use crate::{
    commands::partrequests::PartRequestView,
    commands::Command,
    db::DbPool,
    entities::part_request::{self, Entity as PartRequest, PartRequestStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Moves a pending part request to `rejected`, a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RejectPartRequestCommand {
    #[validate(length(min = 1))]
    pub request_id: String,
    #[validate(length(min = 1, max = 500, message = "A rejection reason is required"))]
    pub reason: String,
}

#[async_trait::async_trait]
impl Command for RejectPartRequestCommand {
    type Result = PartRequestView;

    #[instrument(skip(self, db_pool, event_sender), fields(request_id = %self.request_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()
            .map_err(|e| ServiceError::ValidationError(format!("Invalid input: {}", e)))?;

        let db = db_pool.as_ref();
        let request = PartRequest::find_by_id(&self.request_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Part request {} not found", self.request_id))
            })?;
        if request.status != PartRequestStatus::Pending {
            return Err(ServiceError::InvalidStatus(format!(
                "Part request {} is {}; only pending requests can be rejected",
                request.request_id, request.status
            )));
        }

        let employee_id = request.requested_for.clone();
        let lines = request
            .find_related(crate::entities::part_request_line::Entity)
            .all(db)
            .await?;

        let mut active: part_request::ActiveModel = request.into();
        active.status = Set(PartRequestStatus::Rejected);
        active.rejection_reason = Set(Some(self.reason.clone()));
        active.rejected_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        info!(request_id = %updated.request_id, "part request rejected");
        event_sender
            .send_or_log(Event::PartRequestRejected {
                request_id: updated.request_id.clone(),
                employee_id,
                reason: self.reason.clone(),
            })
            .await;

        Ok(PartRequestView::from_models(updated, lines))
    }
}
