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

/// Moves a pending part request to `approved`, making it eligible for
/// consolidation into a supplier order.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApprovePartRequestCommand {
    #[validate(length(min = 1))]
    pub request_id: String,
}

#[async_trait::async_trait]
impl Command for ApprovePartRequestCommand {
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
                "Part request {} is {}; only pending requests can be approved",
                request.request_id, request.status
            )));
        }

        let employee_id = request.requested_for.clone();
        let lines = request
            .find_related(crate::entities::part_request_line::Entity)
            .all(db)
            .await?;

        let mut active: part_request::ActiveModel = request.into();
        active.status = Set(PartRequestStatus::Approved);
        active.approved_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        info!(request_id = %updated.request_id, "part request approved");
        event_sender
            .send_or_log(Event::PartRequestApproved {
                request_id: updated.request_id.clone(),
                employee_id,
            })
            .await;

        Ok(PartRequestView::from_models(updated, lines))
    }
}
