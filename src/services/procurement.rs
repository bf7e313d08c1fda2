use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use crate::commands::partrequests::{
    ApprovePartRequestCommand, PartRequestView, RejectPartRequestCommand, SubmitPartRequestCommand,
};
use crate::commands::procurement::{CreateSupplierOrderCommand, SupplierOrderView};
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::{
    part_request::{self, Entity as PartRequest, PartRequestStatus},
    part_request_line::{self, Entity as PartRequestLine},
    supplier_order::{self, Entity as SupplierOrder, SupplierOrderStatus},
    supplier_order_item::{self, Entity as SupplierOrderItem},
};
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::sync::AggregateLocks;

/// Orchestrates the part-request lifecycle and supplier-order consolidation.
/// Writes touching a set of part requests take those requests' aggregate
/// locks in sorted order before executing.
pub struct ProcurementService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    locks: Arc<AggregateLocks>,
}

impl ProcurementService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, locks: Arc<AggregateLocks>) -> Self {
        Self {
            db,
            event_sender,
            locks,
        }
    }

    #[instrument(skip(self, command), fields(supplier_id = %command.supplier_id))]
    pub async fn create_supplier_order(
        &self,
        command: CreateSupplierOrderCommand,
    ) -> Result<SupplierOrderView, ServiceError> {
        let _guards = self.locks.acquire_many(&command.part_request_ids).await;
        command
            .execute(self.db.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_supplier_order(
        &self,
        order_id: &str,
    ) -> Result<SupplierOrderView, ServiceError> {
        let db = self.db.as_ref();
        let order = SupplierOrder::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier order {} not found", order_id))
            })?;
        let items = order
            .find_related(SupplierOrderItem)
            .order_by_asc(supplier_order_item::Column::PartId)
            .all(db)
            .await?;
        SupplierOrderView::from_models(order, items)
    }

    #[instrument(skip(self))]
    pub async fn list_supplier_orders(
        &self,
        status: Option<SupplierOrderStatus>,
    ) -> Result<Vec<SupplierOrderView>, ServiceError> {
        let db = self.db.as_ref();
        let mut query = SupplierOrder::find().order_by_desc(supplier_order::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(supplier_order::Column::Status.eq(status));
        }
        let orders = query.all(db).await?;

        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            let items = order
                .find_related(SupplierOrderItem)
                .order_by_asc(supplier_order_item::Column::PartId)
                .all(db)
                .await?;
            views.push(SupplierOrderView::from_models(order, items)?);
        }
        Ok(views)
    }

    #[instrument(skip(self, command), fields(requested_for = %command.requested_for))]
    pub async fn submit_part_request(
        &self,
        command: SubmitPartRequestCommand,
    ) -> Result<PartRequestView, ServiceError> {
        command
            .execute(self.db.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command), fields(request_id = %command.request_id))]
    pub async fn approve_part_request(
        &self,
        command: ApprovePartRequestCommand,
    ) -> Result<PartRequestView, ServiceError> {
        let _guard = self.locks.acquire(&command.request_id).await;
        command
            .execute(self.db.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command), fields(request_id = %command.request_id))]
    pub async fn reject_part_request(
        &self,
        command: RejectPartRequestCommand,
    ) -> Result<PartRequestView, ServiceError> {
        let _guard = self.locks.acquire(&command.request_id).await;
        command
            .execute(self.db.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_part_request(&self, request_id: &str) -> Result<PartRequestView, ServiceError> {
        let db = self.db.as_ref();
        let request = PartRequest::find_by_id(request_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Part request {} not found", request_id))
            })?;
        let lines = request.find_related(PartRequestLine).all(db).await?;
        Ok(PartRequestView::from_models(request, lines))
    }

    #[instrument(skip(self))]
    pub async fn list_part_requests(
        &self,
        status: Option<PartRequestStatus>,
        employee_id: Option<String>,
    ) -> Result<Vec<PartRequestView>, ServiceError> {
        let db = self.db.as_ref();
        let mut query = PartRequest::find().order_by_desc(part_request::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(part_request::Column::Status.eq(status));
        }
        if let Some(employee_id) = employee_id {
            query = query.filter(part_request::Column::RequestedFor.eq(employee_id));
        }
        let requests = query.all(db).await?;

        let request_ids: Vec<String> = requests.iter().map(|r| r.request_id.clone()).collect();
        let mut lines_by_request: HashMap<String, Vec<part_request_line::Model>> = HashMap::new();
        if !request_ids.is_empty() {
            let lines = PartRequestLine::find()
                .filter(part_request_line::Column::RequestId.is_in(request_ids))
                .all(db)
                .await?;
            for line in lines {
                lines_by_request
                    .entry(line.request_id.clone())
                    .or_default()
                    .push(line);
            }
        }

        Ok(requests
            .into_iter()
            .map(|request| {
                let lines = lines_by_request
                    .remove(&request.request_id)
                    .unwrap_or_default();
                PartRequestView::from_models(request, lines)
            })
            .collect())
    }
}
