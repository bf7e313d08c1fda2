use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::commands::inventory::use_parts_command::UsageRecordView;
use crate::commands::inventory::{UsePartsCommand, UsePartsResult};
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::{
    employee::Entity as Employee,
    personal_inventory_entry::{self, Entity as PersonalInventoryEntry},
    usage_line::{self, Entity as UsageLine},
    usage_record::{self, Entity as UsageRecord},
};
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::services::catalog;
use crate::sync::AggregateLocks;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntryView {
    pub part_id: String,
    pub part_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub last_used: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

/// Aggregates derived from the stock rows at read time. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStatistics {
    pub total_parts: i64,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryView {
    pub employee_id: String,
    pub entries: Vec<InventoryEntryView>,
    pub statistics: InventoryStatistics,
}

/// Builds the current inventory snapshot for one technician. Works on any
/// connection so commands can produce the post-write snapshot inside their
/// transaction.
pub async fn build_inventory_view<C: ConnectionTrait>(
    conn: &C,
    employee_id: &str,
) -> Result<InventoryView, ServiceError> {
    let rows = PersonalInventoryEntry::find()
        .filter(personal_inventory_entry::Column::EmployeeId.eq(employee_id))
        .order_by_asc(personal_inventory_entry::Column::PartId)
        .all(conn)
        .await?;

    let part_ids: Vec<String> = rows.iter().map(|r| r.part_id.clone()).collect();
    let parts = catalog::load_parts(conn, &part_ids).await?;

    let mut entries = Vec::with_capacity(rows.len());
    let mut total_parts: i64 = 0;
    let mut total_value = Decimal::ZERO;
    for row in rows {
        let part = parts.get(&row.part_id).ok_or_else(|| {
            ServiceError::InternalError(format!("Catalog row for {} missing", row.part_id))
        })?;
        let unit_price = catalog::normalized_unit_price(part);
        total_parts += i64::from(row.quantity);
        total_value += unit_price * Decimal::from(row.quantity);
        entries.push(InventoryEntryView {
            part_id: row.part_id,
            part_name: part.name.clone(),
            quantity: row.quantity,
            unit_price,
            last_used: row.last_used,
            location: row.location,
        });
    }

    Ok(InventoryView {
        employee_id: employee_id.to_string(),
        entries,
        statistics: InventoryStatistics {
            total_parts,
            total_value,
        },
    })
}

/// Orchestrates personal inventory consumption and reads. All writes to one
/// technician's stock are funneled through that technician's aggregate lock.
pub struct InventoryService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    locks: Arc<AggregateLocks>,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, locks: Arc<AggregateLocks>) -> Self {
        Self {
            db,
            event_sender,
            locks,
        }
    }

    #[instrument(skip(self, command), fields(employee_id = %command.employee_id))]
    pub async fn use_parts(&self, command: UsePartsCommand) -> Result<UsePartsResult, ServiceError> {
        let _guard = self.locks.acquire(&command.employee_id).await;
        command
            .execute(self.db.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_inventory(&self, employee_id: &str) -> Result<InventoryView, ServiceError> {
        let db = self.db.as_ref();
        Employee::find_by_id(employee_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", employee_id)))?;
        build_inventory_view(db, employee_id).await
    }

    /// Pages through a technician's usage ledger, newest first.
    #[instrument(skip(self))]
    pub async fn list_usage(
        &self,
        employee_id: &str,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<UsageRecordView>, u64), ServiceError> {
        let db = self.db.as_ref();
        Employee::find_by_id(employee_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", employee_id)))?;

        // The paginator asserts on a zero page size; never let one through.
        let paginator = UsageRecord::find()
            .filter(usage_record::Column::EmployeeId.eq(employee_id))
            .order_by_desc(usage_record::Column::UsageDate)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await?;
        let records = paginator.fetch_page(page.saturating_sub(1)).await?;

        let usage_ids: Vec<String> = records.iter().map(|r| r.usage_id.clone()).collect();
        let mut lines_by_usage: HashMap<String, Vec<usage_line::Model>> = HashMap::new();
        if !usage_ids.is_empty() {
            let lines = UsageLine::find()
                .filter(usage_line::Column::UsageId.is_in(usage_ids))
                .all(db)
                .await?;
            for line in lines {
                lines_by_usage
                    .entry(line.usage_id.clone())
                    .or_default()
                    .push(line);
            }
        }

        let views = records
            .into_iter()
            .map(|record| {
                let lines = lines_by_usage.remove(&record.usage_id).unwrap_or_default();
                UsageRecordView::from_models(record, lines)
            })
            .collect();
        Ok((views, total))
    }
}
