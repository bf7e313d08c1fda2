pub mod common;
pub mod inventory;
pub mod part_requests;
pub mod parts;
pub mod supplier_orders;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    catalog::PartCatalogService, inventory::InventoryService, notifications::NotificationService,
    procurement::ProcurementService,
};
use crate::sync::AggregateLocks;

/// Service container shared through application state.
#[derive(Clone)]
pub struct AppServices {
    pub inventory: Arc<InventoryService>,
    pub procurement: Arc<ProcurementService>,
    pub catalog: Arc<PartCatalogService>,
    pub notifications: Arc<NotificationService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, locks: Arc<AggregateLocks>) -> Self {
        Self {
            inventory: Arc::new(InventoryService::new(
                db.clone(),
                event_sender.clone(),
                locks.clone(),
            )),
            procurement: Arc::new(ProcurementService::new(
                db.clone(),
                event_sender.clone(),
                locks,
            )),
            catalog: Arc::new(PartCatalogService::new(db.clone())),
            notifications: Arc::new(NotificationService::new(db)),
        }
    }
}
