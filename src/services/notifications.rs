use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::notification;

/// Persists notifications for the display layer. Delivery is best-effort by
/// contract: a failed insert is logged and swallowed, never propagated into
/// the operation that triggered it.
pub struct NotificationService {
    db: Arc<DbPool>,
}

impl NotificationService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Stores one notification. `target` of `None` addresses the logistics
    /// role rather than a specific employee.
    pub async fn send(
        &self,
        title: &str,
        message: &str,
        kind: &str,
        link: Option<String>,
        target: Option<String>,
    ) {
        let model = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(target.clone()),
            title: Set(title.to_string()),
            message: Set(message.to_string()),
            kind: Set(kind.to_string()),
            link: Set(link),
            read: Set(false),
            created_at: Set(Utc::now()),
        };
        match model.insert(self.db.as_ref()).await {
            Ok(_) => debug!(kind, target = ?target, "notification stored"),
            Err(e) => warn!(kind, error = %e, "failed to store notification"),
        }
    }
}
