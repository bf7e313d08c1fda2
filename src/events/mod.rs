use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::services::notifications::NotificationService;

/// Domain events emitted after successful state transitions. Consumers are
/// strictly best-effort: losing an event never unwinds the transition that
/// produced it.
#[derive(Debug, Clone)]
pub enum Event {
    PartsUsed {
        usage_id: String,
        employee_id: String,
        order_id: String,
        total_value: Decimal,
    },
    PartExhausted {
        employee_id: String,
        employee_name: String,
        part_id: String,
        part_name: String,
    },
    PartRequestSubmitted {
        request_id: String,
        employee_id: String,
        employee_name: String,
    },
    PartRequestApproved {
        request_id: String,
        employee_id: String,
    },
    PartRequestRejected {
        request_id: String,
        employee_id: String,
        reason: String,
    },
    SupplierOrderCreated {
        order_id: String,
        supplier_id: String,
        request_count: usize,
        total: Decimal,
    },
    PartsOrderedForTechnician {
        order_id: String,
        employee_id: String,
        savings: Decimal,
    },
}

#[derive(Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("failed to queue event: {}", e))
    }

    /// Queues an event, logging instead of propagating on failure. Used by
    /// commands whose outcome must not depend on the notification channel.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("dropping event: {}", e);
        }
    }
}

/// Drains the event channel, translating each event into notifications.
/// Runs as a background task for the lifetime of the server.
pub async fn process_events(
    mut receiver: mpsc::Receiver<Event>,
    notifications: Option<Arc<NotificationService>>,
) {
    info!("event processor started");
    while let Some(event) = receiver.recv().await {
        debug!("processing event: {:?}", event);
        if let Some(notifier) = &notifications {
            dispatch_notifications(notifier, &event).await;
        }
    }
    info!("event processor stopped");
}

async fn dispatch_notifications(notifier: &NotificationService, event: &Event) {
    match event {
        Event::PartsUsed {
            usage_id,
            employee_id,
            order_id,
            total_value,
        } => {
            debug!(
                usage_id,
                employee_id,
                order_id,
                %total_value,
                "usage recorded"
            );
        }
        Event::PartExhausted {
            employee_id,
            employee_name,
            part_id,
            part_name,
        } => {
            notifier
                .send(
                    "Personal stock exhausted",
                    &format!(
                        "{} ({}) has run out of {} ({})",
                        employee_name, employee_id, part_name, part_id
                    ),
                    "low_stock",
                    Some(format!("/inventory/personal/{}", employee_id)),
                    None,
                )
                .await;
        }
        Event::PartRequestSubmitted {
            request_id,
            employee_id,
            employee_name,
        } => {
            notifier
                .send(
                    "New part request",
                    &format!(
                        "{} ({}) submitted part request {}",
                        employee_name, employee_id, request_id
                    ),
                    "part_request",
                    Some(format!("/part-requests/{}", request_id)),
                    None,
                )
                .await;
        }
        Event::PartRequestApproved {
            request_id,
            employee_id,
        } => {
            notifier
                .send(
                    "Part request approved",
                    &format!("Your part request {} has been approved", request_id),
                    "part_request",
                    Some(format!("/part-requests/{}", request_id)),
                    Some(employee_id.clone()),
                )
                .await;
        }
        Event::PartRequestRejected {
            request_id,
            employee_id,
            reason,
        } => {
            notifier
                .send(
                    "Part request rejected",
                    &format!("Your part request {} was rejected: {}", request_id, reason),
                    "part_request",
                    Some(format!("/part-requests/{}", request_id)),
                    Some(employee_id.clone()),
                )
                .await;
        }
        Event::SupplierOrderCreated {
            order_id,
            supplier_id,
            request_count,
            total,
        } => {
            notifier
                .send(
                    "Supplier order placed",
                    &format!(
                        "Order {} sent to supplier {} consolidating {} request(s), total {}",
                        order_id, supplier_id, request_count, total
                    ),
                    "supplier_order",
                    Some(format!("/supplier-orders/{}", order_id)),
                    None,
                )
                .await;
        }
        Event::PartsOrderedForTechnician {
            order_id,
            employee_id,
            savings,
        } => {
            let message = if savings.is_zero() {
                format!("Your requested parts are on order {}", order_id)
            } else {
                format!(
                    "Your requested parts are on order {} (consolidation saved {})",
                    order_id, savings
                )
            };
            notifier
                .send(
                    "Parts ordered",
                    &message,
                    "supplier_order",
                    Some(format!("/supplier-orders/{}", order_id)),
                    Some(employee_id.clone()),
                )
                .await;
        }
    }
}
