use crate::{db::DbPool, errors::ServiceError, events::EventSender};
use async_trait::async_trait;
use std::sync::Arc;

/// Command trait for implementing the Command Pattern
///
/// This trait allows for encapsulating all the logic needed to execute a business operation
/// into a single object that can be validated, executed, and produce events.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command with the given dependencies
    ///
    /// # Arguments
    /// * `db_pool` - Database connection pool for persistence operations
    /// * `event_sender` - Channel to publish domain events
    ///
    /// # Returns
    /// * `Result<Self::Result, ServiceError>` - The result of command execution or an error
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

pub mod inventory;
pub mod partrequests;
pub mod procurement;

/// Formats a dated business identifier such as `PU-2026-08-23-0042`.
/// Suffixes are random four-digit numbers; callers retry on collision
/// inside the surrounding transaction.
pub fn dated_id(prefix: &str, date: chrono::DateTime<chrono::Utc>, suffix: u32) -> String {
    format!("{}-{}-{:04}", prefix, date.format("%Y-%m-%d"), suffix)
}

/// Attempts before an id generator gives up on collisions.
pub const ID_GENERATION_ATTEMPTS: u32 = 8;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn dated_id_zero_pads_the_suffix() {
        let date = chrono::Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        assert_eq!(dated_id("PU", date, 7), "PU-2026-08-23-0007");
        assert_eq!(dated_id("SO", date, 9814), "SO-2026-08-23-9814");
    }
}
