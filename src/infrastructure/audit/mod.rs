pub mod in_memory;

use crate::core::errors::DongipError;
use crate::core::models::audit::AppLog;
use async_trait::async_trait;

/// Append-only record of business actions, readable per user.
#[async_trait]
pub trait AuditTrail: Send + Sync {
    async fn record(&self, entry: AppLog) -> Result<(), DongipError>;
    /// Entries attributed to `user_id`, oldest first.
    async fn entries_for(&self, user_id: &str) -> Result<Vec<AppLog>, DongipError>;
}
