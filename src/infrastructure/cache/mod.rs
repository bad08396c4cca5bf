pub mod cache_keys;
pub mod in_memory;

use crate::core::errors::DongipError;
use crate::core::models::balance::CurrencyBalance;
use async_trait::async_trait;
use std::time::Duration;

/// Read-through cache for the per-user balance summary.
///
/// Every invalidation bumps the user's generation. Callers read the
/// generation before computing a summary and pass it back on save; a save
/// whose generation is no longer current is dropped, so a summary computed
/// before a dong changed can never outlive the invalidation.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get_user_balances(&self, user_id: &str) -> Result<Option<Vec<CurrencyBalance>>, DongipError>;
    async fn balances_generation(&self, user_id: &str) -> Result<u64, DongipError>;
    /// Returns whether the summary was stored.
    async fn save_user_balances(
        &self,
        user_id: &str,
        generation: u64,
        balances: &[CurrencyBalance],
        ttl: Duration,
    ) -> Result<bool, DongipError>;
    async fn invalidate_user_balances(&self, user_id: &str) -> Result<(), DongipError>;
}
