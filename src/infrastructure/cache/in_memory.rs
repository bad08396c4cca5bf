use crate::core::errors::DongipError;
use crate::core::models::balance::CurrencyBalance;
use crate::infrastructure::cache::Cache;
use crate::infrastructure::cache::cache_keys::user_balances_key;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Default)]
struct Entries {
    balances: HashMap<String, (Vec<CurrencyBalance>, DateTime<Utc>)>,
    generations: HashMap<String, u64>,
}

#[derive(Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<RwLock<Entries>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_user_balances(&self, user_id: &str) -> Result<Option<Vec<CurrencyBalance>>, DongipError> {
        let entries = self.entries.read().await;
        Ok(entries
            .balances
            .get(&user_balances_key(user_id))
            .filter(|(_, expiry)| *expiry > Utc::now())
            .map(|(balances, _)| balances.clone()))
    }

    async fn balances_generation(&self, user_id: &str) -> Result<u64, DongipError> {
        let entries = self.entries.read().await;
        Ok(entries.generations.get(&user_balances_key(user_id)).copied().unwrap_or(0))
    }

    async fn save_user_balances(
        &self,
        user_id: &str,
        generation: u64,
        balances: &[CurrencyBalance],
        ttl: Duration,
    ) -> Result<bool, DongipError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| DongipError::CacheError(format!("Failed to convert TTL: {}", e)))?;
        let key = user_balances_key(user_id);
        let mut entries = self.entries.write().await;
        if entries.generations.get(&key).copied().unwrap_or(0) != generation {
            return Ok(false);
        }
        let now = Utc::now();
        entries.balances.retain(|_, (_, expiry)| *expiry > now);
        entries.balances.insert(key, (balances.to_vec(), now + ttl));
        Ok(true)
    }

    async fn invalidate_user_balances(&self, user_id: &str) -> Result<(), DongipError> {
        let key = user_balances_key(user_id);
        let mut entries = self.entries.write().await;
        entries.balances.remove(&key);
        *entries.generations.entry(key).or_insert(0) += 1;
        Ok(())
    }
}
