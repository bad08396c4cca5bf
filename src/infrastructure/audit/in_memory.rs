use crate::core::errors::DongipError;
use crate::core::models::audit::AppLog;
use crate::infrastructure::audit::AuditTrail;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Default)]
struct Trails {
    by_user: HashMap<String, Vec<AppLog>>,
    unattributed: Vec<AppLog>,
}

#[derive(Clone, Default)]
pub struct InMemoryAuditTrail {
    trails: Arc<RwLock<Trails>>,
}

impl InMemoryAuditTrail {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditTrail for InMemoryAuditTrail {
    async fn record(&self, entry: AppLog) -> Result<(), DongipError> {
        if !entry.details.is_object() {
            return Err(DongipError::AuditError(format!(
                "Details of audit entry {} must be a JSON object",
                entry.action
            )));
        }
        info!(
            target: "audit",
            action = %entry.action,
            user_id = entry.user_id.as_deref().unwrap_or("-"),
            "{}",
            entry.details
        );

        let mut trails = self.trails.write().await;
        match entry.user_id.clone() {
            Some(user_id) => trails.by_user.entry(user_id).or_default().push(entry),
            None => trails.unattributed.push(entry),
        }
        Ok(())
    }

    async fn entries_for(&self, user_id: &str) -> Result<Vec<AppLog>, DongipError> {
        let trails = self.trails.read().await;
        Ok(trails.by_user.get(user_id).cloned().unwrap_or_default())
    }
}
