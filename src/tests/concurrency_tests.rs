use crate::core::errors::DongipError;
use crate::core::models::{
    balance::CurrencyBalance,
    category::Category,
    dong::{BillEntry, Dong, DongDetails, PayerEntry},
    joint_account::JointAccount,
    user::User,
    users_rel::UsersRel,
};
use crate::core::services::DongService;
use crate::infrastructure::audit::in_memory::InMemoryAuditTrail;
use crate::infrastructure::cache::Cache;
use crate::infrastructure::cache::in_memory::InMemoryCache;
use crate::infrastructure::storage::Storage;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use crate::tests::{TEST_SECRET, create_test_service, entry, household, new_dong};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Pauses the next balance save until released.
#[derive(Default)]
struct SaveGate {
    armed: AtomicBool,
    reached: Notify,
    release: Notify,
}

struct GatedCache {
    inner: InMemoryCache,
    gate: Arc<SaveGate>,
}

#[async_trait]
impl Cache for GatedCache {
    async fn get_user_balances(&self, user_id: &str) -> Result<Option<Vec<CurrencyBalance>>, DongipError> {
        self.inner.get_user_balances(user_id).await
    }

    async fn balances_generation(&self, user_id: &str) -> Result<u64, DongipError> {
        self.inner.balances_generation(user_id).await
    }

    async fn save_user_balances(
        &self,
        user_id: &str,
        generation: u64,
        balances: &[CurrencyBalance],
        ttl: Duration,
    ) -> Result<bool, DongipError> {
        if self.gate.armed.swap(false, Ordering::SeqCst) {
            self.gate.reached.notify_one();
            self.gate.release.notified().await;
        }
        self.inner.save_user_balances(user_id, generation, balances, ttl).await
    }

    async fn invalidate_user_balances(&self, user_id: &str) -> Result<(), DongipError> {
        self.inner.invalidate_user_balances(user_id).await
    }
}

#[tokio::test]
async fn test_balances_computed_before_a_new_dong_are_not_cached() {
    let gate = Arc::new(SaveGate::default());
    let cache = GatedCache {
        inner: InMemoryCache::new(),
        gate: gate.clone(),
    };
    let service = Arc::new(DongService::new(
        InMemoryStorage::with_hash_cost(4),
        InMemoryAuditTrail::new(),
        cache,
        TEST_SECRET.to_string(),
    ));
    let h = household(&*service, "09120000001").await;

    gate.armed.store(true, Ordering::SeqCst);
    let reader = {
        let service = service.clone();
        let owner = h.owner.clone();
        tokio::spawn(async move { service.get_user_balances(&owner).await })
    };
    gate.reached.notified().await;

    let draft = new_dong(&h.category, 100, vec![entry(&h.me, 100)], vec![entry(&h.b, 100)]);
    service.create_dong(&h.owner, draft).await.unwrap();
    gate.release.notify_one();

    let before = reader.await.unwrap().unwrap();
    assert!(before.is_empty());

    let after = service.get_user_balances(&h.owner).await.unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].balances.get(&h.me.id), Some(&100));
    assert_eq!(after[0].balances.get(&h.b.id), Some(&-100));
}

/// Deletes the first listed dong right after listing, the way a concurrent
/// delete would land between the listing and the row reads.
struct VanishingStorage {
    inner: InMemoryStorage,
    vanish_next_listing: Arc<AtomicBool>,
}

#[async_trait]
impl Storage for VanishingStorage {
    async fn create_user_if_not_exists(&self, user: User) -> Result<Option<User>, DongipError> {
        self.inner.create_user_if_not_exists(user).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, DongipError> {
        self.inner.get_user(user_id).await
    }

    async fn get_user_by_phone(&self, phone: &str) -> Result<Option<User>, DongipError> {
        self.inner.get_user_by_phone(phone).await
    }

    async fn create_users_rel_if_not_exists(&self, rel: UsersRel) -> Result<Option<UsersRel>, DongipError> {
        self.inner.create_users_rel_if_not_exists(rel).await
    }

    async fn get_users_rel(&self, rel_id: &str) -> Result<Option<UsersRel>, DongipError> {
        self.inner.get_users_rel(rel_id).await
    }

    async fn get_users_rels(&self, user_id: &str) -> Result<Vec<UsersRel>, DongipError> {
        self.inner.get_users_rels(user_id).await
    }

    async fn create_category_if_not_exists(&self, category: Category) -> Result<Option<Category>, DongipError> {
        self.inner.create_category_if_not_exists(category).await
    }

    async fn get_category(&self, category_id: &str) -> Result<Option<Category>, DongipError> {
        self.inner.get_category(category_id).await
    }

    async fn get_categories(&self, user_id: &str) -> Result<Vec<Category>, DongipError> {
        self.inner.get_categories(user_id).await
    }

    async fn save_joint_account(&self, account: JointAccount) -> Result<(), DongipError> {
        self.inner.save_joint_account(account).await
    }

    async fn get_joint_account(&self, account_id: &str) -> Result<Option<JointAccount>, DongipError> {
        self.inner.get_joint_account(account_id).await
    }

    async fn get_joint_accounts(&self, user_id: &str) -> Result<Vec<JointAccount>, DongipError> {
        self.inner.get_joint_accounts(user_id).await
    }

    async fn create_dong(&self, dong: Dong, payers: Vec<PayerEntry>, bills: Vec<BillEntry>) -> Result<(), DongipError> {
        self.inner.create_dong(dong, payers, bills).await
    }

    async fn get_dongs(&self, user_id: &str) -> Result<Vec<Dong>, DongipError> {
        let dongs = self.inner.get_dongs(user_id).await?;
        if self.vanish_next_listing.swap(false, Ordering::SeqCst) {
            if let Some(first) = dongs.first() {
                self.inner.delete_dong(&first.id).await?;
            }
        }
        Ok(dongs)
    }

    async fn get_dong_details(&self, dong_id: &str) -> Result<Option<DongDetails>, DongipError> {
        self.inner.get_dong_details(dong_id).await
    }

    async fn delete_dong(&self, dong_id: &str) -> Result<bool, DongipError> {
        self.inner.delete_dong(dong_id).await
    }
}

#[tokio::test]
async fn test_balances_skip_dong_deleted_while_reading() {
    let vanish = Arc::new(AtomicBool::new(false));
    let storage = VanishingStorage {
        inner: InMemoryStorage::with_hash_cost(4),
        vanish_next_listing: vanish.clone(),
    };
    let service = DongService::new(
        storage,
        InMemoryAuditTrail::new(),
        InMemoryCache::new(),
        TEST_SECRET.to_string(),
    );
    let h = household(&service, "09120000001").await;

    let mut older = new_dong(&h.category, 100, vec![entry(&h.me, 100)], vec![entry(&h.b, 100)]);
    older.created_at = Some(Utc::now() - ChronoDuration::days(1));
    service.create_dong(&h.owner, older).await.unwrap();
    let newer = new_dong(&h.category, 50, vec![entry(&h.me, 50)], vec![entry(&h.c, 50)]);
    let newer = service.create_dong(&h.owner, newer).await.unwrap();

    vanish.store(true, Ordering::SeqCst);
    let balances = service.get_user_balances(&h.owner).await.unwrap();
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].balances.get(&h.me.id), Some(&100));
    assert_eq!(balances[0].balances.get(&h.b.id), Some(&-100));
    assert!(!balances[0].balances.contains_key(&h.c.id));

    let settlement = service.get_dong_settlement(&newer.dong.id, &h.owner).await;
    assert!(matches!(settlement, Err(DongipError::DongNotFound(_))));
}

#[tokio::test]
async fn test_concurrent_duplicate_categories_create_one() {
    let service = create_test_service();
    let user = service
        .register_user("Sara".to_string(), "09120000001".to_string(), "secret".to_string())
        .await
        .unwrap();

    let attempts = (0..16).map(|_| service.create_category(&user, "Food".to_string(), None));
    let results = futures::future::join_all(attempts).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, DongipError::CategoryTitleTaken(_))));
    assert_eq!(service.list_categories(&user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_duplicate_contacts_create_one() {
    let service = create_test_service();
    let user = service
        .register_user("Sara".to_string(), "09120000001".to_string(), "secret".to_string())
        .await
        .unwrap();

    let attempts = (0..16).map(|i| service.add_contact(&user, format!("Reza {}", i), Some("09120000002".to_string())));
    let results = futures::future::join_all(attempts).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, DongipError::ContactAlreadyExists(_))));
    // self rel plus the one contact
    assert_eq!(service.list_contacts(&user).await.unwrap().len(), 2);
}
