mod balance_tests;
mod concurrency_tests;

use crate::core::models::{
    category::Category,
    dong::{EntryDraft, NewDong},
    user::User,
    users_rel::{RelKind, UsersRel},
};
use crate::core::services::DongService;
use crate::infrastructure::audit::AuditTrail;
use crate::infrastructure::cache::Cache;
use crate::infrastructure::cache::in_memory::InMemoryCache;
use crate::infrastructure::audit::in_memory::InMemoryAuditTrail;
use crate::infrastructure::storage::Storage;
use crate::infrastructure::storage::in_memory::InMemoryStorage;

pub type TestService = DongService<InMemoryAuditTrail, InMemoryStorage, InMemoryCache>;

pub const TEST_SECRET: &str = "test-secret";

pub fn create_test_service() -> TestService {
    let storage = InMemoryStorage::with_hash_cost(4);
    let audit = InMemoryAuditTrail::new();
    let cache = InMemoryCache::new();
    DongService::new(storage, audit, cache, TEST_SECRET.to_string())
}

/// Registered user with their own rel and three contacts B, C and D.
pub struct Household {
    pub owner: User,
    pub me: UsersRel,
    pub b: UsersRel,
    pub c: UsersRel,
    pub d: UsersRel,
    pub category: Category,
}

pub async fn household<A: AuditTrail, S: Storage, C: Cache>(service: &DongService<A, S, C>, phone: &str) -> Household {
    let owner = service
        .register_user("Ali".to_string(), phone.to_string(), "pass".to_string())
        .await
        .unwrap();
    let me = service
        .list_contacts(&owner)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.kind == RelKind::Myself)
        .unwrap();
    let b = service.add_contact(&owner, "Bahar".to_string(), None).await.unwrap();
    let c = service.add_contact(&owner, "Cyrus".to_string(), None).await.unwrap();
    let d = service.add_contact(&owner, "Dara".to_string(), None).await.unwrap();
    let category = service
        .create_category(&owner, "Food".to_string(), None)
        .await
        .unwrap();
    Household {
        owner,
        me,
        b,
        c,
        d,
        category,
    }
}

pub fn entry(rel: &UsersRel, amount: i64) -> EntryDraft {
    EntryDraft {
        users_rel_id: rel.id.clone(),
        amount,
        currency: None,
    }
}

pub fn new_dong(category: &Category, pong: i64, payers: Vec<EntryDraft>, bills: Vec<EntryDraft>) -> NewDong {
    NewDong {
        title: "Dinner".to_string(),
        desc: None,
        created_at: None,
        category_id: category.id.clone(),
        joint_account_id: None,
        pong,
        currency: None,
        payers,
        bills,
    }
}
