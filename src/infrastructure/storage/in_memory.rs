use crate::core::errors::DongipError;
use crate::core::models::{
    category::Category,
    dong::{BillEntry, Dong, DongDetails, PayerEntry},
    joint_account::JointAccount,
    user::User,
    users_rel::UsersRel,
};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use bcrypt::hash;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Dongs and their rows share one lock so a dong is never visible without
/// its full payer and bill lists.
#[derive(Default)]
struct Ledger {
    dongs: HashMap<String, Dong>,
    payers: HashMap<String, Vec<PayerEntry>>,
    bills: HashMap<String, Vec<BillEntry>>,
}

#[derive(Clone)]
pub struct InMemoryStorage {
    users: Arc<RwLock<HashMap<String, User>>>,
    users_by_phone: Arc<RwLock<HashMap<String, String>>>,
    users_rels: Arc<RwLock<HashMap<String, UsersRel>>>,
    categories: Arc<RwLock<HashMap<String, Category>>>,
    joint_accounts: Arc<RwLock<HashMap<String, JointAccount>>>,
    ledger: Arc<RwLock<Ledger>>,
    hash_cost: u32,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::with_hash_cost(bcrypt::DEFAULT_COST)
    }

    pub fn with_hash_cost(hash_cost: u32) -> Self {
        InMemoryStorage {
            users: Arc::new(RwLock::new(HashMap::new())),
            users_by_phone: Arc::new(RwLock::new(HashMap::new())),
            users_rels: Arc::new(RwLock::new(HashMap::new())),
            categories: Arc::new(RwLock::new(HashMap::new())),
            joint_accounts: Arc::new(RwLock::new(HashMap::new())),
            ledger: Arc::new(RwLock::new(Ledger::default())),
            hash_cost,
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user_if_not_exists(&self, user: User) -> Result<Option<User>, DongipError> {
        let mut users_by_phone = self.users_by_phone.write().await;
        if users_by_phone.contains_key(&user.phone) {
            return Ok(None);
        }
        let hashed_user = User {
            password: hash(&user.password, self.hash_cost)
                .map_err(|e| DongipError::InternalServerError(format!("Password hashing error: {}", e)))?,
            ..user
        };
        users_by_phone.insert(hashed_user.phone.clone(), hashed_user.id.clone());
        let mut users = self.users.write().await;
        users.insert(hashed_user.id.clone(), hashed_user.clone());
        Ok(Some(hashed_user))
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, DongipError> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn get_user_by_phone(&self, phone: &str) -> Result<Option<User>, DongipError> {
        let users_by_phone = self.users_by_phone.read().await;
        let users = self.users.read().await;
        Ok(users_by_phone.get(phone).and_then(|id| users.get(id).cloned()))
    }

    async fn create_users_rel_if_not_exists(&self, rel: UsersRel) -> Result<Option<UsersRel>, DongipError> {
        let mut users_rels = self.users_rels.write().await;
        if let Some(phone) = rel.phone.as_deref() {
            let taken = users_rels
                .values()
                .any(|r| r.user_id == rel.user_id && r.phone.as_deref() == Some(phone));
            if taken {
                return Ok(None);
            }
        }
        users_rels.insert(rel.id.clone(), rel.clone());
        Ok(Some(rel))
    }

    async fn get_users_rel(&self, rel_id: &str) -> Result<Option<UsersRel>, DongipError> {
        let users_rels = self.users_rels.read().await;
        Ok(users_rels.get(rel_id).cloned())
    }

    async fn get_users_rels(&self, user_id: &str) -> Result<Vec<UsersRel>, DongipError> {
        let users_rels = self.users_rels.read().await;
        let mut rels: Vec<UsersRel> = users_rels.values().filter(|r| r.user_id == user_id).cloned().collect();
        rels.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rels)
    }

    async fn create_category_if_not_exists(&self, category: Category) -> Result<Option<Category>, DongipError> {
        let mut categories = self.categories.write().await;
        let title = category.title.to_lowercase();
        if categories
            .values()
            .any(|c| c.user_id == category.user_id && c.title.to_lowercase() == title)
        {
            return Ok(None);
        }
        categories.insert(category.id.clone(), category.clone());
        Ok(Some(category))
    }

    async fn get_category(&self, category_id: &str) -> Result<Option<Category>, DongipError> {
        let categories = self.categories.read().await;
        Ok(categories.get(category_id).cloned())
    }

    async fn get_categories(&self, user_id: &str) -> Result<Vec<Category>, DongipError> {
        let categories = self.categories.read().await;
        let mut owned: Vec<Category> = categories.values().filter(|c| c.user_id == user_id).cloned().collect();
        owned.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(owned)
    }

    async fn save_joint_account(&self, account: JointAccount) -> Result<(), DongipError> {
        let mut joint_accounts = self.joint_accounts.write().await;
        joint_accounts.insert(account.id.clone(), account);
        Ok(())
    }

    async fn get_joint_account(&self, account_id: &str) -> Result<Option<JointAccount>, DongipError> {
        let joint_accounts = self.joint_accounts.read().await;
        Ok(joint_accounts.get(account_id).cloned())
    }

    async fn get_joint_accounts(&self, user_id: &str) -> Result<Vec<JointAccount>, DongipError> {
        let joint_accounts = self.joint_accounts.read().await;
        let mut owned: Vec<JointAccount> = joint_accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(owned)
    }

    async fn create_dong(&self, dong: Dong, payers: Vec<PayerEntry>, bills: Vec<BillEntry>) -> Result<(), DongipError> {
        let mut ledger = self.ledger.write().await;
        if ledger.dongs.contains_key(&dong.id) {
            return Err(DongipError::StorageError(format!("Dong {} already exists", dong.id)));
        }
        let foreign_payer = payers.iter().find(|p| p.dong_id != dong.id).map(|p| p.id.clone());
        let foreign_bill = bills.iter().find(|b| b.dong_id != dong.id).map(|b| b.id.clone());
        if let Some(row_id) = foreign_payer.or(foreign_bill) {
            return Err(DongipError::StorageError(format!(
                "Row {} does not belong to dong {}",
                row_id, dong.id
            )));
        }

        ledger.payers.insert(dong.id.clone(), payers);
        ledger.bills.insert(dong.id.clone(), bills);
        ledger.dongs.insert(dong.id.clone(), dong);
        Ok(())
    }

    async fn get_dongs(&self, user_id: &str) -> Result<Vec<Dong>, DongipError> {
        let ledger = self.ledger.read().await;
        let mut dongs: Vec<Dong> = ledger.dongs.values().filter(|d| d.user_id == user_id).cloned().collect();
        dongs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(dongs)
    }

    async fn get_dong_details(&self, dong_id: &str) -> Result<Option<DongDetails>, DongipError> {
        let ledger = self.ledger.read().await;
        Ok(ledger.dongs.get(dong_id).map(|dong| DongDetails {
            dong: dong.clone(),
            payers: ledger.payers.get(dong_id).cloned().unwrap_or_default(),
            bills: ledger.bills.get(dong_id).cloned().unwrap_or_default(),
        }))
    }

    async fn delete_dong(&self, dong_id: &str) -> Result<bool, DongipError> {
        let mut ledger = self.ledger.write().await;
        ledger.payers.remove(dong_id);
        ledger.bills.remove(dong_id);
        Ok(ledger.dongs.remove(dong_id).is_some())
    }
}
