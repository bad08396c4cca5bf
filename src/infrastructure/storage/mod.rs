use crate::core::errors::DongipError;
use crate::core::models::{
    category::Category,
    dong::{BillEntry, Dong, DongDetails, PayerEntry},
    joint_account::JointAccount,
    user::User,
    users_rel::UsersRel,
};
use async_trait::async_trait;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns `None` when the phone number is already registered.
    async fn create_user_if_not_exists(&self, user: User) -> Result<Option<User>, DongipError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, DongipError>;
    async fn get_user_by_phone(&self, phone: &str) -> Result<Option<User>, DongipError>;

    /// Returns `None` when the owner already has a rel with the same phone.
    async fn create_users_rel_if_not_exists(&self, rel: UsersRel) -> Result<Option<UsersRel>, DongipError>;
    async fn get_users_rel(&self, rel_id: &str) -> Result<Option<UsersRel>, DongipError>;
    async fn get_users_rels(&self, user_id: &str) -> Result<Vec<UsersRel>, DongipError>;

    /// Returns `None` when the owner already has a category with the same
    /// title, compared case-insensitively.
    async fn create_category_if_not_exists(&self, category: Category) -> Result<Option<Category>, DongipError>;
    async fn get_category(&self, category_id: &str) -> Result<Option<Category>, DongipError>;
    async fn get_categories(&self, user_id: &str) -> Result<Vec<Category>, DongipError>;

    async fn save_joint_account(&self, account: JointAccount) -> Result<(), DongipError>;
    async fn get_joint_account(&self, account_id: &str) -> Result<Option<JointAccount>, DongipError>;
    async fn get_joint_accounts(&self, user_id: &str) -> Result<Vec<JointAccount>, DongipError>;

    /// Writes the dong and all of its payer and bill rows, or nothing at all.
    async fn create_dong(&self, dong: Dong, payers: Vec<PayerEntry>, bills: Vec<BillEntry>) -> Result<(), DongipError>;
    async fn get_dongs(&self, user_id: &str) -> Result<Vec<Dong>, DongipError>;
    /// The dong together with its rows, read as one snapshot.
    async fn get_dong_details(&self, dong_id: &str) -> Result<Option<DongDetails>, DongipError>;
    /// Removes the dong with its rows. Returns whether anything was removed.
    async fn delete_dong(&self, dong_id: &str) -> Result<bool, DongipError>;
}

pub mod in_memory;
