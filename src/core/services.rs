use crate::auth::jwt::{Claims, JwtService};
use crate::core::constants::{
    BALANCE_QUERIED, CATEGORY_CREATED, CONTACT_ADDED, DONG_CREATED, DONG_DELETED,
    JOINT_ACCOUNT_CREATED, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, MAX_TITLE_LENGTH, USER_LOGGED_IN,
    USER_REGISTERED,
};
use crate::core::errors::{DongipError, FieldError};
use crate::core::models::{
    audit::AppLog,
    balance::{CurrencyBalance, DongSettlement},
    category::Category,
    dong::{BillEntry, Dong, DongDetails, EntryDraft, NewDong, PayerEntry},
    joint_account::JointAccount,
    user::User,
    users_rel::{RelKind, UsersRel},
};
use crate::core::settlement::{
    self, Currency, SettlementError, Share, Transfer, ensure_currency, minimal_transfers, validate_and_settle,
};
use crate::infrastructure::cache::Cache;
use crate::infrastructure::audit::AuditTrail;
use crate::infrastructure::storage::Storage;
use chrono::Utc;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct DongService<A: AuditTrail, S: Storage, C: Cache> {
    storage: S,
    audit: A,
    cache: C,
    jwt_service: JwtService,
    default_currency: Currency,
    balance_cache_ttl: Duration,
}

impl<A: AuditTrail, S: Storage, C: Cache> DongService<A, S, C> {
    pub fn new(storage: S, audit: A, cache: C, jwt_secret: String) -> Self {
        DongService {
            storage,
            audit,
            cache,
            jwt_service: JwtService::new(jwt_secret, Duration::from_secs(3600)),
            default_currency: Currency::default(),
            balance_cache_ttl: Duration::from_secs(3600),
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.jwt_service.set_ttl(ttl);
        self
    }

    pub fn with_default_currency(mut self, currency: Currency) -> Self {
        self.default_currency = currency;
        self
    }

    pub fn with_balance_cache_ttl(mut self, ttl: Duration) -> Self {
        self.balance_cache_ttl = ttl;
        self
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, DongipError> {
        self.jwt_service.validate_token(token)
    }

    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), DongipError> {
        let entry = AppLog {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            user_id: user_id.map(String::from),
            details,
            timestamp: Utc::now(),
        };
        self.audit.record(entry).await
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), DongipError> {
        if value.trim().is_empty() {
            return Err(DongipError::InvalidInput(
                field.to_string(),
                FieldError::new(field, format!("Invalid {}", field), format!("{} cannot be empty", field)),
            ));
        }
        if value.chars().count() > max_length {
            return Err(DongipError::InvalidInput(
                field.to_string(),
                FieldError::new(
                    field,
                    format!("{} Too Long", field),
                    format!("{} cannot exceed {} characters", field, max_length),
                ),
            ));
        }
        if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
            return Err(DongipError::InvalidInput(
                field.to_string(),
                FieldError::new(
                    field,
                    format!("Invalid {}", field),
                    format!("{} contains invalid characters", field),
                ),
            ));
        }
        Ok(())
    }

    fn validate_phone(&self, phone: &str) -> Result<(), DongipError> {
        let digits = phone.strip_prefix('+').unwrap_or(phone);
        if !(10..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(DongipError::InvalidPhone(phone.to_string()));
        }
        Ok(())
    }

    async fn require_user(&self, user_id: &str) -> Result<User, DongipError> {
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| DongipError::UserNotFound(user_id.to_string()))
    }

    /// Resolves a users-rel that must belong to `owner_id`.
    async fn owned_contact(&self, rel_id: &str, owner_id: &str) -> Result<UsersRel, DongipError> {
        match self.storage.get_users_rel(rel_id).await? {
            Some(rel) if rel.is_owned_by(owner_id) => Ok(rel),
            _ => Err(DongipError::ContactNotFound(rel_id.to_string())),
        }
    }

    async fn owned_contacts(&self, rel_ids: &BTreeSet<&str>, owner_id: &str) -> Result<Vec<UsersRel>, DongipError> {
        let lookups = rel_ids.iter().map(|id| self.owned_contact(id, owner_id));
        futures::future::try_join_all(lookups).await
    }

    pub async fn register_user(&self, name: String, phone: String, password: String) -> Result<User, DongipError> {
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        self.validate_phone(&phone)?;
        if password.is_empty() {
            return Err(DongipError::InvalidInput(
                "password".to_string(),
                FieldError::new("password", "Invalid password", "Password cannot be empty"),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name,
            phone: phone.clone(),
            password,
            created_at: now,
        };
        let user = self
            .storage
            .create_user_if_not_exists(user)
            .await?
            .ok_or_else(|| DongipError::PhoneAlreadyRegistered(phone.clone()))?;

        let own_rel = UsersRel {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            alias: user.name.clone(),
            phone: Some(user.phone.clone()),
            target_user_id: Some(user.id.clone()),
            kind: RelKind::Myself,
            created_at: now,
        };
        self.storage
            .create_users_rel_if_not_exists(own_rel)
            .await?
            .ok_or_else(|| DongipError::ContactAlreadyExists(user.phone.clone()))?;

        info!("Registered user {}", user.id);
        self.log_action(
            USER_REGISTERED,
            json!({ "user_id": user.id, "name": user.name, "phone": user.phone }),
            Some(user.id.as_str()),
        )
        .await?;
        Ok(user)
    }

    pub async fn authenticate(&self, phone: &str, password: &str) -> Result<String, DongipError> {
        let user = self
            .storage
            .get_user_by_phone(phone)
            .await?
            .ok_or(DongipError::InvalidCredentials)?;

        let verified = bcrypt::verify(password, &user.password)
            .map_err(|e| DongipError::InternalServerError(format!("Password verification error: {}", e)))?;
        if !verified {
            warn!("Failed login attempt for user {}", user.id);
            return Err(DongipError::InvalidCredentials);
        }

        let token = self.jwt_service.generate_token(&user.id)?;
        self.log_action(USER_LOGGED_IN, json!({ "user_id": user.id }), Some(user.id.as_str()))
            .await?;
        Ok(token)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, DongipError> {
        self.storage.get_user(user_id).await
    }

    pub async fn add_contact(&self, user: &User, alias: String, phone: Option<String>) -> Result<UsersRel, DongipError> {
        self.require_user(&user.id).await?;
        self.validate_string_input("alias", &alias, MAX_NAME_LENGTH)?;

        let mut target_user_id = None;
        if let Some(phone) = phone.as_deref() {
            self.validate_phone(phone)?;
            target_user_id = self.storage.get_user_by_phone(phone).await?.map(|u| u.id);
        }

        let rel = UsersRel {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            alias,
            phone: phone.clone(),
            target_user_id,
            kind: RelKind::Contact,
            created_at: Utc::now(),
        };
        let rel = self
            .storage
            .create_users_rel_if_not_exists(rel)
            .await?
            .ok_or_else(|| DongipError::ContactAlreadyExists(phone.unwrap_or_default()))?;

        debug!("User {} added contact {}", user.id, rel.id);
        self.log_action(
            CONTACT_ADDED,
            json!({ "users_rel_id": rel.id, "alias": rel.alias, "linked": rel.target_user_id.is_some() }),
            Some(user.id.as_str()),
        )
        .await?;
        Ok(rel)
    }

    pub async fn list_contacts(&self, user: &User) -> Result<Vec<UsersRel>, DongipError> {
        self.storage.get_users_rels(&user.id).await
    }

    pub async fn create_category(
        &self,
        user: &User,
        title: String,
        icon: Option<String>,
    ) -> Result<Category, DongipError> {
        self.require_user(&user.id).await?;
        self.validate_string_input("title", &title, MAX_NAME_LENGTH)?;
        if let Some(icon) = icon.as_deref() {
            self.validate_string_input("icon", icon, MAX_TITLE_LENGTH)?;
        }

        let category = Category {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            title: title.clone(),
            icon,
            created_at: Utc::now(),
        };
        let category = self
            .storage
            .create_category_if_not_exists(category)
            .await?
            .ok_or(DongipError::CategoryTitleTaken(title))?;

        self.log_action(
            CATEGORY_CREATED,
            json!({ "category_id": category.id, "title": category.title }),
            Some(user.id.as_str()),
        )
        .await?;
        Ok(category)
    }

    pub async fn list_categories(&self, user: &User) -> Result<Vec<Category>, DongipError> {
        self.storage.get_categories(&user.id).await
    }

    pub async fn create_joint_account(
        &self,
        user: &User,
        title: String,
        description: Option<String>,
        member_rel_ids: Vec<String>,
    ) -> Result<JointAccount, DongipError> {
        self.require_user(&user.id).await?;
        self.validate_string_input("title", &title, MAX_NAME_LENGTH)?;
        if let Some(description) = description.as_deref() {
            self.validate_string_input("description", description, MAX_DESCRIPTION_LENGTH)?;
        }

        let members: BTreeSet<&str> = member_rel_ids.iter().map(String::as_str).collect();
        if members.is_empty() {
            return Err(DongipError::InvalidInput(
                "member_rel_ids".to_string(),
                FieldError::new(
                    "member_rel_ids",
                    "Invalid members",
                    "A joint account needs at least one member",
                ),
            ));
        }
        self.owned_contacts(&members, &user.id).await?;

        let account = JointAccount {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            title,
            description,
            member_rel_ids: members.into_iter().map(String::from).collect(),
            created_at: Utc::now(),
        };
        self.storage.save_joint_account(account.clone()).await?;

        self.log_action(
            JOINT_ACCOUNT_CREATED,
            json!({ "joint_account_id": account.id, "members": account.member_rel_ids.len() }),
            Some(user.id.as_str()),
        )
        .await?;
        Ok(account)
    }

    pub async fn list_joint_accounts(&self, user: &User) -> Result<Vec<JointAccount>, DongipError> {
        self.storage.get_joint_accounts(&user.id).await
    }

    /// Validates a proposed dong and stores it with its payer and bill rows.
    ///
    /// Currency is checked before the settlement rules, and participant
    /// ownership after them, so a malformed split is always reported as a
    /// settlement error regardless of which contacts it names.
    pub async fn create_dong(&self, owner: &User, draft: NewDong) -> Result<DongDetails, DongipError> {
        self.require_user(&owner.id).await?;
        self.validate_string_input("title", &draft.title, MAX_TITLE_LENGTH)?;
        if let Some(desc) = draft.desc.as_deref() {
            self.validate_string_input("desc", desc, MAX_DESCRIPTION_LENGTH)?;
        }

        match self.storage.get_category(&draft.category_id).await? {
            Some(category) if category.user_id == owner.id => {}
            _ => return Err(DongipError::CategoryNotFound(draft.category_id.clone())),
        }
        if let Some(account_id) = draft.joint_account_id.as_deref() {
            match self.storage.get_joint_account(account_id).await? {
                Some(account) if account.user_id == owner.id => {}
                _ => return Err(DongipError::JointAccountNotFound(account_id.to_string())),
            }
        }

        let currency = draft.currency.clone().unwrap_or_else(|| self.default_currency.clone());
        for entry in draft.payers.iter().chain(&draft.bills) {
            if let Some(entry_currency) = &entry.currency {
                ensure_currency(&currency, entry_currency)?;
            }
        }

        let payer_shares: Vec<Share> = draft.payers.iter().map(EntryDraft::share).collect();
        let bill_shares: Vec<Share> = draft.bills.iter().map(EntryDraft::share).collect();
        let settled = validate_and_settle(draft.pong, &currency, &payer_shares, &bill_shares)?;

        let participants: BTreeSet<&str> = settled.balances.keys().map(String::as_str).collect();
        self.owned_contacts(&participants, &owner.id).await?;

        let dong_id = Uuid::new_v4().to_string();
        let dong = Dong {
            id: dong_id.clone(),
            user_id: owner.id.clone(),
            title: draft.title,
            desc: draft.desc,
            created_at: draft.created_at.unwrap_or_else(Utc::now),
            pong: draft.pong,
            currency: currency.clone(),
            category_id: draft.category_id,
            joint_account_id: draft.joint_account_id,
        };
        let payers: Vec<PayerEntry> = draft
            .payers
            .into_iter()
            .map(|entry| PayerEntry {
                id: Uuid::new_v4().to_string(),
                dong_id: dong_id.clone(),
                users_rel_id: entry.users_rel_id,
                paid_amount: entry.amount,
                currency: currency.clone(),
            })
            .collect();
        let bills: Vec<BillEntry> = draft
            .bills
            .into_iter()
            .map(|entry| BillEntry {
                id: Uuid::new_v4().to_string(),
                dong_id: dong_id.clone(),
                users_rel_id: entry.users_rel_id,
                dong_amount: entry.amount,
                currency: currency.clone(),
            })
            .collect();

        self.storage
            .create_dong(dong.clone(), payers.clone(), bills.clone())
            .await?;
        self.cache.invalidate_user_balances(&owner.id).await?;

        info!(
            "Dong {} created by {} for {} {} across {} participants",
            dong.id,
            owner.id,
            dong.pong,
            dong.currency,
            settled.balances.len()
        );
        self.log_action(
            DONG_CREATED,
            json!({
                "dong_id": dong.id,
                "pong": dong.pong,
                "currency": dong.currency,
                "payers": payers.len(),
                "bills": bills.len()
            }),
            Some(owner.id.as_str()),
        )
        .await?;

        Ok(DongDetails { dong, payers, bills })
    }

    /// Loads a dong with its rows, failing unless `user` owns it.
    async fn owned_dong(&self, dong_id: &str, user: &User) -> Result<DongDetails, DongipError> {
        let details = self
            .storage
            .get_dong_details(dong_id)
            .await?
            .ok_or_else(|| DongipError::DongNotFound(dong_id.to_string()))?;
        if details.dong.user_id != user.id {
            return Err(DongipError::NotDongOwner(user.id.clone()));
        }
        Ok(details)
    }

    pub async fn get_dong(&self, dong_id: &str, user: &User) -> Result<DongDetails, DongipError> {
        self.owned_dong(dong_id, user).await
    }

    pub async fn list_dongs(&self, user: &User) -> Result<Vec<Dong>, DongipError> {
        self.storage.get_dongs(&user.id).await
    }

    pub async fn delete_dong(&self, dong_id: &str, user: &User) -> Result<(), DongipError> {
        self.owned_dong(dong_id, user).await?;
        if !self.storage.delete_dong(dong_id).await? {
            return Err(DongipError::DongNotFound(dong_id.to_string()));
        }
        self.cache.invalidate_user_balances(&user.id).await?;

        info!("Dong {} deleted by {}", dong_id, user.id);
        self.log_action(DONG_DELETED, json!({ "dong_id": dong_id }), Some(user.id.as_str()))
            .await?;
        Ok(())
    }

    /// Re-derives a stored dong's balances from its persisted rows.
    fn settle_stored(details: &DongDetails) -> Result<settlement::Settlement, DongipError> {
        let dong = &details.dong;
        let currencies = details
            .payers
            .iter()
            .map(|p| &p.currency)
            .chain(details.bills.iter().map(|b| &b.currency));
        for entry_currency in currencies {
            ensure_currency(&dong.currency, entry_currency)?;
        }
        let payer_shares: Vec<Share> = details.payers.iter().map(Share::from).collect();
        let bill_shares: Vec<Share> = details.bills.iter().map(Share::from).collect();
        Ok(validate_and_settle(dong.pong, &dong.currency, &payer_shares, &bill_shares)?)
    }

    pub async fn get_dong_settlement(&self, dong_id: &str, user: &User) -> Result<DongSettlement, DongipError> {
        let details = self.owned_dong(dong_id, user).await?;
        let settled = Self::settle_stored(&details)?;
        let transfers = minimal_transfers(&settled.balances)?;
        Ok(DongSettlement {
            dong_id: details.dong.id,
            currency: settled.currency,
            balances: settled.balances,
            transfers,
        })
    }

    /// Net balance per contact over all of the user's dongs, one entry per
    /// currency, each with the transfers that would settle it.
    pub async fn get_user_balances(&self, user: &User) -> Result<Vec<CurrencyBalance>, DongipError> {
        self.require_user(&user.id).await?;

        if let Some(cached) = self.cache.get_user_balances(&user.id).await? {
            debug!("Serving cached balances for {}", user.id);
            return Ok(cached);
        }

        let generation = self.cache.balances_generation(&user.id).await?;
        let mut totals: BTreeMap<Currency, BTreeMap<String, i64>> = BTreeMap::new();
        for dong in self.storage.get_dongs(&user.id).await? {
            // deleted since the listing
            let Some(details) = self.storage.get_dong_details(&dong.id).await? else {
                continue;
            };
            let settled = Self::settle_stored(&details)?;
            let bucket = totals.entry(settled.currency).or_default();
            for (participant, balance) in settled.balances {
                let entry = bucket.entry(participant).or_insert(0);
                *entry = entry.checked_add(balance).ok_or(SettlementError::AmountOverflow)?;
            }
        }

        let mut response = Vec::with_capacity(totals.len());
        for (currency, mut balances) in totals {
            balances.retain(|_, balance| *balance != 0);
            let transfers = minimal_transfers(&balances)?;
            response.push(CurrencyBalance {
                currency,
                balances,
                transfers,
            });
        }

        let stored = self
            .cache
            .save_user_balances(&user.id, generation, &response, self.balance_cache_ttl)
            .await?;
        if !stored {
            debug!("Balances of {} changed while computing, not caching", user.id);
        }
        self.log_action(
            BALANCE_QUERIED,
            json!({ "user_id": user.id, "currencies": response.len() }),
            Some(user.id.as_str()),
        )
        .await?;

        Ok(response)
    }

    pub fn simplify_balances(&self, balances: &BTreeMap<String, i64>) -> Result<Vec<Transfer>, DongipError> {
        Ok(minimal_transfers(balances)?)
    }

    pub async fn get_app_logs(&self, user: &User) -> Result<Vec<AppLog>, DongipError> {
        self.audit.entries_for(&user.id).await
    }
}

impl EntryDraft {
    fn share(&self) -> Share {
        Share::new(self.users_rel_id.clone(), self.amount)
    }
}
