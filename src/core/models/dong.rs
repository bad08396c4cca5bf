use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::settlement::{Currency, Share};

/// One recorded shared expense.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Dong {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub desc: Option<String>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    /// Total amount in minor units
    pub pong: i64,
    pub currency: Currency,
    pub category_id: String,
    pub joint_account_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PayerEntry {
    pub id: String,
    pub dong_id: String,
    pub users_rel_id: String,
    pub paid_amount: i64,
    pub currency: Currency,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BillEntry {
    pub id: String,
    pub dong_id: String,
    pub users_rel_id: String,
    pub dong_amount: i64,
    pub currency: Currency,
}

impl From<&PayerEntry> for Share {
    fn from(entry: &PayerEntry) -> Self {
        Share::new(entry.users_rel_id.clone(), entry.paid_amount)
    }
}

impl From<&BillEntry> for Share {
    fn from(entry: &BillEntry) -> Self {
        Share::new(entry.users_rel_id.clone(), entry.dong_amount)
    }
}

/// A dong together with its ledger rows.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DongDetails {
    pub dong: Dong,
    pub payers: Vec<PayerEntry>,
    pub bills: Vec<BillEntry>,
}

/// One row of a proposed payer or bill list. A missing currency means the
/// dong's own currency.
#[derive(Clone, Debug)]
pub struct EntryDraft {
    pub users_rel_id: String,
    pub amount: i64,
    pub currency: Option<Currency>,
}

/// Input for creating a dong, before any validation.
#[derive(Clone, Debug)]
pub struct NewDong {
    pub title: String,
    pub desc: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub category_id: String,
    pub joint_account_id: Option<String>,
    pub pong: i64,
    pub currency: Option<Currency>,
    pub payers: Vec<EntryDraft>,
    pub bills: Vec<EntryDraft>,
}
