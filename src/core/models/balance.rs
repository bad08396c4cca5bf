use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::core::settlement::{Currency, Transfer};

/// Balances of a single dong, keyed by users-rel id.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DongSettlement {
    pub dong_id: String,
    pub currency: Currency,
    pub balances: BTreeMap<String, i64>,
    pub transfers: Vec<Transfer>,
}

/// Net position across all of a user's dongs in one currency.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CurrencyBalance {
    pub currency: Currency,
    pub balances: BTreeMap<String, i64>,
    pub transfers: Vec<Transfer>,
}
