//! Dong settlement calculator.
//!
//! Turns a proposed expense (total, payer contributions, ower shares) into a
//! per-participant net balance and reduces those balances to a short list of
//! point-to-point transfers. Everything here is pure: amounts are exact
//! integer minor units and nothing touches storage.

use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap, HashSet};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

use crate::core::constants::DEFAULT_CURRENCY;

/// ISO 4217 currency code, e.g. `IRR` or `EUR`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "IRR")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: &str) -> Result<Self, SettlementError> {
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
            Ok(Currency(code.to_string()))
        } else {
            Err(SettlementError::InvalidCurrency(code.to_string()))
        }
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency(DEFAULT_CURRENCY.to_string())
    }
}

impl TryFrom<String> for Currency {
    type Error = SettlementError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of a dong a list of shares belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Payers,
    Owers,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Payers => f.write_str("payers"),
            Side::Owers => f.write_str("owers"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SettlementError {
    #[error("The {side} list must not be empty")]
    EmptyParticipants { side: Side },

    /// `participant_id` is `None` when the dong total itself is invalid.
    #[error("Amount {amount} for {} must be positive", .participant_id.as_deref().unwrap_or("total"))]
    InvalidAmount { participant_id: Option<String>, amount: i64 },

    #[error("Payers sum to {actual} but the total is {expected}")]
    PayerSumMismatch { expected: i64, actual: i64 },

    #[error("Owers sum to {actual} but the total is {expected}")]
    OwerSumMismatch { expected: i64, actual: i64 },

    #[error("Participant {0} appears more than once in the same list")]
    DuplicateParticipant(String),

    #[error("Balances do not sum to zero (residual {0})")]
    UnbalancedInput(i64),

    #[error("Amount overflow while summing shares")]
    AmountOverflow,

    #[error("Currency {found} does not match {expected}")]
    CurrencyMismatch { expected: String, found: String },

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),
}

/// One row of a payer or bill list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Share {
    pub participant_id: String,
    pub amount: i64,
}

impl Share {
    pub fn new(participant_id: impl Into<String>, amount: i64) -> Self {
        Share {
            participant_id: participant_id.into(),
            amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: i64,
}

/// Validated net balances of one dong.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Settlement {
    pub currency: Currency,
    pub balances: BTreeMap<String, i64>,
}

pub fn ensure_currency(expected: &Currency, found: &Currency) -> Result<(), SettlementError> {
    if expected != found {
        return Err(SettlementError::CurrencyMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

pub fn validate_and_settle(
    total_amount: i64,
    currency: &Currency,
    payers: &[Share],
    owers: &[Share],
) -> Result<Settlement, SettlementError> {
    if payers.is_empty() {
        return Err(SettlementError::EmptyParticipants { side: Side::Payers });
    }
    if owers.is_empty() {
        return Err(SettlementError::EmptyParticipants { side: Side::Owers });
    }

    if total_amount <= 0 {
        return Err(SettlementError::InvalidAmount {
            participant_id: None,
            amount: total_amount,
        });
    }
    if let Some(share) = payers.iter().chain(owers).find(|s| s.amount <= 0) {
        return Err(SettlementError::InvalidAmount {
            participant_id: Some(share.participant_id.clone()),
            amount: share.amount,
        });
    }

    let paid = checked_sum(payers.iter().map(|s| s.amount))?;
    if paid != total_amount {
        return Err(SettlementError::PayerSumMismatch {
            expected: total_amount,
            actual: paid,
        });
    }
    let owed = checked_sum(owers.iter().map(|s| s.amount))?;
    if owed != total_amount {
        return Err(SettlementError::OwerSumMismatch {
            expected: total_amount,
            actual: owed,
        });
    }

    ensure_unique(payers)?;
    ensure_unique(owers)?;

    let mut balances: BTreeMap<String, i64> = BTreeMap::new();
    for share in payers {
        *balances.entry(share.participant_id.clone()).or_insert(0) += share.amount;
    }
    for share in owers {
        *balances.entry(share.participant_id.clone()).or_insert(0) -= share.amount;
    }

    let residual = checked_sum(balances.values().copied())?;
    if residual != 0 {
        return Err(SettlementError::UnbalancedInput(residual));
    }

    Ok(Settlement {
        currency: currency.clone(),
        balances,
    })
}

/// Greedy largest-creditor / largest-debtor matching.
///
/// Every step zeroes at least one participant, so `n` non-zero balances
/// produce at most `n - 1` transfers. Equal balances are served in ascending
/// participant id order, which makes the output fully deterministic.
pub fn minimal_transfers(balances: &BTreeMap<String, i64>) -> Result<Vec<Transfer>, SettlementError> {
    let residual = checked_sum(balances.values().copied())?;
    if residual != 0 {
        return Err(SettlementError::UnbalancedInput(residual));
    }

    let mut creditors: BinaryHeap<Party> = BinaryHeap::new();
    let mut debtors: BinaryHeap<Party> = BinaryHeap::new();
    for (id, &balance) in balances {
        match balance.cmp(&0) {
            Ordering::Greater => creditors.push(Party::new(id, balance)),
            Ordering::Less => {
                let owed = balance.checked_neg().ok_or(SettlementError::AmountOverflow)?;
                debtors.push(Party::new(id, owed));
            }
            Ordering::Equal => {}
        }
    }

    let mut transfers = Vec::new();
    while let (Some(mut creditor), Some(mut debtor)) = (creditors.pop(), debtors.pop()) {
        let amount = creditor.remaining.min(debtor.remaining);
        transfers.push(Transfer {
            from: debtor.id.0.clone(),
            to: creditor.id.0.clone(),
            amount,
        });
        creditor.remaining -= amount;
        debtor.remaining -= amount;
        if creditor.remaining > 0 {
            creditors.push(creditor);
        }
        if debtor.remaining > 0 {
            debtors.push(debtor);
        }
    }

    Ok(transfers)
}

/// Heap entry: larger outstanding amount first, then lower id.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Party {
    remaining: i64,
    id: Reverse<String>,
}

impl Party {
    fn new(id: &str, remaining: i64) -> Self {
        Party {
            remaining,
            id: Reverse(id.to_string()),
        }
    }
}

fn checked_sum(mut amounts: impl Iterator<Item = i64>) -> Result<i64, SettlementError> {
    amounts.try_fold(0i64, |acc, amount| {
        acc.checked_add(amount).ok_or(SettlementError::AmountOverflow)
    })
}

fn ensure_unique(shares: &[Share]) -> Result<(), SettlementError> {
    let mut seen = HashSet::with_capacity(shares.len());
    for share in shares {
        if !seen.insert(share.participant_id.as_str()) {
            return Err(SettlementError::DuplicateParticipant(share.participant_id.clone()));
        }
    }
    Ok(())
}
