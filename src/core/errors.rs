use serde::Serialize;
use thiserror::Error;

use crate::core::settlement::SettlementError;

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Error, Debug, Serialize)]
pub enum DongipError {
    /// Payer/bill lists failed settlement validation
    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error("Phone number {0} already registered")]
    PhoneAlreadyRegistered(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Invalid phone or password")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("User {0} not found")]
    UserNotFound(String),

    /// Referenced users-rel does not exist or belongs to someone else
    #[error("Contact {0} not found")]
    ContactNotFound(String),

    #[error("Contact with phone {0} already exists")]
    ContactAlreadyExists(String),

    #[error("Category {0} not found")]
    CategoryNotFound(String),

    #[error("Category title {0} already taken")]
    CategoryTitleTaken(String),

    #[error("Joint account {0} not found")]
    JointAccountNotFound(String),

    #[error("Dong {0} not found")]
    DongNotFound(String),

    #[error("User {0} does not own this dong")]
    NotDongOwner(String),

    /// Generic input validation error with detailed field information
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Audit trail error: {0}")]
    AuditError(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}

impl DongipError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DongipError::Settlement(e) => match e {
                SettlementError::EmptyParticipants { .. } => "EmptyParticipants",
                SettlementError::InvalidAmount { .. } => "InvalidAmount",
                SettlementError::PayerSumMismatch { .. } => "PayerSumMismatch",
                SettlementError::OwerSumMismatch { .. } => "OwerSumMismatch",
                SettlementError::DuplicateParticipant(_) => "DuplicateParticipant",
                SettlementError::UnbalancedInput(_) => "UnbalancedInput",
                SettlementError::AmountOverflow => "AmountOverflow",
                SettlementError::CurrencyMismatch { .. } => "CurrencyMismatch",
                SettlementError::InvalidCurrency(_) => "InvalidCurrency",
            },
            DongipError::PhoneAlreadyRegistered(_) => "PhoneAlreadyRegistered",
            DongipError::InvalidPhone(_) => "InvalidPhone",
            DongipError::InvalidCredentials => "InvalidCredentials",
            DongipError::Unauthorized(_) => "Unauthorized",
            DongipError::UserNotFound(_) => "UserNotFound",
            DongipError::ContactNotFound(_) => "ContactNotFound",
            DongipError::ContactAlreadyExists(_) => "ContactAlreadyExists",
            DongipError::CategoryNotFound(_) => "CategoryNotFound",
            DongipError::CategoryTitleTaken(_) => "CategoryTitleTaken",
            DongipError::JointAccountNotFound(_) => "JointAccountNotFound",
            DongipError::DongNotFound(_) => "DongNotFound",
            DongipError::NotDongOwner(_) => "NotDongOwner",
            DongipError::InvalidInput(..) => "InvalidInput",
            DongipError::InternalServerError(_) => "InternalServerError",
            DongipError::StorageError(_) => "StorageError",
            DongipError::AuditError(_) => "AuditError",
            DongipError::CacheError(_) => "CacheError",
        }
    }
}
