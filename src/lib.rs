pub mod api;
pub mod auth;
pub mod config;
pub mod core;
pub mod infrastructure;

pub use crate::core::errors::DongipError;
pub use crate::core::services::DongService;
pub use crate::core::settlement::{Currency, Settlement, SettlementError, Share, Transfer, minimal_transfers, validate_and_settle};

#[cfg(test)]
mod tests;
