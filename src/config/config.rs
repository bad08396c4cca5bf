use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;

use crate::core::constants::DEFAULT_CURRENCY;

pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub jwt_secret: String,
    pub jwt_ttl_secs: u64,
    pub balance_cache_ttl_secs: u64,
    pub default_currency: String,
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_ttl_secs", &self.jwt_ttl_secs)
            .field("balance_cache_ttl_secs", &self.balance_cache_ttl_secs)
            .field("default_currency", &self.default_currency)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            port: parsed_or("PORT", 3000),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_string()), // Use a secure secret in production
            jwt_ttl_secs: parsed_or("JWT_TTL_SECS", 3600),
            balance_cache_ttl_secs: parsed_or("BALANCE_CACHE_TTL_SECS", 3600),
            default_currency: env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string()),
            bcrypt_cost: parsed_or("BCRYPT_COST", bcrypt::DEFAULT_COST),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
