use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::engine::lock::LockPolicy;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    // Database
    pub db_max_connections: u32,
    /// innodb_lock_wait_timeout applied to every pooled connection
    pub lock_wait_timeout_secs: u64,

    // Employee row lock retries
    pub lock_max_retries: u32,
    pub lock_base_delay_ms: u64,
    pub lock_jitter_ms: u64,
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} has an invalid value: {raw}")),
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_protected_per_min: env_or("RATE_PROTECTED_PER_MIN", 1000),

            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            lock_wait_timeout_secs: env_or("LOCK_WAIT_TIMEOUT_SECS", 5),

            lock_max_retries: env_or("LOCK_MAX_RETRIES", 3),
            lock_base_delay_ms: env_or("LOCK_BASE_DELAY_MS", 1000),
            lock_jitter_ms: env_or("LOCK_JITTER_MS", 0),
        }
    }

    pub fn lock_policy(&self) -> LockPolicy {
        LockPolicy {
            max_retries: self.lock_max_retries,
            base_delay: Duration::from_millis(self.lock_base_delay_ms),
            max_jitter: Duration::from_millis(self.lock_jitter_ms),
        }
    }
}
