use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use std::net::SocketAddr;
use std::str::FromStr;

/// Placeholder substituted for connection settings that were never set.
/// The service starts in a degraded state instead of refusing to boot;
/// the broken value shows up verbatim in the connect error and in
/// `GET /config`, which makes the misconfiguration easy to spot.
pub const UNSET_PLACEHOLDER: &str = "WAS_NOT_SET?!";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub redis_url: String,
    pub map_api_key: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_seconds: u64,
    pub db_idle_timeout_seconds: u64,
    pub db_max_lifetime_seconds: u64,
    pub session_ttl_seconds: u64,
    pub paseto_access_key: [u8; 32],
    pub paseto_refresh_key: [u8; 32],
    pub access_ttl_minutes: u64,
    pub refresh_ttl_days: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:8080");
        let _parsed_http_addr = SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;

        Ok(Self {
            http_addr,
            database_url: env_or_placeholder("DATABASE_URL"),
            redis_url: env_or("REDIS_URL", "redis://127.0.0.1/"),
            map_api_key: env_or_placeholder("MAP_API_KEY"),
            db_max_connections: env_or_parse("DB_MAX_CONNECTIONS", "25")?,
            db_connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            db_idle_timeout_seconds: env_or_parse("DB_IDLE_TIMEOUT_SECONDS", "300")?,
            db_max_lifetime_seconds: env_or_parse("DB_MAX_LIFETIME_SECONDS", "1800")?,
            session_ttl_seconds: env_or_parse("SESSION_TTL_SECONDS", "86400")?,
            paseto_access_key: env_key_32("PASETO_ACCESS_KEY")?,
            paseto_refresh_key: env_key_32("PASETO_REFRESH_KEY")?,
            access_ttl_minutes: env_or_parse("ACCESS_TTL_MINUTES", "15")?,
            refresh_ttl_days: env_or_parse("REFRESH_TTL_DAYS", "30")?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_placeholder(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        tracing::warn!(key, "env var not set, using placeholder");
        format!("{}_{}", key, UNSET_PLACEHOLDER)
    })
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}

/// 32-byte base64 token key. A missing key is generated at startup so the
/// service still comes up; tokens then stop verifying across restarts,
/// which the warning calls out.
fn env_key_32(key: &str) -> Result<[u8; 32]> {
    let mut key_bytes = [0u8; 32];
    match std::env::var(key) {
        Ok(value) => {
            let decoded = STANDARD
                .decode(value.as_bytes())
                .map_err(|err| anyhow!("invalid {}: {}", key, err))?;
            if decoded.len() != 32 {
                return Err(anyhow!("invalid {}: expected 32 bytes", key));
            }
            key_bytes.copy_from_slice(&decoded);
        }
        Err(_) => {
            tracing::warn!(key, "env var not set, generating an ephemeral key");
            rand::rngs::OsRng.fill_bytes(&mut key_bytes);
        }
    }
    Ok(key_bytes)
}
