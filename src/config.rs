/*
 * Responsibility
 * - 環境変数 (.env 含む) からの設定読み込み
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Upper bound for JWT_TTL_SECONDS / JWT_LEEWAY_SECONDS (100 years).
pub const MAX_TOKEN_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub jwt_sign_key: String,
    // 0 = no expiration embedded
    pub jwt_ttl_seconds: u64,
    pub jwt_leeway_seconds: u64,

    pub request_timeout: Duration,
    pub max_request_body_bytes: usize,
    pub enable_request_log: bool,
    pub enable_test_route: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the signing key
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("jwt_ttl_seconds", &self.jwt_ttl_seconds)
            .field("jwt_leeway_seconds", &self.jwt_leeway_seconds)
            .field("request_timeout", &self.request_timeout)
            .field("max_request_body_bytes", &self.max_request_body_bytes)
            .field("enable_request_log", &self.enable_request_log)
            .field("enable_test_route", &self.enable_test_route)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host: IpAddr = match lookup("HOST") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("HOST"))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let port: u16 = parse_or(&lookup, "PORT", 8000)?;
        let addr = SocketAddr::new(host, port);

        let app_env = lookup("APP_ENV")
            .map(|v| AppEnv::parse(&v))
            .unwrap_or(AppEnv::Development);

        let jwt_sign_key = lookup("JWT_SIGN_KEY").ok_or(ConfigError::Missing("JWT_SIGN_KEY"))?;
        if jwt_sign_key.is_empty() {
            return Err(ConfigError::Invalid("JWT_SIGN_KEY"));
        }

        Ok(Self {
            addr,
            app_env,
            jwt_sign_key,
            jwt_ttl_seconds: token_seconds(&lookup, "JWT_TTL_SECONDS")?,
            jwt_leeway_seconds: token_seconds(&lookup, "JWT_LEEWAY_SECONDS")?,
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?),
            max_request_body_bytes: parse_or(&lookup, "MAX_REQUEST_BODY_BYTES", 1024 * 1024)?,
            enable_request_log: parse_or(&lookup, "ENABLE_REQUEST_LOG", true)?,
            enable_test_route: parse_or(&lookup, "ENABLE_TEST_ROUTE", false)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn token_seconds<F>(lookup: &F, key: &'static str) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let seconds: u64 = parse_or(lookup, key, 0)?;
    if seconds > MAX_TOKEN_SECONDS {
        return Err(ConfigError::Invalid(key));
    }
    Ok(seconds)
}
