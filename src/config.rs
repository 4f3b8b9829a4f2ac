use std::env;
use chrono::{Duration, Utc};

use crate::error::AppError;

const DEV_SESSION_SECRET: &str = "supersecret";
const MAX_SESSION_TTL_DAYS: i64 = 365;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub app_env: AppEnv,
    pub mongodb_uri: String,
    pub mongodb_name: String,
    pub json_body_limit: usize,
    pub cors: CorsConfig,
    pub session: SessionConfig,
    pub top_tokens: TopTokensConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEnv {
    Development,
    Production,
    Test,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secret: String,
    pub ttl: Duration,
    pub secure: bool,
}

#[derive(Debug, Clone)]
pub struct TopTokensConfig {
    /// Cron expression, `*/N * * * *` form.
    pub schedule: String,
    pub symbols: Vec<String>,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".into()],
            allowed_methods: split_list("GET,POST,PUT,DELETE,OPTIONS"),
            allowed_headers: split_list("Origin,Content-Type,Accept,Authorization"),
            allow_credentials: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "user_sid".into(),
            secret: DEV_SESSION_SECRET.into(),
            ttl: Duration::hours(24),
            secure: false,
        }
    }
}

impl Default for TopTokensConfig {
    fn default() -> Self {
        Self {
            schedule: "*/10 * * * *".into(),
            symbols: split_list("BTC-USDT,ETH-USDT,BNB-USDT,SOL-USDT,XRP-USDT"),
            max_retries: 3,
            retry_backoff: Duration::seconds(5),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source. `from_env` passes
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server config
        let port = lookup("PORT")
            .unwrap_or_else(|| "4000".into())
            .parse::<u16>()
            .map_err(|_| AppError::ConfigError("Invalid PORT".into()))?;

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let app_env_str = lookup("APP_ENV").unwrap_or_else(|| "development".into());
        let app_env = match app_env_str.to_lowercase().as_str() {
            "production" => AppEnv::Production,
            "test" => AppEnv::Test,
            _ => AppEnv::Development,
        };

        let json_body_limit = match lookup("JSON_BODY_LIMIT") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| AppError::ConfigError("Invalid JSON_BODY_LIMIT".into()))?,
            None => 100 * 1024,
        };

        // MongoDB config
        let mongodb_uri = lookup("MONGODB_URI")
            .ok_or_else(|| AppError::ConfigError("MONGODB_URI must be set".into()))?;

        let mongodb_name = lookup("MONGODB_NAME")
            .ok_or_else(|| AppError::ConfigError("MONGODB_NAME must be set".into()))?;

        // CORS config
        let defaults = CorsConfig::default();
        let cors = CorsConfig {
            allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.allowed_origins),
            allowed_methods: lookup("CORS_ALLOWED_METHODS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.allowed_methods),
            allowed_headers: lookup("CORS_ALLOWED_HEADERS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.allowed_headers),
            allow_credentials: parse_bool(lookup("CORS_ALLOW_CREDENTIALS"), defaults.allow_credentials)
                .map_err(|_| AppError::ConfigError("Invalid CORS_ALLOW_CREDENTIALS".into()))?,
        };
        if cors.allowed_origins.is_empty() {
            return Err(AppError::ConfigError("CORS_ALLOWED_ORIGINS must not be empty".into()));
        }
        if cors.allowed_methods.is_empty() {
            return Err(AppError::ConfigError("CORS_ALLOWED_METHODS must not be empty".into()));
        }

        // Session config
        let secret = match lookup("SESSION_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ if app_env == AppEnv::Production => {
                return Err(AppError::ConfigError("SESSION_SECRET must be set in production".into()));
            }
            _ => {
                tracing::warn!("SESSION_SECRET not set, using the development placeholder");
                DEV_SESSION_SECRET.into()
            }
        };

        let session_ttl_str = lookup("SESSION_TTL").unwrap_or_else(|| "24h".into());
        let ttl = parse_duration(&session_ttl_str)
            .map_err(|_| AppError::ConfigError("Invalid SESSION_TTL format".into()))?;
        if ttl <= Duration::zero() || ttl > Duration::days(MAX_SESSION_TTL_DAYS) {
            return Err(AppError::ConfigError(format!(
                "SESSION_TTL must be positive and at most {}d",
                MAX_SESSION_TTL_DAYS
            )));
        }
        let session = SessionConfig {
            cookie_name: lookup("SESSION_COOKIE_NAME").unwrap_or_else(|| "user_sid".into()),
            secret,
            ttl,
            secure: parse_bool(lookup("SESSION_COOKIE_SECURE"), false)
                .map_err(|_| AppError::ConfigError("Invalid SESSION_COOKIE_SECURE".into()))?,
        };

        // Top token refresh config
        let defaults = TopTokensConfig::default();
        let max_retries = match lookup("TOP_TOKENS_MAX_RETRIES") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| AppError::ConfigError("Invalid TOP_TOKENS_MAX_RETRIES".into()))?,
            None => defaults.max_retries,
        };
        let retry_backoff = match lookup("TOP_TOKENS_RETRY_BACKOFF") {
            Some(raw) => parse_duration(&raw)
                .map_err(|_| AppError::ConfigError("Invalid TOP_TOKENS_RETRY_BACKOFF format".into()))?,
            None => defaults.retry_backoff,
        };
        let top_tokens = TopTokensConfig {
            schedule: lookup("TOP_TOKENS_SCHEDULE").unwrap_or(defaults.schedule),
            symbols: lookup("TOP_TOKENS_SYMBOLS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.symbols),
            max_retries,
            retry_backoff,
        };

        Ok(Self {
            port,
            host,
            app_env,
            mongodb_uri,
            mongodb_name,
            json_body_limit,
            cors,
            session,
            top_tokens,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(raw: Option<String>, default: bool) -> Result<bool, &'static str> {
    match raw.as_deref().map(str::trim) {
        None => Ok(default),
        Some("true") | Some("1") | Some("yes") => Ok(true),
        Some("false") | Some("0") | Some("no") => Ok(false),
        Some(_) => Err("Expected a boolean"),
    }
}

pub fn parse_duration(duration_str: &str) -> Result<Duration, &'static str> {
    let duration_str = duration_str.trim();

    if duration_str.is_empty() {
        return Err("Duration string is empty");
    }

    // Extract the number and unit parts
    let len = duration_str.len();
    let (num_part, unit_part) = duration_str.split_at(
        duration_str
            .chars()
            .position(|c| !c.is_ascii_digit())
            .unwrap_or(len)
    );

    let num = num_part.parse::<i64>().map_err(|_| "Invalid number")?;

    let duration = match unit_part {
        "s" => Duration::try_seconds(num),
        "m" => Duration::try_minutes(num),
        "h" => Duration::try_hours(num),
        "d" => Duration::try_days(num),
        _ => return Err("Unknown time unit, use s, m, h, or d"),
    };

    // Anything that cannot be added to the current time is unusable
    duration
        .filter(|d| Utc::now().checked_add_signed(*d).is_some())
        .ok_or("Duration out of range")
}
