use std::{env, str::FromStr, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub guest_ttl_hours: i64,
    pub guest_purge_interval: Duration,
    pub identity: IdentityConfig,
    pub notify_queue_capacity: usize,
    pub payment_http_timeout: Duration,
    /// Comma-separated origins; unset means any origin.
    pub cors_allowed_origins: Option<String>,
    pub max_body_bytes: usize,
    pub max_concurrency: usize,
    pub tap: TapConfig,
    pub telr: TelrConfig,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub jwt_secret: String,
    pub audience: String,
}

#[derive(Debug, Clone)]
pub struct TapConfig {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_url: String,
    pub currency: String,
    pub post_url: Option<String>,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelrConfig {
    pub store_id: Option<i64>,
    pub auth_key: Option<String>,
    pub api_url: Option<String>,
    pub mode: TelrMode,
    pub currency: String,
    pub webhook_secret: Option<String>,
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
    pub cancel_url: Option<String>,
}

/// Telr flags sandbox traffic with `test = 1` and sends unsigned callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelrMode {
    Live,
    Sandbox,
}

impl TelrMode {
    fn from_env_value(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "sandbox" | "dev" => TelrMode::Sandbox,
            _ => TelrMode::Live,
        }
    }

    pub fn test_flag(self) -> i32 {
        match self {
            TelrMode::Live => 0,
            TelrMode::Sandbox => 1,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parsed_or("APP_PORT", 3000);

        let identity = IdentityConfig {
            jwt_secret: env::var("IDENTITY_JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("IDENTITY_JWT_SECRET is not set"))?,
            audience: env::var("IDENTITY_AUDIENCE")
                .map_err(|_| anyhow::anyhow!("IDENTITY_AUDIENCE is not set"))?,
        };

        let tap = TapConfig {
            secret_key: optional("TAP_SECRET_KEY"),
            webhook_secret: optional("TAP_WEBHOOK_SECRET"),
            api_url: env::var("TAP_API_URL")
                .unwrap_or_else(|_| "https://api.tap.company/v2".to_string()),
            currency: env::var("TAP_CURRENCY").unwrap_or_else(|_| "SAR".to_string()),
            post_url: optional("TAP_POST_URL"),
            redirect_url: optional("TAP_REDIRECT_URL"),
        };

        let telr = TelrConfig {
            store_id: optional("TELR_STORE_ID").and_then(|v| v.parse().ok()),
            auth_key: optional("TELR_AUTH_KEY"),
            api_url: optional("TELR_API_URL"),
            mode: TelrMode::from_env_value(&env::var("TELR_MODE").unwrap_or_default()),
            currency: env::var("TELR_CURRENCY").unwrap_or_else(|_| "SAR".to_string()),
            webhook_secret: optional("TELR_WEBHOOK_SECRET"),
            success_url: optional("TELR_SUCCESS_URL"),
            failure_url: optional("TELR_FAILURE_URL"),
            cancel_url: optional("TELR_CANCEL_URL"),
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            session_ttl_hours: parsed_or("SESSION_TTL_HOURS", 24),
            guest_ttl_hours: parsed_or("GUEST_TTL_HOURS", 24),
            guest_purge_interval: Duration::from_secs(
                parsed_or::<u64>("GUEST_PURGE_INTERVAL_SECS", 3600).max(60),
            ),
            identity,
            notify_queue_capacity: parsed_or("NOTIFY_QUEUE_CAPACITY", 16),
            payment_http_timeout: Duration::from_secs(parsed_or("PAYMENT_HTTP_TIMEOUT_SECS", 15)),
            cors_allowed_origins: optional("CORS_ALLOWED_ORIGINS"),
            max_body_bytes: parsed_or("MAX_BODY_BYTES", 1024 * 1024),
            max_concurrency: parsed_or("MAX_CONCURRENCY", 100),
            tap,
            telr,
        })
    }
}

impl AppConfig {
    /// Settings for running against a local database without gateways.
    pub fn local(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            jwt_secret: "local-session-secret".to_string(),
            session_ttl_hours: 24,
            guest_ttl_hours: 24,
            guest_purge_interval: Duration::from_secs(3600),
            identity: IdentityConfig {
                jwt_secret: "local-identity-secret".to_string(),
                audience: "local-storefront".to_string(),
            },
            notify_queue_capacity: 16,
            payment_http_timeout: Duration::from_secs(15),
            cors_allowed_origins: None,
            max_body_bytes: 1024 * 1024,
            max_concurrency: 100,
            tap: TapConfig {
                secret_key: None,
                webhook_secret: None,
                api_url: "https://api.tap.company/v2".to_string(),
                currency: "SAR".to_string(),
                post_url: None,
                redirect_url: None,
            },
            telr: TelrConfig {
                store_id: None,
                auth_key: None,
                api_url: None,
                mode: TelrMode::Sandbox,
                currency: "SAR".to_string(),
                webhook_secret: None,
                success_url: None,
                failure_url: None,
                cancel_url: None,
            },
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
