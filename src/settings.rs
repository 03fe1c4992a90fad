use config::{Config, ConfigError, Environment, File};
use dotenv::dotenv;
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use std::{env, fmt, str::FromStr, time::Duration};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

/// Where revoked refresh-token identifiers are kept.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DenylistBackend {
    Redis,
    /// Process-local map. Not shared between instances.
    Memory,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: Algorithm,

    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_minutes: i64,

    #[serde(default = "default_refresh_expiration")]
    pub refresh_token_exp_days: i64,

    #[serde(default = "default_denylist_backend")]
    pub denylist_backend: DenylistBackend,

    /// Full connection URL; takes precedence over the individual redis_* fields.
    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_redis_host")]
    pub redis_host: String,

    #[serde(default = "default_redis_port")]
    pub redis_port: u16,

    #[serde(default)]
    pub redis_db: i64,

    #[serde(default)]
    pub redis_password: Option<String>,

    #[serde(default = "default_redis_timeout_ms")]
    pub redis_timeout_ms: u64,

    #[serde(default = "default_password_memory_kib")]
    pub password_memory_kib: u32,

    #[serde(default = "default_password_iterations")]
    pub password_iterations: u32,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

const MAX_ACCESS_MINUTES: i64 = 24 * 60;
const MAX_REFRESH_DAYS: i64 = 365;

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Storefront-API".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_jwt_algorithm() -> Algorithm {
    Algorithm::HS256
}
fn default_jwt_expiration() -> i64 {
    15
}
fn default_refresh_expiration() -> i64 {
    7
}
fn default_denylist_backend() -> DenylistBackend {
    DenylistBackend::Redis
}
fn default_redis_host() -> String {
    "localhost".to_string()
}
fn default_redis_port() -> u16 {
    6379
}
fn default_redis_timeout_ms() -> u64 {
    2_000
}
fn default_password_memory_kib() -> u32 {
    15_000
}
fn default_password_iterations() -> u32 {
    2
}
fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .try_parsing(true)
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // The signing secret has no default; JWT_SECRET_KEY is accepted as a fallback name.
        config.database_url = fill_or_env(config.database_url, &["APP_DATABASE_URL", "DATABASE_URL"])?;
        config.jwt_secret = fill_or_env(config.jwt_secret, &["APP_JWT_SECRET", "JWT_SECRET_KEY"])?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty");
        }
        if self.jwt_secret.len() < 32 {
            errors.push("JWT_SECRET must be at least 32 characters");
        }
        if !matches!(self.jwt_algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            errors.push("JWT_ALGORITHM must be one of HS256, HS384, HS512");
        }
        if self.jwt_expiration_minutes <= 0 || self.jwt_expiration_minutes > MAX_ACCESS_MINUTES {
            errors.push("JWT_EXPIRATION_MINUTES must be between 1 and 1440");
        }
        if self.refresh_token_exp_days <= 0 || self.refresh_token_exp_days > MAX_REFRESH_DAYS {
            errors.push("REFRESH_TOKEN_EXP_DAYS must be between 1 and 365");
        }
        if self.redis_timeout_ms == 0 {
            errors.push("REDIS_TIMEOUT_MS must be positive");
        }
        if self.password_iterations == 0 {
            errors.push("PASSWORD_ITERATIONS must be positive");
        }
        if self.is_production() && self.denylist_backend == DenylistBackend::Memory {
            errors.push("In-memory denylist is not allowed in production");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn redis_connection_url(&self) -> String {
        if let Some(url) = self.redis_url.as_ref().filter(|u| !u.trim().is_empty()) {
            return url.clone();
        }

        match self.redis_password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.redis_host, self.redis_port, self.redis_db
            ),
            None => format!("redis://{}:{}/{}", self.redis_host, self.redis_port, self.redis_db),
        }
    }

    pub fn redis_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_timeout_ms)
    }
}

fn fill_or_env(current: String, env_keys: &[&str]) -> Result<String, ConfigError> {
    if !current.trim().is_empty() {
        return Ok(current);
    }

    env_keys
        .iter()
        .find_map(|key| env::var(key).ok().filter(|v| !v.trim().is_empty()))
        .ok_or_else(|| ConfigError::Message(format!("{} must be set", env_keys[0])))
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else if self.len() < 32 {
            "[TOO_SHORT]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &"[REDACTED]")
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_secret", &self.jwt_secret.redact())
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_minutes", &self.jwt_expiration_minutes)
            .field("refresh_token_exp_days", &self.refresh_token_exp_days)
            .field("denylist_backend", &self.denylist_backend)
            .field("redis_host", &self.redis_host)
            .field("redis_port", &self.redis_port)
            .field("redis_db", &self.redis_db)
            .field("redis_password", &self.redis_password.as_ref().map(|_| "[REDACTED]"))
            .field("redis_timeout_ms", &self.redis_timeout_ms)
            .field("password_memory_kib", &self.password_memory_kib)
            .field("password_iterations", &self.password_iterations)
            .field("log_format", &self.log_format)
            .finish()
    }
}
