use std::fmt;
use std::path::PathBuf;

/// Which persistence strategy the board runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// JSON slot on this machine only.
    Local,
    /// Shared PostgreSQL store with live updates.
    Live,
    /// In-process live store; demo and tests.
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "live" | "postgres" => Ok(BackendKind::Live),
            "memory" => Ok(BackendKind::Memory),
            other => Err(ConfigError::Invalid("OPINION_BACKEND", other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid(key, value) => write!(f, "invalid value for {key}: '{value}'"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub backend: BackendKind,
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
    /// Cookie signing key material; `None` means generate one per run.
    pub session_key: Option<String>,
}

/// Minimum key material actix-session accepts.
pub const SESSION_KEY_MIN_BYTES: usize = 64;

impl AppConfig {
    /// Read configuration from the process environment, after loading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("OPINION_BACKEND") {
            Some(v) => v.parse()?,
            None => BackendKind::Local,
        };

        let database_url = get("DATABASE_URL");
        if backend == BackendKind::Live && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let session_key = match get("SESSION_KEY") {
            Some(val) if val.len() >= SESSION_KEY_MIN_BYTES => Some(val),
            Some(val) => {
                log::warn!(
                    "SESSION_KEY too short ({} bytes, need {SESSION_KEY_MIN_BYTES}+), generating random key",
                    val.len()
                );
                None
            }
            None => None,
        };

        Ok(AppConfig {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            backend,
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string())),
            database_url,
            session_key,
        })
    }
}
