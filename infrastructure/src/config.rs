use domain::errors::ConfigError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Env files read before the process environment. Missing files are ignored
/// and variables already set in the environment win.
const ENV_FILES: [&str; 2] = ["scripts/.env", ".env"];

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub vector_db_dir: PathBuf,
    pub connect_timeout: Duration,
}

impl Config {
    /// Reads env files, then the environment. Fails when the credential is absent.
    pub fn load() -> Result<Self, ConfigError> {
        for path in ENV_FILES {
            dotenvy::from_filename(path).ok();
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get(API_KEY_VAR).ok_or(ConfigError::MissingCredential(API_KEY_VAR))?;

        let connect_timeout = match get("HTTP_CONNECT_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: "HTTP_CONNECT_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(10),
        };

        Ok(Self {
            api_key,
            base_url: get("GEMINI_BASE_URL")
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
            chat_model: get("GEMINI_CHAT_MODEL")
                .unwrap_or_else(|| "models/gemini-pro-latest".to_string()),
            embedding_model: get("GEMINI_EMBEDDING_MODEL")
                .unwrap_or_else(|| "models/embedding-001".to_string()),
            vector_db_dir: get("VECTOR_DB_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("vector_db")),
            connect_timeout,
        })
    }
}
