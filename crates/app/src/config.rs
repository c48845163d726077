//! Runtime configuration loaded from environment variables

use aimi_core::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// SQLite file holding the remembered session
pub const DATABASE_FILE: &str = "aimi.db";

/// Which backend serves auth and loyalty data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Built-in demo data, nothing leaves the process
    Mock,
    /// External auth + REST service
    Remote,
}

impl BackendKind {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(BackendKind::Mock),
            "remote" => Ok(BackendKind::Remote),
            other => Err(Error::Config(format!(
                "AIMI_BACKEND must be 'mock' or 'remote', got '{}'",
                other
            ))),
        }
    }
}

/// Settings only the remote backend needs
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub anon_key: String,
    /// Where the password reset email sends the user
    pub reset_redirect: String,
    pub request_timeout: Duration,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendKind,
    pub data_dir: PathBuf,
    /// Present exactly when `backend` is [`BackendKind::Remote`]
    pub remote: Option<RemoteConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                                |
    /// |-----------------------------|----------------------------------------|
    /// | `AIMI_BACKEND`              | `mock`                                 |
    /// | `AIMI_BACKEND_URL`          | required for `remote`                  |
    /// | `AIMI_ANON_KEY`             | required for `remote`                  |
    /// | `AIMI_DATA_DIR`             | `<local data dir>/AimiPoint`           |
    /// | `AIMI_RESET_REDIRECT`       | `http://localhost:5173/reset-password` |
    /// | `AIMI_REQUEST_TIMEOUT_SECS` | `30`                                   |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an arbitrary variable source
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let backend = match var("AIMI_BACKEND") {
            Some(raw) => BackendKind::parse(&raw)?,
            None => BackendKind::Mock,
        };

        let data_dir = var("AIMI_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let remote = match backend {
            BackendKind::Mock => None,
            BackendKind::Remote => {
                let base_url = var("AIMI_BACKEND_URL").ok_or_else(|| {
                    Error::Config("AIMI_BACKEND_URL is required for the remote backend".into())
                })?;
                let anon_key = var("AIMI_ANON_KEY").ok_or_else(|| {
                    Error::Config("AIMI_ANON_KEY is required for the remote backend".into())
                })?;
                let reset_redirect = var("AIMI_RESET_REDIRECT")
                    .unwrap_or_else(|| "http://localhost:5173/reset-password".into());

                let timeout_secs: u64 = var("AIMI_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|| "30".into())
                    .trim()
                    .parse()
                    .map_err(|_| {
                        Error::Config("AIMI_REQUEST_TIMEOUT_SECS must be a valid u64".into())
                    })?;
                if timeout_secs == 0 {
                    return Err(Error::Config(
                        "AIMI_REQUEST_TIMEOUT_SECS must be greater than zero".into(),
                    ));
                }

                Some(RemoteConfig {
                    base_url: base_url.trim().to_string(),
                    anon_key: anon_key.trim().to_string(),
                    reset_redirect,
                    request_timeout: Duration::from_secs(timeout_secs),
                })
            }
        };

        Ok(Self {
            backend,
            data_dir,
            remote,
        })
    }

    /// Path of the local session database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn default_data_dir() -> PathBuf {
    dirs_next::data_local_dir()
        .map(|p| p.join("AimiPoint"))
        .unwrap_or_else(|| PathBuf::from("."))
}
