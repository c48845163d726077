//! Data sources behind the controller
//!
//! [`MockBackend`] serves the built-in demo catalog; [`RemoteBackend`] talks to
//! the external auth + REST service and remembers the session locally.

mod mock;
mod remote;

pub use mock::MockBackend;
pub use remote::RemoteBackend;

use crate::config::{AppConfig, BackendKind};
use aimi_core::{Credentials, Error, PointsRecord, Result, Reward, Theme, User};
use aimi_persistence::{derive_machine_key, Database, SessionEncryptor};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// Everything the controller needs from a data source
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// The user of a still-valid earlier sign-in, if any
    async fn current_session(&self) -> Result<Option<User>>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<User>;

    async fn sign_out(&self) -> Result<()>;

    /// Start a password reset; returns the confirmation text to show
    async fn request_password_reset(&self, contact: &str) -> Result<String>;

    /// Rewards with the per-user status of `user`
    async fn rewards_for(&self, user: &User) -> Result<Vec<Reward>>;

    /// Full theme list ordered by start level
    async fn themes(&self) -> Result<Vec<Theme>>;

    async fn theme_for_level(&self, level: u32) -> Result<Option<Theme>>;

    /// Mark a reward redeemed for a user; returns the recorded timestamp
    async fn redeem(&self, user_id: &str, reward_id: &str) -> Result<DateTime<Utc>>;

    /// Points ledger, newest first
    async fn points_history(&self) -> Result<Vec<PointsRecord>>;
}

/// Build the backend selected by `config`
pub async fn build_backend(config: &AppConfig) -> Result<Arc<dyn Backend>> {
    match config.backend {
        BackendKind::Mock => {
            info!("Using built-in demo backend");
            Ok(Arc::new(MockBackend::new()))
        }
        BackendKind::Remote => {
            let remote = config
                .remote
                .as_ref()
                .ok_or_else(|| Error::Config("remote backend selected without settings".into()))?;

            let db_path = config.database_path();
            let db = Database::connect(&db_path).await?;
            info!("Session store at {}", db_path.display());

            let key = derive_machine_key()?;
            let encryptor = SessionEncryptor::new(&key);

            let backend = RemoteBackend::new(remote, db, encryptor)?;
            info!("Using remote backend at {}", remote.base_url);
            Ok(Arc::new(backend))
        }
    }
}
