//! Backend talking to the hosted auth + table service

use super::Backend;
use crate::config::RemoteConfig;
use aimi_core::{Credentials, Error, PointsRecord, Result, Reward, Theme, User};
use aimi_networking::{api, AimiClient};
use aimi_persistence::cache::CatalogCache;
use aimi_persistence::{sqlite, Database, SessionEncryptor};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

struct ActiveSession {
    client: AimiClient,
    stored_id: Option<i64>,
}

/// Remote backend with a locally remembered, encrypted session
pub struct RemoteBackend {
    client: AimiClient,
    session: RwLock<Option<ActiveSession>>,
    db: Database,
    encryptor: SessionEncryptor,
    reset_redirect: String,
}

impl RemoteBackend {
    pub fn new(config: &RemoteConfig, db: Database, encryptor: SessionEncryptor) -> Result<Self> {
        let client = AimiClient::new_with_cache(
            &config.base_url,
            &config.anon_key,
            config.request_timeout,
            Arc::new(CatalogCache::default()),
        )?;

        Ok(Self {
            client,
            session: RwLock::new(None),
            db,
            encryptor,
            reset_redirect: config.reset_redirect.clone(),
        })
    }

    /// Client authorized as the signed-in user
    async fn authed(&self) -> Result<AimiClient> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.client.clone())
            .ok_or(Error::NotLoggedIn)
    }

    /// Authorized client when signed in, anonymous otherwise
    async fn reader(&self) -> AimiClient {
        match self.authed().await {
            Ok(client) => client,
            Err(_) => self.client.clone(),
        }
    }

    async fn forget_stored(&self, id: i64) {
        if let Err(e) = sqlite::delete_session(self.db.pool(), id).await {
            error!("Failed to delete stored session {}: {}", id, e);
        }
    }
}

fn token_expiry(expires_at: Option<i64>, expires_in: i64) -> Option<DateTime<Utc>> {
    match expires_at {
        Some(ts) => DateTime::<Utc>::from_timestamp(ts, 0),
        None if expires_in > 0 => Some(Utc::now() + ChronoDuration::seconds(expires_in)),
        None => None,
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn current_session(&self) -> Result<Option<User>> {
        let Some(stored) = sqlite::get_active_session(self.db.pool()).await? else {
            debug!("No stored session");
            return Ok(None);
        };

        if stored.is_expired(Utc::now()) {
            info!("Stored session for {} has expired", stored.user_id);
            self.forget_stored(stored.id).await;
            return Ok(None);
        }

        let token = match sqlite::get_session_token(self.db.pool(), &self.encryptor, stored.id).await
        {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(None),
            Err(Error::EncryptionError(e)) => {
                warn!(
                    "Stored session {} cannot be opened, token may be from another machine or row: {}",
                    stored.id, e
                );
                self.forget_stored(stored.id).await;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let client = self.client.with_access_token(&token);
        match api::restore_session(&client).await {
            Ok(user) => {
                sqlite::update_last_verified(self.db.pool(), stored.id).await?;
                info!("Restored session for {}", user.username);

                *self.session.write().await = Some(ActiveSession {
                    client,
                    stored_id: Some(stored.id),
                });
                Ok(Some(user))
            }
            Err(Error::TokenExpired) => {
                info!("Stored token for {} was rejected", stored.user_id);
                self.forget_stored(stored.id).await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<User> {
        let (grant, user) =
            api::sign_in(&self.client, &credentials.identifier, &credentials.password).await?;

        let client = self.client.with_access_token(&grant.access_token);
        let expires_at = token_expiry(grant.expires_at, grant.expires_in);

        // A session that fails to persist still works until exit
        let stored_id = match sqlite::save_session(
            self.db.pool(),
            &self.encryptor,
            &grant.user.id,
            grant.user.email.as_deref(),
            &grant.access_token,
            expires_at,
        )
        .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Failed to remember session: {}", e);
                None
            }
        };

        *self.session.write().await = Some(ActiveSession { client, stored_id });
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        let active = self.session.write().await.take();

        let cleared = sqlite::clear_sessions(self.db.pool()).await?;
        debug!("Cleared {} stored session(s)", cleared);

        match active {
            Some(session) => {
                if let Some(id) = session.stored_id {
                    debug!("Signing out stored session {}", id);
                }
                session.client.sign_out().await
            }
            None => Ok(()),
        }
    }

    async fn request_password_reset(&self, contact: &str) -> Result<String> {
        api::request_password_reset(&self.client, contact, &self.reset_redirect).await?;
        Ok("Password reset instructions have been sent to your email".to_string())
    }

    async fn rewards_for(&self, user: &User) -> Result<Vec<Reward>> {
        self.authed().await?.get_user_rewards(&user.id).await
    }

    async fn themes(&self) -> Result<Vec<Theme>> {
        self.reader().await.get_themes().await
    }

    async fn theme_for_level(&self, level: u32) -> Result<Option<Theme>> {
        self.reader().await.get_theme_for_level(level).await
    }

    async fn redeem(&self, user_id: &str, reward_id: &str) -> Result<DateTime<Utc>> {
        let client = self.authed().await?;
        api::redeem_reward(&client, user_id, reward_id).await
    }

    async fn points_history(&self) -> Result<Vec<PointsRecord>> {
        self.reader().await.get_points_history().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry_prefers_absolute_timestamp() {
        let at = token_expiry(Some(1_700_000_000), 3600).unwrap();
        assert_eq!(at.timestamp(), 1_700_000_000);

        let relative = token_expiry(None, 3600).unwrap();
        assert!(relative > Utc::now());

        assert!(token_expiry(None, 0).is_none());
    }
}
