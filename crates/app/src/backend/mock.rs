//! In-memory backend serving the built-in demo catalog

use super::Backend;
use aimi_core::{
    apply_redemption, catalog, theme_for_level, Credentials, Error, PointsRecord, RedeemOutcome,
    Result, Reward, Theme, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

struct MockState {
    session: Option<User>,
    rewards: Vec<Reward>,
}

/// Demo backend: one user, the built-in themes, and a mutable reward table.
///
/// Accepts `aimi_user` / `password` only.
pub struct MockBackend {
    state: RwLock<MockState>,
    themes: Vec<Theme>,
    latency: Duration,
    offline: AtomicBool,
    redeem_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MockState {
                session: None,
                rewards: catalog::rewards(),
            }),
            themes: catalog::themes(),
            latency: Duration::ZERO,
            offline: AtomicBool::new(false),
            redeem_calls: AtomicUsize::new(0),
        }
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every call fail as if the service were unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of redeem requests received so far
    pub fn redeem_calls(&self) -> usize {
        self.redeem_calls.load(Ordering::SeqCst)
    }

    /// Current reward table (as stored, independent of any controller state)
    pub async fn stored_rewards(&self) -> Vec<Reward> {
        self.state.read().await.rewards.clone()
    }

    async fn round_trip(&self) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::NetworkError("demo backend is offline".to_string()));
        }
        Ok(())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn current_session(&self) -> Result<Option<User>> {
        self.round_trip().await?;
        Ok(self.state.read().await.session.clone())
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<User> {
        self.round_trip().await?;

        if credentials.identifier.trim() != catalog::DEMO_USERNAME
            || credentials.password != catalog::DEMO_PASSWORD
        {
            debug!("Rejected demo sign-in for '{}'", credentials.identifier);
            return Err(Error::InvalidCredentials);
        }

        let user = catalog::demo_user();
        self.state.write().await.session = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        self.round_trip().await?;
        self.state.write().await.session = None;
        Ok(())
    }

    async fn request_password_reset(&self, contact: &str) -> Result<String> {
        self.round_trip().await?;

        let contact = contact.trim();
        if contact.is_empty() {
            return Err(Error::InvalidData("Mobile number is required".to_string()));
        }
        info!("Demo password reset requested for {}", contact);
        Ok(format!("Password reset link sent to {}", contact))
    }

    async fn rewards_for(&self, user: &User) -> Result<Vec<Reward>> {
        self.round_trip().await?;
        debug!("Serving demo rewards for {}", user.id);
        Ok(self.state.read().await.rewards.clone())
    }

    async fn themes(&self) -> Result<Vec<Theme>> {
        self.round_trip().await?;
        Ok(self.themes.clone())
    }

    async fn theme_for_level(&self, level: u32) -> Result<Option<Theme>> {
        self.round_trip().await?;
        Ok(theme_for_level(level, &self.themes).cloned())
    }

    async fn redeem(&self, user_id: &str, reward_id: &str) -> Result<DateTime<Utc>> {
        self.redeem_calls.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;

        let mut state = self.state.write().await;
        match apply_redemption(&mut state.rewards, reward_id)? {
            RedeemOutcome::Redeemed(reward) => {
                info!("Demo reward '{}' redeemed by {}", reward.name, user_id)
            }
            RedeemOutcome::AlreadyRedeemed(reward) => {
                debug!("Demo reward '{}' was already redeemed", reward.name)
            }
        }
        Ok(Utc::now())
    }

    async fn points_history(&self) -> Result<Vec<PointsRecord>> {
        self.round_trip().await?;
        Ok(catalog::points_history())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimi_core::RewardStatus;

    #[tokio::test]
    async fn test_demo_credentials() {
        let backend = MockBackend::new();
        assert!(backend.current_session().await.unwrap().is_none());

        let err = backend
            .sign_in(&Credentials::new("aimi_user", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid username or password");

        let user = backend
            .sign_in(&Credentials::new("aimi_user", "password"))
            .await
            .unwrap();
        assert_eq!(user.level, 15);
        assert_eq!(user.points, 25);
        assert_eq!(backend.current_session().await.unwrap(), Some(user));

        backend.sign_out().await.unwrap();
        assert!(backend.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_redeem_updates_table() {
        let backend = MockBackend::new();
        let available = catalog::rewards()
            .into_iter()
            .find(|r| r.status == RewardStatus::Available)
            .unwrap();

        backend.redeem("1", &available.id).await.unwrap();
        let stored = backend.stored_rewards().await;
        let after = stored.iter().find(|r| r.id == available.id).unwrap();
        assert_eq!(after.status, RewardStatus::Redeemed);

        // Redeeming again is accepted and changes nothing
        backend.redeem("1", &available.id).await.unwrap();
        assert_eq!(backend.stored_rewards().await, stored);
        assert_eq!(backend.redeem_calls(), 2);
    }

    #[tokio::test]
    async fn test_reset_message_and_offline() {
        let backend = MockBackend::new();
        assert_eq!(
            backend.request_password_reset("+62123456789").await.unwrap(),
            "Password reset link sent to +62123456789"
        );
        assert!(backend.request_password_reset("  ").await.is_err());

        backend.set_offline(true);
        assert!(matches!(
            backend.themes().await.unwrap_err(),
            Error::NetworkError(_)
        ));
    }
}
