//! Controller: every state transition of the app goes through here
//!
//! State sits behind a `tokio::sync::RwLock` and is never held across a
//! backend call. Backend data is fetched first, then written in one short
//! critical section.

use crate::backend::Backend;
use crate::state::{AppState, HomeState, Notice};
use crate::views::{Dashboard, RewardCard, ThemeSummary};
use aimi_core::{
    apply_redemption, check_redeemable, level_path, select_level, Credentials, Error, LevelNode,
    PointsRecord, RedeemOutcome, Result, Theme, User,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

const REDEEM_FAILED: &str = "Failed to redeem reward. Please try again.";

/// Drives the app against one backend
pub struct Controller<B: ?Sized = dyn Backend> {
    backend: Arc<B>,
    state: RwLock<AppState>,
    /// Reward ids with a redemption awaiting the backend
    in_flight: Mutex<HashSet<String>>,
}

/// Removes a reward id from the in-flight set when the redemption ends
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    reward_id: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(set: &'a Mutex<HashSet<String>>, reward_id: &str) -> Result<Self> {
        let mut ids = set.lock().unwrap_or_else(|e| e.into_inner());
        if !ids.insert(reward_id.to_string()) {
            return Err(Error::RedemptionInProgress(reward_id.to_string()));
        }
        Ok(Self {
            set,
            reward_id: reward_id.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut ids = self.set.lock().unwrap_or_else(|e| e.into_inner());
        ids.remove(&self.reward_id);
    }
}

/// Message for the login form
fn login_message(err: &Error) -> String {
    match err {
        Error::AuthenticationError(message) => message.clone(),
        other => other.to_string(),
    }
}

impl<B: Backend + ?Sized> Controller<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: RwLock::new(AppState::starting()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Copy of the whole state
    pub async fn snapshot(&self) -> AppState {
        self.state.read().await.clone()
    }

    // ─── Session ─────────────────────────────────────────────────────

    /// Initial session check. Returns the restored user, if any.
    pub async fn start(&self) -> Option<User> {
        self.state.write().await.loading = true;

        let restored = match self.backend.current_session().await {
            Ok(Some(user)) => {
                info!("Session restored for {}", user.username);
                self.enter_home(user.clone()).await;
                Some(user)
            }
            Ok(None) => {
                debug!("No session to restore");
                None
            }
            Err(e) => {
                error!("Session check error: {}", e);
                None
            }
        };

        self.state.write().await.loading = false;
        restored
    }

    /// Sign in and load the home screen
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        self.state.write().await.login_error = None;

        match self.backend.sign_in(credentials).await {
            Ok(user) => {
                info!("Logged in as {} via {}", user.username, self.backend.name());
                self.enter_home(user.clone()).await;
                Ok(user)
            }
            Err(e) => {
                warn!("Login failed: {}", e);
                self.state.write().await.login_error = Some(login_message(&e));
                Err(e)
            }
        }
    }

    /// Sign out. Local state is cleared even when the backend call fails.
    pub async fn logout(&self) {
        info!("Logging out");
        if let Err(e) = self.backend.sign_out().await {
            error!("Error signing out: {}", e);
        }

        *self.state.write().await = AppState::default();
    }

    /// Ask for a password reset; the confirmation also becomes the notice
    pub async fn request_password_reset(&self, contact: &str) -> Result<String> {
        match self.backend.request_password_reset(contact).await {
            Ok(message) => {
                let mut state = self.state.write().await;
                state.login_error = None;
                state.notice = Some(Notice::Info(message.clone()));
                Ok(message)
            }
            Err(e) => {
                warn!("Password reset failed: {}", e);
                self.state.write().await.login_error = Some(login_message(&e));
                Err(e)
            }
        }
    }

    async fn enter_home(&self, user: User) {
        let home = self.load_home(&user, user.level).await;
        let mut state = self.state.write().await;
        state.login_error = None;
        state.user = Some(user);
        state.home = Some(home);
    }

    /// Fetch everything the home screen shows. Failures fall back to empty.
    async fn load_home(&self, user: &User, level: u32) -> HomeState {
        let rewards = self.backend.rewards_for(user).await.unwrap_or_else(|e| {
            error!("Error fetching rewards: {}", e);
            Vec::new()
        });
        let themes = self.backend.themes().await.unwrap_or_else(|e| {
            error!("Error fetching themes: {}", e);
            Vec::new()
        });
        let current_theme = self.fetch_theme(level).await;

        HomeState {
            current_level: level,
            current_theme,
            themes,
            rewards,
        }
    }

    async fn fetch_theme(&self, level: u32) -> Option<Theme> {
        match self.backend.theme_for_level(level).await {
            Ok(theme) => theme,
            Err(e) => {
                error!("Error fetching theme for level {}: {}", level, e);
                None
            }
        }
    }

    // ─── Home ────────────────────────────────────────────────────────

    /// Move the path to `requested` if the user has reached it.
    ///
    /// Returns the level now being viewed.
    pub async fn select_level(&self, requested: u32) -> Result<u32> {
        let (user_level, current) = {
            let state = self.state.read().await;
            let user = state.user.as_ref().ok_or(Error::NotLoggedIn)?;
            let current = state.home.as_ref().map_or(user.level, |h| h.current_level);
            (user.level, current)
        };

        let selected = select_level(requested, user_level, current);
        if selected == current {
            if requested != current {
                debug!("Level {} is not reachable yet", requested);
            }
            return Ok(current);
        }

        let theme = self.fetch_theme(selected).await;
        let mut state = self.state.write().await;
        if let Some(home) = state.home.as_mut() {
            home.current_level = selected;
            home.current_theme = theme;
        }
        Ok(selected)
    }

    /// Reload rewards, themes and the viewed level's theme
    pub async fn refresh(&self) -> Result<()> {
        let (user, level) = {
            let state = self.state.read().await;
            let user = state.user.clone().ok_or(Error::NotLoggedIn)?;
            let level = state.home.as_ref().map_or(user.level, |h| h.current_level);
            (user, level)
        };

        let home = self.load_home(&user, level).await;
        let mut state = self.state.write().await;
        if state.user.as_ref().map(|u| &u.id) == Some(&user.id) {
            state.home = Some(home);
        }
        Ok(())
    }

    /// Redeem a reward.
    ///
    /// Only an Available reward reaches the backend. Redeeming one that is
    /// already Redeemed reports [`RedeemOutcome::AlreadyRedeemed`] without
    /// any call; a concurrent second request for the same reward fails with
    /// [`Error::RedemptionInProgress`]. The reward id is claimed before its
    /// status is read, so the check and the backend call never interleave
    /// with another redemption of the same reward.
    pub async fn redeem(&self, reward_id: &str) -> Result<RedeemOutcome> {
        let _guard = InFlightGuard::acquire(&self.in_flight, reward_id)?;

        let (user, reward) = {
            let state = self.state.read().await;
            let user = state.user.clone().ok_or(Error::NotLoggedIn)?;
            let rewards = state
                .home
                .as_ref()
                .map(|h| h.rewards.as_slice())
                .unwrap_or_default();

            let needs_call = check_redeemable(rewards, reward_id)?;
            let reward = rewards
                .iter()
                .find(|r| r.id == reward_id)
                .cloned()
                .ok_or_else(|| Error::RewardNotFound(reward_id.to_string()))?;
            if !needs_call {
                debug!("Reward {} already redeemed", reward_id);
                return Ok(RedeemOutcome::AlreadyRedeemed(reward));
            }
            (user, reward)
        };

        if user.level < reward.required_level {
            warn!(
                "Redeeming '{}' (level {}) for {} at level {}",
                reward.name, reward.required_level, user.username, user.level
            );
        }

        if let Err(e) = self.backend.redeem(&user.id, reward_id).await {
            error!("Error redeeming reward {}: {}", reward_id, e);
            self.state.write().await.notice = Some(Notice::Alert(REDEEM_FAILED.to_string()));
            return Err(e);
        }

        let mut state = self.state.write().await;
        let home = state.home.as_mut().ok_or(Error::NotLoggedIn)?;
        let outcome = apply_redemption(&mut home.rewards, reward_id)?;
        info!("Redeemed '{}' for {}", outcome.reward().name, user.username);
        state.notice = Some(Notice::Info(format!(
            "You've redeemed {}!",
            outcome.reward().name
        )));
        Ok(outcome)
    }

    /// Take the pending notice, leaving none
    pub async fn take_notice(&self) -> Option<Notice> {
        self.state.write().await.notice.take()
    }

    // ─── Views ───────────────────────────────────────────────────────

    pub async fn dashboard(&self) -> Option<Dashboard> {
        self.state.read().await.user.as_ref().map(Dashboard::for_user)
    }

    /// The 100-level path around the viewed level (empty when logged out)
    pub async fn level_path(&self) -> Vec<LevelNode> {
        let state = self.state.read().await;
        match state.home.as_ref() {
            Some(home) => level_path(&home.themes, home.current_level),
            None => Vec::new(),
        }
    }

    pub async fn theme_summary(&self) -> Option<ThemeSummary> {
        let state = self.state.read().await;
        let user = state.user.as_ref()?;
        let home = state.home.as_ref()?;
        Some(ThemeSummary::new(
            home.current_theme.as_ref(),
            home.current_level,
            user.level,
        ))
    }

    pub async fn reward_cards(&self) -> Vec<RewardCard> {
        let state = self.state.read().await;
        match (state.user.as_ref(), state.home.as_ref()) {
            (Some(user), Some(home)) => home
                .rewards
                .iter()
                .map(|r| RewardCard::new(r, user.level))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Points ledger, newest first
    pub async fn points_history(&self) -> Result<Vec<PointsRecord>> {
        self.backend.points_history().await.map_err(|e| {
            error!("Error fetching points history: {}", e);
            e
        })
    }
}
