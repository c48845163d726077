//! Application state owned by the controller

use aimi_core::{Reward, Theme, User};
use serde::{Deserialize, Serialize};

/// User-facing message produced by an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message")]
pub enum Notice {
    /// Confirmation ("You've redeemed ...")
    Info(String),
    /// Failure the user should see
    Alert(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Info(m) | Notice::Alert(m) => m,
        }
    }
}

/// Data behind the home screen of a signed-in user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeState {
    /// Level being viewed on the path (not necessarily the user's level)
    pub current_level: u32,
    pub current_theme: Option<Theme>,
    pub themes: Vec<Theme>,
    pub rewards: Vec<Reward>,
}

/// Whole-application state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// True until the initial session check resolves
    pub loading: bool,
    pub user: Option<User>,
    /// Inline message under the login form
    pub login_error: Option<String>,
    pub notice: Option<Notice>,
    /// Present exactly when `user` is
    pub home: Option<HomeState>,
}

impl AppState {
    /// State before the session check has run
    pub fn starting() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}
