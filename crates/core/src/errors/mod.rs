//! Error types and Result alias for the Aimi Point client

use crate::RewardStatus;
use thiserror::Error;

/// Main error type for the Aimi Point client
#[derive(Error, Debug)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Session token expired")]
    TokenExpired,

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Reward not found: {0}")]
    RewardNotFound(String),

    #[error("Reward {id} cannot be redeemed while {status}")]
    RewardNotRedeemable { id: String, status: RewardStatus },

    #[error("Redemption of reward {0} is already in progress")]
    RedemptionInProgress(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error came from the authentication step (shown inline on the login form)
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Error::AuthenticationError(_) | Error::InvalidCredentials | Error::TokenExpired
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}
