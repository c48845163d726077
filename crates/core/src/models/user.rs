//! User-related models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed-in user (internal representation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub points: u32,
    pub level: u32,
    pub mobile: String,
}

impl User {
    /// First letter of the username, upper-cased (dashboard avatar)
    pub fn initial(&self) -> Option<char> {
        self.username.chars().next().map(|c| c.to_ascii_uppercase())
    }
}

/// Login form input.
///
/// `identifier` is a username for the in-memory backend and an email
/// address for the remote one.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Row from the `profiles` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub mobile_number: Option<String>,
}

impl ProfileRow {
    /// Convert to User, applying the profile defaults
    /// (points 0, level 1, empty mobile)
    pub fn into_user(self) -> User {
        let points = self
            .points
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(0);
        // A stored level of 0 counts as unset, same as null
        let level = self
            .level
            .and_then(|l| u32::try_from(l).ok())
            .filter(|l| *l >= 1)
            .unwrap_or(1);

        User {
            id: self.id,
            username: self.username,
            points,
            level,
            mobile: self.mobile_number.unwrap_or_default(),
        }
    }
}

/// Response from `POST /auth/v1/token?grant_type=password`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

/// Identity returned by the auth API (`GET /auth/v1/user`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Error body returned by the auth API.
///
/// Older servers send `error_description`, newer ones `msg`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthErrorBody {
    pub fn message(&self) -> Option<&str> {
        self.error_description
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.message.as_deref())
            .or(self.error.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults() {
        let row: ProfileRow = serde_json::from_str(
            r#"{"id":"u-1","username":"rina","points":null,"level":null,"mobile_number":null}"#,
        )
        .unwrap();
        let user = row.into_user();
        assert_eq!(user.points, 0);
        assert_eq!(user.level, 1);
        assert_eq!(user.mobile, "");
    }

    #[test]
    fn test_profile_zero_level_counts_as_unset() {
        let row = ProfileRow {
            id: "u-2".into(),
            username: "budi".into(),
            points: Some(-4),
            level: Some(0),
            mobile_number: Some("+6281234".into()),
        };
        let user = row.into_user();
        assert_eq!(user.level, 1);
        assert_eq!(user.points, 0);
        assert_eq!(user.mobile, "+6281234");
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("aimi_user", "password");
        let shown = format!("{:?}", creds);
        assert!(shown.contains("aimi_user"));
        assert!(!shown.contains("\"password\""));
    }

    #[test]
    fn test_auth_error_message_variants() {
        let old: AuthErrorBody = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .unwrap();
        assert_eq!(old.message(), Some("Invalid login credentials"));

        let new: AuthErrorBody =
            serde_json::from_str(r#"{"code":400,"msg":"Email not confirmed"}"#).unwrap();
        assert_eq!(new.message(), Some("Email not confirmed"));
    }
}
