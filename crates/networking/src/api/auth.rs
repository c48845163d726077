//! Auth API operations with validation

use crate::AimiClient;
use aimi_core::{AuthTokenResponse, Error, Result, User};
use tracing::info;

/// Sign in by email/password and load the signed-in user's profile
///
/// # Returns
/// The token grant plus the profile row, converted with its defaults
pub async fn sign_in(
    client: &AimiClient,
    email: &str,
    password: &str,
) -> Result<(AuthTokenResponse, User)> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(Error::AuthenticationError(
            "Email and password are required".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(Error::AuthenticationError(format!(
            "'{}' is not an email address",
            email
        )));
    }

    let grant = client.sign_in_with_password(email, password).await?;
    let authed = client.with_access_token(&grant.access_token);
    let user = authed.get_profile(&grant.user.id).await?;

    info!("Signed in as {} (level {})", user.username, user.level);
    Ok((grant, user))
}

/// Resolve a stored access token to the current user's profile
pub async fn restore_session(client: &AimiClient) -> Result<User> {
    let identity = client.get_user().await?;
    client.get_profile(&identity.id).await
}

/// Request a password reset email
pub async fn request_password_reset(
    client: &AimiClient,
    email: &str,
    redirect_to: &str,
) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::InvalidData("Email is required".to_string()));
    }

    info!("Requesting password reset for {}", email);
    client.reset_password_for_email(email, redirect_to).await
}
