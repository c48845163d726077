//! HTTP client for the hosted auth + table API

use aimi_core::{
    AuthErrorBody, AuthTokenResponse, AuthUser, Error, PointsHistoryRow, PointsRecord,
    ProfileRow, RedeemUpdate, Result, Reward, RewardRow, Theme, ThemeRow, User,
};
use aimi_persistence::cache::CatalogCache;
use chrono::{DateTime, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION},
    Client, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Accept header asking the table API for a single JSON object
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

const REWARDS_SELECT: &str = "id,name,description,required_level,image_url,user_rewards!inner(status)";

/// HTTP client for the Aimi Point backend
///
/// Every request carries the project's public `apikey`. Once signed in,
/// requests are authorized with the user's access token instead of the
/// public key. Theme catalog reads can go through a shared cache.
#[derive(Clone)]
pub struct AimiClient {
    http: Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
    cache: Option<Arc<CatalogCache>>,
}

impl AimiClient {
    /// Create an anonymous client
    ///
    /// # Arguments
    /// * `base_url` - Service root, e.g. `https://xyz.example.co`
    /// * `anon_key` - Public API key sent as the `apikey` header
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self> {
        if anon_key.trim().is_empty() {
            return Err(Error::Config("API key must not be empty".to_string()));
        }
        // Validated here so per-request header building cannot fail on it
        HeaderValue::from_str(anon_key)
            .map_err(|e| Error::Config(format!("Invalid API key: {}", e)))?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: None,
            cache: None,
        })
    }

    /// Create a client with a shared catalog cache
    pub fn new_with_cache(
        base_url: &str,
        anon_key: &str,
        timeout: Duration,
        cache: Arc<CatalogCache>,
    ) -> Result<Self> {
        let mut client = Self::new(base_url, anon_key, timeout)?;
        client.cache = Some(cache);
        Ok(client)
    }

    /// Copy of this client authorized as a signed-in user
    pub fn with_access_token(&self, access_token: &str) -> Self {
        let mut client = self.clone();
        client.access_token = Some(access_token.to_string());
        client
    }

    /// Copy of this client without a user token
    pub fn anonymous(&self) -> Self {
        let mut client = self.clone();
        client.access_token = None;
        client
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Headers shared by every request
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key).map_err(|e| Error::Config(e.to_string()))?,
        );

        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer))
                .map_err(|e| Error::InvalidData(format!("Invalid access token: {}", e)))?,
        );

        Ok(headers)
    }

    /// Headers for reads that expect exactly one row
    fn single_object_headers(&self) -> Result<HeaderMap> {
        let mut headers = self.default_headers()?;
        headers.insert(ACCEPT, HeaderValue::from_static(SINGLE_OBJECT));
        Ok(headers)
    }

    fn require_token(&self) -> Result<&str> {
        self.access_token.as_deref().ok_or(Error::NotLoggedIn)
    }

    /// Check if response indicates authentication failure
    fn check_auth_error(response: &Response) -> Option<Error> {
        match response.status().as_u16() {
            401 => Some(Error::TokenExpired),
            403 => Some(Error::AuthenticationError("Access forbidden".to_string())),
            _ => None,
        }
    }

    /// Turn a non-success response into an API error carrying the body
    async fn api_error(response: Response, what: &str) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!("{} request failed: HTTP {} - {}", what, status, body);
        Error::ApiError(format!("{} failed with status {}: {}", what, status, body))
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            error!("Failed to parse {} response: {}", what, e);
            Error::InvalidData(e.to_string())
        })
    }

    // ─── Auth ────────────────────────────────────────────────────────

    /// Sign in with email and password, returning the token grant
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthTokenResponse> {
        let url = self.auth_url("token");
        debug!("Signing in via {}", url);

        let body = serde_json::json!({ "email": email, "password": password });
        let response = self
            .http
            .post(&url)
            .query(&[("grant_type", "password")])
            .headers(self.default_headers()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let body: AuthErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .message()
                .unwrap_or("Invalid login credentials")
                .to_string();
            debug!("Sign in rejected: {}", message);
            return Err(Error::AuthenticationError(message));
        }
        if !status.is_success() {
            return Err(Self::api_error(response, "Sign in").await);
        }

        let grant: AuthTokenResponse = Self::parse_json(response, "token").await?;
        debug!("Signed in as user {}", grant.user.id);
        Ok(grant)
    }

    /// Fetch the identity behind the current access token
    #[instrument(skip(self))]
    pub async fn get_user(&self) -> Result<AuthUser> {
        self.require_token()?;
        let url = self.auth_url("user");

        let response = self
            .http
            .get(&url)
            .headers(self.default_headers()?)
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response, "Get user").await);
        }

        let user: AuthUser = Self::parse_json(response, "user").await?;
        debug!("Token valid for user {}", user.id);
        Ok(user)
    }

    /// Revoke the current access token
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        self.require_token()?;
        let url = self.auth_url("logout");

        let response = self
            .http
            .post(&url)
            .headers(self.default_headers()?)
            .send()
            .await?;

        // An already-expired token is as good as signed out
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Sign out with an expired token");
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response, "Sign out").await);
        }

        debug!("Signed out");
        Ok(())
    }

    /// Ask the auth service to email password reset instructions
    #[instrument(skip(self))]
    pub async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<()> {
        let url = self.auth_url("recover");

        let response = self
            .http
            .post(&url)
            .query(&[("redirect_to", redirect_to)])
            .headers(self.default_headers()?)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "Password reset").await);
        }

        debug!("Password reset requested for {}", email);
        Ok(())
    }

    // ─── Tables ──────────────────────────────────────────────────────

    /// Read one profile row by user id
    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: &str) -> Result<User> {
        let url = self.rest_url("profiles");

        let response = self
            .http
            .get(&url)
            .query(&[("select", "*".to_string()), ("id", format!("eq.{}", user_id))])
            .headers(self.single_object_headers()?)
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }
        if response.status() == StatusCode::NOT_ACCEPTABLE {
            return Err(Error::ProfileNotFound(user_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response, "Profile").await);
        }

        let row: ProfileRow = Self::parse_json(response, "profile").await?;
        let user = row.into_user();
        debug!("Profile fetched: {} (level {}, {} points)", user.username, user.level, user.points);
        Ok(user)
    }

    /// Read the reward catalog joined with this user's statuses
    #[instrument(skip(self))]
    pub async fn get_user_rewards(&self, user_id: &str) -> Result<Vec<Reward>> {
        let url = self.rest_url("rewards");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("select", REWARDS_SELECT.to_string()),
                ("user_rewards.user_id", format!("eq.{}", user_id)),
            ])
            .headers(self.default_headers()?)
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response, "Rewards").await);
        }

        let rows: Vec<RewardRow> = Self::parse_json(response, "rewards").await?;
        let rewards: Vec<Reward> = rows.into_iter().map(RewardRow::into_reward).collect();
        debug!("Fetched {} rewards for {}", rewards.len(), user_id);
        Ok(rewards)
    }

    /// Mark one user reward as redeemed
    #[instrument(skip(self))]
    pub async fn update_user_reward_redeemed(
        &self,
        user_id: &str,
        reward_id: &str,
        redeemed_at: DateTime<Utc>,
    ) -> Result<()> {
        let url = self.rest_url("user_rewards");

        let response = self
            .http
            .patch(&url)
            .query(&[
                ("user_id", format!("eq.{}", user_id)),
                ("reward_id", format!("eq.{}", reward_id)),
            ])
            .headers(self.default_headers()?)
            .header("Prefer", "return=minimal")
            .json(&RedeemUpdate::at(redeemed_at))
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response, "Redeem").await);
        }

        debug!("Reward {} marked redeemed for {}", reward_id, user_id);
        Ok(())
    }

    /// Read the theme whose range contains `level` (cache-aware)
    #[instrument(skip(self))]
    pub async fn get_theme_for_level(&self, level: u32) -> Result<Option<Theme>> {
        if let Some(ref cache) = self.cache {
            if let Some(cached) = cache.get_level(level) {
                debug!("Cache hit for level {} theme", level);
                return Ok(Some(cached));
            }
        }

        let url = self.rest_url("themes");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("select", "*".to_string()),
                ("start_level", format!("lte.{}", level)),
                ("end_level", format!("gte.{}", level)),
            ])
            .headers(self.single_object_headers()?)
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }
        if response.status() == StatusCode::NOT_ACCEPTABLE {
            debug!("No theme row covers level {}", level);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response, "Theme").await);
        }

        let row: ThemeRow = Self::parse_json(response, "theme").await?;
        let theme = row.into_theme()?;

        if let Some(ref cache) = self.cache {
            cache.insert_level(level, theme.clone());
        }

        Ok(Some(theme))
    }

    /// Read every theme ordered by start level (cache-aware)
    #[instrument(skip(self))]
    pub async fn get_themes(&self) -> Result<Vec<Theme>> {
        if let Some(ref cache) = self.cache {
            if let Some(cached) = cache.get_themes() {
                debug!("Cache hit for theme list");
                return Ok(cached);
            }
        }

        let url = self.rest_url("themes");

        let response = self
            .http
            .get(&url)
            .query(&[("select", "*"), ("order", "start_level.asc")])
            .headers(self.default_headers()?)
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response, "Themes").await);
        }

        let rows: Vec<ThemeRow> = Self::parse_json(response, "themes").await?;
        let themes = rows
            .into_iter()
            .map(ThemeRow::into_theme)
            .collect::<Result<Vec<_>>>()?;

        if let Some(ref cache) = self.cache {
            cache.insert_themes(themes.clone());
        }

        debug!("Fetched {} themes", themes.len());
        Ok(themes)
    }

    /// Read the points history, newest first
    #[instrument(skip(self))]
    pub async fn get_points_history(&self) -> Result<Vec<PointsRecord>> {
        let url = self.rest_url("points_history");

        let response = self
            .http
            .get(&url)
            .query(&[("select", "*,profiles(username)"), ("order", "created_at.desc")])
            .headers(self.default_headers()?)
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response, "Points history").await);
        }

        let rows: Vec<PointsHistoryRow> = Self::parse_json(response, "points history").await?;
        Ok(rows.into_iter().map(PointsHistoryRow::into_record).collect())
    }
}
