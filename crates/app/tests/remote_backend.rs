//! RemoteBackend and Controller against a local axum stand-in

use aimi_app::{Backend, Controller, Notice, RemoteBackend, RemoteConfig};
use aimi_core::{Credentials, Error, RewardStatus};
use aimi_persistence::{sqlite, Database, SessionEncryptor};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const TOKEN: &str = "token-1";

fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", TOKEN);
    headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some(expected.as_str())
}

async fn token(Json(body): Json<Value>) -> Response {
    if body["email"] == "demo@aimipoint.com" && body["password"] == "secret" {
        Json(json!({
            "access_token": TOKEN,
            "token_type": "bearer",
            "expires_in": 3600,
            "user": { "id": "u-1", "email": "demo@aimipoint.com" }
        }))
        .into_response()
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({ "msg": "Invalid login credentials" }))).into_response()
    }
}

async fn user(headers: HeaderMap) -> Response {
    if authorized(&headers) {
        Json(json!({ "id": "u-1" })).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn profile(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "id": "u-1",
        "username": "aimi",
        "points": 25,
        "level": 15,
        "mobile_number": "+62123456789"
    }))
    .into_response()
}

async fn rewards(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([
        { "id": 1, "name": "Coffee Voucher", "required_level": 5, "user_rewards": [{ "status": "Available" }] },
        { "id": 2, "name": "Movie Tickets", "required_level": 10, "user_rewards": [{ "status": "Redeemed" }] }
    ]))
    .into_response()
}

async fn themes(headers: HeaderMap) -> Response {
    let single = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok())
        == Some("application/vnd.pgrst.object+json");
    let farm = json!({ "id": 2, "name": "Carrot Farm", "start_level": 11, "end_level": 20 });
    if single {
        Json(farm).into_response()
    } else {
        Json(json!([farm])).into_response()
    }
}

async fn broken_patch() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/user", get(user))
        .route("/auth/v1/logout", post(|| async { StatusCode::NO_CONTENT }))
        .route("/rest/v1/profiles", get(profile))
        .route("/rest/v1/rewards", get(rewards))
        .route("/rest/v1/themes", get(themes))
        .route("/rest/v1/user_rewards", patch(broken_patch));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config(base_url: &str) -> RemoteConfig {
    RemoteConfig {
        base_url: base_url.to_string(),
        anon_key: "anon-key".to_string(),
        reset_redirect: "http://localhost:5173/reset-password".to_string(),
        request_timeout: Duration::from_secs(5),
    }
}

fn encryptor() -> SessionEncryptor {
    SessionEncryptor::from_password("remote-backend-tests").unwrap()
}

#[tokio::test]
async fn test_session_survives_restart() {
    let base_url = spawn_server().await;
    let db = Database::connect_in_memory().await.unwrap();

    let first = RemoteBackend::new(&config(&base_url), db.clone(), encryptor()).unwrap();
    assert!(first.current_session().await.unwrap().is_none());

    let user = first
        .sign_in(&Credentials::new("demo@aimipoint.com", "secret"))
        .await
        .unwrap();
    assert_eq!((user.level, user.points), (15, 25));

    let stored = sqlite::get_active_session(db.pool()).await.unwrap().unwrap();
    assert_eq!(stored.user_id, "u-1");
    assert!(stored.expires_at.is_some());

    // A fresh backend over the same store picks the session up
    let second = RemoteBackend::new(&config(&base_url), db.clone(), encryptor()).unwrap();
    let restored = second.current_session().await.unwrap().unwrap();
    assert_eq!(restored, user);
    assert_eq!(second.rewards_for(&restored).await.unwrap().len(), 2);

    second.sign_out().await.unwrap();
    assert!(sqlite::get_active_session(db.pool()).await.unwrap().is_none());
    assert!(matches!(
        second.rewards_for(&restored).await,
        Err(Error::NotLoggedIn)
    ));
}

#[tokio::test]
async fn test_rejected_token_is_forgotten() {
    let base_url = spawn_server().await;
    let db = Database::connect_in_memory().await.unwrap();
    let encryptor = encryptor();

    sqlite::save_session(db.pool(), &encryptor, "u-1", None, "stale-token", None)
        .await
        .unwrap();

    let backend = RemoteBackend::new(&config(&base_url), db.clone(), encryptor).unwrap();
    assert!(backend.current_session().await.unwrap().is_none());
    assert!(sqlite::get_active_session(db.pool()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_session_is_not_used() {
    let base_url = spawn_server().await;
    let db = Database::connect_in_memory().await.unwrap();
    let encryptor = encryptor();

    let yesterday = Utc::now() - ChronoDuration::days(1);
    sqlite::save_session(db.pool(), &encryptor, "u-1", None, TOKEN, Some(yesterday))
        .await
        .unwrap();

    let backend = RemoteBackend::new(&config(&base_url), db.clone(), encryptor).unwrap();
    assert!(backend.current_session().await.unwrap().is_none());
    assert!(sqlite::get_active_session(db.pool()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_token_moved_between_users_is_forgotten() {
    let base_url = spawn_server().await;
    let db = Database::connect_in_memory().await.unwrap();
    let encryptor = encryptor();

    // A valid token for u-1 pasted onto u-2's row must not sign u-2 in
    sqlite::save_session(db.pool(), &encryptor, "u-1", None, TOKEN, None)
        .await
        .unwrap();
    sqlite::save_session(db.pool(), &encryptor, "u-2", None, "other-token", None)
        .await
        .unwrap();
    sqlx::query(
        "UPDATE sessions SET \
            token_encrypted = (SELECT token_encrypted FROM sessions WHERE user_id = 'u-1'), \
            iv = (SELECT iv FROM sessions WHERE user_id = 'u-1') \
         WHERE user_id = 'u-2'",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let backend = RemoteBackend::new(&config(&base_url), db.clone(), encryptor).unwrap();
    assert!(backend.current_session().await.unwrap().is_none());

    let left = sqlite::get_active_session(db.pool()).await.unwrap();
    assert!(left.is_none());
}

#[tokio::test]
async fn test_controller_over_remote() {
    let base_url = spawn_server().await;
    let db = Database::connect_in_memory().await.unwrap();
    let backend: Arc<dyn Backend> =
        Arc::new(RemoteBackend::new(&config(&base_url), db, encryptor()).unwrap());
    let controller: Controller = Controller::new(backend);

    assert!(controller.start().await.is_none());

    let err = controller
        .login(&Credentials::new("demo@aimipoint.com", "wrong"))
        .await
        .unwrap_err();
    assert!(err.is_auth_failure());
    assert_eq!(
        controller.snapshot().await.login_error.as_deref(),
        Some("Invalid login credentials")
    );

    controller
        .login(&Credentials::new("demo@aimipoint.com", "secret"))
        .await
        .unwrap();
    let summary = controller.theme_summary().await.unwrap();
    assert_eq!(summary.name, "Carrot Farm");

    // The server refuses the update: alert, nothing changes locally
    let before = controller.snapshot().await.home.unwrap().rewards;
    assert!(controller.redeem("1").await.is_err());
    let state = controller.snapshot().await;
    assert_eq!(state.home.unwrap().rewards, before);
    assert_eq!(
        state.notice,
        Some(Notice::Alert("Failed to redeem reward. Please try again.".to_string()))
    );
    assert_eq!(before[0].status, RewardStatus::Available);

    controller.logout().await;
    assert!(!controller.snapshot().await.is_logged_in());
}
