use anyhow::Result;
use httpmock::prelude::*;
use marinex::core::{ApiClient, AuthSession, Landing, SessionStore};
use marinex::{FileSessionStore, MarinexError, MemorySessionStore};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

const USER_ID: &str = "0b7c6c55-6a0e-4f7e-9a49-0e2b6a7b1c01";

fn me_body(has_boats: bool) -> serde_json::Value {
    json!({
        "id": USER_ID,
        "username": "capitan",
        "email": "capitan@marinex.test",
        "first_name": "Joan",
        "last_name": "Serra",
        "has_boats": has_boats
    })
}

#[tokio::test]
async fn test_login_stores_tokens_and_picks_landing() -> Result<()> {
    let server = MockServer::start_async().await;
    let temp_dir = TempDir::new()?;
    let session_path = temp_dir.path().join("session.json");

    let token = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/token/")
                .json_body(json!({"username": "capitan", "password": "s3cret"}));
            then.status(200)
                .json_body(json!({"access": "access-1", "refresh": "refresh-1"}));
        })
        .await;
    let me = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/me/")
                .header("authorization", "Bearer access-1");
            then.status(200).json_body(me_body(false));
        })
        .await;

    let session = Arc::new(FileSessionStore::open(&session_path));
    let auth = AuthSession::new(ApiClient::new(&server.url("/api/"), session)?);
    let outcome = auth.login("capitan", "s3cret").await?;

    assert_eq!(outcome.user.display_name(), "Joan Serra");
    assert_eq!(outcome.landing, Landing::AddBoat);
    assert!(auth.is_authenticated());
    token.assert_async().await;
    me.assert_async().await;

    // session 寫入檔案，下次啟動仍可讀取
    let reopened = FileSessionStore::open(&session_path);
    assert_eq!(reopened.access_token().as_deref(), Some("access-1"));
    assert_eq!(reopened.refresh_token().as_deref(), Some("refresh-1"));

    auth.logout().await?;
    assert!(!auth.is_authenticated());
    assert_eq!(FileSessionStore::open(&session_path).access_token(), None);
    Ok(())
}

#[tokio::test]
async fn test_login_failure_reports_backend_detail() -> Result<()> {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/token/");
            then.status(401).json_body(json!({
                "detail": "No active account found with the given credentials"
            }));
        })
        .await;

    let session = Arc::new(MemorySessionStore::new());
    let auth = AuthSession::new(ApiClient::new(&server.url("/api/"), session.clone())?);
    let err = auth.login("capitan", "wrong").await.unwrap_err();

    match err {
        MarinexError::Unauthorized { message } => {
            assert_eq!(message, "No active account found with the given credentials")
        }
        other => panic!("expected Unauthorized, got {:?}", other),
    }
    assert_eq!(session.access_token(), None);
    Ok(())
}

#[tokio::test]
async fn test_login_rejects_empty_credentials_without_request() -> Result<()> {
    let server = MockServer::start_async().await;
    let token = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/token/");
            then.status(200)
                .json_body(json!({"access": "a", "refresh": "r"}));
        })
        .await;

    let auth = AuthSession::new(ApiClient::new(
        &server.url("/api/"),
        Arc::new(MemorySessionStore::new()),
    )?);
    let err = auth.login("", "s3cret").await.unwrap_err();

    assert!(matches!(err, MarinexError::InvalidConfigValue { ref field, .. } if field == "username"));
    token.assert_hits_async(0).await;
    Ok(())
}

#[tokio::test]
async fn test_check_user_drops_invalid_session() -> Result<()> {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/me/")
                .header("authorization", "Bearer good");
            then.status(200).json_body(me_body(true));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/me/")
                .header("authorization", "Bearer revoked");
            then.status(401).json_body(json!({"detail": "Token is blacklisted"}));
        })
        .await;

    let valid = AuthSession::new(ApiClient::new(
        &server.url("/api/"),
        Arc::new(MemorySessionStore::with_tokens("good", Some("refresh"))),
    )?);
    let user = valid.check_user().await?.expect("user");
    assert!(user.has_boats);

    let revoked_session = Arc::new(MemorySessionStore::with_tokens("revoked", None));
    let revoked = AuthSession::new(ApiClient::new(&server.url("/api/"), revoked_session.clone())?);
    assert!(revoked.check_user().await?.is_none());
    assert_eq!(revoked_session.access_token(), None);

    // 沒有 token 時不發請求
    let anonymous = AuthSession::new(ApiClient::new(
        &server.url("/api/"),
        Arc::new(MemorySessionStore::new()),
    )?);
    assert!(anonymous.check_user().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_register_posts_public_request() -> Result<()> {
    let server = MockServer::start_async().await;

    let register = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/register/")
                .json_body_partial(r#"{"username": "nuevo", "account_name": "Nuevo Charter"}"#);
            then.status(201).json_body(json!({
                "id": USER_ID,
                "username": "nuevo",
                "email": "nuevo@marinex.test"
            }));
        })
        .await;

    let auth = AuthSession::new(ApiClient::new(
        &server.url("/api/"),
        Arc::new(MemorySessionStore::new()),
    )?);
    let user = auth
        .register(&marinex::domain::model::Registration {
            username: "nuevo".to_string(),
            password: "s3cret".to_string(),
            email: "nuevo@marinex.test".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: None,
            dni: None,
            account_name: "Nuevo Charter".to_string(),
        })
        .await?;

    assert_eq!(user.username, "nuevo");
    register.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_register_requires_password() -> Result<()> {
    let server = MockServer::start_async().await;
    let register = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/register/");
            then.status(201).json_body(json!({"id": USER_ID, "username": "nuevo"}));
        })
        .await;

    let auth = AuthSession::new(ApiClient::new(
        &server.url("/api/"),
        Arc::new(MemorySessionStore::new()),
    )?);
    let err = auth
        .register(&marinex::domain::model::Registration {
            username: "nuevo".to_string(),
            password: "   ".to_string(),
            email: "nuevo@marinex.test".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: None,
            dni: None,
            account_name: "Nuevo Charter".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, MarinexError::InvalidConfigValue { ref field, .. } if field == "password"));
    register.assert_hits_async(0).await;
    Ok(())
}
