use std::sync::Arc;
use std::time::Duration;

use rusty_auth::auth::{
    parse_cookie_header, AuthEngine, CredentialVerifier, Credentials, MemoryUserRepository,
    UserRecord, WhoAmI,
};
use rusty_auth::clock::SystemClock;
use rusty_auth::config::AuthConfig;
use rusty_auth::error::{RustyAuthError, FORBIDDEN_MESSAGE};

const KEY: &str = "Zt5Wq1Ep8Ry3Ui7Oa2Sd6Fg9Hj0Kl4Xc+/";

async fn setup() -> (AuthEngine, Arc<MemoryUserRepository>) {
    let users = Arc::new(MemoryUserRepository::new());
    users
        .insert(UserRecord::new(
            "user-admin".to_string(),
            "admin".to_string(),
            CredentialVerifier::hash("correct"),
        ))
        .await
        .unwrap();
    users
        .insert(UserRecord::new(
            "user-guest".to_string(),
            "guest".to_string(),
            CredentialVerifier::hash("guest-pass"),
        ))
        .await
        .unwrap();

    let config = AuthConfig::new(KEY)
        .unwrap()
        .with_min_auth_duration(Duration::ZERO);
    let engine = AuthEngine::from_config(config, users.clone(), Arc::new(SystemClock)).unwrap();
    (engine, users)
}

async fn resolve(engine: &AuthEngine, token: &str) -> Option<String> {
    engine
        .who_am_i(Some(token))
        .await
        .unwrap()
        .identity()
        .map(|identity| identity.username.clone())
}

#[tokio::test]
async fn test_login_then_who_am_i_resolves_same_user() {
    let (engine, _) = setup().await;

    let outcome = engine.login("admin", "correct").await.unwrap();
    assert_eq!(outcome.cookie.value, outcome.token.token);
    assert_eq!(outcome.session.user_id, "user-admin");

    match engine.who_am_i(Some(&outcome.token.token)).await.unwrap() {
        WhoAmI::Authenticated { identity, token, cookie } => {
            assert_eq!(identity.user_id, "user-admin");
            assert_eq!(identity.session_id, outcome.session.session_id);
            assert_eq!(token.session_id, outcome.session.session_id);
            assert_ne!(token.token, outcome.token.token);
            assert_eq!(cookie.value, token.token);
        }
        WhoAmI::Anonymous { .. } => panic!("expected an authenticated caller"),
    }
}

#[tokio::test]
async fn test_rejected_logins_create_no_session() {
    let (engine, _) = setup().await;

    let attempts = [
        ("admin", "xyz"),
        ("xyz", "admin"),
        ("admin", ""),
        ("", "admin"),
        ("", ""),
    ];
    for (username, password) in attempts {
        let err = engine.login(username, password).await.unwrap_err();
        assert!(matches!(err, RustyAuthError::InvalidCredentials));
        assert_eq!(err.to_forbidden_message(), FORBIDDEN_MESSAGE);
    }

    assert_eq!(engine.session_stats().await.unwrap().total, 0);
}

#[tokio::test]
async fn test_missing_fields_are_rejected_like_wrong_password() {
    let (engine, _) = setup().await;

    let bodies = [
        r#"{"username":"admin"}"#,
        r#"{"password":"admin"}"#,
        r#"{}"#,
    ];
    for body in bodies {
        let credentials: Credentials = serde_json::from_str(body).unwrap();
        let result = engine.login_with(credentials).await;
        assert!(matches!(result, Err(RustyAuthError::InvalidCredentials)), "{}", body);
    }

    let ok: Credentials = serde_json::from_str(r#"{"username":"admin","password":"correct"}"#).unwrap();
    assert!(engine.login_with(ok).await.is_ok());
}

#[tokio::test]
async fn test_inactive_account_is_rejected() {
    let (engine, users) = setup().await;

    users.set_active("admin", false).await.unwrap();
    let result = engine.login("admin", "correct").await;
    assert!(matches!(result, Err(RustyAuthError::InvalidCredentials)));

    users.set_active("admin", true).await.unwrap();
    assert!(engine.login("admin", "correct").await.is_ok());
}

#[tokio::test]
async fn test_two_logins_logout_one() {
    let (engine, _) = setup().await;

    let first = engine.login("admin", "correct").await.unwrap();
    let second = engine.login("admin", "correct").await.unwrap();
    assert_ne!(first.session.session_id, second.session.session_id);
    assert_ne!(first.token.token, second.token.token);

    assert_eq!(resolve(&engine, &first.token.token).await.as_deref(), Some("admin"));
    assert_eq!(resolve(&engine, &second.token.token).await.as_deref(), Some("admin"));

    assert!(engine.logout(&first.token).await.unwrap());
    assert!(!engine.logout(&first.token).await.unwrap());

    match engine.who_am_i(Some(&first.token.token)).await.unwrap() {
        WhoAmI::Anonymous { clear_cookie } => {
            let cookie = clear_cookie.expect("stale cookie should be cleared");
            assert_eq!(cookie.max_age, Some(0));
            assert!(cookie.value.is_empty());
        }
        WhoAmI::Authenticated { .. } => panic!("logged out session must be anonymous"),
    }
    assert_eq!(resolve(&engine, &second.token.token).await.as_deref(), Some("admin"));
}

#[tokio::test]
async fn test_refreshed_token_dies_with_its_session() {
    let (engine, _) = setup().await;

    let outcome = engine.login("admin", "correct").await.unwrap();
    let refreshed = match engine.who_am_i(Some(&outcome.token.token)).await.unwrap() {
        WhoAmI::Authenticated { token, .. } => token,
        WhoAmI::Anonymous { .. } => panic!("expected an authenticated caller"),
    };

    engine.logout(&outcome.token).await.unwrap();
    assert!(resolve(&engine, &refreshed.token).await.is_none());
    assert!(resolve(&engine, &outcome.token.token).await.is_none());
}

#[tokio::test]
async fn test_clear_all_sessions_except_self() {
    let (engine, _) = setup().await;

    let keep = engine.login("admin", "correct").await.unwrap();
    let other_a = engine.login("admin", "correct").await.unwrap();
    let other_b = engine.login("admin", "correct").await.unwrap();
    let guest = engine.login("guest", "guest-pass").await.unwrap();

    let removed = engine
        .clear_all_except_self(&keep.session.session_id)
        .await
        .unwrap();
    assert_eq!(removed, 2);

    assert_eq!(resolve(&engine, &keep.token.token).await.as_deref(), Some("admin"));
    assert!(resolve(&engine, &other_a.token.token).await.is_none());
    assert!(resolve(&engine, &other_b.token.token).await.is_none());
    assert_eq!(resolve(&engine, &guest.token.token).await.as_deref(), Some("guest"));
}

#[tokio::test]
async fn test_list_and_clear_sessions_by_id() {
    let (engine, _) = setup().await;

    let admin = engine.login("admin", "correct").await.unwrap();
    let guest = engine.login("guest", "guest-pass").await.unwrap();

    // Listing covers every user, not just the caller
    let listed: Vec<String> = engine
        .list_sessions()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.session_id)
        .collect();
    assert_eq!(listed, vec![admin.session.session_id.clone(), guest.session.session_id.clone()]);

    assert!(engine.clear_session_by_id(&guest.session.session_id).await.unwrap());
    assert!(!engine.clear_session_by_id(&guest.session.session_id).await.unwrap());
    assert!(!engine.clear_session_by_id("does-not-exist").await.unwrap());

    assert!(resolve(&engine, &guest.token.token).await.is_none());
    assert_eq!(engine.list_sessions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_authenticate_does_not_reissue() {
    let (engine, _) = setup().await;

    let outcome = engine.login("admin", "correct").await.unwrap();
    let token = engine.authenticate(&outcome.token.token).await.unwrap();
    assert_eq!(token, outcome.token);

    engine.logout(&token).await.unwrap();
    let err = engine.authenticate(&outcome.token.token).await.unwrap_err();
    assert!(matches!(err, RustyAuthError::SessionNotFound(_)));
}

#[tokio::test]
async fn test_forged_and_garbage_cookies_are_anonymous() {
    let (engine, _) = setup().await;

    for value in ["garbage", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30.AAAA"] {
        let who = engine.who_am_i(Some(value)).await.unwrap();
        assert!(matches!(who, WhoAmI::Anonymous { clear_cookie: Some(_) }), "{}", value);
    }
    assert!(!engine.who_am_i(Some("   ")).await.unwrap().is_authenticated());
}

#[tokio::test]
async fn test_cookie_header_round_trip_through_engine() {
    let (engine, _) = setup().await;

    let outcome = engine.login("admin", "correct").await.unwrap();
    let request_header = format!("lang=en; {}={}", outcome.cookie.name, outcome.cookie.value);
    let cookie_value = parse_cookie_header(&request_header, &engine.config().cookie_name);

    let who = engine.who_am_i(cookie_value.as_deref()).await.unwrap();
    assert!(who.is_authenticated());
}

#[tokio::test]
async fn test_hash_and_is_equals_utilities() {
    let (engine, _) = setup().await;

    for value in ["", "admin", "pässwörd", "a much longer value with spaces"] {
        let digest = engine.hash(value);
        assert_eq!(digest, engine.hash(value));
        assert!(engine.is_equals(value, &digest));
        assert!(!engine.is_equals(&format!("{}x", value), &digest));
    }
}
