mod common;

use std::sync::Arc;

use broker_portal_server::auth::{AccessGuard, Argon2Hasher, AuthService, SystemClock};
use broker_portal_server::error::AuthError;
use broker_portal_server::{AppError, Role};
use chrono::Duration;
use common::fixture;

fn auth_error(err: AppError) -> AuthError {
    match err {
        AppError::AuthError(e) => e,
        other => panic!("Expected auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_demo_login_resolves_to_client() {
    let fx = fixture().await;

    let login = fx.state.auth.login("demo@klant.nl", "demo123").await.unwrap();
    assert_eq!(login.user.email, "demo@klant.nl");
    assert_eq!(login.user.role, "client");

    let identity = fx.state.auth.resolve(&login.token).await.unwrap();
    assert_eq!(identity.id, fx.client.id);
    assert_eq!(identity.email, "demo@klant.nl");
    assert_eq!(identity.name, "Jan Demo");
    assert_eq!(identity.role, Role::client());
}

#[tokio::test]
async fn test_every_seeded_user_round_trips() {
    let fx = fixture().await;

    for (user, password) in [(&fx.admin, "admin123"), (&fx.adviseur, "advies123"), (&fx.client, "demo123")] {
        let login = fx.state.auth.login(&user.email, password).await.unwrap();
        let identity = fx.state.auth.resolve(&login.token).await.unwrap();
        assert_eq!(identity.id, user.id);
        assert_eq!(identity.email, user.email);
        assert_eq!(identity.name, user.name);
        assert_eq!(identity.role, user.role());
    }
}

#[tokio::test]
async fn test_wrong_password_does_not_reveal_account() {
    let fx = fixture().await;

    let wrong = fx.state.auth.login("demo@klant.nl", "demo124").await.unwrap_err();
    let unknown = fx.state.auth.login("ghost@klant.nl", "demo123").await.unwrap_err();

    assert_eq!(wrong.to_string(), unknown.to_string());
    assert_eq!(auth_error(wrong), AuthError::InvalidCredentials);
    assert_eq!(auth_error(unknown), AuthError::InvalidCredentials);
}

#[tokio::test]
async fn test_email_match_is_case_sensitive() {
    let fx = fixture().await;
    let err = fx.state.auth.login("Demo@Klant.nl", "demo123").await.unwrap_err();
    assert_eq!(auth_error(err), AuthError::InvalidCredentials);
}

#[tokio::test]
async fn test_token_expires_after_one_hour() {
    let fx = fixture().await;
    let login = fx.state.auth.login("demo@klant.nl", "demo123").await.unwrap();

    fx.clock.advance(Duration::minutes(30));
    assert!(fx.state.auth.resolve(&login.token).await.is_ok());

    fx.clock.advance(Duration::minutes(31));
    let err = fx.state.auth.resolve(&login.token).await.unwrap_err();
    assert_eq!(auth_error(err), AuthError::ExpiredToken);
}

#[tokio::test]
async fn test_token_from_another_secret_is_invalid() {
    let fx = fixture().await;
    let foreign = AuthService::new(
        Arc::new(fx.store.clone()),
        Arc::new(Argon2Hasher::new()),
        "some_other_secret",
        Duration::hours(1),
        Arc::new(SystemClock),
    )
    .unwrap();
    let token = foreign.issue_token(fx.client.id).unwrap();

    let err = fx.state.auth.resolve(&token).await.unwrap_err();
    assert_eq!(auth_error(err), AuthError::InvalidToken);
}

#[tokio::test]
async fn test_invalid_token() {
    let fx = fixture().await;
    let err = fx.state.auth.resolve("invalid_token").await.unwrap_err();
    assert_eq!(auth_error(err), AuthError::InvalidToken);
}

#[tokio::test]
async fn test_removed_user_is_not_found() {
    let fx = fixture().await;
    let login = fx.state.auth.login("demo@klant.nl", "demo123").await.unwrap();

    fx.store.remove_user(fx.client.id).await;

    let err = fx.state.auth.resolve(&login.token).await.unwrap_err();
    assert_eq!(auth_error(err), AuthError::UserNotFound);
}

#[tokio::test]
async fn test_role_change_applies_without_relogin() {
    let fx = fixture().await;
    let login = fx.state.auth.login("demo@klant.nl", "demo123").await.unwrap();
    let admin_guard = AccessGuard::require(Role::admin());

    let err = admin_guard.check(&fx.state.auth, Some(&login.token)).await.unwrap_err();
    assert_eq!(auth_error(err), AuthError::Forbidden);

    fx.store.update_role(fx.client.id, Role::admin()).await.unwrap();

    let identity = admin_guard.check(&fx.state.auth, Some(&login.token)).await.unwrap();
    assert_eq!(identity.role, Role::admin());
}

#[tokio::test]
async fn test_admin_guard() {
    let fx = fixture().await;
    let guard = AccessGuard::require(Role::admin());

    let admin = fx.state.auth.login("admin@riskproactief.nl", "admin123").await.unwrap();
    let client = fx.state.auth.login("demo@klant.nl", "demo123").await.unwrap();

    let identity = guard.check(&fx.state.auth, Some(&admin.token)).await.unwrap();
    assert_eq!(identity.id, fx.admin.id);

    let err = guard.check(&fx.state.auth, Some(&client.token)).await.unwrap_err();
    assert_eq!(auth_error(err), AuthError::Forbidden);
}

#[tokio::test]
async fn test_missing_token_is_unauthenticated_not_forbidden() {
    let fx = fixture().await;
    let err = AccessGuard::require(Role::admin())
        .check(&fx.state.auth, None)
        .await
        .unwrap_err();
    assert_eq!(auth_error(err), AuthError::Unauthenticated);
}

#[tokio::test]
async fn test_guard_reports_resolver_errors_before_roles() {
    let fx = fixture().await;
    let err = AccessGuard::require(Role::admin())
        .check(&fx.state.auth, Some("not.a.token"))
        .await
        .unwrap_err();
    assert_eq!(auth_error(err), AuthError::InvalidToken);
}

#[tokio::test]
async fn test_concurrent_logins_are_independent() {
    let fx = fixture().await;
    let auth = fx.state.auth.clone();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let auth = auth.clone();
            tokio::spawn(async move {
                let (email, password) = if i % 2 == 0 {
                    ("demo@klant.nl", "demo123")
                } else {
                    ("admin@riskproactief.nl", "admin123")
                };
                let login = auth.login(email, password).await.unwrap();
                auth.resolve(&login.token).await.unwrap().email
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let email = handle.await.unwrap();
        let expected = if i % 2 == 0 { "demo@klant.nl" } else { "admin@riskproactief.nl" };
        assert_eq!(email, expected);
    }
}
