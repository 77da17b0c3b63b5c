use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::password::PasswordHasher;
use super::roles::Role;
use super::token::{Clock, TokenService};
use crate::db::{CredentialStore, User, UserProfile};
use crate::error::{AppError, AuthError};

/// The live identity behind a verified token, valid for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<&User> for ResolvedIdentity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Hashed once at start-up so unknown emails cost one full verify.
const DUMMY_PASSWORD: &str = "no account has this password";

/// Credential verification, token issuance and identity resolution.
///
/// Holds no per-request state; one instance is shared by every worker.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenService,
    dummy_digest: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        jwt_secret: &str,
        token_lifetime: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let dummy_digest = hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self {
            store,
            hasher,
            tokens: TokenService::new(jwt_secret, token_lifetime, clock),
            dummy_digest,
        })
    }

    /// Checks email and password and mints a token for the matching user.
    ///
    /// An unknown email and a wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation("email and password are required".into()).into());
        }

        let user = match self.store.find_by_email(email).await? {
            Some(user) => user,
            None => {
                // Same hashing work as a wrong password.
                self.hasher.verify(password, &self.dummy_digest);
                debug!("Login rejected: no account for {}", email);
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !self.hasher.verify(password, &user.password_hash) {
            debug!("Login rejected: password mismatch for user {}", user.id);
            return Err(AuthError::InvalidCredentials.into());
        }

        if self.hasher.needs_rehash(&user.password_hash) {
            warn!("User {} still has a legacy password digest", user.id);
        }

        let token = self.tokens.issue(user.id)?;
        info!("Issued token for user {} (role {})", user.id, user.role);

        Ok(LoginResponse {
            token,
            user: user.profile(),
        })
    }

    /// Verifies `token` and re-reads its subject from the store.
    pub async fn resolve(&self, token: &str) -> Result<ResolvedIdentity, AppError> {
        let user_id = self.tokens.verify(token)?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(ResolvedIdentity::from(&user))
    }

    pub fn issue_token(&self, user_id: i64) -> Result<String, AppError> {
        self.tokens.issue(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::{Argon2Hasher, MockPasswordHasher};
    use crate::auth::token::SystemClock;
    use crate::db::MockCredentialStore;
    use crate::error::DatabaseError;

    fn service_with(store: MockCredentialStore) -> AuthService {
        AuthService::new(
            Arc::new(store),
            Arc::new(Argon2Hasher::new()),
            "test_secret",
            Duration::hours(1),
            Arc::new(SystemClock),
        )
        .unwrap()
    }

    fn user(id: i64, password: &str) -> User {
        let hash = Argon2Hasher::new().hash(password).unwrap();
        User::new(id, "demo@klant.nl".into(), hash, "Jan Demo".into(), Role::client())
    }

    #[tokio::test]
    async fn test_missing_fields_are_validation_errors() {
        let mut store = MockCredentialStore::new();
        store.expect_find_by_email().never();
        let auth = service_with(store);

        for (email, password) in [("", "demo123"), ("demo@klant.nl", ""), ("  ", "x")] {
            let err = auth.login(email, password).await.unwrap_err();
            assert!(matches!(err, AppError::AuthError(AuthError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_look_identical() {
        let mut store = MockCredentialStore::new();
        let stored = user(1, "demo123");
        store
            .expect_find_by_email()
            .returning(move |email| Ok((email == "demo@klant.nl").then(|| stored.clone())));
        let auth = service_with(store);

        let unknown = auth.login("nobody@klant.nl", "demo123").await.unwrap_err();
        let wrong = auth.login("demo@klant.nl", "demo999").await.unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(unknown, AppError::AuthError(AuthError::InvalidCredentials)));
        assert!(matches!(wrong, AppError::AuthError(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_email_still_pays_for_a_verify() {
        let mut store = MockCredentialStore::new();
        store.expect_find_by_email().returning(|_| Ok(None));

        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .times(1)
            .returning(|_| Ok("$argon2id$dummy".to_string()));
        hasher
            .expect_verify()
            .withf(|password, digest| password.to_string() == "demo123" && digest.to_string() == "$argon2id$dummy")
            .times(1)
            .returning(|_, _| false);

        let auth = AuthService::new(
            Arc::new(store),
            Arc::new(hasher),
            "test_secret",
            Duration::hours(1),
            Arc::new(SystemClock),
        )
        .unwrap();

        let err = auth.login("nobody@klant.nl", "demo123").await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_store_failure_is_not_reported_as_bad_credentials() {
        let mut store = MockCredentialStore::new();
        store
            .expect_find_by_email()
            .returning(|_| Err(DatabaseError::ConnectionError("down".into())));
        let auth = service_with(store);

        let err = auth.login("demo@klant.nl", "demo123").await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(DatabaseError::ConnectionError(_))));
    }

    #[tokio::test]
    async fn test_resolve_rereads_the_user() {
        let mut store = MockCredentialStore::new();
        let stored = user(5, "demo123");
        store.expect_find_by_id().times(1).returning(move |id| {
            let mut u = stored.clone();
            u.id = id;
            u.role = "adviseur".into();
            Ok(Some(u))
        });
        let auth = service_with(store);

        let token = auth.issue_token(5).unwrap();
        let identity = auth.resolve(&token).await.unwrap();
        assert_eq!(identity.id, 5);
        assert_eq!(identity.role, Role::adviseur());
    }

    #[tokio::test]
    async fn test_resolve_of_vanished_user() {
        let mut store = MockCredentialStore::new();
        store.expect_find_by_id().returning(|_| Ok(None));
        let auth = service_with(store);

        let token = auth.issue_token(9).unwrap();
        let err = auth.resolve(&token).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::UserNotFound)));
    }
}
