//! Role-gated access control.
//!
//! [`AccessGuard`] is the check itself: no token is `Unauthenticated`, a
//! token that does not resolve fails with the resolver's error, and a
//! resolved identity without one of the required roles is `Forbidden`.
//! [`Guarded`] puts a guard in front of an actix handler:
//!
//! ```ignore
//! async fn list_users(admin: Guarded<AdminOnly>, ...) -> Result<HttpResponse, AppError>
//! ```

use std::marker::PhantomData;
use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use tracing::debug;

use super::roles::Role;
use super::service::{AuthService, ResolvedIdentity};
use crate::error::{AppError, AuthError};
use crate::AppState;

#[derive(Debug, Clone, Default)]
pub struct AccessGuard {
    allowed: Vec<Role>,
}

impl AccessGuard {
    /// Any user with a valid token.
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn require(role: Role) -> Self {
        Self { allowed: vec![role] }
    }

    pub fn any_of(roles: impl IntoIterator<Item = Role>) -> Self {
        Self { allowed: roles.into_iter().collect() }
    }

    pub fn permits(&self, role: &Role) -> bool {
        self.allowed.is_empty() || self.allowed.contains(role)
    }

    pub async fn check(&self, auth: &AuthService, token: Option<&str>) -> Result<ResolvedIdentity, AppError> {
        let token = token.ok_or(AuthError::Unauthenticated)?;
        let identity = auth.resolve(token).await?;

        if !self.permits(&identity.role) {
            debug!("User {} with role {} refused", identity.id, identity.role);
            return Err(AuthError::Forbidden.into());
        }

        Ok(identity)
    }
}

/// Reads the bearer token from the `Authorization` header.
///
/// A missing header or an empty token is `Ok(None)`; any other scheme is
/// an invalid token.
pub fn bearer_token(req: &HttpRequest) -> Result<Option<&str>, AuthError> {
    let header = match req.headers().get(AUTHORIZATION) {
        Some(header) => header.to_str().map_err(|_| AuthError::InvalidToken)?.trim(),
        None => return Ok(None),
    };
    if header.is_empty() {
        return Ok(None);
    }

    let (scheme, token) = header.split_once(' ').unwrap_or((header, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidToken);
    }

    let token = token.trim();
    Ok((!token.is_empty()).then_some(token))
}

/// Which guard a [`Guarded`] extractor applies.
pub trait GuardPolicy {
    fn guard() -> AccessGuard;
}

pub struct AnyUser;

impl GuardPolicy for AnyUser {
    fn guard() -> AccessGuard {
        AccessGuard::authenticated()
    }
}

pub struct AdminOnly;

impl GuardPolicy for AdminOnly {
    fn guard() -> AccessGuard {
        AccessGuard::require(Role::admin())
    }
}

/// Admins and advisers.
pub struct StaffOnly;

impl GuardPolicy for StaffOnly {
    fn guard() -> AccessGuard {
        AccessGuard::any_of([Role::admin(), Role::adviseur()])
    }
}

/// Extractor that only yields when the request passes `P`'s guard.
pub struct Guarded<P: GuardPolicy = AnyUser> {
    identity: ResolvedIdentity,
    _policy: PhantomData<P>,
}

impl<P: GuardPolicy> Guarded<P> {
    pub fn into_inner(self) -> ResolvedIdentity {
        self.identity
    }
}

impl<P: GuardPolicy> Deref for Guarded<P> {
    type Target = ResolvedIdentity;

    fn deref(&self) -> &Self::Target {
        &self.identity
    }
}

impl<P: GuardPolicy + 'static> FromRequest for Guarded<P> {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req).map(|token| token.map(str::to_owned));

        Box::pin(async move {
            let state = state.ok_or_else(|| AppError::InternalError("application state not configured".into()))?;
            let token = token?;
            let identity = P::guard().check(&state.auth, token.as_deref()).await?;

            Ok(Guarded {
                identity,
                _policy: PhantomData,
            })
        })
    }
}
