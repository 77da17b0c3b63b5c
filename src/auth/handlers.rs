use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::guard::{AnyUser, Guarded};
use super::service::ResolvedIdentity;
use crate::error::AppError;
use crate::AppState;

/// Missing fields deserialize as empty so they surface as a validation error
/// rather than a JSON rejection.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub user: ResolvedIdentity,
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for email: {}", req.email);
    match state.auth.login(&req.email, &req.password).await {
        Ok(response) => {
            info!("Login successful for email: {}", req.email);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            warn!("Login failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

/// Lets a client with a stored token recover the live user record.
pub async fn verify(identity: Guarded<AnyUser>) -> HttpResponse {
    HttpResponse::Ok().json(VerifyResponse {
        user: identity.into_inner(),
    })
}

pub async fn me(identity: Guarded<AnyUser>) -> HttpResponse {
    HttpResponse::Ok().json(identity.into_inner())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(login))
            .route("/verify", web::get().to(verify))
            .route("/me", web::get().to(me)),
    );
}
