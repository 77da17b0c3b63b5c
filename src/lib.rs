pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod records;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use actix_web::{web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AccessGuard, AuthService, Role};
pub use db::{CredentialStore, DbOperations, MemoryStore, RecordStore, User};

use auth::{Argon2Hasher, Clock, SystemClock};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Everything a request handler needs, built once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub records: Arc<dyn RecordStore>,
}

impl AppState {
    /// Connects to Postgres and wires the services over it.
    pub async fn new(config: &Settings) -> Result<Self> {
        let db = DbOperations::new_with_options(
            &config.database.url,
            config.database.max_connections,
            StdDuration::from_secs(5),
        )
        .await?;

        Self::with_store(config, Arc::new(db), Arc::new(SystemClock))
    }

    /// Wires the services over any store; the clock drives token expiry.
    pub fn with_store<S>(config: &Settings, store: Arc<S>, clock: Arc<dyn Clock>) -> Result<Self>
    where
        S: CredentialStore + RecordStore + 'static,
    {
        let auth = AuthService::new(
            store.clone(),
            Arc::new(Argon2Hasher::new()),
            &config.auth.jwt_secret,
            chrono::Duration::hours(config.auth.token_expiry_hours),
            clock,
        )?;

        Ok(Self {
            auth: Arc::new(auth),
            records: store,
        })
    }
}

/// Bodies and query strings that fail to deserialize answer in the usual
/// error shape instead of actix's plain-text default.
fn payload_errors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    );
}

/// Registers every route under `/health` and `/api`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    payload_errors(cfg);
    cfg.route("/health", web::get().to(health_check)).service(
        web::scope("/api")
            .configure(auth::handlers::configure)
            .configure(records::configure),
    );
}
