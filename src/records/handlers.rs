use actix_web::{web, HttpResponse};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::auth::{AdminOnly, AnyUser, Guarded, ResolvedIdentity, StaffOnly};
use crate::db::{NewAppointment, NewClaim, NewContactMessage, UserProfile};
use crate::error::{AppError, AuthError};
use crate::AppState;

/// Staff see everything; everyone else only their own rows.
fn owner_scope(identity: &ResolvedIdentity) -> Option<i64> {
    if identity.role.is_staff() {
        None
    } else {
        Some(identity.id)
    }
}

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::ValidationError(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn list_users(
    _admin: Guarded<AdminOnly>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let users: Vec<UserProfile> = state
        .records
        .list_users()
        .await?
        .iter()
        .map(|u| u.profile())
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

pub async fn list_policies(
    identity: Guarded<AnyUser>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let policies = state.records.list_policies(owner_scope(&identity)).await?;
    Ok(HttpResponse::Ok().json(policies))
}

#[derive(Debug, Deserialize)]
pub struct ClaimQuery {
    pub user_id: Option<i64>,
}

pub async fn list_claims(
    identity: Guarded<AnyUser>,
    query: web::Query<ClaimQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let owner = match (owner_scope(&identity), query.user_id) {
        (None, filter) => filter,
        (Some(own), Some(requested)) if requested != own => return Err(AuthError::Forbidden.into()),
        (Some(own), _) => Some(own),
    };
    let claims = state.records.list_claims(owner).await?;
    Ok(HttpResponse::Ok().json(claims))
}

#[derive(Debug, Deserialize)]
pub struct CreateClaimRequest {
    pub policy_id: i64,
    pub document_url: Option<String>,
}

pub async fn create_claim(
    identity: Guarded<AnyUser>,
    req: web::Json<CreateClaimRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let policy = state
        .records
        .get_policy(req.policy_id)
        .await?
        .ok_or_else(|| AppError::NotFound("policy".into()))?;

    if !identity.role.is_staff() && policy.user_id != identity.id {
        return Err(AuthError::Forbidden.into());
    }

    let claim = state
        .records
        .create_claim(NewClaim {
            policy_id: policy.id,
            user_id: policy.user_id,
            document_url: optional(req.document_url),
        })
        .await?;
    info!("User {} filed claim {} on policy {}", identity.id, claim.id, policy.id);
    Ok(HttpResponse::Created().json(claim))
}

pub async fn list_appointments(
    identity: Guarded<AnyUser>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let appointments = state.records.list_appointments(owner_scope(&identity)).await?;
    Ok(HttpResponse::Ok().json(appointments))
}

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

/// Length of an appointment when the client gives no end time.
const DEFAULT_APPOINTMENT_LENGTH_MINUTES: i64 = 60;

pub async fn create_appointment(
    identity: Guarded<AnyUser>,
    req: web::Json<CreateAppointmentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let title = required("title", &req.title)?;
    let end = match req.end {
        Some(end) => end,
        None => req
            .start
            .checked_add_signed(Duration::minutes(DEFAULT_APPOINTMENT_LENGTH_MINUTES))
            .ok_or_else(|| AppError::ValidationError("start is out of range".into()))?,
    };
    if end <= req.start {
        return Err(AppError::ValidationError("end must be after start".into()));
    }

    let appointment = state
        .records
        .create_appointment(NewAppointment {
            user_id: identity.id,
            title,
            description: optional(req.description),
            start: req.start,
            end,
        })
        .await?;
    Ok(HttpResponse::Created().json(appointment))
}

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub naam: String,
    #[serde(default)]
    pub email: String,
    pub telefoon: Option<String>,
    #[serde(rename = "voorkeurContact")]
    pub voorkeur_contact: Option<String>,
    #[serde(default)]
    pub onderwerp: String,
    #[serde(default)]
    pub bericht: String,
}

/// Public contact form. Messages are stored for staff to follow up.
pub async fn submit_contact(
    req: web::Json<ContactRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let email = required("email", &req.email)?;
    if !email.contains('@') {
        return Err(AppError::ValidationError("email is not a valid address".into()));
    }

    let message = state
        .records
        .create_contact_message(NewContactMessage {
            naam: required("naam", &req.naam)?,
            email,
            telefoon: optional(req.telefoon),
            onderwerp: required("onderwerp", &req.onderwerp)?,
            bericht: required("bericht", &req.bericht)?,
            voorkeur_contact: optional(req.voorkeur_contact),
        })
        .await?;
    info!("Stored contact message {} ({})", message.id, message.onderwerp);

    Ok(HttpResponse::Ok().json(json!({ "message": "Bericht succesvol verzonden" })))
}

pub async fn list_contact_messages(
    _staff: Guarded<StaffOnly>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let messages = state.records.list_contact_messages().await?;
    Ok(HttpResponse::Ok().json(messages))
}

pub async fn statistics(
    _staff: Guarded<StaffOnly>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let statistics = state.records.statistics().await?;
    Ok(HttpResponse::Ok().json(statistics))
}
