use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::Role;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: i64, email: String, password_hash: String, name: String, role: Role) -> Self {
        Self {
            id,
            email,
            password_hash,
            name,
            role: role.as_str().to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        Role::new(self.role.clone())
    }

    /// Public projection; the password hash never leaves this type.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Policy {
    pub id: i64,
    pub user_id: i64,
    pub dekking: String,
    pub premie: f64,
    pub vervaldatum: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Claim {
    pub id: i64,
    pub policy_id: i64,
    pub user_id: i64,
    pub status: String,
    pub document_url: Option<String>,
}

pub const CLAIM_STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone)]
pub struct NewClaim {
    pub policy_id: i64,
    pub user_id: i64,
    pub document_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Owner's display name; `None` once the owner is gone.
    pub user_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ContactMessage {
    pub id: i64,
    pub naam: String,
    pub email: String,
    pub telefoon: Option<String>,
    pub onderwerp: String,
    pub bericht: String,
    pub voorkeur_contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub naam: String,
    pub email: String,
    pub telefoon: Option<String>,
    pub onderwerp: String,
    pub bericht: String,
    pub voorkeur_contact: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PortfolioSummary {
    pub active_policies: i64,
    pub open_claims: i64,
    pub total_customers: i64,
    pub total_premium: f64,
}

/// A labelled chart series; `labels[i]` names `data[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series<T> {
    pub labels: Vec<String>,
    pub data: Vec<T>,
}

impl<T> FromIterator<(String, T)> for Series<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let (labels, data) = iter.into_iter().unzip();
        Self { labels, data }
    }
}

/// Everything the statistics page plots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStatistics {
    /// Summed premium per expiry month.
    pub monthly_premiums: Series<f64>,
    /// Claim count per policy coverage.
    pub claims_by_type: Series<i64>,
    /// New customers per quarter.
    pub customer_growth: Series<i64>,
    pub summary: PortfolioSummary,
}

/// `2026-03`
pub fn month_label(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// `2026-Q1`
pub fn quarter_label(at: &DateTime<Utc>) -> String {
    format!("{}-Q{}", at.year(), at.month0() / 3 + 1)
}
