use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::models::*;
use super::{CredentialStore, RecordStore};
use crate::auth::Role;
use crate::error::DatabaseError;

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    policies: BTreeMap<i64, Policy>,
    claims: BTreeMap<i64, Claim>,
    appointments: BTreeMap<i64, Appointment>,
    contact_messages: BTreeMap<i64, ContactMessage>,
    next_id: i64,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_name(&self, id: i64) -> Option<String> {
        self.users.get(&id).map(|u| u.name.clone())
    }
}

/// In-process store backed by ordered maps. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user, assigning a fresh id. Emails are unique.
    pub async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        role: Role,
    ) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == email) {
            return Err(DatabaseError::Duplicate);
        }
        let id = tables.allocate_id();
        let user = User::new(id, email.to_string(), password_hash.to_string(), name.to_string(), role);
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    pub async fn update_role(&self, id: i64, role: Role) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        user.role = role.as_str().to_string();
        Ok(())
    }

    pub async fn remove_user(&self, id: i64) -> Option<User> {
        self.tables.write().await.users.remove(&id)
    }

    pub async fn insert_policy(
        &self,
        user_id: i64,
        dekking: &str,
        premie: f64,
        vervaldatum: chrono::DateTime<Utc>,
    ) -> Result<Policy, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(DatabaseError::QueryError(format!("unknown user {}", user_id)));
        }
        let id = tables.allocate_id();
        let policy = Policy {
            id,
            user_id,
            dekking: dekking.to_string(),
            premie,
            vervaldatum,
        };
        tables.policies.insert(id, policy.clone());
        Ok(policy)
    }
}

/// Sums `value` per label; labels come out ascending.
fn tally<'a, R, T, I, L, V>(rows: I, label: L, value: V) -> Series<T>
where
    R: 'a,
    T: Default + std::ops::AddAssign,
    I: IntoIterator<Item = &'a R>,
    L: Fn(&R) -> String,
    V: Fn(&R) -> T,
{
    let mut totals: BTreeMap<String, T> = BTreeMap::new();
    for row in rows {
        *totals.entry(label(row)).or_default() += value(row);
    }
    totals.into_iter().collect()
}

fn owned_by<T, F>(rows: &BTreeMap<i64, T>, owner: Option<i64>, user_of: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> i64,
{
    rows.values()
        .filter(|row| owner.map_or(true, |id| user_of(row) == id))
        .cloned()
        .collect()
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn list_policies(&self, owner: Option<i64>) -> Result<Vec<Policy>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(owned_by(&tables.policies, owner, |p| p.user_id))
    }

    async fn get_policy(&self, id: i64) -> Result<Option<Policy>, DatabaseError> {
        Ok(self.tables.read().await.policies.get(&id).cloned())
    }

    async fn list_claims(&self, owner: Option<i64>) -> Result<Vec<Claim>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(owned_by(&tables.claims, owner, |c| c.user_id))
    }

    async fn create_claim(&self, claim: NewClaim) -> Result<Claim, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.policies.contains_key(&claim.policy_id) {
            return Err(DatabaseError::NotFound);
        }
        let id = tables.allocate_id();
        let claim = Claim {
            id,
            policy_id: claim.policy_id,
            user_id: claim.user_id,
            status: CLAIM_STATUS_PENDING.to_string(),
            document_url: claim.document_url,
        };
        tables.claims.insert(id, claim.clone());
        Ok(claim)
    }

    async fn list_appointments(&self, owner: Option<i64>) -> Result<Vec<Appointment>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut rows = owned_by(&tables.appointments, owner, |a| a.user_id);
        for row in &mut rows {
            row.user_name = tables.user_name(row.user_id);
        }
        rows.sort_by_key(|a| a.start);
        Ok(rows)
    }

    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Appointment, DatabaseError> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let appointment = Appointment {
            id,
            user_id: appointment.user_id,
            title: appointment.title,
            description: appointment.description,
            start: appointment.start,
            end: appointment.end,
            user_name: tables.user_name(appointment.user_id),
        };
        tables.appointments.insert(id, appointment.clone());
        Ok(appointment)
    }

    async fn create_contact_message(&self, message: NewContactMessage) -> Result<ContactMessage, DatabaseError> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let message = ContactMessage {
            id,
            naam: message.naam,
            email: message.email,
            telefoon: message.telefoon,
            onderwerp: message.onderwerp,
            bericht: message.bericht,
            voorkeur_contact: message.voorkeur_contact,
            created_at: Utc::now(),
        };
        tables.contact_messages.insert(id, message.clone());
        Ok(message)
    }

    async fn list_contact_messages(&self) -> Result<Vec<ContactMessage>, DatabaseError> {
        let tables = self.tables.read().await;
        // Ids are allocated in insertion order, so reverse id order is newest first.
        Ok(tables.contact_messages.values().rev().cloned().collect())
    }

    async fn statistics(&self) -> Result<PortfolioStatistics, DatabaseError> {
        let tables = self.tables.read().await;
        let now = Utc::now();
        let active: Vec<&Policy> = tables.policies.values().filter(|p| p.vervaldatum > now).collect();
        let customers: Vec<&User> = tables.users.values().filter(|u| u.role().is_customer()).collect();

        let monthly_premiums = tally(tables.policies.values(), |p| month_label(&p.vervaldatum), |p| p.premie);
        let claimed = tables
            .claims
            .values()
            .filter_map(|c| tables.policies.get(&c.policy_id));
        let claims_by_type = tally(claimed, |p| p.dekking.clone(), |_| 1_i64);

        let customer_growth = tally(customers.iter().copied(), |u| quarter_label(&u.created_at), |_| 1_i64);

        Ok(PortfolioStatistics {
            monthly_premiums,
            claims_by_type,
            customer_growth,
            summary: PortfolioSummary {
                active_policies: active.len() as i64,
                open_claims: tables
                    .claims
                    .values()
                    .filter(|c| c.status == CLAIM_STATUS_PENDING)
                    .count() as i64,
                total_customers: customers.len() as i64,
                total_premium: active.iter().map(|p| p.premie).sum(),
            },
        })
    }
}
