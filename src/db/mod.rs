//! Persistence for the back office.
//!
//! Two traits split the storage surface: [`CredentialStore`] is the read-only
//! view the auth core needs, [`RecordStore`] carries the policy, claim,
//! appointment and contact records. Both are implemented by the Postgres-backed
//! [`DbOperations`] and by the in-process [`MemoryStore`].

pub mod memory;
pub mod models;
pub mod operations;

use async_trait::async_trait;

use crate::error::DatabaseError;

pub use memory::MemoryStore;
pub use models::{
    Appointment, Claim, ContactMessage, NewAppointment, NewClaim, NewContactMessage, Policy,
    PortfolioStatistics, PortfolioSummary, Series, User, UserProfile,
};
pub use operations::DbOperations;

/// Lookup of user records by email or id. Absence is `Ok(None)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;
}

/// Record access for the back-office pages. `owner` of `None` means "all users".
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;

    async fn list_policies(&self, owner: Option<i64>) -> Result<Vec<Policy>, DatabaseError>;

    async fn get_policy(&self, id: i64) -> Result<Option<Policy>, DatabaseError>;

    async fn list_claims(&self, owner: Option<i64>) -> Result<Vec<Claim>, DatabaseError>;

    async fn create_claim(&self, claim: NewClaim) -> Result<Claim, DatabaseError>;

    /// Ordered by start, each row carrying its owner's name.
    async fn list_appointments(&self, owner: Option<i64>) -> Result<Vec<Appointment>, DatabaseError>;

    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Appointment, DatabaseError>;

    async fn create_contact_message(&self, message: NewContactMessage) -> Result<ContactMessage, DatabaseError>;

    async fn list_contact_messages(&self) -> Result<Vec<ContactMessage>, DatabaseError>;

    async fn statistics(&self) -> Result<PortfolioStatistics, DatabaseError>;
}
