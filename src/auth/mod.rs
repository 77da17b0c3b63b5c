//! Authentication and authorization core.
//!
//! Login checks a password against the stored digest and mints a short-lived
//! bearer token carrying only the user id. Every guarded request verifies the
//! token and reloads the user, so role and name changes apply immediately.

pub mod guard;
pub mod handlers;
pub mod password;
mod roles;
mod service;
pub mod token;

pub use guard::{AccessGuard, AdminOnly, AnyUser, GuardPolicy, Guarded, StaffOnly};
pub use password::{Argon2Hasher, PasswordHasher};
pub use roles::Role;
pub use service::{AuthService, LoginResponse, ResolvedIdentity};
pub use token::{Claims, Clock, SystemClock, TokenService};
