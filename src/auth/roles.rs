use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Coarse authorization tag stored on each user.
///
/// The set is open: any string read from the store is a valid role, the
/// constructors below only name the tags the back office knows about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn admin() -> Self {
        Self(Cow::Borrowed("admin"))
    }

    pub const fn adviseur() -> Self {
        Self(Cow::Borrowed("adviseur"))
    }

    pub const fn client() -> Self {
        Self(Cow::Borrowed("client"))
    }

    /// Older records tag customers as `user` rather than `client`.
    pub const fn user() -> Self {
        Self(Cow::Borrowed("user"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Brokerage staff see every customer's records.
    pub fn is_staff(&self) -> bool {
        matches!(self.as_str(), "admin" | "adviseur")
    }

    pub fn is_customer(&self) -> bool {
        matches!(self.as_str(), "client" | "user")
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name.to_string())
    }
}
