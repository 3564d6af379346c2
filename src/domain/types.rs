//! Entity definitions: users, roles, and permissions.
//!
//! Users reference roles by name; roles reference permissions by name.
//! Record ownership lives in the repositories (see [`crate::infra`]) - these
//! types carry no storage concerns.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A registered principal.
///
/// The username is the unique key. The password is only ever held as a
/// bcrypt hash; the plaintext never leaves the authentication path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,

    /// bcrypt hash string (includes salt and cost).
    pub password_hash: String,

    /// Assigned role names. Order is irrelevant.
    #[serde(default)]
    pub roles: HashSet<String>,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            roles: HashSet::new(),
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }
}

/// A named role owning a set of permission names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Permission names granted by this role.
    #[serde(default)]
    pub permissions: HashSet<String>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            permissions: HashSet::new(),
        }
    }
}

/// A named permission. May exist unreferenced by any role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}
