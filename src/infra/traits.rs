//! Trait definitions for the identity repositories

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::collections::HashSet;

use crate::domain::{Permission, Role, User};

use super::Result;

/// User repository holds principals with hashed credentials.
///
/// All mutation must be serialized per-entity by the implementation; the
/// core never coordinates concurrent writes itself.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Check whether a username is taken
    async fn exists(&self, username: &str) -> Result<bool>;

    /// Insert a new user; fails with `DuplicateUser` on a taken username
    async fn insert(&self, user: User) -> Result<()>;

    /// Replace a user's role assignments
    async fn update_roles(&self, username: &str, roles: HashSet<String>) -> Result<()>;

    /// Delete a user by username
    async fn delete(&self, username: &str) -> Result<()>;

    /// List all users
    async fn list(&self) -> Result<Vec<User>>;

    /// Check whether any user still references the given role
    async fn any_with_role(&self, role: &str) -> Result<bool>;
}

/// Role repository holds role -> permission-set assignments.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Look up a role by name
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>>;

    /// Check whether a role exists
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Insert a new role; fails with `DuplicateRole` on a taken name
    async fn insert(&self, role: Role) -> Result<()>;

    /// Delete a role by name
    async fn delete(&self, name: &str) -> Result<()>;

    /// List all roles
    async fn list(&self) -> Result<Vec<Role>>;
}

/// Permission repository holds independent permission records.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Check whether a permission exists
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Insert a new permission; fails with `DuplicatePermission` on a taken name
    async fn insert(&self, permission: Permission) -> Result<()>;

    /// Delete a permission by name
    async fn delete(&self, name: &str) -> Result<()>;

    /// List all permissions
    async fn list(&self) -> Result<Vec<Permission>>;
}
