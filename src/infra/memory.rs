//! In-memory repository implementations
//!
//! Backed by `RwLock<HashMap>` for development and testing. Each method
//! takes the lock for the duration of the operation, which serializes
//! per-collection mutation.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::domain::{Permission, Role, User};

use super::{PermissionRepository, Result, RoleRepository, StoreError, UserRepository};

/// In-memory user store keyed by username
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().unwrap();
        Ok(users.get(username).cloned())
    }

    async fn exists(&self, username: &str) -> Result<bool> {
        let users = self.users.read().unwrap();
        Ok(users.contains_key(username))
    }

    async fn insert(&self, user: User) -> Result<()> {
        let mut users = self.users.write().unwrap();
        if users.contains_key(&user.username) {
            return Err(StoreError::DuplicateUser(user.username));
        }
        users.insert(user.username.clone(), user);
        Ok(())
    }

    async fn update_roles(&self, username: &str, roles: HashSet<String>) -> Result<()> {
        let mut users = self.users.write().unwrap();
        let user = users
            .get_mut(username)
            .ok_or_else(|| StoreError::UserNotFound(username.to_string()))?;
        user.roles = roles;
        Ok(())
    }

    async fn delete(&self, username: &str) -> Result<()> {
        let mut users = self.users.write().unwrap();
        users
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| StoreError::UserNotFound(username.to_string()))
    }

    async fn list(&self) -> Result<Vec<User>> {
        let users = self.users.read().unwrap();
        Ok(users.values().cloned().collect())
    }

    async fn any_with_role(&self, role: &str) -> Result<bool> {
        let users = self.users.read().unwrap();
        Ok(users.values().any(|u| u.roles.contains(role)))
    }
}

/// In-memory role store keyed by role name
#[derive(Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<HashMap<String, Role>>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>> {
        let roles = self.roles.read().unwrap();
        Ok(roles.get(name).cloned())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let roles = self.roles.read().unwrap();
        Ok(roles.contains_key(name))
    }

    async fn insert(&self, role: Role) -> Result<()> {
        let mut roles = self.roles.write().unwrap();
        if roles.contains_key(&role.name) {
            return Err(StoreError::DuplicateRole(role.name));
        }
        roles.insert(role.name.clone(), role);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let mut roles = self.roles.write().unwrap();
        roles
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::RoleNotFound(name.to_string()))
    }

    async fn list(&self) -> Result<Vec<Role>> {
        let roles = self.roles.read().unwrap();
        Ok(roles.values().cloned().collect())
    }
}

/// In-memory permission store keyed by permission name
#[derive(Default)]
pub struct InMemoryPermissionRepository {
    permissions: RwLock<HashMap<String, Permission>>,
}

impl InMemoryPermissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn exists(&self, name: &str) -> Result<bool> {
        let permissions = self.permissions.read().unwrap();
        Ok(permissions.contains_key(name))
    }

    async fn insert(&self, permission: Permission) -> Result<()> {
        let mut permissions = self.permissions.write().unwrap();
        if permissions.contains_key(&permission.name) {
            return Err(StoreError::DuplicatePermission(permission.name));
        }
        permissions.insert(permission.name.clone(), permission);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let mut permissions = self.permissions.write().unwrap();
        permissions
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::PermissionNotFound(name.to_string()))
    }

    async fn list(&self) -> Result<Vec<Permission>> {
        let permissions = self.permissions.read().unwrap();
        Ok(permissions.values().cloned().collect())
    }
}
