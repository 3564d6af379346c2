//! Error types for the repository layer

use thiserror::Error;

/// Errors that can occur in the identity repositories
#[derive(Error, Debug)]
pub enum StoreError {
    /// A user with this username already exists
    #[error("user already exists: {0}")]
    DuplicateUser(String),

    /// User not found
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// A role with this name already exists
    #[error("role already exists: {0}")]
    DuplicateRole(String),

    /// Role not found
    #[error("role not found: {0}")]
    RoleNotFound(String),

    /// Role is still assigned to at least one user
    #[error("role still referenced by users: {0}")]
    RoleInUse(String),

    /// A permission with this name already exists
    #[error("permission already exists: {0}")]
    DuplicatePermission(String),

    /// Permission not found
    #[error("permission not found: {0}")]
    PermissionNotFound(String),

    /// Internal storage error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, StoreError>;
