//! Identity Service Library
//!
//! Token-based identity service: credential authentication, HS512 JWT
//! issuance and introspection, and role/permission management.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (users, roles, permissions)
//! - [`infra`] - Repository traits and in-memory implementations
//! - [`auth`] - Token issuance/verification, password hashing, the
//!   authorization gate middleware
//! - [`api`] - REST API routes
//! - [`server`] - Configuration and HTTP server bootstrap

pub mod api;
pub mod auth;
pub mod domain;
pub mod infra;
pub mod server;

// Re-export commonly used types
pub use auth::{AuthContext, AuthError, AuthService, TokenIssuer, TokenVerifier};
pub use domain::{Permission, Role, User};
pub use infra::{PermissionRepository, Result, RoleRepository, StoreError, UserRepository};
