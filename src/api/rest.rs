//! REST API endpoints for the identity service.

use axum::extract::{Extension, Path, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

use crate::auth::{hash_password, validate_password, AuthContextExt};
use crate::domain::{Permission, Role, User};
use crate::server::AppState;

use super::ApiError;

/// Role assigned to every newly registered user
pub const DEFAULT_ROLE: &str = "USER";

/// Build the service router.
pub fn router() -> Router<AppState> {
    Router::new()
        // Registration and authentication
        .route("/users", post(create_user))
        .route("/auth/token", post(authenticate))
        .route("/auth/introspect", post(introspect))
        // User management
        .route("/users", get(list_users))
        .route("/users/:username", get(get_user))
        .route("/users/:username", delete(delete_user))
        .route("/users/:username/roles", put(assign_roles))
        // Role management
        .route("/roles", post(create_role))
        .route("/roles", get(list_roles))
        .route("/roles/:role", delete(delete_role))
        // Permission management
        .route("/permissions", post(create_permission))
        .route("/permissions", get(list_permissions))
        .route("/permissions/:permission", delete(delete_permission))
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Deserialize)]
struct UserCreationRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    username: String,
    roles: Vec<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let mut roles: Vec<String> = user.roles.into_iter().collect();
        roles.sort_unstable();
        Self {
            username: user.username,
            roles,
        }
    }
}

async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<UserCreationRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    validate_password(&request.password)?;

    let hash = hash_password(&request.password, None).await?;
    let user = User::new(request.username, hash).with_roles([DEFAULT_ROLE]);

    state.users.insert(user.clone()).await?;
    info!(username = %user.username, "user registered");

    Ok(Json(user.into()))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let mut users: Vec<UserResponse> = state
        .users
        .list()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    users.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(Json(users))
}

async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| crate::infra::StoreError::UserNotFound(username))?;
    Ok(Json(user.into()))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(username): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.users.delete(&username).await?;
    info!(%username, by = %auth.subject, "user deleted");
    Ok(Json(serde_json::json!({ "deleted": username })))
}

#[derive(Debug, Deserialize)]
struct RoleAssignmentRequest {
    roles: Vec<String>,
}

async fn assign_roles(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(request): Json<RoleAssignmentRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    // Every assigned role must exist.
    for role in &request.roles {
        if !state.roles.exists(role).await? {
            return Err(crate::infra::StoreError::RoleNotFound(role.clone()).into());
        }
    }

    let roles: HashSet<String> = request.roles.into_iter().collect();
    state.users.update_roles(&username, roles).await?;

    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| crate::infra::StoreError::UserNotFound(username))?;
    Ok(Json(user.into()))
}

// ============================================================================
// Authentication
// ============================================================================

#[derive(Debug, Deserialize)]
struct AuthenticationRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthenticationResponse {
    token: String,
    authenticated: bool,
}

async fn authenticate(
    State(state): State<AppState>,
    Json(request): Json<AuthenticationRequest>,
) -> Result<Json<AuthenticationResponse>, ApiError> {
    let token = state
        .auth
        .authenticate(&request.username, &request.password)
        .await?;

    Ok(Json(AuthenticationResponse {
        token,
        authenticated: true,
    }))
}

#[derive(Debug, Deserialize)]
struct IntrospectRequest {
    token: String,
}

#[derive(Debug, Serialize)]
struct IntrospectResponse {
    valid: bool,
}

async fn introspect(
    State(state): State<AppState>,
    Json(request): Json<IntrospectRequest>,
) -> Result<Json<IntrospectResponse>, ApiError> {
    let valid = state.auth.introspect(&request.token)?;
    Ok(Json(IntrospectResponse { valid }))
}

// ============================================================================
// Roles
// ============================================================================

#[derive(Debug, Deserialize)]
struct RoleRequest {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RoleResponse {
    name: String,
    description: Option<String>,
    permissions: Vec<String>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        let mut permissions: Vec<String> = role.permissions.into_iter().collect();
        permissions.sort_unstable();
        Self {
            name: role.name,
            description: role.description,
            permissions,
        }
    }
}

async fn create_role(
    State(state): State<AppState>,
    Json(request): Json<RoleRequest>,
) -> Result<Json<RoleResponse>, ApiError> {
    // Every referenced permission must exist.
    for permission in &request.permissions {
        if !state.permissions.exists(permission).await? {
            return Err(crate::infra::StoreError::PermissionNotFound(permission.clone()).into());
        }
    }

    let role = Role {
        name: request.name,
        description: request.description,
        permissions: request.permissions.into_iter().collect(),
    };

    state.roles.insert(role.clone()).await?;
    info!(role = %role.name, "role created");

    Ok(Json(role.into()))
}

async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<RoleResponse>>, ApiError> {
    let mut roles: Vec<RoleResponse> = state
        .roles
        .list()
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();
    roles.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(roles))
}

async fn delete_role(
    State(state): State<AppState>,
    Extension(AuthContextExt(auth)): Extension<AuthContextExt>,
    Path(role): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // Deleting a role still assigned to users is a conflict, never a
    // silent cascade.
    if state.users.any_with_role(&role).await? {
        return Err(crate::infra::StoreError::RoleInUse(role).into());
    }

    state.roles.delete(&role).await?;
    info!(%role, by = %auth.subject, "role deleted");
    Ok(Json(serde_json::json!({ "deleted": role })))
}

// ============================================================================
// Permissions
// ============================================================================

#[derive(Debug, Deserialize)]
struct PermissionRequest {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

async fn create_permission(
    State(state): State<AppState>,
    Json(request): Json<PermissionRequest>,
) -> Result<Json<Permission>, ApiError> {
    let permission = Permission {
        name: request.name,
        description: request.description,
    };

    state.permissions.insert(permission.clone()).await?;
    info!(permission = %permission.name, "permission created");

    Ok(Json(permission))
}

async fn list_permissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Permission>>, ApiError> {
    let mut permissions = state.permissions.list().await?;
    permissions.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(permissions))
}

async fn delete_permission(
    State(state): State<AppState>,
    Path(permission): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.permissions.delete(&permission).await?;
    info!(%permission, "permission deleted");
    Ok(Json(serde_json::json!({ "deleted": permission })))
}
