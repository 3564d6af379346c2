//! Structured API error responses with error codes
//!
//! Stable machine-readable codes plus human-readable messages. The mapping
//! deliberately collapses `UserNotFound` and `InvalidCredentials` into one
//! `UNAUTHENTICATED` response so the API never reveals whether a username
//! exists.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::infra::StoreError;

/// Error codes for API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Credentials or token rejected; covers unknown user, bad password,
    /// missing token, bad signature, and expiry alike
    Unauthenticated,
    /// Token is structurally not a JWT
    MalformedToken,
    /// Token lacks a required scope
    InsufficientScope,
    /// Password fails the strength policy
    WeakPassword,
    /// Username already taken
    UserExists,
    /// User not found (management operations only, never login)
    UserNotFound,
    /// Role name already taken
    RoleExists,
    /// Role not found
    RoleNotFound,
    /// Role still assigned to at least one user
    RoleInUse,
    /// Permission name already taken
    PermissionExists,
    /// Permission not found
    PermissionNotFound,
    /// Unexpected internal failure
    Internal,
}

/// API error carrying the HTTP status and response body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// The uniform unauthenticated response
    pub fn unauthenticated() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthenticated,
            "Unauthenticated",
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({
                "error": {
                    "code": self.code,
                    "message": self.message,
                }
            })),
        )
            .into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            // Never distinguish unknown user from wrong password.
            AuthError::UserNotFound(_)
            | AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::MissingAuth => ApiError::unauthenticated(),
            AuthError::MalformedToken => ApiError::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::MalformedToken,
                "Token is not well formed",
            ),
            AuthError::InsufficientScope(role) => ApiError::new(
                StatusCode::FORBIDDEN,
                ErrorCode::InsufficientScope,
                format!("Requires scope {role}"),
            ),
            AuthError::WeakPassword(reason) => ApiError::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::WeakPassword,
                format!("Password too weak: {reason}"),
            ),
            AuthError::Hashing(e) | AuthError::Signing(e) => ApiError::internal(e),
            AuthError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateUser(u) => ApiError::new(
                StatusCode::CONFLICT,
                ErrorCode::UserExists,
                format!("User already exists: {u}"),
            ),
            StoreError::UserNotFound(u) => ApiError::new(
                StatusCode::NOT_FOUND,
                ErrorCode::UserNotFound,
                format!("User not found: {u}"),
            ),
            StoreError::DuplicateRole(r) => ApiError::new(
                StatusCode::CONFLICT,
                ErrorCode::RoleExists,
                format!("Role already exists: {r}"),
            ),
            StoreError::RoleNotFound(r) => ApiError::new(
                StatusCode::NOT_FOUND,
                ErrorCode::RoleNotFound,
                format!("Role not found: {r}"),
            ),
            StoreError::RoleInUse(r) => ApiError::new(
                StatusCode::CONFLICT,
                ErrorCode::RoleInUse,
                format!("Role still referenced by users: {r}"),
            ),
            StoreError::DuplicatePermission(p) => ApiError::new(
                StatusCode::CONFLICT,
                ErrorCode::PermissionExists,
                format!("Permission already exists: {p}"),
            ),
            StoreError::PermissionNotFound(p) => ApiError::new(
                StatusCode::NOT_FOUND,
                ErrorCode::PermissionNotFound,
                format!("Permission not found: {p}"),
            ),
            StoreError::Internal(e) => ApiError::internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_failures_are_indistinguishable() {
        let not_found: ApiError = AuthError::UserNotFound("ghost".to_string()).into();
        let bad_password: ApiError = AuthError::InvalidCredentials.into();

        assert_eq!(not_found.status, bad_password.status);
        assert_eq!(not_found.code, bad_password.code);
        assert_eq!(not_found.message, bad_password.message);
        // The username must not leak into the body.
        assert!(!not_found.message.contains("ghost"));
    }

    #[test]
    fn malformed_token_is_a_client_error() {
        let error: ApiError = AuthError::MalformedToken.into();
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.code, ErrorCode::MalformedToken);
    }

    #[test]
    fn role_in_use_is_a_conflict() {
        let error: ApiError = StoreError::RoleInUse("ADMIN".to_string()).into();
        assert_eq!(error.status, StatusCode::CONFLICT);
        assert_eq!(error.code, ErrorCode::RoleInUse);
    }
}
