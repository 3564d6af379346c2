//! Authorization gate middleware for axum
//!
//! Consults the policy table for every request (matched or not), verifies
//! Bearer tokens, and attaches the authenticated context to the request.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{Access, AuthContext, AuthError, PolicyTable, TokenVerifier};

/// Auth context extension attached to authenticated requests
#[derive(Clone)]
pub struct AuthContextExt(pub AuthContext);

/// Authorization gate configuration/state
#[derive(Clone)]
pub struct GateState {
    pub verifier: Arc<TokenVerifier>,
    pub policy: Arc<PolicyTable>,
}

impl GateState {
    pub fn new(verifier: Arc<TokenVerifier>, policy: Arc<PolicyTable>) -> Self {
        Self { verifier, policy }
    }

    /// Authenticate a request against the policy for its verb and path.
    ///
    /// Returns `Ok(None)` for anonymous operations and `Ok(Some(context))`
    /// for authenticated ones.
    pub fn authorize(
        &self,
        method: &axum::http::Method,
        path: &str,
        auth_header: Option<&str>,
    ) -> Result<Option<AuthContext>, AuthError> {
        let access = self.policy.lookup(method, path);
        if access == Access::Anonymous {
            return Ok(None);
        }

        let header = auth_header.ok_or(AuthError::MissingAuth)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MissingAuth)?;

        let context = self.verifier.context(token)?;

        if let Access::RequiresScope(role) = access {
            if !context.has_scope(role) {
                return Err(AuthError::InsufficientScope(role.to_string()));
            }
        }

        Ok(Some(context))
    }
}

/// Authorization gate middleware
pub async fn authorization_gate(
    State(state): State<GateState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match state.authorize(&method, &path, auth_header) {
        Ok(Some(context)) => {
            request.extensions_mut().insert(AuthContextExt(context));
        }
        Ok(None) => {}
        Err(e) => return gate_error_response(e),
    }

    next.run(request).await
}

/// Convert a gate failure to an HTTP response.
///
/// All authentication failures collapse to one unauthenticated body so the
/// response never reveals why verification failed.
fn gate_error_response(error: AuthError) -> Response {
    let (status, code, message) = match error {
        AuthError::MalformedToken => (
            StatusCode::BAD_REQUEST,
            "MALFORMED_TOKEN",
            "Token is not well formed",
        ),
        AuthError::InsufficientScope(_) => (
            StatusCode::FORBIDDEN,
            "INSUFFICIENT_SCOPE",
            "Insufficient scope",
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHENTICATED",
            "Unauthenticated",
        ),
    };

    (
        status,
        axum::Json(serde_json::json!({
            "error": {
                "code": code,
                "message": message,
            }
        })),
    )
        .into_response()
}
