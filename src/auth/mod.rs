//! Authentication and authorization for the identity service
//!
//! # Authentication
//!
//! Credentials are checked against bcrypt hashes held by the user
//! repository. A successful login yields an HS512-signed JWT carrying a
//! `scope` claim: the space-joined role names of the principal at issuance
//! time. Scope is a snapshot - later role changes never affect tokens that
//! are already out.
//!
//! # Verification
//!
//! The [`TokenVerifier`] shares only the signing secret with the
//! [`TokenIssuer`] and can run in a separate replica. A token is valid when
//! its signature matches and the current time is strictly before `exp`.
//! Signature mismatch and expiry report `valid = false`; only structural
//! malformation is an error.
//!
//! # Authorization
//!
//! [`middleware::authorization_gate`] consults a [`PolicyTable`] mapping
//! `(verb, path)` to an access level. A fixed allow-list of verb+path pairs
//! is reachable anonymously; everything else requires a valid Bearer token.
//!
//! # Configuration
//!
//! - `JWT_SIGNER_KEY`: HMAC secret, required, at least 64 bytes for HS512
//! - `JWT_ISSUER`: issuer label embedded in the `iss` claim

mod middleware;
mod password;
mod policy;
mod service;
mod token;

pub use middleware::*;
pub use password::*;
pub use policy::*;
pub use service::*;
pub use token::*;

use crate::infra::StoreError;

/// Authenticated request context reconstructed from a verified token
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Subject (username) from the token
    pub subject: String,

    /// Role names from the token's scope claim
    pub scope: Vec<String>,
}

impl AuthContext {
    /// Check whether the scope claim carries the given role name
    pub fn has_scope(&self, role: &str) -> bool {
        self.scope.iter().any(|s| s == role)
    }
}

/// Authentication error
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing authentication")]
    MissingAuth,

    /// Token is not structurally a JWT (parse failure, distinct from an
    /// invalid-but-well-formed token)
    #[error("malformed token")]
    MalformedToken,

    /// Well-formed token that failed verification (bad signature or expired)
    #[error("invalid token")]
    InvalidToken,

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("insufficient scope: requires {0}")]
    InsufficientScope(String),

    #[error("password too weak: {0}")]
    WeakPassword(String),

    #[error("password hashing error: {0}")]
    Hashing(String),

    #[error("token signing error: {0}")]
    Signing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
