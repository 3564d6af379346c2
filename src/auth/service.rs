//! Authentication service: login and token introspection

use std::sync::Arc;
use tracing::debug;

use crate::infra::UserRepository;

use super::{password, AuthError, TokenIssuer, TokenVerifier};

/// Authentication flow: credential check followed by token issuance, plus
/// introspection for callers that do not hold the signing secret.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, issuer: TokenIssuer, verifier: TokenVerifier) -> Self {
        Self {
            users,
            issuer,
            verifier,
        }
    }

    /// Authenticate a username/password pair and issue a token.
    ///
    /// The two failure modes are distinct here; the API layer collapses
    /// them into one unauthenticated response.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(username.to_string()))?;

        let matched = password::verify_password(password, &user.password_hash).await?;
        if !matched {
            debug!(username, "credential mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        self.issuer.issue(&user)
    }

    /// Check a token's validity without performing a new login.
    pub fn introspect(&self, token: &str) -> Result<bool, AuthError> {
        self.verifier.verify(token)
    }
}
