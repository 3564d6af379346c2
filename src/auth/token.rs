//! JWT issuance and verification
//!
//! HS512 tokens with a role-scope claim. The issuer and verifier are
//! independent: each is constructed from the shared secret and nothing
//! else, so verification can run on replicas that never issue.

use super::{AuthContext, AuthError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{crypto, encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::domain::User;

/// Token validity window: one hour from issuance
pub const TOKEN_TTL_SECS: i64 = 3600;

/// JWT claims for the identity service
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Issuer label
    pub iss: String,

    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,

    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,

    /// Space-separated role names; empty when the user has no roles
    #[serde(default)]
    pub scope: String,
}

/// Build the scope claim from a user's role set.
///
/// Role names are sorted so the claim is deterministic for a given set.
pub fn build_scope(user: &User) -> String {
    let mut names: Vec<&str> = user.roles.iter().map(String::as_str).collect();
    names.sort_unstable();
    names.join(" ")
}

/// Token issuer holding the encoding half of the shared secret
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    issuer: String,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], issuer: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            issuer: issuer.to_string(),
            ttl: Duration::seconds(TOKEN_TTL_SECS),
        }
    }

    /// Issue a signed token for the user
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a signed token as of a fixed instant
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user.username.clone(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            scope: build_scope(user),
        };

        encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

/// Outcome of structurally decoding a token
#[derive(Debug)]
pub struct DecodedToken {
    pub claims: Claims,
    pub signature_valid: bool,
}

/// Token verifier holding the decoding half of the shared secret
pub struct TokenVerifier {
    decoding_key: DecodingKey,
}

impl TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Verify a token: signature match AND now strictly before expiry.
    ///
    /// Returns `Ok(false)` for a well-formed token with a bad signature or
    /// past expiry; `Err(MalformedToken)` only for structural failures.
    pub fn verify(&self, token: &str) -> Result<bool, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify against a caller-supplied clock
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<bool, AuthError> {
        let decoded = self.decode(token)?;
        Ok(decoded.signature_valid && now.timestamp() < decoded.claims.exp)
    }

    /// Verify a token and extract the request context from its claims
    pub fn context(&self, token: &str) -> Result<AuthContext, AuthError> {
        self.context_at(token, Utc::now())
    }

    pub fn context_at(&self, token: &str, now: DateTime<Utc>) -> Result<AuthContext, AuthError> {
        let decoded = self.decode(token)?;
        if !decoded.signature_valid || now.timestamp() >= decoded.claims.exp {
            return Err(AuthError::InvalidToken);
        }

        Ok(AuthContext {
            subject: decoded.claims.sub,
            scope: decoded
                .claims
                .scope
                .split_whitespace()
                .map(String::from)
                .collect(),
        })
    }

    /// Structurally decode a token and check its signature.
    ///
    /// Structure requires exactly three dot-separated segments, a decodable
    /// JWT header, and a base64url payload holding claim JSON. A signature
    /// segment that fails to decode counts as a signature mismatch, not a
    /// structural error.
    pub fn decode(&self, token: &str) -> Result<DecodedToken, AuthError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(AuthError::MalformedToken);
        }
        let (header_b64, payload_b64, signature_b64) = (parts[0], parts[1], parts[2]);

        jsonwebtoken::decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::MalformedToken)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::MalformedToken)?;

        let message = &token[..header_b64.len() + 1 + payload_b64.len()];
        let signature_valid = crypto::verify(
            signature_b64,
            message.as_bytes(),
            &self.decoding_key,
            Algorithm::HS512,
        )
        .unwrap_or(false);

        Ok(DecodedToken {
            claims,
            signature_valid,
        })
    }
}
