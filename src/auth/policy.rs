//! Access policy table for the authorization gate
//!
//! Maps `(verb, path)` to an access level. Anonymous access is verb+path
//! exact: a path reachable anonymously with one verb still requires
//! authentication for every other verb. Unlisted operations default to
//! requiring authentication, including paths no route matches.

use axum::http::Method;

/// Access level for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Reachable without a token
    Anonymous,
    /// Requires a valid token
    Authenticated,
    /// Requires a valid token whose scope carries the named role
    RequiresScope(&'static str),
}

/// Policy table consulted by the authorization gate middleware
pub struct PolicyTable {
    entries: Vec<(Method, &'static str, Access)>,
}

impl PolicyTable {
    /// The service's fixed policy: registration, login, and introspection
    /// accept anonymous POSTs; health probes accept anonymous GETs.
    pub fn service_default() -> Self {
        Self {
            entries: vec![
                (Method::POST, "/users", Access::Anonymous),
                (Method::POST, "/auth/token", Access::Anonymous),
                (Method::POST, "/auth/introspect", Access::Anonymous),
                (Method::GET, "/health", Access::Anonymous),
                (Method::GET, "/ready", Access::Anonymous),
            ],
        }
    }

    /// Add an explicit entry; later entries take precedence over the default.
    pub fn with_entry(mut self, method: Method, path: &'static str, access: Access) -> Self {
        self.entries.push((method, path, access));
        self
    }

    /// Look up the access level for an operation. Unlisted operations
    /// require authentication.
    pub fn lookup(&self, method: &Method, path: &str) -> Access {
        self.entries
            .iter()
            .rev()
            .find(|(m, p, _)| m == method && *p == path)
            .map(|(_, _, access)| *access)
            .unwrap_or(Access::Authenticated)
    }
}
