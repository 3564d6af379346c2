//! HTTP server bootstrap for the identity service.
//!
//! This module wires together:
//! - configuration
//! - repositories
//! - the authentication service and token issuer/verifier
//! - the axum router behind the authorization gate

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use crate::auth::{
    authorization_gate, AuthService, GateState, PolicyTable, TokenIssuer, TokenVerifier,
};
use crate::infra::{
    InMemoryPermissionRepository, InMemoryRoleRepository, InMemoryUserRepository,
    PermissionRepository, RoleRepository, UserRepository,
};

/// Minimum signing key length for HS512 (512-bit HMAC)
pub const MIN_SIGNER_KEY_BYTES: usize = 64;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// HMAC signing secret for tokens.
    pub signer_key: String,
    /// Issuer label embedded in every token.
    pub issuer: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A missing, empty, or too-short `JWT_SIGNER_KEY` is a fatal startup
    /// error, never a per-request failure.
    pub fn from_env() -> anyhow::Result<Self> {
        let signer_key = std::env::var("JWT_SIGNER_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_SIGNER_KEY is required"))?;

        if signer_key.len() < MIN_SIGNER_KEY_BYTES {
            anyhow::bail!(
                "JWT_SIGNER_KEY must be at least {} bytes for HS512 (got {})",
                MIN_SIGNER_KEY_BYTES,
                signer_key.len()
            );
        }

        let issuer = std::env::var("JWT_ISSUER").unwrap_or_else(|_| "identity-service".to_string());

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address: {e}"))?;

        Ok(Self {
            listen_addr,
            signer_key,
            issuer,
        })
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub permissions: Arc<dyn PermissionRepository>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Assemble the state from repositories and the configured secret.
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        permissions: Arc<dyn PermissionRepository>,
        signer_key: &str,
        issuer: &str,
    ) -> Self {
        let auth = Arc::new(AuthService::new(
            users.clone(),
            TokenIssuer::new(signer_key.as_bytes(), issuer),
            TokenVerifier::new(signer_key.as_bytes()),
        ));

        Self {
            users,
            roles,
            permissions,
            auth,
        }
    }
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting identity service v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Token issuer: {}", config.issuer);

    let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
    let roles: Arc<dyn RoleRepository> = Arc::new(InMemoryRoleRepository::new());
    let permissions: Arc<dyn PermissionRepository> = Arc::new(InMemoryPermissionRepository::new());

    let state = AppState::new(
        users,
        roles,
        permissions,
        &config.signer_key,
        &config.issuer,
    );

    let gate_state = GateState::new(
        Arc::new(TokenVerifier::new(config.signer_key.as_bytes())),
        Arc::new(PolicyTable::service_default()),
    );

    let app = build_router(gate_state)?.with_state(state);

    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("Identity service is ready to accept connections");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}

/// Build the router with the authorization gate in front of every route.
///
/// The fallback is registered before the gate layer so unrouted paths are
/// still subject to the policy table: an unauthenticated request to an
/// unknown path is rejected as unauthenticated, not reported as missing.
pub fn build_router(gate_state: GateState) -> anyhow::Result<Router<AppState>> {
    let mut router = crate::api::router()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .fallback(not_found)
        .layer(axum::middleware::from_fn_with_state(
            gate_state,
            authorization_gate,
        ))
        .layer(TraceLayer::new_for_http());

    if let Some(cors_layer) = cors_layer_from_env()? {
        router = router.layer(cors_layer);
    }

    Ok(router)
}

fn cors_layer_from_env() -> anyhow::Result<Option<CorsLayer>> {
    let origins = match std::env::var("CORS_ALLOW_ORIGINS") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let origins = origins.trim();
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ]),
    ))
}

/// Health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "service": "identity-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check endpoint.
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, (axum::http::StatusCode, String)> {
    // Exercise the repository path to confirm the store is reachable.
    match state.users.exists("").await {
        Ok(_) => Ok(axum::Json(serde_json::json!({
            "status": "ready",
        }))),
        Err(e) => Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            format!("Store unavailable: {e}"),
        )),
    }
}

async fn not_found() -> (axum::http::StatusCode, axum::Json<serde_json::Value>) {
    (
        axum::http::StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({
            "error": { "code": "NOT_FOUND", "message": "No such operation" }
        })),
    )
}
