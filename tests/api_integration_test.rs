//! REST API integration tests for the identity service.
//!
//! These tests drive the full router - authorization gate included -
//! against in-memory repositories, so they run without any external
//! service.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use http_body_util::BodyExt;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use identity_service::auth::{self, GateState, PolicyTable, TokenVerifier, TOKEN_TTL_SECS};
use identity_service::domain::{Role, User};
use identity_service::infra::{
    InMemoryPermissionRepository, InMemoryRoleRepository, InMemoryUserRepository,
    PermissionRepository, RoleRepository, UserRepository,
};
use identity_service::server::{build_router, AppState};

const SIGNER_KEY: &str =
    "integration-test-signer-key-integration-test-signer-key-0123456789abcdef";

// ============================================================================
// Test Helpers
// ============================================================================

/// Create application state seeded with the ADMIN/USER roles and the user
/// "alice" holding both.
async fn create_test_state() -> AppState {
    let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
    let roles: Arc<dyn RoleRepository> = Arc::new(InMemoryRoleRepository::new());
    let permissions: Arc<dyn PermissionRepository> =
        Arc::new(InMemoryPermissionRepository::new());

    roles.insert(Role::new("ADMIN")).await.unwrap();
    roles.insert(Role::new("USER")).await.unwrap();
    roles.insert(Role::new("AUDITOR")).await.unwrap();

    let hash = auth::hash_password("secret123", Some(4)).await.unwrap();
    users
        .insert(User::new("alice", hash).with_roles(["ADMIN", "USER"]))
        .await
        .unwrap();

    AppState::new(users, roles, permissions, SIGNER_KEY, "identity-service")
}

fn create_test_router(state: AppState) -> axum::Router {
    let gate_state = GateState::new(
        Arc::new(TokenVerifier::new(SIGNER_KEY.as_bytes())),
        Arc::new(PolicyTable::service_default()),
    );
    build_router(gate_state).unwrap().with_state(state)
}

async fn send_json(
    app: &axum::Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &axum::Router, username: &str, password: &str) -> String {
    let (status, body) = send_json(
        app,
        Method::POST,
        "/auth/token",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
    body["token"].as_str().unwrap().to_string()
}

/// Decode a token's payload segment without verifying it.
fn decode_claims(token: &str) -> serde_json::Value {
    let payload = token.split('.').nth(1).unwrap();
    let bytes = URL_SAFE_NO_PAD.decode(payload).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Authentication flow
// ============================================================================

#[tokio::test]
async fn login_issues_token_with_role_scope() {
    let app = create_test_router(create_test_state().await);

    let token = login(&app, "alice", "secret123").await;
    let claims = decode_claims(&token);

    assert_eq!(claims["sub"], "alice");
    assert_eq!(claims["iss"], "identity-service");
    assert_eq!(claims["scope"], "ADMIN USER");
    assert_eq!(
        claims["exp"].as_i64().unwrap(),
        claims["iat"].as_i64().unwrap() + TOKEN_TTL_SECS
    );
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_indistinguishable() {
    let app = create_test_router(create_test_state().await);

    let (status_a, body_a) = send_json(
        &app,
        Method::POST,
        "/auth/token",
        None,
        Some(json!({ "username": "alice", "password": "wrongpass" })),
    )
    .await;

    let (status_b, body_b) = send_json(
        &app,
        Method::POST,
        "/auth/token",
        None,
        Some(json!({ "username": "no-such-user", "password": "wrongpass" })),
    )
    .await;

    assert_eq!(status_a, StatusCode::UNAUTHORIZED);
    assert_eq!(status_b, StatusCode::UNAUTHORIZED);
    assert_eq!(body_a, body_b);
    assert_eq!(body_a["error"]["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn anonymous_get_to_the_token_path_is_rejected() {
    let app = create_test_router(create_test_state().await);

    // POST is on the allow-list; GET to the same path is not.
    let (status, body) = send_json(&app, Method::GET, "/auth/token", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
}

// ============================================================================
// Introspection
// ============================================================================

#[tokio::test]
async fn introspection_reports_validity_anonymously() {
    let app = create_test_router(create_test_state().await);
    let token = login(&app, "alice", "secret123").await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/auth/introspect",
        None,
        Some(json!({ "token": token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    // Tamper with the signature: still a 200, valid=false.
    let mut tampered = token.clone();
    let flipped = if tampered.ends_with('A') { 'B' } else { 'A' };
    tampered.pop();
    tampered.push(flipped);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/auth/introspect",
        None,
        Some(json!({ "token": tampered })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn introspection_rejects_malformed_tokens_as_client_errors() {
    let app = create_test_router(create_test_state().await);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/auth/introspect",
        None,
        Some(json!({ "token": "definitely-not-a-jwt" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MALFORMED_TOKEN");
}

// ============================================================================
// Authorization gate
// ============================================================================

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = create_test_router(create_test_state().await);

    let (status, _) = send_json(&app, Method::GET, "/roles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app, "alice", "secret123").await;
    let (status, body) = send_json(&app, Method::GET, "/roles", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn unrouted_paths_still_pass_through_the_gate() {
    let app = create_test_router(create_test_state().await);

    // Without a token the gate answers before routing does.
    let (status, _) = send_json(&app, Method::GET, "/no/such/path", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // With a token the router's fallback answers.
    let token = login(&app, "alice", "secret123").await;
    let (status, _) = send_json(&app, Method::GET, "/no/such/path", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_probe_is_anonymous() {
    let app = create_test_router(create_test_state().await);

    let (status, body) = send_json(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

// ============================================================================
// Registration and user management
// ============================================================================

#[tokio::test]
async fn registration_is_anonymous_and_grants_the_default_role() {
    let app = create_test_router(create_test_state().await);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "username": "bob", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "bob");
    assert_eq!(body["roles"], json!(["USER"]));

    // The new credentials authenticate.
    let token = login(&app, "bob", "password123").await;
    assert_eq!(decode_claims(&token)["scope"], "USER");
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let app = create_test_router(create_test_state().await);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "username": "alice", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "USER_EXISTS");
}

#[tokio::test]
async fn weak_password_is_rejected_at_registration() {
    let app = create_test_router(create_test_state().await);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "username": "carol", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "WEAK_PASSWORD");
}

#[tokio::test]
async fn role_assignment_snapshots_do_not_rewrite_issued_tokens() {
    let app = create_test_router(create_test_state().await);
    let token = login(&app, "alice", "secret123").await;

    // Reassign alice to a single role after her token was issued.
    let (status, body) = send_json(
        &app,
        Method::PUT,
        "/users/alice/roles",
        Some(&token),
        Some(json!({ "roles": ["AUDITOR"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roles"], json!(["AUDITOR"]));

    // The already-issued token still carries the issuance-time scope and
    // still verifies.
    assert_eq!(decode_claims(&token)["scope"], "ADMIN USER");
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/auth/introspect",
        None,
        Some(json!({ "token": token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
}

#[tokio::test]
async fn assigning_an_unknown_role_fails() {
    let app = create_test_router(create_test_state().await);
    let token = login(&app, "alice", "secret123").await;

    let (status, body) = send_json(
        &app,
        Method::PUT,
        "/users/alice/roles",
        Some(&token),
        Some(json!({ "roles": ["NO_SUCH_ROLE"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "ROLE_NOT_FOUND");
}

// ============================================================================
// Role and permission management
// ============================================================================

#[tokio::test]
async fn deleting_a_referenced_role_is_a_conflict() {
    let app = create_test_router(create_test_state().await);
    let token = login(&app, "alice", "secret123").await;

    // ADMIN is held by alice.
    let (status, body) = send_json(&app, Method::DELETE, "/roles/ADMIN", Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ROLE_IN_USE");

    // AUDITOR is unreferenced and deletes cleanly.
    let (status, _) = send_json(&app, Method::DELETE, "/roles/AUDITOR", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn roles_only_reference_existing_permissions() {
    let app = create_test_router(create_test_state().await);
    let token = login(&app, "alice", "secret123").await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/roles",
        Some(&token),
        Some(json!({ "name": "MODERATOR", "permissions": ["APPROVE_POST"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "PERMISSION_NOT_FOUND");

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/permissions",
        Some(&token),
        Some(json!({ "name": "APPROVE_POST", "description": "Approve a post" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/roles",
        Some(&token),
        Some(json!({ "name": "MODERATOR", "permissions": ["APPROVE_POST"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["permissions"], json!(["APPROVE_POST"]));
}
