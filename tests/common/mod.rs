// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use gympro::config::Config;
use gympro::db::MemoryBackend;
use gympro::models::Role;
use gympro::routes::create_router;
use gympro::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse";

/// Create a test app backed by in-memory tables.
/// Returns the router, the shared state and the backend for seeding.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let state = Arc::new(AppState::new(
        Config::test_default(),
        backend.clone(),
        backend.clone(),
    ));
    (create_router(state.clone()), state, backend)
}

/// Seed an account and sign it in. Returns `(user_id, cookie header value)`.
#[allow(dead_code)]
pub async fn sign_in_as(
    app: &axum::Router,
    backend: &MemoryBackend,
    email: &str,
    role: Role,
) -> (String, String) {
    let user_id = backend.seed_account(email, PASSWORD, email, role);
    let response = post_json(
        app,
        "/login",
        None,
        serde_json::json!({"email": email, "password": PASSWORD}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    (user_id, session_cookie(&response).expect("login sets a session cookie"))
}

/// `name=value` of the session cookie set by a response, if any.
#[allow(dead_code)]
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("gympro_session="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

#[allow(dead_code)]
pub async fn get(app: &axum::Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn post_json(
    app: &axum::Router,
    uri: &str,
    cookie: Option<&str>,
    body: Value,
) -> Response {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn post_empty(app: &axum::Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::builder().method("POST").uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}
