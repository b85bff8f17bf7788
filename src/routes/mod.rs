// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod admin;
pub mod auth;
pub mod member;

use crate::guard::NavTree;
use crate::middleware::auth::redirect_home;
use crate::middleware::route_guard;
use crate::session::SessionContext;
use crate::AppState;
use axum::http::{header, Method};
use axum::response::{IntoResponse, Redirect, Response};
use axum::extract::Request;
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Paths inside the active tree that have no handler land on its home.
async fn fallback(request: Request) -> Redirect {
    let home = request
        .extensions()
        .get::<SessionContext>()
        .map_or(NavTree::Unauthenticated.home(), |ctx| ctx.tree().home());
    redirect_home(request.method(), home)
}

/// Answer a view with data fetched on behalf of `ctx`.
///
/// If the session changed while the fetch was in flight (sign-out or a new
/// identity), the data belongs to a screen the user has left: drop it and
/// send them to the home of the tree they are in now (303, so the client
/// follows with a GET whatever the original method was).
pub(crate) fn settle<T: Serialize>(state: &AppState, ctx: &SessionContext, data: T) -> Response {
    if let Some(ticket) = ctx.ticket() {
        if !state.sessions.is_current(&ticket) {
            let home = state.sessions.current_tree(&ticket).home();
            tracing::debug!(home, "Discarding result of superseded fetch");
            return Redirect::to(home).into_response();
        }
    }
    Json(data).into_response()
}

/// The public URL itself, or a local development server on any port.
fn allowed_origin(origin: &str, public_url: &str) -> bool {
    if origin == public_url.trim_end_matches('/') {
        return true;
    }
    let Ok(url) = reqwest::Url::parse(origin) else {
        return false;
    };
    url.scheme() == "http" && matches!(url.host_str(), Some("localhost" | "127.0.0.1"))
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from the public URL and localhost (for dev)
    let public_url = state.config.public_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| allowed_origin(origin, &public_url))
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .merge(admin::routes())
        .merge(member::routes())
        .fallback(fallback)
        .layer(middleware::from_fn_with_state(state.clone(), route_guard))
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state);

    // Routing happens before any `Router::layer` middleware runs, so the
    // trailing slash has to go before the request reaches the inner router.
    Router::new().fallback_service(NormalizePathLayer::trim_trailing_slash().layer(app))
}
