// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie handling and the route guard middleware.

use crate::guard::{self, RouteDecision};
use crate::session::SessionContext;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the cookie carrying the signed session id.
pub const SESSION_COOKIE: &str = "gympro_session";

/// Paths served regardless of session state.
const PUBLIC_PATHS: &[&str] = &["/health"];

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (session id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Middleware that resolves the session and enforces the navigation trees.
///
/// Requests for paths outside the active tree are answered with a redirect
/// to that tree's home; everything else proceeds with a [`SessionContext`]
/// extension attached.
pub async fn route_guard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let ctx = session_from_cookie(&state, &jar);

    match guard::resolve(&ctx.session, request.uri().path()) {
        RouteDecision::Redirect(home) => {
            tracing::debug!(
                path = %request.uri().path(),
                home,
                "Path outside active navigation tree, redirecting"
            );
            redirect_home(request.method(), home).into_response()
        }
        RouteDecision::Allow(_) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
    }
}

/// Redirect to a tree home. Reads keep their method (307); anything else
/// becomes a GET of the home page (303) so a form body is never replayed
/// against it.
pub fn redirect_home(method: &Method, home: &str) -> Redirect {
    if method == Method::GET || method == Method::HEAD {
        Redirect::temporary(home)
    } else {
        Redirect::to(home)
    }
}

/// Look up the session named by the cookie. Missing, tampered, expired or
/// unknown sessions all mean "not signed in".
pub fn session_from_cookie(state: &AppState, jar: &CookieJar) -> SessionContext {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return SessionContext::anonymous();
    };

    let Some(session_id) = decode_session_token(cookie.value(), &state.config.session_signing_key)
    else {
        tracing::debug!("Ignoring invalid session cookie");
        return SessionContext::anonymous();
    };

    match state.sessions.get(&session_id) {
        Some(session) => SessionContext {
            session_id: Some(session_id),
            session,
        },
        None => SessionContext::anonymous(),
    }
}

/// Create a JWT naming a session.
pub fn create_session_token(
    session_id: &str,
    signing_key: &[u8],
    ttl_hours: i64,
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: session_id.to_string(),
        iat: now,
        exp: now + (ttl_hours.max(0) as usize) * 60 * 60,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Verify a session JWT and return the session id it names.
pub fn decode_session_token(token: &str, signing_key: &[u8]) -> Option<String> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims.sub)
}

/// Cookie carrying a freshly issued session token.
pub fn session_cookie(token: String, secure: bool, ttl_hours: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::hours(ttl_hours))
        .build()
}

/// Cookie shape used to remove the session cookie (attributes must match).
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}
