// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in, registration and sign-out routes.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::guard::NavTree;
use crate::middleware::auth::{create_session_token, removal_cookie, session_cookie};
use crate::services::accounts::{self, LoginForm, RegisterForm, SignedIn};
use crate::session::SessionContext;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login_form).post(login))
        .route("/register", get(register_form).post(register))
        .route("/logout", post(logout))
}

/// Description of a form the client renders.
#[derive(Serialize)]
pub struct FormDescription {
    pub action: &'static str,
    pub fields: &'static [&'static str],
}

async fn login_form() -> Json<FormDescription> {
    Json(FormDescription {
        action: "/login",
        fields: &["email", "password"],
    })
}

async fn register_form() -> Json<FormDescription> {
    Json(FormDescription {
        action: "/register",
        fields: &["email", "password", "full_name"],
    })
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(form): Json<LoginForm>,
) -> Result<(CookieJar, Redirect)> {
    let signed_in = accounts::sign_in(state.db.as_ref(), state.auth.as_ref(), form).await?;
    start_session(&state, jar, signed_in)
}

async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(form): Json<RegisterForm>,
) -> Result<(CookieJar, Redirect)> {
    let signed_in = accounts::register(state.db.as_ref(), state.auth.as_ref(), form).await?;
    start_session(&state, jar, signed_in)
}

/// Store the session, hand the browser its cookie and send it home.
fn start_session(
    state: &AppState,
    jar: CookieJar,
    signed_in: SignedIn,
) -> Result<(CookieJar, Redirect)> {
    let is_admin = signed_in.identity.is_admin();
    let session_id = state
        .sessions
        .create(signed_in.identity, signed_in.access_token);

    let token = create_session_token(
        &session_id,
        &state.config.session_signing_key,
        state.config.session_ttl_hours,
    )
    .map_err(AppError::Internal)?;

    let cookie = session_cookie(
        token,
        state.config.secure_cookies(),
        state.config.session_ttl_hours,
    );

    let home = if is_admin {
        NavTree::Administrator.home()
    } else {
        NavTree::Member.home()
    };
    Ok((jar.add(cookie), Redirect::to(home)))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    jar: CookieJar,
) -> Response {
    if let Some(session_id) = &ctx.session_id {
        state
            .sessions
            .sign_out(session_id, state.auth.as_ref())
            .await;
    }

    (
        jar.remove(removal_cookie()),
        Redirect::to(NavTree::Unauthenticated.home()),
    )
        .into_response()
}
