// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member views. Every handler acts on the signed-in member's own records.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use std::sync::Arc;

use crate::error::Result;
use crate::routes::settle;
use crate::services::trainer_requests::{self, NewTrainerRequest};
use crate::services::{attendance, dashboard, enrollments};
use crate::session::SessionContext;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/member", get(get_dashboard))
        .route("/member/status", get(get_status))
        .route("/member/attendance", get(get_attendance))
        .route("/member/attendance/check-in", post(check_in))
        .route("/member/attendance/check-out", post(check_out))
        .route(
            "/member/personal",
            get(get_personal_training).post(request_trainer),
        )
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Response> {
    let user_id = &ctx.identity()?.id;
    let data = dashboard::member_dashboard(state.db.as_ref(), user_id, Utc::now()).await;
    Ok(settle(&state, &ctx, data))
}

async fn get_status(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Response> {
    let user_id = &ctx.identity()?.id;
    let data = enrollments::membership_status(state.db.as_ref(), user_id).await;
    Ok(settle(&state, &ctx, data))
}

async fn get_attendance(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Response> {
    let user_id = &ctx.identity()?.id;
    let data = attendance::attendance_view(state.db.as_ref(), user_id).await;
    Ok(settle(&state, &ctx, data))
}

/// Check in, then show the refreshed attendance page. A failed write is
/// logged and the page shows whatever the backend holds.
async fn check_in(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Response> {
    let user_id = &ctx.identity()?.id;
    if let Err(e) = attendance::check_in(state.db.as_ref(), user_id, Utc::now()).await {
        tracing::error!(error = %e, user_id = %user_id, "Check-in failed");
    }
    let data = attendance::attendance_view(state.db.as_ref(), user_id).await;
    Ok(settle(&state, &ctx, data))
}

async fn check_out(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Response> {
    let user_id = &ctx.identity()?.id;
    if let Err(e) = attendance::check_out(state.db.as_ref(), user_id, Utc::now()).await {
        tracing::error!(error = %e, user_id = %user_id, "Check-out failed");
    }
    let data = attendance::attendance_view(state.db.as_ref(), user_id).await;
    Ok(settle(&state, &ctx, data))
}

async fn get_personal_training(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Response> {
    let user_id = &ctx.identity()?.id;
    let data = trainer_requests::personal_training(state.db.as_ref(), user_id).await;
    Ok(settle(&state, &ctx, data))
}

async fn request_trainer(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Json(form): Json<NewTrainerRequest>,
) -> Result<impl IntoResponse> {
    let user_id = &ctx.identity()?.id;
    let request = trainer_requests::create_request(state.db.as_ref(), user_id, form).await?;
    Ok((StatusCode::CREATED, Json(request)))
}
