// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administrator views. The route guard only lets admin sessions in here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use std::sync::Arc;

use crate::error::Result;
use crate::routes::settle;
use crate::services::enrollments::{self, NewEnrollment};
use crate::services::trainer_requests::{self, StatusUpdate};
use crate::services::{dashboard, payments};
use crate::session::SessionContext;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(get_dashboard))
        .route("/admin/payments", get(get_payments))
        .route("/admin/enrollments", get(get_enrollments))
        .route(
            "/admin/enrollments/new",
            get(get_enrollment_form).post(create_enrollment),
        )
        .route("/admin/trainer-requests", get(get_trainer_requests))
        .route(
            "/admin/trainer-requests/{id}/status",
            post(update_trainer_request),
        )
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    let data = dashboard::admin_dashboard(state.db.as_ref(), Utc::now()).await;
    settle(&state, &ctx, data)
}

async fn get_payments(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    let data = payments::list_payments(state.db.as_ref()).await;
    settle(&state, &ctx, data)
}

async fn get_enrollments(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    let data = enrollments::list_enrollments(state.db.as_ref()).await;
    settle(&state, &ctx, data)
}

async fn get_enrollment_form(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    let data = enrollments::enrollment_form(state.db.as_ref()).await;
    settle(&state, &ctx, data)
}

async fn create_enrollment(
    State(state): State<Arc<AppState>>,
    Json(form): Json<NewEnrollment>,
) -> Result<impl IntoResponse> {
    let membership = enrollments::create_enrollment(state.db.as_ref(), form).await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

async fn get_trainer_requests(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Response {
    let data = trainer_requests::list_all(state.db.as_ref()).await;
    settle(&state, &ctx, data)
}

async fn update_trainer_request(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Response {
    let data = trainer_requests::update_status(state.db.as_ref(), &id, update).await;
    settle(&state, &ctx, data)
}
