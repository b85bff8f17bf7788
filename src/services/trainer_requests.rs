// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Personal-trainer requests: members ask for a session with a trainer,
//! administrators approve or reject.

use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::db::{self, tables, DataService, Query};
use crate::error::AppError;
use crate::models::{Profile, RequestStatus, Role, TrainerRequest};
use crate::services::profiles::{self, name_of};
use crate::services::recover_or_default;
use crate::time_utils::parse_timestamp;

/// A request with the names of both parties.
#[derive(Debug, Clone, Serialize)]
pub struct TrainerRequestRow {
    #[serde(flatten)]
    pub request: TrainerRequest,
    pub member_name: Option<String>,
    pub trainer_name: Option<String>,
}

/// Every request, latest requested date first.
pub async fn list_all(db: &dyn DataService) -> Vec<TrainerRequestRow> {
    recover_or_default(
        "trainer requests",
        fetch_rows(db, Query::new().order_desc("requested_date")),
    )
    .await
}

async fn fetch_rows(db: &dyn DataService, query: Query) -> Result<Vec<TrainerRequestRow>, AppError> {
    let requests: Vec<TrainerRequest> = db::select_as(db, tables::TRAINER_REQUESTS, &query).await?;

    let people = recover_or_default(
        "trainer request names",
        profiles::profiles_by_id(
            db,
            requests
                .iter()
                .flat_map(|r| [r.user_id.as_str(), r.trainer_id.as_str()]),
        ),
    )
    .await;

    Ok(requests
        .into_iter()
        .map(|request| TrainerRequestRow {
            member_name: name_of(&people, &request.user_id),
            trainer_name: name_of(&people, &request.trainer_id),
            request,
        })
        .collect())
}

/// Administrator's decision on a request.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: RequestStatus,
}

/// Approve or reject a request, then return the current list.
///
/// Failures are logged only; the caller sees the list as it stands.
pub async fn update_status(
    db: &dyn DataService,
    request_id: &str,
    update: StatusUpdate,
) -> Vec<TrainerRequestRow> {
    match update.status {
        RequestStatus::Pending => {
            tracing::warn!(request_id, "Ignoring request to reset status to pending");
        }
        status => {
            let result = db
                .update(
                    tables::TRAINER_REQUESTS,
                    &Query::new().eq("id", request_id),
                    json!({ "status": status.as_str() }),
                )
                .await;
            match result {
                Ok(rows) if rows.is_empty() => {
                    tracing::warn!(request_id, "Trainer request not found");
                }
                Ok(_) => {
                    tracing::info!(request_id, status = status.as_str(), "Trainer request updated");
                }
                Err(e) => {
                    tracing::error!(error = %e, request_id, "Failed to update trainer request");
                }
            }
        }
    }

    list_all(db).await
}

/// The member's personal-training page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PersonalTrainingView {
    pub trainers: Vec<Profile>,
    pub requests: Vec<TrainerRequestRow>,
}

pub async fn personal_training(db: &dyn DataService, user_id: &str) -> PersonalTrainingView {
    let mine = Query::new()
        .eq("user_id", user_id)
        .order_desc("requested_date");

    let (trainers, requests) = tokio::join!(
        recover_or_default("trainers", profiles::list_by_role(db, Role::Admin)),
        recover_or_default("member trainer requests", fetch_rows(db, mine)),
    );

    PersonalTrainingView { trainers, requests }
}

/// Submitted trainer-request form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTrainerRequest {
    #[validate(length(min = 1, message = "trainer is required"))]
    pub trainer_id: String,
    #[validate(custom(function = "validate_requested_date"))]
    pub requested_date: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

fn validate_requested_date(value: &str) -> Result<(), validator::ValidationError> {
    match parse_timestamp(value) {
        Some(_) => Ok(()),
        None => Err(validator::ValidationError::new("invalid_date")),
    }
}

/// File a pending request. Errors are returned so the form can report them.
pub async fn create_request(
    db: &dyn DataService,
    user_id: &str,
    form: NewTrainerRequest,
) -> Result<TrainerRequest, AppError> {
    form.validate()?;

    let trainer = profiles::get_profile(db, &form.trainer_id).await?;
    if !trainer.is_some_and(|t| t.role == Role::Admin) {
        return Err(AppError::BadRequest(format!(
            "unknown trainer {}",
            form.trainer_id
        )));
    }

    let request: TrainerRequest = db::insert_as(
        db,
        tables::TRAINER_REQUESTS,
        json!({
            "user_id": user_id,
            "trainer_id": form.trainer_id,
            "requested_date": form.requested_date,
            "status": RequestStatus::Pending.as_str(),
            "notes": form.notes,
        }),
    )
    .await?;

    tracing::info!(
        request_id = %request.id,
        user_id,
        trainer_id = %request.trainer_id,
        "Trainer request filed"
    );
    Ok(request)
}
