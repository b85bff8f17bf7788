// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Memberships as seen by administrators (enrollments) and members (status).

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::{self, tables, DataService, Query};
use crate::error::AppError;
use crate::models::{Membership, MembershipStatus, Payment, Profile, Role};
use crate::services::profiles::{self, name_of};
use crate::services::recover_or_default;
use crate::time_utils::parse_timestamp;

/// Plan preselected on the new-enrollment form.
pub const DEFAULT_PLAN: &str = "Monthly";

/// How many payments the membership status page shows.
pub const RECENT_PAYMENTS: usize = 5;

/// One row of the enrollments table.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentRow {
    #[serde(flatten)]
    pub membership: Membership,
    pub member_name: Option<String>,
    pub member_email: Option<String>,
}

/// All memberships, newest start first, with the member's name and email.
pub async fn list_enrollments(db: &dyn DataService) -> Vec<EnrollmentRow> {
    recover_or_default("enrollments", fetch_enrollments(db)).await
}

async fn fetch_enrollments(db: &dyn DataService) -> Result<Vec<EnrollmentRow>, AppError> {
    let memberships: Vec<Membership> = db::select_as(
        db,
        tables::MEMBERSHIPS,
        &Query::new().order_desc("start_date"),
    )
    .await?;

    // Names are decoration; a failed lookup still shows the memberships.
    let members = recover_or_default(
        "enrollment member names",
        profiles::profiles_by_id(db, memberships.iter().map(|m| m.user_id.as_str())),
    )
    .await;

    Ok(memberships
        .into_iter()
        .map(|membership| EnrollmentRow {
            member_name: name_of(&members, &membership.user_id),
            member_email: members
                .get(&membership.user_id)
                .and_then(|p| p.email.clone()),
            membership,
        })
        .collect())
}

/// Defaults and choices for the new-enrollment form.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentFormView {
    pub plan_name: &'static str,
    pub status: MembershipStatus,
    pub members: Vec<Profile>,
}

pub async fn enrollment_form(db: &dyn DataService) -> EnrollmentFormView {
    EnrollmentFormView {
        plan_name: DEFAULT_PLAN,
        status: MembershipStatus::Active,
        members: recover_or_default("enrollable members", profiles::list_by_role(db, Role::Member))
            .await,
    }
}

fn default_plan() -> String {
    DEFAULT_PLAN.to_string()
}

fn default_status() -> MembershipStatus {
    MembershipStatus::Active
}

/// Submitted new-enrollment form.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct NewEnrollment {
    #[validate(length(min = 1, message = "member is required"))]
    pub user_id: String,
    #[serde(default = "default_plan")]
    #[validate(length(min = 1, max = 100))]
    pub plan_name: String,
    #[serde(default = "default_status")]
    pub status: MembershipStatus,
    #[validate(custom(function = "validate_date"))]
    pub start_date: String,
    #[serde(default)]
    #[validate(custom(function = "validate_date"))]
    pub end_date: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
}

fn validate_date(value: &str) -> Result<(), validator::ValidationError> {
    match parse_timestamp(value) {
        Some(_) => Ok(()),
        None => Err(validator::ValidationError::new("invalid_date")),
    }
}

/// Create a membership. Errors are returned so the form can report them.
pub async fn create_enrollment(
    db: &dyn DataService,
    form: NewEnrollment,
) -> Result<Membership, AppError> {
    form.validate()?;

    if form.status == MembershipStatus::Other {
        return Err(AppError::BadRequest("unknown membership status".to_string()));
    }
    if let (Some(start), Some(end)) = (
        parse_timestamp(&form.start_date),
        form.end_date.as_deref().and_then(parse_timestamp),
    ) {
        if end < start {
            return Err(AppError::BadRequest(
                "end date is before start date".to_string(),
            ));
        }
    }

    let member = profiles::get_profile(db, &form.user_id).await?;
    if !member.is_some_and(|m| m.role == Role::Member) {
        return Err(AppError::BadRequest(format!("unknown member {}", form.user_id)));
    }

    let membership: Membership = db::insert_as(db, tables::MEMBERSHIPS, &form).await?;
    tracing::info!(
        membership_id = %membership.id,
        user_id = %membership.user_id,
        plan = %membership.plan_name,
        "Enrollment created"
    );
    Ok(membership)
}

/// A member's membership page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MembershipStatusView {
    /// `None` is a normal state: no active membership.
    pub membership: Option<Membership>,
    pub recent_payments: Vec<Payment>,
}

pub async fn membership_status(db: &dyn DataService, user_id: &str) -> MembershipStatusView {
    let active = Query::new().eq("user_id", user_id).eq("status", "active");
    let payments = Query::new()
        .eq("user_id", user_id)
        .order_desc("payment_date")
        .limit(RECENT_PAYMENTS);

    let (membership, recent_payments) = tokio::join!(
        recover_or_default(
            "active membership",
            db::select_one::<Membership>(db, tables::MEMBERSHIPS, active),
        ),
        recover_or_default(
            "recent payments",
            db::select_as::<Payment>(db, tables::PAYMENTS, &payments),
        ),
    );

    MembershipStatusView {
        membership,
        recent_payments,
    }
}
