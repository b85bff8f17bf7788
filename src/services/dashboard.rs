// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard statistics for administrators and members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::{self, tables, DataService, Query};
use crate::error::AppError;
use crate::models::payment::completed_total;
use crate::models::Payment;
use crate::services::recover_or_default;
use crate::time_utils::{format_utc_rfc3339, start_of_day, start_of_month};

/// Gym-wide figures on the administrator dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AdminDashboard {
    pub total_members: u64,
    pub active_members: u64,
    pub monthly_revenue: f64,
    pub attendance_today: u64,
}

/// Build the administrator dashboard. Each figure falls back to zero on its
/// own if its query fails.
pub async fn admin_dashboard(db: &dyn DataService, now: DateTime<Utc>) -> AdminDashboard {
    let members = Query::new().eq("role", "member");
    let active = Query::new().eq("status", "active");
    let today = Query::new().gte("check_in", format_utc_rfc3339(start_of_day(now)));

    let (total_members, active_members, monthly_revenue, attendance_today) = tokio::join!(
        recover_or_default("total members", db.count(tables::USERS, &members)),
        recover_or_default("active members", db.count(tables::MEMBERSHIPS, &active)),
        recover_or_default("monthly revenue", monthly_revenue(db, now)),
        recover_or_default("attendance today", db.count(tables::ATTENDANCE, &today)),
    );

    AdminDashboard {
        total_members,
        active_members,
        monthly_revenue,
        attendance_today,
    }
}

/// Sum of completed payments dated on or after the first instant of the
/// current month.
pub async fn monthly_revenue(db: &dyn DataService, now: DateTime<Utc>) -> Result<f64, AppError> {
    let payments: Vec<Payment> = db::select_as(
        db,
        tables::PAYMENTS,
        &Query::new()
            .eq("status", "completed")
            .gte("payment_date", format_utc_rfc3339(start_of_month(now))),
    )
    .await?;

    Ok(completed_total(&payments))
}

/// A member's own activity summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MemberDashboard {
    pub last_check_in: Option<DateTime<Utc>>,
    pub total_visits: u64,
    /// Earliest approved trainer session still ahead of us.
    pub next_training_session: Option<String>,
}

#[derive(Deserialize)]
struct CheckInOnly {
    check_in: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RequestedDateOnly {
    requested_date: String,
}

pub async fn member_dashboard(
    db: &dyn DataService,
    user_id: &str,
    now: DateTime<Utc>,
) -> MemberDashboard {
    let last_check_in = async {
        let row: Option<CheckInOnly> = db::select_one(
            db,
            tables::ATTENDANCE,
            Query::new()
                .columns("check_in")
                .eq("user_id", user_id)
                .order_desc("check_in"),
        )
        .await?;
        Ok::<_, AppError>(row.map(|r| r.check_in))
    };

    let next_session = async {
        let row: Option<RequestedDateOnly> = db::select_one(
            db,
            tables::TRAINER_REQUESTS,
            Query::new()
                .columns("requested_date")
                .eq("user_id", user_id)
                .eq("status", "approved")
                .gte("requested_date", format_utc_rfc3339(now))
                .order_asc("requested_date"),
        )
        .await?;
        Ok::<_, AppError>(row.map(|r| r.requested_date))
    };

    let visits = Query::new().eq("user_id", user_id);

    let (last_check_in, total_visits, next_training_session) = tokio::join!(
        recover_or_default("last check-in", last_check_in),
        recover_or_default("total visits", db.count(tables::ATTENDANCE, &visits)),
        recover_or_default("next training session", next_session),
    );

    MemberDashboard {
        last_check_in,
        total_visits,
        next_training_session,
    }
}
