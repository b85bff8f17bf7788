// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member check-in/check-out.
//!
//! A visit is one `attendance` row: check-in inserts it without a
//! `check_out`; check-out stamps that same row.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::db::{self, tables, DataService, Query};
use crate::error::AppError;
use crate::models::AttendanceRecord;
use crate::services::recover_or_default;
use crate::time_utils::format_utc_rfc3339;

/// One visit as displayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visit {
    pub id: String,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
    /// Whole minutes; `None` while in progress.
    pub duration_minutes: Option<i64>,
}

impl From<&AttendanceRecord> for Visit {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            id: record.id.clone(),
            check_in: record.check_in,
            check_out: record.check_out,
            duration_minutes: record.duration_minutes(),
        }
    }
}

/// The attendance page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttendanceView {
    pub current_session: Option<Visit>,
    pub history: Vec<Visit>,
}

impl AttendanceView {
    fn from_records(records: &[AttendanceRecord]) -> Self {
        Self {
            current_session: records.iter().find(|r| r.is_open()).map(Visit::from),
            history: records.iter().map(Visit::from).collect(),
        }
    }
}

async fn records_for(db: &dyn DataService, user_id: &str) -> Result<Vec<AttendanceRecord>, AppError> {
    db::select_as(
        db,
        tables::ATTENDANCE,
        &Query::new().eq("user_id", user_id).order_desc("check_in"),
    )
    .await
}

async fn open_session(
    db: &dyn DataService,
    user_id: &str,
) -> Result<Option<AttendanceRecord>, AppError> {
    db::select_one(
        db,
        tables::ATTENDANCE,
        Query::new()
            .eq("user_id", user_id)
            .is_null("check_out")
            .order_desc("check_in"),
    )
    .await
}

/// A member's visits, newest first, and the visit in progress if any.
pub async fn attendance_view(db: &dyn DataService, user_id: &str) -> AttendanceView {
    let records = recover_or_default("attendance", records_for(db, user_id)).await;
    AttendanceView::from_records(&records)
}

/// Start a visit. Does nothing if one is already in progress.
pub async fn check_in(
    db: &dyn DataService,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<AttendanceRecord, AppError> {
    if let Some(open) = open_session(db, user_id).await? {
        tracing::debug!(user_id, record_id = %open.id, "Already checked in");
        return Ok(open);
    }

    let record: AttendanceRecord = db::insert_as(
        db,
        tables::ATTENDANCE,
        json!({
            "user_id": user_id,
            "check_in": format_utc_rfc3339(now),
            "check_out": null,
        }),
    )
    .await?;

    tracing::info!(user_id, record_id = %record.id, "Checked in");
    Ok(record)
}

/// Finish the visit in progress. Returns `None` when there is none.
pub async fn check_out(
    db: &dyn DataService,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<AttendanceRecord>, AppError> {
    let Some(open) = open_session(db, user_id).await? else {
        tracing::debug!(user_id, "Check-out without open visit");
        return Ok(None);
    };

    let updated: Vec<AttendanceRecord> = db::update_as(
        db,
        tables::ATTENDANCE,
        &Query::new().eq("id", open.id.as_str()).eq("user_id", user_id),
        json!({ "check_out": format_utc_rfc3339(now) }),
    )
    .await?;

    let record = updated.into_iter().next();
    if let Some(record) = &record {
        tracing::info!(
            user_id,
            record_id = %record.id,
            minutes = record.duration_minutes().unwrap_or_default(),
            "Checked out"
        );
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBackend;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, h, m, s).unwrap()
    }

    #[tokio::test]
    async fn test_check_in_then_out_updates_same_record() {
        let backend = MemoryBackend::new();

        let record = check_in(&backend, "m1", at(7, 0, 0)).await.unwrap();
        assert!(record.check_out.is_none());

        let view = attendance_view(&backend, "m1").await;
        assert_eq!(view.current_session.as_ref().map(|v| v.id.as_str()), Some(record.id.as_str()));
        assert_eq!(view.current_session.unwrap().duration_minutes, None);

        let closed = check_out(&backend, "m1", at(7, 52, 31)).await.unwrap().unwrap();
        assert_eq!(closed.id, record.id);
        assert_eq!(closed.check_out, Some(at(7, 52, 31)));
        assert_eq!(closed.duration_minutes(), Some(53));

        let view = attendance_view(&backend, "m1").await;
        assert!(view.current_session.is_none());
        assert_eq!(view.history.len(), 1);
        assert_eq!(view.history[0].duration_minutes, Some(53));
    }

    #[tokio::test]
    async fn test_double_check_in_keeps_single_open_visit() {
        let backend = MemoryBackend::new();
        let first = check_in(&backend, "m1", at(7, 0, 0)).await.unwrap();
        let second = check_in(&backend, "m1", at(7, 5, 0)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(backend.rows(tables::ATTENDANCE).len(), 1);
    }

    #[tokio::test]
    async fn test_check_out_without_visit_is_noop() {
        let backend = MemoryBackend::new();
        assert!(check_out(&backend, "m1", at(9, 0, 0)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_check_out_only_touches_own_visit() {
        let backend = MemoryBackend::new();
        let other = check_in(&backend, "m2", at(6, 0, 0)).await.unwrap();
        check_in(&backend, "m1", at(7, 0, 0)).await.unwrap();
        check_out(&backend, "m1", at(8, 0, 0)).await.unwrap();

        let view = attendance_view(&backend, "m2").await;
        assert_eq!(view.current_session.map(|v| v.id), Some(other.id));
    }

    #[tokio::test]
    async fn test_view_is_empty_when_backend_down() {
        let backend = MemoryBackend::new();
        check_in(&backend, "m1", at(7, 0, 0)).await.unwrap();
        backend.set_offline(true);
        assert_eq!(attendance_view(&backend, "m1").await, AttendanceView::default());
    }
}
