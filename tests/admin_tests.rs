// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administrator view tests.

use axum::http::StatusCode;
use chrono::{Datelike, Utc};
use gympro::db::tables;
use gympro::models::Role;
use serde_json::json;

mod common;
use common::{body_json, get, post_json, sign_in_as};

#[tokio::test]
async fn test_dashboard_figures() {
    let (app, _, backend) = common::create_test_app();
    let (_, cookie) = sign_in_as(&app, &backend, "boss@example.com", Role::Admin).await;
    let ana = backend.seed_account("ana@example.com", "pw123456", "Ana", Role::Member);
    let bo = backend.seed_account("bo@example.com", "pw123456", "Bo", Role::Member);

    let now = Utc::now();
    let this_month = format!("{}-{:02}-01T00:00:00Z", now.year(), now.month());
    backend.seed(
        tables::MEMBERSHIPS,
        [
            json!({"user_id": ana, "plan_name": "Monthly", "status": "active", "start_date": "2026-01-01"}),
            json!({"user_id": bo, "plan_name": "Monthly", "status": "expired", "start_date": "2025-01-01"}),
        ],
    );
    backend.seed(
        tables::PAYMENTS,
        [
            json!({"user_id": ana, "amount": 49.5, "status": "completed", "payment_date": this_month}),
            json!({"user_id": bo, "amount": 20.0, "status": "failed", "payment_date": this_month}),
            json!({"user_id": bo, "amount": 30.0, "status": "completed", "payment_date": "2000-01-01"}),
        ],
    );
    backend.seed(
        tables::ATTENDANCE,
        [json!({"user_id": ana, "check_in": now.to_rfc3339()})],
    );

    let response = get(&app, "/admin", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = body_json(response).await;
    assert_eq!(dashboard["total_members"], 2);
    assert_eq!(dashboard["active_members"], 1);
    assert_eq!(dashboard["monthly_revenue"], 49.5);
    assert_eq!(dashboard["attendance_today"], 1);
}

#[tokio::test]
async fn test_dashboard_zeroed_during_outage() {
    let (app, _, backend) = common::create_test_app();
    let (_, cookie) = sign_in_as(&app, &backend, "boss@example.com", Role::Admin).await;

    backend.set_offline(true);
    let response = get(&app, "/admin", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "total_members": 0,
            "active_members": 0,
            "monthly_revenue": 0.0,
            "attendance_today": 0
        })
    );
}

#[tokio::test]
async fn test_payments_list_with_names() {
    let (app, _, backend) = common::create_test_app();
    let (_, cookie) = sign_in_as(&app, &backend, "boss@example.com", Role::Admin).await;
    let ana = backend.seed_account("ana@example.com", "pw123456", "Ana", Role::Member);
    backend.seed(
        tables::PAYMENTS,
        [
            json!({"user_id": ana, "amount": 10.0, "status": "completed", "payment_date": "2026-08-01"}),
            json!({"user_id": ana, "amount": 12.0, "status": "pending", "payment_date": "2026-09-01"}),
        ],
    );

    let payments = body_json(get(&app, "/admin/payments", Some(&cookie)).await).await;
    assert_eq!(payments[0]["amount"], 12.0);
    assert_eq!(payments[0]["member_name"], "Ana");
    assert_eq!(payments[1]["payment_date"], "2026-08-01");
}

#[tokio::test]
async fn test_enrollment_created_and_listed() {
    let (app, _, backend) = common::create_test_app();
    let (_, cookie) = sign_in_as(&app, &backend, "boss@example.com", Role::Admin).await;
    let ana = backend.seed_account("ana@example.com", "pw123456", "Ana", Role::Member);

    let form = body_json(get(&app, "/admin/enrollments/new", Some(&cookie)).await).await;
    assert_eq!(form["plan_name"], "Monthly");
    assert_eq!(form["status"], "active");
    assert_eq!(form["members"].as_array().unwrap().len(), 1);

    let response = post_json(
        &app,
        "/admin/enrollments/new",
        Some(&cookie),
        json!({"user_id": ana, "start_date": "2026-10-01", "end_date": "2026-11-01", "price": 49.0}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let membership = body_json(response).await;
    assert_eq!(membership["plan_name"], "Monthly");
    assert_eq!(membership["status"], "active");

    let list = body_json(get(&app, "/admin/enrollments", Some(&cookie)).await).await;
    assert_eq!(list[0]["member_name"], "Ana");
    assert_eq!(list[0]["member_email"], "ana@example.com");
}

#[tokio::test]
async fn test_enrollment_failure_is_surfaced() {
    let (app, _, backend) = common::create_test_app();
    let (_, cookie) = sign_in_as(&app, &backend, "boss@example.com", Role::Admin).await;

    backend.set_offline(true);
    let response = post_json(
        &app,
        "/admin/enrollments/new",
        Some(&cookie),
        json!({"user_id": "m1", "start_date": "2026-10-01"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "remote_error");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_trainer_request_update_failure_returns_list() {
    let (app, _, backend) = common::create_test_app();
    let (_, cookie) = sign_in_as(&app, &backend, "boss@example.com", Role::Admin).await;
    backend.seed(
        tables::TRAINER_REQUESTS,
        [json!({"id": "r1", "user_id": "m1", "trainer_id": "t1", "requested_date": "2026-11-01", "status": "pending"})],
    );

    let response = post_json(
        &app,
        "/admin/trainer-requests/missing/status",
        Some(&cookie),
        json!({"status": "rejected"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(list[0]["id"], "r1");
    assert_eq!(list[0]["status"], "pending");
}
