// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route guard tests.
//!
//! Every session sees exactly one navigation tree; anything outside it is
//! answered with a redirect to that tree's home (307 for reads, 303 for
//! anything else).

use axum::http::StatusCode;
use gympro::models::Role;

mod common;
use common::{get, location, post_json, sign_in_as};
use serde_json::json;

#[tokio::test]
async fn test_anonymous_redirected_to_login() {
    let (app, _, _) = common::create_test_app();

    for path in ["/admin", "/member", "/admin/payments", "/", "/nowhere"] {
        let response = get(&app, path, None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(location(&response), "/login", "{path}");
    }
}

#[tokio::test]
async fn test_anonymous_can_reach_login_and_register() {
    let (app, _, _) = common::create_test_app();

    assert_eq!(get(&app, "/login", None).await.status(), StatusCode::OK);
    assert_eq!(get(&app, "/register", None).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_member_kept_out_of_admin_tree() {
    let (app, _, backend) = common::create_test_app();
    let (_, cookie) = sign_in_as(&app, &backend, "ana@example.com", Role::Member).await;

    for path in ["/admin", "/admin/payments", "/login", "/register"] {
        let response = get(&app, path, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(location(&response), "/member", "{path}");
    }

    assert_eq!(get(&app, "/member", Some(&cookie)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_unknown_path_goes_home() {
    let (app, _, backend) = common::create_test_app();
    let (_, cookie) = sign_in_as(&app, &backend, "boss@example.com", Role::Admin).await;

    for path in ["/random-unknown", "/member", "/member/attendance"] {
        let response = get(&app, path, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(location(&response), "/admin", "{path}");
    }

    assert_eq!(get(&app, "/admin", Some(&cookie)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_trailing_slash_stays_in_tree() {
    let (app, _, backend) = common::create_test_app();
    let (_, cookie) = sign_in_as(&app, &backend, "boss@example.com", Role::Admin).await;

    let response = get(&app, "/admin/payments/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let (_, member) = sign_in_as(&app, &backend, "ana@example.com", Role::Member).await;
    let response = get(&app, "/member/status/", Some(&member)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Outside the tree the slash makes no difference
    let response = get(&app, "/admin/", Some(&member)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/member");
}

#[tokio::test]
async fn test_post_outside_tree_lands_on_home() {
    let (app, _, backend) = common::create_test_app();
    let (_, cookie) = sign_in_as(&app, &backend, "ana@example.com", Role::Member).await;

    let response = post_json(
        &app,
        "/admin/enrollments/new",
        Some(&cookie),
        json!({"user_id": "m1", "start_date": "2026-10-01"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/member");

    // A 303 is followed with a GET, which the home page answers
    let home = get(&app, location(&response), Some(&cookie)).await;
    assert_eq!(home.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_post_outside_tree_lands_on_login() {
    let (app, _, _) = common::create_test_app();

    let response = post_json(
        &app,
        "/admin/enrollments/new",
        None,
        json!({"user_id": "m1", "start_date": "2026-10-01"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert_eq!(get(&app, "/login", None).await.status(), StatusCode::OK);

    // Signing out again after the session is gone also ends on the login page
    let response = common::post_empty(&app, "/logout", Some("gympro_session=expired")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_tampered_cookie_is_anonymous() {
    let (app, _, _) = common::create_test_app();

    let response = get(&app, "/member", Some("gympro_session=not-a-jwt")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_wrong_method_inside_tree_is_405() {
    let (app, _, backend) = common::create_test_app();
    let (_, cookie) = sign_in_as(&app, &backend, "ana@example.com", Role::Member).await;

    let response = get(&app, "/member/attendance/check-in", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
