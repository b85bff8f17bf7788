// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.
//!
//! Each feature view reads through [`recover_or_default`]: a failed remote
//! read is logged and the view shows an empty state instead of an error.
//! Only the mutations that must tell the user they failed (creating an
//! enrollment, requesting a trainer, signing in) propagate their errors.

pub mod accounts;
pub mod attendance;
pub mod dashboard;
pub mod enrollments;
pub mod payments;
pub mod profiles;
pub mod trainer_requests;

use crate::error::AppError;
use std::future::Future;

/// Await a remote read, falling back to the type's default on failure.
pub async fn recover_or_default<T, F>(what: &'static str, fut: F) -> T
where
    T: Default,
    F: Future<Output = Result<T, AppError>>,
{
    recover(what, fut, T::default()).await
}

/// Await a remote read, falling back to `fallback` on failure.
pub async fn recover<T, F>(what: &'static str, fut: F, fallback: T) -> T
where
    F: Future<Output = Result<T, AppError>>,
{
    match fut.await {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, what, "Remote read failed, showing empty state");
            fallback
        }
    }
}
