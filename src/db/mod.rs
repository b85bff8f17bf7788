// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote data service layer.
//!
//! The gym's records and accounts live in a hosted backend. Everything the
//! application needs from it goes through two traits: [`DataService`] for
//! table reads/writes and [`AuthService`] for accounts. Rows cross the
//! boundary as JSON and are decoded into typed models by the helpers below.

pub mod memory;
pub mod query;
pub mod supabase;

pub use memory::MemoryBackend;
pub use query::Query;
pub use supabase::SupabaseClient;

use crate::error::AppError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
    pub const MEMBERSHIPS: &str = "memberships";
    pub const PAYMENTS: &str = "payments";
    pub const ATTENDANCE: &str = "attendance";
    pub const TRAINER_REQUESTS: &str = "personal_trainer_requests";
}

/// Table-scoped reads and writes.
#[async_trait]
pub trait DataService: Send + Sync {
    /// Rows matching `query`.
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, AppError>;

    /// Exact number of rows matching `query` (order/limit ignored).
    async fn count(&self, table: &str, query: &Query) -> Result<u64, AppError>;

    /// Insert one row and return it as stored (with generated columns).
    async fn insert(&self, table: &str, row: Value) -> Result<Value, AppError>;

    /// Apply `patch` to every row matching `query`; returns the updated rows.
    async fn update(&self, table: &str, query: &Query, patch: Value)
        -> Result<Vec<Value>, AppError>;
}

/// Account operations of the remote authentication subsystem.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AppError>;

    /// Revoke the remote session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;
}

/// Account as reported by the auth subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of a successful sign-in or sign-up.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Remote access token; `None` when sign-up awaits email confirmation.
    pub access_token: Option<String>,
    pub user: AuthUser,
}

/// Decode raw rows into a typed model, rejecting malformed rows.
pub fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Result<Vec<T>, AppError> {
    rows.into_iter().map(|row| decode_row(table, row)).collect()
}

/// Decode a single raw row.
pub fn decode_row<T: DeserializeOwned>(table: &str, row: Value) -> Result<T, AppError> {
    serde_json::from_value(row)
        .map_err(|e| AppError::Database(format!("Malformed row in {}: {}", table, e)))
}

/// Typed `select`.
pub async fn select_as<T: DeserializeOwned>(
    db: &dyn DataService,
    table: &str,
    query: &Query,
) -> Result<Vec<T>, AppError> {
    let rows = db.select(table, query).await?;
    decode_rows(table, rows)
}

/// Typed `select` of at most one row.
pub async fn select_one<T: DeserializeOwned>(
    db: &dyn DataService,
    table: &str,
    query: Query,
) -> Result<Option<T>, AppError> {
    let rows = db.select(table, &query.limit(1)).await?;
    rows.into_iter()
        .next()
        .map(|row| decode_row(table, row))
        .transpose()
}

/// Typed `insert`.
pub async fn insert_as<T: DeserializeOwned>(
    db: &dyn DataService,
    table: &str,
    row: impl Serialize,
) -> Result<T, AppError> {
    let row = serde_json::to_value(row).map_err(|e| AppError::Internal(e.into()))?;
    let stored = db.insert(table, row).await?;
    decode_row(table, stored)
}

/// Typed `update`.
pub async fn update_as<T: DeserializeOwned>(
    db: &dyn DataService,
    table: &str,
    query: &Query,
    patch: Value,
) -> Result<Vec<T>, AppError> {
    let rows = db.update(table, query, patch).await?;
    decode_rows(table, rows)
}
