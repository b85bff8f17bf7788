// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process implementation of the remote data service.
//!
//! Used by the test suite and for offline development
//! (`DATA_BACKEND=memory`). Tables are plain vectors of JSON rows evaluated
//! with the same [`Query`] semantics the Supabase client sends over the wire.
//! Nothing is persisted.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::db::{tables, AuthService, AuthSession, AuthUser, DataService, Query};
use crate::error::AppError;
use crate::models::Role;

struct Account {
    id: String,
    email: String,
    password: String,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Vec<Value>>,
    accounts: Vec<Account>,
    /// Live access tokens -> account id
    tokens: HashMap<String, String>,
}

/// In-memory tables plus a toy password store.
#[derive(Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
    offline: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails with a remote error while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Insert rows verbatim (ids are generated for rows that lack one).
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        let mut inner = self.lock();
        let stored = inner.tables.entry(table.to_string()).or_default();
        for row in rows {
            stored.push(with_id(row));
        }
    }

    /// Create an account with a matching `users` profile. Returns the user id.
    pub fn seed_account(&self, email: &str, password: &str, full_name: &str, role: Role) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let mut inner = self.lock();
        inner.accounts.push(Account {
            id: id.clone(),
            email: email.to_string(),
            password: password.to_string(),
        });
        inner
            .tables
            .entry(tables::USERS.to_string())
            .or_default()
            .push(json!({
                "id": id,
                "email": email,
                "full_name": full_name,
                "role": role,
            }));
        id
    }

    /// Snapshot of a table, for assertions.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// Number of access tokens that have not been signed out.
    pub fn live_tokens(&self) -> usize {
        self.lock().tokens.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Remote("backend unavailable".to_string()));
        }
        Ok(())
    }

    fn issue_token(inner: &mut Inner, account_id: &str) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        inner.tokens.insert(token.clone(), account_id.to_string());
        token
    }
}

fn with_id(mut row: Value) -> Value {
    if let Value::Object(map) = &mut row {
        map.entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
    }
    row
}

#[async_trait]
impl DataService for MemoryBackend {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, AppError> {
        self.ensure_online()?;
        let inner = self.lock();
        Ok(inner
            .tables
            .get(table)
            .map(|rows| query.apply(rows))
            .unwrap_or_default())
    }

    async fn count(&self, table: &str, query: &Query) -> Result<u64, AppError> {
        self.ensure_online()?;
        let inner = self.lock();
        let count = inner
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, AppError> {
        self.ensure_online()?;
        if !row.is_object() {
            return Err(AppError::BadRequest("row must be a JSON object".to_string()));
        }
        let row = with_id(row);
        self.lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        query: &Query,
        patch: Value,
    ) -> Result<Vec<Value>, AppError> {
        self.ensure_online()?;
        let Value::Object(patch) = patch else {
            return Err(AppError::BadRequest("patch must be a JSON object".to_string()));
        };

        let mut inner = self.lock();
        let mut updated = Vec::new();
        if let Some(rows) = inner.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| query.matches(row)) {
                if let Value::Object(fields) = &mut *row {
                    for (key, value) in &patch {
                        fields.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl AuthService for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        self.ensure_online()?;
        let mut inner = self.lock();
        let account = inner
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email) && a.password == password)
            .map(|a| AuthUser {
                id: a.id.clone(),
                email: Some(a.email.clone()),
            })
            .ok_or(AppError::InvalidCredentials)?;

        let token = Self::issue_token(&mut inner, &account.id);
        Ok(AuthSession {
            access_token: Some(token),
            user: account,
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        self.ensure_online()?;
        let mut inner = self.lock();
        if inner
            .accounts
            .iter()
            .any(|a| a.email.eq_ignore_ascii_case(email))
        {
            return Err(AppError::BadRequest("User already registered".to_string()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        inner.accounts.push(Account {
            id: id.clone(),
            email: email.to_string(),
            password: password.to_string(),
        });

        let token = Self::issue_token(&mut inner, &id);
        Ok(AuthSession {
            access_token: Some(token),
            user: AuthUser {
                id,
                email: Some(email.to_string()),
            },
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        self.ensure_online()?;
        self.lock().tokens.remove(access_token);
        Ok(())
    }
}
