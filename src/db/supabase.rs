// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase client: PostgREST tables and GoTrue authentication.
//!
//! Handles:
//! - Table reads with filters, ordering and limits
//! - Exact counts via `Prefer: count=exact`
//! - Inserts/updates returning the stored representation
//! - Password sign-in, sign-up and sign-out

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_RANGE};
use serde::Deserialize;
use serde_json::Value;

use crate::db::{AuthService, AuthSession, AuthUser, DataService, Query};
use crate::error::AppError;

/// Supabase REST + auth client.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl SupabaseClient {
    /// Create a client for a project. Table access uses the service key; the
    /// auth endpoints use the anon key.
    pub fn new(base_url: &str, anon_key: String, service_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            service_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn table_request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.table_url(table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn password_grant(&self, url: String, email: &str, password: &str) -> Result<Value, AppError> {
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("Auth request failed: {}", e)))?;

        check_auth_response(response).await
    }
}

#[async_trait]
impl DataService for SupabaseClient {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, AppError> {
        let response = self
            .table_request(reqwest::Method::GET, table)
            .query(&query.to_postgrest_params())
            .send()
            .await
            .map_err(|e| AppError::Remote(e.to_string()))?;

        check_response_json(response).await
    }

    async fn count(&self, table: &str, query: &Query) -> Result<u64, AppError> {
        let mut counting = query.clone();
        counting.order = None;
        counting.limit = None;

        let response = self
            .table_request(reqwest::Method::HEAD, table)
            .header("Prefer", "count=exact")
            .query(&counting.to_postgrest_params())
            .send()
            .await
            .map_err(|e| AppError::Remote(e.to_string()))?;

        check_status(&response)?;
        parse_content_range_total(response.headers())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, AppError> {
        let response = self
            .table_request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| AppError::Remote(e.to_string()))?;

        let rows: Vec<Value> = check_response_json(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::Remote(format!("Insert into {} returned no row", table)))
    }

    async fn update(
        &self,
        table: &str,
        query: &Query,
        patch: Value,
    ) -> Result<Vec<Value>, AppError> {
        let mut filtering = query.clone();
        filtering.order = None;
        filtering.limit = None;

        let response = self
            .table_request(reqwest::Method::PATCH, table)
            .header("Prefer", "return=representation")
            .query(&filtering.to_postgrest_params())
            .json(&patch)
            .send()
            .await
            .map_err(|e| AppError::Remote(e.to_string()))?;

        check_response_json(response).await
    }
}

#[async_trait]
impl AuthService for SupabaseClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let body = self
            .password_grant(self.auth_url("token?grant_type=password"), email, password)
            .await?;
        parse_auth_session(body)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let body = self
            .password_grant(self.auth_url("signup"), email, password)
            .await?;
        parse_auth_session(body)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("Sign-out request failed: {}", e)))?;

        check_status(&response)?;
        tracing::debug!("Remote sign-out successful");
        Ok(())
    }
}

/// GoTrue answers either `{access_token, user: {...}}` or, when email
/// confirmation is pending, the bare user object.
#[derive(Deserialize)]
struct AuthResponseBody {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

fn parse_auth_session(body: Value) -> Result<AuthSession, AppError> {
    let parsed: AuthResponseBody = serde_json::from_value(body)
        .map_err(|e| AppError::Remote(format!("Unexpected auth response: {}", e)))?;

    let user = match (parsed.user, parsed.id) {
        (Some(user), _) => user,
        (None, Some(id)) => AuthUser {
            id,
            email: parsed.email,
        },
        (None, None) => {
            return Err(AppError::Remote(
                "Auth response did not include a user".to_string(),
            ))
        }
    };

    Ok(AuthSession {
        access_token: parsed.access_token,
        user,
    })
}

/// Extract the total from `Content-Range: 0-24/3573` or `*/3573`.
fn parse_content_range_total(headers: &HeaderMap) -> Result<u64, AppError> {
    headers
        .get(CONTENT_RANGE)
        .and_then(|h: &HeaderValue| h.to_str().ok())
        .and_then(|range| range.rsplit_once('/'))
        .and_then(|(_, total)| total.parse().ok())
        .ok_or_else(|| AppError::Remote("Missing or invalid Content-Range in count".to_string()))
}

fn check_status(response: &reqwest::Response) -> Result<(), AppError> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(AppError::Remote(format!("HTTP {}", response.status())))
}

/// Check response and parse JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Remote(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Remote(format!("JSON parse error: {}", e)))
}

/// Like `check_response_json`, but maps credential rejections to
/// `InvalidCredentials` and surfaces GoTrue's message for bad input.
async fn check_auth_response(response: reqwest::Response) -> Result<Value, AppError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| AppError::Remote(format!("JSON parse error: {}", e)));
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = ["msg", "error_description", "message"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .unwrap_or("authentication failed")
        .to_string();

    match status.as_u16() {
        400 if body.get("error").and_then(Value::as_str) == Some("invalid_grant") => {
            Err(AppError::InvalidCredentials)
        }
        401 => Err(AppError::InvalidCredentials),
        400 | 422 => Err(AppError::BadRequest(message)),
        _ => Err(AppError::Remote(format!("HTTP {}: {}", status, message))),
    }
}
