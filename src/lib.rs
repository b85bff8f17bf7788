// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! GymPro: gym management backend.
//!
//! Administrators track members, payments, enrollments and trainer
//! requests; members check in and out and manage their own membership.
//! Each signed-in browser sees exactly one of three navigation trees,
//! chosen by the session's role.

pub mod config;
pub mod db;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod time_utils;

use config::Config;
use db::{AuthService, DataService};
use session::SessionStore;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn DataService>,
    pub auth: Arc<dyn AuthService>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, db: Arc<dyn DataService>, auth: Arc<dyn AuthService>) -> Self {
        let sessions = SessionStore::new(config.session_ttl_hours);
        Self {
            config,
            db,
            auth,
            sessions,
        }
    }
}
