// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GymPro API Server
//!
//! Serves the administrator and member views of a gym on top of a hosted
//! Supabase project (or in-process tables for local development).

use gympro::{
    config::{Config, DataBackend},
    db::{AuthService, DataService, MemoryBackend, SupabaseClient},
    models::Role,
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired sessions are swept from the store.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.data_backend,
        "Starting GymPro API"
    );

    let (db, auth): (Arc<dyn DataService>, Arc<dyn AuthService>) = match config.data_backend {
        DataBackend::Supabase => {
            let client = Arc::new(SupabaseClient::new(
                &config.supabase_url,
                config.supabase_anon_key.clone(),
                config.supabase_service_key.clone(),
            ));
            tracing::info!(url = %config.supabase_url, "Supabase client initialized");
            (client.clone() as Arc<dyn DataService>, client as Arc<dyn AuthService>)
        }
        DataBackend::Memory => {
            let backend = Arc::new(MemoryBackend::new());
            if let Some((email, password)) = &config.demo_admin {
                backend.seed_account(email, password, "Administrator", Role::Admin);
                tracing::info!(email = %email, "Seeded demo administrator");
            }
            tracing::warn!("Using in-memory backend; nothing will be persisted");
            (backend.clone() as Arc<dyn DataService>, backend as Arc<dyn AuthService>)
        }
    };

    let state = Arc::new(AppState::new(config.clone(), db, auth));

    // Sweep expired sessions in the background
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Purged expired sessions");
            }
        }
    });

    // Build router
    let app = gympro::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gympro=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
