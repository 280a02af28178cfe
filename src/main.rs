// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! WOD Tracker API Server
//!
//! Gym management, class scheduling and workout tracking for CrossFit
//! boxes, backed by Firestore.

use wod_tracker::{
    config::Config,
    db::FirestoreDb,
    services::{AiCoach, FirebaseTokenVerifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting WOD Tracker API");

    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    let token_verifier = Arc::new(FirebaseTokenVerifier::new(&config)?);
    let coach = AiCoach::from_config(&config)?;

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        token_verifier,
        coach,
    });

    let app = wod_tracker::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wod_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
